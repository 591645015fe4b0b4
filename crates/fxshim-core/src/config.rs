/// Paths and names describing where the framework runs; they seed the parser's built-in
/// variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreConfig {
    /// Installation directory of the framework.
    pub global_root: String,
    /// Directory of the hooked executable.
    pub local_root: String,
    /// Working directory at startup.
    pub run_root: String,
    /// File name of the hooked executable.
    pub target: String,
    /// File name of the module that loaded the framework.
    pub loader: String,
}

impl CoreConfig {
    /// Defaults overridden by `FXSHIM_GLOBAL_ROOT`, `FXSHIM_LOCAL_ROOT`, `FXSHIM_RUN_ROOT`,
    /// `FXSHIM_TARGET` and `FXSHIM_LOADER`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        for (var, field) in [
            ("FXSHIM_GLOBAL_ROOT", &mut config.global_root),
            ("FXSHIM_LOCAL_ROOT", &mut config.local_root),
            ("FXSHIM_RUN_ROOT", &mut config.run_root),
            ("FXSHIM_TARGET", &mut config.target),
            ("FXSHIM_LOADER", &mut config.loader),
        ] {
            if let Ok(value) = std::env::var(var) {
                let value = value.trim();
                if !value.is_empty() {
                    *field = value.to_owned();
                }
            }
        }
        config
    }
}
