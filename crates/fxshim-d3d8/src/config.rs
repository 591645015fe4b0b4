/// Behaviour switches of the device shim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShimConfig {
    /// Create textures as render targets when the driver allows it, so they can double as
    /// effect pass outputs.
    pub promote_render_targets: bool,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            promote_render_targets: true,
        }
    }
}

impl ShimConfig {
    /// Defaults overridden by `FXSHIM_NO_RT_PROMOTION`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if env_var_truthy("FXSHIM_NO_RT_PROMOTION") {
            config.promote_render_targets = false;
        }
        config
    }
}

pub(crate) fn env_var_truthy(name: &str) -> bool {
    let Ok(raw) = std::env::var(name) else {
        return false;
    };
    let v = raw.trim();
    v == "1"
        || v.eq_ignore_ascii_case("true")
        || v.eq_ignore_ascii_case("yes")
        || v.eq_ignore_ascii_case("on")
}
