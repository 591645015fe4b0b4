/// What the effect host loads and presents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Effect paths, loaded in order when a device is created. Paths may contain parser
    /// variables.
    pub effects: Vec<String>,
    /// Texture copied onto the back buffer after the effects ran, e.g. `:lastshader`.
    pub present_texture: Option<String>,
    /// Extra arguments handed to the effect compiler.
    pub compile_args: Vec<String>,
}

impl AdapterConfig {
    /// Defaults overridden by `FXSHIM_EFFECTS` (comma separated) and `FXSHIM_PRESENT_TEXTURE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("FXSHIM_EFFECTS") {
            config.effects = split_list(&raw);
        }
        if let Ok(raw) = std::env::var("FXSHIM_PRESENT_TEXTURE") {
            let raw = raw.trim();
            if !raw.is_empty() {
                config.present_texture = Some(raw.to_owned());
            }
        }
        config
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::split_list;

    #[test]
    fn effect_list_skips_blanks() {
        assert_eq!(split_list(" bloom.fx, ,$(localroot)/tone.fx,"), ["bloom.fx", "$(localroot)/tone.fx"]);
        assert!(split_list("").is_empty());
    }
}
