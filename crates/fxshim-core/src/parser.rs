//! `$(name)` variable substitution for paths and texture names.

use bitflags::bitflags;
use hashbrown::HashMap;

use crate::config::CoreConfig;

/// Nesting limit for variables whose values contain further variables.
pub const MAX_DEPTH: u32 = 8;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ParseFlags: u32 {
        /// Substitute values verbatim without expanding variables inside them.
        const NO_RECURSE = 0x1;
        /// Leave `$(unknown)` in the output instead of dropping it.
        const PRESERVE_UNKNOWN = 0x2;
        /// Convert forward slashes to backslashes in the result.
        const BACKSLASH_PATHS = 0x4;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VariableKind {
    Normal,
    /// Seeded from the configuration; cannot be replaced or removed.
    System,
}

/// Variable table plus the expansion routine.
///
/// Names are case-insensitive. A `!` prefix inside the parentheses (`$(!name)`) inserts the value
/// without expanding it, regardless of flags. Variable names may themselves contain variables
/// (`$(tex_$(quality))`).
#[derive(Debug, Default, Clone)]
pub struct VariableParser {
    variables: HashMap<String, (String, VariableKind)>,
}

impl VariableParser {
    pub fn new(config: &CoreConfig) -> Self {
        let mut parser = Self::default();
        for (name, value) in [
            ("globalroot", &config.global_root),
            ("localroot", &config.local_root),
            ("runroot", &config.run_root),
            ("target", &config.target),
            ("loader", &config.loader),
        ] {
            parser
                .variables
                .insert(name.to_owned(), (value.clone(), VariableKind::System));
        }
        parser
    }

    /// Adds or replaces a user variable. Returns `false` if `name` is a built-in.
    pub fn add_variable(&mut self, name: &str, value: &str) -> bool {
        let key = name.trim().to_ascii_lowercase();
        if let Some((_, VariableKind::System)) = self.variables.get(&key) {
            tracing::warn!(name, "refusing to overwrite built-in variable");
            return false;
        }
        self.variables.insert(key, (value.to_owned(), VariableKind::Normal));
        true
    }

    pub fn remove_variable(&mut self, name: &str) -> bool {
        let key = name.trim().to_ascii_lowercase();
        match self.variables.get(&key) {
            Some((_, VariableKind::Normal)) => self.variables.remove(&key).is_some(),
            _ => false,
        }
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables
            .get(&name.trim().to_ascii_lowercase())
            .map(|(value, _)| value.as_str())
    }

    pub fn parse(&self, input: &str, flags: ParseFlags) -> String {
        let mut out = self.expand(input, flags, 0);
        if flags.contains(ParseFlags::BACKSLASH_PATHS) {
            out = out.replace('/', "\\");
        }
        out
    }

    fn expand(&self, input: &str, flags: ParseFlags, depth: u32) -> String {
        if depth > MAX_DEPTH {
            tracing::warn!(input, "variable nesting too deep");
            return input.to_owned();
        }

        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        while let Some(start) = rest.find("$(") {
            out.push_str(&rest[..start]);
            let body = &rest[start + 2..];
            let Some(len) = closing_paren(body) else {
                // Unterminated reference; keep the tail as written.
                out.push_str(&rest[start..]);
                return out;
            };

            let mut name = &body[..len];
            let expanded_name;
            if name.contains("$(") {
                expanded_name = self.expand(name, flags, depth + 1);
                name = &expanded_name;
            }
            let (raw, name) = match name.strip_prefix('!') {
                Some(stripped) => (true, stripped),
                None => (false, name),
            };

            match self.variable(name) {
                Some(value) if raw || flags.contains(ParseFlags::NO_RECURSE) => out.push_str(value),
                Some(value) => out.push_str(&self.expand(value, flags, depth + 1)),
                None if flags.contains(ParseFlags::PRESERVE_UNKNOWN) => out.push_str(&rest[start..start + 3 + len]),
                None => tracing::debug!(name, "unknown variable dropped"),
            }
            rest = &body[len + 1..];
        }
        out.push_str(rest);
        out
    }
}

/// Byte offset of the `)` closing a reference whose body starts at `body`.
fn closing_paren(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut nested = 0u32;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'$' if bytes.get(i + 1) == Some(&b'(') => {
                nested += 1;
                i += 1;
            }
            b')' if nested == 0 => return Some(i),
            b')' => nested -= 1,
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parser() -> VariableParser {
        let config = CoreConfig {
            global_root: "C:/fx".to_owned(),
            local_root: "D:/game".to_owned(),
            run_root: "D:/game/bin".to_owned(),
            target: "game.exe".to_owned(),
            loader: "d3d8.dll".to_owned(),
        };
        VariableParser::new(&config)
    }

    #[test]
    fn built_ins_come_from_config() {
        let p = parser();
        assert_eq!(p.parse("$(globalroot)/effects/$(target)", ParseFlags::empty()), "C:/fx/effects/game.exe");
        assert_eq!(p.parse("$(LocalRoot)", ParseFlags::empty()), "D:/game");
    }

    #[test]
    fn built_ins_cannot_be_replaced() {
        let mut p = parser();
        assert!(!p.add_variable("loader", "other.dll"));
        assert!(!p.remove_variable("loader"));
        assert_eq!(p.variable("loader"), Some("d3d8.dll"));
    }

    #[test]
    fn nested_values_expand_unless_suppressed() {
        let mut p = parser();
        p.add_variable("textures", "$(globalroot)/textures");
        assert_eq!(p.parse("$(textures)/noise.png", ParseFlags::empty()), "C:/fx/textures/noise.png");
        assert_eq!(p.parse("$(textures)", ParseFlags::NO_RECURSE), "$(globalroot)/textures");
        assert_eq!(p.parse("$(!textures)", ParseFlags::empty()), "$(globalroot)/textures");
    }

    #[test]
    fn variable_names_can_be_built_from_variables() {
        let mut p = parser();
        p.add_variable("quality", "high");
        p.add_variable("bloom_high", "bloom_hq.png");
        assert_eq!(p.parse("$(bloom_$(quality))", ParseFlags::empty()), "bloom_hq.png");
    }

    #[test]
    fn unknown_variables_are_dropped_or_preserved() {
        let p = parser();
        assert_eq!(p.parse("a$(missing)b", ParseFlags::empty()), "ab");
        assert_eq!(p.parse("a$(missing)b", ParseFlags::PRESERVE_UNKNOWN), "a$(missing)b");
        assert_eq!(p.parse("tail $(open", ParseFlags::empty()), "tail $(open");
    }

    #[test]
    fn self_reference_stops_at_depth_limit() {
        let mut p = parser();
        p.add_variable("loop", "x$(loop)");
        let out = p.parse("$(loop)", ParseFlags::empty());
        assert!(out.starts_with("xxxxxxxx"));
        assert!(out.ends_with("$(loop)"));
    }

    #[test]
    fn backslash_paths() {
        let p = parser();
        assert_eq!(p.parse("$(runroot)/shaders", ParseFlags::BACKSLASH_PATHS), "D:\\game\\bin\\shaders");
    }
}
