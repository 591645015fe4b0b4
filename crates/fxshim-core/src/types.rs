//! Plain value types shared by the effect model and the adapters.

use std::fmt;
use std::str::FromStr;

/// Texture formats an effect can request through annotations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    #[default]
    Unknown,
    Rgb5,
    Rgb5A1,
    Rgb8,
    Rgba8,
    Rgb10A2,
    Rgba16F,
    Rgba32F,
    D16,
    D32,
}

impl TextureFormat {
    pub const ALL: [TextureFormat; 9] = [
        TextureFormat::Rgb5,
        TextureFormat::Rgb5A1,
        TextureFormat::Rgb8,
        TextureFormat::Rgba8,
        TextureFormat::Rgb10A2,
        TextureFormat::Rgba16F,
        TextureFormat::Rgba32F,
        TextureFormat::D16,
        TextureFormat::D32,
    ];

    /// Annotation spelling without the `TF_` prefix.
    pub fn name(self) -> &'static str {
        match self {
            TextureFormat::Unknown => "Unknown",
            TextureFormat::Rgb5 => "RGB5",
            TextureFormat::Rgb5A1 => "RGB5A1",
            TextureFormat::Rgb8 => "RGB8",
            TextureFormat::Rgba8 => "RGBA8",
            TextureFormat::Rgb10A2 => "RGB10A2",
            TextureFormat::Rgba16F => "RGBA16F",
            TextureFormat::Rgba32F => "RGBA32F",
            TextureFormat::D16 => "D16",
            TextureFormat::D32 => "D32",
        }
    }

    pub fn is_depth(self) -> bool {
        matches!(self, TextureFormat::D16 | TextureFormat::D32)
    }

    /// Bytes per texel, 0 when unknown.
    pub fn bytes_per_texel(self) -> u32 {
        match self {
            TextureFormat::Unknown => 0,
            TextureFormat::Rgb5 | TextureFormat::Rgb5A1 | TextureFormat::D16 => 2,
            TextureFormat::Rgb8 | TextureFormat::Rgba8 | TextureFormat::Rgb10A2 | TextureFormat::D32 => 4,
            TextureFormat::Rgba16F => 8,
            TextureFormat::Rgba32F => 16,
        }
    }
}

impl fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TF_{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown texture format `{0}`")]
pub struct UnknownFormat(pub String);

impl FromStr for TextureFormat {
    type Err = UnknownFormat;

    /// Accepts `TF_RGBA8` and `RGBA8`, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bare = match trimmed.get(..3) {
            Some(prefix) if prefix.eq_ignore_ascii_case("tf_") => &trimmed[3..],
            _ => trimmed,
        };
        TextureFormat::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(bare))
            .ok_or_else(|| UnknownFormat(s.to_owned()))
    }
}

/// Declared type of an effect parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterType {
    Float1,
    Float2,
    Float3,
    Float4,
    Matrix,
    Sampler1D,
    Sampler2D,
    Sampler3D,
    Unknown,
}

impl ParameterType {
    pub fn category(self) -> ParameterCategory {
        match self {
            ParameterType::Float1 | ParameterType::Float2 | ParameterType::Float3 | ParameterType::Float4 => {
                ParameterCategory::Float
            }
            ParameterType::Matrix => ParameterCategory::Matrix,
            ParameterType::Sampler1D | ParameterType::Sampler2D | ParameterType::Sampler3D => {
                ParameterCategory::Sampler
            }
            ParameterType::Unknown => ParameterCategory::Unknown,
        }
    }

    /// Number of floats held by a value of this type.
    pub fn components(self) -> usize {
        match self {
            ParameterType::Float1 => 1,
            ParameterType::Float2 => 2,
            ParameterType::Float3 => 3,
            ParameterType::Float4 => 4,
            ParameterType::Matrix => 16,
            _ => 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterCategory {
    Float,
    Matrix,
    Sampler,
    Unknown,
}

/// Shader stage a pass program runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProgramStage {
    Vertex,
    Fragment,
    Geometry,
}

/// Core-provided textures that stand in when an effect names a target it cannot resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureStage {
    Generic,
    /// Fallback target of techniques.
    ShaderTarget,
    /// Fallback target of passes.
    PassTarget,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub mipmaps: bool,
    pub render_target: bool,
    pub format: TextureFormat,
}

impl TextureDesc {
    pub fn new_2d(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            depth: 1,
            mipmaps: false,
            render_target: false,
            format,
        }
    }

    pub fn render_target(mut self) -> Self {
        self.render_target = true;
        self
    }
}

/// A texture description plus the offset of the region to read from a source image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextureRegion {
    pub desc: TextureDesc,
    pub origin: [u32; 3],
}

/// Opaque native texture owned by an adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub usize);

/// Opaque compiled program, as issued by the effect compiler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u64);

/// Opaque hardware parameter inside a compiled effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterHandle(pub u64);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn format_names_parse_with_and_without_prefix() {
        assert_eq!("TF_RGBA8".parse::<TextureFormat>(), Ok(TextureFormat::Rgba8));
        assert_eq!("rgba16f".parse::<TextureFormat>(), Ok(TextureFormat::Rgba16F));
        assert_eq!("tf_d32".parse::<TextureFormat>(), Ok(TextureFormat::D32));
        assert!("TF_Unknown".parse::<TextureFormat>().is_err());
        assert!("RGBA".parse::<TextureFormat>().is_err());
        assert_eq!(TextureFormat::Rgb10A2.to_string(), "TF_RGB10A2");
    }

    #[test]
    fn parameter_categories() {
        assert_eq!(ParameterType::Float3.category(), ParameterCategory::Float);
        assert_eq!(ParameterType::Sampler2D.category(), ParameterCategory::Sampler);
        assert_eq!(ParameterType::Matrix.components(), 16);
    }
}
