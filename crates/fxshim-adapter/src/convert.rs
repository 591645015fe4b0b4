//! Texture format and description conversions between the effect model and Direct3D 9.

use fxshim_core::{TextureDesc, TextureFormat};
use fxshim_d3d8::d3d9::{Format, Pool, Usage};

pub fn format_to_d3d9(format: TextureFormat) -> Option<Format> {
    Some(match format {
        TextureFormat::Unknown => return None,
        TextureFormat::Rgb5 => Format::X1R5G5B5,
        TextureFormat::Rgb5A1 => Format::A1R5G5B5,
        TextureFormat::Rgb8 => Format::X8R8G8B8,
        TextureFormat::Rgba8 => Format::A8R8G8B8,
        TextureFormat::Rgb10A2 => Format::A2R10G10B10,
        TextureFormat::Rgba16F => Format::A16B16G16R16F,
        TextureFormat::Rgba32F => Format::A32B32G32R32F,
        TextureFormat::D16 => Format::D16,
        TextureFormat::D32 => Format::D32,
    })
}

/// Closest effect format for a native surface format, used to size the framework's own
/// textures after the back buffer.
pub fn format_from_d3d9(format: Format) -> TextureFormat {
    match format {
        Format::X1R5G5B5 | Format::R5G6B5 => TextureFormat::Rgb5,
        Format::A1R5G5B5 => TextureFormat::Rgb5A1,
        Format::X8R8G8B8 | Format::R8G8B8 | Format::X8B8G8R8 => TextureFormat::Rgb8,
        Format::A8R8G8B8 | Format::A8B8G8R8 => TextureFormat::Rgba8,
        Format::A2R10G10B10 | Format::A2B10G10R10 => TextureFormat::Rgb10A2,
        Format::A16B16G16R16F => TextureFormat::Rgba16F,
        Format::A32B32G32R32F => TextureFormat::Rgba32F,
        Format::D16 | Format::D16_LOCKABLE => TextureFormat::D16,
        Format::D32 => TextureFormat::D32,
        _ => TextureFormat::Unknown,
    }
}

/// Native creation parameters for a texture description.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NativeTextureParams {
    pub levels: u32,
    pub usage: Usage,
    pub format: Format,
    pub pool: Pool,
}

pub fn texture_params(desc: &TextureDesc) -> Option<NativeTextureParams> {
    let format = format_to_d3d9(desc.format)?;
    let mut usage = Usage::empty();
    if desc.format.is_depth() {
        usage |= Usage::DEPTHSTENCIL;
    } else if desc.render_target {
        usage |= Usage::RENDERTARGET;
    }
    // Render targets cannot be filled from system memory, so their chains are generated.
    let levels = match (desc.mipmaps, desc.render_target) {
        (false, _) => 1,
        (true, false) => 0,
        (true, true) => {
            usage |= Usage::AUTOGENMIPMAP;
            0
        }
    };
    let pool = if usage.intersects(Usage::RENDERTARGET | Usage::DEPTHSTENCIL) {
        Pool::DEFAULT
    } else {
        Pool::MANAGED
    };
    Some(NativeTextureParams {
        levels,
        usage,
        format,
        pool,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn every_named_format_maps_both_ways() {
        for format in TextureFormat::ALL {
            let native = format_to_d3d9(format).unwrap();
            assert_eq!(format_from_d3d9(native), format);
        }
        assert_eq!(format_to_d3d9(TextureFormat::Unknown), None);
    }

    #[test]
    fn render_targets_live_in_the_default_pool() {
        let desc = TextureDesc::new_2d(64, 64, TextureFormat::Rgba8).render_target();
        let params = texture_params(&desc).unwrap();
        assert_eq!(params.pool, Pool::DEFAULT);
        assert_eq!(params.usage, Usage::RENDERTARGET);
        assert_eq!(params.levels, 1);

        let mut mipped = TextureDesc::new_2d(64, 64, TextureFormat::Rgb8);
        mipped.mipmaps = true;
        let params = texture_params(&mipped).unwrap();
        assert_eq!((params.pool, params.levels), (Pool::MANAGED, 0));

        let depth = texture_params(&TextureDesc::new_2d(64, 64, TextureFormat::D16).render_target()).unwrap();
        assert_eq!(depth.usage, Usage::DEPTHSTENCIL);
    }
}
