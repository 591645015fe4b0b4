use crate::d3d9::Format;
use crate::error::{ShimError, ShimResult};

/// Display formats a legacy application may enumerate modes for.
pub const LEGACY_DISPLAY_FORMATS: [Format; 3] = [Format::X1R5G5B5, Format::R5G6B5, Format::X8R8G8B8];

const LEGACY_FORMATS: &[Format] = &[
    Format::UNKNOWN,
    Format::R8G8B8,
    Format::A8R8G8B8,
    Format::X8R8G8B8,
    Format::R5G6B5,
    Format::X1R5G5B5,
    Format::A1R5G5B5,
    Format::A4R4G4B4,
    Format::R3G3B2,
    Format::A8,
    Format::A8R3G3B2,
    Format::X4R4G4B4,
    Format::A2B10G10R10,
    Format::G16R16,
    Format::A8P8,
    Format::P8,
    Format::L8,
    Format::A8L8,
    Format::A4L4,
    Format::V8U8,
    Format::L6V5U5,
    Format::X8L8V8U8,
    Format::Q8W8V8U8,
    Format::V16U16,
    Format::W11V11U10,
    Format::A2W10V10U10,
    Format::UYVY,
    Format::YUY2,
    Format::DXT1,
    Format::DXT2,
    Format::DXT3,
    Format::DXT4,
    Format::DXT5,
    Format::D16_LOCKABLE,
    Format::D32,
    Format::D15S1,
    Format::D24S8,
    Format::D16,
    Format::D24X8,
    Format::D24X4S4,
    Format::VERTEXDATA,
    Format::INDEX16,
    Format::INDEX32,
];

fn is_legacy_format(format: Format) -> bool {
    LEGACY_FORMATS.contains(&format)
}

/// Maps an application-supplied format onto the native one.
pub fn format_to_d3d9(format: Format) -> ShimResult<Format> {
    if format == Format::W11V11U10 || !is_legacy_format(format) {
        return Err(ShimError::Untranslatable {
            what: "format",
            value: format.0,
        });
    }
    Ok(format)
}

/// Maps a native format back for reporting. Formats the application could not have named are
/// reported as `UNKNOWN`.
pub fn format_from_d3d9(format: Format) -> Format {
    if is_legacy_format(format) {
        format
    } else {
        Format::UNKNOWN
    }
}

fn bits_per_pixel(format: Format) -> u32 {
    match format {
        Format::A8R8G8B8
        | Format::X8R8G8B8
        | Format::A2B10G10R10
        | Format::A8B8G8R8
        | Format::X8B8G8R8
        | Format::G16R16
        | Format::A2R10G10B10
        | Format::X8L8V8U8
        | Format::Q8W8V8U8
        | Format::V16U16
        | Format::W11V11U10
        | Format::A2W10V10U10
        | Format::D32
        | Format::D24S8
        | Format::D24X8
        | Format::D24X4S4
        | Format::INDEX32 => 32,
        Format::R8G8B8 => 24,
        Format::R5G6B5
        | Format::X1R5G5B5
        | Format::A1R5G5B5
        | Format::A4R4G4B4
        | Format::A8R3G3B2
        | Format::X4R4G4B4
        | Format::A8P8
        | Format::A8L8
        | Format::V8U8
        | Format::L6V5U5
        | Format::UYVY
        | Format::YUY2
        | Format::D16_LOCKABLE
        | Format::D15S1
        | Format::D16
        | Format::INDEX16 => 16,
        Format::A16B16G16R16 | Format::A16B16G16R16F => 64,
        Format::A32B32G32R32F => 128,
        Format::R3G3B2 | Format::A8 | Format::P8 | Format::L8 | Format::A4L4 => 8,
        _ => 0,
    }
}

fn block_bytes(format: Format) -> Option<u32> {
    match format {
        Format::DXT1 => Some(8),
        Format::DXT2 | Format::DXT3 | Format::DXT4 | Format::DXT5 => Some(16),
        _ => None,
    }
}

/// Byte size of one surface, as reported by the legacy surface description.
pub fn surface_size(format: Format, width: u32, height: u32) -> u32 {
    match block_bytes(format) {
        Some(bytes) => width.div_ceil(4).max(1) * height.div_ceil(4).max(1) * bytes,
        None => width * height * bits_per_pixel(format) / 8,
    }
}

pub fn volume_size(format: Format, width: u32, height: u32, depth: u32) -> u32 {
    surface_size(format, width, height) * depth
}
