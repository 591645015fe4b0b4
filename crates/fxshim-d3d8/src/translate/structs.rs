use crate::d3d8;
use crate::d3d9::{self, present_interval, ps_version, vs_version};
use crate::error::{ShimError, ShimResult};
use crate::translate::formats::{format_from_d3d9, format_to_d3d9, surface_size, volume_size};

pub fn present_parameters_to_d3d9(pp: &d3d8::PresentParameters) -> ShimResult<d3d9::PresentParameters> {
    let (swap_effect, vsync) = match pp.swap_effect {
        d3d8::SwapEffect::DISCARD => (d3d9::SwapEffect::DISCARD, false),
        d3d8::SwapEffect::FLIP => (d3d9::SwapEffect::FLIP, false),
        d3d8::SwapEffect::COPY => (d3d9::SwapEffect::COPY, false),
        d3d8::SwapEffect::COPY_VSYNC => (d3d9::SwapEffect::COPY, true),
        other => {
            return Err(ShimError::Untranslatable {
                what: "swap effect",
                value: other.0,
            })
        }
    };

    // Windowed legacy presents never waited for vblank unless COPY_VSYNC was requested.
    let presentation_interval = if pp.windowed {
        if vsync {
            present_interval::ONE
        } else {
            present_interval::IMMEDIATE
        }
    } else {
        pp.full_screen_presentation_interval
    };

    let auto_depth_stencil_format = if pp.enable_auto_depth_stencil {
        format_to_d3d9(pp.auto_depth_stencil_format)?
    } else {
        d3d9::Format::UNKNOWN
    };

    Ok(d3d9::PresentParameters {
        back_buffer_width: pp.back_buffer_width,
        back_buffer_height: pp.back_buffer_height,
        back_buffer_format: format_to_d3d9(pp.back_buffer_format)?,
        back_buffer_count: pp.back_buffer_count,
        multi_sample_type: pp.multi_sample_type,
        multi_sample_quality: 0,
        swap_effect,
        device_window: pp.device_window,
        windowed: pp.windowed,
        enable_auto_depth_stencil: pp.enable_auto_depth_stencil,
        auto_depth_stencil_format,
        flags: pp.flags,
        full_screen_refresh_rate_in_hz: pp.full_screen_refresh_rate_in_hz,
        presentation_interval,
    })
}

/// Writes back the fields the native runtime may have filled in (windowed zero sizes, the
/// current display format, clamped back buffer counts).
pub fn present_parameters_from_d3d9(native: &d3d9::PresentParameters, pp: &mut d3d8::PresentParameters) {
    pp.back_buffer_width = native.back_buffer_width;
    pp.back_buffer_height = native.back_buffer_height;
    pp.back_buffer_format = format_from_d3d9(native.back_buffer_format);
    pp.back_buffer_count = native.back_buffer_count;
}

pub fn surface_desc_from_d3d9(desc: &d3d9::SurfaceDesc) -> d3d8::SurfaceDesc {
    d3d8::SurfaceDesc {
        format: format_from_d3d9(desc.format),
        resource_type: desc.resource_type,
        usage: desc.usage,
        pool: desc.pool,
        size: surface_size(desc.format, desc.width, desc.height),
        multi_sample_type: desc.multi_sample_type,
        width: desc.width,
        height: desc.height,
    }
}

pub fn volume_desc_from_d3d9(desc: &d3d9::VolumeDesc) -> d3d8::VolumeDesc {
    d3d8::VolumeDesc {
        format: format_from_d3d9(desc.format),
        resource_type: desc.resource_type,
        usage: desc.usage,
        pool: desc.pool,
        size: volume_size(desc.format, desc.width, desc.height, desc.depth),
        width: desc.width,
        height: desc.height,
        depth: desc.depth,
    }
}

/// Narrows device caps. Shader versions are clamped to what the legacy runtime can load.
pub fn caps_from_d3d9(caps: &d3d9::Caps) -> d3d8::Caps {
    d3d8::Caps {
        device_type: caps.device_type,
        adapter_ordinal: caps.adapter_ordinal,
        caps: caps.caps,
        caps2: caps.caps2,
        caps3: caps.caps3,
        presentation_intervals: caps.presentation_intervals,
        cursor_caps: caps.cursor_caps,
        dev_caps: caps.dev_caps,
        primitive_misc_caps: caps.primitive_misc_caps,
        raster_caps: caps.raster_caps,
        z_cmp_caps: caps.z_cmp_caps,
        src_blend_caps: caps.src_blend_caps,
        dest_blend_caps: caps.dest_blend_caps,
        alpha_cmp_caps: caps.alpha_cmp_caps,
        shade_caps: caps.shade_caps,
        texture_caps: caps.texture_caps,
        texture_filter_caps: caps.texture_filter_caps,
        cube_texture_filter_caps: caps.cube_texture_filter_caps,
        volume_texture_filter_caps: caps.volume_texture_filter_caps,
        texture_address_caps: caps.texture_address_caps,
        volume_texture_address_caps: caps.volume_texture_address_caps,
        line_caps: caps.line_caps,
        max_texture_width: caps.max_texture_width,
        max_texture_height: caps.max_texture_height,
        max_volume_extent: caps.max_volume_extent,
        max_texture_repeat: caps.max_texture_repeat,
        max_texture_aspect_ratio: caps.max_texture_aspect_ratio,
        max_anisotropy: caps.max_anisotropy,
        max_vertex_w: caps.max_vertex_w,
        guard_band_left: caps.guard_band_left,
        guard_band_top: caps.guard_band_top,
        guard_band_right: caps.guard_band_right,
        guard_band_bottom: caps.guard_band_bottom,
        extents_adjust: caps.extents_adjust,
        stencil_caps: caps.stencil_caps,
        fvf_caps: caps.fvf_caps,
        texture_op_caps: caps.texture_op_caps,
        max_texture_blend_stages: caps.max_texture_blend_stages,
        max_simultaneous_textures: caps.max_simultaneous_textures,
        vertex_processing_caps: caps.vertex_processing_caps,
        max_active_lights: caps.max_active_lights,
        max_user_clip_planes: caps.max_user_clip_planes,
        max_vertex_blend_matrices: caps.max_vertex_blend_matrices,
        max_vertex_blend_matrix_index: caps.max_vertex_blend_matrix_index,
        max_point_size: caps.max_point_size,
        max_primitive_count: caps.max_primitive_count,
        max_vertex_index: caps.max_vertex_index,
        max_streams: caps.max_streams,
        max_stream_stride: caps.max_stream_stride,
        vertex_shader_version: caps.vertex_shader_version.min(vs_version(1, 1)),
        max_vertex_shader_const: caps.max_vertex_shader_const,
        pixel_shader_version: caps.pixel_shader_version.min(ps_version(1, 4)),
        max_pixel_shader_value: caps.pixel_shader_1x_max_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn windowed(swap_effect: d3d8::SwapEffect) -> d3d8::PresentParameters {
        d3d8::PresentParameters {
            back_buffer_width: 640,
            back_buffer_height: 480,
            back_buffer_format: d3d9::Format::X8R8G8B8,
            back_buffer_count: 1,
            swap_effect,
            windowed: true,
            enable_auto_depth_stencil: true,
            auto_depth_stencil_format: d3d9::Format::D24S8,
            ..Default::default()
        }
    }

    #[test]
    fn copy_vsync_becomes_copy_with_interval_one() {
        let pp = present_parameters_to_d3d9(&windowed(d3d8::SwapEffect::COPY_VSYNC)).unwrap();
        assert_eq!(pp.swap_effect, d3d9::SwapEffect::COPY);
        assert_eq!(pp.presentation_interval, present_interval::ONE);

        let pp = present_parameters_to_d3d9(&windowed(d3d8::SwapEffect::DISCARD)).unwrap();
        assert_eq!(pp.presentation_interval, present_interval::IMMEDIATE);
        assert_eq!(pp.auto_depth_stencil_format, d3d9::Format::D24S8);
    }

    #[test]
    fn unknown_swap_effect_is_untranslatable() {
        let err = present_parameters_to_d3d9(&windowed(d3d8::SwapEffect(9))).unwrap_err();
        assert_eq!(
            err,
            ShimError::Untranslatable {
                what: "swap effect",
                value: 9
            }
        );
    }

    #[test]
    fn caps_clamp_shader_versions() {
        let caps = d3d9::Caps {
            vertex_shader_version: vs_version(3, 0),
            pixel_shader_version: ps_version(2, 0),
            pixel_shader_1x_max_value: 8.0,
            max_texture_width: 4096,
            ..Default::default()
        };
        let legacy = caps_from_d3d9(&caps);
        assert_eq!(legacy.vertex_shader_version, vs_version(1, 1));
        assert_eq!(legacy.pixel_shader_version, ps_version(1, 4));
        assert_eq!(legacy.max_pixel_shader_value, 8.0);
        assert_eq!(legacy.max_texture_width, 4096);
    }

    #[test]
    fn surface_desc_carries_size() {
        let desc = d3d9::SurfaceDesc {
            format: d3d9::Format::A8R8G8B8,
            width: 16,
            height: 8,
            ..Default::default()
        };
        assert_eq!(surface_desc_from_d3d9(&desc).size, 512);
    }
}
