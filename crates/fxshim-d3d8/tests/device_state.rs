mod common;

use fxshim_d3d8::d3d8::{RenderStateType as Rs8, TextureStageStateType as Tss8};
use fxshim_d3d8::d3d9::{
    Format, MultiSampleType, Pool, PrimitiveType, RenderStateType, SamplerStateType, TextureStageStateType, Usage,
};
use fxshim_d3d8::{HResult, ShimError};
use pretty_assertions::assert_eq;

#[test]
fn render_states_are_forwarded_or_converted() {
    let (native, device) = common::device();
    device.set_render_state(Rs8::ZENABLE, 1).unwrap();
    assert_eq!(native.state().render_states.get(&RenderStateType::ZENABLE.0), Some(&1));

    device.set_render_state(Rs8::ZBIAS, 4).unwrap();
    let bias = native.state().render_states[&RenderStateType::DEPTHBIAS.0];
    assert!((f32::from_bits(bias) - 4.0 * -0.000_005).abs() < 1e-9);
    assert_eq!(device.render_state(Rs8::ZBIAS).unwrap(), 4);

    device.set_render_state(Rs8::SOFTWAREVERTEXPROCESSING, 1).unwrap();
    assert!(native.state().software_vertex_processing);
    assert_eq!(device.render_state(Rs8::SOFTWAREVERTEXPROCESSING).unwrap(), 1);
}

#[test]
fn untranslatable_render_states_fail_without_reaching_the_device() {
    let (native, device) = common::device();
    for state in [Rs8::LINEPATTERN, Rs8::ZVISIBLE, Rs8::EDGEANTIALIAS, Rs8::PATCHSEGMENTS] {
        let err = device.set_render_state(state, 1).unwrap_err();
        assert!(matches!(err, ShimError::Untranslatable { what: "render state", .. }));
        assert_eq!(err.hresult(), HResult::INVALIDCALL);
    }
    assert_eq!(native.state().count_calls("SetRenderState"), 0);
}

#[test]
fn sampler_stage_states_move_to_sampler_state() {
    let (native, device) = common::device();
    device.set_texture_stage_state(1, Tss8::MINFILTER, 2).unwrap();
    device.set_texture_stage_state(1, Tss8::COLOROP, 4).unwrap();

    let state = native.state();
    assert_eq!(state.sampler_states.get(&(1, SamplerStateType::MINFILTER.0)), Some(&2));
    assert_eq!(state.texture_stage_states.get(&(1, TextureStageStateType::COLOROP.0)), Some(&4));
    drop(state);

    assert_eq!(device.texture_stage_state(1, Tss8::MINFILTER).unwrap(), 2);
    let err = device.set_texture_stage_state(0, Tss8::MAGFILTER, 4).unwrap_err();
    assert!(matches!(err, ShimError::Untranslatable { what: "texture filter", value: 4 }));
}

#[test]
fn set_render_target_reports_the_failing_step() {
    let (native, mut device) = common::device();
    let target = device
        .create_render_target(64, 64, Format::X8R8G8B8, MultiSampleType::NONE, false)
        .unwrap();
    let depth = device
        .create_depth_stencil_surface(64, 64, Format::D24S8, MultiSampleType::NONE)
        .unwrap();

    device.set_render_target(Some(target), Some(depth)).unwrap();
    assert_eq!(native.state().render_targets[0], device.registry().unwrap(target));

    native
        .state_mut()
        .failures
        .insert("SetDepthStencilSurface", HResult::NOTAVAILABLE);
    let err = device.set_render_target(Some(target), None).unwrap_err();
    assert_eq!(
        err,
        ShimError::Split {
            call: "SetRenderTarget",
            step: 2,
            total: 2,
            sub_call: "SetDepthStencilSurface",
            hr: HResult::NOTAVAILABLE,
        }
    );
    assert_eq!(err.hresult(), HResult::NOTAVAILABLE);

    native.state_mut().failures.clear();
    native.state_mut().failures.insert("SetRenderTarget", HResult::INVALIDCALL);
    let err = device.set_render_target(Some(target), Some(depth)).unwrap_err();
    assert!(matches!(err, ShimError::Split { step: 1, .. }));
}

#[test]
fn missing_render_target_keeps_the_current_one() {
    let (native, mut device) = common::device();
    let back_buffer = native.state().back_buffer;
    device.set_render_target(None, None).unwrap();
    let state = native.state();
    assert_eq!(state.render_targets[0], back_buffer);
    assert_eq!(state.depth_stencil, None);
}

#[test]
fn unsupported_calls_report_invalid_call() {
    let (_native, mut device) = common::device();
    let image = device.create_image_surface(8, 8, Format::X8R8G8B8).unwrap();
    let results = [
        device.begin_state_block().map(|_| ()),
        device.end_state_block().map(|_| ()),
        device.apply_state_block(1),
        device.capture_state_block(1),
        device.delete_state_block(1),
        device.create_state_block(1).map(|_| ()),
        device.get_info(1),
        device.front_buffer(image),
    ];
    for result in results {
        let err = result.unwrap_err();
        assert!(matches!(err, ShimError::Unsupported { .. }), "unexpected error: {err:?}");
        assert_eq!(err.hresult(), HResult::INVALIDCALL);
    }
}

#[test]
fn indexed_draws_use_the_base_vertex_index_from_set_indices() {
    let (native, mut device) = common::device();
    let indices = device
        .create_index_buffer(64, Usage::WRITEONLY, Format::INDEX16, Pool::MANAGED)
        .unwrap();
    device.set_indices(Some(indices), 12).unwrap();
    assert_eq!(device.indices().unwrap(), (Some(indices), 12));

    device.begin_scene().unwrap();
    device
        .draw_indexed_primitive(PrimitiveType::TRIANGLELIST, 0, 4, 0, 2)
        .unwrap();
    device.end_scene().unwrap();

    let state = native.state();
    let draw = state.draws.last().expect("draw recorded");
    assert!(matches!(
        draw.call,
        fxshim_d3d8::mock::DrawCall::Indexed {
            base_vertex_index: 12,
            primitive_count: 2,
            ..
        }
    ));
}

#[test]
fn base_vertex_index_beyond_the_native_range_is_rejected() {
    let (native, mut device) = common::device();
    let indices = device
        .create_index_buffer(64, Usage::WRITEONLY, Format::INDEX16, Pool::MANAGED)
        .unwrap();
    device.set_indices(Some(indices), u32::MAX).unwrap();

    device.begin_scene().unwrap();
    let err = device
        .draw_indexed_primitive(PrimitiveType::TRIANGLELIST, 0, 4, 0, 2)
        .unwrap_err();
    device.end_scene().unwrap();

    assert!(matches!(err, ShimError::Untranslatable { what: "base vertex index", value: u32::MAX }));
    assert_eq!(err.hresult(), HResult::INVALIDCALL);
    assert!(native.state().draws.is_empty());
}

#[test]
fn index_buffers_require_index_formats() {
    let (_native, mut device) = common::device();
    let err = device
        .create_index_buffer(64, Usage::empty(), Format::X8R8G8B8, Pool::MANAGED)
        .unwrap_err();
    assert!(matches!(err, ShimError::Untranslatable { what: "index format", .. }));
}
