mod common;

use fxshim_adapter::pipeline::{quad_vertices, QUAD_FVF};
use fxshim_adapter::test_utils::MockProgramRuntime;
use fxshim_adapter::{LAST_PASS, LAST_SHADER, SCRATCH};
use fxshim_core::test_utils::MockCompiler;
use fxshim_core::{Annotations, CoreError, ParameterHandle, ParameterType, ProgramHandle};
use fxshim_d3d8::d3d9::{
    Device, NativePtr, ObjectRefs, Pool, PrimitiveType, RenderStateType, ResourceApi, StreamSource, Usage,
};
use fxshim_d3d8::mock::{DrawCall, MockDevice9};
use fxshim_d3d8::HResult;
use pretty_assertions::assert_eq;

fn surface_of(core: &common::TestCore, device: &MockDevice9, name: &str) -> NativePtr {
    let texture = core.get_texture(name).unwrap();
    let native = core.adapter().unwrap().native_texture(&texture).unwrap();
    let surface = device.texture_surface_level(native, 0).unwrap();
    device.release_object(surface);
    surface
}

#[test]
fn render_targets_survive_a_failing_pass() {
    // Pass two owns programs 3 and 4.
    let compiler = MockCompiler::new().with_effect("three.fx", common::technique(&["a", "b", "c"]).build());
    let runtime = MockProgramRuntime::new().failing_bind(ProgramHandle(3));
    let (device, mut core) = common::attached(compiler, runtime);
    let effect = core.create_effect("three.fx", &[]).unwrap();

    let back_buffer = device.state().back_buffer.unwrap();
    let before = device.state().render_targets;
    let fvf_before = device.state().fvf;
    core.draw_effect(&effect).unwrap();

    let state = device.state();
    assert_eq!(state.render_targets, before);
    assert_eq!(state.fvf, fvf_before);
    assert_eq!(state.refs(back_buffer), 0);
    assert!(!state.in_scene);
    assert_eq!(state.draws.len(), 2);
    assert!(state.vertex_shader.is_none() && state.pixel_shader.is_none());
    drop(state);

    let scratch = surface_of(&core, &device, SCRATCH);
    let state = device.state();
    for draw in &state.draws {
        assert_eq!(draw.render_targets, [Some(scratch), None, None, None]);
        assert_eq!(draw.fvf, QUAD_FVF);
        assert!(draw.vertex_shader.is_some() && draw.pixel_shader.is_some());
    }
    let runtime = core.adapter().unwrap().runtime();
    let bound: Vec<_> = runtime.binds.iter().map(|(_, program)| program.0).collect();
    assert_eq!(bound, [1, 2, 5, 6]);
}

#[test]
fn quad_fills_the_canvas() {
    let compiler = MockCompiler::new().with_effect("one.fx", common::technique(&["only"]).build());
    let (device, mut core) = common::attached(compiler, MockProgramRuntime::new());
    let effect = core.create_effect("one.fx", &[]).unwrap();
    core.draw_effect(&effect).unwrap();

    let state = device.state();
    let DrawCall::PrimitiveUp { ty, primitive_count, vertices, stride } = &state.draws[0].call else {
        panic!("unexpected draw {:?}", state.draws[0].call);
    };
    assert_eq!(*ty, PrimitiveType::TRIANGLESTRIP);
    assert_eq!(*primitive_count, 2);
    assert_eq!(*stride, 24);
    let expected = quad_vertices(320, 240);
    assert_eq!(vertices.as_slice(), bytemuck::cast_slice::<_, u8>(&expected));
}

#[test]
fn pass_and_technique_outputs_are_resolved() {
    let compiler = MockCompiler::new().with_effect("two.fx", common::technique(&["a", "b"]).build());
    let (device, mut core) = common::attached(compiler, MockProgramRuntime::new());
    let effect = core.create_effect("two.fx", &[]).unwrap();
    core.draw_effect(&effect).unwrap();

    let scratch = surface_of(&core, &device, SCRATCH);
    let last_pass = surface_of(&core, &device, LAST_PASS);
    let last_shader = surface_of(&core, &device, LAST_SHADER);
    assert_eq!(
        device.state().copies,
        [
            ("StretchRect", scratch, last_pass),
            ("StretchRect", scratch, last_pass),
            ("StretchRect", scratch, last_shader),
        ]
    );
}

#[test]
fn extra_pass_targets_are_bound_while_drawing_only() {
    let compiled = fxshim_core::test_utils::EffectBuilder::new()
        .parameter(
            "normals",
            ParameterType::Sampler2D,
            Annotations::new()
                .with("texture", fxshim_core::AnnotationValue::String("normals_rt".into()))
                .with("size", fxshim_core::AnnotationValue::Int(vec![64, 64]))
                .with("format", fxshim_core::AnnotationValue::String("RGBA8".into()))
                .with("target", fxshim_core::AnnotationValue::Bool(vec![true])),
        )
        .technique(
            "Main",
            Annotations::new(),
            vec![(
                "gbuffer",
                Annotations::new().with("target1", fxshim_core::AnnotationValue::String("normals_rt".into())),
            )],
        )
        .build();
    let compiler = MockCompiler::new().with_effect("mrt.fx", compiled);
    let (device, mut core) = common::attached(compiler, MockProgramRuntime::new());
    let effect = core.create_effect("mrt.fx", &[]).unwrap();
    core.draw_effect(&effect).unwrap();

    let normals = surface_of(&core, &device, "normals_rt");
    let state = device.state();
    assert_eq!(state.draws[0].render_targets[1], Some(normals));
    assert_eq!(state.render_targets[1], None);
}

#[test]
fn application_vertex_stream_is_restored() {
    let compiler = MockCompiler::new().with_effect("two.fx", common::technique(&["a", "b"]).build());
    let (device, mut core) = common::attached(compiler, MockProgramRuntime::new());
    let effect = core.create_effect("two.fx", &[]).unwrap();
    let buffer = device.create_vertex_buffer(1024, Usage::empty(), 0, Pool::MANAGED).unwrap();
    device.set_stream_source(0, Some(buffer), 64, 32).unwrap();
    let refs_before = device.state().refs(buffer);

    core.draw_effect(&effect).unwrap();

    assert_eq!(device.state().draws.len(), 2);
    assert_eq!(
        device.state().streams.get(&0).copied(),
        Some(StreamSource {
            buffer: Some(buffer),
            offset: 64,
            stride: 32,
        })
    );
    assert_eq!(device.state().refs(buffer), refs_before);
}

#[test]
fn failing_draws_still_restore_state() {
    let compiler = MockCompiler::new().with_effect("two.fx", common::technique(&["a", "b"]).build());
    let (device, mut core) = common::attached(compiler, MockProgramRuntime::new());
    let effect = core.create_effect("two.fx", &[]).unwrap();
    device.state_mut().failures.insert("DrawPrimitiveUP", HResult::INVALIDCALL);
    // D3DCULL_CCW
    device.state_mut().render_states.insert(RenderStateType::CULLMODE.0, 3);
    let before = device.state().render_targets;

    core.draw_effect(&effect).unwrap();

    let state = device.state();
    assert_eq!(state.render_targets, before);
    assert!(!state.in_scene);
    assert!(state.draws.is_empty());
    assert_eq!(state.count_calls("EndScene"), 2);
    assert_eq!(state.render_states.get(&RenderStateType::CULLMODE.0), Some(&3));
}

#[test]
fn unloaded_pass_is_skipped() {
    let compiler = MockCompiler::new().with_effect("one.fx", common::technique(&["only"]).build());
    let runtime = MockProgramRuntime::new().failing_load(ProgramHandle(2));
    let (device, mut core) = common::attached(compiler, runtime);
    let effect = core.create_effect("one.fx", &[]).unwrap();

    // The vertex program that did load was rolled back.
    assert_eq!(core.adapter().unwrap().runtime().loaded_count(), 0);
    assert!(!effect.technique(0).unwrap().pass(0).unwrap().is_loaded());
    core.draw_effect(&effect).unwrap();
    assert!(device.state().draws.is_empty());
}

#[test]
fn effect_without_valid_technique_is_not_drawn() {
    let compiler = MockCompiler::new()
        .with_effect("none.fx", common::technique(&["a"]).build())
        .with_invalid_technique("Main");
    let (device, mut core) = common::attached(compiler, MockProgramRuntime::new());
    let effect = core.create_effect("none.fx", &[]).unwrap();

    assert!(matches!(core.draw_effect(&effect), Err(CoreError::NoValidTechnique(_))));
    assert_eq!(device.state().count_calls("SetRenderTarget"), 0);
}

#[test]
fn dirty_parameters_are_uploaded_once() {
    let compiled = common::technique(&["p"])
        .parameter("tint", ParameterType::Float4, Annotations::new())
        .parameter("view", ParameterType::Matrix, Annotations::new())
        .build();
    let compiler = MockCompiler::new().with_effect("params.fx", compiled);
    let (_device, mut core) = common::attached(compiler, MockProgramRuntime::new());
    let effect = core.create_effect("params.fx", &[]).unwrap();

    let tint = effect.parameter_by_name("tint").unwrap().clone();
    let view = effect.parameter_by_name("view").unwrap().clone();
    tint.set_floats(&[1.0, 0.5, 0.25, 1.0]).unwrap();
    let mut matrix = [0.0; 16];
    matrix[0] = 3.0;
    view.set_matrix(&matrix).unwrap();

    core.draw_effect(&effect).unwrap();
    core.draw_effect(&effect).unwrap();

    let runtime = core.adapter().unwrap().runtime();
    assert_eq!(runtime.floats, [(tint.handle().unwrap(), vec![1.0, 0.5, 0.25, 1.0])]);
    assert_eq!(runtime.matrices, [(view.handle().unwrap(), matrix)]);
    assert_eq!(tint.handle(), Some(ParameterHandle(1)));
}
