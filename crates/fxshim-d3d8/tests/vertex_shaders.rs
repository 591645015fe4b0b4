mod common;

use fxshim_d3d8::d3d8::vsd;
use fxshim_d3d8::d3d9::fvf;
use fxshim_d3d8::{HResult, ShimError};
use pretty_assertions::assert_eq;

const VS_1_1: u32 = 0xFFFE_0101;
const PS_1_4: u32 = 0xFFFF_0104;
const END_TOKEN: u32 = 0x0000_FFFF;

fn declaration_with_constant() -> Vec<u32> {
    vec![
        vsd::constant(8, 1),
        0.5f32.to_bits(),
        1.0f32.to_bits(),
        1.5f32.to_bits(),
        2.0f32.to_bits(),
        vsd::stream(0),
        vsd::reg(vsd::REG_POSITION, vsd::FLOAT3),
        vsd::reg(vsd::REG_DIFFUSE, vsd::D3DCOLOR),
        vsd::END,
    ]
}

#[test]
fn programmable_shader_binds_declaration_and_constants() {
    let (native, mut device) = common::device();
    let function = [VS_1_1, END_TOKEN];
    let handle = device
        .create_vertex_shader(&declaration_with_constant(), Some(&function), 0)
        .unwrap();
    assert_eq!(handle & 1, 1, "shader handles must not look like FVF codes");

    device.set_vertex_shader(handle).unwrap();
    assert_eq!(device.vertex_shader(), handle);

    let state = native.state();
    let shader = state.vertex_shader.expect("native shader bound");
    let declaration = state.declaration.expect("declaration bound");
    assert_eq!(state.object(declaration).unwrap().elements.len(), 3);
    // Two dcl instructions of three tokens each follow the version token.
    let patched = &state.object(shader).unwrap().function;
    assert_eq!(patched.len(), function.len() + 6);
    assert_eq!(patched[0], VS_1_1);
    assert_eq!(state.vs_constants.get(&8), Some(&[0.5, 1.0, 1.5, 2.0]));
    drop(state);

    assert_eq!(device.vertex_shader_function(handle).unwrap(), function.to_vec());
    assert_eq!(device.vertex_shader_declaration(handle).unwrap(), declaration_with_constant());
}

#[test]
fn unknown_handles_are_fvf_codes() {
    let (native, mut device) = common::device();
    let code = fvf::XYZRHW | fvf::DIFFUSE | fvf::TEX1;
    device.set_vertex_shader(code).unwrap();

    let state = native.state();
    assert_eq!(state.vertex_shader, None);
    assert_eq!(state.fvf, code);
    drop(state);
    assert_eq!(device.vertex_shader(), code);
}

#[test]
fn declaration_only_shaders_use_fixed_function_processing() {
    let (native, mut device) = common::device();
    let handle = device
        .create_vertex_shader(&declaration_with_constant(), None, 0)
        .unwrap();
    device.set_vertex_shader(handle).unwrap();

    let state = native.state();
    assert_eq!(state.vertex_shader, None);
    assert!(state.declaration.is_some());
    drop(state);

    let err = device.vertex_shader_function(handle).unwrap_err();
    assert!(matches!(err, ShimError::InvalidArgument(_)));
}

#[test]
fn failed_shader_creation_releases_the_declaration() {
    let (native, mut device) = common::device();
    let err = device
        .create_vertex_shader(&declaration_with_constant(), Some(&[PS_1_4, END_TOKEN]), 0)
        .unwrap_err();
    assert!(matches!(err, ShimError::InvalidArgument(_)));
    assert_eq!(native.state().live_objects(), 0);

    native.state_mut().failures.insert("CreateVertexShader", HResult::OUTOFVIDEOMEMORY);
    let err = device
        .create_vertex_shader(&declaration_with_constant(), Some(&[VS_1_1, END_TOKEN]), 0)
        .unwrap_err();
    assert_eq!(err.hresult(), HResult::OUTOFVIDEOMEMORY);
    assert_eq!(native.state().live_objects(), 0);
}

#[test]
fn deleting_shaders_releases_native_objects() {
    let (native, mut device) = common::device();
    let vs = device
        .create_vertex_shader(&declaration_with_constant(), Some(&[VS_1_1, END_TOKEN]), 0)
        .unwrap();
    let ps = device.create_pixel_shader(&[PS_1_4, END_TOKEN]).unwrap();
    assert_ne!(vs, ps);
    assert_eq!(native.state().live_objects(), 3);

    device.set_vertex_shader(vs).unwrap();
    device.delete_vertex_shader(vs).unwrap();
    device.delete_pixel_shader(ps).unwrap();
    assert_eq!(device.vertex_shader(), 0);
    assert_eq!(native.state().live_objects(), 0);

    assert_eq!(device.delete_vertex_shader(vs), Err(ShimError::UnknownShader(vs)));
    assert_eq!(
        device.delete_pixel_shader(ps).unwrap_err().hresult(),
        HResult::INVALIDCALL
    );
}

#[test]
fn dropping_the_device_releases_remaining_shaders() {
    let (native, mut device) = common::device();
    device
        .create_vertex_shader(&declaration_with_constant(), Some(&[VS_1_1, END_TOKEN]), 0)
        .unwrap();
    device.create_vertex_shader(&declaration_with_constant(), None, 0).unwrap();
    device.create_pixel_shader(&[PS_1_4, END_TOKEN]).unwrap();
    assert_eq!(native.state().live_objects(), 4);

    drop(device);
    assert_eq!(native.state().live_objects(), 0);
}

#[test]
fn unknown_pixel_shader_falls_back_to_fixed_function() {
    let (native, mut device) = common::device();
    let ps = device.create_pixel_shader(&[PS_1_4, END_TOKEN]).unwrap();
    device.set_pixel_shader(ps).unwrap();
    assert!(native.state().pixel_shader.is_some());
    assert_eq!(device.pixel_shader(), ps);

    device.set_pixel_shader(0x42).unwrap();
    assert_eq!(native.state().pixel_shader, None);
    assert_eq!(device.pixel_shader(), 0);
    assert_eq!(device.pixel_shader_function(ps).unwrap(), vec![PS_1_4, END_TOKEN]);
}

#[test]
fn shader_constants_must_be_whole_registers() {
    let (native, device) = common::device();
    device.set_vertex_shader_constant(0, &[1.0, 2.0, 3.0, 4.0]).unwrap();
    assert_eq!(device.vertex_shader_constant(0, 1).unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    assert!(device.set_pixel_shader_constant(0, &[1.0, 2.0]).is_err());
    assert_eq!(native.state().count_calls("SetPixelShaderConstantF"), 0);
}
