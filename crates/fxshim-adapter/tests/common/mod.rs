#![allow(dead_code)]

use fxshim_adapter::test_utils::MockProgramRuntime;
use fxshim_adapter::{attach, AdapterConfig, D3d9Adapter, EffectHost};
use fxshim_core::test_utils::{EffectBuilder, MockCompiler};
use fxshim_core::{Annotations, Core, CoreConfig};
use fxshim_d3d8::d3d8::{self, SwapEffect};
use fxshim_d3d8::d3d9::{DeviceType, Direct3D, Format, PresentParameters, WindowHandle};
use fxshim_d3d8::mock::{MockDevice9, MockDirect3D9};
use fxshim_d3d8::{Device8, Direct3D8, ShimConfig};

pub type TestCore = Core<D3d9Adapter<MockDevice9, MockProgramRuntime>>;
pub type TestHost = EffectHost<MockDevice9, MockProgramRuntime>;

pub fn config() -> CoreConfig {
    CoreConfig {
        global_root: "C:/fxshim".into(),
        local_root: "C:/Games/Demo".into(),
        run_root: "C:/Games/Demo".into(),
        target: "demo.exe".into(),
        loader: "d3d8.dll".into(),
    }
}

pub fn native_params() -> PresentParameters {
    PresentParameters {
        back_buffer_width: 320,
        back_buffer_height: 240,
        back_buffer_format: Format::X8R8G8B8,
        back_buffer_count: 1,
        device_window: WindowHandle(0x100),
        windowed: true,
        ..PresentParameters::default()
    }
}

/// A native device without any shim in front of it.
pub fn native_device() -> (MockDevice9, PresentParameters) {
    let mut params = native_params();
    let device = MockDirect3D9::new()
        .create_device(0, DeviceType::HAL, WindowHandle(0x100), 0, &mut params)
        .unwrap();
    (device, params)
}

pub fn detached_core(compiler: MockCompiler) -> TestCore {
    Core::builder(config()).compiler(compiler).build().unwrap()
}

/// A core with an adapter attached to a fresh native device.
pub fn attached(compiler: MockCompiler, runtime: MockProgramRuntime) -> (MockDevice9, TestCore) {
    let (device, params) = native_device();
    let mut core = detached_core(compiler);
    attach(&mut core, device.clone(), runtime, &params).unwrap();
    (device, core)
}

/// One technique with `passes` unnamed-annotation passes.
pub fn technique(passes: &[&str]) -> EffectBuilder {
    EffectBuilder::new().technique(
        "Main",
        Annotations::new(),
        passes.iter().map(|pass| (*pass, Annotations::new())).collect(),
    )
}

pub fn legacy_params() -> d3d8::PresentParameters {
    d3d8::PresentParameters {
        back_buffer_width: 320,
        back_buffer_height: 240,
        back_buffer_format: Format::X8R8G8B8,
        back_buffer_count: 1,
        swap_effect: SwapEffect::DISCARD,
        device_window: WindowHandle(0x100),
        windowed: true,
        enable_auto_depth_stencil: true,
        auto_depth_stencil_format: Format::D24S8,
        ..d3d8::PresentParameters::default()
    }
}

/// A device shim running an effect host over the given compiler.
pub fn hosted(compiler: MockCompiler, config: AdapterConfig) -> (MockDirect3D9, Device8<MockDevice9, TestHost>) {
    let native = MockDirect3D9::new();
    let handle = native.clone();
    let factory = Direct3D8::create(d3d8::SDK_VERSION, ShimConfig::default(), move |_| Some(handle)).unwrap();
    let host = EffectHost::new(config, detached_core(compiler), MockProgramRuntime::new());
    let mut params = legacy_params();
    let device = factory
        .create_device(0, DeviceType::HAL, WindowHandle(0x100), 0, &mut params, host)
        .unwrap();
    (native, device)
}
