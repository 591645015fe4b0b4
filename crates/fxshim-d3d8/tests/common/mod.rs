#![allow(dead_code)]

use fxshim_d3d8::d3d8::{self, PresentParameters, SwapEffect};
use fxshim_d3d8::d3d9::{DeviceType, Format, WindowHandle};
use fxshim_d3d8::mock::{MockDevice9, MockDirect3D9};
use fxshim_d3d8::{Device8, Direct3D8, FrameHook, NoHook, ShimConfig};

pub fn windowed_params() -> PresentParameters {
    PresentParameters {
        back_buffer_width: 320,
        back_buffer_height: 240,
        back_buffer_format: Format::X8R8G8B8,
        back_buffer_count: 1,
        swap_effect: SwapEffect::DISCARD,
        device_window: WindowHandle(0x100),
        windowed: true,
        enable_auto_depth_stencil: true,
        auto_depth_stencil_format: Format::D24S8,
        ..PresentParameters::default()
    }
}

pub fn factory(config: ShimConfig) -> (MockDirect3D9, Direct3D8<MockDirect3D9>) {
    let native = MockDirect3D9::new();
    let handle = native.clone();
    let factory = Direct3D8::create(d3d8::SDK_VERSION, config, move |_| Some(handle)).unwrap();
    (native, factory)
}

pub fn device_with<H: FrameHook<MockDevice9>>(config: ShimConfig, hook: H) -> (MockDirect3D9, Device8<MockDevice9, H>) {
    let (native, factory) = factory(config);
    let mut params = windowed_params();
    let device = factory
        .create_device(0, DeviceType::HAL, WindowHandle(0x100), 0, &mut params, hook)
        .unwrap();
    (native, device)
}

pub fn device() -> (MockDirect3D9, Device8<MockDevice9, NoHook>) {
    device_with(ShimConfig::default(), NoHook)
}
