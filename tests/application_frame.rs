use fxshim::adapter::test_utils::MockProgramRuntime;
use fxshim::adapter::{AdapterConfig, EffectHost, LAST_SHADER};
use fxshim::core::test_utils::{EffectBuilder, MockCompiler};
use fxshim::core::{Annotations, Core, CoreConfig};
use fxshim::d3d8::d3d8::{self, SwapEffect};
use fxshim::d3d8::d3d9::{DeviceType, Format, Matrix, Pool, TransformState, Usage, WindowHandle};
use fxshim::d3d8::mock::MockDirect3D9;
use fxshim::d3d8::{Direct3D8, ShimConfig};
use pretty_assertions::assert_eq;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::DEBUG).try_init();
}

fn params() -> d3d8::PresentParameters {
    d3d8::PresentParameters {
        back_buffer_width: 320,
        back_buffer_height: 240,
        back_buffer_format: Format::X8R8G8B8,
        back_buffer_count: 1,
        swap_effect: SwapEffect::DISCARD,
        device_window: WindowHandle(0x100),
        windowed: true,
        ..d3d8::PresentParameters::default()
    }
}

#[test]
fn application_frames_run_through_the_effects() -> anyhow::Result<()> {
    init_tracing();
    let compiled = EffectBuilder::new()
        .technique("Grade", Annotations::new(), vec![("tone", Annotations::new())])
        .build();
    let compiler = MockCompiler::new().with_effect("grade.fx", compiled);
    let core = Core::builder(CoreConfig::default()).compiler(compiler).build()?;
    let config = AdapterConfig {
        effects: vec!["grade.fx".into()],
        present_texture: Some(LAST_SHADER.into()),
        compile_args: Vec::new(),
    };
    let host = EffectHost::new(config, core, MockProgramRuntime::new());

    let native = MockDirect3D9::new();
    let handle = native.clone();
    let factory = Direct3D8::create(d3d8::SDK_VERSION, ShimConfig::default(), move |_| Some(handle))?;
    let mut device = factory.create_device(0, DeviceType::HAL, WindowHandle(0x100), 0, &mut params(), host)?;

    // One frame of application rendering.
    let texture = device.create_texture(64, 64, 1, Usage::empty(), Format::A8R8G8B8, Pool::DEFAULT)?;
    device.set_transform(TransformState::VIEW, &Matrix::IDENTITY)?;
    device.begin_scene()?;
    device.end_scene()?;
    device.present(None, None, None)?;

    {
        let state = native.state();
        assert_eq!(state.presents, 1);
        assert_eq!(state.draws.len(), 1);
        assert_eq!(state.render_targets[0], state.back_buffer);
        assert_eq!(state.copies.last().map(|copy| copy.2), state.back_buffer);
    }

    // The application drops its default-pool texture before resetting, the host does the same.
    device.release_resource(texture)?;
    device.reset(&mut params())?;
    assert_eq!(native.state().resets, 1);
    assert!(device.hook().is_attached());

    device.present(None, None, None)?;
    assert_eq!(native.state().draws.len(), 2);
    Ok(())
}
