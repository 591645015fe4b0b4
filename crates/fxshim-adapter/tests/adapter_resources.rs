mod common;

use fxshim_adapter::test_utils::MockProgramRuntime;
use fxshim_adapter::{attach, detach, LAST_PASS, LAST_SHADER, SCRATCH, THIS_FRAME};
use fxshim_core::test_utils::{EffectBuilder, MemoryFileSystem, MemoryImage, MockCompiler};
use fxshim_core::{
    AnnotationValue, Annotations, Core, CoreError, ParameterType, TextureDesc, TextureFormat, TextureStage,
};
use fxshim_d3d8::d3d9::{Device, Format, ObjectRefs, Pool, ResourceApi, Usage};
use pretty_assertions::assert_eq;

#[test]
fn attach_creates_frame_textures_and_globals() {
    let (device, core) = common::attached(MockCompiler::new(), MockProgramRuntime::new());

    for name in [THIS_FRAME, SCRATCH, LAST_PASS, LAST_SHADER] {
        let texture = core.get_texture(name).unwrap();
        assert_eq!((texture.desc().width, texture.desc().height), (320, 240));
        assert!(texture.desc().render_target);
        let native = core.adapter().unwrap().native_texture(&texture).unwrap();
        let desc = device.texture_level_desc(native, 0).unwrap();
        assert_eq!(desc.format, Format::X8R8G8B8);
        assert_eq!(desc.pool, Pool::DEFAULT);
        assert!(desc.usage.contains(Usage::RENDERTARGET));
    }
    assert_eq!(core.stage_texture(TextureStage::ShaderTarget).unwrap().name(), LAST_SHADER);
    assert_eq!(core.stage_texture(TextureStage::PassTarget).unwrap().name(), LAST_PASS);
    for name in ["matrix_view", "matrix_proj", "matrix_world"] {
        assert!(core.get_parameter(name, ParameterType::Matrix).is_some(), "{name}");
    }
}

#[test]
fn second_attach_is_refused() {
    let (device, mut core) = common::attached(MockCompiler::new(), MockProgramRuntime::new());
    let params = common::native_params();
    assert!(attach(&mut core, device.clone(), MockProgramRuntime::new(), &params).is_err());
    assert_eq!(core.textures().len(), 4);
}

#[test]
fn detach_releases_everything_so_reset_succeeds() {
    let compiled = common::technique(&["a", "b"]).build();
    let (device, mut core) = common::attached(
        MockCompiler::new().with_effect("fx.fx", compiled),
        MockProgramRuntime::new(),
    );
    let effect = core.create_effect("fx.fx", &[]).unwrap();
    core.draw_effect(&effect).unwrap();

    let mut params = common::native_params();
    assert!(device.reset(&mut params).is_err());

    core.destroy_effect(effect);
    let runtime = detach(&mut core).unwrap();
    assert_eq!(runtime.loaded_count(), 0);
    assert!(core.textures().is_empty());
    assert!(core.get_parameter("matrix_view", ParameterType::Matrix).is_none());
    assert_eq!(device.state().live_objects(), 0);
    device.reset(&mut params).unwrap();

    // And the runtime can be handed to a new adapter.
    attach(&mut core, device.clone(), runtime, &params).unwrap();
    assert_eq!(core.textures().len(), 4);
}

#[test]
fn detach_without_adapter_is_harmless() {
    let mut core = common::detached_core(MockCompiler::new());
    assert!(detach(&mut core).is_none());
}

#[test]
fn failed_attach_can_be_cleaned_up() {
    let (device, params) = common::native_device();
    device.state_mut().reject_render_target_textures = true;
    let mut core = common::detached_core(MockCompiler::new());

    let err = attach(&mut core, device.clone(), MockProgramRuntime::new(), &params).unwrap_err();
    assert!(format!("{err:#}").contains(THIS_FRAME));
    assert!(detach(&mut core).is_some());
    assert_eq!(device.state().live_objects(), 0);
}

#[test]
fn texture_formats_map_to_native_pools() {
    let (device, mut core) = common::attached(MockCompiler::new(), MockProgramRuntime::new());

    let managed = core
        .create_texture("lut", &TextureDesc::new_2d(16, 16, TextureFormat::Rgba16F))
        .unwrap();
    let native = core.adapter().unwrap().native_texture(&managed).unwrap();
    let desc = device.texture_level_desc(native, 0).unwrap();
    assert_eq!((desc.format, desc.pool), (Format::A16B16G16R16F, Pool::MANAGED));

    let depth = core
        .create_texture("depth", &TextureDesc::new_2d(16, 16, TextureFormat::D16))
        .unwrap();
    let native = core.adapter().unwrap().native_texture(&depth).unwrap();
    let desc = device.texture_level_desc(native, 0).unwrap();
    assert!(desc.usage.contains(Usage::DEPTHSTENCIL));
    assert_eq!(desc.pool, Pool::DEFAULT);

    let unknown = core.create_texture("odd", &TextureDesc::new_2d(16, 16, TextureFormat::Unknown));
    assert!(matches!(unknown, Err(CoreError::Adapter(_))));
    assert!(core.get_texture("odd").is_none());
}

#[test]
fn sampler_image_is_uploaded_and_connected() {
    let compiled = EffectBuilder::new()
        .parameter(
            "noise",
            ParameterType::Sampler2D,
            Annotations::new()
                .with("texture", AnnotationValue::String("noise.png".into()))
                .with("format", AnnotationValue::String("RGBA8".into())),
        )
        .technique("Main", Annotations::new(), vec![("p", Annotations::new())])
        .build();
    let files = MemoryFileSystem::new("C:/fxshim/textures").with_image("noise.png", MemoryImage::solid(4, 3, [1, 2, 3, 4]));
    let mut core: common::TestCore = Core::builder(common::config())
        .compiler(MockCompiler::new().with_effect("noise.fx", compiled))
        .filesystem(files)
        .build()
        .unwrap();
    let (device, params) = common::native_device();
    attach(&mut core, device.clone(), MockProgramRuntime::new(), &params).unwrap();

    let effect = core.create_effect("noise.fx", &[]).unwrap();
    let texture = core.get_texture("noise.png").unwrap();
    let native = core.adapter().unwrap().native_texture(&texture).unwrap();

    let surface = device.texture_surface_level(native, 0).unwrap();
    device.release_object(surface);
    assert_eq!(device.state().uploads, [(surface, 4 * 3 * 4)]);
    let handle = effect.parameter_by_name("noise").unwrap().handle().unwrap();
    assert!(core
        .adapter()
        .unwrap()
        .runtime()
        .textures
        .contains(&(handle, Some(native))));
}
