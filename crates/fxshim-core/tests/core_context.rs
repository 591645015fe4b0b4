mod common;

use fxshim_core::test_utils::{MockCompiler, RecordingAdapter};
use fxshim_core::{
    log_message, Core, CoreConfig, CoreError, LogLevel, ParameterType, Texture, TextureDesc, TextureFormat, TextureHandle,
    TextureStage,
};
use pretty_assertions::assert_eq;

#[test]
fn core_cannot_exist_without_a_compiler() {
    let result = Core::<RecordingAdapter>::builder(CoreConfig::default())
        .adapter(RecordingAdapter::new())
        .build();
    assert!(matches!(result, Err(CoreError::NoContext)));
}

#[test]
fn built_in_variables_come_from_the_config() {
    let core = common::core(MockCompiler::new());
    assert_eq!(core.parse("$(globalroot)/effects/$(target).fx"), "C:/fxshim/effects/demo.exe.fx");
    assert_eq!(core.parse("$(LocalRoot)"), "C:/Games/Demo");
}

#[test]
fn texture_names_are_unique() {
    let mut core = common::core(MockCompiler::new());
    let desc = TextureDesc::new_2d(8, 8, TextureFormat::Rgba8);
    core.create_texture("shared", &desc).unwrap();

    assert!(matches!(core.create_texture("shared", &desc), Err(CoreError::DuplicateTexture(name)) if name == "shared"));
    let foreign = Texture::new("shared", TextureHandle(1), desc);
    assert!(matches!(core.add_texture(foreign), Err(CoreError::DuplicateTexture(_))));
    // The rejected creation never reached the adapter.
    assert_eq!(core.adapter().unwrap().created_textures.len(), 1);
}

#[test]
fn removing_a_texture_releases_it_and_clears_its_stage() {
    let mut core = common::core(MockCompiler::new());
    let (_, pass) = common::with_stage_targets(&mut core);
    drop(pass);

    assert!(core.remove_texture(":lastpass"));
    assert!(!core.remove_texture(":lastpass"));
    assert!(core.stage_texture(TextureStage::PassTarget).is_none());
    assert!(core.stage_texture(TextureStage::ShaderTarget).is_some());
    assert_eq!(core.adapter().unwrap().released_textures, [":lastpass"]);

    assert_eq!(core.release_textures(), 1);
    assert!(core.textures().is_empty());
    assert_eq!(core.adapter().unwrap().released_textures, [":lastpass", ":lastshader"]);
}

#[test]
fn texture_creation_needs_an_adapter() {
    let mut core: Core<RecordingAdapter> = Core::builder(CoreConfig::default())
        .compiler(MockCompiler::new())
        .build()
        .unwrap();
    let desc = TextureDesc::new_2d(8, 8, TextureFormat::Rgba8);
    assert!(matches!(core.create_texture("t", &desc), Err(CoreError::NoAdapter)));

    assert!(core.set_adapter(Some(RecordingAdapter::new())).is_none());
    core.create_texture("t", &desc).unwrap();
    assert!(core.get_texture("t").is_some());
}

#[test]
fn global_parameters_are_typed() {
    let mut core = common::core(MockCompiler::new());
    let time = core.create_parameter("time", ParameterType::Float1).unwrap();
    assert!(time.is_virtual());
    assert!(matches!(
        core.create_parameter("time", ParameterType::Float4),
        Err(CoreError::DuplicateParameter(_))
    ));
    assert!(core.get_parameter("time", ParameterType::Float1).is_some());
    assert!(core.get_parameter("time", ParameterType::Matrix).is_none());
    assert!(core.remove_parameter("time"));
    assert!(core.get_parameter("time", ParameterType::Float1).is_none());
}

#[test]
fn log_bridge_accepts_every_level() {
    for level in [LogLevel::Debug, LogLevel::Info, LogLevel::Warning, LogLevel::Error, LogLevel::Fatal] {
        log_message(level, "test", &format!("{level} message"));
    }
}
