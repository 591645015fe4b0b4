#![allow(dead_code)]

use fxshim_core::test_utils::{MockCompiler, RecordingAdapter};
use fxshim_core::{AnnotationValue, Annotations, Core, CoreConfig, TextureDesc, TextureFormat, TextureRef, TextureStage};

pub fn string(value: &str) -> AnnotationValue {
    AnnotationValue::String(value.to_owned())
}

pub fn ints(values: &[i32]) -> AnnotationValue {
    AnnotationValue::Int(values.to_vec())
}

pub fn flag(value: bool) -> AnnotationValue {
    AnnotationValue::Bool(vec![value])
}

pub fn annotations(pairs: &[(&str, AnnotationValue)]) -> Annotations {
    pairs
        .iter()
        .fold(Annotations::new(), |acc, (name, value)| acc.with(name, value.clone()))
}

pub fn config() -> CoreConfig {
    CoreConfig {
        global_root: "C:/fxshim".into(),
        local_root: "C:/Games/Demo".into(),
        run_root: "C:/Games/Demo".into(),
        target: "demo.exe".into(),
        loader: "d3d8.dll".into(),
    }
}

pub fn core(compiler: MockCompiler) -> Core<RecordingAdapter> {
    Core::builder(config())
        .compiler(compiler)
        .adapter(RecordingAdapter::new())
        .build()
        .unwrap()
}

/// Registers the two stage fallback textures the adapter normally provides.
pub fn with_stage_targets(core: &mut Core<RecordingAdapter>) -> (TextureRef, TextureRef) {
    let desc = TextureDesc::new_2d(320, 240, TextureFormat::Rgba8).render_target();
    let shader = core.create_texture(":lastshader", &desc).unwrap();
    let pass = core.create_texture(":lastpass", &desc).unwrap();
    core.set_stage_texture(TextureStage::ShaderTarget, Some(shader.clone()));
    core.set_stage_texture(TextureStage::PassTarget, Some(pass.clone()));
    (shader, pass)
}
