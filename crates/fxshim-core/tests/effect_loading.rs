mod common;

use std::rc::Rc;

use common::{annotations, ints, string};
use fxshim_core::test_utils::{EffectBuilder, MemoryFileSystem, MockCompiler, RecordingAdapter};
use fxshim_core::{
    Annotations, CompileError, Core, CoreError, LogLevel, ProgramHandle, ProgramStage, TextureDesc, TextureFormat,
};
use pretty_assertions::assert_eq;

fn quality_tiers() -> MockCompiler {
    let effect = EffectBuilder::new()
        .technique("HighQuality", Annotations::new(), vec![("p0", Annotations::new())])
        .technique("Standard", Annotations::new(), vec![("p0", Annotations::new())])
        .build();
    MockCompiler::new()
        .with_effect("test.cgfx", effect)
        .with_invalid_technique("HighQuality")
}

#[test]
fn first_valid_technique_becomes_default() {
    let mut core = common::core(quality_tiers());
    let effect = core.create_effect("test.cgfx", &[]).unwrap();

    assert_eq!(effect.technique_count(), 1);
    assert_eq!(effect.default_technique().unwrap().name(), "Standard");
    assert!(effect.technique_by_name("HighQuality").is_none());
}

#[test]
fn technique_count_only_includes_valid_techniques() {
    let compiled = EffectBuilder::new()
        .technique("T1", Annotations::new(), vec![("p", Annotations::new())])
        .technique("T2", Annotations::new(), vec![("p", Annotations::new())])
        .technique("T3", Annotations::new(), vec![("p", Annotations::new())])
        .build();
    let compiler = MockCompiler::new()
        .with_effect("tiers.fx", compiled)
        .with_invalid_technique("T1");
    let mut core = common::core(compiler);
    let effect = core.create_effect("tiers.fx", &[]).unwrap();

    assert_eq!(effect.technique_count(), 2);
    let default = effect.default_technique().unwrap();
    assert_eq!(default.name(), "T2");
    assert!(Rc::ptr_eq(default, effect.technique(0).unwrap()));
    assert_eq!(effect.technique(1).unwrap().name(), "T3");
    assert!(effect.technique(2).is_none());
}

#[test]
fn names_are_qualified_and_unnamed_items_are_numbered() {
    let compiled = EffectBuilder::new()
        .technique("", Annotations::new(), vec![("", Annotations::new()), ("blur", Annotations::new())])
        .build();
    let mut core = common::core(MockCompiler::new().with_effect("fx/bloom.fx", compiled));
    let effect = core.create_effect("fx/bloom.fx", &[]).unwrap();

    let technique = effect.technique(0).unwrap();
    assert_eq!(technique.name(), "technique0");
    assert_eq!(technique.full_name(), "fx/bloom.fx::technique0");
    let names: Vec<_> = technique.passes().iter().map(|p| p.full_name().to_owned()).collect();
    assert_eq!(names, ["fx/bloom.fx::technique0::pass0", "fx/bloom.fx::technique0::blur"]);
    assert_eq!(technique.pass(1).unwrap().program(ProgramStage::Vertex), Some(ProgramHandle(3)));
    assert_eq!(technique.pass(1).unwrap().program(ProgramStage::Geometry), None);
}

#[test]
fn no_valid_technique_only_fails_when_one_is_required() {
    let compiled = EffectBuilder::new()
        .technique("Only", Annotations::new(), vec![("p", Annotations::new())])
        .build();
    let compiler = MockCompiler::new()
        .with_effect("only.fx", compiled)
        .with_invalid_technique("Only");
    let mut core = common::core(compiler);
    let effect = core.create_effect("only.fx", &[]).unwrap();

    assert_eq!(effect.technique_count(), 0);
    assert!(effect.default_technique().is_none());
    assert!(matches!(effect.require_default_technique(), Err(CoreError::NoValidTechnique(name)) if name == "only.fx"));
    assert!(matches!(core.draw_effect(&effect), Err(CoreError::NoValidTechnique(_))));
    assert!(core.adapter().unwrap().draws.is_empty());
}

#[test]
fn default_technique_can_be_changed_within_the_effect_only() {
    let compiled = || {
        EffectBuilder::new()
            .technique("A", Annotations::new(), vec![("p", Annotations::new())])
            .technique("B", Annotations::new(), vec![("p", Annotations::new())])
            .build()
    };
    let compiler = MockCompiler::new()
        .with_effect("one.fx", compiled())
        .with_effect("two.fx", compiled());
    let mut core = common::core(compiler);
    let mut one = core.create_effect("one.fx", &[]).unwrap();
    let two = core.create_effect("two.fx", &[]).unwrap();

    one.set_default_technique_by_name("B").unwrap();
    assert_eq!(one.default_technique().unwrap().full_name(), "one.fx::B");

    let foreign = two.technique(0).unwrap().clone();
    assert!(matches!(
        one.set_default_technique(&foreign),
        Err(CoreError::ForeignTechnique { technique, .. }) if technique == "two.fx::A"
    ));
    assert!(matches!(one.set_default_technique_by_name("C"), Err(CoreError::UnknownTechnique(name)) if name == "one.fx::C"));
    assert_eq!(one.default_technique().unwrap().name(), "B");

    core.draw_effect(&one).unwrap();
    assert_eq!(core.adapter().unwrap().draws, ["one.fx::B"]);
}

#[test]
fn pass_without_target_and_pass_with_unknown_target_share_the_fallback() {
    let compiled = EffectBuilder::new()
        .technique(
            "Main",
            Annotations::new(),
            vec![
                ("implicit", Annotations::new()),
                ("missing", annotations(&[("target", string("does_not_exist"))])),
            ],
        )
        .build();
    let mut core = common::core(MockCompiler::new().with_effect("target.fx", compiled));
    let (shader_default, pass_default) = common::with_stage_targets(&mut core);
    let effect = core.create_effect("target.fx", &[]).unwrap();

    let technique = effect.default_technique().unwrap();
    let implicit = technique.pass(0).unwrap().target().unwrap();
    let missing = technique.pass(1).unwrap().target().unwrap();
    assert!(Rc::ptr_eq(implicit, &pass_default));
    assert!(Rc::ptr_eq(missing, &pass_default));
    assert!(Rc::ptr_eq(implicit, missing));
    assert!(Rc::ptr_eq(technique.target().unwrap(), &shader_default));
}

#[test]
fn mistyped_target_annotation_falls_back_too() {
    let compiled = EffectBuilder::new()
        .technique(
            "Main",
            annotations(&[("target", ints(&[3]))]),
            vec![("p", annotations(&[("target", ints(&[1]))]))],
        )
        .build();
    let mut core = common::core(MockCompiler::new().with_effect("typed.fx", compiled));
    let (shader_default, pass_default) = common::with_stage_targets(&mut core);
    let effect = core.create_effect("typed.fx", &[]).unwrap();

    let technique = effect.default_technique().unwrap();
    assert!(Rc::ptr_eq(technique.target().unwrap(), &shader_default));
    assert!(Rc::ptr_eq(technique.pass(0).unwrap().target().unwrap(), &pass_default));
}

#[test]
fn named_targets_resolve_through_the_parser() {
    let compiled = EffectBuilder::new()
        .technique(
            "Main",
            annotations(&[("target", string("$(prefix)_final"))]),
            vec![(
                "mrt",
                annotations(&[
                    ("target0", string("bloom_a")),
                    ("target1", string("bloom_b")),
                    ("target3", string("bloom_c")),
                ]),
            )],
        )
        .build();
    let mut core = common::core(MockCompiler::new().with_effect("mrt.fx", compiled));
    core.parser_mut().add_variable("prefix", "bloom");
    let desc = TextureDesc::new_2d(64, 64, TextureFormat::Rgba16F).render_target();
    for name in ["bloom_final", "bloom_a", "bloom_b", "bloom_c"] {
        core.create_texture(name, &desc).unwrap();
    }
    let effect = core.create_effect("mrt.fx", &[]).unwrap();

    let technique = effect.default_technique().unwrap();
    assert_eq!(technique.target().unwrap().name(), "bloom_final");
    let pass = technique.pass(0).unwrap();
    let targets: Vec<_> = pass.targets().iter().map(|t| t.name().to_owned()).collect();
    // target2 is missing, so target3 is never reached.
    assert_eq!(targets, ["bloom_a", "bloom_b"]);
    assert_eq!(pass.target_at(1).unwrap().name(), "bloom_b");
}

#[test]
fn failed_pass_stays_in_the_technique_unloaded() {
    let compiled = EffectBuilder::new()
        .technique(
            "Main",
            Annotations::new(),
            vec![("a", Annotations::new()), ("b", Annotations::new()), ("c", Annotations::new())],
        )
        .build();
    let mut core: Core<RecordingAdapter> = Core::builder(common::config())
        .compiler(MockCompiler::new().with_effect("three.fx", compiled))
        .adapter(RecordingAdapter::new().failing_pass("three.fx::Main::b"))
        .build()
        .unwrap();
    let effect = core.create_effect("three.fx", &[]).unwrap();

    let technique = effect.default_technique().unwrap();
    assert_eq!(technique.pass_count(), 3);
    let loaded: Vec<_> = technique.passes().iter().map(|p| p.is_loaded()).collect();
    assert_eq!(loaded, [true, false, true]);

    core.destroy_effect(effect);
    assert_eq!(
        core.adapter().unwrap().unloaded_passes,
        ["three.fx::Main::a", "three.fx::Main::c"]
    );
}

#[test]
fn effect_path_is_resolved_before_compiling() {
    let compiled = EffectBuilder::new()
        .technique("Main", Annotations::new(), vec![("p", Annotations::new())])
        .build();
    // Only the fully resolved path is known to the compiler.
    let compiler = MockCompiler::new()
        .with_effect("C:/fxshim/effects/bloom.fx", compiled)
        .with_message(LogLevel::Warning, "implicit truncation");
    let mut core: Core<RecordingAdapter> = Core::builder(common::config())
        .compiler(compiler)
        .filesystem(MemoryFileSystem::new("C:/fxshim/effects").with_file("bloom.fx", b"technique Main {}"))
        .adapter(RecordingAdapter::new())
        .build()
        .unwrap();

    let effect = core.create_effect("$(unset)bloom.fx", &[]).unwrap();
    assert_eq!(effect.name(), "$(unset)bloom.fx");
    assert_eq!(effect.technique_count(), 1);
}

#[test]
fn compile_failure_is_reported() {
    let mut core = common::core(MockCompiler::new());
    let err = core.create_effect("absent.fx", &[]).unwrap_err();
    assert!(matches!(err, CoreError::Compile(CompileError::NotFound(path)) if path == "absent.fx"));
}

#[test]
fn passes_wait_for_an_adapter() {
    let compiled = EffectBuilder::new()
        .technique("Main", Annotations::new(), vec![("p", Annotations::new())])
        .build();
    let mut core: Core<RecordingAdapter> = Core::builder(common::config())
        .compiler(MockCompiler::new().with_effect("late.fx", compiled))
        .build()
        .unwrap();
    let effect = core.create_effect("late.fx", &[]).unwrap();

    assert!(!effect.default_technique().unwrap().pass(0).unwrap().is_loaded());
    assert!(matches!(core.draw_effect(&effect), Err(CoreError::NoAdapter)));
}
