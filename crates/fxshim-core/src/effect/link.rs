//! The link cycle run on every freshly compiled effect.
//!
//! Every failure here is an authoring problem in one parameter, technique or pass. Each is
//! logged and skipped so the rest of the effect stays usable.

use std::rc::Rc;

use crate::annotation::{AnnotationValue, Annotations};
use crate::context::register_texture;
use crate::effect::{Effect, Pass, Technique, MAX_PASS_TARGETS};
use crate::parameter::{GlobalParameters, Parameter, ParameterRef};
use crate::parser::{ParseFlags, VariableParser};
use crate::runtime::{Adapter, CompiledEffect, EffectCompiler, FileSystem, PassDecl, TechniqueDecl};
use crate::texture::{TextureRef, TextureTable};
use crate::types::{ParameterCategory, TextureDesc, TextureFormat, TextureRegion, TextureStage};

/// Annotations naming the global a parameter receives its value from, in lookup order.
const GLOBAL_SOURCE_KEYS: [&str; 2] = ["source", "parameter"];

pub(crate) struct Linker<'a, A: Adapter> {
    pub textures: &'a mut TextureTable,
    pub globals: &'a GlobalParameters,
    pub parser: &'a VariableParser,
    pub filesystem: Option<&'a dyn FileSystem>,
    pub adapter: Option<&'a mut A>,
}

impl<A: Adapter> Linker<'_, A> {
    /// Links parameters first, then validates techniques in source order and links the ones
    /// that pass.
    pub fn link(&mut self, name: &str, compiled: &CompiledEffect, compiler: &dyn EffectCompiler) -> Effect {
        let mut parameters = Vec::with_capacity(compiled.parameters.len());
        for decl in &compiled.parameters {
            let parameter = Parameter::new_physical(decl.name.clone(), decl.ty, decl.handle, decl.annotations.clone());
            self.link_parameter(&parameter);
            parameters.push(parameter);
        }

        let mut techniques = Vec::new();
        for (index, decl) in compiled.techniques.iter().enumerate() {
            let technique_name = decl.name.clone().unwrap_or_else(|| format!("technique{index}"));
            let full_name = format!("{name}::{technique_name}");
            if !compiler.validate_technique(compiled, decl) {
                tracing::warn!(technique = %full_name, "technique failed to validate");
                continue;
            }
            tracing::debug!(technique = %full_name, "validated technique");
            techniques.push(Rc::new(self.link_technique(technique_name, full_name, decl)));
        }

        Effect::new(name.to_owned(), parameters, techniques)
    }

    fn link_parameter(&mut self, parameter: &ParameterRef) {
        let annotations = parameter.annotations();
        if let Some(key) = GLOBAL_SOURCE_KEYS.into_iter().find(|key| annotations.contains(key)) {
            match annotations.string(key) {
                Ok(Some(global_name)) if !global_name.is_empty() => {
                    match self.globals.get(global_name, parameter.ty()) {
                        Some(global) => match global.attach(parameter) {
                            Ok(()) => tracing::debug!(parameter = parameter.name(), global = global_name, "linked to global"),
                            Err(err) => tracing::warn!(parameter = parameter.name(), %err, "unable to link to global"),
                        },
                        None => tracing::warn!(
                            parameter = parameter.name(),
                            global = global_name,
                            "unable to find global parameter"
                        ),
                    }
                }
                _ => tracing::warn!(parameter = parameter.name(), "unable to read global annotation"),
            }
            return;
        }

        if parameter.category() == ParameterCategory::Sampler {
            self.link_sampler(parameter);
        }
    }

    fn link_sampler(&mut self, parameter: &ParameterRef) {
        let raw_name = match parameter.annotations().string("texture") {
            Ok(Some(name)) if !name.is_empty() => name,
            Ok(Some(_)) => {
                tracing::warn!(parameter = parameter.name(), "could not retrieve texture name");
                return;
            }
            Ok(None) | Err(_) => {
                tracing::warn!(parameter = parameter.name(), "could not retrieve texture annotation");
                return;
            }
        };
        let name = self.parser.parse(raw_name, ParseFlags::empty());

        match self.textures.get(&name) {
            Some(texture) => self.connect(parameter, &texture),
            None => {
                tracing::warn!(
                    parameter = parameter.name(),
                    texture = %name,
                    "could not find texture, attempting to create it"
                );
                self.create_parameter_texture(parameter, &name);
            }
        }
    }

    fn connect(&mut self, parameter: &ParameterRef, texture: &TextureRef) {
        if let Err(err) = parameter.set_texture(Some(texture.clone())) {
            tracing::warn!(parameter = parameter.name(), %err, "cannot bind texture");
            return;
        }
        if let Some(adapter) = self.adapter.as_deref_mut() {
            if !adapter.connect_texture(parameter, texture) {
                tracing::warn!(parameter = parameter.name(), texture = texture.name(), "adapter refused texture");
            }
        }
    }

    fn create_parameter_texture(&mut self, parameter: &ParameterRef, name: &str) {
        let annotations = parameter.annotations();

        let size = match read_extent(annotations, "size", 1) {
            Ok(size) => size,
            Err(reason) => {
                tracing::error!(parameter = parameter.name(), "invalid texture size: {reason}");
                return;
            }
        };
        let origin = match read_extent(annotations, "origin", 0) {
            Ok(origin) => origin.unwrap_or([0; 3]),
            Err(reason) => {
                tracing::error!(parameter = parameter.name(), "invalid texture origin: {reason}");
                return;
            }
        };
        let format = match annotations.string("format") {
            Ok(Some(raw)) => match raw.parse::<TextureFormat>() {
                Ok(format) => format,
                Err(err) => {
                    tracing::error!(parameter = parameter.name(), %err, "invalid texture format");
                    return;
                }
            },
            Ok(None) => {
                tracing::error!(parameter = parameter.name(), "texture format annotation missing");
                return;
            }
            Err(kind) => {
                tracing::error!(parameter = parameter.name(), kind, "texture format annotation is not a string");
                return;
            }
        };
        let mipmaps = annotations.flag("mipmaps");
        let render_target = annotations.flag("target");

        let image = self.filesystem.and_then(|fs| fs.find_file(name)).and_then(|file| {
            let image = file.open_image();
            if image.is_none() {
                tracing::warn!(path = file.path(), "file is not a valid image");
            }
            image
        });
        if image.is_none() && !render_target {
            tracing::warn!(texture = name, "unable to find texture file");
        }

        let [width, height, depth] = match (size, &image) {
            (Some(size), _) => size,
            (None, Some(image)) => {
                let full = image.desc();
                [
                    full.width.saturating_sub(origin[0]),
                    full.height.saturating_sub(origin[1]),
                    full.depth.max(1).saturating_sub(origin[2]).max(1),
                ]
            }
            (None, None) => {
                tracing::error!(parameter = parameter.name(), "texture has neither a size nor a source file");
                return;
            }
        };
        let region = TextureRegion {
            desc: TextureDesc {
                width,
                height,
                depth,
                mipmaps,
                render_target,
                format,
            },
            origin,
        };

        let Some(adapter) = self.adapter.as_deref_mut() else {
            tracing::warn!(texture = name, "no adapter, texture cannot be created");
            return;
        };
        let texture = match register_texture(adapter, self.textures, name, &region.desc) {
            Ok(texture) => texture,
            Err(err) => {
                tracing::error!(texture = name, %err, "failed to create texture");
                return;
            }
        };
        if let Some(image) = image {
            if !adapter.load_texture(image.as_ref(), &region, &texture) {
                tracing::warn!(texture = name, "adapter was unable to load texture data");
            }
        }
        self.connect(parameter, &texture);
    }

    fn link_technique(&mut self, name: String, full_name: String, decl: &TechniqueDecl) -> Technique {
        let target = self.resolve_target(&full_name, &decl.annotations, "target", TextureStage::ShaderTarget);
        let passes = decl
            .passes
            .iter()
            .enumerate()
            .map(|(index, pass)| self.link_pass(&full_name, index, pass))
            .collect();
        Technique {
            name,
            full_name,
            target,
            passes,
            annotations: decl.annotations.clone(),
        }
    }

    fn link_pass(&mut self, technique: &str, index: usize, decl: &PassDecl) -> Pass {
        let name = decl.name.clone().unwrap_or_else(|| format!("pass{index}"));
        let full_name = format!("{technique}::{name}");
        let targets = self.pass_targets(&full_name, &decl.annotations);
        let mut pass = Pass {
            name,
            full_name,
            programs: decl.programs,
            targets,
            annotations: decl.annotations.clone(),
            loaded: false,
        };

        match self.adapter.as_deref_mut() {
            Some(adapter) => {
                pass.loaded = adapter.load_pass(&pass);
                if pass.loaded {
                    tracing::info!(pass = %pass.full_name, "loaded pass");
                } else {
                    tracing::error!(pass = %pass.full_name, "failed to load pass");
                }
            }
            None => tracing::warn!(pass = %pass.full_name, "no adapter, pass must be loaded later"),
        }
        pass
    }

    /// Primary target from `target` (or `target0`), then `target1`.. until the first gap.
    fn pass_targets(&self, owner: &str, annotations: &Annotations) -> Vec<TextureRef> {
        let primary_key = if !annotations.contains("target") && annotations.contains("target0") {
            "target0"
        } else {
            "target"
        };
        let mut targets: Vec<TextureRef> = self
            .resolve_target(owner, annotations, primary_key, TextureStage::PassTarget)
            .into_iter()
            .collect();
        if targets.is_empty() {
            return targets;
        }

        for index in 1..MAX_PASS_TARGETS {
            let key = format!("target{index}");
            let name = match annotations.string(&key) {
                Ok(Some(name)) => self.parser.parse(name, ParseFlags::empty()),
                Ok(None) => break,
                Err(kind) => {
                    tracing::warn!(pass = owner, key = %key, kind, "target annotation of invalid type");
                    break;
                }
            };
            match self.textures.get(&name) {
                Some(texture) => targets.push(texture),
                None => {
                    tracing::warn!(pass = owner, target = %name, "cannot find target, later targets ignored");
                    break;
                }
            }
        }
        targets
    }

    /// Resolves a named target annotation, falling back to the stage texture when it is absent,
    /// mistyped or names an unknown texture.
    fn resolve_target(
        &self,
        owner: &str,
        annotations: &Annotations,
        key: &str,
        fallback: TextureStage,
    ) -> Option<TextureRef> {
        match annotations.string(key) {
            Ok(Some(raw)) => {
                let name = self.parser.parse(raw, ParseFlags::empty());
                if let Some(texture) = self.textures.get(&name) {
                    return Some(texture);
                }
                tracing::warn!(owner, target = %name, "cannot find target");
            }
            Ok(None) => tracing::debug!(owner, "no target annotation"),
            Err(kind) => tracing::warn!(owner, kind, "annotation \"{key}\" of invalid type"),
        }
        self.textures.stage(fallback)
    }
}

/// Reads a 1, 2 or 3 component integer annotation, filling missing dimensions with `fill`.
fn read_extent(annotations: &Annotations, key: &str, fill: u32) -> Result<Option<[u32; 3]>, String> {
    let values = match annotations.get(key) {
        None => {
            tracing::debug!("no texture {key} found");
            return Ok(None);
        }
        Some(AnnotationValue::Int(values)) => values,
        Some(other) => return Err(format!("`{key}` is a {} annotation", other.kind())),
    };
    match values.len() {
        1..=3 => tracing::debug!("{}-dimensional texture {key} found", values.len()),
        4 => return Err(format!("4-dimensional `{key}`")),
        n => return Err(format!("`{key}` has {n} components")),
    }

    let mut extent = [fill; 3];
    for (slot, value) in extent.iter_mut().zip(values) {
        *slot = u32::try_from(*value).map_err(|_| format!("negative `{key}` component {value}"))?;
    }
    Ok(Some(extent))
}
