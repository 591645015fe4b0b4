//! Linked effects: techniques in priority order, their passes and the effect's parameters.

mod link;

use std::fmt;
use std::rc::Rc;

use crate::annotation::Annotations;
use crate::error::{CoreError, CoreResult};
use crate::parameter::ParameterRef;
use crate::runtime::PassPrograms;
use crate::texture::TextureRef;
use crate::types::{ProgramHandle, ProgramStage};

pub(crate) use link::Linker;

/// Highest render target index a pass can write (`target3`).
pub const MAX_PASS_TARGETS: usize = 4;

/// A compiled and linked effect.
///
/// Only techniques that validated on the current hardware are retained, in source order; the
/// first of them is the default unless changed with [`Effect::set_default_technique`].
pub struct Effect {
    name: String,
    parameters: Vec<ParameterRef>,
    techniques: Vec<Rc<Technique>>,
    default_technique: Option<Rc<Technique>>,
}

impl Effect {
    pub(crate) fn new(name: String, parameters: Vec<ParameterRef>, techniques: Vec<Rc<Technique>>) -> Self {
        let default_technique = techniques.first().cloned();
        Self {
            name,
            parameters,
            techniques,
            default_technique,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn parameter(&self, index: usize) -> Option<&ParameterRef> {
        self.parameters.get(index)
    }

    pub fn parameter_by_name(&self, name: &str) -> Option<&ParameterRef> {
        self.parameters.iter().find(|p| p.name() == name)
    }

    pub fn parameters(&self) -> &[ParameterRef] {
        &self.parameters
    }

    pub fn technique_count(&self) -> usize {
        self.techniques.len()
    }

    pub fn technique(&self, index: usize) -> Option<&Rc<Technique>> {
        self.techniques.get(index)
    }

    pub fn technique_by_name(&self, name: &str) -> Option<&Rc<Technique>> {
        self.techniques.iter().find(|t| t.name() == name)
    }

    pub fn techniques(&self) -> &[Rc<Technique>] {
        &self.techniques
    }

    pub fn default_technique(&self) -> Option<&Rc<Technique>> {
        self.default_technique.as_ref()
    }

    /// The default technique, for callers that cannot proceed without one.
    pub fn require_default_technique(&self) -> CoreResult<&Rc<Technique>> {
        self.default_technique
            .as_ref()
            .ok_or_else(|| CoreError::NoValidTechnique(self.name.clone()))
    }

    pub fn set_default_technique(&mut self, technique: &Rc<Technique>) -> CoreResult<()> {
        if !self.techniques.iter().any(|t| Rc::ptr_eq(t, technique)) {
            tracing::error!(effect = %self.name, technique = %technique.full_name(), "technique belongs to another effect");
            return Err(CoreError::ForeignTechnique {
                effect: self.name.clone(),
                technique: technique.full_name().to_owned(),
            });
        }
        self.default_technique = Some(technique.clone());
        Ok(())
    }

    pub fn set_default_technique_by_name(&mut self, name: &str) -> CoreResult<()> {
        let technique = self
            .technique_by_name(name)
            .cloned()
            .ok_or_else(|| CoreError::UnknownTechnique(format!("{}::{name}", self.name)))?;
        self.set_default_technique(&technique)
    }

    /// Every pass of every retained technique.
    pub fn passes(&self) -> impl Iterator<Item = &Pass> {
        self.techniques.iter().flat_map(|t| t.passes())
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("name", &self.name)
            .field("parameters", &self.parameters.len())
            .field("techniques", &self.techniques)
            .finish()
    }
}

#[derive(Debug)]
pub struct Technique {
    name: String,
    full_name: String,
    target: Option<TextureRef>,
    passes: Vec<Pass>,
    annotations: Annotations,
}

impl Technique {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `effect::technique`.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Texture receiving the technique's final output.
    pub fn target(&self) -> Option<&TextureRef> {
        self.target.as_ref()
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn pass(&self, index: usize) -> Option<&Pass> {
        self.passes.get(index)
    }

    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }
}

#[derive(Debug)]
pub struct Pass {
    name: String,
    full_name: String,
    programs: PassPrograms,
    targets: Vec<TextureRef>,
    annotations: Annotations,
    loaded: bool,
}

impl Pass {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `effect::technique::pass`.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn program(&self, stage: ProgramStage) -> Option<ProgramHandle> {
        match stage {
            ProgramStage::Vertex => self.programs.vertex,
            ProgramStage::Fragment => self.programs.fragment,
            ProgramStage::Geometry => self.programs.geometry,
        }
    }

    pub fn programs(&self) -> &PassPrograms {
        &self.programs
    }

    /// Primary output texture.
    pub fn target(&self) -> Option<&TextureRef> {
        self.targets.first()
    }

    /// Output texture for render target `index`.
    pub fn target_at(&self, index: usize) -> Option<&TextureRef> {
        self.targets.get(index)
    }

    pub fn targets(&self) -> &[TextureRef] {
        &self.targets
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Whether the adapter accepted the pass's programs.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}
