//! In-memory collaborators for tests: a scripted compiler, a filesystem and an adapter that
//! records every call.

use hashbrown::{HashMap, HashSet};

use crate::annotation::Annotations;
use crate::effect::{Effect, Pass};
use crate::error::{CompileError, CoreError, CoreResult};
use crate::filesystem::copy_rgba_region;
use crate::logger::LogLevel;
use crate::parameter::Parameter;
use crate::runtime::{
    Adapter, CompiledEffect, EffectCompiler, File, FileSystem, Image, ParameterDecl, PassDecl, PassPrograms,
    TechniqueDecl,
};
use crate::texture::{Texture, TextureRef};
use crate::types::{ParameterHandle, ParameterType, ProgramHandle, TextureDesc, TextureFormat, TextureHandle, TextureRegion};

/// Builds a [`CompiledEffect`] in source order.
#[derive(Debug, Default)]
pub struct EffectBuilder {
    effect: CompiledEffect,
    next_program: u64,
}

impl EffectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parameter(mut self, name: &str, ty: ParameterType, annotations: Annotations) -> Self {
        let handle = ParameterHandle(self.effect.parameters.len() as u64 + 1);
        self.effect.parameters.push(ParameterDecl {
            name: name.to_owned(),
            ty,
            handle,
            annotations,
        });
        self
    }

    /// Adds a technique whose passes each get a fresh vertex and fragment program.
    pub fn technique(mut self, name: &str, annotations: Annotations, passes: Vec<(&str, Annotations)>) -> Self {
        let passes = passes
            .into_iter()
            .map(|(pass, annotations)| {
                self.next_program += 2;
                PassDecl {
                    name: (!pass.is_empty()).then(|| pass.to_owned()),
                    programs: PassPrograms {
                        vertex: Some(ProgramHandle(self.next_program - 1)),
                        fragment: Some(ProgramHandle(self.next_program)),
                        geometry: None,
                    },
                    annotations,
                }
            })
            .collect();
        self.effect.techniques.push(TechniqueDecl {
            name: (!name.is_empty()).then(|| name.to_owned()),
            passes,
            annotations,
        });
        self
    }

    pub fn build(self) -> CompiledEffect {
        self.effect
    }
}

/// Compiler serving pre-built effects by path.
#[derive(Debug, Default)]
pub struct MockCompiler {
    effects: HashMap<String, CompiledEffect>,
    invalid: HashSet<String>,
    pending: Vec<(LogLevel, String)>,
    /// Paths passed to [`EffectCompiler::compile`], in call order.
    pub compiled: Vec<String>,
}

impl MockCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_effect(mut self, path: &str, effect: CompiledEffect) -> Self {
        self.effects.insert(path.to_owned(), effect);
        self
    }

    /// Techniques with this name fail validation.
    pub fn with_invalid_technique(mut self, name: &str) -> Self {
        self.invalid.insert(name.to_owned());
        self
    }

    pub fn with_message(mut self, level: LogLevel, message: &str) -> Self {
        self.pending.push((level, message.to_owned()));
        self
    }

    fn lookup(&self, path: &str) -> Option<&CompiledEffect> {
        self.effects.get(path).or_else(|| {
            let file_name = path.rsplit(['/', '\\']).next()?;
            self.effects.get(file_name)
        })
    }
}

impl EffectCompiler for MockCompiler {
    fn compile(&mut self, path: &str, _args: &[String]) -> Result<CompiledEffect, CompileError> {
        self.compiled.push(path.to_owned());
        self.lookup(path)
            .cloned()
            .ok_or_else(|| CompileError::NotFound(path.to_owned()))
    }

    fn validate_technique(&self, _effect: &CompiledEffect, technique: &TechniqueDecl) -> bool {
        technique.name.as_ref().map_or(true, |name| !self.invalid.contains(name))
    }

    fn take_messages(&mut self) -> Vec<(LogLevel, String)> {
        std::mem::take(&mut self.pending)
    }
}

/// An RGBA8 image held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl MemoryImage {
    /// An image whose texels are all `rgba`.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self {
            width,
            height,
            pixels: rgba.repeat(width as usize * height as usize),
        }
    }
}

impl Image for MemoryImage {
    fn desc(&self) -> TextureDesc {
        TextureDesc::new_2d(self.width, self.height, TextureFormat::Rgba8)
    }

    fn copy_region(&self, region: &TextureRegion) -> Option<Vec<u8>> {
        copy_rgba_region(&self.pixels, self.width, self.height, region)
    }
}

#[derive(Debug, Clone)]
struct MemoryFile {
    path: String,
    bytes: Vec<u8>,
    image: Option<MemoryImage>,
}

impl File for MemoryFile {
    fn path(&self) -> &str {
        &self.path
    }

    fn read(&self) -> std::io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }

    fn open_image(&self) -> Option<Box<dyn Image>> {
        self.image.clone().map(|image| Box::new(image) as Box<dyn Image>)
    }
}

/// Filesystem whose files live in a map. Lookups resolve a bare name to `root/name`.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    root: String,
    files: HashMap<String, MemoryFile>,
}

impl MemoryFileSystem {
    pub fn new(root: &str) -> Self {
        Self {
            root: root.to_owned(),
            files: HashMap::new(),
        }
    }

    pub fn with_file(mut self, name: &str, bytes: &[u8]) -> Self {
        self.insert(name, bytes.to_vec(), None);
        self
    }

    pub fn with_image(mut self, name: &str, image: MemoryImage) -> Self {
        self.insert(name, Vec::new(), Some(image));
        self
    }

    fn insert(&mut self, name: &str, bytes: Vec<u8>, image: Option<MemoryImage>) {
        let path = format!("{}/{name}", self.root);
        self.files.insert(name.to_owned(), MemoryFile { path, bytes, image });
    }
}

impl FileSystem for MemoryFileSystem {
    fn find_file(&self, name: &str) -> Option<Box<dyn File>> {
        self.files
            .get(name)
            .cloned()
            .map(|file| Box::new(file) as Box<dyn File>)
    }
}

/// Adapter that issues sequential texture handles and records what the core asked of it.
#[derive(Debug, Default)]
pub struct RecordingAdapter {
    next_handle: usize,
    failing_passes: HashSet<String>,
    fail_texture_creation: bool,
    pub loaded_passes: Vec<String>,
    pub unloaded_passes: Vec<String>,
    pub created_textures: Vec<(String, TextureDesc)>,
    pub released_textures: Vec<String>,
    /// Texture name and the bytes uploaded into it.
    pub uploads: Vec<(String, Vec<u8>)>,
    /// Parameter name and texture name.
    pub connections: Vec<(String, String)>,
    /// Full names of the techniques drawn.
    pub draws: Vec<String>,
}

impl RecordingAdapter {
    pub fn new() -> Self {
        Self {
            next_handle: 0x100,
            ..Self::default()
        }
    }

    /// Passes with this full name fail to load.
    pub fn failing_pass(mut self, full_name: &str) -> Self {
        self.failing_passes.insert(full_name.to_owned());
        self
    }

    pub fn failing_textures(mut self) -> Self {
        self.fail_texture_creation = true;
        self
    }
}

impl Adapter for RecordingAdapter {
    fn load_pass(&mut self, pass: &Pass) -> bool {
        if self.failing_passes.contains(pass.full_name()) {
            return false;
        }
        self.loaded_passes.push(pass.full_name().to_owned());
        true
    }

    fn unload_pass(&mut self, pass: &Pass) {
        self.unloaded_passes.push(pass.full_name().to_owned());
    }

    fn create_texture(&mut self, name: &str, desc: &TextureDesc) -> CoreResult<TextureHandle> {
        if self.fail_texture_creation {
            return Err(CoreError::adapter(std::io::Error::other(format!("cannot create `{name}`"))));
        }
        self.next_handle += 1;
        self.created_textures.push((name.to_owned(), *desc));
        Ok(TextureHandle(self.next_handle))
    }

    fn load_texture(&mut self, image: &dyn Image, region: &TextureRegion, texture: &Texture) -> bool {
        match image.copy_region(region) {
            Some(bytes) => {
                self.uploads.push((texture.name().to_owned(), bytes));
                true
            }
            None => false,
        }
    }

    fn release_texture(&mut self, texture: &Texture) {
        self.released_textures.push(texture.name().to_owned());
    }

    fn connect_texture(&mut self, parameter: &Parameter, texture: &TextureRef) -> bool {
        self.connections
            .push((parameter.name().to_owned(), texture.name().to_owned()));
        true
    }

    fn draw_effect(&mut self, effect: &Effect) -> CoreResult<()> {
        let technique = effect.require_default_technique()?;
        self.draws.push(technique.full_name().to_owned());
        Ok(())
    }
}
