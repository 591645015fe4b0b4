//! Interfaces of the collaborators the core drives: the effect compiler, the graphics adapter,
//! the filesystem and the function hook installer.

use crate::annotation::Annotations;
use crate::effect::{Effect, Pass};
use crate::error::{CompileError, CoreResult};
use crate::logger::LogLevel;
use crate::parameter::Parameter;
use crate::texture::{Texture, TextureRef};
use crate::types::{ParameterHandle, ParameterType, ProgramHandle, TextureDesc, TextureHandle, TextureRegion};

/// A parameter as declared in compiled effect source.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDecl {
    pub name: String,
    pub ty: ParameterType,
    pub handle: ParameterHandle,
    pub annotations: Annotations,
}

/// Programs a pass binds, per stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassPrograms {
    pub vertex: Option<ProgramHandle>,
    pub fragment: Option<ProgramHandle>,
    pub geometry: Option<ProgramHandle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassDecl {
    pub name: Option<String>,
    pub programs: PassPrograms,
    pub annotations: Annotations,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TechniqueDecl {
    pub name: Option<String>,
    pub passes: Vec<PassDecl>,
    pub annotations: Annotations,
}

/// Everything the compiler reports about an effect, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledEffect {
    pub parameters: Vec<ParameterDecl>,
    pub techniques: Vec<TechniqueDecl>,
}

/// The external shader compiler (the "context" every effect is created in).
pub trait EffectCompiler {
    fn compile(&mut self, path: &str, args: &[String]) -> Result<CompiledEffect, CompileError>;

    /// Whether every program of the technique can run on the current hardware profile.
    fn validate_technique(&self, effect: &CompiledEffect, technique: &TechniqueDecl) -> bool;

    /// Diagnostics produced since the last call, forwarded to the log.
    fn take_messages(&mut self) -> Vec<(LogLevel, String)> {
        Vec::new()
    }
}

/// The graphics-API side of the core: program loading, texture creation and drawing.
pub trait Adapter {
    /// Loads the programs of a pass. A pass that fails to load is kept but never binds.
    fn load_pass(&mut self, pass: &Pass) -> bool;

    fn unload_pass(&mut self, pass: &Pass);

    /// Creates an empty native texture.
    fn create_texture(&mut self, name: &str, desc: &TextureDesc) -> CoreResult<TextureHandle>;

    /// Fills `texture` from `region` of a decoded image.
    fn load_texture(&mut self, image: &dyn Image, region: &TextureRegion, texture: &Texture) -> bool;

    /// Releases a native texture the core no longer tracks.
    fn release_texture(&mut self, texture: &Texture);

    /// Binds `texture` to a sampler parameter.
    fn connect_texture(&mut self, parameter: &Parameter, texture: &TextureRef) -> bool;

    /// Runs the default technique of `effect`.
    fn draw_effect(&mut self, effect: &Effect) -> CoreResult<()>;
}

/// A searchable set of directories.
pub trait FileSystem {
    fn find_file(&self, name: &str) -> Option<Box<dyn File>>;
}

pub trait File {
    fn path(&self) -> &str;
    fn read(&self) -> std::io::Result<Vec<u8>>;
    /// Decodes the file as an image; `None` when it is not one.
    fn open_image(&self) -> Option<Box<dyn Image>>;
}

pub trait Image {
    /// Full size and format of the decoded image.
    fn desc(&self) -> TextureDesc;

    /// Copies `region` out as tightly packed RGBA8 rows. A zero size in `region` means "to the
    /// edge of the image". Returns `None` when the region lies outside the image.
    fn copy_region(&self, region: &TextureRegion) -> Option<Vec<u8>>;
}

/// Installs function detours.
pub trait HookInstaller {
    fn install_hook(&mut self, name: &str, source: usize, dest: usize) -> bool;
    fn remove_hook(&mut self, name: &str) -> bool;
}

/// Resolves exported symbols of loaded modules.
pub trait ModuleResolver {
    fn resolve(&self, module: &str, symbol: &str) -> Option<usize>;
}
