//! The context object tying the collaborators and the shared tables together.

use crate::config::CoreConfig;
use crate::effect::{Effect, Linker};
use crate::error::{CoreError, CoreResult};
use crate::logger::log_message;
use crate::parameter::{GlobalParameters, ParameterRef};
use crate::parser::{ParseFlags, VariableParser};
use crate::runtime::{Adapter, EffectCompiler, FileSystem};
use crate::texture::{Texture, TextureRef, TextureTable};
use crate::types::{ParameterType, TextureDesc, TextureStage};

/// Creates a native texture through `adapter` and registers it, releasing it again if the name
/// is already taken.
pub(crate) fn register_texture<A: Adapter + ?Sized>(
    adapter: &mut A,
    textures: &mut TextureTable,
    name: &str,
    desc: &TextureDesc,
) -> CoreResult<TextureRef> {
    if textures.get(name).is_some() {
        return Err(CoreError::DuplicateTexture(name.to_owned()));
    }
    let handle = adapter.create_texture(name, desc)?;
    let texture = Texture::new(name, handle, *desc);
    if let Err(err) = textures.add(texture.clone()) {
        adapter.release_texture(&texture);
        return Err(err);
    }
    Ok(texture)
}

pub struct CoreBuilder<A: Adapter> {
    config: CoreConfig,
    compiler: Option<Box<dyn EffectCompiler>>,
    filesystem: Option<Box<dyn FileSystem>>,
    adapter: Option<A>,
}

impl<A: Adapter> CoreBuilder<A> {
    pub fn compiler(mut self, compiler: impl EffectCompiler + 'static) -> Self {
        self.compiler = Some(Box::new(compiler));
        self
    }

    pub fn filesystem(mut self, filesystem: impl FileSystem + 'static) -> Self {
        self.filesystem = Some(Box::new(filesystem));
        self
    }

    pub fn adapter(mut self, adapter: A) -> Self {
        self.adapter = Some(adapter);
        self
    }

    /// Fails with [`CoreError::NoContext`] when no compiler was supplied.
    pub fn build(self) -> CoreResult<Core<A>> {
        let compiler = self.compiler.ok_or(CoreError::NoContext)?;
        let parser = VariableParser::new(&self.config);
        tracing::info!(
            target_exe = %self.config.target,
            global_root = %self.config.global_root,
            "core created"
        );
        Ok(Core {
            config: self.config,
            parser,
            compiler,
            filesystem: self.filesystem,
            textures: TextureTable::new(),
            parameters: GlobalParameters::new(),
            adapter: self.adapter,
        })
    }
}

/// Owner of the compiler, the adapter and the core-wide texture and parameter tables.
///
/// Every effect is created through the core so that linking sees one consistent set of globals
/// and textures.
pub struct Core<A: Adapter> {
    config: CoreConfig,
    parser: VariableParser,
    compiler: Box<dyn EffectCompiler>,
    filesystem: Option<Box<dyn FileSystem>>,
    textures: TextureTable,
    parameters: GlobalParameters,
    adapter: Option<A>,
}

impl<A: Adapter> Core<A> {
    pub fn builder(config: CoreConfig) -> CoreBuilder<A> {
        CoreBuilder {
            config,
            compiler: None,
            filesystem: None,
            adapter: None,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn parser(&self) -> &VariableParser {
        &self.parser
    }

    pub fn parser_mut(&mut self) -> &mut VariableParser {
        &mut self.parser
    }

    pub fn parse(&self, input: &str) -> String {
        self.parser.parse(input, ParseFlags::empty())
    }

    pub fn adapter(&self) -> Option<&A> {
        self.adapter.as_ref()
    }

    pub fn adapter_mut(&mut self) -> Option<&mut A> {
        self.adapter.as_mut()
    }

    /// Replaces the adapter, returning the previous one.
    pub fn set_adapter(&mut self, adapter: Option<A>) -> Option<A> {
        std::mem::replace(&mut self.adapter, adapter)
    }

    pub fn textures(&self) -> &TextureTable {
        &self.textures
    }

    pub fn add_texture(&mut self, texture: TextureRef) -> CoreResult<()> {
        self.textures.add(texture)
    }

    pub fn get_texture(&self, name: &str) -> Option<TextureRef> {
        self.textures.get(name)
    }

    /// Unregisters a texture and has the adapter release it.
    pub fn remove_texture(&mut self, name: &str) -> bool {
        let Some(texture) = self.textures.remove(name) else {
            return false;
        };
        if let Some(adapter) = self.adapter.as_mut() {
            adapter.release_texture(&texture);
        }
        true
    }

    /// Creates an empty texture through the adapter and registers it under `name`.
    pub fn create_texture(&mut self, name: &str, desc: &TextureDesc) -> CoreResult<TextureRef> {
        let adapter = self.adapter.as_mut().ok_or(CoreError::NoAdapter)?;
        register_texture(adapter, &mut self.textures, name, desc)
    }

    pub fn stage_texture(&self, stage: TextureStage) -> Option<TextureRef> {
        self.textures.stage(stage)
    }

    pub fn set_stage_texture(&mut self, stage: TextureStage, texture: Option<TextureRef>) {
        self.textures.set_stage(stage, texture);
    }

    /// Unregisters every texture, releasing each through the adapter.
    pub fn release_textures(&mut self) -> usize {
        let textures = self.textures.drain();
        if let Some(adapter) = self.adapter.as_mut() {
            for texture in &textures {
                adapter.release_texture(texture);
            }
        }
        textures.len()
    }

    /// Creates a virtual parameter effects can link to by name.
    pub fn create_parameter(&mut self, name: &str, ty: ParameterType) -> CoreResult<ParameterRef> {
        self.parameters.create(name, ty)
    }

    pub fn get_parameter(&self, name: &str, ty: ParameterType) -> Option<ParameterRef> {
        self.parameters.get(name, ty)
    }

    pub fn remove_parameter(&mut self, name: &str) -> bool {
        self.parameters.remove(name)
    }

    /// Compiles and links the effect at `path`.
    ///
    /// The path runs through the parser, then through the filesystem when one is present. The
    /// result may have no valid technique; use [`Effect::require_default_technique`] where one is
    /// needed.
    pub fn create_effect(&mut self, path: &str, args: &[String]) -> CoreResult<Effect> {
        let resolved = self.parser.parse(path, ParseFlags::empty());
        let source = self
            .filesystem
            .as_deref()
            .and_then(|fs| fs.find_file(&resolved))
            .map(|file| file.path().to_owned())
            .unwrap_or(resolved);

        let compiled = self.compiler.compile(&source, args);
        for (level, message) in self.compiler.take_messages() {
            log_message(level, "compiler", &message);
        }
        let compiled = compiled?;

        let mut linker = Linker {
            textures: &mut self.textures,
            globals: &self.parameters,
            parser: &self.parser,
            filesystem: self.filesystem.as_deref(),
            adapter: self.adapter.as_mut(),
        };
        let effect = linker.link(path, &compiled, &*self.compiler);
        tracing::info!(
            effect = path,
            techniques = effect.technique_count(),
            parameters = effect.parameter_count(),
            "effect created"
        );
        Ok(effect)
    }

    /// Unloads the effect's passes from the adapter.
    pub fn destroy_effect(&mut self, effect: Effect) {
        tracing::debug!(effect = effect.name(), "destroying effect");
        if let Some(adapter) = self.adapter.as_mut() {
            for pass in effect.passes().filter(|pass| pass.is_loaded()) {
                adapter.unload_pass(pass);
            }
        }
    }

    /// Draws the default technique of `effect`.
    pub fn draw_effect(&mut self, effect: &Effect) -> CoreResult<()> {
        effect.require_default_technique()?;
        let adapter = self.adapter.as_mut().ok_or(CoreError::NoAdapter)?;
        adapter.draw_effect(effect)
    }
}
