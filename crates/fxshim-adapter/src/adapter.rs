//! The Direct3D 9 implementation of the core's adapter interface.

use anyhow::{anyhow, bail, Context, Result};
use fxshim_core::runtime::{Adapter, Image};
use fxshim_core::{
    CoreResult, Effect, Parameter, ParameterType, Pass, ProgramHandle, ProgramStage, Texture, TextureDesc, TextureFormat,
    TextureHandle, TextureRef, TextureRegion, TextureStage,
};
use fxshim_d3d8::d3d9::{Device, Format, NativePtr, PresentParameters, Rect, TransformState};
use hashbrown::HashMap;
use tracing::{debug, error, info, warn};

use crate::convert::{format_from_d3d9, texture_params};
use crate::error::{AdapterError, AdapterResult, NativeCall};
use crate::programs::ProgramRuntime;

/// Copy of the back buffer taken before the effects run.
pub const THIS_FRAME: &str = ":thisframe";
/// Render target every technique draws into.
pub const SCRATCH: &str = ":scratch";
/// Default pass target.
pub const LAST_PASS: &str = ":lastpass";
/// Default technique target.
pub const LAST_SHADER: &str = ":lastshader";

/// Global matrices fed from the application's transforms.
pub const GLOBAL_MATRICES: [(&str, TransformState); 3] = [
    ("matrix_view", TransformState::VIEW),
    ("matrix_proj", TransformState::PROJECTION),
    ("matrix_world", TransformState::WORLD),
];

#[derive(Clone, Copy, Debug)]
pub(crate) struct NativeTexture {
    pub ptr: NativePtr,
    pub volume: bool,
}

pub struct D3d9Adapter<D: Device, R: ProgramRuntime<D>> {
    pub(crate) device: D,
    pub(crate) runtime: R,
    pub(crate) textures: HashMap<TextureHandle, NativeTexture>,
    pub(crate) scratch: Option<TextureHandle>,
    back_buffer: (u32, u32, Format),
}

impl<D: Device, R: ProgramRuntime<D>> D3d9Adapter<D, R> {
    pub fn new(device: D, runtime: R, params: &PresentParameters) -> Self {
        Self {
            device,
            runtime,
            textures: HashMap::new(),
            scratch: None,
            back_buffer: (params.back_buffer_width, params.back_buffer_height, params.back_buffer_format),
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    /// Native texture behind a core texture created by this adapter.
    pub fn native_texture(&self, texture: &Texture) -> Option<NativePtr> {
        self.textures.get(&texture.handle()).map(|native| native.ptr)
    }

    /// Releases whatever native textures are still alive and hands the runtime back.
    pub fn into_runtime(self) -> R {
        for (handle, native) in &self.textures {
            warn!(handle = handle.0, "releasing texture the core never released");
            self.device.release_object(native.ptr);
        }
        self.runtime
    }

    /// Description of the framework's own full-screen textures.
    fn frame_desc(&self) -> TextureDesc {
        let (width, height, format) = self.back_buffer;
        let format = match format_from_d3d9(format) {
            TextureFormat::Unknown => TextureFormat::Rgba8,
            format => format,
        };
        TextureDesc::new_2d(width, height, format).render_target()
    }

    pub(crate) fn lookup(&self, texture: &Texture) -> AdapterResult<NativeTexture> {
        self.textures
            .get(&texture.handle())
            .copied()
            .ok_or_else(|| AdapterError::UnknownTexture(texture.name().to_owned()))
    }

    fn stage_programs(pass: &Pass) -> impl Iterator<Item = (ProgramStage, ProgramHandle)> + '_ {
        [ProgramStage::Vertex, ProgramStage::Fragment]
            .into_iter()
            .filter_map(|stage| pass.program(stage).map(|program| (stage, program)))
    }

    fn upload_image(&self, image: &dyn Image, region: &TextureRegion, texture: &Texture) -> AdapterResult<()> {
        let native = self.lookup(texture)?;
        if native.volume {
            return Err(AdapterError::UnsupportedFormat(texture.desc().format));
        }
        let desc = texture.desc();
        let pixels = image
            .copy_region(region)
            .ok_or_else(|| AdapterError::RegionMismatch(texture.name().to_owned()))?;
        if pixels.len() != desc.width as usize * desc.height as usize * 4 {
            return Err(AdapterError::RegionMismatch(texture.name().to_owned()));
        }

        let surface = self.device.texture_surface_level(native.ptr, 0).call("GetSurfaceLevel")?;
        let result = self
            .device
            .load_surface_from_memory(
                surface,
                None,
                &pixels,
                // RGBA bytes in memory order.
                Format::A8B8G8R8,
                desc.width * 4,
                Rect::from_size(desc.width, desc.height),
            )
            .call("LoadSurfaceFromMemory");
        self.device.release_object(surface);
        result
    }
}

impl<D: Device, R: ProgramRuntime<D>> Adapter for D3d9Adapter<D, R> {
    fn load_pass(&mut self, pass: &Pass) -> bool {
        if pass.program(ProgramStage::Geometry).is_some() {
            error!(pass = pass.full_name(), err = %AdapterError::GeometryStage, "cannot load pass");
            return false;
        }
        let mut loaded = Vec::new();
        for (stage, program) in Self::stage_programs(pass) {
            if let Err(err) = self.runtime.load_program(&self.device, stage, program) {
                error!(pass = pass.full_name(), ?stage, %err, "failed to load program");
                for program in loaded {
                    self.runtime.unload_program(&self.device, program);
                }
                return false;
            }
            loaded.push(program);
        }
        true
    }

    fn unload_pass(&mut self, pass: &Pass) {
        for (_, program) in Self::stage_programs(pass) {
            self.runtime.unload_program(&self.device, program);
        }
    }

    fn create_texture(&mut self, name: &str, desc: &TextureDesc) -> CoreResult<TextureHandle> {
        let params = texture_params(desc).ok_or(AdapterError::UnsupportedFormat(desc.format))?;
        let volume = desc.depth > 1;
        let ptr = if volume {
            self.device
                .create_volume_texture(
                    desc.width,
                    desc.height,
                    desc.depth,
                    params.levels,
                    params.usage,
                    params.format,
                    params.pool,
                )
                .call("CreateVolumeTexture")?
        } else {
            self.device
                .create_texture(desc.width, desc.height, params.levels, params.usage, params.format, params.pool)
                .call("CreateTexture")?
        };
        let handle = TextureHandle(ptr.addr());
        self.textures.insert(handle, NativeTexture { ptr, volume });
        debug!(name, %ptr, width = desc.width, height = desc.height, format = %desc.format, "created texture");
        Ok(handle)
    }

    fn load_texture(&mut self, image: &dyn Image, region: &TextureRegion, texture: &Texture) -> bool {
        match self.upload_image(image, region, texture) {
            Ok(()) => true,
            Err(err) => {
                warn!(texture = texture.name(), %err, "unable to load texture data");
                false
            }
        }
    }

    fn release_texture(&mut self, texture: &Texture) {
        match self.textures.remove(&texture.handle()) {
            Some(native) => {
                if self.scratch == Some(texture.handle()) {
                    self.scratch = None;
                }
                self.device.release_object(native.ptr);
                debug!(texture = texture.name(), "released texture");
            }
            None => warn!(texture = texture.name(), "release of a texture this adapter does not own"),
        }
    }

    fn connect_texture(&mut self, parameter: &Parameter, texture: &TextureRef) -> bool {
        let Some(handle) = parameter.handle() else {
            return false;
        };
        let result = self
            .lookup(texture)
            .and_then(|native| self.runtime.set_texture(&self.device, handle, Some(native.ptr)));
        match result {
            Ok(()) => true,
            Err(err) => {
                warn!(parameter = parameter.name(), texture = texture.name(), %err, "cannot connect texture");
                false
            }
        }
    }

    fn draw_effect(&mut self, effect: &Effect) -> CoreResult<()> {
        self.draw(effect)
    }
}

/// Hands `device` to the core: creates the adapter, the frame textures and the global matrices.
///
/// On failure the adapter stays attached with whatever was created; [`detach`] cleans up.
pub fn attach<D: Device, R: ProgramRuntime<D>>(
    core: &mut fxshim_core::Core<D3d9Adapter<D, R>>,
    device: D,
    runtime: R,
    params: &PresentParameters,
) -> Result<()> {
    if core.adapter().is_some() {
        bail!("an adapter is already attached");
    }
    let adapter = D3d9Adapter::new(device, runtime, params);
    let desc = adapter.frame_desc();
    core.set_adapter(Some(adapter));

    for name in [THIS_FRAME, SCRATCH, LAST_PASS, LAST_SHADER] {
        core.create_texture(name, &desc)
            .with_context(|| format!("creating frame texture {name}"))?;
    }
    let stage = |name: &str| core.get_texture(name).ok_or_else(|| anyhow!("frame texture {name} missing"));
    let (scratch, last_pass, last_shader) = (stage(SCRATCH)?, stage(LAST_PASS)?, stage(LAST_SHADER)?);
    core.set_stage_texture(TextureStage::ShaderTarget, Some(last_shader));
    core.set_stage_texture(TextureStage::PassTarget, Some(last_pass));
    if let Some(adapter) = core.adapter_mut() {
        adapter.scratch = Some(scratch.handle());
    }

    for (name, _) in GLOBAL_MATRICES {
        if core.get_parameter(name, ParameterType::Matrix).is_none() {
            core.create_parameter(name, ParameterType::Matrix)
                .with_context(|| format!("creating global {name}"))?;
        }
    }
    info!(width = desc.width, height = desc.height, format = %desc.format, "adapter attached");
    Ok(())
}

/// Releases every texture and global the adapter created and returns the program runtime.
pub fn detach<D: Device, R: ProgramRuntime<D>>(core: &mut fxshim_core::Core<D3d9Adapter<D, R>>) -> Option<R> {
    for (name, _) in GLOBAL_MATRICES {
        core.remove_parameter(name);
    }
    let released = core.release_textures();
    let adapter = core.set_adapter(None)?;
    info!(released, "adapter detached");
    Some(adapter.into_runtime())
}
