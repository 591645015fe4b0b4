//! Drawing a technique: one full-screen quad per pass, with the pass outputs resolved into their
//! target textures.

use bytemuck::{Pod, Zeroable};
use fxshim_core::{CoreResult, Effect, ParameterType, ParameterValue, Pass, ProgramStage, Texture, MAX_PASS_TARGETS};
use fxshim_d3d8::d3d9::{
    fvf, BackBufferType, Device, NativePtr, PrimitiveType, RenderStateType, StreamSource, TextureFilter, CULL_NONE,
};
use fxshim_d3d8::HResult;
use tracing::{debug, warn};

use crate::adapter::D3d9Adapter;
use crate::error::{AdapterError, AdapterResult, NativeCall};
use crate::programs::ProgramRuntime;

pub const QUAD_FVF: u32 = fvf::XYZRHW | fvf::TEX1;

/// Pre-transformed vertex of the full-screen quad.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 4],
    pub uv: [f32; 2],
}

/// Triangle strip covering a `width` x `height` target, shifted half a pixel so texels map to
/// pixels one to one.
pub fn quad_vertices(width: u32, height: u32) -> [QuadVertex; 4] {
    let (w, h) = (width as f32 - 0.5, height as f32 - 0.5);
    let corner = |x: f32, y: f32, u: f32, v: f32| QuadVertex {
        position: [x, y, 0.5, 1.0],
        uv: [u, v],
    };
    [
        corner(-0.5, -0.5, 0.0, 0.0),
        corner(w, -0.5, 1.0, 0.0),
        corner(-0.5, h, 0.0, 1.0),
        corner(w, h, 1.0, 1.0),
    ]
}

const SAVED_RENDER_STATES: [(RenderStateType, u32); 3] = [
    (RenderStateType::ZENABLE, 0),
    (RenderStateType::CULLMODE, CULL_NONE),
    (RenderStateType::ALPHABLENDENABLE, 0),
];

/// Device state the pipeline changes, restored when dropped.
struct StateGuard<D: Device> {
    device: D,
    render_targets: [Option<NativePtr>; MAX_PASS_TARGETS],
    fvf: u32,
    render_states: Vec<(RenderStateType, u32)>,
    /// Stream 0 is unbound by every user-memory draw.
    stream: Option<StreamSource>,
}

impl<D: Device> StateGuard<D> {
    fn save(device: &D) -> AdapterResult<Self> {
        let fvf = device.fvf().call("GetFVF")?;
        let render_states = SAVED_RENDER_STATES
            .iter()
            .map(|(state, _)| Ok((*state, device.render_state(*state).call("GetRenderState")?)))
            .collect::<AdapterResult<Vec<_>>>()?;

        let primary = device.render_target(0).call("GetRenderTarget")?;
        let mut render_targets = [None; MAX_PASS_TARGETS];
        render_targets[0] = Some(primary);
        for (index, slot) in render_targets.iter_mut().enumerate().skip(1) {
            *slot = device.render_target(index as u32).ok();
        }
        let mut guard = Self {
            device: device.clone(),
            render_targets,
            fvf,
            render_states,
            stream: None,
        };
        guard.stream = Some(device.stream_source(0).call("GetStreamSource")?);
        Ok(guard)
    }

    fn primary(&self) -> Option<NativePtr> {
        self.render_targets[0]
    }
}

impl<D: Device> Drop for StateGuard<D> {
    fn drop(&mut self) {
        for (index, saved) in self.render_targets.iter().enumerate() {
            if let Err(hr) = self.device.set_render_target(index as u32, *saved) {
                warn!(index, %hr, "failed to restore render target");
            }
            if let Some(surface) = saved {
                self.device.release_object(*surface);
            }
        }
        if let Some(stream) = self.stream {
            if let Err(hr) = self.device.set_stream_source(0, stream.buffer, stream.offset, stream.stride) {
                warn!(%hr, "failed to restore stream source");
            }
            if let Some(buffer) = stream.buffer {
                self.device.release_object(buffer);
            }
        }
        if let Err(hr) = self.device.set_fvf(self.fvf) {
            warn!(%hr, "failed to restore vertex format");
        }
        for (state, value) in &self.render_states {
            if let Err(hr) = self.device.set_render_state(*state, *value) {
                warn!(state = state.0, %hr, "failed to restore render state");
            }
        }
    }
}

/// Surface every pass of a technique renders into.
struct Canvas<'a, D: Device> {
    device: &'a D,
    surface: NativePtr,
    owned: bool,
}

impl<D: Device> Drop for Canvas<'_, D> {
    fn drop(&mut self) {
        if self.owned {
            self.device.release_object(self.surface);
        }
    }
}

impl<D: Device, R: ProgramRuntime<D>> D3d9Adapter<D, R> {
    /// Runs the default technique of `effect`.
    ///
    /// Passes that fail to bind or draw are skipped. The render targets, stream 0, the vertex format
    /// and the render states the quad needs are restored afterwards whatever happened in between.
    pub(crate) fn draw(&mut self, effect: &Effect) -> CoreResult<()> {
        let technique = effect.require_default_technique()?;
        self.upload_parameters(effect);

        let guard = StateGuard::save(&self.device)?;
        let device = self.device.clone();
        let canvas = match self.scratch.and_then(|handle| self.textures.get(&handle).copied()) {
            Some(scratch) => Canvas {
                device: &device,
                surface: device.texture_surface_level(scratch.ptr, 0).call("GetSurfaceLevel")?,
                owned: true,
            },
            None => Canvas {
                device: &device,
                surface: guard.primary().ok_or(AdapterError::Native {
                    call: "GetRenderTarget",
                    hr: HResult::NOTFOUND,
                })?,
                owned: false,
            },
        };

        device.set_render_target(0, Some(canvas.surface)).call("SetRenderTarget")?;
        device.set_fvf(QUAD_FVF).call("SetFVF")?;
        for (state, value) in SAVED_RENDER_STATES {
            device.set_render_state(state, value).call("SetRenderState")?;
        }
        let desc = device.surface_desc(canvas.surface).call("GetDesc")?;
        let quad = quad_vertices(desc.width, desc.height);

        let mut drawn = 0usize;
        for pass in technique.passes() {
            match self.draw_pass(pass, &quad, canvas.surface) {
                Ok(()) => drawn += 1,
                Err(err) => warn!(pass = pass.full_name(), %err, "pass skipped"),
            }
        }
        if let Some(target) = technique.target() {
            if let Err(err) = self.resolve(canvas.surface, target) {
                warn!(technique = technique.full_name(), target = target.name(), %err, "technique resolve failed");
            }
        }
        debug!(technique = technique.full_name(), drawn, "technique drawn");

        drop(canvas);
        drop(guard);
        Ok(())
    }

    fn draw_pass(&mut self, pass: &Pass, quad: &[QuadVertex; 4], canvas: NativePtr) -> AdapterResult<()> {
        if !pass.is_loaded() {
            return Err(AdapterError::PassNotLoaded(pass.full_name().to_owned()));
        }
        self.bind_programs(pass)?;
        let extra = self.bind_extra_targets(pass);

        let drawn = self.draw_quad(quad);

        for (index, surface) in extra {
            if let Err(hr) = self.device.set_render_target(index, None) {
                warn!(index, %hr, "failed to unbind render target");
            }
            self.device.release_object(surface);
        }
        self.unbind_programs();
        drawn?;

        match pass.target() {
            Some(target) => self.resolve(canvas, target),
            None => Ok(()),
        }
    }

    fn bind_programs(&mut self, pass: &Pass) -> AdapterResult<()> {
        for stage in [ProgramStage::Vertex, ProgramStage::Fragment] {
            let Some(program) = pass.program(stage) else {
                continue;
            };
            if let Err(err) = self.runtime.bind_program(&self.device, stage, program) {
                self.unbind_programs();
                return Err(err);
            }
        }
        Ok(())
    }

    fn unbind_programs(&mut self) {
        self.runtime.unbind_program(&self.device, ProgramStage::Vertex);
        self.runtime.unbind_program(&self.device, ProgramStage::Fragment);
    }

    /// Binds targets 1.. of `pass`, returning the slots and surfaces to release afterwards.
    fn bind_extra_targets(&self, pass: &Pass) -> Vec<(u32, NativePtr)> {
        let mut bound = Vec::new();
        for (index, target) in pass.targets().iter().enumerate().skip(1) {
            let surface = self
                .lookup(target)
                .and_then(|native| self.device.texture_surface_level(native.ptr, 0).call("GetSurfaceLevel"));
            let surface = match surface {
                Ok(surface) => surface,
                Err(err) => {
                    warn!(pass = pass.full_name(), index, %err, "cannot bind render target");
                    break;
                }
            };
            if let Err(hr) = self.device.set_render_target(index as u32, Some(surface)) {
                warn!(pass = pass.full_name(), index, %hr, "cannot bind render target");
                self.device.release_object(surface);
                break;
            }
            bound.push((index as u32, surface));
        }
        bound
    }

    fn draw_quad(&self, quad: &[QuadVertex; 4]) -> AdapterResult<()> {
        self.device.begin_scene().call("BeginScene")?;
        let drawn = self
            .device
            .draw_primitive_up(
                PrimitiveType::TRIANGLESTRIP,
                2,
                bytemuck::cast_slice(quad),
                std::mem::size_of::<QuadVertex>() as u32,
            )
            .call("DrawPrimitiveUP");
        self.device.end_scene().call("EndScene")?;
        drawn
    }

    /// Copies `source` into the top level of `target`.
    pub(crate) fn resolve(&self, source: NativePtr, target: &Texture) -> AdapterResult<()> {
        let native = self.lookup(target)?;
        let surface = self
            .device
            .texture_surface_level(native.ptr, 0)
            .call("GetSurfaceLevel")?;
        let result = if surface == source {
            Ok(())
        } else {
            self.device
                .stretch_rect(source, None, surface, None, TextureFilter::NONE)
                .call("StretchRect")
        };
        self.device.release_object(surface);
        result
    }

    /// Pushes changed parameter values into the program runtime.
    fn upload_parameters(&mut self, effect: &Effect) {
        for parameter in effect.parameters() {
            if !parameter.take_dirty() {
                continue;
            }
            let Some(handle) = parameter.handle() else {
                continue;
            };
            let result = match parameter.value() {
                ParameterValue::Floats(values) if parameter.ty() == ParameterType::Matrix => {
                    match <[f32; 16]>::try_from(values.as_slice()) {
                        Ok(matrix) => self.runtime.set_matrix(&self.device, handle, &matrix),
                        Err(_) => Ok(()),
                    }
                }
                ParameterValue::Floats(values) => self.runtime.set_floats(&self.device, handle, &values),
                ParameterValue::Texture(texture) => {
                    let native = texture.and_then(|texture| self.native_texture(&texture));
                    self.runtime.set_texture(&self.device, handle, native)
                }
                ParameterValue::Empty => Ok(()),
            };
            if let Err(err) = result {
                warn!(parameter = parameter.name(), %err, "parameter upload failed");
            }
        }
    }

    /// Copies the back buffer into `target`.
    pub fn capture_back_buffer(&self, target: &Texture) -> AdapterResult<()> {
        let back_buffer = self
            .device
            .back_buffer(0, 0, BackBufferType::MONO)
            .call("GetBackBuffer")?;
        let result = self.resolve(back_buffer, target);
        self.device.release_object(back_buffer);
        result
    }

    /// Copies `source` over the back buffer.
    pub fn present_texture(&self, source: &Texture) -> AdapterResult<()> {
        let native = self.lookup(source)?;
        let surface = self
            .device
            .texture_surface_level(native.ptr, 0)
            .call("GetSurfaceLevel")?;
        let result = self
            .device
            .back_buffer(0, 0, BackBufferType::MONO)
            .call("GetBackBuffer")
            .and_then(|back_buffer| {
                let copied = self
                    .device
                    .stretch_rect(surface, None, back_buffer, None, TextureFilter::NONE)
                    .call("StretchRect");
                self.device.release_object(back_buffer);
                copied
            });
        self.device.release_object(surface);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn quad_covers_the_target_with_half_texel_offset() {
        let quad = quad_vertices(640, 480);
        assert_eq!(quad[0].position, [-0.5, -0.5, 0.5, 1.0]);
        assert_eq!(quad[3].position, [639.5, 479.5, 0.5, 1.0]);
        assert_eq!(quad[3].uv, [1.0, 1.0]);
        assert_eq!(bytemuck::cast_slice::<_, u8>(&quad).len(), 4 * 24);
    }
}
