//! Frame hook driving the effects from the device shim's events.

use fxshim_core::{Core, Effect, ParameterType};
use fxshim_d3d8::d3d9::{Device, Matrix, PresentParameters, TransformState};
use fxshim_d3d8::FrameHook;
use tracing::{debug, error, info, warn};

use crate::adapter::{attach, detach, D3d9Adapter, GLOBAL_MATRICES, THIS_FRAME};
use crate::config::AdapterConfig;
use crate::programs::ProgramRuntime;

/// Owns the core and the loaded effects for one device.
///
/// The adapter only exists between device creation (or the end of a reset) and the start of the
/// next reset or the device's release. In between, the program runtime is parked here.
pub struct EffectHost<D: Device, R: ProgramRuntime<D>> {
    config: AdapterConfig,
    core: Core<D3d9Adapter<D, R>>,
    runtime: Option<R>,
    effects: Vec<Effect>,
}

impl<D: Device, R: ProgramRuntime<D>> EffectHost<D, R> {
    pub fn new(config: AdapterConfig, core: Core<D3d9Adapter<D, R>>, runtime: R) -> Self {
        Self {
            config,
            core,
            runtime: Some(runtime),
            effects: Vec::new(),
        }
    }

    pub fn core(&self) -> &Core<D3d9Adapter<D, R>> {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut Core<D3d9Adapter<D, R>> {
        &mut self.core
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn is_attached(&self) -> bool {
        self.core.adapter().is_some()
    }

    fn start(&mut self, device: &D, params: &PresentParameters) {
        let Some(runtime) = self.runtime.take() else {
            warn!("no program runtime available, effects disabled");
            return;
        };
        if let Err(err) = attach(&mut self.core, device.clone(), runtime, params) {
            error!("failed to attach adapter: {err:#}");
            self.runtime = detach(&mut self.core);
            return;
        }

        for path in &self.config.effects {
            match self.core.create_effect(path, &self.config.compile_args) {
                Ok(effect) => self.effects.push(effect),
                Err(err) => error!(effect = %path, %err, "failed to create effect"),
            }
        }
        info!(effects = self.effects.len(), "effect host started");
    }

    fn stop(&mut self) {
        for effect in self.effects.drain(..) {
            self.core.destroy_effect(effect);
        }
        if let Some(runtime) = detach(&mut self.core) {
            self.runtime = Some(runtime);
        }
        debug!("effect host stopped");
    }

    fn render(&mut self) -> anyhow::Result<()> {
        let adapter = self.core.adapter().ok_or_else(|| anyhow::anyhow!("no adapter attached"))?;
        if let Some(frame) = self.core.get_texture(THIS_FRAME) {
            if let Err(err) = adapter.capture_back_buffer(&frame) {
                warn!(%err, "failed to capture the frame");
            }
        }

        for effect in &self.effects {
            if let Err(err) = self.core.draw_effect(effect) {
                warn!(effect = effect.name(), %err, "effect not drawn");
            }
        }

        if let Some(name) = &self.config.present_texture {
            let texture = self
                .core
                .get_texture(name)
                .ok_or_else(|| anyhow::anyhow!("present texture {name} does not exist"))?;
            if let Some(adapter) = self.core.adapter() {
                adapter.present_texture(&texture)?;
            }
        }
        Ok(())
    }
}

impl<D: Device, R: ProgramRuntime<D>> FrameHook<D> for EffectHost<D, R> {
    fn holds_device(&self) -> bool {
        true
    }

    fn device_created(&mut self, device: &D, params: &PresentParameters) {
        self.start(device, params);
    }

    fn transform_changed(&mut self, _device: &D, state: TransformState, matrix: &Matrix) {
        let Some(&(name, _)) = GLOBAL_MATRICES.iter().find(|(_, ty)| *ty == state) else {
            return;
        };
        if let Some(global) = self.core.get_parameter(name, ParameterType::Matrix) {
            if let Err(err) = global.set_matrix(&matrix.to_floats()) {
                warn!(global = name, %err, "failed to update global matrix");
            }
        }
    }

    fn before_present(&mut self, _device: &D) {
        if !self.is_attached() {
            return;
        }
        if let Err(err) = self.render() {
            warn!("frame effects failed: {err:#}");
        }
    }

    fn before_reset(&mut self, _device: &D) {
        self.stop();
    }

    fn after_reset(&mut self, device: &D, params: &PresentParameters) {
        self.start(device, params);
    }

    fn device_released(&mut self, _device: &D) {
        self.stop();
    }
}
