//! Test doubles: a program runtime backed by the mock device's shader objects and recording
//! hook collaborators.

use fxshim_core::runtime::{HookInstaller, ModuleResolver};
use fxshim_core::{ParameterHandle, ProgramHandle, ProgramStage};
use fxshim_d3d8::d3d9::{Device, NativePtr, ObjectRefs};
use fxshim_d3d8::mock::MockDevice9;
use hashbrown::{HashMap, HashSet};

use crate::error::{AdapterError, AdapterResult, NativeCall};
use crate::programs::ProgramRuntime;

const VERTEX_FUNCTION: [u32; 2] = [0xFFFE_0101, 0x0000_FFFF];
const PIXEL_FUNCTION: [u32; 2] = [0xFFFF_0104, 0x0000_FFFF];

/// Program runtime creating one native shader per program on the mock device.
#[derive(Debug, Default)]
pub struct MockProgramRuntime {
    programs: HashMap<ProgramHandle, (ProgramStage, NativePtr)>,
    failing_loads: HashSet<ProgramHandle>,
    failing_binds: HashSet<ProgramHandle>,
    /// Every successful bind, in order.
    pub binds: Vec<(ProgramStage, ProgramHandle)>,
    pub unbinds: usize,
    pub floats: Vec<(ParameterHandle, Vec<f32>)>,
    pub matrices: Vec<(ParameterHandle, [f32; 16])>,
    pub textures: Vec<(ParameterHandle, Option<NativePtr>)>,
}

impl MockProgramRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_load(mut self, program: ProgramHandle) -> Self {
        self.failing_loads.insert(program);
        self
    }

    pub fn failing_bind(mut self, program: ProgramHandle) -> Self {
        self.failing_binds.insert(program);
        self
    }

    pub fn is_loaded(&self, program: ProgramHandle) -> bool {
        self.programs.contains_key(&program)
    }

    pub fn loaded_count(&self) -> usize {
        self.programs.len()
    }
}

impl ProgramRuntime<MockDevice9> for MockProgramRuntime {
    fn load_program(&mut self, device: &MockDevice9, stage: ProgramStage, program: ProgramHandle) -> AdapterResult<()> {
        if self.failing_loads.contains(&program) {
            return Err(AdapterError::Program {
                program,
                reason: "scripted load failure".into(),
            });
        }
        let shader = match stage {
            ProgramStage::Vertex => device.create_vertex_shader(&VERTEX_FUNCTION).call("CreateVertexShader")?,
            ProgramStage::Fragment => device.create_pixel_shader(&PIXEL_FUNCTION).call("CreatePixelShader")?,
            ProgramStage::Geometry => return Err(AdapterError::GeometryStage),
        };
        if let Some((_, previous)) = self.programs.insert(program, (stage, shader)) {
            device.release_object(previous);
        }
        Ok(())
    }

    fn unload_program(&mut self, device: &MockDevice9, program: ProgramHandle) {
        if let Some((_, shader)) = self.programs.remove(&program) {
            device.release_object(shader);
        }
    }

    fn bind_program(&mut self, device: &MockDevice9, stage: ProgramStage, program: ProgramHandle) -> AdapterResult<()> {
        if self.failing_binds.contains(&program) {
            return Err(AdapterError::Program {
                program,
                reason: "scripted bind failure".into(),
            });
        }
        let &(loaded_stage, shader) = self.programs.get(&program).ok_or_else(|| AdapterError::Program {
            program,
            reason: "not loaded".into(),
        })?;
        match loaded_stage {
            ProgramStage::Vertex => device.set_vertex_shader(Some(shader)).call("SetVertexShader")?,
            _ => device.set_pixel_shader(Some(shader)).call("SetPixelShader")?,
        }
        self.binds.push((stage, program));
        Ok(())
    }

    fn unbind_program(&mut self, device: &MockDevice9, stage: ProgramStage) {
        let _ = match stage {
            ProgramStage::Vertex => device.set_vertex_shader(None),
            _ => device.set_pixel_shader(None),
        };
        self.unbinds += 1;
    }

    fn set_floats(&mut self, _device: &MockDevice9, parameter: ParameterHandle, values: &[f32]) -> AdapterResult<()> {
        self.floats.push((parameter, values.to_vec()));
        Ok(())
    }

    fn set_matrix(&mut self, _device: &MockDevice9, parameter: ParameterHandle, matrix: &[f32; 16]) -> AdapterResult<()> {
        self.matrices.push((parameter, *matrix));
        Ok(())
    }

    fn set_texture(
        &mut self,
        _device: &MockDevice9,
        parameter: ParameterHandle,
        texture: Option<NativePtr>,
    ) -> AdapterResult<()> {
        self.textures.push((parameter, texture));
        Ok(())
    }
}

/// Hook installer that records what it was asked to detour.
#[derive(Debug, Default)]
pub struct RecordingHookInstaller {
    refuse: bool,
    /// Name, source and destination of each installed hook.
    pub installed: Vec<(String, usize, usize)>,
    pub removed: Vec<String>,
}

impl RecordingHookInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every installation fails.
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }
}

impl HookInstaller for RecordingHookInstaller {
    fn install_hook(&mut self, name: &str, source: usize, dest: usize) -> bool {
        if self.refuse {
            return false;
        }
        self.installed.push((name.to_owned(), source, dest));
        true
    }

    fn remove_hook(&mut self, name: &str) -> bool {
        let before = self.installed.len();
        self.installed.retain(|(installed, _, _)| installed != name);
        self.removed.push(name.to_owned());
        self.installed.len() != before
    }
}

/// Module resolver over a fixed symbol table.
#[derive(Debug, Default)]
pub struct StaticResolver {
    symbols: HashMap<(String, String), usize>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symbol(mut self, module: &str, symbol: &str, address: usize) -> Self {
        self.symbols
            .insert((module.to_ascii_lowercase(), symbol.to_owned()), address);
        self
    }
}

impl ModuleResolver for StaticResolver {
    fn resolve(&self, module: &str, symbol: &str) -> Option<usize> {
        self.symbols
            .get(&(module.to_ascii_lowercase(), symbol.to_owned()))
            .copied()
    }
}
