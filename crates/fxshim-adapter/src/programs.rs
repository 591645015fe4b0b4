//! Binding of the external shader runtime to a Direct3D 9 device.

use fxshim_core::{ParameterHandle, ProgramHandle, ProgramStage};
use fxshim_d3d8::d3d9::{Device, NativePtr};

use crate::error::AdapterResult;

/// The shader runtime's Direct3D 9 backend.
///
/// Programs and parameters are identified by the handles the effect compiler issued. Every call
/// receives the device the programs live on.
pub trait ProgramRuntime<D: Device> {
    /// Creates the native shader for `program`.
    fn load_program(&mut self, device: &D, stage: ProgramStage, program: ProgramHandle) -> AdapterResult<()>;

    fn unload_program(&mut self, device: &D, program: ProgramHandle);

    fn bind_program(&mut self, device: &D, stage: ProgramStage, program: ProgramHandle) -> AdapterResult<()>;

    /// Clears the device's shader for `stage`.
    fn unbind_program(&mut self, device: &D, stage: ProgramStage);

    fn set_floats(&mut self, device: &D, parameter: ParameterHandle, values: &[f32]) -> AdapterResult<()>;

    /// Uploads a row-major 4x4 matrix.
    fn set_matrix(&mut self, device: &D, parameter: ParameterHandle, matrix: &[f32; 16]) -> AdapterResult<()>;

    /// Binds a native texture to a sampler parameter; `None` unbinds it.
    fn set_texture(&mut self, device: &D, parameter: ParameterHandle, texture: Option<NativePtr>) -> AdapterResult<()>;
}
