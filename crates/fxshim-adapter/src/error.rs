use fxshim_core::{CoreError, ProgramHandle, TextureFormat};
use fxshim_d3d8::HResult;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    #[error("{call} failed: {hr}")]
    Native { call: &'static str, hr: HResult },
    #[error("texture `{0}` was not created by this adapter")]
    UnknownTexture(String),
    #[error("image region does not fit texture `{0}`")]
    RegionMismatch(String),
    #[error("format {0} has no Direct3D 9 equivalent")]
    UnsupportedFormat(TextureFormat),
    #[error("Direct3D 9 has no geometry stage")]
    GeometryStage,
    #[error("pass `{0}` has no loaded programs")]
    PassNotLoaded(String),
    #[error("program {program:?}: {reason}")]
    Program { program: ProgramHandle, reason: String },
}

pub type AdapterResult<T> = Result<T, AdapterError>;

impl From<AdapterError> for CoreError {
    fn from(err: AdapterError) -> Self {
        CoreError::adapter(err)
    }
}

/// Tags a native failure with the call it came from.
pub(crate) trait NativeCall<T> {
    fn call(self, call: &'static str) -> AdapterResult<T>;
}

impl<T> NativeCall<T> for Result<T, HResult> {
    fn call(self, call: &'static str) -> AdapterResult<T> {
        self.map_err(|hr| AdapterError::Native { call, hr })
    }
}
