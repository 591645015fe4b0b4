use thiserror::Error;

use crate::hresult::HResult;
use crate::registry::{RegistryError, WrapperHandle};

/// Failure of an intercepted call, expressed so it can be collapsed into the `HRESULT` the
/// application expects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShimError {
    #[error("{call} has no Direct3D 9 equivalent")]
    Unsupported { call: &'static str },
    #[error("{what} {value:#x} cannot be translated to Direct3D 9")]
    Untranslatable { what: &'static str, value: u32 },
    #[error("{call} failed: {hr}")]
    Native { call: &'static str, hr: HResult },
    #[error("{call} failed at step {step} of {total} ({sub_call}): {hr}")]
    Split {
        call: &'static str,
        step: usize,
        total: usize,
        sub_call: &'static str,
        hr: HResult,
    },
    #[error("unknown shader handle {0:#x}")]
    UnknownShader(u32),
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ShimError {
    /// The code returned to the application for this failure.
    pub fn hresult(&self) -> HResult {
        match self {
            ShimError::Native { hr, .. } | ShimError::Split { hr, .. } => *hr,
            ShimError::Unsupported { .. }
            | ShimError::Untranslatable { .. }
            | ShimError::UnknownShader(_)
            | ShimError::InvalidArgument(_)
            | ShimError::Registry(_) => HResult::INVALIDCALL,
        }
    }

    pub(crate) fn unsupported(call: &'static str) -> Self {
        ShimError::Unsupported { call }
    }

    pub(crate) fn unknown_handle(handle: WrapperHandle) -> Self {
        ShimError::Registry(RegistryError::UnknownHandle(handle))
    }
}

pub type ShimResult<T> = Result<T, ShimError>;

/// Tags a native failure with the intercepted call it came from.
pub(crate) trait NativeContext<T> {
    fn call(self, call: &'static str) -> ShimResult<T>;
}

impl<T> NativeContext<T> for Result<T, HResult> {
    fn call(self, call: &'static str) -> ShimResult<T> {
        self.map_err(|hr| ShimError::Native { call, hr })
    }
}

/// Collapses a shim result into the application-visible code.
pub fn to_hresult<T>(result: &ShimResult<T>) -> HResult {
    match result {
        Ok(_) => HResult::OK,
        Err(err) => err.hresult(),
    }
}
