use thiserror::Error;

use crate::types::ParameterType;

/// Failure reported by an effect compiler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("effect source `{0}` not found")]
    NotFound(String),
    #[error("failed to compile `{path}`: {message}")]
    Syntax { path: String, message: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    /// The core was asked to exist without an effect compiler.
    #[error("no compiler context is available")]
    NoContext,
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("effect `{0}` has no technique valid on this hardware")]
    NoValidTechnique(String),
    #[error("technique `{technique}` does not belong to effect `{effect}`")]
    ForeignTechnique { effect: String, technique: String },
    #[error("technique `{0}` not found")]
    UnknownTechnique(String),
    #[error("texture `{0}` already exists")]
    DuplicateTexture(String),
    #[error("parameter `{0}` already exists")]
    DuplicateParameter(String),
    #[error("parameter `{name}` is {actual:?}, not {expected:?}")]
    TypeMismatch {
        name: String,
        expected: ParameterType,
        actual: ParameterType,
    },
    #[error("cannot attach to `{0}`: only virtual parameters accept attachments")]
    NotVirtual(String),
    #[error("attaching `{0}` would create a cycle")]
    AttachmentCycle(String),
    #[error("value of {got} components does not fit parameter `{name}`")]
    ValueSize { name: String, got: usize },
    #[error("no adapter is attached")]
    NoAdapter,
    #[error("adapter failed: {0}")]
    Adapter(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CoreError {
    pub fn adapter(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        CoreError::Adapter(Box::new(err))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
