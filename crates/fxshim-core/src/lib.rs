//! Graphics-API independent effect framework.
//!
//! A [`Core`] owns the effect compiler, the graphics [`Adapter`](runtime::Adapter) and the
//! core-wide tables of named textures and virtual parameters. Effects created through it are
//! linked against those tables: sampler parameters find (or create) their textures, parameters
//! annotated with a global source are attached to the matching virtual parameter, and techniques
//! are filtered down to the ones the hardware can run.

pub mod annotation;
pub mod config;
mod context;
pub mod effect;
mod error;
pub mod filesystem;
mod logger;
pub mod parameter;
pub mod parser;
pub mod runtime;
pub mod texture;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use annotation::{AnnotationValue, Annotations};
pub use config::CoreConfig;
pub use context::{Core, CoreBuilder};
pub use effect::{Effect, Pass, Technique, MAX_PASS_TARGETS};
pub use error::{CompileError, CoreError, CoreResult};
pub use filesystem::OsFileSystem;
pub use logger::{log_message, LogLevel};
pub use parameter::{GlobalParameters, Parameter, ParameterRef, ParameterValue};
pub use parser::{ParseFlags, VariableParser};
pub use texture::{Texture, TextureRef, TextureTable};
pub use types::{
    ParameterCategory, ParameterHandle, ParameterType, ProgramHandle, ProgramStage, TextureDesc, TextureFormat,
    TextureHandle, TextureRegion, TextureStage,
};
