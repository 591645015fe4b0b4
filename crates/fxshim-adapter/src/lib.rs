//! Direct3D 9 backend of the effect framework.
//!
//! [`D3d9Adapter`] implements the core's adapter interface on a native device: it loads passes
//! through a [`ProgramRuntime`], creates and fills textures and draws techniques as a sequence of
//! full-screen quads. [`EffectHost`] plugs the whole thing into the device shim as a frame hook so
//! the configured effects run before every present.

mod adapter;
pub mod config;
pub mod convert;
mod error;
pub mod hooks;
mod host;
pub mod pipeline;
mod programs;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adapter::{attach, detach, D3d9Adapter, GLOBAL_MATRICES, LAST_PASS, LAST_SHADER, SCRATCH, THIS_FRAME};
pub use config::AdapterConfig;
pub use error::{AdapterError, AdapterResult};
pub use hooks::{install_entry_hooks, EntryHooks};
pub use host::EffectHost;
pub use programs::ProgramRuntime;
