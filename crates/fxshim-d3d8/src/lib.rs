//! Interception layer presenting the legacy (version 8) Direct3D interfaces on top of a
//! Direct3D 9 runtime.
//!
//! The native runtime is reached only through the traits in [`d3d9`]; [`shim`] holds the objects
//! handed to the application, [`translate`] the value conversions between the two generations and
//! [`registry`] the mapping between wrapper handles and native objects.

pub mod config;
pub mod d3d8;
pub mod d3d9;
mod error;
mod hresult;
pub mod registry;
pub mod shim;
pub mod translate;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use config::ShimConfig;
pub use error::{to_hresult, ShimError, ShimResult};
pub use hresult::{HResult, NativeResult};
pub use registry::{Origin, RegistryError, ResourceKind, ResourceRegistry, WrapperHandle, WrapperInfo};
pub use shim::{ComSlot, Device8, Direct3D8, FrameHook, NoHook, RefCounted};
