//! Model of the next-generation native API the shim forwards to.

mod device;
mod types;

pub use device::{Device, Direct3D, ObjectRefs, ResourceApi};
pub use types::*;

pub(crate) use types::raw_enum;
