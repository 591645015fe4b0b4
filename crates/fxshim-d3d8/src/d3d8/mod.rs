//! Legacy API value types as the intercepted application sees them.
//!
//! Structures whose layout is unchanged between generations are re-exported from [`crate::d3d9`];
//! the rest are declared here and converted field by field in [`crate::translate`].

mod types;

pub use types::*;
