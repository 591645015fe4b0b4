//! Effect framework for legacy Direct3D 8 applications.
//!
//! The application talks to the [`d3d8`] shim, which forwards to a Direct3D 9 device. An
//! [`adapter::EffectHost`] installed as the shim's frame hook runs the [`core`] effects on that
//! device before every present.

pub use fxshim_adapter as adapter;
pub use fxshim_core as core;
pub use fxshim_d3d8 as d3d8;
