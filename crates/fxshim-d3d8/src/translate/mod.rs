//! Conversion of legacy values into their next-generation equivalents and back.
//!
//! Structures whose layout changed are copied field by field; enumerations whose value sets
//! differ go through explicit tables. A value that only exists on one side is reported as
//! [`ShimError::Untranslatable`](crate::ShimError::Untranslatable), never coerced.

mod decl;
mod formats;
mod states;
mod structs;

pub use decl::{patch_vertex_shader_function, translate_declaration, DeclConstant, TranslatedDeclaration};
pub use formats::{format_from_d3d9, format_to_d3d9, surface_size, volume_size, LEGACY_DISPLAY_FORMATS};
pub use states::{
    depth_bias_to_zbias, render_state, sampler_value_to_d3d9, texture_stage_state, zbias_to_depth_bias,
    RenderStateMapping, StageStateMapping,
};
pub use structs::{
    caps_from_d3d9, present_parameters_from_d3d9, present_parameters_to_d3d9, surface_desc_from_d3d9,
    volume_desc_from_d3d9,
};
