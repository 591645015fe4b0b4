//! Legacy vertex shader declarations.
//!
//! A legacy declaration is a token stream binding stream data to fixed input registers, with
//! optional inline constants. The native API wants a vertex element list with usage semantics,
//! and vertex shaders that declare their inputs with `dcl` instructions.

use crate::d3d8::vsd;
use crate::d3d9::{decl_type, decl_usage, VertexElement};
use crate::error::{ShimError, ShimResult};

/// Inline constant block from a `D3DVSD_CONST` token.
#[derive(Clone, Debug, PartialEq)]
pub struct DeclConstant {
    pub start_register: u32,
    pub values: Vec<f32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TranslatedDeclaration {
    /// Terminated by [`VertexElement::END`].
    pub elements: Vec<VertexElement>,
    /// Input register of each element in `elements` (excluding the terminator).
    pub registers: Vec<u32>,
    pub constants: Vec<DeclConstant>,
}

fn element_type(data_type: u32) -> ShimResult<(u8, u16)> {
    let mapped = match data_type {
        vsd::FLOAT1 => (decl_type::FLOAT1, 4),
        vsd::FLOAT2 => (decl_type::FLOAT2, 8),
        vsd::FLOAT3 => (decl_type::FLOAT3, 12),
        vsd::FLOAT4 => (decl_type::FLOAT4, 16),
        vsd::D3DCOLOR => (decl_type::D3DCOLOR, 4),
        vsd::UBYTE4 => (decl_type::UBYTE4, 4),
        vsd::SHORT2 => (decl_type::SHORT2, 4),
        vsd::SHORT4 => (decl_type::SHORT4, 8),
        other => {
            return Err(ShimError::Untranslatable {
                what: "declaration data type",
                value: other,
            })
        }
    };
    Ok(mapped)
}

fn register_usage(register: u32) -> ShimResult<(u8, u8)> {
    let usage = match register {
        vsd::REG_POSITION => (decl_usage::POSITION, 0),
        vsd::REG_BLENDWEIGHT => (decl_usage::BLENDWEIGHT, 0),
        vsd::REG_BLENDINDICES => (decl_usage::BLENDINDICES, 0),
        vsd::REG_NORMAL => (decl_usage::NORMAL, 0),
        vsd::REG_PSIZE => (decl_usage::PSIZE, 0),
        vsd::REG_DIFFUSE => (decl_usage::COLOR, 0),
        vsd::REG_SPECULAR => (decl_usage::COLOR, 1),
        r @ vsd::REG_TEXCOORD0..=vsd::REG_TEXCOORD7 => (decl_usage::TEXCOORD, (r - vsd::REG_TEXCOORD0) as u8),
        vsd::REG_POSITION2 => (decl_usage::POSITION, 1),
        vsd::REG_NORMAL2 => (decl_usage::NORMAL, 1),
        other => {
            return Err(ShimError::Untranslatable {
                what: "declaration register",
                value: other,
            })
        }
    };
    Ok(usage)
}

/// Moves the running element offset within a stream forward by `bytes`.
fn advance(offset: u16, bytes: u32) -> ShimResult<u16> {
    u16::try_from(bytes)
        .ok()
        .and_then(|bytes| offset.checked_add(bytes))
        .ok_or(ShimError::InvalidArgument("vertex declaration stream exceeds the element offset range"))
}

/// Converts a legacy declaration token stream.
pub fn translate_declaration(tokens: &[u32]) -> ShimResult<TranslatedDeclaration> {
    let mut out = TranslatedDeclaration::default();
    let mut stream = 0u16;
    let mut offset = 0u16;
    let mut i = 0usize;

    loop {
        let Some(&token) = tokens.get(i) else {
            return Err(ShimError::InvalidArgument("vertex declaration is not terminated"));
        };
        if token == vsd::END {
            break;
        }

        match (token & vsd::TOKENTYPE_MASK) >> vsd::TOKENTYPE_SHIFT {
            vsd::TOKEN_NOP => i += 1,
            vsd::TOKEN_STREAM => {
                if token & (1 << vsd::STREAMTESSELLATOR_SHIFT) != 0 {
                    return Err(ShimError::Untranslatable {
                        what: "tessellator stream",
                        value: token,
                    });
                }
                stream = (token & vsd::STREAMNUMBER_MASK) as u16;
                offset = 0;
                i += 1;
            }
            vsd::TOKEN_STREAMDATA => {
                if token & (1 << vsd::DATALOADTYPE_SHIFT) != 0 {
                    let skip = (token & vsd::SKIPCOUNT_MASK) >> vsd::SKIPCOUNT_SHIFT;
                    offset = advance(offset, skip * 4)?;
                } else {
                    let register = token & vsd::VERTEXREG_MASK;
                    let (ty, size) = element_type((token & vsd::DATATYPE_MASK) >> vsd::DATATYPE_SHIFT)?;
                    let (usage, usage_index) = register_usage(register)?;
                    out.elements.push(VertexElement {
                        stream,
                        offset,
                        decl_type: ty,
                        method: 0,
                        usage,
                        usage_index,
                    });
                    out.registers.push(register);
                    offset = advance(offset, u32::from(size))?;
                }
                i += 1;
            }
            vsd::TOKEN_CONSTMEM => {
                let count = ((token & vsd::CONSTCOUNT_MASK) >> vsd::CONSTCOUNT_SHIFT) as usize;
                let start_register = token & vsd::CONSTADDRESS_MASK;
                let data = tokens
                    .get(i + 1..i + 1 + count * 4)
                    .ok_or(ShimError::InvalidArgument("truncated declaration constant"))?;
                out.constants.push(DeclConstant {
                    start_register,
                    values: data.iter().map(|bits| f32::from_bits(*bits)).collect(),
                });
                i += 1 + count * 4;
            }
            vsd::TOKEN_EXT => {
                let count = ((token & vsd::EXTCOUNT_MASK) >> vsd::EXTCOUNT_SHIFT) as usize;
                i += 1 + count;
            }
            vsd::TOKEN_END => break,
            _ => {
                return Err(ShimError::Untranslatable {
                    what: "declaration token",
                    value: token,
                })
            }
        }
    }

    out.elements.push(VertexElement::END);
    Ok(out)
}

const SIO_DCL: u32 = 0x0000_001F;
const SPR_INPUT: u32 = 1;
const WRITEMASK_ALL: u32 = 0xF << 16;

/// Inserts `dcl_<usage> vN` instructions for every declared input register right after the
/// version token, which the native runtime requires even for 1.x shaders.
pub fn patch_vertex_shader_function(function: &[u32], decl: &TranslatedDeclaration) -> ShimResult<Vec<u32>> {
    let (&version, body) = function
        .split_first()
        .ok_or(ShimError::InvalidArgument("empty vertex shader function"))?;
    if version & 0xFFFF_0000 != 0xFFFE_0000 {
        return Err(ShimError::InvalidArgument("not a vertex shader function"));
    }

    let mut out = Vec::with_capacity(function.len() + decl.registers.len() * 3);
    out.push(version);
    for (element, &register) in decl.elements.iter().zip(&decl.registers) {
        out.push(SIO_DCL);
        out.push(0x8000_0000 | ((element.usage_index as u32) << 16) | element.usage as u32);
        out.push(0x8000_0000 | (SPR_INPUT << 28) | WRITEMASK_ALL | register);
    }
    out.extend_from_slice(body);
    Ok(out)
}
