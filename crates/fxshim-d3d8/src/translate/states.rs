use crate::d3d8::{texture_filter, RenderStateType as Rs8, TextureStageStateType as Tss8};
use crate::d3d9::{RenderStateType, SamplerStateType, TextureStageStateType};
use crate::error::{ShimError, ShimResult};

/// Where a legacy render state lands on the native device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderStateMapping {
    /// Same state, same value encoding.
    Direct(RenderStateType),
    /// `ZBIAS` becomes the floating point `DEPTHBIAS`; values are rescaled.
    DepthBias,
    /// No longer a render state; maps onto `set_software_vertex_processing`.
    SoftwareVertexProcessing,
}

/// Legacy render states that kept their value and meaning.
const DIRECT_RENDER_STATES: &[Rs8] = &[
    Rs8::ZENABLE,
    Rs8::FILLMODE,
    Rs8::SHADEMODE,
    Rs8::ZWRITEENABLE,
    Rs8::ALPHATESTENABLE,
    Rs8::LASTPIXEL,
    Rs8::SRCBLEND,
    Rs8::DESTBLEND,
    Rs8::CULLMODE,
    Rs8::ZFUNC,
    Rs8::ALPHAREF,
    Rs8::ALPHAFUNC,
    Rs8::DITHERENABLE,
    Rs8::ALPHABLENDENABLE,
    Rs8::FOGENABLE,
    Rs8::SPECULARENABLE,
    Rs8::FOGCOLOR,
    Rs8::FOGTABLEMODE,
    Rs8::FOGSTART,
    Rs8::FOGEND,
    Rs8::FOGDENSITY,
    Rs8::RANGEFOGENABLE,
    Rs8::STENCILENABLE,
    Rs8::STENCILFAIL,
    Rs8::STENCILZFAIL,
    Rs8::STENCILPASS,
    Rs8::STENCILFUNC,
    Rs8::STENCILREF,
    Rs8::STENCILMASK,
    Rs8::STENCILWRITEMASK,
    Rs8::TEXTUREFACTOR,
    Rs8::CLIPPING,
    Rs8::LIGHTING,
    Rs8::AMBIENT,
    Rs8::FOGVERTEXMODE,
    Rs8::COLORVERTEX,
    Rs8::LOCALVIEWER,
    Rs8::NORMALIZENORMALS,
    Rs8::DIFFUSEMATERIALSOURCE,
    Rs8::SPECULARMATERIALSOURCE,
    Rs8::AMBIENTMATERIALSOURCE,
    Rs8::EMISSIVEMATERIALSOURCE,
    Rs8::VERTEXBLEND,
    Rs8::CLIPPLANEENABLE,
    Rs8::POINTSIZE,
    Rs8::POINTSIZE_MIN,
    Rs8::POINTSPRITEENABLE,
    Rs8::POINTSCALEENABLE,
    Rs8::POINTSCALE_A,
    Rs8::POINTSCALE_B,
    Rs8::POINTSCALE_C,
    Rs8::MULTISAMPLEANTIALIAS,
    Rs8::MULTISAMPLEMASK,
    Rs8::PATCHEDGESTYLE,
    Rs8::DEBUGMONITORTOKEN,
    Rs8::POINTSIZE_MAX,
    Rs8::INDEXEDVERTEXBLENDENABLE,
    Rs8::COLORWRITEENABLE,
    Rs8::TWEENFACTOR,
    Rs8::BLENDOP,
    // Renamed POSITIONDEGREE / NORMALDEGREE; the linear and cubic encodings are shared.
    Rs8::POSITIONORDER,
    Rs8::NORMALORDER,
];

pub fn render_state(state: Rs8) -> ShimResult<RenderStateMapping> {
    match state {
        Rs8::ZBIAS => Ok(RenderStateMapping::DepthBias),
        Rs8::SOFTWAREVERTEXPROCESSING => Ok(RenderStateMapping::SoftwareVertexProcessing),
        s if (Rs8::WRAP0..=Rs8::WRAP7).contains(&s) => Ok(RenderStateMapping::Direct(RenderStateType(s.0))),
        s if DIRECT_RENDER_STATES.contains(&s) => Ok(RenderStateMapping::Direct(RenderStateType(s.0))),
        // LINEPATTERN, ZVISIBLE, EDGEANTIALIAS, PATCHSEGMENTS and anything undocumented.
        s => Err(ShimError::Untranslatable {
            what: "render state",
            value: s.0,
        }),
    }
}

const ZBIAS_SCALE: f32 = -0.000_005;

/// Converts an integer `ZBIAS` (0..=16) into a `DEPTHBIAS` value (float bits).
///
/// The two are not equivalent; the scale approximates the legacy depth offset on a 24-bit
/// depth buffer.
pub fn zbias_to_depth_bias(zbias: u32) -> u32 {
    (zbias as f32 * ZBIAS_SCALE).to_bits()
}

pub fn depth_bias_to_zbias(depth_bias: u32) -> u32 {
    let value = (f32::from_bits(depth_bias) / ZBIAS_SCALE).round();
    if value.is_finite() && value > 0.0 {
        value as u32
    } else {
        0
    }
}

/// Where a legacy texture stage state lands on the native device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageStateMapping {
    Stage(TextureStageStateType),
    Sampler(SamplerStateType),
}

pub fn texture_stage_state(ty: Tss8) -> ShimResult<StageStateMapping> {
    let sampler = match ty {
        Tss8::ADDRESSU => SamplerStateType::ADDRESSU,
        Tss8::ADDRESSV => SamplerStateType::ADDRESSV,
        Tss8::ADDRESSW => SamplerStateType::ADDRESSW,
        Tss8::BORDERCOLOR => SamplerStateType::BORDERCOLOR,
        Tss8::MAGFILTER => SamplerStateType::MAGFILTER,
        Tss8::MINFILTER => SamplerStateType::MINFILTER,
        Tss8::MIPFILTER => SamplerStateType::MIPFILTER,
        Tss8::MIPMAPLODBIAS => SamplerStateType::MIPMAPLODBIAS,
        Tss8::MAXMIPLEVEL => SamplerStateType::MAXMIPLEVEL,
        Tss8::MAXANISOTROPY => SamplerStateType::MAXANISOTROPY,
        t if (Tss8::COLOROP..=Tss8::TEXCOORDINDEX).contains(&t)
            || (Tss8::BUMPENVLSCALE..=Tss8::TEXTURETRANSFORMFLAGS).contains(&t)
            || (Tss8::COLORARG0..=Tss8::RESULTARG).contains(&t) =>
        {
            return Ok(StageStateMapping::Stage(TextureStageStateType(t.0)));
        }
        t => {
            return Err(ShimError::Untranslatable {
                what: "texture stage state",
                value: t.0,
            })
        }
    };
    Ok(StageStateMapping::Sampler(sampler))
}

/// Validates a sampler state value coming from a legacy stage state.
pub fn sampler_value_to_d3d9(ty: SamplerStateType, value: u32) -> ShimResult<u32> {
    let is_filter = matches!(
        ty,
        SamplerStateType::MAGFILTER | SamplerStateType::MINFILTER | SamplerStateType::MIPFILTER
    );
    if is_filter && (value == texture_filter::FLATCUBIC || value == texture_filter::GAUSSIANCUBIC) {
        return Err(ShimError::Untranslatable {
            what: "texture filter",
            value,
        });
    }
    Ok(value)
}
