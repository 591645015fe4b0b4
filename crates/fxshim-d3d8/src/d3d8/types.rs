use crate::d3d9::{
    raw_enum, AdapterIdentifier as AdapterIdentifier9, DeviceType, Format, MultiSampleType, Pool, ResourceType,
    Usage, WindowHandle,
};

pub use crate::d3d9::{
    ClipStatus, ColorValue, CreationParameters, DisplayMode, IndexBufferDesc, Light, Material, RectPatchInfo,
    TriPatchInfo, Vector3, VertexBufferDesc, Viewport,
};

/// SDK version an application passes to the legacy creation entry point.
pub const SDK_VERSION: u32 = 220;

raw_enum!(
    /// Legacy `D3DSWAPEFFECT`; `COPY_VSYNC` has no next-generation value.
    SwapEffect {
        DISCARD = 1,
        FLIP = 2,
        COPY = 3,
        COPY_VSYNC = 4,
    }
);

raw_enum!(
    /// Legacy `D3DRENDERSTATETYPE`.
    RenderStateType {
        ZENABLE = 7,
        FILLMODE = 8,
        SHADEMODE = 9,
        LINEPATTERN = 10,
        ZWRITEENABLE = 14,
        ALPHATESTENABLE = 15,
        LASTPIXEL = 16,
        SRCBLEND = 19,
        DESTBLEND = 20,
        CULLMODE = 22,
        ZFUNC = 23,
        ALPHAREF = 24,
        ALPHAFUNC = 25,
        DITHERENABLE = 26,
        ALPHABLENDENABLE = 27,
        FOGENABLE = 28,
        SPECULARENABLE = 29,
        ZVISIBLE = 30,
        FOGCOLOR = 34,
        FOGTABLEMODE = 35,
        FOGSTART = 36,
        FOGEND = 37,
        FOGDENSITY = 38,
        EDGEANTIALIAS = 40,
        ZBIAS = 47,
        RANGEFOGENABLE = 48,
        STENCILENABLE = 52,
        STENCILFAIL = 53,
        STENCILZFAIL = 54,
        STENCILPASS = 55,
        STENCILFUNC = 56,
        STENCILREF = 57,
        STENCILMASK = 58,
        STENCILWRITEMASK = 59,
        TEXTUREFACTOR = 60,
        WRAP0 = 128,
        WRAP7 = 135,
        CLIPPING = 136,
        LIGHTING = 137,
        AMBIENT = 139,
        FOGVERTEXMODE = 140,
        COLORVERTEX = 141,
        LOCALVIEWER = 142,
        NORMALIZENORMALS = 143,
        DIFFUSEMATERIALSOURCE = 145,
        SPECULARMATERIALSOURCE = 146,
        AMBIENTMATERIALSOURCE = 147,
        EMISSIVEMATERIALSOURCE = 148,
        VERTEXBLEND = 151,
        CLIPPLANEENABLE = 152,
        SOFTWAREVERTEXPROCESSING = 153,
        POINTSIZE = 154,
        POINTSIZE_MIN = 155,
        POINTSPRITEENABLE = 156,
        POINTSCALEENABLE = 157,
        POINTSCALE_A = 158,
        POINTSCALE_B = 159,
        POINTSCALE_C = 160,
        MULTISAMPLEANTIALIAS = 161,
        MULTISAMPLEMASK = 162,
        PATCHEDGESTYLE = 163,
        PATCHSEGMENTS = 164,
        DEBUGMONITORTOKEN = 165,
        POINTSIZE_MAX = 166,
        INDEXEDVERTEXBLENDENABLE = 167,
        COLORWRITEENABLE = 168,
        TWEENFACTOR = 170,
        BLENDOP = 171,
        POSITIONORDER = 172,
        NORMALORDER = 173,
    }
);

raw_enum!(
    /// Legacy `D3DTEXTURESTAGESTATETYPE`; sampler states are still stage states here.
    TextureStageStateType {
        COLOROP = 1,
        COLORARG1 = 2,
        COLORARG2 = 3,
        ALPHAOP = 4,
        ALPHAARG1 = 5,
        ALPHAARG2 = 6,
        BUMPENVMAT00 = 7,
        BUMPENVMAT01 = 8,
        BUMPENVMAT10 = 9,
        BUMPENVMAT11 = 10,
        TEXCOORDINDEX = 11,
        ADDRESSU = 13,
        ADDRESSV = 14,
        BORDERCOLOR = 15,
        MAGFILTER = 16,
        MINFILTER = 17,
        MIPFILTER = 18,
        MIPMAPLODBIAS = 19,
        MAXMIPLEVEL = 20,
        MAXANISOTROPY = 21,
        BUMPENVLSCALE = 22,
        BUMPENVLOFFSET = 23,
        TEXTURETRANSFORMFLAGS = 24,
        ADDRESSW = 25,
        COLORARG0 = 26,
        ALPHAARG0 = 27,
        RESULTARG = 28,
    }
);

/// Legacy `D3DTEXF_*` values without a next-generation counterpart.
pub mod texture_filter {
    pub const FLATCUBIC: u32 = 4;
    pub const GAUSSIANCUBIC: u32 = 5;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PresentParameters {
    pub back_buffer_width: u32,
    pub back_buffer_height: u32,
    pub back_buffer_format: Format,
    pub back_buffer_count: u32,
    pub multi_sample_type: MultiSampleType,
    pub swap_effect: SwapEffect,
    pub device_window: WindowHandle,
    pub windowed: bool,
    pub enable_auto_depth_stencil: bool,
    pub auto_depth_stencil_format: Format,
    pub flags: u32,
    pub full_screen_refresh_rate_in_hz: u32,
    pub full_screen_presentation_interval: u32,
}

/// Legacy `D3DSURFACE_DESC`: no multisample quality, but carries the byte size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SurfaceDesc {
    pub format: Format,
    pub resource_type: ResourceType,
    pub usage: Usage,
    pub pool: Pool,
    pub size: u32,
    pub multi_sample_type: MultiSampleType,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VolumeDesc {
    pub format: Format,
    pub resource_type: ResourceType,
    pub usage: Usage,
    pub pool: Pool,
    pub size: u32,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

/// Legacy `D3DADAPTER_IDENTIFIER8` (no device name).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdapterIdentifier {
    pub driver: String,
    pub description: String,
    pub driver_version: u64,
    pub vendor_id: u32,
    pub device_id: u32,
    pub sub_sys_id: u32,
    pub revision: u32,
    pub device_identifier: [u8; 16],
    pub whql_level: u32,
}

impl From<&AdapterIdentifier9> for AdapterIdentifier {
    fn from(id: &AdapterIdentifier9) -> Self {
        Self {
            driver: id.driver.clone(),
            description: id.description.clone(),
            driver_version: id.driver_version,
            vendor_id: id.vendor_id,
            device_id: id.device_id,
            sub_sys_id: id.sub_sys_id,
            revision: id.revision,
            device_identifier: id.device_identifier,
            whql_level: id.whql_level,
        }
    }
}

/// Legacy `D3DCAPS8`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Caps {
    pub device_type: DeviceType,
    pub adapter_ordinal: u32,
    pub caps: u32,
    pub caps2: u32,
    pub caps3: u32,
    pub presentation_intervals: u32,
    pub cursor_caps: u32,
    pub dev_caps: u32,
    pub primitive_misc_caps: u32,
    pub raster_caps: u32,
    pub z_cmp_caps: u32,
    pub src_blend_caps: u32,
    pub dest_blend_caps: u32,
    pub alpha_cmp_caps: u32,
    pub shade_caps: u32,
    pub texture_caps: u32,
    pub texture_filter_caps: u32,
    pub cube_texture_filter_caps: u32,
    pub volume_texture_filter_caps: u32,
    pub texture_address_caps: u32,
    pub volume_texture_address_caps: u32,
    pub line_caps: u32,
    pub max_texture_width: u32,
    pub max_texture_height: u32,
    pub max_volume_extent: u32,
    pub max_texture_repeat: u32,
    pub max_texture_aspect_ratio: u32,
    pub max_anisotropy: u32,
    pub max_vertex_w: f32,
    pub guard_band_left: f32,
    pub guard_band_top: f32,
    pub guard_band_right: f32,
    pub guard_band_bottom: f32,
    pub extents_adjust: f32,
    pub stencil_caps: u32,
    pub fvf_caps: u32,
    pub texture_op_caps: u32,
    pub max_texture_blend_stages: u32,
    pub max_simultaneous_textures: u32,
    pub vertex_processing_caps: u32,
    pub max_active_lights: u32,
    pub max_user_clip_planes: u32,
    pub max_vertex_blend_matrices: u32,
    pub max_vertex_blend_matrix_index: u32,
    pub max_point_size: f32,
    pub max_primitive_count: u32,
    pub max_vertex_index: u32,
    pub max_streams: u32,
    pub max_stream_stride: u32,
    pub vertex_shader_version: u32,
    pub max_vertex_shader_const: u32,
    pub pixel_shader_version: u32,
    pub max_pixel_shader_value: f32,
}

/// Legacy vertex shader declaration tokens (`D3DVSD_*`).
pub mod vsd {
    pub const TOKEN_NOP: u32 = 0;
    pub const TOKEN_STREAM: u32 = 1;
    pub const TOKEN_STREAMDATA: u32 = 2;
    pub const TOKEN_TESSELLATOR: u32 = 3;
    pub const TOKEN_CONSTMEM: u32 = 4;
    pub const TOKEN_EXT: u32 = 5;
    pub const TOKEN_END: u32 = 7;

    pub const END: u32 = 0xFFFF_FFFF;

    pub const TOKENTYPE_SHIFT: u32 = 29;
    pub const TOKENTYPE_MASK: u32 = 0x7 << TOKENTYPE_SHIFT;
    pub const STREAMNUMBER_MASK: u32 = 0xF;
    pub const DATALOADTYPE_SHIFT: u32 = 28;
    pub const DATATYPE_SHIFT: u32 = 16;
    pub const DATATYPE_MASK: u32 = 0xF << DATATYPE_SHIFT;
    pub const VERTEXREG_MASK: u32 = 0x1F;
    pub const SKIPCOUNT_SHIFT: u32 = 16;
    pub const SKIPCOUNT_MASK: u32 = 0xF << SKIPCOUNT_SHIFT;
    pub const CONSTCOUNT_SHIFT: u32 = 25;
    pub const CONSTCOUNT_MASK: u32 = 0xF << CONSTCOUNT_SHIFT;
    pub const CONSTADDRESS_MASK: u32 = 0x7F;
    pub const STREAMTESSELLATOR_SHIFT: u32 = 28;
    pub const EXTCOUNT_SHIFT: u32 = 24;
    pub const EXTCOUNT_MASK: u32 = 0x1F << EXTCOUNT_SHIFT;

    // Data types.
    pub const FLOAT1: u32 = 0;
    pub const FLOAT2: u32 = 1;
    pub const FLOAT3: u32 = 2;
    pub const FLOAT4: u32 = 3;
    pub const D3DCOLOR: u32 = 4;
    pub const UBYTE4: u32 = 5;
    pub const SHORT2: u32 = 6;
    pub const SHORT4: u32 = 7;

    // Fixed-function input registers.
    pub const REG_POSITION: u32 = 0;
    pub const REG_BLENDWEIGHT: u32 = 1;
    pub const REG_BLENDINDICES: u32 = 2;
    pub const REG_NORMAL: u32 = 3;
    pub const REG_PSIZE: u32 = 4;
    pub const REG_DIFFUSE: u32 = 5;
    pub const REG_SPECULAR: u32 = 6;
    pub const REG_TEXCOORD0: u32 = 7;
    pub const REG_TEXCOORD7: u32 = 14;
    pub const REG_POSITION2: u32 = 15;
    pub const REG_NORMAL2: u32 = 16;

    /// `D3DVSD_STREAM(n)`.
    pub const fn stream(n: u32) -> u32 {
        (TOKEN_STREAM << TOKENTYPE_SHIFT) | n
    }

    /// `D3DVSD_REG(reg, type)`.
    pub const fn reg(register: u32, data_type: u32) -> u32 {
        (TOKEN_STREAMDATA << TOKENTYPE_SHIFT) | (data_type << DATATYPE_SHIFT) | register
    }

    /// `D3DVSD_SKIP(dword_count)`.
    pub const fn skip(dword_count: u32) -> u32 {
        (TOKEN_STREAMDATA << TOKENTYPE_SHIFT) | (1 << DATALOADTYPE_SHIFT) | (dword_count << SKIPCOUNT_SHIFT)
    }

    /// `D3DVSD_CONST(address, count)`; followed by `count * 4` float tokens.
    pub const fn constant(address: u32, count: u32) -> u32 {
        (TOKEN_CONSTMEM << TOKENTYPE_SHIFT) | (count << CONSTCOUNT_SHIFT) | address
    }
}
