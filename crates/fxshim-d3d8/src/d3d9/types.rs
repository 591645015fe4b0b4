//! Value types of the next-generation native API.
//!
//! Enumerations are raw `u32` newtypes with associated constants rather than Rust enums: values
//! arrive from an application we do not control, and the translation layer has to be able to
//! look at (and reject) values outside the documented set.

use std::fmt;
use std::num::NonZeroUsize;

use bitflags::bitflags;

/// Identity of a native object (the address of its interface pointer).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativePtr(NonZeroUsize);

impl NativePtr {
    pub const fn new(addr: usize) -> Option<Self> {
        match NonZeroUsize::new(addr) {
            Some(addr) => Some(Self(addr)),
            None => None,
        }
    }

    pub const fn addr(self) -> usize {
        self.0.get()
    }
}

impl fmt::Debug for NativePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativePtr({:#x})", self.addr())
    }
}

impl fmt::Display for NativePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.addr())
    }
}

/// Opaque window handle (`HWND`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub usize);

macro_rules! raw_enum {
    ($(#[$meta:meta])* $name:ident { $($konst:ident = $value:expr),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            $(pub const $konst: $name = $name($value);)*
        }
    };
}

pub(crate) use raw_enum;

const fn fourcc(code: &[u8; 4]) -> u32 {
    (code[0] as u32) | ((code[1] as u32) << 8) | ((code[2] as u32) << 16) | ((code[3] as u32) << 24)
}

raw_enum!(
    /// `D3DFORMAT`.
    Format {
        UNKNOWN = 0,
        R8G8B8 = 20,
        A8R8G8B8 = 21,
        X8R8G8B8 = 22,
        R5G6B5 = 23,
        X1R5G5B5 = 24,
        A1R5G5B5 = 25,
        A4R4G4B4 = 26,
        R3G3B2 = 27,
        A8 = 28,
        A8R3G3B2 = 29,
        X4R4G4B4 = 30,
        A2B10G10R10 = 31,
        A8B8G8R8 = 32,
        X8B8G8R8 = 33,
        G16R16 = 34,
        A2R10G10B10 = 35,
        A16B16G16R16 = 36,
        A8P8 = 40,
        P8 = 41,
        L8 = 50,
        A8L8 = 51,
        A4L4 = 52,
        V8U8 = 60,
        L6V5U5 = 61,
        X8L8V8U8 = 62,
        Q8W8V8U8 = 63,
        V16U16 = 64,
        W11V11U10 = 65,
        A2W10V10U10 = 67,
        UYVY = fourcc(b"UYVY"),
        YUY2 = fourcc(b"YUY2"),
        DXT1 = fourcc(b"DXT1"),
        DXT2 = fourcc(b"DXT2"),
        DXT3 = fourcc(b"DXT3"),
        DXT4 = fourcc(b"DXT4"),
        DXT5 = fourcc(b"DXT5"),
        D16_LOCKABLE = 70,
        D32 = 71,
        D15S1 = 73,
        D24S8 = 75,
        D24X8 = 77,
        D24X4S4 = 79,
        D16 = 80,
        VERTEXDATA = 100,
        INDEX16 = 101,
        INDEX32 = 102,
        A16B16G16R16F = 113,
        A32B32G32R32F = 116,
    }
);

raw_enum!(
    /// `D3DPOOL`.
    Pool {
        DEFAULT = 0,
        MANAGED = 1,
        SYSTEMMEM = 2,
        SCRATCH = 3,
    }
);

raw_enum!(
    /// `D3DMULTISAMPLE_TYPE`.
    MultiSampleType {
        NONE = 0,
        NONMASKABLE = 1,
        SAMPLES_2 = 2,
        SAMPLES_4 = 4,
        SAMPLES_16 = 16,
    }
);

raw_enum!(
    /// `D3DSWAPEFFECT`.
    SwapEffect {
        DISCARD = 1,
        FLIP = 2,
        COPY = 3,
    }
);

raw_enum!(
    /// `D3DRESOURCETYPE`.
    ResourceType {
        SURFACE = 1,
        VOLUME = 2,
        TEXTURE = 3,
        VOLUMETEXTURE = 4,
        CUBETEXTURE = 5,
        VERTEXBUFFER = 6,
        INDEXBUFFER = 7,
    }
);

raw_enum!(
    /// `D3DDEVTYPE`.
    DeviceType {
        HAL = 1,
        REF = 2,
        SW = 3,
    }
);

raw_enum!(
    /// `D3DBACKBUFFER_TYPE`.
    BackBufferType {
        MONO = 0,
        LEFT = 1,
        RIGHT = 2,
    }
);

raw_enum!(
    /// `D3DTRANSFORMSTATETYPE`.
    TransformState {
        VIEW = 2,
        PROJECTION = 3,
        TEXTURE0 = 16,
        TEXTURE7 = 23,
        WORLD = 256,
    }
);

impl TransformState {
    /// `D3DTS_WORLDMATRIX(index)`.
    pub const fn world_matrix(index: u32) -> Self {
        Self(256 + index)
    }
}

raw_enum!(
    /// `D3DPRIMITIVETYPE`.
    PrimitiveType {
        POINTLIST = 1,
        LINELIST = 2,
        LINESTRIP = 3,
        TRIANGLELIST = 4,
        TRIANGLESTRIP = 5,
        TRIANGLEFAN = 6,
    }
);

raw_enum!(
    /// `D3DTEXTUREFILTERTYPE`.
    TextureFilter {
        NONE = 0,
        POINT = 1,
        LINEAR = 2,
        ANISOTROPIC = 3,
        PYRAMIDALQUAD = 6,
        GAUSSIANQUAD = 7,
    }
);

raw_enum!(
    /// `D3DCUBEMAP_FACES`.
    CubeMapFace {
        POSITIVE_X = 0,
        NEGATIVE_X = 1,
        POSITIVE_Y = 2,
        NEGATIVE_Y = 3,
        POSITIVE_Z = 4,
        NEGATIVE_Z = 5,
    }
);

raw_enum!(
    /// `D3DRENDERSTATETYPE` (next generation).
    RenderStateType {
        ZENABLE = 7,
        FILLMODE = 8,
        ZWRITEENABLE = 14,
        CULLMODE = 22,
        ALPHABLENDENABLE = 27,
        STENCILENABLE = 52,
        LIGHTING = 137,
        COLORWRITEENABLE = 168,
        DEPTHBIAS = 195,
    }
);

raw_enum!(
    /// `D3DSAMPLERSTATETYPE`.
    SamplerStateType {
        ADDRESSU = 1,
        ADDRESSV = 2,
        ADDRESSW = 3,
        BORDERCOLOR = 4,
        MAGFILTER = 5,
        MINFILTER = 6,
        MIPFILTER = 7,
        MIPMAPLODBIAS = 8,
        MAXMIPLEVEL = 9,
        MAXANISOTROPY = 10,
    }
);

raw_enum!(
    /// `D3DTEXTURESTAGESTATETYPE` (next generation; sampler states live elsewhere).
    TextureStageStateType {
        COLOROP = 1,
        COLORARG1 = 2,
        COLORARG2 = 3,
        ALPHAOP = 4,
        ALPHAARG1 = 5,
        ALPHAARG2 = 6,
        TEXCOORDINDEX = 11,
        TEXTURETRANSFORMFLAGS = 24,
        RESULTARG = 28,
        CONSTANT = 32,
    }
);

/// `D3DCULL_NONE`.
pub const CULL_NONE: u32 = 1;

/// Flexible vertex format bits used by the framework itself.
pub mod fvf {
    pub const RESERVED0: u32 = 0x001;
    pub const XYZ: u32 = 0x002;
    pub const XYZRHW: u32 = 0x004;
    pub const DIFFUSE: u32 = 0x040;
    pub const TEX1: u32 = 0x100;
}

bitflags! {
    /// `D3DUSAGE_*`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Usage: u32 {
        const RENDERTARGET = 0x0000_0001;
        const DEPTHSTENCIL = 0x0000_0002;
        const WRITEONLY = 0x0000_0008;
        const SOFTWAREPROCESSING = 0x0000_0010;
        const DONOTCLIP = 0x0000_0020;
        const POINTS = 0x0000_0040;
        const RTPATCHES = 0x0000_0080;
        const NPATCHES = 0x0000_0100;
        const DYNAMIC = 0x0000_0200;
        const AUTOGENMIPMAP = 0x0000_0400;
    }
}

bitflags! {
    /// `D3DCLEAR_*`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        const TARGET = 0x1;
        const ZBUFFER = 0x2;
        const STENCIL = 0x4;
    }
}

bitflags! {
    /// `D3DLOCK_*`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct LockFlags: u32 {
        const READONLY = 0x0000_0010;
        const NOSYSLOCK = 0x0000_0800;
        const NOOVERWRITE = 0x0000_1000;
        const DISCARD = 0x0000_2000;
        const NO_DIRTY_UPDATE = 0x0000_8000;
    }
}

/// `D3DPRESENT_INTERVAL_*`.
pub mod present_interval {
    pub const DEFAULT: u32 = 0x0000_0000;
    pub const ONE: u32 = 0x0000_0001;
    pub const IMMEDIATE: u32 = 0x8000_0000;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self {
            left: 0,
            top: 0,
            right: width as i32,
            bottom: height as i32,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// `D3DBOX`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Box3 {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub front: u32,
    pub back: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColorValue {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Row-major 4x4 matrix (`D3DMATRIX`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix(pub [[f32; 4]; 4]);

impl Matrix {
    pub const IDENTITY: Matrix = Matrix([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);

    pub fn multiply(&self, rhs: &Matrix) -> Matrix {
        let mut out = [[0.0f32; 4]; 4];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.0[r][k] * rhs.0[k][c]).sum();
            }
        }
        Matrix(out)
    }

    pub fn to_floats(&self) -> [f32; 16] {
        let mut out = [0.0f32; 16];
        for (r, row) in self.0.iter().enumerate() {
            out[r * 4..r * 4 + 4].copy_from_slice(row);
        }
        out
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub min_z: f32,
    pub max_z: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Material {
    pub diffuse: ColorValue,
    pub ambient: ColorValue,
    pub specular: ColorValue,
    pub emissive: ColorValue,
    pub power: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Light {
    pub light_type: u32,
    pub diffuse: ColorValue,
    pub specular: ColorValue,
    pub ambient: ColorValue,
    pub position: Vector3,
    pub direction: Vector3,
    pub range: f32,
    pub falloff: f32,
    pub attenuation0: f32,
    pub attenuation1: f32,
    pub attenuation2: f32,
    pub theta: f32,
    pub phi: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClipStatus {
    pub clip_union: u32,
    pub clip_intersection: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisplayMode {
    pub width: u32,
    pub height: u32,
    pub refresh_rate: u32,
    pub format: Format,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CreationParameters {
    pub adapter_ordinal: u32,
    pub device_type: DeviceType,
    pub focus_window: WindowHandle,
    pub behavior_flags: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PresentParameters {
    pub back_buffer_width: u32,
    pub back_buffer_height: u32,
    pub back_buffer_format: Format,
    pub back_buffer_count: u32,
    pub multi_sample_type: MultiSampleType,
    pub multi_sample_quality: u32,
    pub swap_effect: SwapEffect,
    pub device_window: WindowHandle,
    pub windowed: bool,
    pub enable_auto_depth_stencil: bool,
    pub auto_depth_stencil_format: Format,
    pub flags: u32,
    pub full_screen_refresh_rate_in_hz: u32,
    pub presentation_interval: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RasterStatus {
    pub in_vblank: bool,
    pub scan_line: u32,
}

#[derive(Clone, PartialEq, Eq)]
pub struct GammaRamp {
    pub red: [u16; 256],
    pub green: [u16; 256],
    pub blue: [u16; 256],
}

impl Default for GammaRamp {
    fn default() -> Self {
        Self {
            red: [0; 256],
            green: [0; 256],
            blue: [0; 256],
        }
    }
}

impl fmt::Debug for GammaRamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GammaRamp").finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaletteEntry {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub flags: u8,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SurfaceDesc {
    pub format: Format,
    pub resource_type: ResourceType,
    pub usage: Usage,
    pub pool: Pool,
    pub multi_sample_type: MultiSampleType,
    pub multi_sample_quality: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VolumeDesc {
    pub format: Format,
    pub resource_type: ResourceType,
    pub usage: Usage,
    pub pool: Pool,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

/// `D3DVERTEXBUFFER_DESC`; identical in both generations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VertexBufferDesc {
    pub format: Format,
    pub resource_type: ResourceType,
    pub usage: Usage,
    pub pool: Pool,
    pub size: u32,
    pub fvf: u32,
}

/// `D3DINDEXBUFFER_DESC`; identical in both generations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndexBufferDesc {
    pub format: Format,
    pub resource_type: ResourceType,
    pub usage: Usage,
    pub pool: Pool,
    pub size: u32,
}

/// A locked 2D region. `bits` is the mapped address handed through to the application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LockedRect {
    pub pitch: i32,
    pub bits: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LockedBox {
    pub row_pitch: i32,
    pub slice_pitch: i32,
    pub bits: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdapterIdentifier {
    pub driver: String,
    pub description: String,
    pub device_name: String,
    pub driver_version: u64,
    pub vendor_id: u32,
    pub device_id: u32,
    pub sub_sys_id: u32,
    pub revision: u32,
    pub device_identifier: [u8; 16],
    pub whql_level: u32,
}

/// `D3DRECTPATCH_INFO`; the legacy order field shares the degree encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RectPatchInfo {
    pub start_vertex_offset_width: u32,
    pub start_vertex_offset_height: u32,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub basis: u32,
    pub degree: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TriPatchInfo {
    pub start_vertex_offset: u32,
    pub num_vertices: u32,
    pub basis: u32,
    pub degree: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamSource {
    pub buffer: Option<NativePtr>,
    pub offset: u32,
    pub stride: u32,
}

/// `D3DDECLTYPE`.
pub mod decl_type {
    pub const FLOAT1: u8 = 0;
    pub const FLOAT2: u8 = 1;
    pub const FLOAT3: u8 = 2;
    pub const FLOAT4: u8 = 3;
    pub const D3DCOLOR: u8 = 4;
    pub const UBYTE4: u8 = 5;
    pub const SHORT2: u8 = 6;
    pub const SHORT4: u8 = 7;
    pub const UNUSED: u8 = 17;
}

/// `D3DDECLUSAGE`.
pub mod decl_usage {
    pub const POSITION: u8 = 0;
    pub const BLENDWEIGHT: u8 = 1;
    pub const BLENDINDICES: u8 = 2;
    pub const NORMAL: u8 = 3;
    pub const PSIZE: u8 = 4;
    pub const TEXCOORD: u8 = 5;
    pub const TANGENT: u8 = 6;
    pub const BINORMAL: u8 = 7;
    pub const TESSFACTOR: u8 = 8;
    pub const POSITIONT: u8 = 9;
    pub const COLOR: u8 = 10;
    pub const FOG: u8 = 11;
    pub const DEPTH: u8 = 12;
    pub const SAMPLE: u8 = 13;
}

/// `D3DVERTEXELEMENT9`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexElement {
    pub stream: u16,
    pub offset: u16,
    pub decl_type: u8,
    pub method: u8,
    pub usage: u8,
    pub usage_index: u8,
}

impl VertexElement {
    /// `D3DDECL_END()`.
    pub const END: VertexElement = VertexElement {
        stream: 0xFF,
        offset: 0,
        decl_type: decl_type::UNUSED,
        method: 0,
        usage: 0,
        usage_index: 0,
    };
}

/// `D3DCAPS9`, restricted to the fields the legacy caps structure can express plus the few
/// next-generation fields the framework consults.
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
    pub pixel_shader_1x_max_value: f32,
    pub dev_caps2: u32,
    pub declaration_types: u32,
    pub num_simultaneous_rts: u32,
    pub stretch_rect_filter_caps: u32,
}

/// `D3DVS_VERSION(major, minor)`.
pub const fn vs_version(major: u32, minor: u32) -> u32 {
    0xFFFE_0000 | (major << 8) | minor
}

/// `D3DPS_VERSION(major, minor)`.
pub const fn ps_version(major: u32, minor: u32) -> u32 {
    0xFFFF_0000 | (major << 8) | minor
}
