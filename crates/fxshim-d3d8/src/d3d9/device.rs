//! Logical interface of the next-generation native runtime.
//!
//! These traits describe what the shim needs from the native objects, not their binary layout.
//! Interface pointers are represented by [`NativePtr`]; reference counting stays explicit
//! (`add_ref`/`release`) so the shim can mirror the application's counts 1:1. Handles are cheap
//! copies of the interface pointer: cloning one does not touch the native count.

use crate::d3d9::types::*;
use crate::hresult::NativeResult;

/// `IUnknown` reference counting of native child objects.
pub trait ObjectRefs {
    fn add_ref_object(&self, object: NativePtr) -> u32;
    fn release_object(&self, object: NativePtr) -> u32;
}

/// Methods of the native child objects (resources, swap chains, shaders, declarations).
///
/// Every call is routed through the owning device so that a single native handle type can serve
/// the whole object graph.
pub trait ResourceApi: ObjectRefs {
    fn resource_type(&self, object: NativePtr) -> NativeResult<ResourceType>;

    fn set_priority(&self, resource: NativePtr, priority: u32) -> u32;
    fn priority(&self, resource: NativePtr) -> u32;
    fn preload(&self, resource: NativePtr);

    // Base textures.
    fn set_lod(&self, texture: NativePtr, lod: u32) -> u32;
    fn lod(&self, texture: NativePtr) -> u32;
    fn level_count(&self, texture: NativePtr) -> u32;

    // 2D textures.
    fn texture_level_desc(&self, texture: NativePtr, level: u32) -> NativeResult<SurfaceDesc>;
    /// Returns the surface with an added reference.
    fn texture_surface_level(&self, texture: NativePtr, level: u32) -> NativeResult<NativePtr>;
    fn texture_lock_rect(
        &self,
        texture: NativePtr,
        level: u32,
        rect: Option<Rect>,
        flags: LockFlags,
    ) -> NativeResult<LockedRect>;
    fn texture_unlock_rect(&self, texture: NativePtr, level: u32) -> NativeResult<()>;
    fn texture_add_dirty_rect(&self, texture: NativePtr, rect: Option<Rect>) -> NativeResult<()>;

    // Cube textures.
    fn cube_level_desc(&self, cube: NativePtr, level: u32) -> NativeResult<SurfaceDesc>;
    fn cube_map_surface(&self, cube: NativePtr, face: CubeMapFace, level: u32) -> NativeResult<NativePtr>;
    fn cube_lock_rect(
        &self,
        cube: NativePtr,
        face: CubeMapFace,
        level: u32,
        rect: Option<Rect>,
        flags: LockFlags,
    ) -> NativeResult<LockedRect>;
    fn cube_unlock_rect(&self, cube: NativePtr, face: CubeMapFace, level: u32) -> NativeResult<()>;
    fn cube_add_dirty_rect(&self, cube: NativePtr, face: CubeMapFace, rect: Option<Rect>) -> NativeResult<()>;

    // Volume textures.
    fn volume_texture_level_desc(&self, texture: NativePtr, level: u32) -> NativeResult<VolumeDesc>;
    fn volume_texture_volume_level(&self, texture: NativePtr, level: u32) -> NativeResult<NativePtr>;
    fn volume_texture_lock_box(
        &self,
        texture: NativePtr,
        level: u32,
        region: Option<Box3>,
        flags: LockFlags,
    ) -> NativeResult<LockedBox>;
    fn volume_texture_unlock_box(&self, texture: NativePtr, level: u32) -> NativeResult<()>;
    fn volume_texture_add_dirty_box(&self, texture: NativePtr, region: Option<Box3>) -> NativeResult<()>;

    // Surfaces and volumes.
    fn surface_desc(&self, surface: NativePtr) -> NativeResult<SurfaceDesc>;
    fn surface_lock_rect(&self, surface: NativePtr, rect: Option<Rect>, flags: LockFlags) -> NativeResult<LockedRect>;
    fn surface_unlock_rect(&self, surface: NativePtr) -> NativeResult<()>;
    /// Returns the texture or swap chain owning a surface or volume, with an added reference.
    fn container(&self, object: NativePtr) -> NativeResult<NativePtr>;
    fn volume_desc(&self, volume: NativePtr) -> NativeResult<VolumeDesc>;
    fn volume_lock_box(&self, volume: NativePtr, region: Option<Box3>, flags: LockFlags) -> NativeResult<LockedBox>;
    fn volume_unlock_box(&self, volume: NativePtr) -> NativeResult<()>;

    // Buffers.
    fn vertex_buffer_desc(&self, buffer: NativePtr) -> NativeResult<VertexBufferDesc>;
    fn index_buffer_desc(&self, buffer: NativePtr) -> NativeResult<IndexBufferDesc>;
    fn buffer_lock(&self, buffer: NativePtr, offset: u32, size: u32, flags: LockFlags) -> NativeResult<usize>;
    fn buffer_unlock(&self, buffer: NativePtr) -> NativeResult<()>;

    // Swap chains.
    fn swap_chain_present(
        &self,
        swap_chain: NativePtr,
        src: Option<Rect>,
        dst: Option<Rect>,
        window: Option<WindowHandle>,
    ) -> NativeResult<()>;
    fn swap_chain_back_buffer(&self, swap_chain: NativePtr, index: u32, ty: BackBufferType) -> NativeResult<NativePtr>;

    /// Uploads tightly described pixel rows into a surface, converting from `format`.
    ///
    /// This is the utility-library upload path (`D3DXLoadSurfaceFromMemory`), used when filling
    /// textures from decoded images.
    fn load_surface_from_memory(
        &self,
        surface: NativePtr,
        dst_rect: Option<Rect>,
        data: &[u8],
        format: Format,
        pitch: u32,
        src_rect: Rect,
    ) -> NativeResult<()>;
}

/// The native device (`IDirect3DDevice9`).
pub trait Device: ResourceApi + Clone {
    fn add_ref(&self) -> u32;
    fn release(&self) -> u32;

    fn test_cooperative_level(&self) -> NativeResult<()>;
    fn available_texture_mem(&self) -> u32;
    fn evict_managed_resources(&self) -> NativeResult<()>;
    /// Identity of the factory that created this device.
    fn direct3d(&self) -> NativeResult<NativePtr>;
    fn device_caps(&self) -> NativeResult<Caps>;
    fn display_mode(&self, swap_chain: u32) -> NativeResult<DisplayMode>;
    fn creation_parameters(&self) -> NativeResult<CreationParameters>;
    fn set_cursor_properties(&self, x: u32, y: u32, bitmap: NativePtr) -> NativeResult<()>;
    fn set_cursor_position(&self, x: i32, y: i32, flags: u32);
    fn show_cursor(&self, show: bool) -> bool;
    fn create_additional_swap_chain(&self, params: &mut PresentParameters) -> NativeResult<NativePtr>;
    fn reset(&self, params: &mut PresentParameters) -> NativeResult<()>;
    fn present(&self, src: Option<Rect>, dst: Option<Rect>, window: Option<WindowHandle>) -> NativeResult<()>;
    fn back_buffer(&self, swap_chain: u32, index: u32, ty: BackBufferType) -> NativeResult<NativePtr>;
    fn raster_status(&self, swap_chain: u32) -> NativeResult<RasterStatus>;
    fn set_gamma_ramp(&self, swap_chain: u32, flags: u32, ramp: &GammaRamp);
    fn gamma_ramp(&self, swap_chain: u32) -> GammaRamp;

    fn create_texture(
        &self,
        width: u32,
        height: u32,
        levels: u32,
        usage: Usage,
        format: Format,
        pool: Pool,
    ) -> NativeResult<NativePtr>;
    fn create_volume_texture(
        &self,
        width: u32,
        height: u32,
        depth: u32,
        levels: u32,
        usage: Usage,
        format: Format,
        pool: Pool,
    ) -> NativeResult<NativePtr>;
    fn create_cube_texture(
        &self,
        edge_length: u32,
        levels: u32,
        usage: Usage,
        format: Format,
        pool: Pool,
    ) -> NativeResult<NativePtr>;
    fn create_vertex_buffer(&self, length: u32, usage: Usage, fvf: u32, pool: Pool) -> NativeResult<NativePtr>;
    fn create_index_buffer(&self, length: u32, usage: Usage, format: Format, pool: Pool) -> NativeResult<NativePtr>;
    fn create_render_target(
        &self,
        width: u32,
        height: u32,
        format: Format,
        multi_sample: MultiSampleType,
        multi_sample_quality: u32,
        lockable: bool,
    ) -> NativeResult<NativePtr>;
    fn create_depth_stencil_surface(
        &self,
        width: u32,
        height: u32,
        format: Format,
        multi_sample: MultiSampleType,
        multi_sample_quality: u32,
        discard: bool,
    ) -> NativeResult<NativePtr>;
    fn create_offscreen_plain_surface(
        &self,
        width: u32,
        height: u32,
        format: Format,
        pool: Pool,
    ) -> NativeResult<NativePtr>;

    fn update_surface(
        &self,
        src: NativePtr,
        src_rect: Option<Rect>,
        dst: NativePtr,
        dst_point: Option<Point>,
    ) -> NativeResult<()>;
    fn update_texture(&self, src: NativePtr, dst: NativePtr) -> NativeResult<()>;
    fn get_render_target_data(&self, render_target: NativePtr, dst: NativePtr) -> NativeResult<()>;
    fn stretch_rect(
        &self,
        src: NativePtr,
        src_rect: Option<Rect>,
        dst: NativePtr,
        dst_rect: Option<Rect>,
        filter: TextureFilter,
    ) -> NativeResult<()>;

    fn set_render_target(&self, index: u32, surface: Option<NativePtr>) -> NativeResult<()>;
    /// Returns the bound surface with an added reference.
    fn render_target(&self, index: u32) -> NativeResult<NativePtr>;
    fn set_depth_stencil_surface(&self, surface: Option<NativePtr>) -> NativeResult<()>;
    fn depth_stencil_surface(&self) -> NativeResult<NativePtr>;

    fn begin_scene(&self) -> NativeResult<()>;
    fn end_scene(&self) -> NativeResult<()>;
    fn clear(&self, rects: &[Rect], flags: ClearFlags, color: u32, z: f32, stencil: u32) -> NativeResult<()>;

    fn set_transform(&self, state: TransformState, matrix: &Matrix) -> NativeResult<()>;
    fn transform(&self, state: TransformState) -> NativeResult<Matrix>;
    fn multiply_transform(&self, state: TransformState, matrix: &Matrix) -> NativeResult<()>;
    fn set_viewport(&self, viewport: &Viewport) -> NativeResult<()>;
    fn viewport(&self) -> NativeResult<Viewport>;
    fn set_material(&self, material: &Material) -> NativeResult<()>;
    fn material(&self) -> NativeResult<Material>;
    fn set_light(&self, index: u32, light: &Light) -> NativeResult<()>;
    fn light(&self, index: u32) -> NativeResult<Light>;
    fn light_enable(&self, index: u32, enable: bool) -> NativeResult<()>;
    fn light_enabled(&self, index: u32) -> NativeResult<bool>;
    fn set_clip_plane(&self, index: u32, plane: [f32; 4]) -> NativeResult<()>;
    fn clip_plane(&self, index: u32) -> NativeResult<[f32; 4]>;
    fn set_render_state(&self, state: RenderStateType, value: u32) -> NativeResult<()>;
    fn render_state(&self, state: RenderStateType) -> NativeResult<u32>;
    fn set_clip_status(&self, status: &ClipStatus) -> NativeResult<()>;
    fn clip_status(&self) -> NativeResult<ClipStatus>;

    /// Returns the bound texture with an added reference.
    fn texture(&self, stage: u32) -> NativeResult<Option<NativePtr>>;
    fn set_texture(&self, stage: u32, texture: Option<NativePtr>) -> NativeResult<()>;
    fn texture_stage_state(&self, stage: u32, ty: TextureStageStateType) -> NativeResult<u32>;
    fn set_texture_stage_state(&self, stage: u32, ty: TextureStageStateType, value: u32) -> NativeResult<()>;
    fn sampler_state(&self, sampler: u32, ty: SamplerStateType) -> NativeResult<u32>;
    fn set_sampler_state(&self, sampler: u32, ty: SamplerStateType, value: u32) -> NativeResult<()>;
    fn validate_device(&self) -> NativeResult<u32>;

    fn set_palette_entries(&self, palette: u32, entries: &[PaletteEntry; 256]) -> NativeResult<()>;
    fn palette_entries(&self, palette: u32) -> NativeResult<[PaletteEntry; 256]>;
    fn set_current_texture_palette(&self, palette: u32) -> NativeResult<()>;
    fn current_texture_palette(&self) -> NativeResult<u32>;
    fn set_software_vertex_processing(&self, software: bool) -> NativeResult<()>;
    fn software_vertex_processing(&self) -> bool;

    fn draw_primitive(&self, ty: PrimitiveType, start_vertex: u32, primitive_count: u32) -> NativeResult<()>;
    fn draw_indexed_primitive(
        &self,
        ty: PrimitiveType,
        base_vertex_index: i32,
        min_vertex_index: u32,
        num_vertices: u32,
        start_index: u32,
        primitive_count: u32,
    ) -> NativeResult<()>;
    fn draw_primitive_up(&self, ty: PrimitiveType, primitive_count: u32, vertices: &[u8], stride: u32) -> NativeResult<()>;
    #[allow(clippy::too_many_arguments)]
    fn draw_indexed_primitive_up(
        &self,
        ty: PrimitiveType,
        min_vertex_index: u32,
        num_vertices: u32,
        primitive_count: u32,
        indices: &[u8],
        index_format: Format,
        vertices: &[u8],
        stride: u32,
    ) -> NativeResult<()>;
    fn process_vertices(
        &self,
        src_start_index: u32,
        dest_index: u32,
        vertex_count: u32,
        dest_buffer: NativePtr,
        declaration: Option<NativePtr>,
        flags: u32,
    ) -> NativeResult<()>;

    fn create_vertex_declaration(&self, elements: &[VertexElement]) -> NativeResult<NativePtr>;
    fn set_vertex_declaration(&self, declaration: Option<NativePtr>) -> NativeResult<()>;
    fn set_fvf(&self, fvf: u32) -> NativeResult<()>;
    fn fvf(&self) -> NativeResult<u32>;
    fn create_vertex_shader(&self, function: &[u32]) -> NativeResult<NativePtr>;
    fn set_vertex_shader(&self, shader: Option<NativePtr>) -> NativeResult<()>;
    fn set_vertex_shader_constant_f(&self, start_register: u32, data: &[f32]) -> NativeResult<()>;
    fn vertex_shader_constant_f(&self, start_register: u32, vector4_count: u32) -> NativeResult<Vec<f32>>;
    fn set_stream_source(&self, stream: u32, buffer: Option<NativePtr>, offset: u32, stride: u32) -> NativeResult<()>;
    /// Returns the bound buffer with an added reference.
    fn stream_source(&self, stream: u32) -> NativeResult<StreamSource>;
    fn set_indices(&self, buffer: Option<NativePtr>) -> NativeResult<()>;
    fn indices(&self) -> NativeResult<Option<NativePtr>>;
    fn create_pixel_shader(&self, function: &[u32]) -> NativeResult<NativePtr>;
    fn set_pixel_shader(&self, shader: Option<NativePtr>) -> NativeResult<()>;
    fn set_pixel_shader_constant_f(&self, start_register: u32, data: &[f32]) -> NativeResult<()>;
    fn pixel_shader_constant_f(&self, start_register: u32, vector4_count: u32) -> NativeResult<Vec<f32>>;

    fn draw_rect_patch(&self, handle: u32, segments: &[f32; 4], info: Option<&RectPatchInfo>) -> NativeResult<()>;
    fn draw_tri_patch(&self, handle: u32, segments: &[f32; 3], info: Option<&TriPatchInfo>) -> NativeResult<()>;
    fn delete_patch(&self, handle: u32) -> NativeResult<()>;
}

/// The native factory (`IDirect3D9`).
pub trait Direct3D: Clone {
    type Device: Device;

    fn add_ref(&self) -> u32;
    fn release(&self) -> u32;
    /// Identity of this factory, as reported by [`Device::direct3d`].
    fn identity(&self) -> NativePtr;

    fn adapter_count(&self) -> u32;
    fn adapter_identifier(&self, adapter: u32, flags: u32) -> NativeResult<AdapterIdentifier>;
    fn adapter_mode_count(&self, adapter: u32, format: Format) -> u32;
    fn enum_adapter_modes(&self, adapter: u32, format: Format, mode: u32) -> NativeResult<DisplayMode>;
    fn adapter_display_mode(&self, adapter: u32) -> NativeResult<DisplayMode>;
    fn check_device_type(
        &self,
        adapter: u32,
        device_type: DeviceType,
        display_format: Format,
        back_buffer_format: Format,
        windowed: bool,
    ) -> NativeResult<()>;
    fn check_device_format(
        &self,
        adapter: u32,
        device_type: DeviceType,
        adapter_format: Format,
        usage: Usage,
        resource_type: ResourceType,
        check_format: Format,
    ) -> NativeResult<()>;
    /// Returns the number of quality levels.
    fn check_device_multi_sample_type(
        &self,
        adapter: u32,
        device_type: DeviceType,
        surface_format: Format,
        windowed: bool,
        multi_sample: MultiSampleType,
    ) -> NativeResult<u32>;
    fn check_depth_stencil_match(
        &self,
        adapter: u32,
        device_type: DeviceType,
        adapter_format: Format,
        render_target_format: Format,
        depth_stencil_format: Format,
    ) -> NativeResult<()>;
    fn device_caps(&self, adapter: u32, device_type: DeviceType) -> NativeResult<Caps>;
    fn adapter_monitor(&self, adapter: u32) -> usize;
    fn create_device(
        &self,
        adapter: u32,
        device_type: DeviceType,
        focus_window: WindowHandle,
        behavior_flags: u32,
        params: &mut PresentParameters,
    ) -> NativeResult<Self::Device>;
}
