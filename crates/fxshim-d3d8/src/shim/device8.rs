//! Legacy device shim.
//!
//! Every legacy device method has a counterpart here. Most forward unchanged; the rest wrap
//! returned resources through the registry, translate values, or are emulated on top of other
//! native calls. Calls without a native counterpart fail with `D3DERR_INVALIDCALL`.

use tracing::{debug, trace, warn};

use crate::config::ShimConfig;
use crate::d3d8;
use crate::d3d9::{
    BackBufferType, ClearFlags, ClipStatus, CreationParameters, Device, DisplayMode, Format, GammaRamp, Light,
    Material, Matrix, MultiSampleType, NativePtr, PaletteEntry, Point, Pool, PresentParameters, PrimitiveType,
    RasterStatus, Rect, RectPatchInfo, RenderStateType, TextureFilter, TransformState, TriPatchInfo, Usage,
    Viewport, WindowHandle,
};
use crate::error::{NativeContext, ShimError, ShimResult};
use crate::hresult::{HResult, NativeResult};
use crate::registry::{Origin, ResourceKind, ResourceRegistry, WrapperHandle};
use crate::shim::hook::{FrameHook, NoHook};
use crate::shim::shaders::{PixelShaderRecord, ShaderTable, VertexShaderRecord};
use crate::shim::slot::RefCounted;
use crate::translate::{self, RenderStateMapping, StageStateMapping};

fn split(call: &'static str, step: usize, total: usize, sub_call: &'static str) -> impl FnOnce(HResult) -> ShimError {
    move |hr| ShimError::Split {
        call,
        step,
        total,
        sub_call,
        hr,
    }
}

pub struct Device8<D: Device, H: FrameHook<D> = NoHook> {
    pub(crate) device: D,
    direct3d: NativePtr,
    hook: H,
    config: ShimConfig,
    pub(crate) registry: ResourceRegistry,
    shaders: ShaderTable,
    current_vertex_shader: u32,
    current_pixel_shader: u32,
    base_vertex_index: u32,
    internal_refs: u32,
}

impl<D: Device, H: FrameHook<D>> Device8<D, H> {
    pub(crate) fn new(
        device: D,
        direct3d: NativePtr,
        mut hook: H,
        config: ShimConfig,
        params: &PresentParameters,
    ) -> Self {
        let mut internal_refs = 0;
        if hook.holds_device() {
            device.add_ref();
            internal_refs = 1;
        }
        hook.device_created(&device, params);
        Self {
            device,
            direct3d,
            hook,
            config,
            registry: ResourceRegistry::new(),
            shaders: ShaderTable::default(),
            current_vertex_shader: 0,
            current_pixel_shader: 0,
            base_vertex_index: 0,
            internal_refs,
        }
    }

    pub fn native(&self) -> &D {
        &self.device
    }

    pub fn hook(&self) -> &H {
        &self.hook
    }

    pub fn hook_mut(&mut self) -> &mut H {
        &mut self.hook
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ShimConfig {
        &self.config
    }

    /// Wraps an object that was just created for the application. On failure the native
    /// reference is dropped again so nothing leaks.
    fn wrap_created(&mut self, native: NativePtr, kind: ResourceKind, origin: Origin) -> ShimResult<WrapperHandle> {
        match self.registry.wrap_created(native, kind, origin) {
            Ok(handle) => Ok(handle),
            Err(err) => {
                self.device.release_object(native);
                Err(err.into())
            }
        }
    }

    /// Wraps an object returned by a query (render target, bound texture, container, ...).
    pub(crate) fn wrap_queried(&mut self, native: NativePtr) -> ShimResult<WrapperHandle> {
        let kind = match self.registry.lookup(native).and_then(|h| self.registry.info(h)) {
            Some(info) => info.kind,
            None => {
                let ty = match self.device.resource_type(native) {
                    Ok(ty) => ty,
                    Err(hr) => {
                        self.device.release_object(native);
                        return Err(ShimError::Native {
                            call: "GetType",
                            hr,
                        });
                    }
                };
                match ResourceKind::from_resource_type(ty) {
                    Some(kind) => kind,
                    None => {
                        self.device.release_object(native);
                        return Err(ShimError::Untranslatable {
                            what: "resource type",
                            value: ty.0,
                        });
                    }
                }
            }
        };
        match self.registry.wrap(native, kind) {
            Ok(handle) => Ok(handle),
            Err(err) => {
                self.device.release_object(native);
                Err(err.into())
            }
        }
    }

    fn checked_surface(&self, handle: WrapperHandle) -> ShimResult<NativePtr> {
        Ok(self.registry.checked(handle, ResourceKind::Surface)?)
    }

    /// Tries the creation with `RENDERTARGET` added first, then as requested.
    fn create_promoted(
        &self,
        usage: Usage,
        create: impl Fn(&D, Usage) -> NativeResult<NativePtr>,
    ) -> NativeResult<(NativePtr, bool)> {
        let promotable = self.config.promote_render_targets
            && !usage.intersects(Usage::RENDERTARGET | Usage::DEPTHSTENCIL);
        if promotable {
            match create(&self.device, usage | Usage::RENDERTARGET) {
                Ok(native) => return Ok((native, true)),
                Err(hr) => debug!(%hr, "render target promotion rejected; retrying as requested"),
            }
        }
        create(&self.device, usage).map(|native| (native, false))
    }

    // Device-level queries.

    pub fn test_cooperative_level(&self) -> ShimResult<()> {
        self.device.test_cooperative_level().call("TestCooperativeLevel")
    }

    pub fn available_texture_mem(&self) -> u32 {
        self.device.available_texture_mem()
    }

    /// The legacy byte count is ignored; the native runtime only evicts everything.
    pub fn resource_manager_discard_bytes(&self, bytes: u32) -> ShimResult<()> {
        trace!(bytes, "emulating ResourceManagerDiscardBytes");
        self.device.evict_managed_resources().call("ResourceManagerDiscardBytes")
    }

    /// Identity of the native factory that created the device.
    pub fn direct3d(&self) -> NativePtr {
        self.direct3d
    }

    pub fn device_caps(&self) -> ShimResult<d3d8::Caps> {
        let caps = self.device.device_caps().call("GetDeviceCaps")?;
        Ok(translate::caps_from_d3d9(&caps))
    }

    pub fn display_mode(&self) -> ShimResult<DisplayMode> {
        self.device.display_mode(0).call("GetDisplayMode")
    }

    pub fn creation_parameters(&self) -> ShimResult<CreationParameters> {
        self.device.creation_parameters().call("GetCreationParameters")
    }

    pub fn set_cursor_properties(&self, x: u32, y: u32, bitmap: WrapperHandle) -> ShimResult<()> {
        let bitmap = self.checked_surface(bitmap)?;
        self.device.set_cursor_properties(x, y, bitmap).call("SetCursorProperties")
    }

    pub fn set_cursor_position(&self, x: i32, y: i32, flags: u32) {
        self.device.set_cursor_position(x, y, flags)
    }

    pub fn show_cursor(&self, show: bool) -> bool {
        self.device.show_cursor(show)
    }

    pub fn get_info(&self, _dev_info_id: u32) -> ShimResult<()> {
        Err(ShimError::unsupported("GetInfo"))
    }

    // Swap chains and presentation.

    pub fn create_additional_swap_chain(&mut self, params: &mut d3d8::PresentParameters) -> ShimResult<WrapperHandle> {
        let mut native_params = translate::present_parameters_to_d3d9(params)?;
        let native = self
            .device
            .create_additional_swap_chain(&mut native_params)
            .call("CreateAdditionalSwapChain")?;
        translate::present_parameters_from_d3d9(&native_params, params);
        self.wrap_created(native, ResourceKind::SwapChain, Origin::default())
    }

    pub fn reset(&mut self, params: &mut d3d8::PresentParameters) -> ShimResult<()> {
        let mut native_params = translate::present_parameters_to_d3d9(params)?;
        self.hook.before_reset(&self.device);
        self.device.reset(&mut native_params).call("Reset")?;
        translate::present_parameters_from_d3d9(&native_params, params);
        self.current_vertex_shader = 0;
        self.current_pixel_shader = 0;
        self.base_vertex_index = 0;
        self.hook.after_reset(&self.device, &native_params);
        Ok(())
    }

    pub fn present(&mut self, src: Option<Rect>, dst: Option<Rect>, window: Option<WindowHandle>) -> ShimResult<()> {
        self.hook.before_present(&self.device);
        self.device.present(src, dst, window).call("Present")
    }

    pub fn back_buffer(&mut self, index: u32, ty: BackBufferType) -> ShimResult<WrapperHandle> {
        let native = self.device.back_buffer(0, index, ty).call("GetBackBuffer")?;
        self.wrap_queried(native)
    }

    pub fn raster_status(&self) -> ShimResult<RasterStatus> {
        self.device.raster_status(0).call("GetRasterStatus")
    }

    pub fn set_gamma_ramp(&self, flags: u32, ramp: &GammaRamp) {
        self.device.set_gamma_ramp(0, flags, ramp)
    }

    pub fn gamma_ramp(&self) -> GammaRamp {
        self.device.gamma_ramp(0)
    }

    // Resource creation.

    pub fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        levels: u32,
        usage: Usage,
        format: Format,
        pool: Pool,
    ) -> ShimResult<WrapperHandle> {
        let format = translate::format_to_d3d9(format)?;
        let (native, promoted) = self
            .create_promoted(usage, |device, usage| {
                device.create_texture(width, height, levels, usage, format, pool)
            })
            .call("CreateTexture")?;
        debug!(width, height, levels, promoted, "created texture");
        self.wrap_created(
            native,
            ResourceKind::Texture,
            Origin {
                requested_usage: usage,
                promoted,
            },
        )
    }

    /// Volume textures cannot be render targets, so no promotion is attempted.
    pub fn create_volume_texture(
        &mut self,
        width: u32,
        height: u32,
        depth: u32,
        levels: u32,
        usage: Usage,
        format: Format,
        pool: Pool,
    ) -> ShimResult<WrapperHandle> {
        let format = translate::format_to_d3d9(format)?;
        let native = self
            .device
            .create_volume_texture(width, height, depth, levels, usage, format, pool)
            .call("CreateVolumeTexture")?;
        self.wrap_created(
            native,
            ResourceKind::VolumeTexture,
            Origin {
                requested_usage: usage,
                promoted: false,
            },
        )
    }

    pub fn create_cube_texture(
        &mut self,
        edge_length: u32,
        levels: u32,
        usage: Usage,
        format: Format,
        pool: Pool,
    ) -> ShimResult<WrapperHandle> {
        let format = translate::format_to_d3d9(format)?;
        let (native, promoted) = self
            .create_promoted(usage, |device, usage| {
                device.create_cube_texture(edge_length, levels, usage, format, pool)
            })
            .call("CreateCubeTexture")?;
        self.wrap_created(
            native,
            ResourceKind::CubeTexture,
            Origin {
                requested_usage: usage,
                promoted,
            },
        )
    }

    pub fn create_vertex_buffer(&mut self, length: u32, usage: Usage, fvf: u32, pool: Pool) -> ShimResult<WrapperHandle> {
        let native = self
            .device
            .create_vertex_buffer(length, usage, fvf, pool)
            .call("CreateVertexBuffer")?;
        self.wrap_created(
            native,
            ResourceKind::VertexBuffer,
            Origin {
                requested_usage: usage,
                promoted: false,
            },
        )
    }

    pub fn create_index_buffer(
        &mut self,
        length: u32,
        usage: Usage,
        format: Format,
        pool: Pool,
    ) -> ShimResult<WrapperHandle> {
        if format != Format::INDEX16 && format != Format::INDEX32 {
            return Err(ShimError::Untranslatable {
                what: "index format",
                value: format.0,
            });
        }
        let native = self
            .device
            .create_index_buffer(length, usage, format, pool)
            .call("CreateIndexBuffer")?;
        self.wrap_created(
            native,
            ResourceKind::IndexBuffer,
            Origin {
                requested_usage: usage,
                promoted: false,
            },
        )
    }

    pub fn create_render_target(
        &mut self,
        width: u32,
        height: u32,
        format: Format,
        multi_sample: MultiSampleType,
        lockable: bool,
    ) -> ShimResult<WrapperHandle> {
        let format = translate::format_to_d3d9(format)?;
        let native = self
            .device
            .create_render_target(width, height, format, multi_sample, 0, lockable)
            .call("CreateRenderTarget")?;
        self.wrap_created(
            native,
            ResourceKind::Surface,
            Origin {
                requested_usage: Usage::RENDERTARGET,
                promoted: false,
            },
        )
    }

    pub fn create_depth_stencil_surface(
        &mut self,
        width: u32,
        height: u32,
        format: Format,
        multi_sample: MultiSampleType,
    ) -> ShimResult<WrapperHandle> {
        let format = translate::format_to_d3d9(format)?;
        let native = self
            .device
            .create_depth_stencil_surface(width, height, format, multi_sample, 0, false)
            .call("CreateDepthStencilSurface")?;
        self.wrap_created(
            native,
            ResourceKind::Surface,
            Origin {
                requested_usage: Usage::DEPTHSTENCIL,
                promoted: false,
            },
        )
    }

    /// Legacy image surfaces are emulated as system-memory offscreen plain surfaces. They can be
    /// copied to and locked like the originals but are not usable as texture sources.
    pub fn create_image_surface(&mut self, width: u32, height: u32, format: Format) -> ShimResult<WrapperHandle> {
        let format = translate::format_to_d3d9(format)?;
        let native = self
            .device
            .create_offscreen_plain_surface(width, height, format, Pool::SYSTEMMEM)
            .call("CreateImageSurface")?;
        self.wrap_created(native, ResourceKind::Surface, Origin::default())
    }

    // Copies.

    /// Emulated on top of `update_surface`, `stretch_rect` or `get_render_target_data`,
    /// depending on where the two surfaces live. Copies between two non-default pools are not
    /// available natively and fail.
    pub fn copy_rects(
        &mut self,
        src: WrapperHandle,
        rects: &[Rect],
        dst: WrapperHandle,
        points: &[Point],
    ) -> ShimResult<()> {
        let src = self.checked_surface(src)?;
        let dst = self.checked_surface(dst)?;
        let src_desc = self.device.surface_desc(src).call("CopyRects")?;
        let dst_desc = self.device.surface_desc(dst).call("CopyRects")?;
        if src_desc.format != dst_desc.format {
            return Err(ShimError::InvalidArgument("CopyRects requires matching formats"));
        }
        if !points.is_empty() && points.len() != rects.len() {
            return Err(ShimError::InvalidArgument("CopyRects point count differs from rect count"));
        }

        let copies: Vec<(Option<Rect>, Option<Point>)> = if rects.is_empty() {
            vec![(None, None)]
        } else {
            rects
                .iter()
                .enumerate()
                .map(|(i, rect)| {
                    let point = points.get(i).copied().unwrap_or(Point {
                        x: rect.left,
                        y: rect.top,
                    });
                    (Some(*rect), Some(point))
                })
                .collect()
        };

        match (src_desc.pool, dst_desc.pool) {
            (Pool::SYSTEMMEM, Pool::DEFAULT) => {
                for (rect, point) in copies {
                    self.device.update_surface(src, rect, dst, point).call("CopyRects")?;
                }
                Ok(())
            }
            (Pool::DEFAULT, Pool::DEFAULT) => {
                for (rect, point) in copies {
                    let dst_rect = match (rect, point) {
                        (Some(r), Some(p)) => Some(Rect {
                            left: p.x,
                            top: p.y,
                            right: p.x + r.width(),
                            bottom: p.y + r.height(),
                        }),
                        _ => None,
                    };
                    self.device
                        .stretch_rect(src, rect, dst, dst_rect, TextureFilter::NONE)
                        .call("CopyRects")?;
                }
                Ok(())
            }
            (Pool::DEFAULT, Pool::SYSTEMMEM) => {
                // Only whole-surface readback exists natively.
                self.device.get_render_target_data(src, dst).call("CopyRects")
            }
            _ => Err(ShimError::unsupported("CopyRects between non-default pools")),
        }
    }

    pub fn update_texture(&self, src: WrapperHandle, dst: WrapperHandle) -> ShimResult<()> {
        let (src, _) = self.registry.checked_base_texture(src)?;
        let (dst, _) = self.registry.checked_base_texture(dst)?;
        self.device.update_texture(src, dst).call("UpdateTexture")
    }

    pub fn front_buffer(&self, _dst: WrapperHandle) -> ShimResult<()> {
        Err(ShimError::unsupported("GetFrontBuffer"))
    }

    // Render targets.

    /// A `None` render target keeps the current one; a `None` depth buffer unbinds it.
    pub fn set_render_target(
        &mut self,
        render_target: Option<WrapperHandle>,
        depth_stencil: Option<WrapperHandle>,
    ) -> ShimResult<()> {
        let render_target = render_target.map(|h| self.checked_surface(h)).transpose()?;
        let depth_stencil = depth_stencil.map(|h| self.checked_surface(h)).transpose()?;
        if let Some(rt) = render_target {
            self.device
                .set_render_target(0, Some(rt))
                .map_err(split("SetRenderTarget", 1, 2, "SetRenderTarget"))?;
        }
        self.device
            .set_depth_stencil_surface(depth_stencil)
            .map_err(split("SetRenderTarget", 2, 2, "SetDepthStencilSurface"))
    }

    pub fn render_target(&mut self) -> ShimResult<WrapperHandle> {
        let native = self.device.render_target(0).call("GetRenderTarget")?;
        self.wrap_queried(native)
    }

    pub fn depth_stencil_surface(&mut self) -> ShimResult<WrapperHandle> {
        let native = self.device.depth_stencil_surface().call("GetDepthStencilSurface")?;
        self.wrap_queried(native)
    }

    // Scenes.

    pub fn begin_scene(&self) -> ShimResult<()> {
        self.device.begin_scene().call("BeginScene")
    }

    pub fn end_scene(&self) -> ShimResult<()> {
        self.device.end_scene().call("EndScene")
    }

    pub fn clear(&self, rects: &[Rect], flags: ClearFlags, color: u32, z: f32, stencil: u32) -> ShimResult<()> {
        self.device.clear(rects, flags, color, z, stencil).call("Clear")
    }

    // Fixed-function state.

    pub fn set_transform(&mut self, state: TransformState, matrix: &Matrix) -> ShimResult<()> {
        self.device.set_transform(state, matrix).call("SetTransform")?;
        self.hook.transform_changed(&self.device, state, matrix);
        Ok(())
    }

    pub fn transform(&self, state: TransformState) -> ShimResult<Matrix> {
        self.device.transform(state).call("GetTransform")
    }

    pub fn multiply_transform(&mut self, state: TransformState, matrix: &Matrix) -> ShimResult<()> {
        self.device.multiply_transform(state, matrix).call("MultiplyTransform")?;
        if let Ok(combined) = self.device.transform(state) {
            self.hook.transform_changed(&self.device, state, &combined);
        }
        Ok(())
    }

    pub fn set_viewport(&self, viewport: &Viewport) -> ShimResult<()> {
        self.device.set_viewport(viewport).call("SetViewport")
    }

    pub fn viewport(&self) -> ShimResult<Viewport> {
        self.device.viewport().call("GetViewport")
    }

    pub fn set_material(&self, material: &Material) -> ShimResult<()> {
        self.device.set_material(material).call("SetMaterial")
    }

    pub fn material(&self) -> ShimResult<Material> {
        self.device.material().call("GetMaterial")
    }

    pub fn set_light(&self, index: u32, light: &Light) -> ShimResult<()> {
        self.device.set_light(index, light).call("SetLight")
    }

    pub fn light(&self, index: u32) -> ShimResult<Light> {
        self.device.light(index).call("GetLight")
    }

    pub fn light_enable(&self, index: u32, enable: bool) -> ShimResult<()> {
        self.device.light_enable(index, enable).call("LightEnable")
    }

    pub fn light_enabled(&self, index: u32) -> ShimResult<bool> {
        self.device.light_enabled(index).call("GetLightEnable")
    }

    pub fn set_clip_plane(&self, index: u32, plane: [f32; 4]) -> ShimResult<()> {
        self.device.set_clip_plane(index, plane).call("SetClipPlane")
    }

    pub fn clip_plane(&self, index: u32) -> ShimResult<[f32; 4]> {
        self.device.clip_plane(index).call("GetClipPlane")
    }

    pub fn set_render_state(&self, state: d3d8::RenderStateType, value: u32) -> ShimResult<()> {
        let result = match translate::render_state(state)? {
            RenderStateMapping::Direct(native) => self.device.set_render_state(native, value),
            RenderStateMapping::DepthBias => self
                .device
                .set_render_state(RenderStateType::DEPTHBIAS, translate::zbias_to_depth_bias(value)),
            RenderStateMapping::SoftwareVertexProcessing => self.device.set_software_vertex_processing(value != 0),
        };
        result.call("SetRenderState")
    }

    pub fn render_state(&self, state: d3d8::RenderStateType) -> ShimResult<u32> {
        let result = match translate::render_state(state)? {
            RenderStateMapping::Direct(native) => self.device.render_state(native),
            RenderStateMapping::DepthBias => self
                .device
                .render_state(RenderStateType::DEPTHBIAS)
                .map(translate::depth_bias_to_zbias),
            RenderStateMapping::SoftwareVertexProcessing => Ok(u32::from(self.device.software_vertex_processing())),
        };
        result.call("GetRenderState")
    }

    pub fn begin_state_block(&self) -> ShimResult<()> {
        Err(ShimError::unsupported("BeginStateBlock"))
    }

    pub fn end_state_block(&self) -> ShimResult<u32> {
        Err(ShimError::unsupported("EndStateBlock"))
    }

    pub fn apply_state_block(&self, _token: u32) -> ShimResult<()> {
        Err(ShimError::unsupported("ApplyStateBlock"))
    }

    pub fn capture_state_block(&self, _token: u32) -> ShimResult<()> {
        Err(ShimError::unsupported("CaptureStateBlock"))
    }

    pub fn delete_state_block(&self, _token: u32) -> ShimResult<()> {
        Err(ShimError::unsupported("DeleteStateBlock"))
    }

    pub fn create_state_block(&self, _ty: u32) -> ShimResult<u32> {
        Err(ShimError::unsupported("CreateStateBlock"))
    }

    pub fn set_clip_status(&self, status: &ClipStatus) -> ShimResult<()> {
        self.device.set_clip_status(status).call("SetClipStatus")
    }

    pub fn clip_status(&self) -> ShimResult<ClipStatus> {
        self.device.clip_status().call("GetClipStatus")
    }

    // Textures and stage states.

    pub fn texture(&mut self, stage: u32) -> ShimResult<Option<WrapperHandle>> {
        match self.device.texture(stage).call("GetTexture")? {
            Some(native) => self.wrap_queried(native).map(Some),
            None => Ok(None),
        }
    }

    pub fn set_texture(&self, stage: u32, texture: Option<WrapperHandle>) -> ShimResult<()> {
        let native = match texture {
            Some(h) => Some(self.registry.checked_base_texture(h)?.0),
            None => None,
        };
        self.device.set_texture(stage, native).call("SetTexture")
    }

    pub fn texture_stage_state(&self, stage: u32, ty: d3d8::TextureStageStateType) -> ShimResult<u32> {
        let result = match translate::texture_stage_state(ty)? {
            StageStateMapping::Stage(native) => self.device.texture_stage_state(stage, native),
            StageStateMapping::Sampler(native) => self.device.sampler_state(stage, native),
        };
        result.call("GetTextureStageState")
    }

    pub fn set_texture_stage_state(&self, stage: u32, ty: d3d8::TextureStageStateType, value: u32) -> ShimResult<()> {
        let result = match translate::texture_stage_state(ty)? {
            StageStateMapping::Stage(native) => self.device.set_texture_stage_state(stage, native, value),
            StageStateMapping::Sampler(native) => {
                let value = translate::sampler_value_to_d3d9(native, value)?;
                self.device.set_sampler_state(stage, native, value)
            }
        };
        result.call("SetTextureStageState")
    }

    pub fn validate_device(&self) -> ShimResult<u32> {
        self.device.validate_device().call("ValidateDevice")
    }

    pub fn set_palette_entries(&self, palette: u32, entries: &[PaletteEntry; 256]) -> ShimResult<()> {
        self.device.set_palette_entries(palette, entries).call("SetPaletteEntries")
    }

    pub fn palette_entries(&self, palette: u32) -> ShimResult<[PaletteEntry; 256]> {
        self.device.palette_entries(palette).call("GetPaletteEntries")
    }

    pub fn set_current_texture_palette(&self, palette: u32) -> ShimResult<()> {
        self.device
            .set_current_texture_palette(palette)
            .call("SetCurrentTexturePalette")
    }

    pub fn current_texture_palette(&self) -> ShimResult<u32> {
        self.device.current_texture_palette().call("GetCurrentTexturePalette")
    }

    // Drawing.

    pub fn draw_primitive(&self, ty: PrimitiveType, start_vertex: u32, primitive_count: u32) -> ShimResult<()> {
        self.device
            .draw_primitive(ty, start_vertex, primitive_count)
            .call("DrawPrimitive")
    }

    /// The base vertex index comes from the last [`set_indices`](Self::set_indices).
    pub fn draw_indexed_primitive(
        &self,
        ty: PrimitiveType,
        min_index: u32,
        num_vertices: u32,
        start_index: u32,
        primitive_count: u32,
    ) -> ShimResult<()> {
        let base_vertex_index = i32::try_from(self.base_vertex_index).map_err(|_| ShimError::Untranslatable {
            what: "base vertex index",
            value: self.base_vertex_index,
        })?;
        self.device
            .draw_indexed_primitive(
                ty,
                base_vertex_index,
                min_index,
                num_vertices,
                start_index,
                primitive_count,
            )
            .call("DrawIndexedPrimitive")
    }

    pub fn draw_primitive_up(&self, ty: PrimitiveType, primitive_count: u32, vertices: &[u8], stride: u32) -> ShimResult<()> {
        self.device
            .draw_primitive_up(ty, primitive_count, vertices, stride)
            .call("DrawPrimitiveUP")
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_indexed_primitive_up(
        &self,
        ty: PrimitiveType,
        min_vertex_index: u32,
        num_vertices: u32,
        primitive_count: u32,
        indices: &[u8],
        index_format: Format,
        vertices: &[u8],
        stride: u32,
    ) -> ShimResult<()> {
        self.device
            .draw_indexed_primitive_up(
                ty,
                min_vertex_index,
                num_vertices,
                primitive_count,
                indices,
                index_format,
                vertices,
                stride,
            )
            .call("DrawIndexedPrimitiveUP")
    }

    pub fn process_vertices(
        &self,
        src_start_index: u32,
        dest_index: u32,
        vertex_count: u32,
        dest_buffer: WrapperHandle,
        flags: u32,
    ) -> ShimResult<()> {
        let dest = self.registry.checked(dest_buffer, ResourceKind::VertexBuffer)?;
        let declaration = self
            .shaders
            .vertex(self.current_vertex_shader)
            .map(|record| record.declaration);
        self.device
            .process_vertices(src_start_index, dest_index, vertex_count, dest, declaration, flags)
            .call("ProcessVertices")
    }

    // Vertex shaders.

    /// Creates a legacy vertex shader: the declaration becomes a native vertex declaration, and
    /// the function (if any) is patched with input declarations. Without a function the handle
    /// denotes fixed-function processing with a custom declaration.
    pub fn create_vertex_shader(&mut self, declaration: &[u32], function: Option<&[u32]>, _usage: u32) -> ShimResult<u32> {
        let decl = translate::translate_declaration(declaration)?;
        let native_decl = self
            .device
            .create_vertex_declaration(&decl.elements)
            .call("CreateVertexShader")?;

        let shader = match function {
            Some(function) => {
                let created = translate::patch_vertex_shader_function(function, &decl).and_then(|patched| {
                    self.device
                        .create_vertex_shader(&patched)
                        .map_err(split("CreateVertexShader", 2, 2, "CreateVertexShader"))
                });
                match created {
                    Ok(native) => Some(native),
                    Err(err) => {
                        self.device.release_object(native_decl);
                        return Err(err);
                    }
                }
            }
            None => None,
        };

        let end = declaration
            .iter()
            .position(|t| *t == d3d8::vsd::END)
            .map_or(declaration.len(), |i| i + 1);
        let handle = self.shaders.insert_vertex(VertexShaderRecord {
            shader,
            declaration: native_decl,
            declaration_tokens: declaration[..end].to_vec(),
            function: function.map(<[u32]>::to_vec),
            constants: decl.constants,
        });
        debug!(handle, programmable = shader.is_some(), "created vertex shader");
        Ok(handle)
    }

    /// Binds a shader handle, or, for any value not in the shader table, an FVF code.
    pub fn set_vertex_shader(&mut self, handle: u32) -> ShimResult<()> {
        match self.shaders.vertex(handle) {
            Some(record) => {
                self.device
                    .set_vertex_shader(record.shader)
                    .map_err(split("SetVertexShader", 1, 2, "SetVertexShader"))?;
                self.device
                    .set_vertex_declaration(Some(record.declaration))
                    .map_err(split("SetVertexShader", 2, 2, "SetVertexDeclaration"))?;
                for constant in &record.constants {
                    self.device
                        .set_vertex_shader_constant_f(constant.start_register, &constant.values)
                        .call("SetVertexShader")?;
                }
            }
            None => {
                self.device
                    .set_vertex_shader(None)
                    .map_err(split("SetVertexShader", 1, 2, "SetVertexShader"))?;
                self.device
                    .set_fvf(handle)
                    .map_err(split("SetVertexShader", 2, 2, "SetFVF"))?;
            }
        }
        self.current_vertex_shader = handle;
        Ok(())
    }

    pub fn vertex_shader(&self) -> u32 {
        self.current_vertex_shader
    }

    pub fn delete_vertex_shader(&mut self, handle: u32) -> ShimResult<()> {
        let record = self
            .shaders
            .remove_vertex(handle)
            .ok_or(ShimError::UnknownShader(handle))?;
        self.release_vertex_record(&record);
        if self.current_vertex_shader == handle {
            self.current_vertex_shader = 0;
        }
        Ok(())
    }

    fn release_vertex_record(&self, record: &VertexShaderRecord) {
        if let Some(shader) = record.shader {
            self.device.release_object(shader);
        }
        self.device.release_object(record.declaration);
    }

    pub fn set_vertex_shader_constant(&self, register: u32, data: &[f32]) -> ShimResult<()> {
        if data.len() % 4 != 0 {
            return Err(ShimError::InvalidArgument("constant data must be whole float4 registers"));
        }
        self.device
            .set_vertex_shader_constant_f(register, data)
            .call("SetVertexShaderConstant")
    }

    pub fn vertex_shader_constant(&self, register: u32, count: u32) -> ShimResult<Vec<f32>> {
        self.device
            .vertex_shader_constant_f(register, count)
            .call("GetVertexShaderConstant")
    }

    pub fn vertex_shader_declaration(&self, handle: u32) -> ShimResult<Vec<u32>> {
        let record = self.shaders.vertex(handle).ok_or(ShimError::UnknownShader(handle))?;
        Ok(record.declaration_tokens.clone())
    }

    pub fn vertex_shader_function(&self, handle: u32) -> ShimResult<Vec<u32>> {
        let record = self.shaders.vertex(handle).ok_or(ShimError::UnknownShader(handle))?;
        record
            .function
            .clone()
            .ok_or(ShimError::InvalidArgument("vertex shader has no function"))
    }

    // Streams.

    pub fn set_stream_source(&self, stream: u32, buffer: Option<WrapperHandle>, stride: u32) -> ShimResult<()> {
        let native = buffer
            .map(|h| self.registry.checked(h, ResourceKind::VertexBuffer))
            .transpose()?;
        self.device
            .set_stream_source(stream, native, 0, stride)
            .call("SetStreamSource")
    }

    pub fn stream_source(&mut self, stream: u32) -> ShimResult<(Option<WrapperHandle>, u32)> {
        let source = self.device.stream_source(stream).call("GetStreamSource")?;
        let handle = match source.buffer {
            Some(native) => Some(self.wrap_queried(native)?),
            None => None,
        };
        Ok((handle, source.stride))
    }

    /// Legacy index binding also carries the base vertex index used by indexed draws.
    pub fn set_indices(&mut self, buffer: Option<WrapperHandle>, base_vertex_index: u32) -> ShimResult<()> {
        let native = buffer
            .map(|h| self.registry.checked(h, ResourceKind::IndexBuffer))
            .transpose()?;
        self.device.set_indices(native).call("SetIndices")?;
        self.base_vertex_index = base_vertex_index;
        Ok(())
    }

    pub fn indices(&mut self) -> ShimResult<(Option<WrapperHandle>, u32)> {
        let handle = match self.device.indices().call("GetIndices")? {
            Some(native) => Some(self.wrap_queried(native)?),
            None => None,
        };
        Ok((handle, self.base_vertex_index))
    }

    // Pixel shaders.

    pub fn create_pixel_shader(&mut self, function: &[u32]) -> ShimResult<u32> {
        let shader = self.device.create_pixel_shader(function).call("CreatePixelShader")?;
        let handle = self.shaders.insert_pixel(PixelShaderRecord {
            shader,
            function: function.to_vec(),
        });
        debug!(handle, "created pixel shader");
        Ok(handle)
    }

    /// Unknown handles (including 0) fall back to fixed-function pixel processing.
    pub fn set_pixel_shader(&mut self, handle: u32) -> ShimResult<()> {
        let native = self.shaders.pixel(handle).map(|record| record.shader);
        if native.is_none() && handle != 0 {
            warn!(handle, "unknown pixel shader handle; using fixed-function pipeline");
        }
        self.device.set_pixel_shader(native).call("SetPixelShader")?;
        self.current_pixel_shader = if native.is_some() { handle } else { 0 };
        Ok(())
    }

    pub fn pixel_shader(&self) -> u32 {
        self.current_pixel_shader
    }

    pub fn delete_pixel_shader(&mut self, handle: u32) -> ShimResult<()> {
        let record = self
            .shaders
            .remove_pixel(handle)
            .ok_or(ShimError::UnknownShader(handle))?;
        self.device.release_object(record.shader);
        if self.current_pixel_shader == handle {
            self.current_pixel_shader = 0;
        }
        Ok(())
    }

    pub fn set_pixel_shader_constant(&self, register: u32, data: &[f32]) -> ShimResult<()> {
        if data.len() % 4 != 0 {
            return Err(ShimError::InvalidArgument("constant data must be whole float4 registers"));
        }
        self.device
            .set_pixel_shader_constant_f(register, data)
            .call("SetPixelShaderConstant")
    }

    pub fn pixel_shader_constant(&self, register: u32, count: u32) -> ShimResult<Vec<f32>> {
        self.device
            .pixel_shader_constant_f(register, count)
            .call("GetPixelShaderConstant")
    }

    pub fn pixel_shader_function(&self, handle: u32) -> ShimResult<Vec<u32>> {
        let record = self.shaders.pixel(handle).ok_or(ShimError::UnknownShader(handle))?;
        Ok(record.function.clone())
    }

    // Patches.

    pub fn draw_rect_patch(&self, handle: u32, segments: &[f32; 4], info: Option<&RectPatchInfo>) -> ShimResult<()> {
        self.device.draw_rect_patch(handle, segments, info).call("DrawRectPatch")
    }

    pub fn draw_tri_patch(&self, handle: u32, segments: &[f32; 3], info: Option<&TriPatchInfo>) -> ShimResult<()> {
        self.device.draw_tri_patch(handle, segments, info).call("DrawTriPatch")
    }

    pub fn delete_patch(&self, handle: u32) -> ShimResult<()> {
        self.device.delete_patch(handle).call("DeletePatch")
    }
}

impl<D: Device, H: FrameHook<D>> RefCounted for Device8<D, H> {
    fn add_ref(&mut self) -> u32 {
        self.device.add_ref()
    }

    /// Forwards to the native device. When only the shim's own references remain the hook is
    /// told and those references are dropped as well.
    fn release(&mut self) -> u32 {
        let mut refs = self.device.release();
        if refs != 0 && refs == self.internal_refs {
            debug!(internal_refs = self.internal_refs, "application released the device");
            self.hook.device_released(&self.device);
            while self.internal_refs > 0 {
                refs = self.device.release();
                self.internal_refs -= 1;
            }
        }
        refs
    }
}

impl<D: Device, H: FrameHook<D>> Drop for Device8<D, H> {
    fn drop(&mut self) {
        let (vertex, pixel) = self.shaders.drain();
        if !self.registry.is_empty() || !vertex.is_empty() || !pixel.is_empty() {
            warn!(
                wrappers = self.registry.len(),
                vertex_shaders = vertex.len(),
                pixel_shaders = pixel.len(),
                "device destroyed with live objects"
            );
        }
        for record in &vertex {
            self.release_vertex_record(record);
        }
        for record in &pixel {
            self.device.release_object(record.shader);
        }
    }
}
