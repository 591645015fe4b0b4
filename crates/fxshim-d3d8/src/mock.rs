//! In-memory native runtime.
//!
//! Objects are bookkeeping records: nothing is rasterised, but reference counts, bindings, pool
//! rules and draw submissions behave like the native runtime closely enough to test the layers
//! above it. Every call is logged by name, and any call can be made to fail through
//! [`MockState::failures`].

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use hashbrown::HashMap;

use crate::d3d9::*;
use crate::hresult::{HResult, NativeResult};

const FACTORY_IDENTITY: NativePtr = match NativePtr::new(0xD3D9_0000) {
    Some(ptr) => ptr,
    None => panic!("factory identity must be non-zero"),
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectClass {
    Resource(ResourceType),
    SwapChain,
    VertexDeclaration,
    VertexShader,
    PixelShader,
}

#[derive(Clone, Debug)]
pub struct MockObject {
    pub class: ObjectClass,
    pub refs: u32,
    pub usage: Usage,
    pub format: Format,
    pub pool: Pool,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub levels: u32,
    pub size: u32,
    pub fvf: u32,
    /// Sub-objects (levels, faces) live exactly as long as their parent.
    pub parent: Option<NativePtr>,
    children: HashMap<(u32, u32), NativePtr>,
    pub function: Vec<u32>,
    pub elements: Vec<VertexElement>,
    pub locked: bool,
    pub priority: u32,
    pub lod: u32,
    /// Owned by the device itself (back buffer, implicit swap chain, auto depth buffer).
    pub implicit: bool,
}

impl MockObject {
    fn new(class: ObjectClass) -> Self {
        Self {
            class,
            refs: 1,
            usage: Usage::empty(),
            format: Format::UNKNOWN,
            pool: Pool::DEFAULT,
            width: 0,
            height: 0,
            depth: 1,
            levels: 1,
            size: 0,
            fvf: 0,
            parent: None,
            children: HashMap::new(),
            function: Vec::new(),
            elements: Vec::new(),
            locked: false,
            priority: 0,
            lod: 0,
            implicit: false,
        }
    }

    fn surface(usage: Usage, format: Format, pool: Pool, width: u32, height: u32) -> Self {
        Self {
            usage,
            format,
            pool,
            width,
            height,
            ..Self::new(ObjectClass::Resource(ResourceType::SURFACE))
        }
    }

    pub fn resource_type(&self) -> Option<ResourceType> {
        match self.class {
            ObjectClass::Resource(ty) => Some(ty),
            _ => None,
        }
    }

    fn surface_desc(&self) -> SurfaceDesc {
        SurfaceDesc {
            format: self.format,
            resource_type: ResourceType::SURFACE,
            usage: self.usage,
            pool: self.pool,
            multi_sample_type: MultiSampleType::NONE,
            multi_sample_quality: 0,
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    Primitive {
        ty: PrimitiveType,
        start_vertex: u32,
        primitive_count: u32,
    },
    Indexed {
        ty: PrimitiveType,
        base_vertex_index: i32,
        min_index: u32,
        num_vertices: u32,
        start_index: u32,
        primitive_count: u32,
    },
    PrimitiveUp {
        ty: PrimitiveType,
        primitive_count: u32,
        vertices: Vec<u8>,
        stride: u32,
    },
    IndexedUp {
        ty: PrimitiveType,
        num_vertices: u32,
        primitive_count: u32,
    },
}

/// A draw together with the pipeline bindings it saw.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawRecord {
    pub call: DrawCall,
    pub render_targets: [Option<NativePtr>; 4],
    /// Sorted by stage.
    pub textures: Vec<(u32, NativePtr)>,
    pub vertex_shader: Option<NativePtr>,
    pub pixel_shader: Option<NativePtr>,
    pub declaration: Option<NativePtr>,
    pub fvf: u32,
}

#[derive(Debug)]
pub struct MockState {
    next_addr: usize,
    pub objects: HashMap<NativePtr, MockObject>,
    pub factory_refs: u32,
    pub device_refs: u32,
    pub calls: Vec<&'static str>,
    /// Calls that fail with the given code, by name.
    pub failures: HashMap<&'static str, HResult>,
    /// Refuse render-target textures, like drivers that cannot render to a format.
    pub reject_render_target_textures: bool,
    pub caps: Caps,
    pub display_mode: DisplayMode,
    pub params: PresentParameters,
    pub swap_chain: Option<NativePtr>,
    pub back_buffer: Option<NativePtr>,
    pub auto_depth_stencil: Option<NativePtr>,
    pub render_targets: [Option<NativePtr>; 4],
    pub depth_stencil: Option<NativePtr>,
    pub textures: HashMap<u32, NativePtr>,
    pub render_states: HashMap<u32, u32>,
    pub texture_stage_states: HashMap<(u32, u32), u32>,
    pub sampler_states: HashMap<(u32, u32), u32>,
    pub transforms: HashMap<u32, Matrix>,
    pub viewport: Viewport,
    pub material: Material,
    pub lights: HashMap<u32, Light>,
    pub lights_enabled: HashMap<u32, bool>,
    pub clip_planes: HashMap<u32, [f32; 4]>,
    pub clip_status: ClipStatus,
    pub vertex_shader: Option<NativePtr>,
    pub pixel_shader: Option<NativePtr>,
    pub declaration: Option<NativePtr>,
    pub fvf: u32,
    pub vs_constants: HashMap<u32, [f32; 4]>,
    pub ps_constants: HashMap<u32, [f32; 4]>,
    pub streams: HashMap<u32, StreamSource>,
    pub indices: Option<NativePtr>,
    pub software_vertex_processing: bool,
    pub palettes: HashMap<u32, [PaletteEntry; 256]>,
    pub current_palette: u32,
    pub gamma: GammaRamp,
    pub in_scene: bool,
    pub draws: Vec<DrawRecord>,
    pub presents: u32,
    pub resets: u32,
    pub uploads: Vec<(NativePtr, usize)>,
    pub copies: Vec<(&'static str, NativePtr, NativePtr)>,
}

impl Default for MockState {
    fn default() -> Self {
        let caps = Caps {
            device_type: DeviceType::HAL,
            max_texture_width: 4096,
            max_texture_height: 4096,
            max_volume_extent: 256,
            max_texture_blend_stages: 8,
            max_simultaneous_textures: 8,
            max_active_lights: 8,
            max_user_clip_planes: 6,
            max_primitive_count: 0xF_FFFF,
            max_vertex_index: 0xFF_FFFF,
            max_streams: 16,
            max_stream_stride: 255,
            vertex_shader_version: vs_version(3, 0),
            max_vertex_shader_const: 256,
            pixel_shader_version: ps_version(3, 0),
            pixel_shader_1x_max_value: 8.0,
            num_simultaneous_rts: 4,
            ..Caps::default()
        };
        Self {
            next_addr: 0x1000,
            objects: HashMap::new(),
            factory_refs: 1,
            device_refs: 0,
            calls: Vec::new(),
            failures: HashMap::new(),
            reject_render_target_textures: false,
            caps,
            display_mode: DisplayMode {
                width: 1024,
                height: 768,
                refresh_rate: 60,
                format: Format::X8R8G8B8,
            },
            params: PresentParameters::default(),
            swap_chain: None,
            back_buffer: None,
            auto_depth_stencil: None,
            render_targets: [None; 4],
            depth_stencil: None,
            textures: HashMap::new(),
            render_states: HashMap::new(),
            texture_stage_states: HashMap::new(),
            sampler_states: HashMap::new(),
            transforms: HashMap::new(),
            viewport: Viewport::default(),
            material: Material::default(),
            lights: HashMap::new(),
            lights_enabled: HashMap::new(),
            clip_planes: HashMap::new(),
            clip_status: ClipStatus::default(),
            vertex_shader: None,
            pixel_shader: None,
            declaration: None,
            fvf: 0,
            vs_constants: HashMap::new(),
            ps_constants: HashMap::new(),
            streams: HashMap::new(),
            indices: None,
            software_vertex_processing: false,
            palettes: HashMap::new(),
            current_palette: 0,
            gamma: GammaRamp::default(),
            in_scene: false,
            draws: Vec::new(),
            presents: 0,
            resets: 0,
            uploads: Vec::new(),
            copies: Vec::new(),
        }
    }
}

impl MockState {
    /// Logs `call` and applies any injected failure.
    fn enter(&mut self, call: &'static str) -> NativeResult<()> {
        self.calls.push(call);
        match self.failures.get(call) {
            Some(hr) => Err(*hr),
            None => Ok(()),
        }
    }

    fn alloc(&mut self, object: MockObject) -> NativeResult<NativePtr> {
        let ptr = NativePtr::new(self.next_addr).ok_or(HResult::E_OUTOFMEMORY)?;
        self.next_addr += 0x10;
        self.objects.insert(ptr, object);
        Ok(ptr)
    }

    pub fn object(&self, ptr: NativePtr) -> NativeResult<&MockObject> {
        self.objects.get(&ptr).ok_or(HResult::INVALIDCALL)
    }

    fn object_mut(&mut self, ptr: NativePtr) -> NativeResult<&mut MockObject> {
        self.objects.get_mut(&ptr).ok_or(HResult::INVALIDCALL)
    }

    /// Current reference count of a live object, 0 once destroyed.
    pub fn refs(&self, ptr: NativePtr) -> u32 {
        self.objects.get(&ptr).map_or(0, |o| o.refs)
    }

    pub fn is_alive(&self, ptr: NativePtr) -> bool {
        self.objects.contains_key(&ptr)
    }

    /// Top-level objects created on behalf of the application that are still alive.
    pub fn live_objects(&self) -> usize {
        self.objects
            .values()
            .filter(|o| o.parent.is_none() && !o.implicit)
            .count()
    }

    pub fn count_calls(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }

    fn add_ref(&mut self, ptr: NativePtr) -> u32 {
        match self.objects.get_mut(&ptr) {
            Some(object) => {
                object.refs += 1;
                object.refs
            }
            None => 0,
        }
    }

    fn release(&mut self, ptr: NativePtr) -> u32 {
        let Some(object) = self.objects.get_mut(&ptr) else {
            return 0;
        };
        object.refs = object.refs.saturating_sub(1);
        let refs = object.refs;
        if refs == 0 && object.parent.is_none() && !object.implicit {
            self.destroy(ptr);
        }
        refs
    }

    fn destroy(&mut self, ptr: NativePtr) {
        if let Some(object) = self.objects.remove(&ptr) {
            for child in object.children.into_values() {
                self.destroy(child);
            }
        }
        for slot in self.render_targets.iter_mut() {
            if *slot == Some(ptr) {
                *slot = None;
            }
        }
        if self.depth_stencil == Some(ptr) {
            self.depth_stencil = None;
        }
        self.textures.retain(|_, t| *t != ptr);
    }

    /// Returns the (face, level) sub-object of `parent` with an added reference.
    fn child(&mut self, parent: NativePtr, face: u32, level: u32) -> NativeResult<NativePtr> {
        let object = self.object(parent)?;
        if level >= object.levels {
            return Err(HResult::INVALIDCALL);
        }
        if let Some(&child) = object.children.get(&(face, level)) {
            self.add_ref(child);
            return Ok(child);
        }
        let class = match object.class {
            ObjectClass::Resource(ResourceType::VOLUMETEXTURE) => ResourceType::VOLUME,
            ObjectClass::Resource(_) | ObjectClass::SwapChain => ResourceType::SURFACE,
            _ => return Err(HResult::INVALIDCALL),
        };
        let child = MockObject {
            usage: object.usage,
            format: object.format,
            pool: object.pool,
            width: (object.width >> level).max(1),
            height: (object.height >> level).max(1),
            depth: (object.depth >> level).max(1),
            parent: Some(parent),
            ..MockObject::new(ObjectClass::Resource(class))
        };
        let ptr = self.alloc(child)?;
        self.object_mut(parent)?.children.insert((face, level), ptr);
        Ok(ptr)
    }

    fn create_implicit_objects(&mut self, params: &PresentParameters) -> NativeResult<()> {
        let mut swap_chain = MockObject::new(ObjectClass::SwapChain);
        swap_chain.implicit = true;
        let swap_chain = self.alloc(swap_chain)?;

        let mut back_buffer = MockObject::surface(
            Usage::RENDERTARGET,
            params.back_buffer_format,
            Pool::DEFAULT,
            params.back_buffer_width,
            params.back_buffer_height,
        );
        back_buffer.refs = 0;
        back_buffer.implicit = true;
        let back_buffer = self.alloc(back_buffer)?;

        self.auto_depth_stencil = if params.enable_auto_depth_stencil {
            let mut depth = MockObject::surface(
                Usage::DEPTHSTENCIL,
                params.auto_depth_stencil_format,
                Pool::DEFAULT,
                params.back_buffer_width,
                params.back_buffer_height,
            );
            depth.refs = 0;
            depth.implicit = true;
            Some(self.alloc(depth)?)
        } else {
            None
        };

        self.swap_chain = Some(swap_chain);
        self.back_buffer = Some(back_buffer);
        self.render_targets = [Some(back_buffer), None, None, None];
        self.depth_stencil = self.auto_depth_stencil;
        Ok(())
    }

    fn complete_params(&self, params: &mut PresentParameters) {
        if params.back_buffer_width == 0 {
            params.back_buffer_width = 640;
        }
        if params.back_buffer_height == 0 {
            params.back_buffer_height = 480;
        }
        if params.back_buffer_format == Format::UNKNOWN {
            params.back_buffer_format = self.display_mode.format;
        }
        if params.back_buffer_count == 0 {
            params.back_buffer_count = 1;
        }
    }

    fn record_draw(&mut self, call: DrawCall) -> NativeResult<()> {
        if !self.in_scene {
            return Err(HResult::INVALIDCALL);
        }
        let mut textures: Vec<(u32, NativePtr)> = self.textures.iter().map(|(s, t)| (*s, *t)).collect();
        textures.sort();
        self.draws.push(DrawRecord {
            call,
            render_targets: self.render_targets,
            textures,
            vertex_shader: self.vertex_shader,
            pixel_shader: self.pixel_shader,
            declaration: self.declaration,
            fvf: self.fvf,
        });
        Ok(())
    }

    fn lock_rect(&mut self, ptr: NativePtr, call: &'static str) -> NativeResult<LockedRect> {
        self.enter(call)?;
        let object = self.object_mut(ptr)?;
        if object.locked {
            return Err(HResult::INVALIDCALL);
        }
        object.locked = true;
        Ok(LockedRect {
            pitch: (object.width * 4) as i32,
            bits: ptr.addr() << 8,
        })
    }

    fn unlock(&mut self, ptr: NativePtr, call: &'static str) -> NativeResult<()> {
        self.enter(call)?;
        let object = self.object_mut(ptr)?;
        if !object.locked {
            return Err(HResult::INVALIDCALL);
        }
        object.locked = false;
        Ok(())
    }

    fn set_constants(
        constants: &mut HashMap<u32, [f32; 4]>,
        start_register: u32,
        data: &[f32],
    ) -> NativeResult<()> {
        if data.len() % 4 != 0 {
            return Err(HResult::INVALIDCALL);
        }
        for (i, chunk) in data.chunks_exact(4).enumerate() {
            constants.insert(start_register + i as u32, [chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Ok(())
    }

    fn constants(constants: &HashMap<u32, [f32; 4]>, start_register: u32, count: u32) -> Vec<f32> {
        (start_register..start_register + count)
            .flat_map(|r| constants.get(&r).copied().unwrap_or_default())
            .collect()
    }

    fn reset_device_state(&mut self) {
        self.textures.clear();
        self.render_states.clear();
        self.texture_stage_states.clear();
        self.sampler_states.clear();
        self.transforms.clear();
        self.vertex_shader = None;
        self.pixel_shader = None;
        self.declaration = None;
        self.fvf = 0;
        self.vs_constants.clear();
        self.ps_constants.clear();
        self.streams.clear();
        self.indices = None;
        self.in_scene = false;
    }
}

fn full_mip_chain(width: u32, height: u32, depth: u32) -> u32 {
    32 - width.max(height).max(depth).max(1).leading_zeros()
}

/// Native factory over a shared [`MockState`].
#[derive(Clone, Debug, Default)]
pub struct MockDirect3D9 {
    state: Rc<RefCell<MockState>>,
}

impl MockDirect3D9 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Ref<'_, MockState> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, MockState> {
        self.state.borrow_mut()
    }
}

/// Native device over the factory's [`MockState`].
#[derive(Clone, Debug)]
pub struct MockDevice9 {
    state: Rc<RefCell<MockState>>,
}

impl MockDevice9 {
    pub fn state(&self) -> Ref<'_, MockState> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, MockState> {
        self.state.borrow_mut()
    }
}

impl Direct3D for MockDirect3D9 {
    type Device = MockDevice9;

    fn add_ref(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        state.factory_refs += 1;
        state.factory_refs
    }

    fn release(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        state.factory_refs = state.factory_refs.saturating_sub(1);
        state.factory_refs
    }

    fn identity(&self) -> NativePtr {
        FACTORY_IDENTITY
    }

    fn adapter_count(&self) -> u32 {
        1
    }

    fn adapter_identifier(&self, adapter: u32, _flags: u32) -> NativeResult<AdapterIdentifier> {
        if adapter != 0 {
            return Err(HResult::INVALIDCALL);
        }
        Ok(AdapterIdentifier {
            driver: "mock.dll".to_owned(),
            description: "Mock Display Adapter".to_owned(),
            device_name: "\\\\.\\DISPLAY1".to_owned(),
            vendor_id: 0x1234,
            device_id: 0x5678,
            ..AdapterIdentifier::default()
        })
    }

    fn adapter_mode_count(&self, adapter: u32, format: Format) -> u32 {
        if adapter == 0 && (format == Format::X8R8G8B8 || format == Format::R5G6B5) {
            2
        } else {
            0
        }
    }

    fn enum_adapter_modes(&self, adapter: u32, format: Format, mode: u32) -> NativeResult<DisplayMode> {
        if mode >= self.adapter_mode_count(adapter, format) {
            return Err(HResult::INVALIDCALL);
        }
        let (width, height) = if mode == 0 { (800, 600) } else { (1024, 768) };
        Ok(DisplayMode {
            width,
            height,
            refresh_rate: 60,
            format,
        })
    }

    fn adapter_display_mode(&self, adapter: u32) -> NativeResult<DisplayMode> {
        if adapter != 0 {
            return Err(HResult::INVALIDCALL);
        }
        Ok(self.state.borrow().display_mode)
    }

    fn check_device_type(
        &self,
        adapter: u32,
        _device_type: DeviceType,
        _display_format: Format,
        _back_buffer_format: Format,
        _windowed: bool,
    ) -> NativeResult<()> {
        self.state.borrow_mut().enter("CheckDeviceType")?;
        if adapter != 0 {
            return Err(HResult::INVALIDCALL);
        }
        Ok(())
    }

    fn check_device_format(
        &self,
        adapter: u32,
        _device_type: DeviceType,
        _adapter_format: Format,
        usage: Usage,
        _resource_type: ResourceType,
        _check_format: Format,
    ) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("CheckDeviceFormat")?;
        if adapter != 0 {
            return Err(HResult::INVALIDCALL);
        }
        if state.reject_render_target_textures && usage.contains(Usage::RENDERTARGET) {
            return Err(HResult::NOTAVAILABLE);
        }
        Ok(())
    }

    fn check_device_multi_sample_type(
        &self,
        _adapter: u32,
        _device_type: DeviceType,
        _surface_format: Format,
        _windowed: bool,
        multi_sample: MultiSampleType,
    ) -> NativeResult<u32> {
        self.state.borrow_mut().enter("CheckDeviceMultiSampleType")?;
        if multi_sample == MultiSampleType::NONE {
            Ok(1)
        } else {
            Err(HResult::NOTAVAILABLE)
        }
    }

    fn check_depth_stencil_match(
        &self,
        _adapter: u32,
        _device_type: DeviceType,
        _adapter_format: Format,
        _render_target_format: Format,
        _depth_stencil_format: Format,
    ) -> NativeResult<()> {
        self.state.borrow_mut().enter("CheckDepthStencilMatch")
    }

    fn device_caps(&self, adapter: u32, _device_type: DeviceType) -> NativeResult<Caps> {
        if adapter != 0 {
            return Err(HResult::INVALIDCALL);
        }
        Ok(self.state.borrow().caps)
    }

    fn adapter_monitor(&self, _adapter: u32) -> usize {
        0x4D4F_4E00
    }

    fn create_device(
        &self,
        adapter: u32,
        _device_type: DeviceType,
        _focus_window: WindowHandle,
        _behavior_flags: u32,
        params: &mut PresentParameters,
    ) -> NativeResult<MockDevice9> {
        let mut state = self.state.borrow_mut();
        state.enter("CreateDevice")?;
        if adapter != 0 || state.device_refs != 0 {
            return Err(HResult::INVALIDCALL);
        }
        state.complete_params(params);
        state.create_implicit_objects(params)?;
        state.params = *params;
        state.viewport = Viewport {
            x: 0,
            y: 0,
            width: params.back_buffer_width,
            height: params.back_buffer_height,
            min_z: 0.0,
            max_z: 1.0,
        };
        state.device_refs = 1;
        Ok(MockDevice9 {
            state: Rc::clone(&self.state),
        })
    }
}

impl ObjectRefs for MockDevice9 {
    fn add_ref_object(&self, object: NativePtr) -> u32 {
        self.state.borrow_mut().add_ref(object)
    }

    fn release_object(&self, object: NativePtr) -> u32 {
        self.state.borrow_mut().release(object)
    }
}

impl ResourceApi for MockDevice9 {
    fn resource_type(&self, object: NativePtr) -> NativeResult<ResourceType> {
        let state = self.state.borrow();
        state.object(object)?.resource_type().ok_or(HResult::INVALIDCALL)
    }

    fn set_priority(&self, resource: NativePtr, priority: u32) -> u32 {
        let mut state = self.state.borrow_mut();
        match state.object_mut(resource) {
            Ok(object) => std::mem::replace(&mut object.priority, priority),
            Err(_) => 0,
        }
    }

    fn priority(&self, resource: NativePtr) -> u32 {
        self.state.borrow().object(resource).map_or(0, |o| o.priority)
    }

    fn preload(&self, _resource: NativePtr) {
        self.state.borrow_mut().calls.push("PreLoad");
    }

    fn set_lod(&self, texture: NativePtr, lod: u32) -> u32 {
        let mut state = self.state.borrow_mut();
        match state.object_mut(texture) {
            Ok(object) if object.pool == Pool::MANAGED => std::mem::replace(&mut object.lod, lod),
            _ => 0,
        }
    }

    fn lod(&self, texture: NativePtr) -> u32 {
        self.state.borrow().object(texture).map_or(0, |o| o.lod)
    }

    fn level_count(&self, texture: NativePtr) -> u32 {
        self.state.borrow().object(texture).map_or(0, |o| o.levels)
    }

    fn texture_level_desc(&self, texture: NativePtr, level: u32) -> NativeResult<SurfaceDesc> {
        let state = self.state.borrow();
        let object = state.object(texture)?;
        if level >= object.levels {
            return Err(HResult::INVALIDCALL);
        }
        Ok(SurfaceDesc {
            width: (object.width >> level).max(1),
            height: (object.height >> level).max(1),
            ..object.surface_desc()
        })
    }

    fn texture_surface_level(&self, texture: NativePtr, level: u32) -> NativeResult<NativePtr> {
        self.state.borrow_mut().child(texture, 0, level)
    }

    fn texture_lock_rect(
        &self,
        texture: NativePtr,
        level: u32,
        _rect: Option<Rect>,
        _flags: LockFlags,
    ) -> NativeResult<LockedRect> {
        let mut state = self.state.borrow_mut();
        let surface = state.child(texture, 0, level)?;
        state.release(surface);
        state.lock_rect(surface, "LockRect")
    }

    fn texture_unlock_rect(&self, texture: NativePtr, level: u32) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        let surface = state.child(texture, 0, level)?;
        state.release(surface);
        state.unlock(surface, "UnlockRect")
    }

    fn texture_add_dirty_rect(&self, texture: NativePtr, _rect: Option<Rect>) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("AddDirtyRect")?;
        state.object(texture).map(|_| ())
    }

    fn cube_level_desc(&self, cube: NativePtr, level: u32) -> NativeResult<SurfaceDesc> {
        self.texture_level_desc(cube, level)
    }

    fn cube_map_surface(&self, cube: NativePtr, face: CubeMapFace, level: u32) -> NativeResult<NativePtr> {
        if face.0 > 5 {
            return Err(HResult::INVALIDCALL);
        }
        self.state.borrow_mut().child(cube, face.0, level)
    }

    fn cube_lock_rect(
        &self,
        cube: NativePtr,
        face: CubeMapFace,
        level: u32,
        _rect: Option<Rect>,
        _flags: LockFlags,
    ) -> NativeResult<LockedRect> {
        let surface = self.cube_map_surface(cube, face, level)?;
        let mut state = self.state.borrow_mut();
        state.release(surface);
        state.lock_rect(surface, "LockRect")
    }

    fn cube_unlock_rect(&self, cube: NativePtr, face: CubeMapFace, level: u32) -> NativeResult<()> {
        let surface = self.cube_map_surface(cube, face, level)?;
        let mut state = self.state.borrow_mut();
        state.release(surface);
        state.unlock(surface, "UnlockRect")
    }

    fn cube_add_dirty_rect(&self, cube: NativePtr, _face: CubeMapFace, rect: Option<Rect>) -> NativeResult<()> {
        self.texture_add_dirty_rect(cube, rect)
    }

    fn volume_texture_level_desc(&self, texture: NativePtr, level: u32) -> NativeResult<VolumeDesc> {
        let state = self.state.borrow();
        let object = state.object(texture)?;
        if level >= object.levels {
            return Err(HResult::INVALIDCALL);
        }
        Ok(VolumeDesc {
            format: object.format,
            resource_type: ResourceType::VOLUME,
            usage: object.usage,
            pool: object.pool,
            width: (object.width >> level).max(1),
            height: (object.height >> level).max(1),
            depth: (object.depth >> level).max(1),
        })
    }

    fn volume_texture_volume_level(&self, texture: NativePtr, level: u32) -> NativeResult<NativePtr> {
        self.state.borrow_mut().child(texture, 0, level)
    }

    fn volume_texture_lock_box(
        &self,
        texture: NativePtr,
        level: u32,
        region: Option<Box3>,
        flags: LockFlags,
    ) -> NativeResult<LockedBox> {
        let volume = self.volume_texture_volume_level(texture, level)?;
        self.state.borrow_mut().release(volume);
        self.volume_lock_box(volume, region, flags)
    }

    fn volume_texture_unlock_box(&self, texture: NativePtr, level: u32) -> NativeResult<()> {
        let volume = self.volume_texture_volume_level(texture, level)?;
        self.state.borrow_mut().release(volume);
        self.volume_unlock_box(volume)
    }

    fn volume_texture_add_dirty_box(&self, texture: NativePtr, _region: Option<Box3>) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("AddDirtyBox")?;
        state.object(texture).map(|_| ())
    }

    fn surface_desc(&self, surface: NativePtr) -> NativeResult<SurfaceDesc> {
        let state = self.state.borrow();
        let object = state.object(surface)?;
        match object.class {
            ObjectClass::Resource(ResourceType::SURFACE) => Ok(object.surface_desc()),
            _ => Err(HResult::INVALIDCALL),
        }
    }

    fn surface_lock_rect(&self, surface: NativePtr, _rect: Option<Rect>, _flags: LockFlags) -> NativeResult<LockedRect> {
        self.state.borrow_mut().lock_rect(surface, "LockRect")
    }

    fn surface_unlock_rect(&self, surface: NativePtr) -> NativeResult<()> {
        self.state.borrow_mut().unlock(surface, "UnlockRect")
    }

    fn container(&self, object: NativePtr) -> NativeResult<NativePtr> {
        let mut state = self.state.borrow_mut();
        let parent = match state.object(object)?.parent {
            Some(parent) => parent,
            None if Some(object) == state.back_buffer => state.swap_chain.ok_or(HResult::INVALIDCALL)?,
            None => return Err(HResult::E_NOINTERFACE),
        };
        state.add_ref(parent);
        Ok(parent)
    }

    fn volume_desc(&self, volume: NativePtr) -> NativeResult<VolumeDesc> {
        let state = self.state.borrow();
        let object = state.object(volume)?;
        Ok(VolumeDesc {
            format: object.format,
            resource_type: ResourceType::VOLUME,
            usage: object.usage,
            pool: object.pool,
            width: object.width,
            height: object.height,
            depth: object.depth,
        })
    }

    fn volume_lock_box(&self, volume: NativePtr, _region: Option<Box3>, _flags: LockFlags) -> NativeResult<LockedBox> {
        let rect = self.state.borrow_mut().lock_rect(volume, "LockBox")?;
        let state = self.state.borrow();
        let height = state.object(volume)?.height as i32;
        Ok(LockedBox {
            row_pitch: rect.pitch,
            slice_pitch: rect.pitch * height,
            bits: rect.bits,
        })
    }

    fn volume_unlock_box(&self, volume: NativePtr) -> NativeResult<()> {
        self.state.borrow_mut().unlock(volume, "UnlockBox")
    }

    fn vertex_buffer_desc(&self, buffer: NativePtr) -> NativeResult<VertexBufferDesc> {
        let state = self.state.borrow();
        let object = state.object(buffer)?;
        Ok(VertexBufferDesc {
            format: Format::VERTEXDATA,
            resource_type: ResourceType::VERTEXBUFFER,
            usage: object.usage,
            pool: object.pool,
            size: object.size,
            fvf: object.fvf,
        })
    }

    fn index_buffer_desc(&self, buffer: NativePtr) -> NativeResult<IndexBufferDesc> {
        let state = self.state.borrow();
        let object = state.object(buffer)?;
        Ok(IndexBufferDesc {
            format: object.format,
            resource_type: ResourceType::INDEXBUFFER,
            usage: object.usage,
            pool: object.pool,
            size: object.size,
        })
    }

    fn buffer_lock(&self, buffer: NativePtr, offset: u32, size: u32, _flags: LockFlags) -> NativeResult<usize> {
        let mut state = self.state.borrow_mut();
        state.enter("Lock")?;
        let object = state.object_mut(buffer)?;
        if offset.saturating_add(size) > object.size || object.locked {
            return Err(HResult::INVALIDCALL);
        }
        object.locked = true;
        Ok((buffer.addr() << 8) + offset as usize)
    }

    fn buffer_unlock(&self, buffer: NativePtr) -> NativeResult<()> {
        self.state.borrow_mut().unlock(buffer, "Unlock")
    }

    fn swap_chain_present(
        &self,
        swap_chain: NativePtr,
        _src: Option<Rect>,
        _dst: Option<Rect>,
        _window: Option<WindowHandle>,
    ) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SwapChainPresent")?;
        match state.object(swap_chain)?.class {
            ObjectClass::SwapChain => Ok(()),
            _ => Err(HResult::INVALIDCALL),
        }
    }

    fn swap_chain_back_buffer(&self, swap_chain: NativePtr, index: u32, ty: BackBufferType) -> NativeResult<NativePtr> {
        let mut state = self.state.borrow_mut();
        if Some(swap_chain) == state.swap_chain {
            drop(state);
            return self.back_buffer(0, index, ty);
        }
        if state.object(swap_chain)?.class != ObjectClass::SwapChain {
            return Err(HResult::INVALIDCALL);
        }
        state.child(swap_chain, 0, index)
    }

    fn load_surface_from_memory(
        &self,
        surface: NativePtr,
        _dst_rect: Option<Rect>,
        data: &[u8],
        _format: Format,
        _pitch: u32,
        _src_rect: Rect,
    ) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("LoadSurfaceFromMemory")?;
        state.object(surface)?;
        state.uploads.push((surface, data.len()));
        Ok(())
    }
}

impl Device for MockDevice9 {
    fn add_ref(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        state.device_refs += 1;
        state.device_refs
    }

    fn release(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        state.device_refs = state.device_refs.saturating_sub(1);
        state.device_refs
    }

    fn test_cooperative_level(&self) -> NativeResult<()> {
        self.state.borrow_mut().enter("TestCooperativeLevel")
    }

    fn available_texture_mem(&self) -> u32 {
        256 << 20
    }

    fn evict_managed_resources(&self) -> NativeResult<()> {
        self.state.borrow_mut().enter("EvictManagedResources")
    }

    fn direct3d(&self) -> NativeResult<NativePtr> {
        Ok(FACTORY_IDENTITY)
    }

    fn device_caps(&self) -> NativeResult<Caps> {
        Ok(self.state.borrow().caps)
    }

    fn display_mode(&self, swap_chain: u32) -> NativeResult<DisplayMode> {
        if swap_chain != 0 {
            return Err(HResult::INVALIDCALL);
        }
        Ok(self.state.borrow().display_mode)
    }

    fn creation_parameters(&self) -> NativeResult<CreationParameters> {
        Ok(CreationParameters {
            adapter_ordinal: 0,
            device_type: DeviceType::HAL,
            ..CreationParameters::default()
        })
    }

    fn set_cursor_properties(&self, _x: u32, _y: u32, bitmap: NativePtr) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SetCursorProperties")?;
        state.object(bitmap).map(|_| ())
    }

    fn set_cursor_position(&self, _x: i32, _y: i32, _flags: u32) {
        self.state.borrow_mut().calls.push("SetCursorPosition");
    }

    fn show_cursor(&self, _show: bool) -> bool {
        false
    }

    fn create_additional_swap_chain(&self, params: &mut PresentParameters) -> NativeResult<NativePtr> {
        let mut state = self.state.borrow_mut();
        state.enter("CreateAdditionalSwapChain")?;
        state.complete_params(params);
        let mut swap_chain = MockObject::new(ObjectClass::SwapChain);
        swap_chain.usage = Usage::RENDERTARGET;
        swap_chain.format = params.back_buffer_format;
        swap_chain.width = params.back_buffer_width;
        swap_chain.height = params.back_buffer_height;
        swap_chain.levels = params.back_buffer_count;
        state.alloc(swap_chain)
    }

    fn reset(&self, params: &mut PresentParameters) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("Reset")?;
        let default_pool_alive = state.objects.values().any(|o| {
            o.parent.is_none() && !o.implicit && o.pool == Pool::DEFAULT && o.resource_type().is_some()
        });
        if default_pool_alive {
            return Err(HResult::INVALIDCALL);
        }
        let implicit: Vec<NativePtr> = [state.swap_chain, state.back_buffer, state.auto_depth_stencil]
            .into_iter()
            .flatten()
            .collect();
        for ptr in implicit {
            state.objects.remove(&ptr);
        }
        state.complete_params(params);
        state.create_implicit_objects(params)?;
        state.params = *params;
        state.reset_device_state();
        state.resets += 1;
        Ok(())
    }

    fn present(&self, _src: Option<Rect>, _dst: Option<Rect>, _window: Option<WindowHandle>) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("Present")?;
        if state.in_scene {
            return Err(HResult::INVALIDCALL);
        }
        state.presents += 1;
        Ok(())
    }

    fn back_buffer(&self, swap_chain: u32, index: u32, _ty: BackBufferType) -> NativeResult<NativePtr> {
        let mut state = self.state.borrow_mut();
        if swap_chain != 0 || index != 0 {
            return Err(HResult::INVALIDCALL);
        }
        let back_buffer = state.back_buffer.ok_or(HResult::INVALIDCALL)?;
        state.add_ref(back_buffer);
        Ok(back_buffer)
    }

    fn raster_status(&self, _swap_chain: u32) -> NativeResult<RasterStatus> {
        Ok(RasterStatus::default())
    }

    fn set_gamma_ramp(&self, _swap_chain: u32, _flags: u32, ramp: &GammaRamp) {
        self.state.borrow_mut().gamma = ramp.clone();
    }

    fn gamma_ramp(&self, _swap_chain: u32) -> GammaRamp {
        self.state.borrow().gamma.clone()
    }

    fn create_texture(
        &self,
        width: u32,
        height: u32,
        levels: u32,
        usage: Usage,
        format: Format,
        pool: Pool,
    ) -> NativeResult<NativePtr> {
        let mut state = self.state.borrow_mut();
        state.enter("CreateTexture")?;
        if width == 0 || height == 0 {
            return Err(HResult::INVALIDCALL);
        }
        if usage.contains(Usage::RENDERTARGET) && (pool != Pool::DEFAULT || state.reject_render_target_textures) {
            return Err(HResult::INVALIDCALL);
        }
        let levels = match levels {
            0 => full_mip_chain(width, height, 1),
            n => n,
        };
        state.alloc(MockObject {
            levels,
            ..MockObject {
                class: ObjectClass::Resource(ResourceType::TEXTURE),
                ..MockObject::surface(usage, format, pool, width, height)
            }
        })
    }

    fn create_volume_texture(
        &self,
        width: u32,
        height: u32,
        depth: u32,
        levels: u32,
        usage: Usage,
        format: Format,
        pool: Pool,
    ) -> NativeResult<NativePtr> {
        let mut state = self.state.borrow_mut();
        state.enter("CreateVolumeTexture")?;
        if width == 0 || height == 0 || depth == 0 || usage.contains(Usage::RENDERTARGET) {
            return Err(HResult::INVALIDCALL);
        }
        let levels = match levels {
            0 => full_mip_chain(width, height, depth),
            n => n,
        };
        state.alloc(MockObject {
            levels,
            depth,
            ..MockObject {
                class: ObjectClass::Resource(ResourceType::VOLUMETEXTURE),
                ..MockObject::surface(usage, format, pool, width, height)
            }
        })
    }

    fn create_cube_texture(
        &self,
        edge_length: u32,
        levels: u32,
        usage: Usage,
        format: Format,
        pool: Pool,
    ) -> NativeResult<NativePtr> {
        let mut state = self.state.borrow_mut();
        state.enter("CreateCubeTexture")?;
        if edge_length == 0 {
            return Err(HResult::INVALIDCALL);
        }
        if usage.contains(Usage::RENDERTARGET) && (pool != Pool::DEFAULT || state.reject_render_target_textures) {
            return Err(HResult::INVALIDCALL);
        }
        let levels = match levels {
            0 => full_mip_chain(edge_length, edge_length, 1),
            n => n,
        };
        state.alloc(MockObject {
            levels,
            ..MockObject {
                class: ObjectClass::Resource(ResourceType::CUBETEXTURE),
                ..MockObject::surface(usage, format, pool, edge_length, edge_length)
            }
        })
    }

    fn create_vertex_buffer(&self, length: u32, usage: Usage, fvf: u32, pool: Pool) -> NativeResult<NativePtr> {
        let mut state = self.state.borrow_mut();
        state.enter("CreateVertexBuffer")?;
        if length == 0 {
            return Err(HResult::INVALIDCALL);
        }
        state.alloc(MockObject {
            usage,
            pool,
            size: length,
            fvf,
            ..MockObject::new(ObjectClass::Resource(ResourceType::VERTEXBUFFER))
        })
    }

    fn create_index_buffer(&self, length: u32, usage: Usage, format: Format, pool: Pool) -> NativeResult<NativePtr> {
        let mut state = self.state.borrow_mut();
        state.enter("CreateIndexBuffer")?;
        if length == 0 {
            return Err(HResult::INVALIDCALL);
        }
        state.alloc(MockObject {
            usage,
            pool,
            size: length,
            format,
            ..MockObject::new(ObjectClass::Resource(ResourceType::INDEXBUFFER))
        })
    }

    fn create_render_target(
        &self,
        width: u32,
        height: u32,
        format: Format,
        _multi_sample: MultiSampleType,
        _multi_sample_quality: u32,
        _lockable: bool,
    ) -> NativeResult<NativePtr> {
        let mut state = self.state.borrow_mut();
        state.enter("CreateRenderTarget")?;
        state.alloc(MockObject::surface(Usage::RENDERTARGET, format, Pool::DEFAULT, width, height))
    }

    fn create_depth_stencil_surface(
        &self,
        width: u32,
        height: u32,
        format: Format,
        _multi_sample: MultiSampleType,
        _multi_sample_quality: u32,
        _discard: bool,
    ) -> NativeResult<NativePtr> {
        let mut state = self.state.borrow_mut();
        state.enter("CreateDepthStencilSurface")?;
        state.alloc(MockObject::surface(Usage::DEPTHSTENCIL, format, Pool::DEFAULT, width, height))
    }

    fn create_offscreen_plain_surface(
        &self,
        width: u32,
        height: u32,
        format: Format,
        pool: Pool,
    ) -> NativeResult<NativePtr> {
        let mut state = self.state.borrow_mut();
        state.enter("CreateOffscreenPlainSurface")?;
        state.alloc(MockObject::surface(Usage::empty(), format, pool, width, height))
    }

    fn update_surface(
        &self,
        src: NativePtr,
        _src_rect: Option<Rect>,
        dst: NativePtr,
        _dst_point: Option<Point>,
    ) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("UpdateSurface")?;
        if state.object(src)?.pool != Pool::SYSTEMMEM || state.object(dst)?.pool != Pool::DEFAULT {
            return Err(HResult::INVALIDCALL);
        }
        state.copies.push(("UpdateSurface", src, dst));
        Ok(())
    }

    fn update_texture(&self, src: NativePtr, dst: NativePtr) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("UpdateTexture")?;
        if state.object(src)?.pool != Pool::SYSTEMMEM || state.object(dst)?.pool != Pool::DEFAULT {
            return Err(HResult::INVALIDCALL);
        }
        state.copies.push(("UpdateTexture", src, dst));
        Ok(())
    }

    fn get_render_target_data(&self, render_target: NativePtr, dst: NativePtr) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("GetRenderTargetData")?;
        if state.object(render_target)?.pool != Pool::DEFAULT || state.object(dst)?.pool != Pool::SYSTEMMEM {
            return Err(HResult::INVALIDCALL);
        }
        state.copies.push(("GetRenderTargetData", render_target, dst));
        Ok(())
    }

    fn stretch_rect(
        &self,
        src: NativePtr,
        _src_rect: Option<Rect>,
        dst: NativePtr,
        _dst_rect: Option<Rect>,
        _filter: TextureFilter,
    ) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("StretchRect")?;
        if state.in_scene {
            return Err(HResult::INVALIDCALL);
        }
        if state.object(src)?.pool != Pool::DEFAULT || state.object(dst)?.pool != Pool::DEFAULT {
            return Err(HResult::INVALIDCALL);
        }
        state.copies.push(("StretchRect", src, dst));
        Ok(())
    }

    fn set_render_target(&self, index: u32, surface: Option<NativePtr>) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SetRenderTarget")?;
        if index >= state.caps.num_simultaneous_rts || index as usize >= state.render_targets.len() {
            return Err(HResult::INVALIDCALL);
        }
        match surface {
            Some(surface) => {
                let object = state.object(surface)?;
                if object.resource_type() != Some(ResourceType::SURFACE) || !object.usage.contains(Usage::RENDERTARGET) {
                    return Err(HResult::INVALIDCALL);
                }
            }
            None if index == 0 => return Err(HResult::INVALIDCALL),
            None => {}
        }
        state.render_targets[index as usize] = surface;
        Ok(())
    }

    fn render_target(&self, index: u32) -> NativeResult<NativePtr> {
        let mut state = self.state.borrow_mut();
        let target = state
            .render_targets
            .get(index as usize)
            .copied()
            .flatten()
            .ok_or(HResult::NOTFOUND)?;
        state.add_ref(target);
        Ok(target)
    }

    fn set_depth_stencil_surface(&self, surface: Option<NativePtr>) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SetDepthStencilSurface")?;
        if let Some(surface) = surface {
            if !state.object(surface)?.usage.contains(Usage::DEPTHSTENCIL) {
                return Err(HResult::INVALIDCALL);
            }
        }
        state.depth_stencil = surface;
        Ok(())
    }

    fn depth_stencil_surface(&self) -> NativeResult<NativePtr> {
        let mut state = self.state.borrow_mut();
        let surface = state.depth_stencil.ok_or(HResult::NOTFOUND)?;
        state.add_ref(surface);
        Ok(surface)
    }

    fn begin_scene(&self) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("BeginScene")?;
        if state.in_scene {
            return Err(HResult::INVALIDCALL);
        }
        state.in_scene = true;
        Ok(())
    }

    fn end_scene(&self) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("EndScene")?;
        if !state.in_scene {
            return Err(HResult::INVALIDCALL);
        }
        state.in_scene = false;
        Ok(())
    }

    fn clear(&self, _rects: &[Rect], _flags: ClearFlags, _color: u32, _z: f32, _stencil: u32) -> NativeResult<()> {
        self.state.borrow_mut().enter("Clear")
    }

    fn set_transform(&self, state: TransformState, matrix: &Matrix) -> NativeResult<()> {
        let mut s = self.state.borrow_mut();
        s.enter("SetTransform")?;
        s.transforms.insert(state.0, *matrix);
        Ok(())
    }

    fn transform(&self, state: TransformState) -> NativeResult<Matrix> {
        Ok(self
            .state
            .borrow()
            .transforms
            .get(&state.0)
            .copied()
            .unwrap_or(Matrix::IDENTITY))
    }

    fn multiply_transform(&self, state: TransformState, matrix: &Matrix) -> NativeResult<()> {
        let current = self.transform(state)?;
        let mut s = self.state.borrow_mut();
        s.enter("MultiplyTransform")?;
        s.transforms.insert(state.0, matrix.multiply(&current));
        Ok(())
    }

    fn set_viewport(&self, viewport: &Viewport) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SetViewport")?;
        state.viewport = *viewport;
        Ok(())
    }

    fn viewport(&self) -> NativeResult<Viewport> {
        Ok(self.state.borrow().viewport)
    }

    fn set_material(&self, material: &Material) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SetMaterial")?;
        state.material = *material;
        Ok(())
    }

    fn material(&self) -> NativeResult<Material> {
        Ok(self.state.borrow().material)
    }

    fn set_light(&self, index: u32, light: &Light) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SetLight")?;
        state.lights.insert(index, *light);
        Ok(())
    }

    fn light(&self, index: u32) -> NativeResult<Light> {
        self.state
            .borrow()
            .lights
            .get(&index)
            .copied()
            .ok_or(HResult::INVALIDCALL)
    }

    fn light_enable(&self, index: u32, enable: bool) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("LightEnable")?;
        state.lights_enabled.insert(index, enable);
        Ok(())
    }

    fn light_enabled(&self, index: u32) -> NativeResult<bool> {
        self.state
            .borrow()
            .lights_enabled
            .get(&index)
            .copied()
            .ok_or(HResult::INVALIDCALL)
    }

    fn set_clip_plane(&self, index: u32, plane: [f32; 4]) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SetClipPlane")?;
        if index >= state.caps.max_user_clip_planes {
            return Err(HResult::INVALIDCALL);
        }
        state.clip_planes.insert(index, plane);
        Ok(())
    }

    fn clip_plane(&self, index: u32) -> NativeResult<[f32; 4]> {
        Ok(self.state.borrow().clip_planes.get(&index).copied().unwrap_or_default())
    }

    fn set_render_state(&self, state: RenderStateType, value: u32) -> NativeResult<()> {
        let mut s = self.state.borrow_mut();
        s.enter("SetRenderState")?;
        s.render_states.insert(state.0, value);
        Ok(())
    }

    fn render_state(&self, state: RenderStateType) -> NativeResult<u32> {
        Ok(self.state.borrow().render_states.get(&state.0).copied().unwrap_or(0))
    }

    fn set_clip_status(&self, status: &ClipStatus) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SetClipStatus")?;
        state.clip_status = *status;
        Ok(())
    }

    fn clip_status(&self) -> NativeResult<ClipStatus> {
        Ok(self.state.borrow().clip_status)
    }

    fn texture(&self, stage: u32) -> NativeResult<Option<NativePtr>> {
        let mut state = self.state.borrow_mut();
        let texture = state.textures.get(&stage).copied();
        if let Some(texture) = texture {
            state.add_ref(texture);
        }
        Ok(texture)
    }

    fn set_texture(&self, stage: u32, texture: Option<NativePtr>) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SetTexture")?;
        match texture {
            Some(texture) => {
                state.object(texture)?;
                state.textures.insert(stage, texture);
            }
            None => {
                state.textures.remove(&stage);
            }
        }
        Ok(())
    }

    fn texture_stage_state(&self, stage: u32, ty: TextureStageStateType) -> NativeResult<u32> {
        Ok(self
            .state
            .borrow()
            .texture_stage_states
            .get(&(stage, ty.0))
            .copied()
            .unwrap_or(0))
    }

    fn set_texture_stage_state(&self, stage: u32, ty: TextureStageStateType, value: u32) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SetTextureStageState")?;
        state.texture_stage_states.insert((stage, ty.0), value);
        Ok(())
    }

    fn sampler_state(&self, sampler: u32, ty: SamplerStateType) -> NativeResult<u32> {
        Ok(self
            .state
            .borrow()
            .sampler_states
            .get(&(sampler, ty.0))
            .copied()
            .unwrap_or(0))
    }

    fn set_sampler_state(&self, sampler: u32, ty: SamplerStateType, value: u32) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SetSamplerState")?;
        state.sampler_states.insert((sampler, ty.0), value);
        Ok(())
    }

    fn validate_device(&self) -> NativeResult<u32> {
        self.state.borrow_mut().enter("ValidateDevice")?;
        Ok(1)
    }

    fn set_palette_entries(&self, palette: u32, entries: &[PaletteEntry; 256]) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SetPaletteEntries")?;
        state.palettes.insert(palette, *entries);
        Ok(())
    }

    fn palette_entries(&self, palette: u32) -> NativeResult<[PaletteEntry; 256]> {
        self.state
            .borrow()
            .palettes
            .get(&palette)
            .copied()
            .ok_or(HResult::INVALIDCALL)
    }

    fn set_current_texture_palette(&self, palette: u32) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SetCurrentTexturePalette")?;
        state.current_palette = palette;
        Ok(())
    }

    fn current_texture_palette(&self) -> NativeResult<u32> {
        Ok(self.state.borrow().current_palette)
    }

    fn set_software_vertex_processing(&self, software: bool) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SetSoftwareVertexProcessing")?;
        state.software_vertex_processing = software;
        Ok(())
    }

    fn software_vertex_processing(&self) -> bool {
        self.state.borrow().software_vertex_processing
    }

    fn draw_primitive(&self, ty: PrimitiveType, start_vertex: u32, primitive_count: u32) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("DrawPrimitive")?;
        state.record_draw(DrawCall::Primitive {
            ty,
            start_vertex,
            primitive_count,
        })
    }

    fn draw_indexed_primitive(
        &self,
        ty: PrimitiveType,
        base_vertex_index: i32,
        min_vertex_index: u32,
        num_vertices: u32,
        start_index: u32,
        primitive_count: u32,
    ) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("DrawIndexedPrimitive")?;
        if state.indices.is_none() {
            return Err(HResult::INVALIDCALL);
        }
        state.record_draw(DrawCall::Indexed {
            ty,
            base_vertex_index,
            min_index: min_vertex_index,
            num_vertices,
            start_index,
            primitive_count,
        })
    }

    fn draw_primitive_up(&self, ty: PrimitiveType, primitive_count: u32, vertices: &[u8], stride: u32) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("DrawPrimitiveUP")?;
        state.record_draw(DrawCall::PrimitiveUp {
            ty,
            primitive_count,
            vertices: vertices.to_vec(),
            stride,
        })?;
        // User-memory draws leave stream 0 unbound.
        state.streams.remove(&0);
        Ok(())
    }

    fn draw_indexed_primitive_up(
        &self,
        ty: PrimitiveType,
        _min_vertex_index: u32,
        num_vertices: u32,
        primitive_count: u32,
        _indices: &[u8],
        _index_format: Format,
        _vertices: &[u8],
        _stride: u32,
    ) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("DrawIndexedPrimitiveUP")?;
        state.record_draw(DrawCall::IndexedUp {
            ty,
            num_vertices,
            primitive_count,
        })?;
        state.streams.remove(&0);
        state.indices = None;
        Ok(())
    }

    fn process_vertices(
        &self,
        _src_start_index: u32,
        _dest_index: u32,
        _vertex_count: u32,
        dest_buffer: NativePtr,
        _declaration: Option<NativePtr>,
        _flags: u32,
    ) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("ProcessVertices")?;
        state.object(dest_buffer).map(|_| ())
    }

    fn create_vertex_declaration(&self, elements: &[VertexElement]) -> NativeResult<NativePtr> {
        let mut state = self.state.borrow_mut();
        state.enter("CreateVertexDeclaration")?;
        if elements.last() != Some(&VertexElement::END) {
            return Err(HResult::INVALIDCALL);
        }
        state.alloc(MockObject {
            elements: elements.to_vec(),
            ..MockObject::new(ObjectClass::VertexDeclaration)
        })
    }

    fn set_vertex_declaration(&self, declaration: Option<NativePtr>) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SetVertexDeclaration")?;
        if let Some(declaration) = declaration {
            if state.object(declaration)?.class != ObjectClass::VertexDeclaration {
                return Err(HResult::INVALIDCALL);
            }
        }
        state.declaration = declaration;
        Ok(())
    }

    fn set_fvf(&self, fvf: u32) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SetFVF")?;
        state.fvf = fvf;
        state.declaration = None;
        Ok(())
    }

    fn fvf(&self) -> NativeResult<u32> {
        Ok(self.state.borrow().fvf)
    }

    fn create_vertex_shader(&self, function: &[u32]) -> NativeResult<NativePtr> {
        let mut state = self.state.borrow_mut();
        state.enter("CreateVertexShader")?;
        if function.first().map_or(true, |v| v & 0xFFFF_0000 != 0xFFFE_0000) {
            return Err(HResult::INVALIDCALL);
        }
        state.alloc(MockObject {
            function: function.to_vec(),
            ..MockObject::new(ObjectClass::VertexShader)
        })
    }

    fn set_vertex_shader(&self, shader: Option<NativePtr>) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SetVertexShader")?;
        if let Some(shader) = shader {
            if state.object(shader)?.class != ObjectClass::VertexShader {
                return Err(HResult::INVALIDCALL);
            }
        }
        state.vertex_shader = shader;
        Ok(())
    }

    fn set_vertex_shader_constant_f(&self, start_register: u32, data: &[f32]) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SetVertexShaderConstantF")?;
        MockState::set_constants(&mut state.vs_constants, start_register, data)
    }

    fn vertex_shader_constant_f(&self, start_register: u32, vector4_count: u32) -> NativeResult<Vec<f32>> {
        Ok(MockState::constants(
            &self.state.borrow().vs_constants,
            start_register,
            vector4_count,
        ))
    }

    fn set_stream_source(&self, stream: u32, buffer: Option<NativePtr>, offset: u32, stride: u32) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SetStreamSource")?;
        if stream >= state.caps.max_streams {
            return Err(HResult::INVALIDCALL);
        }
        state.streams.insert(stream, StreamSource { buffer, offset, stride });
        Ok(())
    }

    fn stream_source(&self, stream: u32) -> NativeResult<StreamSource> {
        let mut state = self.state.borrow_mut();
        let source = state.streams.get(&stream).copied().unwrap_or_default();
        if let Some(buffer) = source.buffer {
            state.add_ref(buffer);
        }
        Ok(source)
    }

    fn set_indices(&self, buffer: Option<NativePtr>) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SetIndices")?;
        state.indices = buffer;
        Ok(())
    }

    fn indices(&self) -> NativeResult<Option<NativePtr>> {
        let mut state = self.state.borrow_mut();
        let indices = state.indices;
        if let Some(buffer) = indices {
            state.add_ref(buffer);
        }
        Ok(indices)
    }

    fn create_pixel_shader(&self, function: &[u32]) -> NativeResult<NativePtr> {
        let mut state = self.state.borrow_mut();
        state.enter("CreatePixelShader")?;
        if function.first().map_or(true, |v| v & 0xFFFF_0000 != 0xFFFF_0000) {
            return Err(HResult::INVALIDCALL);
        }
        state.alloc(MockObject {
            function: function.to_vec(),
            ..MockObject::new(ObjectClass::PixelShader)
        })
    }

    fn set_pixel_shader(&self, shader: Option<NativePtr>) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SetPixelShader")?;
        if let Some(shader) = shader {
            if state.object(shader)?.class != ObjectClass::PixelShader {
                return Err(HResult::INVALIDCALL);
            }
        }
        state.pixel_shader = shader;
        Ok(())
    }

    fn set_pixel_shader_constant_f(&self, start_register: u32, data: &[f32]) -> NativeResult<()> {
        let mut state = self.state.borrow_mut();
        state.enter("SetPixelShaderConstantF")?;
        MockState::set_constants(&mut state.ps_constants, start_register, data)
    }

    fn pixel_shader_constant_f(&self, start_register: u32, vector4_count: u32) -> NativeResult<Vec<f32>> {
        Ok(MockState::constants(
            &self.state.borrow().ps_constants,
            start_register,
            vector4_count,
        ))
    }

    fn draw_rect_patch(&self, _handle: u32, _segments: &[f32; 4], _info: Option<&RectPatchInfo>) -> NativeResult<()> {
        self.state.borrow_mut().enter("DrawRectPatch")
    }

    fn draw_tri_patch(&self, _handle: u32, _segments: &[f32; 3], _info: Option<&TriPatchInfo>) -> NativeResult<()> {
        self.state.borrow_mut().enter("DrawTriPatch")
    }

    fn delete_patch(&self, _handle: u32) -> NativeResult<()> {
        self.state.borrow_mut().enter("DeletePatch")
    }
}
