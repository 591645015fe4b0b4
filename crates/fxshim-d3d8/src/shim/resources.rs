//! Per-resource views over a [`Device8`].
//!
//! A legacy resource interface is a [`WrapperHandle`]; its methods live on short-lived views that
//! borrow the owning device, checked against the wrapper's kind when the view is made.
//! Descriptions report the usage the application asked for, not what promotion added.

use crate::d3d8;
use crate::d3d9::{
    BackBufferType, Box3, CubeMapFace, Device, IndexBufferDesc, LockFlags, LockedBox, LockedRect, NativePtr,
    Rect, ResourceType, Usage, VertexBufferDesc, WindowHandle,
};
use crate::error::{NativeContext, ShimError, ShimResult};
use crate::registry::{Origin, ResourceKind, WrapperHandle};
use crate::shim::device8::Device8;
use crate::shim::hook::FrameHook;
use crate::translate;

fn mask_usage(usage: Usage, origin: Option<Origin>) -> Usage {
    match origin {
        Some(origin) if origin.promoted => usage.difference(Usage::RENDERTARGET),
        _ => usage,
    }
}

impl<D: Device, H: FrameHook<D>> Device8<D, H> {
    fn origin(&self, handle: WrapperHandle) -> Option<Origin> {
        self.registry.info(handle).and_then(|info| info.origin)
    }

    /// Wraps a sub-object (mip level, face, volume slice) so that it reports its parent's origin.
    fn wrap_child(&mut self, parent: WrapperHandle, native: NativePtr) -> ShimResult<WrapperHandle> {
        let handle = self.wrap_queried(native)?;
        if let Some(origin) = self.origin(parent) {
            if self.origin(handle).is_none() {
                self.registry.set_origin(handle, origin)?;
            }
        }
        Ok(handle)
    }

    pub fn add_ref_resource(&mut self, handle: WrapperHandle) -> ShimResult<u32> {
        Ok(self.registry.add_ref(handle, &self.device)?)
    }

    /// Drops one application reference. The wrapper disappears with its last reference.
    pub fn release_resource(&mut self, handle: WrapperHandle) -> ShimResult<u32> {
        Ok(self.registry.release(handle, &self.device)?)
    }

    pub fn resource_type(&self, handle: WrapperHandle) -> ShimResult<ResourceType> {
        let info = self.registry.info(handle).ok_or(ShimError::unknown_handle(handle))?;
        let ty = match info.kind {
            ResourceKind::Surface => ResourceType::SURFACE,
            ResourceKind::Volume => ResourceType::VOLUME,
            ResourceKind::Texture => ResourceType::TEXTURE,
            ResourceKind::VolumeTexture => ResourceType::VOLUMETEXTURE,
            ResourceKind::CubeTexture => ResourceType::CUBETEXTURE,
            ResourceKind::VertexBuffer => ResourceType::VERTEXBUFFER,
            ResourceKind::IndexBuffer => ResourceType::INDEXBUFFER,
            ResourceKind::SwapChain => return Err(ShimError::InvalidArgument("swap chains are not resources")),
        };
        Ok(ty)
    }

    pub fn set_priority(&self, handle: WrapperHandle, priority: u32) -> ShimResult<u32> {
        let native = self.registry.unwrap(handle).ok_or(ShimError::unknown_handle(handle))?;
        Ok(self.device.set_priority(native, priority))
    }

    pub fn priority(&self, handle: WrapperHandle) -> ShimResult<u32> {
        let native = self.registry.unwrap(handle).ok_or(ShimError::unknown_handle(handle))?;
        Ok(self.device.priority(native))
    }

    pub fn preload(&self, handle: WrapperHandle) -> ShimResult<()> {
        let native = self.registry.unwrap(handle).ok_or(ShimError::unknown_handle(handle))?;
        self.device.preload(native);
        Ok(())
    }

    pub fn as_surface(&mut self, handle: WrapperHandle) -> ShimResult<Surface8<'_, D, H>> {
        let native = self.registry.checked(handle, ResourceKind::Surface)?;
        Ok(Surface8 {
            device: self,
            handle,
            native,
        })
    }

    pub fn as_volume(&mut self, handle: WrapperHandle) -> ShimResult<Volume8<'_, D, H>> {
        let native = self.registry.checked(handle, ResourceKind::Volume)?;
        Ok(Volume8 {
            device: self,
            handle,
            native,
        })
    }

    pub fn as_texture(&mut self, handle: WrapperHandle) -> ShimResult<Texture8<'_, D, H>> {
        let native = self.registry.checked(handle, ResourceKind::Texture)?;
        Ok(Texture8 {
            device: self,
            handle,
            native,
        })
    }

    pub fn as_cube_texture(&mut self, handle: WrapperHandle) -> ShimResult<CubeTexture8<'_, D, H>> {
        let native = self.registry.checked(handle, ResourceKind::CubeTexture)?;
        Ok(CubeTexture8 {
            device: self,
            handle,
            native,
        })
    }

    pub fn as_volume_texture(&mut self, handle: WrapperHandle) -> ShimResult<VolumeTexture8<'_, D, H>> {
        let native = self.registry.checked(handle, ResourceKind::VolumeTexture)?;
        Ok(VolumeTexture8 {
            device: self,
            handle,
            native,
        })
    }

    pub fn as_vertex_buffer(&mut self, handle: WrapperHandle) -> ShimResult<VertexBuffer8<'_, D, H>> {
        let native = self.registry.checked(handle, ResourceKind::VertexBuffer)?;
        Ok(VertexBuffer8 {
            device: self,
            handle,
            native,
        })
    }

    pub fn as_index_buffer(&mut self, handle: WrapperHandle) -> ShimResult<IndexBuffer8<'_, D, H>> {
        let native = self.registry.checked(handle, ResourceKind::IndexBuffer)?;
        Ok(IndexBuffer8 {
            device: self,
            handle,
            native,
        })
    }

    pub fn as_swap_chain(&mut self, handle: WrapperHandle) -> ShimResult<SwapChain8<'_, D, H>> {
        let native = self.registry.checked(handle, ResourceKind::SwapChain)?;
        Ok(SwapChain8 {
            device: self,
            native,
        })
    }
}

pub struct Surface8<'a, D: Device, H: FrameHook<D>> {
    device: &'a mut Device8<D, H>,
    handle: WrapperHandle,
    native: NativePtr,
}

impl<D: Device, H: FrameHook<D>> Surface8<'_, D, H> {
    pub fn desc(&self) -> ShimResult<d3d8::SurfaceDesc> {
        let desc = self.device.device.surface_desc(self.native).call("GetDesc")?;
        let mut desc = translate::surface_desc_from_d3d9(&desc);
        desc.usage = mask_usage(desc.usage, self.device.origin(self.handle));
        Ok(desc)
    }

    pub fn lock_rect(&self, rect: Option<Rect>, flags: LockFlags) -> ShimResult<LockedRect> {
        self.device
            .device
            .surface_lock_rect(self.native, rect, flags)
            .call("LockRect")
    }

    pub fn unlock_rect(&self) -> ShimResult<()> {
        self.device.device.surface_unlock_rect(self.native).call("UnlockRect")
    }

    /// The texture (or swap chain) owning this surface.
    pub fn container(&mut self) -> ShimResult<WrapperHandle> {
        let native = self.device.device.container(self.native).call("GetContainer")?;
        self.device.wrap_queried(native)
    }
}

pub struct Volume8<'a, D: Device, H: FrameHook<D>> {
    device: &'a mut Device8<D, H>,
    handle: WrapperHandle,
    native: NativePtr,
}

impl<D: Device, H: FrameHook<D>> Volume8<'_, D, H> {
    pub fn desc(&self) -> ShimResult<d3d8::VolumeDesc> {
        let desc = self.device.device.volume_desc(self.native).call("GetDesc")?;
        let mut desc = translate::volume_desc_from_d3d9(&desc);
        desc.usage = mask_usage(desc.usage, self.device.origin(self.handle));
        Ok(desc)
    }

    pub fn lock_box(&self, region: Option<Box3>, flags: LockFlags) -> ShimResult<LockedBox> {
        self.device
            .device
            .volume_lock_box(self.native, region, flags)
            .call("LockBox")
    }

    pub fn unlock_box(&self) -> ShimResult<()> {
        self.device.device.volume_unlock_box(self.native).call("UnlockBox")
    }

    pub fn container(&mut self) -> ShimResult<WrapperHandle> {
        let native = self.device.device.container(self.native).call("GetContainer")?;
        self.device.wrap_queried(native)
    }
}

pub struct Texture8<'a, D: Device, H: FrameHook<D>> {
    device: &'a mut Device8<D, H>,
    handle: WrapperHandle,
    native: NativePtr,
}

impl<D: Device, H: FrameHook<D>> Texture8<'_, D, H> {
    pub fn set_lod(&self, lod: u32) -> u32 {
        self.device.device.set_lod(self.native, lod)
    }

    pub fn lod(&self) -> u32 {
        self.device.device.lod(self.native)
    }

    pub fn level_count(&self) -> u32 {
        self.device.device.level_count(self.native)
    }

    pub fn level_desc(&self, level: u32) -> ShimResult<d3d8::SurfaceDesc> {
        let desc = self
            .device
            .device
            .texture_level_desc(self.native, level)
            .call("GetLevelDesc")?;
        let mut desc = translate::surface_desc_from_d3d9(&desc);
        desc.usage = mask_usage(desc.usage, self.device.origin(self.handle));
        Ok(desc)
    }

    pub fn surface_level(&mut self, level: u32) -> ShimResult<WrapperHandle> {
        let native = self
            .device
            .device
            .texture_surface_level(self.native, level)
            .call("GetSurfaceLevel")?;
        self.device.wrap_child(self.handle, native)
    }

    pub fn lock_rect(&self, level: u32, rect: Option<Rect>, flags: LockFlags) -> ShimResult<LockedRect> {
        self.device
            .device
            .texture_lock_rect(self.native, level, rect, flags)
            .call("LockRect")
    }

    pub fn unlock_rect(&self, level: u32) -> ShimResult<()> {
        self.device
            .device
            .texture_unlock_rect(self.native, level)
            .call("UnlockRect")
    }

    pub fn add_dirty_rect(&self, rect: Option<Rect>) -> ShimResult<()> {
        self.device
            .device
            .texture_add_dirty_rect(self.native, rect)
            .call("AddDirtyRect")
    }
}

pub struct CubeTexture8<'a, D: Device, H: FrameHook<D>> {
    device: &'a mut Device8<D, H>,
    handle: WrapperHandle,
    native: NativePtr,
}

impl<D: Device, H: FrameHook<D>> CubeTexture8<'_, D, H> {
    pub fn set_lod(&self, lod: u32) -> u32 {
        self.device.device.set_lod(self.native, lod)
    }

    pub fn lod(&self) -> u32 {
        self.device.device.lod(self.native)
    }

    pub fn level_count(&self) -> u32 {
        self.device.device.level_count(self.native)
    }

    pub fn level_desc(&self, level: u32) -> ShimResult<d3d8::SurfaceDesc> {
        let desc = self
            .device
            .device
            .cube_level_desc(self.native, level)
            .call("GetLevelDesc")?;
        let mut desc = translate::surface_desc_from_d3d9(&desc);
        desc.usage = mask_usage(desc.usage, self.device.origin(self.handle));
        Ok(desc)
    }

    pub fn cube_map_surface(&mut self, face: CubeMapFace, level: u32) -> ShimResult<WrapperHandle> {
        let native = self
            .device
            .device
            .cube_map_surface(self.native, face, level)
            .call("GetCubeMapSurface")?;
        self.device.wrap_child(self.handle, native)
    }

    pub fn lock_rect(&self, face: CubeMapFace, level: u32, rect: Option<Rect>, flags: LockFlags) -> ShimResult<LockedRect> {
        self.device
            .device
            .cube_lock_rect(self.native, face, level, rect, flags)
            .call("LockRect")
    }

    pub fn unlock_rect(&self, face: CubeMapFace, level: u32) -> ShimResult<()> {
        self.device
            .device
            .cube_unlock_rect(self.native, face, level)
            .call("UnlockRect")
    }

    pub fn add_dirty_rect(&self, face: CubeMapFace, rect: Option<Rect>) -> ShimResult<()> {
        self.device
            .device
            .cube_add_dirty_rect(self.native, face, rect)
            .call("AddDirtyRect")
    }
}

pub struct VolumeTexture8<'a, D: Device, H: FrameHook<D>> {
    device: &'a mut Device8<D, H>,
    handle: WrapperHandle,
    native: NativePtr,
}

impl<D: Device, H: FrameHook<D>> VolumeTexture8<'_, D, H> {
    pub fn set_lod(&self, lod: u32) -> u32 {
        self.device.device.set_lod(self.native, lod)
    }

    pub fn lod(&self) -> u32 {
        self.device.device.lod(self.native)
    }

    pub fn level_count(&self) -> u32 {
        self.device.device.level_count(self.native)
    }

    pub fn level_desc(&self, level: u32) -> ShimResult<d3d8::VolumeDesc> {
        let desc = self
            .device
            .device
            .volume_texture_level_desc(self.native, level)
            .call("GetLevelDesc")?;
        let mut desc = translate::volume_desc_from_d3d9(&desc);
        desc.usage = mask_usage(desc.usage, self.device.origin(self.handle));
        Ok(desc)
    }

    pub fn volume_level(&mut self, level: u32) -> ShimResult<WrapperHandle> {
        let native = self
            .device
            .device
            .volume_texture_volume_level(self.native, level)
            .call("GetVolumeLevel")?;
        self.device.wrap_child(self.handle, native)
    }

    pub fn lock_box(&self, level: u32, region: Option<Box3>, flags: LockFlags) -> ShimResult<LockedBox> {
        self.device
            .device
            .volume_texture_lock_box(self.native, level, region, flags)
            .call("LockBox")
    }

    pub fn unlock_box(&self, level: u32) -> ShimResult<()> {
        self.device
            .device
            .volume_texture_unlock_box(self.native, level)
            .call("UnlockBox")
    }

    pub fn add_dirty_box(&self, region: Option<Box3>) -> ShimResult<()> {
        self.device
            .device
            .volume_texture_add_dirty_box(self.native, region)
            .call("AddDirtyBox")
    }
}

pub struct VertexBuffer8<'a, D: Device, H: FrameHook<D>> {
    device: &'a mut Device8<D, H>,
    handle: WrapperHandle,
    native: NativePtr,
}

impl<D: Device, H: FrameHook<D>> VertexBuffer8<'_, D, H> {
    pub fn desc(&self) -> ShimResult<VertexBufferDesc> {
        let mut desc = self.device.device.vertex_buffer_desc(self.native).call("GetDesc")?;
        desc.usage = mask_usage(desc.usage, self.device.origin(self.handle));
        Ok(desc)
    }

    /// Returns the mapped address. A `size` of 0 maps the whole buffer.
    pub fn lock(&self, offset: u32, size: u32, flags: LockFlags) -> ShimResult<usize> {
        self.device
            .device
            .buffer_lock(self.native, offset, size, flags)
            .call("Lock")
    }

    pub fn unlock(&self) -> ShimResult<()> {
        self.device.device.buffer_unlock(self.native).call("Unlock")
    }
}

pub struct IndexBuffer8<'a, D: Device, H: FrameHook<D>> {
    device: &'a mut Device8<D, H>,
    handle: WrapperHandle,
    native: NativePtr,
}

impl<D: Device, H: FrameHook<D>> IndexBuffer8<'_, D, H> {
    pub fn desc(&self) -> ShimResult<IndexBufferDesc> {
        let mut desc = self.device.device.index_buffer_desc(self.native).call("GetDesc")?;
        desc.usage = mask_usage(desc.usage, self.device.origin(self.handle));
        Ok(desc)
    }

    pub fn lock(&self, offset: u32, size: u32, flags: LockFlags) -> ShimResult<usize> {
        self.device
            .device
            .buffer_lock(self.native, offset, size, flags)
            .call("Lock")
    }

    pub fn unlock(&self) -> ShimResult<()> {
        self.device.device.buffer_unlock(self.native).call("Unlock")
    }
}

pub struct SwapChain8<'a, D: Device, H: FrameHook<D>> {
    device: &'a mut Device8<D, H>,
    native: NativePtr,
}

impl<D: Device, H: FrameHook<D>> SwapChain8<'_, D, H> {
    pub fn present(&self, src: Option<Rect>, dst: Option<Rect>, window: Option<WindowHandle>) -> ShimResult<()> {
        self.device
            .device
            .swap_chain_present(self.native, src, dst, window)
            .call("Present")
    }

    pub fn back_buffer(&mut self, index: u32, ty: BackBufferType) -> ShimResult<WrapperHandle> {
        let native = self
            .device
            .device
            .swap_chain_back_buffer(self.native, index, ty)
            .call("GetBackBuffer")?;
        self.device.wrap_queried(native)
    }
}
