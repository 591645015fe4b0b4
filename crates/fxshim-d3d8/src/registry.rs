//! Mapping between the wrapper handles given to the application and native objects.
//!
//! The registry keeps at most one wrapper per native pointer. Each wrapper carries its own
//! reference count which mirrors, 1:1, the native references the application received through
//! it: wrapping an already-known pointer bumps the count instead of minting a second handle.
//!
//! There is no internal locking; the owning device serialises access.

use std::fmt;
use std::num::NonZeroU32;

use hashbrown::HashMap;
use thiserror::Error;
use tracing::{debug, trace};

use crate::d3d9::{NativePtr, ObjectRefs, ResourceType, Usage};

/// Type discriminator carried by every wrapper.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Surface,
    Volume,
    Texture,
    VolumeTexture,
    CubeTexture,
    VertexBuffer,
    IndexBuffer,
    SwapChain,
}

impl ResourceKind {
    pub fn from_resource_type(ty: ResourceType) -> Option<Self> {
        let kind = match ty {
            ResourceType::SURFACE => ResourceKind::Surface,
            ResourceType::VOLUME => ResourceKind::Volume,
            ResourceType::TEXTURE => ResourceKind::Texture,
            ResourceType::VOLUMETEXTURE => ResourceKind::VolumeTexture,
            ResourceType::CUBETEXTURE => ResourceKind::CubeTexture,
            ResourceType::VERTEXBUFFER => ResourceKind::VertexBuffer,
            ResourceType::INDEXBUFFER => ResourceKind::IndexBuffer,
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Surface => "surface",
            ResourceKind::Volume => "volume",
            ResourceKind::Texture => "texture",
            ResourceKind::VolumeTexture => "volume_texture",
            ResourceKind::CubeTexture => "cube_texture",
            ResourceKind::VertexBuffer => "vertex_buffer",
            ResourceKind::IndexBuffer => "index_buffer",
            ResourceKind::SwapChain => "swap_chain",
        }
    }

    pub fn is_base_texture(self) -> bool {
        matches!(
            self,
            ResourceKind::Texture | ResourceKind::VolumeTexture | ResourceKind::CubeTexture
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Handle handed to the application in place of a native interface pointer.
///
/// Handles are never reused within one registry, so a stale handle cannot alias a newer object.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WrapperHandle(NonZeroU32);

impl WrapperHandle {
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Debug for WrapperHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WrapperHandle({})", self.0)
    }
}

impl fmt::Display for WrapperHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown wrapper handle {0}")]
    UnknownHandle(WrapperHandle),
    #[error("wrapper {handle} is a {actual}, expected {expected}")]
    KindMismatch {
        handle: WrapperHandle,
        expected: &'static str,
        actual: ResourceKind,
    },
    #[error("native object {native} is already wrapped as a {existing}, not a {requested}")]
    ConflictingKind {
        native: NativePtr,
        existing: ResourceKind,
        requested: ResourceKind,
    },
    #[error("wrapper handle space exhausted")]
    Exhausted,
}

/// What the application asked for when it created the resource.
///
/// Creation may silently add capabilities (render-target promotion); descriptions returned to the
/// application report `requested_usage` instead of what the native object ended up with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Origin {
    pub requested_usage: Usage,
    pub promoted: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WrapperInfo {
    pub native: NativePtr,
    pub kind: ResourceKind,
    pub refs: u32,
    pub origin: Option<Origin>,
}

#[derive(Debug, Default)]
pub struct ResourceRegistry {
    by_native: HashMap<NativePtr, WrapperHandle>,
    entries: HashMap<WrapperHandle, WrapperInfo>,
    next_id: u32,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or retrieves the wrapper for `native`, accounting for one native reference the
    /// caller already holds.
    pub fn wrap(&mut self, native: NativePtr, kind: ResourceKind) -> Result<WrapperHandle, RegistryError> {
        if let Some(&handle) = self.by_native.get(&native) {
            let entry = self
                .entries
                .get_mut(&handle)
                .ok_or(RegistryError::UnknownHandle(handle))?;
            if entry.kind != kind {
                return Err(RegistryError::ConflictingKind {
                    native,
                    existing: entry.kind,
                    requested: kind,
                });
            }
            entry.refs += 1;
            trace!(handle = %handle, refs = entry.refs, "rewrapped native object");
            return Ok(handle);
        }

        self.next_id = self.next_id.checked_add(1).ok_or(RegistryError::Exhausted)?;
        let handle = WrapperHandle(NonZeroU32::new(self.next_id).ok_or(RegistryError::Exhausted)?);
        self.entries.insert(
            handle,
            WrapperInfo {
                native,
                kind,
                refs: 1,
                origin: None,
            },
        );
        self.by_native.insert(native, handle);
        debug!(handle = %handle, native = %native, kind = %kind, "wrapped native object");
        Ok(handle)
    }

    /// Like [`wrap`](Self::wrap), recording how the object was created.
    pub fn wrap_created(
        &mut self,
        native: NativePtr,
        kind: ResourceKind,
        origin: Origin,
    ) -> Result<WrapperHandle, RegistryError> {
        let handle = self.wrap(native, kind)?;
        self.set_origin(handle, origin)?;
        Ok(handle)
    }

    pub fn set_origin(&mut self, handle: WrapperHandle, origin: Origin) -> Result<(), RegistryError> {
        let entry = self
            .entries
            .get_mut(&handle)
            .ok_or(RegistryError::UnknownHandle(handle))?;
        entry.origin = Some(origin);
        Ok(())
    }

    pub fn unwrap(&self, handle: WrapperHandle) -> Option<NativePtr> {
        self.entries.get(&handle).map(|e| e.native)
    }

    pub fn info(&self, handle: WrapperHandle) -> Option<&WrapperInfo> {
        self.entries.get(&handle)
    }

    pub fn lookup(&self, native: NativePtr) -> Option<WrapperHandle> {
        self.by_native.get(&native).copied()
    }

    /// Resolves `handle`, checking that it denotes a `kind`.
    pub fn checked(&self, handle: WrapperHandle, kind: ResourceKind) -> Result<NativePtr, RegistryError> {
        let entry = self.entries.get(&handle).ok_or(RegistryError::UnknownHandle(handle))?;
        if entry.kind != kind {
            return Err(RegistryError::KindMismatch {
                handle,
                expected: kind.name(),
                actual: entry.kind,
            });
        }
        Ok(entry.native)
    }

    /// Resolves a handle that may denote any texture kind.
    pub fn checked_base_texture(&self, handle: WrapperHandle) -> Result<(NativePtr, ResourceKind), RegistryError> {
        let entry = self.entries.get(&handle).ok_or(RegistryError::UnknownHandle(handle))?;
        if !entry.kind.is_base_texture() {
            return Err(RegistryError::KindMismatch {
                handle,
                expected: "base texture",
                actual: entry.kind,
            });
        }
        Ok((entry.native, entry.kind))
    }

    pub fn add_ref(&mut self, handle: WrapperHandle, api: &impl ObjectRefs) -> Result<u32, RegistryError> {
        let entry = self
            .entries
            .get_mut(&handle)
            .ok_or(RegistryError::UnknownHandle(handle))?;
        api.add_ref_object(entry.native);
        entry.refs += 1;
        Ok(entry.refs)
    }

    /// Drops one reference. At zero the entry is removed; the native reference is released in
    /// every case.
    pub fn release(&mut self, handle: WrapperHandle, api: &impl ObjectRefs) -> Result<u32, RegistryError> {
        let entry = self
            .entries
            .get_mut(&handle)
            .ok_or(RegistryError::UnknownHandle(handle))?;
        let native = entry.native;
        entry.refs -= 1;
        let refs = entry.refs;
        let native_refs = api.release_object(native);
        if refs == 0 {
            self.entries.remove(&handle);
            self.by_native.remove(&native);
            debug!(handle = %handle, native = %native, native_refs, "released wrapper");
        }
        Ok(refs)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (WrapperHandle, &WrapperInfo)> {
        self.entries.iter().map(|(h, e)| (*h, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Counts(RefCell<HashMap<NativePtr, u32>>);

    impl Counts {
        fn hold(&self, p: NativePtr) {
            *self.0.borrow_mut().entry(p).or_insert(0) += 1;
        }

        fn get(&self, p: NativePtr) -> u32 {
            self.0.borrow().get(&p).copied().unwrap_or(0)
        }
    }

    impl ObjectRefs for Counts {
        fn add_ref_object(&self, object: NativePtr) -> u32 {
            let mut map = self.0.borrow_mut();
            let n = map.entry(object).or_insert(0);
            *n += 1;
            *n
        }

        fn release_object(&self, object: NativePtr) -> u32 {
            let mut map = self.0.borrow_mut();
            let n = map.entry(object).or_insert(1);
            *n -= 1;
            *n
        }
    }

    fn ptr(addr: usize) -> NativePtr {
        NativePtr::new(addr).unwrap()
    }

    #[test]
    fn wrap_is_idempotent_until_released() {
        let mut reg = ResourceRegistry::new();
        let p = ptr(0x1000);
        let a = reg.wrap(p, ResourceKind::Surface).unwrap();
        let b = reg.wrap(p, ResourceKind::Surface).unwrap();
        assert_eq!(a, b);
        assert_eq!(reg.unwrap(a), Some(p));
        assert_eq!(reg.info(a).unwrap().refs, 2);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn release_to_zero_removes_entry_and_native_ref() {
        let counts = Counts::default();
        let mut reg = ResourceRegistry::new();
        let p = ptr(0x2000);
        counts.hold(p);
        let h = reg.wrap(p, ResourceKind::Texture).unwrap();
        counts.hold(p);
        reg.wrap(p, ResourceKind::Texture).unwrap();

        assert_eq!(reg.release(h, &counts).unwrap(), 1);
        assert_eq!(counts.get(p), 1);
        assert_eq!(reg.release(h, &counts).unwrap(), 0);
        assert_eq!(counts.get(p), 0);
        assert!(reg.unwrap(h).is_none());
        assert!(reg.lookup(p).is_none());

        // A later observation mints a fresh handle.
        let again = reg.wrap(p, ResourceKind::Texture).unwrap();
        assert_ne!(again, h);
    }

    #[test]
    fn checked_cast_rejects_wrong_kind() {
        let mut reg = ResourceRegistry::new();
        let h = reg.wrap(ptr(0x3000), ResourceKind::VertexBuffer).unwrap();
        assert_eq!(
            reg.checked(h, ResourceKind::Surface),
            Err(RegistryError::KindMismatch {
                handle: h,
                expected: "surface",
                actual: ResourceKind::VertexBuffer,
            })
        );
        assert!(reg.checked_base_texture(h).is_err());
        let t = reg.wrap(ptr(0x4000), ResourceKind::CubeTexture).unwrap();
        assert_eq!(reg.checked_base_texture(t).unwrap().1, ResourceKind::CubeTexture);
    }

    #[test]
    fn conflicting_kind_is_rejected() {
        let mut reg = ResourceRegistry::new();
        let p = ptr(0x5000);
        reg.wrap(p, ResourceKind::Surface).unwrap();
        assert!(matches!(
            reg.wrap(p, ResourceKind::Texture),
            Err(RegistryError::ConflictingKind { .. })
        ));
    }
}
