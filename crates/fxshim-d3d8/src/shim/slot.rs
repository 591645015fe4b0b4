use tracing::debug;

/// An object whose lifetime follows an explicit, COM-style reference count.
pub trait RefCounted {
    fn add_ref(&mut self) -> u32;
    fn release(&mut self) -> u32;
}

/// Owns a [`RefCounted`] shim and destroys it synchronously when its count reaches zero.
///
/// This is the boundary object that stands in for the interface pointer handed to the
/// application: once the count hits zero the slot is empty and every further call on it fails.
#[derive(Debug)]
pub struct ComSlot<T: RefCounted> {
    object: Option<T>,
}

impl<T: RefCounted> ComSlot<T> {
    pub fn new(object: T) -> Self {
        Self { object: Some(object) }
    }

    pub fn get(&self) -> Option<&T> {
        self.object.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.object.as_mut()
    }

    pub fn is_alive(&self) -> bool {
        self.object.is_some()
    }

    pub fn add_ref(&mut self) -> Option<u32> {
        self.object.as_mut().map(RefCounted::add_ref)
    }

    /// Returns the remaining count, or `None` if the object was already destroyed.
    pub fn release(&mut self) -> Option<u32> {
        let refs = self.object.as_mut()?.release();
        if refs == 0 {
            debug!(object = std::any::type_name::<T>(), "reference count reached zero; destroying");
            self.object = None;
        }
        Some(refs)
    }
}
