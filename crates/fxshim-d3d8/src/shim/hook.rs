use crate::d3d9::{Device, Matrix, PresentParameters, TransformState};

/// Observer of device-level events, used to drive per-frame effect rendering.
///
/// Every callback receives the native device; implementations must leave the application's
/// device state as they found it.
pub trait FrameHook<D: Device> {
    /// Whether the hook keeps its own reference to the device. The shim takes that reference on
    /// the hook's behalf and drops it once only internal references remain.
    fn holds_device(&self) -> bool {
        false
    }

    fn device_created(&mut self, _device: &D, _params: &PresentParameters) {}

    fn transform_changed(&mut self, _device: &D, _state: TransformState, _matrix: &Matrix) {}

    /// Runs before the frame is handed to the native present.
    fn before_present(&mut self, _device: &D) {}

    /// Default-pool resources must be released here; the native reset fails otherwise.
    fn before_reset(&mut self, _device: &D) {}

    fn after_reset(&mut self, _device: &D, _params: &PresentParameters) {}

    /// The application released its last reference.
    fn device_released(&mut self, _device: &D) {}
}

/// Hook that observes nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHook;

impl<D: Device> FrameHook<D> for NoHook {}
