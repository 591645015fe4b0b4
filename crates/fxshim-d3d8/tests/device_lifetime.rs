mod common;

use std::cell::RefCell;
use std::rc::Rc;

use fxshim_d3d8::d3d9::{BackBufferType, Format, Matrix, Pool, PresentParameters, TransformState, Usage};
use fxshim_d3d8::mock::MockDevice9;
use fxshim_d3d8::{ComSlot, FrameHook, HResult, ResourceKind, ShimConfig, ShimError};
use pretty_assertions::assert_eq;

#[derive(Default)]
struct EventLog(Rc<RefCell<Vec<&'static str>>>);

impl FrameHook<MockDevice9> for EventLog {
    fn holds_device(&self) -> bool {
        true
    }

    fn device_created(&mut self, _device: &MockDevice9, _params: &PresentParameters) {
        self.0.borrow_mut().push("created");
    }

    fn transform_changed(&mut self, _device: &MockDevice9, _state: TransformState, _matrix: &Matrix) {
        self.0.borrow_mut().push("transform");
    }

    fn before_present(&mut self, _device: &MockDevice9) {
        self.0.borrow_mut().push("present");
    }

    fn before_reset(&mut self, _device: &MockDevice9) {
        self.0.borrow_mut().push("before_reset");
    }

    fn after_reset(&mut self, _device: &MockDevice9, _params: &PresentParameters) {
        self.0.borrow_mut().push("after_reset");
    }

    fn device_released(&mut self, _device: &MockDevice9) {
        self.0.borrow_mut().push("released");
    }
}

#[test]
fn internal_reference_is_dropped_with_the_last_application_reference() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let (native, device) = common::device_with(ShimConfig::default(), EventLog(Rc::clone(&events)));
    // One reference for the application, one held on behalf of the hook.
    assert_eq!(native.state().device_refs, 2);

    let mut slot = ComSlot::new(device);
    assert_eq!(slot.add_ref(), Some(3));
    assert_eq!(slot.release(), Some(2));
    assert!(slot.is_alive());

    assert_eq!(slot.release(), Some(0));
    assert!(!slot.is_alive());
    assert_eq!(native.state().device_refs, 0);
    assert_eq!(*events.borrow(), vec!["created", "released"]);
    assert_eq!(slot.release(), None);
}

#[test]
fn hook_sees_frame_and_reset_events_in_order() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let (native, mut device) = common::device_with(ShimConfig::default(), EventLog(Rc::clone(&events)));

    device.set_transform(TransformState::VIEW, &Matrix::IDENTITY).unwrap();
    device.present(None, None, None).unwrap();
    let mut params = common::windowed_params();
    device.reset(&mut params).unwrap();

    assert_eq!(
        *events.borrow(),
        vec!["created", "transform", "present", "before_reset", "after_reset"]
    );
    assert_eq!(native.state().presents, 1);
    assert_eq!(native.state().resets, 1);
}

#[test]
fn render_target_queries_return_the_same_wrapper() {
    let (native, mut device) = common::device();
    let first = device.render_target().unwrap();
    let second = device.render_target().unwrap();
    assert_eq!(first, second);
    assert_eq!(device.registry().info(first).map(|i| i.refs), Some(2));

    let back_buffer = device.back_buffer(0, BackBufferType::MONO).unwrap();
    assert_eq!(back_buffer, first);
    assert_eq!(device.registry().len(), 1);

    for _ in 0..3 {
        device.release_resource(first).unwrap();
    }
    assert!(device.registry().is_empty());
    // The back buffer is owned by the device and survives its wrapper.
    assert!(native.state().back_buffer.is_some());
}

#[test]
fn released_resource_destroys_native_object_and_invalidates_handle() {
    let (native, mut device) = common::device();
    let texture = device
        .create_texture(16, 16, 1, Usage::empty(), Format::A8R8G8B8, Pool::MANAGED)
        .unwrap();
    assert_eq!(native.state().live_objects(), 1);

    assert_eq!(device.add_ref_resource(texture).unwrap(), 2);
    assert_eq!(device.release_resource(texture).unwrap(), 1);
    assert_eq!(device.release_resource(texture).unwrap(), 0);
    assert_eq!(native.state().live_objects(), 0);

    let err = device.set_texture(0, Some(texture)).unwrap_err();
    assert!(matches!(err, ShimError::Registry(_)), "unexpected error: {err:?}");
    assert_eq!(err.hresult(), HResult::INVALIDCALL);
}

#[test]
fn wrappers_are_checked_against_their_kind() {
    let (_native, mut device) = common::device();
    let buffer = device
        .create_vertex_buffer(64, Usage::WRITEONLY, 0, Pool::MANAGED)
        .unwrap();
    assert_eq!(device.registry().info(buffer).map(|i| i.kind), Some(ResourceKind::VertexBuffer));

    assert!(device.set_texture(0, Some(buffer)).is_err());
    assert!(device.set_indices(Some(buffer), 0).is_err());
    assert!(device.as_surface(buffer).is_err());
    assert!(device.set_stream_source(0, Some(buffer), 16).is_ok());
}

#[test]
fn bound_texture_is_rewrapped_with_its_native_kind() {
    let (native, mut device) = common::device();
    let cube = device
        .create_cube_texture(32, 1, Usage::empty(), Format::A8R8G8B8, Pool::MANAGED)
        .unwrap();
    device.set_texture(3, Some(cube)).unwrap();
    assert_eq!(device.texture(3).unwrap(), Some(cube));
    assert_eq!(device.texture(4).unwrap(), None);

    device.release_resource(cube).unwrap();
    assert_eq!(device.registry().info(cube).map(|i| i.refs), Some(1));
    device.release_resource(cube).unwrap();
    assert_eq!(native.state().live_objects(), 0);
}
