mod common;

use fxshim_d3d8::d3d9::{CubeMapFace, Format, LockFlags, MultiSampleType, Pool, Usage};
use fxshim_d3d8::{NoHook, Origin, ShimConfig, ShimError};
use pretty_assertions::assert_eq;

#[test]
fn textures_are_promoted_to_render_targets_when_possible() {
    let (native, mut device) = common::device();
    let texture = device
        .create_texture(256, 256, 1, Usage::empty(), Format::A8R8G8B8, Pool::DEFAULT)
        .unwrap();

    let native_ptr = device.registry().unwrap(texture).unwrap();
    assert!(native.state().object(native_ptr).unwrap().usage.contains(Usage::RENDERTARGET));
    assert_eq!(
        device.registry().info(texture).and_then(|i| i.origin),
        Some(Origin {
            requested_usage: Usage::empty(),
            promoted: true,
        })
    );

    // The application still sees the texture it asked for.
    let desc = device.as_texture(texture).unwrap().level_desc(0).unwrap();
    assert_eq!(desc.usage, Usage::empty());
    assert_eq!(desc.size, 256 * 256 * 4);
}

#[test]
fn rejected_promotion_retries_with_the_requested_usage() {
    let (native, mut device) = common::device();
    native.state_mut().reject_render_target_textures = true;

    let texture = device
        .create_texture(64, 64, 1, Usage::empty(), Format::A8R8G8B8, Pool::DEFAULT)
        .expect("retry without RENDERTARGET must succeed");

    assert_eq!(native.state().count_calls("CreateTexture"), 2);
    let native_ptr = device.registry().unwrap(texture).unwrap();
    assert_eq!(native.state().object(native_ptr).unwrap().usage, Usage::empty());
    assert_eq!(
        device.registry().info(texture).and_then(|i| i.origin).map(|o| o.promoted),
        Some(false)
    );
}

#[test]
fn promotion_can_be_disabled() {
    let config = ShimConfig {
        promote_render_targets: false,
    };
    let (native, mut device) = common::device_with(config, NoHook);
    device
        .create_texture(64, 64, 1, Usage::empty(), Format::A8R8G8B8, Pool::DEFAULT)
        .unwrap();
    assert_eq!(native.state().count_calls("CreateTexture"), 1);
    assert!(native
        .state()
        .objects
        .values()
        .all(|o| o.implicit || !o.usage.contains(Usage::RENDERTARGET)));
}

#[test]
fn depth_textures_are_never_promoted() {
    let (native, mut device) = common::device();
    device
        .create_texture(64, 64, 1, Usage::DEPTHSTENCIL, Format::D24S8, Pool::DEFAULT)
        .unwrap();
    assert_eq!(native.state().count_calls("CreateTexture"), 1);
}

#[test]
fn sub_surfaces_report_their_parent_origin() {
    let (_native, mut device) = common::device();
    let cube = device
        .create_cube_texture(32, 2, Usage::empty(), Format::A8R8G8B8, Pool::DEFAULT)
        .unwrap();
    let face = device
        .as_cube_texture(cube)
        .unwrap()
        .cube_map_surface(CubeMapFace::NEGATIVE_Y, 1)
        .unwrap();

    let mut surface = device.as_surface(face).unwrap();
    let desc = surface.desc().unwrap();
    assert_eq!((desc.width, desc.height), (16, 16));
    assert_eq!(desc.usage, Usage::empty());
    assert_eq!(surface.container().unwrap(), cube);
}

#[test]
fn failed_creation_leaves_no_wrapper() {
    let (native, mut device) = common::device();
    let err = device
        .create_texture(0, 64, 1, Usage::empty(), Format::A8R8G8B8, Pool::MANAGED)
        .unwrap_err();
    assert!(matches!(err, ShimError::Native { call: "CreateTexture", .. }));
    assert!(device.registry().is_empty());

    let err = device
        .create_texture(64, 64, 1, Usage::empty(), Format::A16B16G16R16F, Pool::MANAGED)
        .unwrap_err();
    assert!(matches!(err, ShimError::Untranslatable { what: "format", .. }));
    assert_eq!(native.state().live_objects(), 0);
}

#[test]
fn image_surfaces_live_in_system_memory() {
    let (native, mut device) = common::device();
    let image = device.create_image_surface(32, 32, Format::X8R8G8B8).unwrap();
    let surface = device.as_surface(image).unwrap();
    let desc = surface.desc().unwrap();
    assert_eq!(desc.pool, Pool::SYSTEMMEM);

    let locked = surface.lock_rect(None, LockFlags::empty()).unwrap();
    assert_eq!(locked.pitch, 128);
    assert!(surface.lock_rect(None, LockFlags::empty()).is_err());
    surface.unlock_rect().unwrap();
    assert_eq!(native.state().count_calls("CreateOffscreenPlainSurface"), 1);
}

#[test]
fn copy_rects_picks_the_native_copy_by_pool() {
    let (native, mut device) = common::device();
    let system = device.create_image_surface(64, 64, Format::X8R8G8B8).unwrap();
    let target = device
        .create_render_target(64, 64, Format::X8R8G8B8, MultiSampleType::NONE, false)
        .unwrap();
    let other = device
        .create_render_target(64, 64, Format::X8R8G8B8, MultiSampleType::NONE, false)
        .unwrap();

    device.copy_rects(system, &[], target, &[]).unwrap();
    device.copy_rects(target, &[], other, &[]).unwrap();
    device.copy_rects(target, &[], system, &[]).unwrap();

    let copies: Vec<_> = native.state().copies.iter().map(|c| c.0).collect();
    assert_eq!(copies, vec!["UpdateSurface", "StretchRect", "GetRenderTargetData"]);

    let mismatched = device
        .create_render_target(64, 64, Format::R5G6B5, MultiSampleType::NONE, false)
        .unwrap();
    let err = device.copy_rects(target, &[], mismatched, &[]).unwrap_err();
    assert!(matches!(err, ShimError::InvalidArgument(_)));
}

#[test]
fn volume_textures_are_created_as_requested() {
    let (native, mut device) = common::device();
    let volume = device
        .create_volume_texture(16, 16, 4, 0, Usage::empty(), Format::A8R8G8B8, Pool::MANAGED)
        .unwrap();
    assert_eq!(native.state().count_calls("CreateVolumeTexture"), 1);

    let mut view = device.as_volume_texture(volume).unwrap();
    assert_eq!(view.level_count(), 5);
    let desc = view.level_desc(1).unwrap();
    assert_eq!((desc.width, desc.height, desc.depth), (8, 8, 2));
    assert_eq!(desc.size, 8 * 8 * 2 * 4);
    let slice = view.volume_level(1).unwrap();
    assert_eq!(device.as_volume(slice).unwrap().desc().unwrap().depth, 2);
}
