//! Legacy factory shim.

use tracing::{debug, info, warn};

use crate::config::ShimConfig;
use crate::d3d8::{self, SDK_VERSION};
use crate::d3d9::{DeviceType, Direct3D, DisplayMode, Format, MultiSampleType, ResourceType, Usage, WindowHandle};
use crate::error::{NativeContext, ShimError, ShimResult};
use crate::shim::device8::Device8;
use crate::shim::hook::FrameHook;
use crate::shim::slot::RefCounted;
use crate::translate::{self, LEGACY_DISPLAY_FORMATS};

/// SDK version requested from the native factory.
pub const NATIVE_SDK_VERSION: u32 = 32;

/// Wraps the native factory and presents the legacy factory interface.
#[derive(Debug)]
pub struct Direct3D8<F: Direct3D> {
    native: F,
    config: ShimConfig,
}

impl<F: Direct3D> Direct3D8<F> {
    /// Replacement for the legacy creation entry point.
    ///
    /// `create_native` is the native creation entry point; it receives the native SDK version.
    pub fn create(
        sdk_version: u32,
        config: ShimConfig,
        create_native: impl FnOnce(u32) -> Option<F>,
    ) -> ShimResult<Self> {
        if sdk_version != SDK_VERSION {
            warn!(sdk_version, expected = SDK_VERSION, "rejecting unexpected SDK version");
            return Err(ShimError::InvalidArgument("unsupported SDK version"));
        }
        let native = create_native(NATIVE_SDK_VERSION).ok_or(ShimError::Native {
            call: "Direct3DCreate9",
            hr: crate::HResult::E_FAIL,
        })?;
        info!(native = %native.identity(), "created Direct3D 8 factory shim");
        Ok(Self { native, config })
    }

    pub fn native(&self) -> &F {
        &self.native
    }

    pub fn register_software_device(&self) -> ShimResult<()> {
        Err(ShimError::unsupported("RegisterSoftwareDevice"))
    }

    pub fn adapter_count(&self) -> u32 {
        self.native.adapter_count()
    }

    pub fn adapter_identifier(&self, adapter: u32, flags: u32) -> ShimResult<d3d8::AdapterIdentifier> {
        let id = self
            .native
            .adapter_identifier(adapter, flags)
            .call("GetAdapterIdentifier")?;
        Ok(d3d8::AdapterIdentifier::from(&id))
    }

    /// Modes across every legacy display format; the legacy call takes no format.
    pub fn adapter_mode_count(&self, adapter: u32) -> u32 {
        LEGACY_DISPLAY_FORMATS
            .iter()
            .map(|format| self.native.adapter_mode_count(adapter, *format))
            .sum()
    }

    pub fn enum_adapter_modes(&self, adapter: u32, mode: u32) -> ShimResult<DisplayMode> {
        let mut remaining = mode;
        for format in LEGACY_DISPLAY_FORMATS {
            let count = self.native.adapter_mode_count(adapter, format);
            if remaining < count {
                return self
                    .native
                    .enum_adapter_modes(adapter, format, remaining)
                    .call("EnumAdapterModes");
            }
            remaining -= count;
        }
        Err(ShimError::InvalidArgument("adapter mode index out of range"))
    }

    pub fn adapter_display_mode(&self, adapter: u32) -> ShimResult<DisplayMode> {
        self.native.adapter_display_mode(adapter).call("GetAdapterDisplayMode")
    }

    pub fn check_device_type(
        &self,
        adapter: u32,
        device_type: DeviceType,
        display_format: Format,
        back_buffer_format: Format,
        windowed: bool,
    ) -> ShimResult<()> {
        self.native
            .check_device_type(
                adapter,
                device_type,
                translate::format_to_d3d9(display_format)?,
                translate::format_to_d3d9(back_buffer_format)?,
                windowed,
            )
            .call("CheckDeviceType")
    }

    pub fn check_device_format(
        &self,
        adapter: u32,
        device_type: DeviceType,
        adapter_format: Format,
        usage: Usage,
        resource_type: ResourceType,
        check_format: Format,
    ) -> ShimResult<()> {
        self.native
            .check_device_format(
                adapter,
                device_type,
                translate::format_to_d3d9(adapter_format)?,
                usage,
                resource_type,
                translate::format_to_d3d9(check_format)?,
            )
            .call("CheckDeviceFormat")
    }

    pub fn check_device_multi_sample_type(
        &self,
        adapter: u32,
        device_type: DeviceType,
        surface_format: Format,
        windowed: bool,
        multi_sample: MultiSampleType,
    ) -> ShimResult<()> {
        self.native
            .check_device_multi_sample_type(
                adapter,
                device_type,
                translate::format_to_d3d9(surface_format)?,
                windowed,
                multi_sample,
            )
            .map(|_quality_levels| ())
            .call("CheckDeviceMultiSampleType")
    }

    pub fn check_depth_stencil_match(
        &self,
        adapter: u32,
        device_type: DeviceType,
        adapter_format: Format,
        render_target_format: Format,
        depth_stencil_format: Format,
    ) -> ShimResult<()> {
        self.native
            .check_depth_stencil_match(
                adapter,
                device_type,
                translate::format_to_d3d9(adapter_format)?,
                translate::format_to_d3d9(render_target_format)?,
                translate::format_to_d3d9(depth_stencil_format)?,
            )
            .call("CheckDepthStencilMatch")
    }

    pub fn device_caps(&self, adapter: u32, device_type: DeviceType) -> ShimResult<d3d8::Caps> {
        let caps = self.native.device_caps(adapter, device_type).call("GetDeviceCaps")?;
        Ok(translate::caps_from_d3d9(&caps))
    }

    pub fn adapter_monitor(&self, adapter: u32) -> usize {
        self.native.adapter_monitor(adapter)
    }

    /// Creates the native device and wraps it. `params` is updated with whatever the native
    /// runtime filled in.
    pub fn create_device<H: FrameHook<F::Device>>(
        &self,
        adapter: u32,
        device_type: DeviceType,
        focus_window: WindowHandle,
        behavior_flags: u32,
        params: &mut d3d8::PresentParameters,
        hook: H,
    ) -> ShimResult<Device8<F::Device, H>> {
        let mut native_params = translate::present_parameters_to_d3d9(params)?;
        let device = self
            .native
            .create_device(adapter, device_type, focus_window, behavior_flags, &mut native_params)
            .call("CreateDevice")?;
        translate::present_parameters_from_d3d9(&native_params, params);
        debug!(
            width = native_params.back_buffer_width,
            height = native_params.back_buffer_height,
            windowed = native_params.windowed,
            "created native device"
        );
        Ok(Device8::new(
            device,
            self.native.identity(),
            hook,
            self.config,
            &native_params,
        ))
    }
}

impl<F: Direct3D> RefCounted for Direct3D8<F> {
    fn add_ref(&mut self) -> u32 {
        self.native.add_ref()
    }

    fn release(&mut self) -> u32 {
        self.native.release()
    }
}
