// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{CStr, CString};

use ash::khr::{surface, swapchain};
use ash::{vk, Entry, Instance};
use prism_core::{Error, Result};
use prism_render::{
    AdapterProfile, CapabilityProbe, Destroyer, QueueFamilySupport, ReleaseStack, Resource,
    ResolvedQueues, SurfaceSupport,
};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use tracing::{debug, warn};

pub(crate) const REQUIRED_DEVICE_EXTENSIONS: [&CStr; 1] = [swapchain::NAME];

/// Loaders needed to destroy anything we create. The device side is filled in
/// once the logical device exists.
pub(crate) struct GpuHandles {
    pub entry: Entry,
    pub instance: Instance,
    pub surface_loader: surface::Instance,
    pub device: Option<ash::Device>,
    pub swapchain_loader: Option<swapchain::Device>,
}

impl Destroyer for GpuHandles {
    fn destroy(&self, resource: Resource) {
        unsafe {
            match resource {
                Resource::Instance => self.instance.destroy_instance(None),
                Resource::Surface(s) => self.surface_loader.destroy_surface(s, None),
                Resource::Swapchain(sc) => match &self.swapchain_loader {
                    Some(l) => l.destroy_swapchain(sc, None),
                    None => warn!("swapchain {:?} outlived its loader", sc),
                },
                other => {
                    let Some(d) = &self.device else {
                        warn!("{:?} outlived its device", other);
                        return;
                    };
                    match other {
                        Resource::Device => d.destroy_device(None),
                        Resource::ImageView(v) => d.destroy_image_view(v, None),
                        Resource::RenderPass(rp) => d.destroy_render_pass(rp, None),
                        Resource::Framebuffer(fb) => d.destroy_framebuffer(fb, None),
                        Resource::PipelineLayout(l) => d.destroy_pipeline_layout(l, None),
                        Resource::Pipeline(p) => d.destroy_pipeline(p, None),
                        Resource::CommandPool(p) => d.destroy_command_pool(p, None),
                        Resource::Semaphore(s) => d.destroy_semaphore(s, None),
                        Resource::Fence(f) => d.destroy_fence(f, None),
                        Resource::Instance | Resource::Surface(_) | Resource::Swapchain(_) => {}
                    }
                }
            }
        }
    }
}

/// Owns every GPU object through its release stack. Dropping it (also halfway
/// through bring-up) idles the device and destroys in reverse creation order.
pub(crate) struct GpuOwner {
    pub handles: GpuHandles,
    pub stack: ReleaseStack,
}

impl GpuOwner {
    pub fn new(handles: GpuHandles) -> Self {
        let mut stack = ReleaseStack::default();
        stack.push(Resource::Instance);
        Self { handles, stack }
    }
}

impl Drop for GpuOwner {
    fn drop(&mut self) {
        if let Some(d) = &self.handles.device {
            unsafe { d.device_wait_idle().ok() };
        }
        self.stack.release_all(&self.handles);
        debug!("gpu objects released");
    }
}

/// Read-only view of the bring-up state each component is built from.
#[derive(Clone, Copy)]
pub(crate) struct DeviceContext<'a> {
    pub surface_loader: &'a surface::Instance,
    pub swapchain_loader: &'a swapchain::Device,
    pub device: &'a ash::Device,
    pub adapter: vk::PhysicalDevice,
    pub surface: vk::SurfaceKHR,
    pub queues: ResolvedQueues,
}

pub(crate) unsafe fn create_instance(
    entry: &Entry,
    display_raw: RawDisplayHandle,
    app_name: &str,
) -> Result<Instance> {
    let app_name = CString::new(app_name)
        .map_err(|e| Error::InstanceCreationFailed(format!("application name: {e}")))?;

    let app_info = vk::ApplicationInfo {
        s_type: vk::StructureType::APPLICATION_INFO,
        p_application_name: app_name.as_ptr(),
        application_version: 0,
        p_engine_name: app_name.as_ptr(),
        engine_version: 0,
        api_version: vk::API_VERSION_1_0,
        ..Default::default()
    };

    let ext_slice = ash_window::enumerate_required_extensions(display_raw)
        .map_err(|e| Error::InstanceCreationFailed(format!("required extensions: {e:?}")))?;

    let create_info = vk::InstanceCreateInfo {
        s_type: vk::StructureType::INSTANCE_CREATE_INFO,
        p_application_info: &app_info,
        enabled_extension_count: ext_slice.len() as u32,
        pp_enabled_extension_names: ext_slice.as_ptr(),
        ..Default::default()
    };

    unsafe { entry.create_instance(&create_info, None) }
        .map_err(|e| Error::InstanceCreationFailed(format!("{e:?}")))
}

pub(crate) unsafe fn create_native_surface(
    handles: &GpuHandles,
    display_raw: RawDisplayHandle,
    window_raw: RawWindowHandle,
) -> Result<vk::SurfaceKHR> {
    unsafe {
        ash_window::create_surface(
            &handles.entry,
            &handles.instance,
            display_raw,
            window_raw,
            None,
        )
    }
    .map_err(|e| Error::SurfaceCreationFailed(format!("{e:?}")))
}

pub(crate) unsafe fn query_surface_support(
    surface_loader: &surface::Instance,
    adapter: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
) -> Result<SurfaceSupport, vk::Result> {
    unsafe {
        Ok(SurfaceSupport {
            capabilities: surface_loader
                .get_physical_device_surface_capabilities(adapter, surface)?,
            formats: surface_loader.get_physical_device_surface_formats(adapter, surface)?,
            present_modes: surface_loader
                .get_physical_device_surface_present_modes(adapter, surface)?,
        })
    }
}

pub(crate) struct VkProbe<'a> {
    pub instance: &'a Instance,
    pub surface_loader: &'a surface::Instance,
    pub surface: vk::SurfaceKHR,
}

impl CapabilityProbe for VkProbe<'_> {
    fn probe(&self, adapter: vk::PhysicalDevice) -> AdapterProfile {
        let props = unsafe { self.instance.get_physical_device_properties(adapter) };
        let name = props
            .device_name_as_c_str()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "<unnamed adapter>".to_owned());

        let extensions = match unsafe { self.instance.enumerate_device_extension_properties(adapter) } {
            Ok(list) => list
                .iter()
                .filter_map(|e| e.extension_name_as_c_str().ok().map(CStr::to_owned))
                .collect(),
            Err(e) => {
                warn!("{}: extension query failed: {:?}", name, e);
                Vec::new()
            }
        };

        let surface = unsafe { query_surface_support(self.surface_loader, adapter, self.surface) }
            .unwrap_or_else(|e| {
                warn!("{}: surface query failed: {:?}", name, e);
                SurfaceSupport::default()
            });

        AdapterProfile {
            handle: adapter,
            name,
            device_type: props.device_type,
            extensions,
            surface,
        }
    }
}

/// Lazily probes presentation support, one family at a time.
pub(crate) unsafe fn queue_family_support<'a>(
    instance: &Instance,
    surface_loader: &'a surface::Instance,
    adapter: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
) -> impl Iterator<Item = QueueFamilySupport> + 'a {
    let families = unsafe { instance.get_physical_device_queue_family_properties(adapter) };
    families
        .into_iter()
        .enumerate()
        .map(move |(i, family)| QueueFamilySupport {
            graphics: family.queue_flags.contains(vk::QueueFlags::GRAPHICS),
            present: unsafe {
                surface_loader.get_physical_device_surface_support(adapter, i as u32, surface)
            }
            .unwrap_or(false),
        })
}

pub(crate) unsafe fn create_device(
    instance: &Instance,
    adapter: vk::PhysicalDevice,
    queues: ResolvedQueues,
) -> Result<ash::Device> {
    let priorities = [1.0_f32];
    let queue_infos: Vec<vk::DeviceQueueCreateInfo> = queues
        .unique_families()
        .into_iter()
        .map(|family| vk::DeviceQueueCreateInfo {
            s_type: vk::StructureType::DEVICE_QUEUE_CREATE_INFO,
            queue_family_index: family,
            queue_count: 1,
            p_queue_priorities: priorities.as_ptr(),
            ..Default::default()
        })
        .collect();

    let device_exts: Vec<_> = REQUIRED_DEVICE_EXTENSIONS.iter().map(|e| e.as_ptr()).collect();
    // No optional features requested.
    let features = vk::PhysicalDeviceFeatures::default();

    let dinfo = vk::DeviceCreateInfo {
        s_type: vk::StructureType::DEVICE_CREATE_INFO,
        queue_create_info_count: queue_infos.len() as u32,
        p_queue_create_infos: queue_infos.as_ptr(),
        enabled_extension_count: device_exts.len() as u32,
        pp_enabled_extension_names: device_exts.as_ptr(),
        p_enabled_features: &features,
        ..Default::default()
    };

    unsafe { instance.create_device(adapter, &dinfo, None) }
        .map_err(|e| Error::DeviceCreationFailed(format!("{e:?}")))
}
