// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]

use ash::khr::{surface, swapchain};
use ash::{vk, Entry};
use prism_core::{Error, Result};
use prism_render::artifacts::{FRAGMENT_SHADER, VERTEX_SHADER};
use prism_render::{
    build_pipeline, resolve_queue_indices, select_adapter, CommandRecorder, EmbeddedShaderStore,
    FrameSynchronizer, RenderSettings, Renderer, Resource, ShaderStore, SurfaceTarget,
};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use tracing::{info, warn};

mod chain;
mod context;
mod frame;
mod pipeline;

use chain::PresentationChain;
use context::{
    create_device, create_instance, create_native_surface, queue_family_support, DeviceContext,
    GpuHandles, GpuOwner, VkProbe, REQUIRED_DEVICE_EXTENSIONS,
};
use frame::{create_command_buffer, create_frame_sync, VkFrame};
use pipeline::VkPipelineFactory;

/// The triangle shaders compiled by the build script.
pub fn embedded_shaders() -> EmbeddedShaderStore {
    EmbeddedShaderStore::new()
        .with(
            VERTEX_SHADER,
            include_bytes!(concat!(env!("OUT_DIR"), "/triangle.vert.spv")),
        )
        .with(
            FRAGMENT_SHADER,
            include_bytes!(concat!(env!("OUT_DIR"), "/triangle.frag.spv")),
        )
}

pub struct VkRenderer {
    // Owns every handle below; released in reverse creation order on drop.
    gpu: GpuOwner,
    device: ash::Device,
    swapchain_loader: swapchain::Device,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
    chain: PresentationChain,
    recorder: CommandRecorder,
    frames: FrameSynchronizer,
}

impl VkRenderer {
    pub fn frames_submitted(&self) -> u64 {
        self.frames.frames_submitted()
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.chain.extent
    }

    pub fn tracked_objects(&self) -> usize {
        self.gpu.stack.len()
    }
}

unsafe fn build_renderer(
    target: &dyn SurfaceTarget,
    settings: &RenderSettings,
    shaders: &dyn ShaderStore,
) -> Result<VkRenderer> {
    let entry = Entry::linked();

    let dh: RawDisplayHandle = target
        .display_handle()
        .map_err(|e| Error::WindowHandle(e.to_string()))?
        .as_raw();
    let wh: RawWindowHandle = target
        .window_handle()
        .map_err(|e| Error::WindowHandle(e.to_string()))?
        .as_raw();

    let instance = unsafe { create_instance(&entry, dh, &settings.app_name)? };
    let surface_loader = surface::Instance::new(&entry, &instance);

    // From here on, an early return releases whatever was pushed so far.
    let mut gpu = GpuOwner::new(GpuHandles {
        entry,
        instance,
        surface_loader,
        device: None,
        swapchain_loader: None,
    });

    let surface = unsafe { create_native_surface(&gpu.handles, dh, wh)? };
    gpu.stack.push(Resource::Surface(surface));

    // Adapter
    let adapters = unsafe { gpu.handles.instance.enumerate_physical_devices() }
        .unwrap_or_else(|e| {
            warn!("enumerate_physical_devices: {:?}", e);
            Vec::new()
        });
    let probe = VkProbe {
        instance: &gpu.handles.instance,
        surface_loader: &gpu.handles.surface_loader,
        surface,
    };
    let profile = select_adapter(&probe, &adapters, &REQUIRED_DEVICE_EXTENSIONS)?;
    let adapter = profile.handle;
    info!("using adapter {} ({:?})", profile.name, profile.device_type);

    // Queues + device
    let queues = resolve_queue_indices(unsafe {
        queue_family_support(
            &gpu.handles.instance,
            &gpu.handles.surface_loader,
            adapter,
            surface,
        )
    })?;

    let device = unsafe { create_device(&gpu.handles.instance, adapter, queues)? };
    gpu.handles.device = Some(device.clone());
    gpu.stack.push(Resource::Device);

    let graphics_queue = unsafe { device.get_device_queue(queues.graphics, 0) };
    let present_queue = unsafe { device.get_device_queue(queues.present, 0) };

    let swapchain_loader = swapchain::Device::new(&gpu.handles.instance, &device);
    gpu.handles.swapchain_loader = Some(swapchain_loader.clone());

    // Presentation chain
    let ctx = DeviceContext {
        surface_loader: &gpu.handles.surface_loader,
        swapchain_loader: &swapchain_loader,
        device: &device,
        adapter,
        surface,
        queues,
    };
    let chain = unsafe {
        PresentationChain::create(ctx, target.framebuffer_size(), settings, &mut gpu.stack)?
    };

    // Pipeline + framebuffers
    let factory = VkPipelineFactory { device: &device };
    let bundle = build_pipeline(&factory, shaders, chain.format.format, &mut gpu.stack)?;
    let framebuffers =
        unsafe { chain.create_framebuffers(&device, bundle.render_pass, &mut gpu.stack)? };

    // Commands + sync
    let cmd = unsafe { create_command_buffer(&device, queues.graphics, &mut gpu.stack)? };
    let sync = unsafe { create_frame_sync(&device, &mut gpu.stack)? };

    let recorder = CommandRecorder {
        render_pass: bundle.render_pass,
        pipeline: bundle.pipeline,
        framebuffers,
        extent: chain.extent,
        clear_color: settings.clear_color,
    };

    Ok(VkRenderer {
        gpu,
        device,
        swapchain_loader,
        graphics_queue,
        present_queue,
        chain,
        recorder,
        frames: FrameSynchronizer::new(sync, cmd),
    })
}

impl Renderer for VkRenderer {
    fn new(
        target: &dyn SurfaceTarget,
        settings: &RenderSettings,
        shaders: &dyn ShaderStore,
    ) -> Result<Self> {
        let r = unsafe { build_renderer(target, settings, shaders)? };
        info!(
            "renderer ready ({}x{}, {} objects tracked)",
            r.chain.extent.width,
            r.chain.extent.height,
            r.tracked_objects()
        );
        Ok(r)
    }

    fn render(&mut self) -> Result<()> {
        let frame = VkFrame {
            device: &self.device,
            swapchain_loader: &self.swapchain_loader,
            swapchain: self.chain.swapchain,
            graphics_queue: self.graphics_queue,
            present_queue: self.present_queue,
        };
        self.frames.draw_frame(&frame, &self.recorder)?;
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe { self.device.device_wait_idle() }
            .map_err(|e| Error::FenceWaitFailed(format!("device idle: {e:?}")))
    }
}
