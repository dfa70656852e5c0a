// SPDX-License-Identifier: CEPL-1.0
use ash::khr::swapchain;
use ash::vk;
use prism_core::{Error, Result};
use prism_render::{
    CommandSink, FrameBackend, FrameSubmission, FrameSyncState, ReleaseStack, Resource,
};

/// Borrowed device state for one frame. Everything it touches outlives it.
pub(crate) struct VkFrame<'a> {
    pub device: &'a ash::Device,
    pub swapchain_loader: &'a swapchain::Device,
    pub swapchain: vk::SwapchainKHR,
    pub graphics_queue: vk::Queue,
    pub present_queue: vk::Queue,
}

impl FrameBackend for VkFrame<'_> {
    fn wait_for_fence(&self, fence: vk::Fence) -> Result<()> {
        unsafe { self.device.wait_for_fences(&[fence], true, u64::MAX) }
            .map_err(|e| Error::FenceWaitFailed(format!("{e:?}")))
    }

    fn reset_fence(&self, fence: vk::Fence) -> Result<()> {
        unsafe { self.device.reset_fences(&[fence]) }
            .map_err(|e| Error::FenceWaitFailed(format!("reset: {e:?}")))
    }

    fn acquire_next_image(&self, signal: vk::Semaphore) -> Result<u32> {
        match unsafe {
            self.swapchain_loader
                .acquire_next_image(self.swapchain, u64::MAX, signal, vk::Fence::null())
        } {
            Ok((index, false)) => Ok(index),
            Ok((_, true)) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Err(Error::SurfaceOutOfDate),
            Err(e) => Err(Error::AcquireFailed(format!("{e:?}"))),
        }
    }

    fn reset_command_buffer(&self, cmd: vk::CommandBuffer) -> Result<()> {
        unsafe {
            self.device
                .reset_command_buffer(cmd, vk::CommandBufferResetFlags::empty())
        }
        .map_err(|e| Error::BeginRecordFailed(format!("reset: {e:?}")))
    }

    fn submit(&self, submission: &FrameSubmission) -> Result<()> {
        let submit = vk::SubmitInfo {
            s_type: vk::StructureType::SUBMIT_INFO,
            wait_semaphore_count: 1,
            p_wait_semaphores: &submission.wait,
            p_wait_dst_stage_mask: &submission.wait_stage,
            command_buffer_count: 1,
            p_command_buffers: &submission.cmd,
            signal_semaphore_count: 1,
            p_signal_semaphores: &submission.signal,
            ..Default::default()
        };
        unsafe {
            self.device
                .queue_submit(self.graphics_queue, &[submit], submission.fence)
        }
        .map_err(|e| Error::SubmitFailed(format!("{e:?}")))
    }

    fn present(&self, image_index: u32, wait: vk::Semaphore) -> Result<()> {
        let present = vk::PresentInfoKHR {
            s_type: vk::StructureType::PRESENT_INFO_KHR,
            wait_semaphore_count: 1,
            p_wait_semaphores: &wait,
            swapchain_count: 1,
            p_swapchains: &self.swapchain,
            p_image_indices: &image_index,
            ..Default::default()
        };
        match unsafe {
            self.swapchain_loader
                .queue_present(self.present_queue, &present)
        } {
            Ok(false) => Ok(()),
            Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Err(Error::SurfaceOutOfDate),
            Err(e) => Err(Error::PresentFailed(format!("{e:?}"))),
        }
    }
}

impl CommandSink for VkFrame<'_> {
    fn begin(&self, cmd: vk::CommandBuffer) -> Result<()> {
        let begin = vk::CommandBufferBeginInfo {
            s_type: vk::StructureType::COMMAND_BUFFER_BEGIN_INFO,
            ..Default::default()
        };
        unsafe { self.device.begin_command_buffer(cmd, &begin) }
            .map_err(|e| Error::BeginRecordFailed(format!("{e:?}")))
    }

    fn begin_render_pass(
        &self,
        cmd: vk::CommandBuffer,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        area: vk::Rect2D,
        clear_color: [f32; 4],
    ) {
        let clear = vk::ClearValue {
            color: vk::ClearColorValue {
                float32: clear_color,
            },
        };
        let rp_begin = vk::RenderPassBeginInfo {
            s_type: vk::StructureType::RENDER_PASS_BEGIN_INFO,
            render_pass,
            framebuffer,
            render_area: area,
            clear_value_count: 1,
            p_clear_values: &clear,
            ..Default::default()
        };
        unsafe {
            self.device
                .cmd_begin_render_pass(cmd, &rp_begin, vk::SubpassContents::INLINE)
        };
    }

    fn bind_pipeline(&self, cmd: vk::CommandBuffer, pipeline: vk::Pipeline) {
        unsafe {
            self.device
                .cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, pipeline)
        };
    }

    fn set_viewport(&self, cmd: vk::CommandBuffer, viewport: vk::Viewport) {
        unsafe { self.device.cmd_set_viewport(cmd, 0, &[viewport]) };
    }

    fn set_scissor(&self, cmd: vk::CommandBuffer, scissor: vk::Rect2D) {
        unsafe { self.device.cmd_set_scissor(cmd, 0, &[scissor]) };
    }

    fn draw(&self, cmd: vk::CommandBuffer, vertex_count: u32, instance_count: u32) {
        unsafe { self.device.cmd_draw(cmd, vertex_count, instance_count, 0, 0) };
    }

    fn end_render_pass(&self, cmd: vk::CommandBuffer) {
        unsafe { self.device.cmd_end_render_pass(cmd) };
    }

    fn end(&self, cmd: vk::CommandBuffer) -> Result<()> {
        unsafe { self.device.end_command_buffer(cmd) }
            .map_err(|e| Error::EndRecordFailed(format!("{e:?}")))
    }
}

/// Pool on the graphics family plus its single primary buffer. Buffers are
/// reset individually each frame.
pub(crate) unsafe fn create_command_buffer(
    device: &ash::Device,
    graphics_family: u32,
    stack: &mut ReleaseStack,
) -> Result<vk::CommandBuffer> {
    let pool_info = vk::CommandPoolCreateInfo {
        s_type: vk::StructureType::COMMAND_POOL_CREATE_INFO,
        flags: vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
        queue_family_index: graphics_family,
        ..Default::default()
    };
    let pool = unsafe { device.create_command_pool(&pool_info, None) }
        .map_err(|e| Error::CommandPoolCreationFailed(format!("{e:?}")))?;
    stack.push(Resource::CommandPool(pool));

    let alloc = vk::CommandBufferAllocateInfo {
        s_type: vk::StructureType::COMMAND_BUFFER_ALLOCATE_INFO,
        command_pool: pool,
        level: vk::CommandBufferLevel::PRIMARY,
        command_buffer_count: 1,
        ..Default::default()
    };
    let buffers = unsafe { device.allocate_command_buffers(&alloc) }
        .map_err(|e| Error::CommandPoolCreationFailed(format!("allocate: {e:?}")))?;
    buffers
        .into_iter()
        .next()
        .ok_or_else(|| Error::CommandPoolCreationFailed("no command buffer returned".into()))
}

/// The fence starts signaled so the first frame does not block.
pub(crate) unsafe fn create_frame_sync(
    device: &ash::Device,
    stack: &mut ReleaseStack,
) -> Result<FrameSyncState> {
    let sem_info = vk::SemaphoreCreateInfo {
        s_type: vk::StructureType::SEMAPHORE_CREATE_INFO,
        ..Default::default()
    };
    let fence_info = vk::FenceCreateInfo {
        s_type: vk::StructureType::FENCE_CREATE_INFO,
        flags: vk::FenceCreateFlags::SIGNALED,
        ..Default::default()
    };

    let sync_err = |e: vk::Result| Error::SyncObjectCreationFailed(format!("{e:?}"));

    let image_available =
        unsafe { device.create_semaphore(&sem_info, None) }.map_err(sync_err)?;
    stack.push(Resource::Semaphore(image_available));
    let render_finished =
        unsafe { device.create_semaphore(&sem_info, None) }.map_err(sync_err)?;
    stack.push(Resource::Semaphore(render_finished));
    let in_flight = unsafe { device.create_fence(&fence_info, None) }.map_err(sync_err)?;
    stack.push(Resource::Fence(in_flight));

    Ok(FrameSyncState {
        in_flight,
        image_available,
        render_finished,
    })
}
