// SPDX-License-Identifier: CEPL-1.0
#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use ash::vk::{self, Handle};
use prism_core::{Error, Result};
use prism_render::{
    ColorAttachment, CommandRecorder, CommandSink, Destroyer, FixedFunctionState, FrameBackend,
    FrameSubmission, FrameSyncState, PipelineFactory, Resource, ShaderStages,
};

pub const SPIRV_MAGIC: u32 = 0x0723_0203;

/// A tiny blob that passes the bytecode checks.
pub fn fake_spirv() -> Vec<u8> {
    [SPIRV_MAGIC, 0x0001_0000, 0, 1, 0]
        .iter()
        .flat_map(|w| w.to_le_bytes())
        .collect()
}

pub fn sync_state() -> FrameSyncState {
    FrameSyncState {
        in_flight: vk::Fence::from_raw(10),
        image_available: vk::Semaphore::from_raw(20),
        render_finished: vk::Semaphore::from_raw(21),
    }
}

pub fn recorder(framebuffers: usize) -> CommandRecorder {
    CommandRecorder {
        render_pass: vk::RenderPass::from_raw(30),
        pipeline: vk::Pipeline::from_raw(31),
        framebuffers: (0..framebuffers as u64)
            .map(|i| vk::Framebuffer::from_raw(100 + i))
            .collect(),
        extent: vk::Extent2D {
            width: 800,
            height: 600,
        },
        clear_color: [0.02, 0.02, 0.04, 1.0],
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    WaitFence(u64),
    ResetFence(u64),
    Acquire(u64),
    ResetCmd(u64),
    Begin(u64),
    BeginRenderPass {
        framebuffer: u64,
        extent: (u32, u32),
        clear: [f32; 4],
    },
    BindPipeline(u64),
    SetViewport {
        origin: (f32, f32),
        size: (f32, f32),
        depth: (f32, f32),
    },
    SetScissor {
        offset: (i32, i32),
        extent: (u32, u32),
    },
    Draw {
        vertices: u32,
        instances: u32,
    },
    EndRenderPass,
    End(u64),
    Submit {
        cmd: u64,
        wait: u64,
        wait_stage: vk::PipelineStageFlags,
        signal: u64,
        fence: u64,
    },
    Present {
        image: u32,
        wait: u64,
    },
}

/// Single-queue GPU that finishes submitted work immediately.
pub struct MockGpu {
    pub calls: RefCell<Vec<Call>>,
    pub fence_signaled: Cell<bool>,
    /// True while the command buffer is in the initial (reset) state.
    pub cmd_reset: Cell<bool>,
    pub recording: Cell<bool>,
    pub image_count: u32,
    pub next_image: Cell<u32>,
    pub fail_submit: Cell<bool>,
    pub stale_on_acquire: Cell<bool>,
    pub fail_end: Cell<bool>,
}

impl MockGpu {
    pub fn new(image_count: u32) -> Self {
        MockGpu {
            calls: RefCell::new(Vec::new()),
            fence_signaled: Cell::new(true),
            cmd_reset: Cell::new(true),
            recording: Cell::new(false),
            image_count,
            next_image: Cell::new(0),
            fail_submit: Cell::new(false),
            stale_on_acquire: Cell::new(false),
            fail_end: Cell::new(false),
        }
    }

    fn log(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    pub fn take_calls(&self) -> Vec<Call> {
        self.calls.borrow_mut().drain(..).collect()
    }
}

impl FrameBackend for MockGpu {
    fn wait_for_fence(&self, fence: vk::Fence) -> Result<()> {
        self.log(Call::WaitFence(fence.as_raw()));
        if !self.fence_signaled.get() {
            return Err(Error::FenceWaitFailed("fence never signals".into()));
        }
        Ok(())
    }

    fn reset_fence(&self, fence: vk::Fence) -> Result<()> {
        self.log(Call::ResetFence(fence.as_raw()));
        self.fence_signaled.set(false);
        Ok(())
    }

    fn acquire_next_image(&self, signal: vk::Semaphore) -> Result<u32> {
        self.log(Call::Acquire(signal.as_raw()));
        if self.stale_on_acquire.get() {
            return Err(Error::SurfaceOutOfDate);
        }
        let image = self.next_image.get();
        self.next_image.set((image + 1) % self.image_count);
        Ok(image)
    }

    fn reset_command_buffer(&self, cmd: vk::CommandBuffer) -> Result<()> {
        self.log(Call::ResetCmd(cmd.as_raw()));
        self.cmd_reset.set(true);
        self.recording.set(false);
        Ok(())
    }

    fn submit(&self, s: &FrameSubmission) -> Result<()> {
        self.log(Call::Submit {
            cmd: s.cmd.as_raw(),
            wait: s.wait.as_raw(),
            wait_stage: s.wait_stage,
            signal: s.signal.as_raw(),
            fence: s.fence.as_raw(),
        });
        if self.fail_submit.get() {
            return Err(Error::SubmitFailed("ERROR_DEVICE_LOST".into()));
        }
        self.fence_signaled.set(true);
        Ok(())
    }

    fn present(&self, image_index: u32, wait: vk::Semaphore) -> Result<()> {
        self.log(Call::Present {
            image: image_index,
            wait: wait.as_raw(),
        });
        Ok(())
    }
}

impl CommandSink for MockGpu {
    fn begin(&self, cmd: vk::CommandBuffer) -> Result<()> {
        self.log(Call::Begin(cmd.as_raw()));
        if !self.cmd_reset.get() {
            return Err(Error::BeginRecordFailed("command buffer was not reset".into()));
        }
        self.cmd_reset.set(false);
        self.recording.set(true);
        Ok(())
    }

    fn begin_render_pass(
        &self,
        _cmd: vk::CommandBuffer,
        _render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        area: vk::Rect2D,
        clear_color: [f32; 4],
    ) {
        self.log(Call::BeginRenderPass {
            framebuffer: framebuffer.as_raw(),
            extent: (area.extent.width, area.extent.height),
            clear: clear_color,
        });
    }

    fn bind_pipeline(&self, _cmd: vk::CommandBuffer, pipeline: vk::Pipeline) {
        self.log(Call::BindPipeline(pipeline.as_raw()));
    }

    fn set_viewport(&self, _cmd: vk::CommandBuffer, v: vk::Viewport) {
        self.log(Call::SetViewport {
            origin: (v.x, v.y),
            size: (v.width, v.height),
            depth: (v.min_depth, v.max_depth),
        });
    }

    fn set_scissor(&self, _cmd: vk::CommandBuffer, s: vk::Rect2D) {
        self.log(Call::SetScissor {
            offset: (s.offset.x, s.offset.y),
            extent: (s.extent.width, s.extent.height),
        });
    }

    fn draw(&self, _cmd: vk::CommandBuffer, vertex_count: u32, instance_count: u32) {
        self.log(Call::Draw {
            vertices: vertex_count,
            instances: instance_count,
        });
    }

    fn end_render_pass(&self, _cmd: vk::CommandBuffer) {
        self.log(Call::EndRenderPass);
    }

    fn end(&self, cmd: vk::CommandBuffer) -> Result<()> {
        self.log(Call::End(cmd.as_raw()));
        self.recording.set(false);
        if self.fail_end.get() {
            return Err(Error::EndRecordFailed("ERROR_OUT_OF_DEVICE_MEMORY".into()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FactoryCall {
    CreateModule(u64),
    DestroyModule(u64),
    CreateRenderPass(vk::Format),
    CreateLayout,
    CreatePipeline {
        vertex: u64,
        fragment: u64,
        entry: String,
    },
}

/// Pipeline factory that hands out sequential handles and can fail on demand.
#[derive(Default)]
pub struct MockFactory {
    pub calls: RefCell<Vec<FactoryCall>>,
    pub next: Cell<u64>,
    pub fail_pipeline: Cell<bool>,
    pub last_state: RefCell<Option<FixedFunctionState>>,
    pub last_attachment: RefCell<Option<ColorAttachment>>,
}

impl MockFactory {
    fn handle(&self) -> u64 {
        let h = self.next.get() + 1;
        self.next.set(h);
        h
    }

    pub fn created_modules(&self) -> Vec<u64> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                FactoryCall::CreateModule(h) => Some(*h),
                _ => None,
            })
            .collect()
    }

    pub fn destroyed_modules(&self) -> Vec<u64> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                FactoryCall::DestroyModule(h) => Some(*h),
                _ => None,
            })
            .collect()
    }
}

impl PipelineFactory for MockFactory {
    fn create_shader_module(&self, _code: &[u32]) -> Result<vk::ShaderModule> {
        let h = self.handle();
        self.calls.borrow_mut().push(FactoryCall::CreateModule(h));
        Ok(vk::ShaderModule::from_raw(h))
    }

    fn destroy_shader_module(&self, module: vk::ShaderModule) {
        self.calls
            .borrow_mut()
            .push(FactoryCall::DestroyModule(module.as_raw()));
    }

    fn create_render_pass(&self, color: &ColorAttachment) -> Result<vk::RenderPass> {
        self.calls
            .borrow_mut()
            .push(FactoryCall::CreateRenderPass(color.format));
        *self.last_attachment.borrow_mut() = Some(*color);
        Ok(vk::RenderPass::from_raw(self.handle()))
    }

    fn create_pipeline_layout(&self) -> Result<vk::PipelineLayout> {
        self.calls.borrow_mut().push(FactoryCall::CreateLayout);
        Ok(vk::PipelineLayout::from_raw(self.handle()))
    }

    fn create_graphics_pipeline(
        &self,
        stages: &ShaderStages,
        state: &FixedFunctionState,
        _layout: vk::PipelineLayout,
        _render_pass: vk::RenderPass,
    ) -> Result<vk::Pipeline> {
        self.calls.borrow_mut().push(FactoryCall::CreatePipeline {
            vertex: stages.vertex.as_raw(),
            fragment: stages.fragment.as_raw(),
            entry: stages.entry.to_string_lossy().into_owned(),
        });
        *self.last_state.borrow_mut() = Some(state.clone());
        if self.fail_pipeline.get() {
            return Err(Error::PipelineCreationFailed("ERROR_INVALID_SHADER_NV".into()));
        }
        Ok(vk::Pipeline::from_raw(self.handle()))
    }
}

/// Destroyer that only writes down what it was asked to destroy.
#[derive(Default)]
pub struct RecordingDestroyer {
    pub log: RefCell<Vec<Resource>>,
}

impl Destroyer for RecordingDestroyer {
    fn destroy(&self, resource: Resource) {
        self.log.borrow_mut().push(resource);
    }
}
