// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use prism_core::Result;
use tracing::trace;

use crate::recorder::{CommandRecorder, CommandSink};

/// The one fence and two semaphores guarding the single in-flight frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameSyncState {
    /// Created signaled so the first wait returns at once.
    pub in_flight: vk::Fence,
    pub image_available: vk::Semaphore,
    pub render_finished: vk::Semaphore,
}

/// What the host knows about the frame slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    Submitted,
}

/// Everything a frame needs to hand to the graphics queue.
#[derive(Clone, Copy, Debug)]
pub struct FrameSubmission {
    pub cmd: vk::CommandBuffer,
    pub wait: vk::Semaphore,
    pub wait_stage: vk::PipelineStageFlags,
    pub signal: vk::Semaphore,
    pub fence: vk::Fence,
}

/// Queue and swapchain operations of one frame.
pub trait FrameBackend {
    /// Blocks with no timeout.
    fn wait_for_fence(&self, fence: vk::Fence) -> Result<()>;
    fn reset_fence(&self, fence: vk::Fence) -> Result<()>;
    /// May block until an image is free. Stale swapchains are an error.
    fn acquire_next_image(&self, signal: vk::Semaphore) -> Result<u32>;
    fn reset_command_buffer(&self, cmd: vk::CommandBuffer) -> Result<()>;
    fn submit(&self, submission: &FrameSubmission) -> Result<()>;
    fn present(&self, image_index: u32, wait: vk::Semaphore) -> Result<()>;
}

/// Runs wait → acquire → record → submit → present for a single frame slot.
#[derive(Debug)]
pub struct FrameSynchronizer {
    sync: FrameSyncState,
    cmd: vk::CommandBuffer,
    state: SlotState,
    frames: u64,
}

impl FrameSynchronizer {
    pub fn new(sync: FrameSyncState, cmd: vk::CommandBuffer) -> Self {
        Self {
            sync,
            cmd,
            state: SlotState::Idle,
            frames: 0,
        }
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    pub fn sync(&self) -> &FrameSyncState {
        &self.sync
    }

    pub fn frames_submitted(&self) -> u64 {
        self.frames
    }

    /// Returns the presented image index. Any error leaves the slot unusable;
    /// callers are expected to tear down.
    pub fn draw_frame<B>(&mut self, backend: &B, recorder: &CommandRecorder) -> Result<u32>
    where
        B: FrameBackend + CommandSink + ?Sized,
    {
        backend.wait_for_fence(self.sync.in_flight)?;
        self.state = SlotState::Idle;
        backend.reset_fence(self.sync.in_flight)?;

        let image_index = backend.acquire_next_image(self.sync.image_available)?;
        trace!("frame {}: image {}", self.frames, image_index);

        backend.reset_command_buffer(self.cmd)?;
        recorder.record(backend, self.cmd, image_index)?;

        backend.submit(&FrameSubmission {
            cmd: self.cmd,
            wait: self.sync.image_available,
            wait_stage: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            signal: self.sync.render_finished,
            fence: self.sync.in_flight,
        })?;
        self.state = SlotState::Submitted;
        self.frames += 1;

        backend.present(image_index, self.sync.render_finished)?;
        Ok(image_index)
    }
}
