// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use prism_core::{Error, Result};

/// Command-buffer calls the recorder emits, in the order it emits them.
pub trait CommandSink {
    fn begin(&self, cmd: vk::CommandBuffer) -> Result<()>;
    fn begin_render_pass(
        &self,
        cmd: vk::CommandBuffer,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        area: vk::Rect2D,
        clear_color: [f32; 4],
    );
    fn bind_pipeline(&self, cmd: vk::CommandBuffer, pipeline: vk::Pipeline);
    fn set_viewport(&self, cmd: vk::CommandBuffer, viewport: vk::Viewport);
    fn set_scissor(&self, cmd: vk::CommandBuffer, scissor: vk::Rect2D);
    fn draw(&self, cmd: vk::CommandBuffer, vertex_count: u32, instance_count: u32);
    fn end_render_pass(&self, cmd: vk::CommandBuffer);
    fn end(&self, cmd: vk::CommandBuffer) -> Result<()>;
}

/// Writes the per-frame triangle draw. Holds only handles that stay fixed for
/// the lifetime of the swapchain.
#[derive(Clone, Debug)]
pub struct CommandRecorder {
    pub render_pass: vk::RenderPass,
    pub pipeline: vk::Pipeline,
    pub framebuffers: Vec<vk::Framebuffer>,
    pub extent: vk::Extent2D,
    pub clear_color: [f32; 4],
}

impl CommandRecorder {
    pub fn full_area(&self) -> vk::Rect2D {
        vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: self.extent,
        }
    }

    pub fn viewport(&self) -> vk::Viewport {
        vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: self.extent.width as f32,
            height: self.extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    /// `cmd` must already be reset.
    pub fn record<S: CommandSink + ?Sized>(
        &self,
        sink: &S,
        cmd: vk::CommandBuffer,
        image_index: u32,
    ) -> Result<()> {
        let framebuffer = *self
            .framebuffers
            .get(image_index as usize)
            .ok_or(Error::InvalidImageIndex(image_index))?;

        sink.begin(cmd)?;
        sink.begin_render_pass(
            cmd,
            self.render_pass,
            framebuffer,
            self.full_area(),
            self.clear_color,
        );
        sink.bind_pipeline(cmd, self.pipeline);
        sink.set_viewport(cmd, self.viewport());
        sink.set_scissor(cmd, self.full_area());
        // Vertices come from gl_VertexIndex, no buffers bound.
        sink.draw(cmd, 3, 1);
        sink.end_render_pass(cmd);
        sink.end(cmd)
    }
}
