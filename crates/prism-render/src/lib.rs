// SPDX-License-Identifier: CEPL-1.0
pub use ash::vk;
use prism_core::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

pub mod adapter;
pub mod artifacts;
pub mod chain;
pub mod pipeline;
pub mod queue;
pub mod recorder;
pub mod release;
pub mod sync;

pub use adapter::{select_adapter, AdapterProfile, CapabilityProbe, SurfaceSupport};
pub use artifacts::{DirShaderStore, EmbeddedShaderStore, ShaderStore};
pub use chain::{create_views, plan_chain, ChainPlan, SharingPlan};
pub use pipeline::{
    build_pipeline, ColorAttachment, FixedFunctionState, PipelineBundle, PipelineFactory,
    ShaderStages,
};
pub use queue::{resolve_queue_indices, QueueFamilySupport, QueueIndices, ResolvedQueues};
pub use recorder::{CommandRecorder, CommandSink};
pub use release::{Destroyer, ReleaseStack, Resource};
pub use sync::{FrameBackend, FrameSubmission, FrameSyncState, FrameSynchronizer, SlotState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderSize {
    pub width: u32,
    pub height: u32,
}

/// Something that can be presented to: a native window plus its current
/// drawable size in pixels.
pub trait SurfaceTarget: HasWindowHandle + HasDisplayHandle {
    fn framebuffer_size(&self) -> RenderSize;
}

/// Knobs the renderer honours at bring-up. Nothing here is re-read later.
#[derive(Clone, Debug)]
pub struct RenderSettings {
    pub app_name: String,
    pub clear_color: [f32; 4],
    pub preferred_format: vk::SurfaceFormatKHR,
    pub preferred_present_mode: vk::PresentModeKHR,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            app_name: "prism".to_owned(),
            clear_color: [0.02, 0.02, 0.04, 1.0],
            preferred_format: vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            preferred_present_mode: vk::PresentModeKHR::MAILBOX,
        }
    }
}

pub trait Renderer {
    fn new(
        target: &dyn SurfaceTarget,
        settings: &RenderSettings,
        shaders: &dyn ShaderStore,
    ) -> Result<Self>
    where
        Self: Sized;

    /// Runs one full wait/acquire/record/submit/present cycle.
    fn render(&mut self) -> Result<()>;

    fn wait_idle(&self) -> Result<()>;
}
