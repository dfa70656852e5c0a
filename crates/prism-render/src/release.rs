// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use tracing::debug;

/// A GPU object that must be explicitly destroyed.
///
/// The instance and device are singletons owned by the destroyer, so they
/// carry no handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    Instance,
    Surface(vk::SurfaceKHR),
    Device,
    Swapchain(vk::SwapchainKHR),
    ImageView(vk::ImageView),
    RenderPass(vk::RenderPass),
    Framebuffer(vk::Framebuffer),
    PipelineLayout(vk::PipelineLayout),
    Pipeline(vk::Pipeline),
    CommandPool(vk::CommandPool),
    Semaphore(vk::Semaphore),
    Fence(vk::Fence),
}

pub trait Destroyer {
    fn destroy(&self, resource: Resource);
}

/// Records resources in creation order and destroys them in reverse, so
/// dependents always go before what they depend on. Works the same for a
/// fully built renderer and for one that failed halfway through bring-up.
#[derive(Debug, Default)]
pub struct ReleaseStack {
    stack: Vec<Resource>,
}

impl ReleaseStack {
    pub fn push(&mut self, resource: Resource) {
        debug!("created {:?}", resource);
        self.stack.push(resource);
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn release_all(&mut self, destroyer: &dyn Destroyer) {
        while let Some(resource) = self.stack.pop() {
            debug!("releasing {:?}", resource);
            destroyer.destroy(resource);
        }
    }
}
