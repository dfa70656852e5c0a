// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use prism_core::{Error, Result};
use tracing::{debug, info};

use crate::adapter::SurfaceSupport;
use crate::queue::ResolvedQueues;
use crate::release::{ReleaseStack, Resource};
use crate::{RenderSettings, RenderSize};

/// How swapchain images are shared between the graphics and present families.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SharingPlan {
    Exclusive,
    Concurrent([u32; 2]),
}

impl SharingPlan {
    pub fn for_queues(queues: ResolvedQueues) -> Self {
        if queues.is_shared() {
            SharingPlan::Exclusive
        } else {
            SharingPlan::Concurrent([queues.graphics, queues.present])
        }
    }

    pub fn mode(&self) -> vk::SharingMode {
        match self {
            SharingPlan::Exclusive => vk::SharingMode::EXCLUSIVE,
            SharingPlan::Concurrent(_) => vk::SharingMode::CONCURRENT,
        }
    }

    pub fn family_indices(&self) -> &[u32] {
        match self {
            SharingPlan::Exclusive => &[],
            SharingPlan::Concurrent(families) => families,
        }
    }
}

/// Resolved swapchain parameters, ready to be handed to the driver.
#[derive(Clone, Debug)]
pub struct ChainPlan {
    pub surface_format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub image_count: u32,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
    pub sharing: SharingPlan,
}

/// Exact (format, color space) match on `preferred`, else the first entry.
pub fn choose_surface_format(
    formats: &[vk::SurfaceFormatKHR],
    preferred: vk::SurfaceFormatKHR,
) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .copied()
        .find(|f| f.format == preferred.format && f.color_space == preferred.color_space)
        .or_else(|| formats.first().copied())
}

/// `preferred` when offered, FIFO otherwise (the one mode every driver has).
pub fn choose_present_mode(
    modes: &[vk::PresentModeKHR],
    preferred: vk::PresentModeKHR,
) -> vk::PresentModeKHR {
    if modes.contains(&preferred) {
        preferred
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// The surface's current extent unless it is the `u32::MAX` "pick one"
/// sentinel, in which case the framebuffer size clamped into the allowed range.
pub fn extent_from_caps(caps: &vk::SurfaceCapabilitiesKHR, want: RenderSize) -> vk::Extent2D {
    if caps.current_extent.width != u32::MAX {
        caps.current_extent
    } else {
        vk::Extent2D {
            width: want
                .width
                .clamp(caps.min_image_extent.width, caps.max_image_extent.width),
            height: want
                .height
                .clamp(caps.min_image_extent.height, caps.max_image_extent.height),
        }
    }
}

/// One more than the minimum, capped by the maximum when there is one
/// (`max_image_count == 0` means unbounded).
pub fn image_count(caps: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let want = caps.min_image_count + 1;
    if caps.max_image_count == 0 {
        want
    } else {
        want.min(caps.max_image_count)
    }
}

pub fn plan_chain(
    support: &SurfaceSupport,
    framebuffer: RenderSize,
    queues: ResolvedQueues,
    settings: &RenderSettings,
) -> Result<ChainPlan> {
    let surface_format = choose_surface_format(&support.formats, settings.preferred_format)
        .ok_or_else(|| Error::SwapchainCreationFailed("surface reports no formats".into()))?;
    let present_mode = choose_present_mode(&support.present_modes, settings.preferred_present_mode);
    let extent = extent_from_caps(&support.capabilities, framebuffer);

    let plan = ChainPlan {
        surface_format,
        present_mode,
        extent,
        image_count: image_count(&support.capabilities),
        pre_transform: support.capabilities.current_transform,
        sharing: SharingPlan::for_queues(queues),
    };
    info!(
        "swapchain plan: {}x{} {:?}/{:?} {:?} x{} ({:?})",
        plan.extent.width,
        plan.extent.height,
        plan.surface_format.format,
        plan.surface_format.color_space,
        plan.present_mode,
        plan.image_count,
        plan.sharing.mode()
    );
    Ok(plan)
}

/// Creates one view per image in order. On failure every view made so far is
/// handed to `destroy` before the error is returned; on success all views are
/// pushed onto `stack`.
pub fn create_views<C, D>(
    images: &[vk::Image],
    mut create: C,
    mut destroy: D,
    stack: &mut ReleaseStack,
) -> Result<Vec<vk::ImageView>>
where
    C: FnMut(vk::Image) -> Result<vk::ImageView>,
    D: FnMut(vk::ImageView),
{
    let mut views = Vec::with_capacity(images.len());
    for &image in images {
        match create(image) {
            Ok(view) => views.push(view),
            Err(e) => {
                debug!("image view failed after {} of {}", views.len(), images.len());
                for view in views.drain(..).rev() {
                    destroy(view);
                }
                return Err(e);
            }
        }
    }
    for &view in &views {
        stack.push(Resource::ImageView(view));
    }
    Ok(views)
}
