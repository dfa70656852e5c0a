// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use prism_core::{Error, Result};
use prism_render::{create_views, plan_chain, ReleaseStack, RenderSettings, RenderSize, Resource};
use tracing::info;

use crate::context::{query_surface_support, DeviceContext};

/// Swapchain plus one view per image. Built once; there is no recreation.
pub(crate) struct PresentationChain {
    pub swapchain: vk::SwapchainKHR,
    pub format: vk::SurfaceFormatKHR,
    pub extent: vk::Extent2D,
    pub views: Vec<vk::ImageView>,
}

impl PresentationChain {
    pub unsafe fn create(
        ctx: DeviceContext<'_>,
        hint: RenderSize,
        settings: &RenderSettings,
        stack: &mut ReleaseStack,
    ) -> Result<Self> {
        let support = unsafe { query_surface_support(ctx.surface_loader, ctx.adapter, ctx.surface) }
            .map_err(|e| Error::SwapchainCreationFailed(format!("surface query: {e:?}")))?;
        let plan = plan_chain(&support, hint, ctx.queues, settings)?;

        let families = plan.sharing.family_indices();
        let swap_info = vk::SwapchainCreateInfoKHR {
            s_type: vk::StructureType::SWAPCHAIN_CREATE_INFO_KHR,
            surface: ctx.surface,
            min_image_count: plan.image_count,
            image_format: plan.surface_format.format,
            image_color_space: plan.surface_format.color_space,
            image_extent: plan.extent,
            image_array_layers: 1,
            image_usage: vk::ImageUsageFlags::COLOR_ATTACHMENT,
            image_sharing_mode: plan.sharing.mode(),
            queue_family_index_count: families.len() as u32,
            p_queue_family_indices: families.as_ptr(),
            pre_transform: plan.pre_transform,
            composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
            present_mode: plan.present_mode,
            clipped: vk::TRUE,
            old_swapchain: vk::SwapchainKHR::null(),
            ..Default::default()
        };

        let swapchain = unsafe { ctx.swapchain_loader.create_swapchain(&swap_info, None) }
            .map_err(|e| Error::SwapchainCreationFailed(format!("{e:?}")))?;
        stack.push(Resource::Swapchain(swapchain));

        let images = unsafe { ctx.swapchain_loader.get_swapchain_images(swapchain) }
            .map_err(|e| Error::SwapchainCreationFailed(format!("get images: {e:?}")))?;

        let format = plan.surface_format.format;
        let views = create_views(
            &images,
            |image| unsafe { create_image_view(ctx.device, image, format) },
            |view| unsafe { ctx.device.destroy_image_view(view, None) },
            stack,
        )?;

        info!(
            "swapchain ready ({}x{}, {:?}, {} images)",
            plan.extent.width,
            plan.extent.height,
            format,
            images.len()
        );

        Ok(Self {
            swapchain,
            format: plan.surface_format,
            extent: plan.extent,
            views,
        })
    }

    /// One framebuffer per view, in image order.
    pub unsafe fn create_framebuffers(
        &self,
        device: &ash::Device,
        render_pass: vk::RenderPass,
        stack: &mut ReleaseStack,
    ) -> Result<Vec<vk::Framebuffer>> {
        let mut framebuffers = Vec::with_capacity(self.views.len());
        for view in &self.views {
            let fb_info = vk::FramebufferCreateInfo {
                s_type: vk::StructureType::FRAMEBUFFER_CREATE_INFO,
                render_pass,
                attachment_count: 1,
                p_attachments: view,
                width: self.extent.width,
                height: self.extent.height,
                layers: 1,
                ..Default::default()
            };
            let fb = unsafe { device.create_framebuffer(&fb_info, None) }
                .map_err(|e| Error::FramebufferCreationFailed(format!("{e:?}")))?;
            stack.push(Resource::Framebuffer(fb));
            framebuffers.push(fb);
        }
        Ok(framebuffers)
    }
}

unsafe fn create_image_view(
    device: &ash::Device,
    image: vk::Image,
    format: vk::Format,
) -> Result<vk::ImageView> {
    let iv_info = vk::ImageViewCreateInfo {
        s_type: vk::StructureType::IMAGE_VIEW_CREATE_INFO,
        image,
        view_type: vk::ImageViewType::TYPE_2D,
        format,
        components: vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        },
        subresource_range: vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        },
        ..Default::default()
    };
    unsafe { device.create_image_view(&iv_info, None) }
        .map_err(|e| Error::ImageViewCreationFailed(format!("{e:?}")))
}
