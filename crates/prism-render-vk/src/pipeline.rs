// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use prism_core::{Error, Result};
use prism_render::{ColorAttachment, FixedFunctionState, PipelineFactory, ShaderStages};

/// Turns the backend-neutral pipeline description into ash create infos.
pub(crate) struct VkPipelineFactory<'a> {
    pub device: &'a ash::Device,
}

fn bool32(b: bool) -> vk::Bool32 {
    if b {
        vk::TRUE
    } else {
        vk::FALSE
    }
}

impl PipelineFactory for VkPipelineFactory<'_> {
    fn create_shader_module(&self, code: &[u32]) -> Result<vk::ShaderModule> {
        let info = vk::ShaderModuleCreateInfo {
            s_type: vk::StructureType::SHADER_MODULE_CREATE_INFO,
            p_code: code.as_ptr(),
            code_size: std::mem::size_of_val(code),
            ..Default::default()
        };
        unsafe { self.device.create_shader_module(&info, None) }
            .map_err(|e| Error::PipelineCreationFailed(format!("shader module: {e:?}")))
    }

    fn destroy_shader_module(&self, module: vk::ShaderModule) {
        unsafe { self.device.destroy_shader_module(module, None) };
    }

    fn create_render_pass(&self, color: &ColorAttachment) -> Result<vk::RenderPass> {
        let color_att = vk::AttachmentDescription {
            format: color.format,
            samples: vk::SampleCountFlags::TYPE_1,
            load_op: color.load_op,
            store_op: color.store_op,
            stencil_load_op: color.stencil_load_op,
            stencil_store_op: color.stencil_store_op,
            initial_layout: color.initial_layout,
            final_layout: color.final_layout,
            ..Default::default()
        };
        let att_ref = vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        };

        let subpass = vk::SubpassDescription {
            pipeline_bind_point: vk::PipelineBindPoint::GRAPHICS,
            color_attachment_count: 1,
            p_color_attachments: &att_ref,
            ..Default::default()
        };

        // Layout transition must wait for the image-available semaphore,
        // which is gated at COLOR_ATTACHMENT_OUTPUT.
        let dependency = vk::SubpassDependency {
            src_subpass: vk::SUBPASS_EXTERNAL,
            dst_subpass: 0,
            src_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            dst_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            src_access_mask: vk::AccessFlags::empty(),
            dst_access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            ..Default::default()
        };

        let rp_info = vk::RenderPassCreateInfo {
            s_type: vk::StructureType::RENDER_PASS_CREATE_INFO,
            attachment_count: 1,
            p_attachments: &color_att,
            subpass_count: 1,
            p_subpasses: &subpass,
            dependency_count: 1,
            p_dependencies: &dependency,
            ..Default::default()
        };
        unsafe { self.device.create_render_pass(&rp_info, None) }
            .map_err(|e| Error::RenderPassCreationFailed(format!("{e:?}")))
    }

    fn create_pipeline_layout(&self) -> Result<vk::PipelineLayout> {
        // No descriptor sets, no push constants.
        let layout_info = vk::PipelineLayoutCreateInfo {
            s_type: vk::StructureType::PIPELINE_LAYOUT_CREATE_INFO,
            ..Default::default()
        };
        unsafe { self.device.create_pipeline_layout(&layout_info, None) }
            .map_err(|e| Error::PipelineCreationFailed(format!("layout: {e:?}")))
    }

    fn create_graphics_pipeline(
        &self,
        stages: &ShaderStages,
        state: &FixedFunctionState,
        layout: vk::PipelineLayout,
        render_pass: vk::RenderPass,
    ) -> Result<vk::Pipeline> {
        let stage_infos = [
            vk::PipelineShaderStageCreateInfo {
                s_type: vk::StructureType::PIPELINE_SHADER_STAGE_CREATE_INFO,
                stage: vk::ShaderStageFlags::VERTEX,
                module: stages.vertex,
                p_name: stages.entry.as_ptr(),
                ..Default::default()
            },
            vk::PipelineShaderStageCreateInfo {
                s_type: vk::StructureType::PIPELINE_SHADER_STAGE_CREATE_INFO,
                stage: vk::ShaderStageFlags::FRAGMENT,
                module: stages.fragment,
                p_name: stages.entry.as_ptr(),
                ..Default::default()
            },
        ];

        // --- Fixed-function pipeline states ---
        // Geometry comes from gl_VertexIndex: no bindings, no attributes.
        let vertex_input = vk::PipelineVertexInputStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_VERTEX_INPUT_STATE_CREATE_INFO,
            ..Default::default()
        };
        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_INPUT_ASSEMBLY_STATE_CREATE_INFO,
            topology: state.topology,
            primitive_restart_enable: bool32(state.primitive_restart),
            ..Default::default()
        };
        let dynamic_state = vk::PipelineDynamicStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_DYNAMIC_STATE_CREATE_INFO,
            dynamic_state_count: state.dynamic_states.len() as u32,
            p_dynamic_states: state.dynamic_states.as_ptr(),
            ..Default::default()
        };
        let viewport_state = vk::PipelineViewportStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_VIEWPORT_STATE_CREATE_INFO,
            viewport_count: state.viewport_count,
            p_viewports: std::ptr::null(), // dynamic
            scissor_count: state.scissor_count,
            p_scissors: std::ptr::null(), // dynamic
            ..Default::default()
        };
        let raster = vk::PipelineRasterizationStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_RASTERIZATION_STATE_CREATE_INFO,
            depth_clamp_enable: bool32(state.depth_clamp),
            rasterizer_discard_enable: vk::FALSE,
            polygon_mode: state.polygon_mode,
            cull_mode: state.cull_mode,
            front_face: state.front_face,
            depth_bias_enable: bool32(state.depth_bias),
            line_width: 1.0,
            ..Default::default()
        };
        let multisample = vk::PipelineMultisampleStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_MULTISAMPLE_STATE_CREATE_INFO,
            rasterization_samples: state.samples,
            sample_shading_enable: vk::FALSE,
            ..Default::default()
        };
        let color_blend_att = vk::PipelineColorBlendAttachmentState {
            color_write_mask: state.color_write_mask,
            blend_enable: bool32(state.blend),
            ..Default::default()
        };
        let color_blend = vk::PipelineColorBlendStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_COLOR_BLEND_STATE_CREATE_INFO,
            attachment_count: 1,
            p_attachments: &color_blend_att,
            ..Default::default()
        };
        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_DEPTH_STENCIL_STATE_CREATE_INFO,
            depth_test_enable: bool32(state.depth_test),
            depth_write_enable: bool32(state.depth_test),
            ..Default::default()
        };

        let pipeline_info = vk::GraphicsPipelineCreateInfo {
            s_type: vk::StructureType::GRAPHICS_PIPELINE_CREATE_INFO,
            stage_count: stage_infos.len() as u32,
            p_stages: stage_infos.as_ptr(),
            p_vertex_input_state: &vertex_input,
            p_input_assembly_state: &input_assembly,
            p_viewport_state: &viewport_state,
            p_rasterization_state: &raster,
            p_multisample_state: &multisample,
            p_depth_stencil_state: &depth_stencil,
            p_color_blend_state: &color_blend,
            p_dynamic_state: &dynamic_state,
            layout,
            render_pass,
            subpass: 0,
            ..Default::default()
        };

        let pipelines = unsafe {
            self.device.create_graphics_pipelines(
                vk::PipelineCache::null(),
                std::slice::from_ref(&pipeline_info),
                None,
            )
        }
        .map_err(|(_, err)| Error::PipelineCreationFailed(format!("{err:?}")))?;

        pipelines
            .into_iter()
            .next()
            .ok_or_else(|| Error::PipelineCreationFailed("driver returned no pipeline".into()))
    }
}
