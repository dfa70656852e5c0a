// SPDX-License-Identifier: CEPL-1.0
use std::ffi::CStr;

use ash::util::read_spv;
use ash::vk;
use prism_core::{Error, Result};
use tracing::{debug, info};

use crate::artifacts::{ShaderStore, FRAGMENT_SHADER, VERTEX_SHADER};
use crate::release::{ReleaseStack, Resource};

pub const SHADER_ENTRY: &CStr = c"main";
const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Fixed-function configuration baked into the pipeline. Viewport and scissor
/// are listed as dynamic and supplied at record time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedFunctionState {
    pub topology: vk::PrimitiveTopology,
    pub primitive_restart: bool,
    pub viewport_count: u32,
    pub scissor_count: u32,
    pub dynamic_states: Vec<vk::DynamicState>,
    pub polygon_mode: vk::PolygonMode,
    pub cull_mode: vk::CullModeFlags,
    pub front_face: vk::FrontFace,
    pub depth_bias: bool,
    pub depth_clamp: bool,
    pub samples: vk::SampleCountFlags,
    pub blend: bool,
    pub color_write_mask: vk::ColorComponentFlags,
    pub depth_test: bool,
}

impl FixedFunctionState {
    /// A single opaque triangle generated in the vertex stage.
    pub fn procedural_triangle() -> Self {
        FixedFunctionState {
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            primitive_restart: false,
            viewport_count: 1,
            scissor_count: 1,
            dynamic_states: vec![vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR],
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::BACK,
            front_face: vk::FrontFace::CLOCKWISE,
            depth_bias: false,
            depth_clamp: false,
            samples: vk::SampleCountFlags::TYPE_1,
            blend: false,
            color_write_mask: vk::ColorComponentFlags::RGBA,
            depth_test: false,
        }
    }
}

/// The single color attachment of the render pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorAttachment {
    pub format: vk::Format,
    pub load_op: vk::AttachmentLoadOp,
    pub store_op: vk::AttachmentStoreOp,
    pub stencil_load_op: vk::AttachmentLoadOp,
    pub stencil_store_op: vk::AttachmentStoreOp,
    pub initial_layout: vk::ImageLayout,
    pub final_layout: vk::ImageLayout,
}

impl ColorAttachment {
    /// Cleared on load, stored, and left ready for presentation.
    pub fn presentable(format: vk::Format) -> Self {
        ColorAttachment {
            format,
            load_op: vk::AttachmentLoadOp::CLEAR,
            store_op: vk::AttachmentStoreOp::STORE,
            stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
            stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
            initial_layout: vk::ImageLayout::UNDEFINED,
            final_layout: vk::ImageLayout::PRESENT_SRC_KHR,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ShaderStages {
    pub vertex: vk::ShaderModule,
    pub fragment: vk::ShaderModule,
    pub entry: &'static CStr,
}

#[derive(Clone, Copy, Debug)]
pub struct PipelineBundle {
    pub render_pass: vk::RenderPass,
    pub layout: vk::PipelineLayout,
    pub pipeline: vk::Pipeline,
}

/// Driver calls the pipeline builder needs.
pub trait PipelineFactory {
    fn create_shader_module(&self, code: &[u32]) -> Result<vk::ShaderModule>;
    fn destroy_shader_module(&self, module: vk::ShaderModule);
    fn create_render_pass(&self, color: &ColorAttachment) -> Result<vk::RenderPass>;
    fn create_pipeline_layout(&self) -> Result<vk::PipelineLayout>;
    fn create_graphics_pipeline(
        &self,
        stages: &ShaderStages,
        state: &FixedFunctionState,
        layout: vk::PipelineLayout,
        render_pass: vk::RenderPass,
    ) -> Result<vk::Pipeline>;
}

/// Validates SPIR-V bytes and returns the words.
pub fn decode_spirv(name: &str, bytes: &[u8]) -> Result<Vec<u32>> {
    let fail = |reason: String| Error::ShaderModuleCreationFailed {
        name: name.to_owned(),
        reason,
    };
    if bytes.is_empty() {
        return Err(fail("empty bytecode".into()));
    }
    let words = read_spv(&mut std::io::Cursor::new(bytes)).map_err(|e| fail(e.to_string()))?;
    if words.first() != Some(&SPIRV_MAGIC) {
        return Err(fail("missing SPIR-V magic number".into()));
    }
    Ok(words)
}

fn load_module<F: PipelineFactory + ?Sized>(
    factory: &F,
    shaders: &dyn ShaderStore,
    name: &str,
) -> Result<vk::ShaderModule> {
    let bytes = shaders.load_bytecode(name)?;
    let words = decode_spirv(name, &bytes)?;
    let module = factory
        .create_shader_module(&words)
        .map_err(|e| Error::ShaderModuleCreationFailed {
            name: name.to_owned(),
            reason: e.to_string(),
        })?;
    debug!("shader module {} ({} words)", name, words.len());
    Ok(module)
}

/// Builds the render pass, layout and pipeline for `format`. All three are
/// pushed onto `stack` as they are created. The shader modules never outlive
/// this call, whether it succeeds or not.
pub fn build_pipeline<F: PipelineFactory + ?Sized>(
    factory: &F,
    shaders: &dyn ShaderStore,
    format: vk::Format,
    stack: &mut ReleaseStack,
) -> Result<PipelineBundle> {
    let vertex = load_module(factory, shaders, VERTEX_SHADER)?;
    let fragment = match load_module(factory, shaders, FRAGMENT_SHADER) {
        Ok(m) => m,
        Err(e) => {
            factory.destroy_shader_module(vertex);
            return Err(e);
        }
    };

    let stages = ShaderStages {
        vertex,
        fragment,
        entry: SHADER_ENTRY,
    };
    let built = assemble(factory, &stages, format, stack);

    factory.destroy_shader_module(vertex);
    factory.destroy_shader_module(fragment);

    if built.is_ok() {
        info!("pipeline ready for {:?}", format);
    }
    built
}

fn assemble<F: PipelineFactory + ?Sized>(
    factory: &F,
    stages: &ShaderStages,
    format: vk::Format,
    stack: &mut ReleaseStack,
) -> Result<PipelineBundle> {
    let render_pass = factory.create_render_pass(&ColorAttachment::presentable(format))?;
    stack.push(Resource::RenderPass(render_pass));

    let layout = factory.create_pipeline_layout()?;
    stack.push(Resource::PipelineLayout(layout));

    let state = FixedFunctionState::procedural_triangle();
    let pipeline = factory.create_graphics_pipeline(stages, &state, layout, render_pass)?;
    stack.push(Resource::Pipeline(pipeline));

    Ok(PipelineBundle {
        render_pass,
        layout,
        pipeline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_state_matches_the_fixed_configuration() {
        let s = FixedFunctionState::procedural_triangle();
        assert_eq!(s.topology, vk::PrimitiveTopology::TRIANGLE_LIST);
        assert!(!s.primitive_restart);
        assert_eq!(s.cull_mode, vk::CullModeFlags::BACK);
        assert_eq!(s.front_face, vk::FrontFace::CLOCKWISE);
        assert_eq!(s.samples, vk::SampleCountFlags::TYPE_1);
        assert_eq!(s.color_write_mask, vk::ColorComponentFlags::RGBA);
        assert!(!s.blend && !s.depth_test && !s.depth_bias && !s.depth_clamp);
        assert_eq!(
            s.dynamic_states,
            vec![vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR]
        );
        assert_eq!((s.viewport_count, s.scissor_count), (1, 1));
    }

    #[test]
    fn presentable_attachment_clears_and_ends_presentable() {
        let a = ColorAttachment::presentable(vk::Format::B8G8R8A8_SRGB);
        assert_eq!(a.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(a.load_op, vk::AttachmentLoadOp::CLEAR);
        assert_eq!(a.store_op, vk::AttachmentStoreOp::STORE);
        assert_eq!(a.stencil_load_op, vk::AttachmentLoadOp::DONT_CARE);
        assert_eq!(a.stencil_store_op, vk::AttachmentStoreOp::DONT_CARE);
        assert_eq!(a.initial_layout, vk::ImageLayout::UNDEFINED);
        assert_eq!(a.final_layout, vk::ImageLayout::PRESENT_SRC_KHR);
    }

    #[test]
    fn spirv_validation() {
        assert!(matches!(
            decode_spirv("a.spv", &[]),
            Err(Error::ShaderModuleCreationFailed { reason, .. }) if reason == "empty bytecode"
        ));
        assert!(decode_spirv("a.spv", &[1, 2, 3]).is_err());
        assert!(decode_spirv("a.spv", &[0, 0, 0, 0]).is_err());

        let ok = decode_spirv("a.spv", &SPIRV_MAGIC.to_le_bytes()).unwrap();
        assert_eq!(ok, vec![SPIRV_MAGIC]);
    }
}
