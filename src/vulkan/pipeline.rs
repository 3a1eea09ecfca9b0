use crate::vulkan::{DebugMarker, DescriptorSetLayout, Device, IntoVulkanError, ShaderModule, Vertex, VulkanError};
use ash::vk;
use ash::vk::{Handle, Pipeline as RawPipeline, PipelineLayout};
use std::rc::Rc;

/// Everything that varies between the scene pipelines.
pub struct GraphicsPipelineDesc<'a> {
    pub vertex: &'a ShaderModule,
    pub fragment: &'a ShaderModule,
    pub color_format: vk::Format,
    pub depth_format: Option<vk::Format>,
    pub polygon_mode: vk::PolygonMode,
    pub set_layouts: &'a [&'a DescriptorSetLayout],
    pub push_constant_size: u32,
}

pub struct Pipeline {
    pub inner: RawPipeline,
    pub layout: PipelineLayout,
    device: Rc<Device>,
}

impl Pipeline {
    pub fn new_graphics(device: Rc<Device>, desc: &GraphicsPipelineDesc) -> Result<Self, VulkanError> {
        let stages = [desc.vertex.stage_info(), desc.fragment.stage_info()];

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];

        let dynamic_state = vk::PipelineDynamicStateCreateInfo {
            dynamic_state_count: dynamic_states.len() as u32,
            p_dynamic_states: dynamic_states.as_ptr(),
            ..Default::default()
        };

        let binding = Vertex::binding_description();
        let attributes = Vertex::attribute_description();

        let vertex_input_info = vk::PipelineVertexInputStateCreateInfo {
            vertex_binding_description_count: 1,
            p_vertex_binding_descriptions: &binding,
            vertex_attribute_description_count: attributes.len() as u32,
            p_vertex_attribute_descriptions: attributes.as_ptr(),
            ..Default::default()
        };

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo {
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            primitive_restart_enable: vk::FALSE,
            ..Default::default()
        };

        let viewport_state = vk::PipelineViewportStateCreateInfo {
            viewport_count: 1,
            scissor_count: 1,
            ..Default::default()
        };

        let rasterizer = vk::PipelineRasterizationStateCreateInfo {
            depth_clamp_enable: vk::FALSE,
            rasterizer_discard_enable: vk::FALSE,
            polygon_mode: desc.polygon_mode,
            line_width: 1.0,
            cull_mode: vk::CullModeFlags::NONE,
            front_face: vk::FrontFace::COUNTER_CLOCKWISE,
            depth_bias_enable: vk::FALSE,
            ..Default::default()
        };

        let multisampling = vk::PipelineMultisampleStateCreateInfo {
            sample_shading_enable: vk::FALSE,
            rasterization_samples: vk::SampleCountFlags::TYPE_1,
            ..Default::default()
        };

        let depth_enabled = if desc.depth_format.is_some() { vk::TRUE } else { vk::FALSE };

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo {
            depth_test_enable: depth_enabled,
            depth_write_enable: depth_enabled,
            depth_compare_op: vk::CompareOp::LESS,
            depth_bounds_test_enable: vk::FALSE,
            stencil_test_enable: vk::FALSE,
            min_depth_bounds: 0.0,
            max_depth_bounds: 1.0,
            ..Default::default()
        };

        let color_blend_attachment = vk::PipelineColorBlendAttachmentState {
            color_write_mask: vk::ColorComponentFlags::RGBA,
            blend_enable: vk::FALSE,
            ..Default::default()
        };

        let color_blending = vk::PipelineColorBlendStateCreateInfo {
            logic_op_enable: vk::FALSE,
            logic_op: vk::LogicOp::COPY,
            attachment_count: 1,
            p_attachments: &color_blend_attachment,
            ..Default::default()
        };

        let set_layouts = desc.set_layouts.iter().map(|l| l.inner).collect::<Vec<_>>();

        let push_constant_range = vk::PushConstantRange {
            stage_flags: vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
            offset: 0,
            size: desc.push_constant_size,
        };

        let pipeline_layout_info = vk::PipelineLayoutCreateInfo {
            set_layout_count: set_layouts.len() as u32,
            p_set_layouts: set_layouts.as_ptr(),
            push_constant_range_count: if desc.push_constant_size > 0 { 1 } else { 0 },
            p_push_constant_ranges: &push_constant_range,
            ..Default::default()
        };

        let layout = unsafe {
            device
                .inner
                .create_pipeline_layout(&pipeline_layout_info, None)
                .map_to_err("Cannot create pipeline layout")?
        };

        let mut rendering_info = vk::PipelineRenderingCreateInfo {
            color_attachment_count: 1,
            p_color_attachment_formats: &desc.color_format,
            depth_attachment_format: desc.depth_format.unwrap_or(vk::Format::UNDEFINED),
            ..Default::default()
        };

        let pipeline_info = vk::GraphicsPipelineCreateInfo {
            stage_count: stages.len() as u32,
            p_stages: stages.as_ptr(),
            p_vertex_input_state: &vertex_input_info,
            p_input_assembly_state: &input_assembly,
            p_viewport_state: &viewport_state,
            p_rasterization_state: &rasterizer,
            p_multisample_state: &multisampling,
            p_depth_stencil_state: &depth_stencil,
            p_color_blend_state: &color_blending,
            p_dynamic_state: &dynamic_state,
            layout,
            ..Default::default()
        }
        .push_next(&mut rendering_info);

        let pipelines = unsafe {
            device
                .inner
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
        };

        let inner = match pipelines {
            Ok(p) => p[0],
            Err((_, code)) => {
                unsafe { device.inner.destroy_pipeline_layout(layout, None) };
                return Err(VulkanError::new("Cannot create pipeline", code));
            }
        };

        Ok(Self { inner, layout, device })
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.inner.destroy_pipeline(self.inner, None);
            self.device.inner.destroy_pipeline_layout(self.layout, None);
        }
    }
}

impl DebugMarker for Pipeline {
    fn device(&self) -> &Rc<Device> {
        &self.device
    }

    fn object_type(&self) -> vk::ObjectType {
        vk::ObjectType::PIPELINE
    }

    fn handle(&self) -> u64 {
        self.inner.as_raw()
    }
}
