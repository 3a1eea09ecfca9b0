use crate::err::AppError;
use crate::renderer::push_const::DRAW_CONSTANTS_SIZE;
use crate::renderer::shader_archive::ShaderArchive;
use crate::shader::ShadingModel;
use crate::vulkan::{
    DebugMarker, DescriptorSetLayout, Device, GraphicsPipelineDesc, Pipeline, ShaderModule, ShaderStage,
};
use ash::vk;
use log::info;
use std::collections::HashMap;
use std::rc::Rc;

/// Key of a scene pipeline: shading model plus whether it rasterizes lines.
pub type PipelineKey = (ShadingModel, bool);

pub struct PipelineBuilder {
    pipelines: HashMap<PipelineKey, Pipeline>,
}

impl PipelineBuilder {
    pub fn build(
        shaders: &ShaderArchive,
        device: Rc<Device>,
        color_format: vk::Format,
        depth_format: vk::Format,
        set_layouts: &[&DescriptorSetLayout],
    ) -> Result<Self, AppError> {
        let mut pipelines = HashMap::new();

        for model in ShadingModel::ALL {
            let program = shaders.program(model)?;

            let vertex = ShaderModule::new(
                program.vertex.code,
                device.clone(),
                ShaderStage::Vertex,
                Some(program.vertex.name),
            )?;
            let fragment = ShaderModule::new(
                program.fragment.code,
                device.clone(),
                ShaderStage::Fragment,
                Some(program.fragment.name),
            )?;

            for wireframe in [false, true] {
                let desc = GraphicsPipelineDesc {
                    vertex: &vertex,
                    fragment: &fragment,
                    color_format,
                    depth_format: program.depth_test.then_some(depth_format),
                    polygon_mode: polygon_mode(wireframe),
                    set_layouts,
                    push_constant_size: DRAW_CONSTANTS_SIZE as u32,
                };

                let pipeline = Pipeline::new_graphics(device.clone(), &desc)?;
                pipeline.name(pipeline_label(model, wireframe))?;

                pipelines.insert((model, wireframe), pipeline);
            }
        }

        info!("built {} pipelines", pipelines.len());

        Ok(Self { pipelines })
    }

    pub fn get(&self, model: ShadingModel, wireframe: bool) -> Option<&Pipeline> {
        self.pipelines.get(&(model, wireframe))
    }
}

fn polygon_mode(wireframe: bool) -> vk::PolygonMode {
    if wireframe {
        vk::PolygonMode::LINE
    } else {
        vk::PolygonMode::FILL
    }
}

fn pipeline_label(model: ShadingModel, wireframe: bool) -> String {
    if wireframe {
        format!("{}_wireframe", model.pipeline_name())
    } else {
        model.pipeline_name().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wireframe_uses_line_mode() {
        assert_eq!(polygon_mode(true), vk::PolygonMode::LINE);
        assert_eq!(polygon_mode(false), vk::PolygonMode::FILL);
    }

    #[test]
    fn labels_name_the_fill_mode() {
        assert_eq!(pipeline_label(ShadingModel::Gouraud, false), "gouraud");
        assert_eq!(pipeline_label(ShadingModel::Phong, true), "phong_wireframe");
    }
}
