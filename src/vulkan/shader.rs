use crate::vulkan::{DebugMarker, Device, IntoVulkanError, VulkanError};
use ash::vk;
use ash::vk::Handle;
use std::ffi::CStr;
use std::rc::Rc;

const ENTRY: &CStr = c"main";

pub struct ShaderModule {
    pub inner: vk::ShaderModule,
    pub stage: ShaderStage,
    device: Rc<Device>,
}

impl ShaderModule {
    pub fn new(
        bytecode: &[u8],
        device: Rc<Device>,
        shader_stage: ShaderStage,
        name: Option<&str>,
    ) -> Result<Self, VulkanError> {
        let code = ash::util::read_spv(&mut std::io::Cursor::new(bytecode))
            .map_err(|_| VulkanError::new("malformed SPIR-V", vk::Result::ERROR_INITIALIZATION_FAILED))?;

        let create_info = vk::ShaderModuleCreateInfo {
            code_size: code.len() * size_of::<u32>(),
            p_code: code.as_ptr(),
            ..Default::default()
        };

        let inner = unsafe {
            device
                .inner
                .create_shader_module(&create_info, None)
                .map_to_err("cannot create shader module")?
        };

        let module = Self {
            inner,
            stage: shader_stage,
            device,
        };

        if let Some(name) = name {
            module.name(name)?;
        }

        Ok(module)
    }

    pub fn stage_info(&self) -> vk::PipelineShaderStageCreateInfo<'static> {
        vk::PipelineShaderStageCreateInfo {
            stage: self.stage.into(),
            module: self.inner,
            p_name: ENTRY.as_ptr(),
            ..Default::default()
        }
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe { self.device.inner.destroy_shader_module(self.inner, None) }
    }
}

impl DebugMarker for ShaderModule {
    fn device(&self) -> &Rc<Device> {
        &self.device
    }

    fn object_type(&self) -> vk::ObjectType {
        vk::ObjectType::SHADER_MODULE
    }

    fn handle(&self) -> u64 {
        self.inner.as_raw()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl From<ShaderStage> for vk::ShaderStageFlags {
    fn from(value: ShaderStage) -> Self {
        match value {
            ShaderStage::Vertex => Self::VERTEX,
            ShaderStage::Fragment => Self::FRAGMENT,
        }
    }
}
