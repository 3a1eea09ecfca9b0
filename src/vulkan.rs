use ash::vk;
use std::borrow::Cow;
use std::ffi::{CStr, CString};
use std::rc::Rc;
use thiserror::Error;

mod buffer;
mod command_buffer;
mod command_pool;
mod descriptor;
mod device;
mod image;
mod image_view;
mod instance;
mod mesh;
mod pipeline;
mod sampler;
mod shader;
mod surface;
mod swapchain;
mod sync;
mod texture;
mod vertex;

pub use buffer::Buffer;
pub use command_buffer::{CommandBuffer, ImageBarrier};
pub use command_pool::CommandPool;
pub use descriptor::{DescriptorPool, DescriptorSet, DescriptorSetLayout};
pub use device::{Device, DeviceInfo, DeviceQueryResult};
pub use image::Image;
pub use image_view::ImageView;
pub use instance::Instance;
pub use mesh::VulkanMesh;
pub use pipeline::{GraphicsPipelineDesc, Pipeline};
pub use sampler::Sampler;
pub use shader::{ShaderModule, ShaderStage};
pub use surface::{Surface, SwapChainSupport};
pub use swapchain::Swapchain;
pub use sync::{Fence, Semaphore};
pub use texture::{VulkanTexture, texture_format};
pub use vertex::Vertex;

pub const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";
pub const DEBUG_UTILS_EXTENSION: &CStr = ash::ext::debug_utils::NAME;
pub const SWAPCHAIN_EXTENSION: &CStr = ash::khr::swapchain::NAME;

#[derive(Error, Debug)]
#[error("{msg}: {code}")]
pub struct VulkanError {
    pub msg: Cow<'static, str>,
    pub code: vk::Result,
}

impl VulkanError {
    pub fn new(msg: impl Into<Cow<'static, str>>, code: vk::Result) -> Self {
        Self { msg: msg.into(), code }
    }

    /// The swapchain no longer matches the surface and has to be recreated.
    pub fn is_out_of_date(&self) -> bool {
        self.code == vk::Result::ERROR_OUT_OF_DATE_KHR
    }
}

pub trait IntoVulkanError<T> {
    fn map_to_err(self, msg: impl Into<Cow<'static, str>>) -> Result<T, VulkanError>;
}

impl<T> IntoVulkanError<T> for ash::prelude::VkResult<T> {
    fn map_to_err(self, msg: impl Into<Cow<'static, str>>) -> Result<T, VulkanError> {
        self.map_err(|code| VulkanError { code, msg: msg.into() })
    }
}

/// Objects that can carry a debug name visible in validation messages and capture tools.
pub trait DebugMarker {
    fn device(&self) -> &Rc<Device>;
    fn object_type(&self) -> vk::ObjectType;
    fn handle(&self) -> u64;

    fn name(&self, name: impl AsRef<str>) -> Result<(), VulkanError> {
        let Ok(name) = CString::new(name.as_ref()) else {
            return Ok(());
        };

        let name_info = vk::DebugUtilsObjectNameInfoEXT {
            object_type: self.object_type(),
            object_handle: self.handle(),
            p_object_name: name.as_ptr(),
            ..Default::default()
        };

        self.device().name_object(name_info)
    }
}
