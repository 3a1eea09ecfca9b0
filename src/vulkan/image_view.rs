use crate::vulkan::{DebugMarker, Device, IntoVulkanError, VulkanError};
use ash::vk;
use ash::vk::{Handle, Image, ImageView as RawImageView};
use std::rc::Rc;

pub struct ImageView {
    pub inner: RawImageView,
    pub aspect: vk::ImageAspectFlags,
    device: Rc<Device>,
}

impl ImageView {
    pub fn new(
        device: Rc<Device>,
        image: Image,
        format: vk::Format,
        aspect: vk::ImageAspectFlags,
    ) -> Result<Self, VulkanError> {
        let create_info = vk::ImageViewCreateInfo {
            image,
            view_type: vk::ImageViewType::TYPE_2D,
            format,
            components: vk::ComponentMapping::default(),
            subresource_range: subresource_range(aspect),
            ..Default::default()
        };

        let inner = unsafe {
            device
                .inner
                .create_image_view(&create_info, None)
                .map_to_err("Cannot create image view")?
        };

        Ok(Self { inner, aspect, device })
    }
}

/// The single mip level and layer every image here has.
pub fn subresource_range(aspect_mask: vk::ImageAspectFlags) -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask,
        base_mip_level: 0,
        level_count: 1,
        base_array_layer: 0,
        layer_count: 1,
    }
}

impl Drop for ImageView {
    fn drop(&mut self) {
        unsafe { self.device.inner.destroy_image_view(self.inner, None) }
    }
}

impl DebugMarker for ImageView {
    fn device(&self) -> &Rc<Device> {
        &self.device
    }

    fn object_type(&self) -> vk::ObjectType {
        vk::ObjectType::IMAGE_VIEW
    }

    fn handle(&self) -> u64 {
        self.inner.as_raw()
    }
}
