use crate::vulkan::{DebugMarker, Device, Image, ImageView, VulkanError};
use ash::vk;
use ash::vk::Extent3D;
use gpu_allocator::vulkan::Allocator;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

pub const DEPTH_FORMAT: vk::Format = vk::Format::D32_SFLOAT;

/// Window sized attachment that is rebuilt whenever the swapchain changes size.
pub struct RenderTarget {
    pub view: ImageView,
    pub image: Image,
    pub format: vk::Format,
    pub usage: vk::ImageUsageFlags,
    aspect: vk::ImageAspectFlags,
    name: String,
    allocator: Arc<Mutex<Allocator>>,
    device: Rc<Device>,
}

impl RenderTarget {
    pub fn new(
        device: Rc<Device>,
        allocator: Arc<Mutex<Allocator>>,
        name: impl Into<String>,
        extent: vk::Extent2D,
        format: vk::Format,
        usage: vk::ImageUsageFlags,
        aspect: vk::ImageAspectFlags,
    ) -> Result<Self, VulkanError> {
        let name = name.into();
        let (image, view) = Self::build(&device, &allocator, &name, extent, format, usage, aspect)?;

        Ok(Self {
            view,
            image,
            format,
            usage,
            aspect,
            name,
            allocator,
            device,
        })
    }

    pub fn new_depth(
        device: Rc<Device>,
        allocator: Arc<Mutex<Allocator>>,
        extent: vk::Extent2D,
    ) -> Result<Self, VulkanError> {
        Self::new(
            device,
            allocator,
            "depth",
            extent,
            DEPTH_FORMAT,
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            vk::ImageAspectFlags::DEPTH,
        )
    }

    pub fn resize(&mut self, extent: vk::Extent2D) -> Result<(), VulkanError> {
        let (image, view) = Self::build(
            &self.device,
            &self.allocator,
            &self.name,
            extent,
            self.format,
            self.usage,
            self.aspect,
        )?;

        // view first, it references the old image
        self.view = view;
        self.image = image;

        Ok(())
    }

    pub fn extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.image.extent.width,
            height: self.image.extent.height,
        }
    }

    fn build(
        device: &Rc<Device>,
        allocator: &Arc<Mutex<Allocator>>,
        name: &str,
        extent: vk::Extent2D,
        format: vk::Format,
        usage: vk::ImageUsageFlags,
        aspect: vk::ImageAspectFlags,
    ) -> Result<(Image, ImageView), VulkanError> {
        let extent = Extent3D {
            width: extent.width.max(1),
            height: extent.height.max(1),
            depth: 1,
        };

        let image = Image::new(device.clone(), allocator.clone(), format, extent, usage)?;
        let view = ImageView::new(device.clone(), image.inner, format, aspect)?;

        image.name(format!("{name}_image"))?;
        view.name(format!("{name}_imageview"))?;

        Ok((image, view))
    }
}
