use crate::vulkan::{DebugMarker, Device, IntoVulkanError, VulkanError};
use ash::vk;
use ash::vk::{Handle, Image as RawImage};
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator};
use log::error;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

pub struct Image {
    pub inner: RawImage,
    pub format: vk::Format,
    pub extent: vk::Extent3D,
    allocation: Option<Allocation>,
    allocator: Arc<Mutex<Allocator>>,
    device: Rc<Device>,
}

impl Image {
    pub fn new(
        device: Rc<Device>,
        allocator: Arc<Mutex<Allocator>>,
        format: vk::Format,
        extent: vk::Extent3D,
        usage: vk::ImageUsageFlags,
    ) -> Result<Self, VulkanError> {
        let create_info = vk::ImageCreateInfo {
            image_type: vk::ImageType::TYPE_2D,
            format,
            extent,
            mip_levels: 1,
            array_layers: 1,
            samples: vk::SampleCountFlags::TYPE_1,
            tiling: vk::ImageTiling::OPTIMAL,
            usage,
            initial_layout: vk::ImageLayout::UNDEFINED,
            ..Default::default()
        };

        let inner = unsafe {
            device
                .inner
                .create_image(&create_info, None)
                .map_to_err("Cannot create image")?
        };

        let requirements = unsafe { device.inner.get_image_memory_requirements(inner) };

        let allocation = allocator
            .lock()
            .map_err(|_| VulkanError::new("allocator poisoned", vk::Result::ERROR_UNKNOWN))?
            .allocate(&AllocationCreateDesc {
                name: "image",
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| VulkanError::new(format!("Cannot allocate image memory: {e}"), vk::Result::ERROR_OUT_OF_DEVICE_MEMORY))?;

        unsafe {
            device
                .inner
                .bind_image_memory(inner, allocation.memory(), allocation.offset())
                .map_to_err("Cannot bind memory to image")?
        };

        Ok(Self {
            inner,
            format,
            extent,
            allocation: Some(allocation),
            allocator,
            device,
        })
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        unsafe { self.device.inner.destroy_image(self.inner, None) };

        if let Some(allocation) = self.allocation.take() {
            match self.allocator.lock() {
                Ok(mut allocator) => {
                    if let Err(e) = allocator.free(allocation) {
                        error!("cannot free image memory: {e}");
                    }
                }
                Err(_) => error!("allocator poisoned, leaking image memory"),
            }
        }
    }
}

impl DebugMarker for Image {
    fn device(&self) -> &Rc<Device> {
        &self.device
    }

    fn object_type(&self) -> vk::ObjectType {
        vk::ObjectType::IMAGE
    }

    fn handle(&self) -> u64 {
        self.inner.as_raw()
    }
}
