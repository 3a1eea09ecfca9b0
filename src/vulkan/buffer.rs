use crate::vulkan::{DebugMarker, Device, IntoVulkanError, VulkanError};
use ash::vk;
use ash::vk::Handle;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator};
use log::error;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

pub struct Buffer {
    pub inner: vk::Buffer,
    pub size: u64,
    allocation: Option<Allocation>,
    allocator: Arc<Mutex<Allocator>>,
    device: Rc<Device>,
}

impl Buffer {
    pub fn new(
        device: Rc<Device>,
        allocator: Arc<Mutex<Allocator>>,
        location: MemoryLocation,
        usage: vk::BufferUsageFlags,
        size: u64,
    ) -> Result<Self, VulkanError> {
        let info = vk::BufferCreateInfo {
            size,
            usage,
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            ..Default::default()
        };

        let inner = unsafe {
            device
                .inner
                .create_buffer(&info, None)
                .map_to_err("Cannot create buffer")?
        };

        let requirements = unsafe { device.inner.get_buffer_memory_requirements(inner) };

        let allocation = allocator
            .lock()
            .map_err(|_| VulkanError::new("allocator poisoned", vk::Result::ERROR_UNKNOWN))?
            .allocate(&AllocationCreateDesc {
                name: "buffer",
                requirements,
                location,
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| VulkanError::new(format!("Cannot allocate buffer memory: {e}"), vk::Result::ERROR_OUT_OF_DEVICE_MEMORY))?;

        unsafe {
            device
                .inner
                .bind_buffer_memory(inner, allocation.memory(), allocation.offset())
                .map_to_err("Cannot bind memory to buffer")?
        };

        Ok(Self {
            inner,
            size,
            allocation: Some(allocation),
            allocator,
            device,
        })
    }

    /// Copies `data` into a host visible buffer.
    pub fn fill_host(&mut self, data: &[u8]) -> Result<(), VulkanError> {
        let mapped = self
            .allocation
            .as_mut()
            .and_then(|a| a.mapped_slice_mut())
            .ok_or_else(|| VulkanError::new("buffer is not host visible", vk::Result::ERROR_MEMORY_MAP_FAILED))?;

        if data.len() > mapped.len() {
            return Err(VulkanError::new(
                format!("{} bytes do not fit a buffer of {}", data.len(), mapped.len()),
                vk::Result::ERROR_UNKNOWN,
            ));
        }

        mapped[..data.len()].copy_from_slice(data);

        Ok(())
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe { self.device.inner.destroy_buffer(self.inner, None) };

        if let Some(allocation) = self.allocation.take() {
            match self.allocator.lock() {
                Ok(mut allocator) => {
                    if let Err(e) = allocator.free(allocation) {
                        error!("cannot free buffer memory: {e}");
                    }
                }
                Err(_) => error!("allocator poisoned, leaking buffer memory"),
            }
        }
    }
}

impl DebugMarker for Buffer {
    fn device(&self) -> &Rc<Device> {
        &self.device
    }

    fn object_type(&self) -> vk::ObjectType {
        vk::ObjectType::BUFFER
    }

    fn handle(&self) -> u64 {
        self.inner.as_raw()
    }
}
