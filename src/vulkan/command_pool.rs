use crate::vulkan::command_buffer::CommandBuffer;
use crate::vulkan::{Device, IntoVulkanError, VulkanError};
use ash::vk;
use ash::vk::CommandPool as RawCommandPool;
use std::rc::Rc;

pub struct CommandPool {
    pub inner: RawCommandPool,
    device: Rc<Device>,
}

impl CommandPool {
    pub fn new_graphics(device: Rc<Device>) -> Result<Self, VulkanError> {
        let command_pool = vk::CommandPoolCreateInfo {
            flags: vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
            queue_family_index: device.graphics_queue_family,
            ..Default::default()
        };

        let inner = unsafe {
            device
                .inner
                .create_command_pool(&command_pool, None)
                .map_to_err("Cannot create command pool")?
        };

        Ok(Self { device, inner })
    }

    pub fn allocate_cmd_buffers(&self, count: u32) -> Result<Vec<CommandBuffer>, VulkanError> {
        let alloc_info = vk::CommandBufferAllocateInfo {
            command_pool: self.inner,
            level: vk::CommandBufferLevel::PRIMARY,
            command_buffer_count: count,
            ..Default::default()
        };

        let command_buffers = unsafe {
            self.device
                .inner
                .allocate_command_buffers(&alloc_info)
                .map_to_err("Cannot allocate command buffer")?
        };

        Ok(command_buffers
            .into_iter()
            .map(|inner| CommandBuffer::new(self.device.clone(), inner))
            .collect::<Vec<_>>())
    }

    /// Records `record` into a fresh command buffer, submits it to the graphics queue and waits for it.
    pub fn one_time_submit(&self, record: impl FnOnce(&CommandBuffer)) -> Result<(), VulkanError> {
        let mut buffers = self.allocate_cmd_buffers(1)?;
        let Some(cmd) = buffers.pop() else {
            return Err(VulkanError::new("no command buffer allocated", vk::Result::ERROR_UNKNOWN));
        };

        cmd.begin_one_time()?;
        record(&cmd);
        cmd.end()?;

        let submit_info = vk::SubmitInfo {
            command_buffer_count: 1,
            p_command_buffers: &cmd.inner,
            ..Default::default()
        };

        let result = unsafe {
            self.device
                .inner
                .queue_submit(self.device.graphics_queue, &[submit_info], vk::Fence::null())
                .map_to_err("cannot submit upload")
                .and_then(|_| {
                    self.device
                        .inner
                        .queue_wait_idle(self.device.graphics_queue)
                        .map_to_err("cannot wait for upload")
                })
        };

        unsafe { self.device.inner.free_command_buffers(self.inner, &[cmd.inner]) };

        result
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            self.device.inner.destroy_command_pool(self.inner, None);
        }
    }
}
