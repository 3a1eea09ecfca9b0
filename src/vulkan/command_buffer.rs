use crate::vulkan::image_view::subresource_range;
use crate::vulkan::{Buffer, DescriptorSet, Device, IntoVulkanError, Pipeline, VulkanError};
use ash::vk;
use ash::vk::{CommandBuffer as RawCommandBuffer, Rect2D, Viewport};
use std::rc::Rc;

pub struct CommandBuffer {
    pub inner: RawCommandBuffer,
    device: Rc<Device>,
}

/// One image layout transition.
#[derive(Copy, Clone, Debug)]
pub struct ImageBarrier {
    pub image: vk::Image,
    pub aspect: vk::ImageAspectFlags,
    pub old_layout: vk::ImageLayout,
    pub new_layout: vk::ImageLayout,
    pub src_access: vk::AccessFlags,
    pub dst_access: vk::AccessFlags,
    pub src_stage: vk::PipelineStageFlags,
    pub dst_stage: vk::PipelineStageFlags,
}

impl CommandBuffer {
    pub fn new(device: Rc<Device>, inner: RawCommandBuffer) -> Self {
        Self { device, inner }
    }

    pub fn reset(&self) -> Result<(), VulkanError> {
        unsafe {
            self.device
                .inner
                .reset_command_buffer(self.inner, vk::CommandBufferResetFlags::empty())
                .map_to_err("Cannot reset command buffer")
        }
    }

    pub fn begin(&self) -> Result<(), VulkanError> {
        let begin_info = vk::CommandBufferBeginInfo::default();

        unsafe {
            self.device
                .inner
                .begin_command_buffer(self.inner, &begin_info)
                .map_to_err("cannot begin recording")
        }
    }

    pub fn begin_one_time(&self) -> Result<(), VulkanError> {
        let begin_info = vk::CommandBufferBeginInfo {
            flags: vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT,
            ..Default::default()
        };

        unsafe {
            self.device
                .inner
                .begin_command_buffer(self.inner, &begin_info)
                .map_to_err("cannot begin recording")
        }
    }

    pub fn end(&self) -> Result<(), VulkanError> {
        unsafe {
            self.device
                .inner
                .end_command_buffer(self.inner)
                .map_to_err("cannot end command buffer")
        }
    }

    pub fn begin_rendering(&self, info: &vk::RenderingInfo) {
        unsafe { self.device.inner.cmd_begin_rendering(self.inner, info) }
    }

    pub fn end_rendering(&self) {
        unsafe { self.device.inner.cmd_end_rendering(self.inner) }
    }

    pub fn bind_graphics_pipeline(&self, pipeline: &Pipeline) {
        unsafe {
            self.device
                .inner
                .cmd_bind_pipeline(self.inner, vk::PipelineBindPoint::GRAPHICS, pipeline.inner)
        }
    }

    pub fn bind_descriptor_sets(&self, pipeline: &Pipeline, first_set: u32, sets: &[&DescriptorSet]) {
        let sets = sets.iter().map(|s| s.inner).collect::<Vec<_>>();

        unsafe {
            self.device.inner.cmd_bind_descriptor_sets(
                self.inner,
                vk::PipelineBindPoint::GRAPHICS,
                pipeline.layout,
                first_set,
                &sets,
                &[],
            )
        }
    }

    pub fn push_constants(&self, pipeline: &Pipeline, data: &[u8]) {
        unsafe {
            self.device.inner.cmd_push_constants(
                self.inner,
                pipeline.layout,
                vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                0,
                data,
            )
        }
    }

    pub fn bind_vertex_buffer(&self, buffer: &Buffer, offset: u64) {
        unsafe {
            self.device
                .inner
                .cmd_bind_vertex_buffers(self.inner, 0, &[buffer.inner], &[offset])
        }
    }

    pub fn bind_index_buffer(&self, buffer: &Buffer, offset: u64, index_type: vk::IndexType) {
        unsafe {
            self.device
                .inner
                .cmd_bind_index_buffer(self.inner, buffer.inner, offset, index_type)
        }
    }

    pub fn draw(&self, vertex_count: u32) {
        unsafe { self.device.inner.cmd_draw(self.inner, vertex_count, 1, 0, 0) }
    }

    pub fn draw_indexed(&self, index_count: u32) {
        unsafe { self.device.inner.cmd_draw_indexed(self.inner, index_count, 1, 0, 0, 0) }
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        unsafe { self.device.inner.cmd_set_viewport(self.inner, 0, &[viewport]) }
    }

    pub fn set_scissor(&self, scissor: Rect2D) {
        unsafe { self.device.inner.cmd_set_scissor(self.inner, 0, &[scissor]) }
    }

    pub fn image_barrier(&self, barrier: ImageBarrier) {
        let image_barrier = vk::ImageMemoryBarrier {
            src_access_mask: barrier.src_access,
            dst_access_mask: barrier.dst_access,
            old_layout: barrier.old_layout,
            new_layout: barrier.new_layout,
            src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            image: barrier.image,
            subresource_range: subresource_range(barrier.aspect),
            ..Default::default()
        };

        unsafe {
            self.device.inner.cmd_pipeline_barrier(
                self.inner,
                barrier.src_stage,
                barrier.dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[image_barrier],
            )
        }
    }

    pub fn copy_buffer(&self, src: &Buffer, dst: &Buffer, size: u64) {
        let region = vk::BufferCopy {
            src_offset: 0,
            dst_offset: 0,
            size,
        };

        unsafe {
            self.device
                .inner
                .cmd_copy_buffer(self.inner, src.inner, dst.inner, &[region])
        }
    }

    /// Copies tightly packed pixels into a color image in TRANSFER_DST_OPTIMAL layout.
    pub fn copy_buffer_to_image(&self, src: &Buffer, image: vk::Image, extent: vk::Extent3D) {
        let region = vk::BufferImageCopy {
            buffer_offset: 0,
            buffer_row_length: 0,
            buffer_image_height: 0,
            image_subresource: vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            },
            image_offset: vk::Offset3D::default(),
            image_extent: extent,
        };

        unsafe {
            self.device.inner.cmd_copy_buffer_to_image(
                self.inner,
                src.inner,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            )
        }
    }
}
