use crate::texture::{Texture, TextureKind};
use crate::vulkan::command_buffer::ImageBarrier;
use crate::vulkan::{Buffer, CommandPool, DebugMarker, Device, Image, ImageView, Sampler, VulkanError};
use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::Allocator;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

/// Colour maps are stored as sRGB. The specular slot holds data and is read linearly.
pub fn texture_format(kind: TextureKind) -> vk::Format {
    match kind {
        TextureKind::Diffuse | TextureKind::Emission => vk::Format::R8G8B8A8_SRGB,
        TextureKind::Specular => vk::Format::R8G8B8A8_UNORM,
    }
}

/// Sampled image built from a [`Texture`], left in SHADER_READ_ONLY_OPTIMAL.
pub struct VulkanTexture {
    pub sampler: Sampler,
    pub view: ImageView,
    pub image: Image,
}

impl VulkanTexture {
    pub fn new(
        device: Rc<Device>,
        allocator: Arc<Mutex<Allocator>>,
        cmd_pool: &CommandPool,
        texture: &Texture,
        format: vk::Format,
    ) -> Result<Self, VulkanError> {
        let extent = vk::Extent3D {
            width: texture.width,
            height: texture.height,
            depth: 1,
        };

        let mut staging = Buffer::new(
            device.clone(),
            allocator.clone(),
            MemoryLocation::CpuToGpu,
            vk::BufferUsageFlags::TRANSFER_SRC,
            texture.pixels.len() as u64,
        )?;
        staging.fill_host(&texture.pixels)?;

        let image = Image::new(
            device.clone(),
            allocator,
            format,
            extent,
            vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST,
        )?;
        image.name(&texture.name)?;

        cmd_pool.one_time_submit(|cmd| {
            cmd.image_barrier(ImageBarrier {
                image: image.inner,
                aspect: vk::ImageAspectFlags::COLOR,
                old_layout: vk::ImageLayout::UNDEFINED,
                new_layout: vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                src_access: vk::AccessFlags::empty(),
                dst_access: vk::AccessFlags::TRANSFER_WRITE,
                src_stage: vk::PipelineStageFlags::TOP_OF_PIPE,
                dst_stage: vk::PipelineStageFlags::TRANSFER,
            });

            cmd.copy_buffer_to_image(&staging, image.inner, extent);

            cmd.image_barrier(ImageBarrier {
                image: image.inner,
                aspect: vk::ImageAspectFlags::COLOR,
                old_layout: vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                new_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                src_access: vk::AccessFlags::TRANSFER_WRITE,
                dst_access: vk::AccessFlags::SHADER_READ,
                src_stage: vk::PipelineStageFlags::TRANSFER,
                dst_stage: vk::PipelineStageFlags::FRAGMENT_SHADER,
            });
        })?;

        let view = ImageView::new(device.clone(), image.inner, format, vk::ImageAspectFlags::COLOR)?;
        let sampler = Sampler::new(device, texture.sampler)?;

        Ok(Self { sampler, view, image })
    }

    pub fn descriptor_info(&self) -> vk::DescriptorImageInfo {
        vk::DescriptorImageInfo {
            sampler: self.sampler.inner,
            image_view: self.view.inner,
            image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_colour_maps_are_srgb() {
        assert_eq!(texture_format(TextureKind::Diffuse), vk::Format::R8G8B8A8_SRGB);
        assert_eq!(texture_format(TextureKind::Emission), vk::Format::R8G8B8A8_SRGB);
        assert_eq!(texture_format(TextureKind::Specular), vk::Format::R8G8B8A8_UNORM);
    }
}
