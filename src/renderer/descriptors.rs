use crate::frame::FRAME_UNIFORMS_SIZE;
use crate::vulkan::{Buffer, DescriptorPool, DescriptorSet, DescriptorSetLayout, Device, VulkanError};
use ash::vk;
use log::debug;
use std::collections::HashMap;
use std::rc::Rc;

const MATERIAL_SETS_PER_POOL: u32 = 64;

/// Texture ids of the diffuse, specular and emission slots.
pub type TextureTriple = [Option<u64>; 3];

pub struct RendererDescriptors {
    pub frame_sets: Vec<FrameSet>,
    material_sets: HashMap<TextureTriple, DescriptorSet>,
    material_pools: Vec<(DescriptorPool, u32)>,
    _frame_pool: DescriptorPool,
    pub layouts: HashMap<DescLayout, DescriptorSetLayout>,
    device: Rc<Device>,
}

impl RendererDescriptors {
    pub fn build(device: Rc<Device>, frames_in_flight: u32) -> Result<Self, VulkanError> {
        let mut layouts = HashMap::new();

        for layout in [DescLayout::Frame, DescLayout::Material] {
            let l = DescriptorSetLayout::new(device.clone(), &layout.get_bindings())?;

            layouts.insert(layout, l);
        }

        let frame_pool = DescriptorPool::new(
            device.clone(),
            &[vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: frames_in_flight,
            }],
            frames_in_flight,
        )?;

        let frame_layout = &layouts[&DescLayout::Frame];
        let frame_sets = frame_pool
            .allocate_sets(&vec![frame_layout; frames_in_flight as usize])?
            .into_iter()
            .map(|inner| FrameSet { inner })
            .collect();

        Ok(Self {
            frame_sets,
            material_sets: HashMap::new(),
            material_pools: Vec::new(),
            _frame_pool: frame_pool,
            layouts,
            device,
        })
    }

    pub fn get_layout(&self, layout: DescLayout) -> &DescriptorSetLayout {
        &self.layouts[&layout]
    }

    /// Returns the material set for `key`, writing `images` into a new one on first use.
    pub fn material_set(
        &mut self,
        key: TextureTriple,
        images: [vk::DescriptorImageInfo; 3],
    ) -> Result<DescriptorSet, VulkanError> {
        if !self.material_sets.contains_key(&key) {
            let set = self.allocate_material_set()?;

            let writes = images
                .into_iter()
                .enumerate()
                .map(|(binding, info)| image_update(info, &set, binding as u32))
                .collect();

            DescriptorWriter::batch_write(&self.device, writes);

            debug!("new material set for {key:?}");
            self.material_sets.insert(key, set);
        }

        self.material_sets
            .get(&key)
            .copied()
            .ok_or_else(|| VulkanError::new("material set missing", vk::Result::ERROR_UNKNOWN))
    }

    fn allocate_material_set(&mut self) -> Result<DescriptorSet, VulkanError> {
        let needs_pool = self
            .material_pools
            .last()
            .is_none_or(|(_, used)| *used >= MATERIAL_SETS_PER_POOL);

        if needs_pool {
            let pool = DescriptorPool::new(
                self.device.clone(),
                &[vk::DescriptorPoolSize {
                    ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                    descriptor_count: MATERIAL_SETS_PER_POOL * 3,
                }],
                MATERIAL_SETS_PER_POOL,
            )?;
            self.material_pools.push((pool, 0));
        }

        let layout = &self.layouts[&DescLayout::Material];

        let Some((pool, used)) = self.material_pools.last_mut() else {
            return Err(VulkanError::new("no descriptor pool", vk::Result::ERROR_OUT_OF_POOL_MEMORY));
        };

        let set = pool
            .allocate_sets(&[layout])?
            .pop()
            .ok_or_else(|| VulkanError::new("no descriptor set allocated", vk::Result::ERROR_OUT_OF_POOL_MEMORY))?;
        *used += 1;

        Ok(set)
    }
}

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum DescLayout {
    Frame,
    Material,
}

impl DescLayout {
    pub fn get_bindings(&self) -> Vec<vk::DescriptorSetLayoutBinding<'static>> {
        match self {
            DescLayout::Frame => {
                vec![vk::DescriptorSetLayoutBinding {
                    binding: 0,
                    descriptor_count: 1,
                    stage_flags: vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                    descriptor_type: vk::DescriptorType::UNIFORM_BUFFER,
                    ..Default::default()
                }]
            }
            DescLayout::Material => (0..3)
                .map(|binding| vk::DescriptorSetLayoutBinding {
                    binding,
                    descriptor_count: 1,
                    stage_flags: vk::ShaderStageFlags::FRAGMENT,
                    descriptor_type: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                    ..Default::default()
                })
                .collect(),
        }
    }
}

pub struct DescriptorWrite {
    write: vk::WriteDescriptorSet<'static>,
    buffer_info: Option<vk::DescriptorBufferInfo>,
    image_info: Option<vk::DescriptorImageInfo>,
}

pub struct DescriptorWriter {}

impl DescriptorWriter {
    pub fn batch_write(device: &Device, writes: Vec<DescriptorWrite>) {
        let mapped_writes = writes
            .iter()
            .map(|w| {
                let p_buffer_info = match w.buffer_info {
                    Some(ref a) => std::ptr::addr_of!(*a),
                    None => std::ptr::null(),
                };

                let p_image_info = match w.image_info {
                    Some(ref a) => std::ptr::addr_of!(*a),
                    None => std::ptr::null(),
                };

                vk::WriteDescriptorSet {
                    p_buffer_info,
                    p_image_info,
                    ..w.write
                }
            })
            .collect::<Vec<_>>();

        unsafe { device.inner.update_descriptor_sets(&mapped_writes, &[]) }
    }
}

pub struct FrameSet {
    pub inner: DescriptorSet,
}

impl FrameSet {
    pub fn update_frame(&self, buffer: &Buffer) -> DescriptorWrite {
        let buffer_info = vk::DescriptorBufferInfo {
            buffer: buffer.inner,
            offset: 0,
            range: FRAME_UNIFORMS_SIZE as u64,
        };

        let write = vk::WriteDescriptorSet {
            dst_set: self.inner.inner,
            dst_binding: 0,
            dst_array_element: 0,
            descriptor_type: vk::DescriptorType::UNIFORM_BUFFER,
            descriptor_count: 1,
            ..Default::default()
        };

        DescriptorWrite {
            write,
            buffer_info: Some(buffer_info),
            image_info: None,
        }
    }
}

fn image_update(info: vk::DescriptorImageInfo, dst_set: &DescriptorSet, binding: u32) -> DescriptorWrite {
    let write = vk::WriteDescriptorSet {
        dst_set: dst_set.inner,
        dst_binding: binding,
        dst_array_element: 0,
        descriptor_type: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
        descriptor_count: 1,
        ..Default::default()
    };

    DescriptorWrite {
        write,
        buffer_info: None,
        image_info: Some(info),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_layout_is_one_uniform_buffer() {
        let bindings = DescLayout::Frame.get_bindings();

        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
        assert!(bindings[0].stage_flags.contains(vk::ShaderStageFlags::VERTEX));
    }

    #[test]
    fn material_layout_has_a_sampler_per_map() {
        let bindings = DescLayout::Material.get_bindings();

        assert_eq!(bindings.iter().map(|b| b.binding).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(
            bindings
                .iter()
                .all(|b| b.descriptor_type == vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
        );
    }
}
