use crate::texture::{Filter, SamplerDesc, Wrap};
use crate::vulkan::{Device, IntoVulkanError, VulkanError};
use ash::vk;
use ash::vk::Sampler as RawSampler;
use std::rc::Rc;

pub struct Sampler {
    pub inner: RawSampler,
    device: Rc<Device>,
}

impl Sampler {
    pub fn new(device: Rc<Device>, desc: SamplerDesc) -> Result<Self, VulkanError> {
        let address_mode = address_mode(desc.wrap);

        let sampler_info = vk::SamplerCreateInfo {
            mag_filter: filter(desc.mag),
            min_filter: filter(desc.min),
            mipmap_mode: vk::SamplerMipmapMode::NEAREST,
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            anisotropy_enable: vk::FALSE,
            compare_enable: vk::FALSE,
            compare_op: vk::CompareOp::ALWAYS,
            unnormalized_coordinates: vk::FALSE,
            ..Default::default()
        };

        let inner = unsafe {
            device
                .inner
                .create_sampler(&sampler_info, None)
                .map_to_err("Cannot create sampler")?
        };

        Ok(Self { inner, device })
    }
}

fn filter(f: Filter) -> vk::Filter {
    match f {
        Filter::Linear => vk::Filter::LINEAR,
        Filter::Nearest => vk::Filter::NEAREST,
    }
}

fn address_mode(wrap: Wrap) -> vk::SamplerAddressMode {
    match wrap {
        Wrap::Repeat => vk::SamplerAddressMode::REPEAT,
        Wrap::ClampToEdge => vk::SamplerAddressMode::CLAMP_TO_EDGE,
        Wrap::MirroredRepeat => vk::SamplerAddressMode::MIRRORED_REPEAT,
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        unsafe { self.device.inner.destroy_sampler(self.inner, None) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_modes_map_to_vulkan() {
        assert_eq!(address_mode(Wrap::Repeat), vk::SamplerAddressMode::REPEAT);
        assert_eq!(address_mode(Wrap::ClampToEdge), vk::SamplerAddressMode::CLAMP_TO_EDGE);
        assert_eq!(filter(Filter::Nearest), vk::Filter::NEAREST);
    }
}
