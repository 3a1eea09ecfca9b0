use crate::vulkan::{Instance, IntoVulkanError, VulkanError};
use ash::Entry;
use ash::khr::surface::Instance as SurfaceLoader;
use ash::vk;
use ash::vk::{Handle, PhysicalDevice, PresentModeKHR, SurfaceCapabilitiesKHR, SurfaceFormatKHR, SurfaceKHR};
use std::rc::Rc;

pub struct Surface {
    pub loader: SurfaceLoader,
    pub surface: SurfaceKHR,
    _instance: Rc<Instance>,
}

impl Surface {
    /// Takes ownership of a surface created by the windowing layer.
    pub fn new(instance: Rc<Instance>, entry: &Entry, raw: u64) -> Self {
        let surface = SurfaceKHR::from_raw(raw);
        let loader = SurfaceLoader::new(entry, &instance.inner);

        Self {
            surface,
            loader,
            _instance: instance,
        }
    }

    pub fn supports_present(&self, physical_device: PhysicalDevice, queue_family: u32) -> Result<bool, VulkanError> {
        unsafe {
            self.loader
                .get_physical_device_surface_support(physical_device, queue_family, self.surface)
                .map_to_err("error getting present support")
        }
    }

    pub fn support(&self, physical_device: PhysicalDevice) -> Result<SwapChainSupport, VulkanError> {
        unsafe {
            let capabilities = self
                .loader
                .get_physical_device_surface_capabilities(physical_device, self.surface)
                .map_to_err("cannot get surface capabilities")?;

            let formats = self
                .loader
                .get_physical_device_surface_formats(physical_device, self.surface)
                .map_to_err("cannot get surface formats")?;

            let present_modes = self
                .loader
                .get_physical_device_surface_present_modes(physical_device, self.surface)
                .map_to_err("cannot get surface present modes")?;

            Ok(SwapChainSupport {
                capabilities,
                formats,
                present_modes,
            })
        }
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        unsafe { self.loader.destroy_surface(self.surface, None) }
    }
}

pub struct SwapChainSupport {
    pub capabilities: SurfaceCapabilitiesKHR,
    pub formats: Vec<SurfaceFormatKHR>,
    pub present_modes: Vec<PresentModeKHR>,
}

impl SwapChainSupport {
    pub fn is_usable(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }

    pub fn choose_format(&self) -> SurfaceFormatKHR {
        self.formats
            .iter()
            .find(|f| f.format == vk::Format::B8G8R8A8_SRGB && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR)
            .or_else(|| self.formats.first())
            .copied()
            .unwrap_or_default()
    }

    /// FIFO is always available.
    pub fn choose_present_mode(&self, vsync: bool) -> PresentModeKHR {
        if vsync {
            return PresentModeKHR::FIFO;
        }

        [PresentModeKHR::MAILBOX, PresentModeKHR::IMMEDIATE]
            .into_iter()
            .find(|m| self.present_modes.contains(m))
            .unwrap_or(PresentModeKHR::FIFO)
    }

    pub fn choose_extent(&self, drawable_size: (u32, u32)) -> vk::Extent2D {
        let caps = &self.capabilities;

        if caps.current_extent.width != u32::MAX {
            return caps.current_extent;
        }

        let (width, height) = drawable_size;

        vk::Extent2D {
            width: width.clamp(caps.min_image_extent.width, caps.max_image_extent.width),
            height: height.clamp(caps.min_image_extent.height, caps.max_image_extent.height),
        }
    }

    pub fn image_count(&self) -> u32 {
        let caps = &self.capabilities;
        let wanted = caps.min_image_count + 1;

        if caps.max_image_count > 0 {
            wanted.min(caps.max_image_count)
        } else {
            wanted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn support(modes: &[PresentModeKHR]) -> SwapChainSupport {
        SwapChainSupport {
            capabilities: SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 2,
                current_extent: vk::Extent2D {
                    width: u32::MAX,
                    height: u32::MAX,
                },
                min_image_extent: vk::Extent2D { width: 1, height: 1 },
                max_image_extent: vk::Extent2D {
                    width: 1920,
                    height: 1080,
                },
                ..Default::default()
            },
            formats: vec![
                SurfaceFormatKHR {
                    format: vk::Format::R8G8B8A8_UNORM,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
                SurfaceFormatKHR {
                    format: vk::Format::B8G8R8A8_SRGB,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
            ],
            present_modes: modes.to_vec(),
        }
    }

    #[test]
    fn prefers_srgb_format() {
        assert_eq!(support(&[]).choose_format().format, vk::Format::B8G8R8A8_SRGB);
    }

    #[test]
    fn vsync_selects_fifo() {
        let s = support(&[PresentModeKHR::MAILBOX, PresentModeKHR::FIFO]);

        assert_eq!(s.choose_present_mode(true), PresentModeKHR::FIFO);
        assert_eq!(s.choose_present_mode(false), PresentModeKHR::MAILBOX);
        assert_eq!(support(&[PresentModeKHR::FIFO]).choose_present_mode(false), PresentModeKHR::FIFO);
    }

    #[test]
    fn extent_is_clamped_when_surface_leaves_it_open() {
        let extent = support(&[]).choose_extent((4000, 0));

        assert_eq!(extent.width, 1920);
        assert_eq!(extent.height, 1);
    }

    #[test]
    fn image_count_respects_maximum() {
        assert_eq!(support(&[]).image_count(), 2);
    }
}
