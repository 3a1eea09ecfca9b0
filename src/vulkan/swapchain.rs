use crate::vulkan::{Device, ImageView, Instance, IntoVulkanError, Semaphore, Surface, VulkanError};
use ash::khr::swapchain::Device as SwapchainLoader;
use ash::vk;
use ash::vk::{Extent2D, Image, SurfaceFormatKHR, SwapchainKHR};
use log::info;
use std::rc::Rc;

pub struct Swapchain {
    pub swapchain: SwapchainKHR,
    pub format: SurfaceFormatKHR,
    pub extent: Extent2D,
    pub loader: SwapchainLoader,
    pub images: Vec<Image>,
    pub vsync: bool,
    device: Rc<Device>,
}

impl Swapchain {
    pub fn new(
        device: Rc<Device>,
        instance: &Instance,
        drawable_size: (u32, u32),
        surface: &Surface,
        vsync: bool,
    ) -> Result<Self, VulkanError> {
        let loader = SwapchainLoader::new(&instance.inner, &device.inner);
        let format = surface.support(device.physical_device)?.choose_format();

        let mut swapchain = Self {
            swapchain: SwapchainKHR::null(),
            format,
            extent: Extent2D::default(),
            loader,
            images: Vec::new(),
            vsync,
            device,
        };

        swapchain.recreate(drawable_size, surface)?;

        Ok(swapchain)
    }

    /// Builds a new swapchain from the current surface state, retiring the old one.
    pub fn recreate(&mut self, drawable_size: (u32, u32), surface: &Surface) -> Result<(), VulkanError> {
        let support = surface.support(self.device.physical_device)?;

        self.extent = support.choose_extent(drawable_size);

        let indices = [self.device.graphics_queue_family, self.device.present_queue_family];

        let (sharing_mode, index_count, indices_ptr) =
            if self.device.present_queue_family != self.device.graphics_queue_family {
                (vk::SharingMode::CONCURRENT, 2, indices.as_ptr())
            } else {
                (vk::SharingMode::EXCLUSIVE, 0, std::ptr::null())
            };

        let old_swapchain = self.swapchain;

        let create_info = vk::SwapchainCreateInfoKHR {
            min_image_count: support.image_count(),
            image_format: self.format.format,
            image_color_space: self.format.color_space,
            image_extent: self.extent,
            image_array_layers: 1,
            image_usage: vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST,
            image_sharing_mode: sharing_mode,
            queue_family_index_count: index_count,
            p_queue_family_indices: indices_ptr,
            pre_transform: support.capabilities.current_transform,
            composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
            present_mode: support.choose_present_mode(self.vsync),
            clipped: vk::TRUE,
            old_swapchain,
            surface: surface.surface,
            ..Default::default()
        };

        self.swapchain = unsafe {
            self.loader
                .create_swapchain(&create_info, None)
                .map_to_err("Cannot create swapchain")?
        };

        if old_swapchain != SwapchainKHR::null() {
            unsafe { self.loader.destroy_swapchain(old_swapchain, None) };
        }

        self.images = unsafe {
            self.loader
                .get_swapchain_images(self.swapchain)
                .map_to_err("Cannot get swapchain images")?
        };

        info!(
            "swapchain {}x{} with {} images",
            self.extent.width,
            self.extent.height,
            self.images.len()
        );

        Ok(())
    }

    /// Returns the image index and whether the swapchain is suboptimal.
    pub fn acquire_next_image(&self, semaphore: &Semaphore) -> Result<(u32, bool), VulkanError> {
        unsafe {
            self.loader
                .acquire_next_image(self.swapchain, u64::MAX, semaphore.inner, vk::Fence::null())
                .map_to_err("cannot acquire image")
        }
    }

    pub fn present(&self, queue: vk::Queue, image_index: u32, wait: &Semaphore) -> Result<bool, VulkanError> {
        let present_info = vk::PresentInfoKHR {
            wait_semaphore_count: 1,
            p_wait_semaphores: &wait.inner,
            swapchain_count: 1,
            p_swapchains: &self.swapchain,
            p_image_indices: &image_index,
            ..Default::default()
        };

        unsafe {
            self.loader
                .queue_present(queue, &present_info)
                .map_to_err("cannot present")
        }
    }

    pub fn create_image_views(&self) -> Result<Vec<ImageView>, VulkanError> {
        self.images
            .iter()
            .map(|&image| {
                ImageView::new(
                    self.device.clone(),
                    image,
                    self.format.format,
                    vk::ImageAspectFlags::COLOR,
                )
            })
            .collect::<Result<Vec<_>, _>>()
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe { self.loader.destroy_swapchain(self.swapchain, None) };
    }
}
