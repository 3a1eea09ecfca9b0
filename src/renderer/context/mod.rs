use crate::err::AppError;
use crate::renderer::MAX_FRAMES_IN_FLIGHT;
use crate::vulkan::{CommandPool, Device, DeviceInfo, DeviceQueryResult, ImageView, Instance, Surface, Swapchain};
use ash::Entry;
use ash::vk::Handle;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use log::info;
use sdl2::video::Window;
use std::cell::RefCell;
use std::fmt::Write;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

pub struct VulkanContext {
    pub imgui_renderer: RefCell<imgui_rs_vulkan_renderer::Renderer>,
    pub graphics_command_pool: CommandPool,
    pub swap_chain_image_views: RefCell<Vec<ImageView>>,
    pub swap_chain: RefCell<Swapchain>,
    pub allocator: Arc<Mutex<Allocator>>,
    pub device: Rc<Device>,
    pub surface: Surface,
    pub instance: Rc<Instance>,
    _entry: Entry,
}

impl VulkanContext {
    pub fn init(window: &Window, imgui: &mut imgui::Context, validation: bool, vsync: bool) -> Result<Self, AppError> {
        let entry = unsafe { Entry::load().map_err(|e| AppError::Other(format!("cannot load vulkan entry: {e}")))? };

        let extensions = window.vulkan_instance_extensions().map_err(AppError::Other)?;
        let instance = Rc::new(Instance::new(&entry, &extensions, validation)?);

        let surface = window
            .vulkan_create_surface(instance.inner.handle().as_raw() as usize)
            .map_err(AppError::Other)?;
        let surface = Surface::new(instance.clone(), &entry, surface);

        let device = Self::init_device(instance.clone(), &surface)?;

        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.inner.clone(),
            device: device.inner.clone(),
            physical_device: device.physical_device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        })?;

        let allocator = Arc::new(Mutex::new(allocator));

        let swap_chain = RefCell::new(Swapchain::new(
            device.clone(),
            &instance,
            window.drawable_size(),
            &surface,
            vsync,
        )?);
        let swap_chain_image_views = RefCell::new(swap_chain.borrow().create_image_views()?);

        let graphics_command_pool = CommandPool::new_graphics(device.clone())?;

        let imgui_renderer = imgui_rs_vulkan_renderer::Renderer::with_gpu_allocator(
            allocator.clone(),
            device.inner.clone(),
            device.graphics_queue,
            graphics_command_pool.inner,
            imgui_rs_vulkan_renderer::DynamicRendering {
                color_attachment_format: swap_chain.borrow().format.format,
                depth_attachment_format: None,
            },
            imgui,
            Some(imgui_rs_vulkan_renderer::Options {
                in_flight_frames: MAX_FRAMES_IN_FLIGHT,
                ..Default::default()
            }),
        )
        .map_err(|e| AppError::Other(format!("Failed to create imgui renderer: {}", e)))?;

        Ok(Self {
            imgui_renderer: RefCell::new(imgui_renderer),
            graphics_command_pool,
            swap_chain_image_views,
            swap_chain,
            allocator,
            device,
            surface,
            instance,
            _entry: entry,
        })
    }

    fn init_device(instance: Rc<Instance>, surface: &Surface) -> Result<Rc<Device>, AppError> {
        let devices = Device::query_applicable(&instance, surface)?;
        if devices.is_empty() {
            return Err(AppError::Other("No GPUs with Vulkan support found".into()));
        }

        let mut applicable = Vec::new();
        let mut message = String::from("No applicable device found: \n");

        for device in devices {
            match device {
                DeviceQueryResult::Applicable(info) => applicable.push(info),
                DeviceQueryResult::NotApplicable(info) => {
                    let extensions = info.missing_extensions.iter().fold(String::new(), |mut out, ext| {
                        let _ = writeln!(out, "\t\t - {}", ext);
                        out
                    });

                    let _ = write!(message, "\t{}\n\t\tMissing:\n{}", info.name, &extensions);
                }
            }
        }

        let Some(chosen) = Self::pick_device(applicable) else {
            return Err(AppError::Other(message));
        };

        info!("using device {}", chosen.name);

        Ok(Rc::new(Device::new(instance, chosen, surface)?))
    }

    /// Discrete GPUs win over integrated ones.
    fn pick_device(mut candidates: Vec<DeviceInfo>) -> Option<DeviceInfo> {
        candidates.sort_by_key(|d| !d.discrete);
        candidates.into_iter().next()
    }

    pub fn recreate_swapchain(&self, drawable_size: (u32, u32)) -> Result<(), AppError> {
        self.device.wait_idle()?;

        // need to drop before creating new ones
        self.swap_chain_image_views.borrow_mut().clear();

        self.swap_chain.borrow_mut().recreate(drawable_size, &self.surface)?;

        self.swap_chain_image_views
            .replace(self.swap_chain.borrow().create_image_views()?);

        Ok(())
    }
}
