use crate::vulkan::{CommandBuffer, Instance, IntoVulkanError, SWAPCHAIN_EXTENSION, Surface, VulkanError};
use ash::ext::debug_utils::Device as DebugUtilsDevice;
use ash::vk;
use ash::vk::{PhysicalDevice, Queue};
use ash::Device as RawDevice;
use std::collections::HashSet;
use std::ffi::{CStr, CString, c_void};
use std::rc::Rc;

pub struct Device {
    pub inner: RawDevice,
    pub graphics_queue: Queue,
    pub graphics_queue_family: u32,
    pub present_queue: Queue,
    pub present_queue_family: u32,
    pub physical_device: PhysicalDevice,
    pub name: String,
    debug_utils: Option<DebugUtilsDevice>,
    _instance: Rc<Instance>,
}

impl Device {
    pub fn query_applicable(instance: &Instance, surface: &Surface) -> Result<Vec<DeviceQueryResult>, VulkanError> {
        let devices = unsafe {
            instance
                .inner
                .enumerate_physical_devices()
                .map_to_err("Cannot enumerate physical devices")?
        };

        devices
            .into_iter()
            .map(|d| Self::query_device(instance, surface, d))
            .collect()
    }

    fn query_device(
        instance: &Instance,
        surface: &Surface,
        physical_device: PhysicalDevice,
    ) -> Result<DeviceQueryResult, VulkanError> {
        let properties = unsafe { instance.inner.get_physical_device_properties(physical_device) };
        let name = unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned();

        let extensions = unsafe {
            instance
                .inner
                .enumerate_device_extension_properties(physical_device)
                .map_to_err("cannot get device extensions")?
        };

        let available = extensions
            .iter()
            .map(|e| unsafe { CStr::from_ptr(e.extension_name.as_ptr()) }.to_owned())
            .collect::<HashSet<_>>();

        let mut missing_extensions = [SWAPCHAIN_EXTENSION]
            .into_iter()
            .filter(|e| !available.contains(*e))
            .map(|e| e.to_string_lossy().into_owned())
            .collect::<Vec<_>>();

        let mut features13 = vk::PhysicalDeviceVulkan13Features::default();
        let mut features2 = vk::PhysicalDeviceFeatures2 {
            p_next: std::ptr::addr_of_mut!(features13) as *mut c_void,
            ..Default::default()
        };
        unsafe {
            instance
                .inner
                .get_physical_device_features2(physical_device, &mut features2)
        };

        if properties.api_version < vk::API_VERSION_1_3 || features13.dynamic_rendering == vk::FALSE {
            missing_extensions.push("Vulkan 1.3 dynamic rendering".to_owned());
        }
        if features2.features.fill_mode_non_solid == vk::FALSE {
            missing_extensions.push("fillModeNonSolid".to_owned());
        }

        let families = Self::find_queue_families(instance, surface, physical_device)?;
        if families.graphics.is_none() {
            missing_extensions.push("graphics queue".to_owned());
        }
        if families.present.is_none() {
            missing_extensions.push("present queue".to_owned());
        }

        if !surface.support(physical_device)?.is_usable() {
            missing_extensions.push("usable surface formats".to_owned());
        }

        let info = DeviceInfo {
            physical_device,
            name,
            missing_extensions,
            discrete: properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU,
        };

        if info.missing_extensions.is_empty() {
            Ok(DeviceQueryResult::Applicable(info))
        } else {
            Ok(DeviceQueryResult::NotApplicable(info))
        }
    }

    pub fn new(instance: Rc<Instance>, info: DeviceInfo, surface: &Surface) -> Result<Self, VulkanError> {
        let families = Self::find_queue_families(&instance, surface, info.physical_device)?;

        let (Some(graphics_queue_family), Some(present_queue_family)) = (families.graphics, families.present) else {
            return Err(VulkanError::new(
                "device lost its graphics or present queue",
                vk::Result::ERROR_INITIALIZATION_FAILED,
            ));
        };

        let unique_queue_families = HashSet::from([graphics_queue_family, present_queue_family]);

        let priority = 1.0f32;
        let queue_create_infos = unique_queue_families
            .iter()
            .map(|&index| vk::DeviceQueueCreateInfo {
                queue_family_index: index,
                queue_count: 1,
                p_queue_priorities: &priority,
                ..Default::default()
            })
            .collect::<Vec<_>>();

        let device_extensions = [SWAPCHAIN_EXTENSION.as_ptr()];

        let mut features13 = vk::PhysicalDeviceVulkan13Features {
            dynamic_rendering: vk::TRUE,
            ..Default::default()
        };

        let features = vk::PhysicalDeviceFeatures {
            fill_mode_non_solid: vk::TRUE,
            ..Default::default()
        };

        let create_info = vk::DeviceCreateInfo {
            p_next: std::ptr::addr_of_mut!(features13) as *const c_void,
            p_queue_create_infos: queue_create_infos.as_ptr(),
            queue_create_info_count: queue_create_infos.len() as u32,
            pp_enabled_extension_names: device_extensions.as_ptr(),
            enabled_extension_count: device_extensions.len() as u32,
            p_enabled_features: &features,
            ..Default::default()
        };

        let inner = unsafe {
            instance
                .inner
                .create_device(info.physical_device, &create_info, None)
                .map_to_err("cannot create logical device")?
        };

        let graphics_queue = unsafe { inner.get_device_queue(graphics_queue_family, 0) };
        let present_queue = unsafe { inner.get_device_queue(present_queue_family, 0) };

        let debug_utils = instance
            .markers_active()
            .then(|| DebugUtilsDevice::new(&instance.inner, &inner));

        Ok(Self {
            inner,
            graphics_queue,
            graphics_queue_family,
            present_queue,
            present_queue_family,
            physical_device: info.physical_device,
            name: info.name,
            debug_utils,
            _instance: instance,
        })
    }

    pub fn wait_idle(&self) -> Result<(), VulkanError> {
        unsafe { self.inner.device_wait_idle().map_to_err("Cannot wait for device idle") }
    }

    pub fn name_object(&self, name_info: vk::DebugUtilsObjectNameInfoEXT) -> Result<(), VulkanError> {
        let Some(debug_utils) = &self.debug_utils else {
            return Ok(());
        };

        unsafe {
            debug_utils
                .set_debug_utils_object_name(&name_info)
                .map_to_err("cannot name object")
        }
    }

    pub fn begin_label(&self, label: &str, command_buffer: &CommandBuffer) {
        let (Some(debug_utils), Ok(name)) = (&self.debug_utils, CString::new(label)) else {
            return;
        };

        let label = vk::DebugUtilsLabelEXT {
            p_label_name: name.as_ptr(),
            ..Default::default()
        };

        unsafe { debug_utils.cmd_begin_debug_utils_label(command_buffer.inner, &label) };
    }

    pub fn end_label(&self, command_buffer: &CommandBuffer) {
        if let Some(debug_utils) = &self.debug_utils {
            unsafe { debug_utils.cmd_end_debug_utils_label(command_buffer.inner) };
        }
    }

    fn find_queue_families(
        instance: &Instance,
        surface: &Surface,
        physical_device: PhysicalDevice,
    ) -> Result<QueueFamilyIndices, VulkanError> {
        let queue_families = unsafe {
            instance
                .inner
                .get_physical_device_queue_family_properties(physical_device)
        };

        let mut indices = QueueFamilyIndices::default();

        for (i, queue) in queue_families.iter().enumerate() {
            let i = i as u32;

            if indices.graphics.is_none() && queue.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
                indices.graphics = Some(i);
            }

            if indices.present.is_none() && surface.supports_present(physical_device, i)? {
                indices.present = Some(i);
            }
        }

        Ok(indices)
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe { self.inner.destroy_device(None) };
    }
}

pub struct DeviceInfo {
    pub physical_device: PhysicalDevice,
    pub name: String,
    pub missing_extensions: Vec<String>,
    pub discrete: bool,
}

pub enum DeviceQueryResult {
    Applicable(DeviceInfo),
    NotApplicable(DeviceInfo),
}

#[derive(Default)]
struct QueueFamilyIndices {
    graphics: Option<u32>,
    present: Option<u32>,
}
