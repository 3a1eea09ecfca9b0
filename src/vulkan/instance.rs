use crate::vulkan::{DEBUG_UTILS_EXTENSION, IntoVulkanError, VALIDATION_LAYER, VulkanError};
use ash::ext::debug_utils::Instance as DebugUtils;
use ash::{Entry, Instance as RawInstance, vk};
use log::{info, warn};
use std::ffi::{CStr, CString};

pub struct Instance {
    pub inner: RawInstance,
    pub debug_utils: Option<DebugUtils>,
    pub validation: bool,
}

impl Instance {
    /// With `validation` set, the Khronos validation layer and debug utils are enabled when present.
    pub fn new(entry: &Entry, required_extensions: &[impl AsRef<str>], validation: bool) -> Result<Self, VulkanError> {
        let app_info = vk::ApplicationInfo {
            p_application_name: c"glint".as_ptr(),
            application_version: vk::make_api_version(0, 0, 1, 0),
            p_engine_name: c"glint".as_ptr(),
            engine_version: vk::make_api_version(0, 0, 1, 0),
            api_version: vk::API_VERSION_1_3,
            ..Default::default()
        };

        let mut instance_extensions = required_extensions
            .iter()
            .filter_map(|e| CString::new(e.as_ref()).ok())
            .collect::<Vec<_>>();

        let (layers, debug_extensions) = if validation {
            (get_validation_layers(entry)?, get_debug_extensions(entry)?)
        } else {
            (vec![], vec![])
        };

        let markers_active = !debug_extensions.is_empty();
        instance_extensions.extend(debug_extensions);

        let extension_ptrs = instance_extensions.iter().map(|c| c.as_ptr()).collect::<Vec<_>>();
        let layer_ptrs = layers.iter().map(|c| c.as_ptr()).collect::<Vec<_>>();

        let create_info = vk::InstanceCreateInfo {
            p_application_info: &app_info,
            enabled_extension_count: extension_ptrs.len() as u32,
            pp_enabled_extension_names: extension_ptrs.as_ptr(),
            enabled_layer_count: layer_ptrs.len() as u32,
            pp_enabled_layer_names: layer_ptrs.as_ptr(),
            ..Default::default()
        };

        let instance = unsafe {
            entry
                .create_instance(&create_info, None)
                .map_to_err("Cannot create instance")?
        };

        let debug_utils = markers_active.then(|| DebugUtils::new(entry, &instance));

        info!(
            "created Vulkan instance (validation: {}, debug markers: {})",
            !layers.is_empty(),
            markers_active
        );

        Ok(Self {
            inner: instance,
            debug_utils,
            validation: !layers.is_empty(),
        })
    }

    pub fn markers_active(&self) -> bool {
        self.debug_utils.is_some()
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        unsafe { self.inner.destroy_instance(None) };
    }
}

fn get_validation_layers(entry: &Entry) -> Result<Vec<CString>, VulkanError> {
    let layers = unsafe {
        entry
            .enumerate_instance_layer_properties()
            .map_to_err("cannot get possible layers")?
    };

    let has_validation = layers.iter().any(|l| {
        let name = unsafe { CStr::from_ptr(l.layer_name.as_ptr()) };

        name.to_str() == Ok(VALIDATION_LAYER)
    });

    match CString::new(VALIDATION_LAYER) {
        Ok(layer) if has_validation => Ok(vec![layer]),
        _ => {
            warn!("{VALIDATION_LAYER} not found");
            Ok(vec![])
        }
    }
}

fn get_debug_extensions(entry: &Entry) -> Result<Vec<CString>, VulkanError> {
    let extensions = unsafe {
        entry
            .enumerate_instance_extension_properties(None)
            .map_to_err("cannot get instance extensions")?
    };

    let has_markers = extensions.iter().any(|e| {
        let name = unsafe { CStr::from_ptr(e.extension_name.as_ptr()) };

        name == DEBUG_UTILS_EXTENSION
    });

    if has_markers {
        Ok(vec![CString::from(DEBUG_UTILS_EXTENSION)])
    } else {
        warn!("{} not found", DEBUG_UTILS_EXTENSION.to_string_lossy());
        Ok(vec![])
    }
}
