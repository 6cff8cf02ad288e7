//! Vulkan context management
//!
//! Instance, surface, physical device selection and logical device, each as
//! an RAII wrapper. The surface is created from [`PlatformData`] rather than
//! from a window object, so the context never sees the windowing library.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::{Surface, Swapchain as SwapchainLoader};
use ash::{vk, Device, Entry, Instance};
use thiserror::Error;

use crate::platform::PlatformData;

const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";

/// Vulkan-specific error types
#[derive(Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// The Vulkan loader library could not be loaded
    #[error("Failed to load Vulkan: {0}")]
    Loading(String),

    /// Vulkan context initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// No suitable memory type found for allocation
    #[error("No suitable memory type found")]
    NoSuitableMemoryType,
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

/// Vulkan instance wrapper with RAII cleanup
pub struct VulkanInstance {
    /// Vulkan entry point
    pub entry: Entry,
    /// Vulkan instance handle
    pub instance: Instance,
    debug_utils: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,
}

impl VulkanInstance {
    /// Create an instance with the surface extensions the platform needs
    pub fn new(platform: &PlatformData, app_name: &str, enable_validation: bool) -> VulkanResult<Self> {
        let entry = unsafe { Entry::load() }.map_err(|e| VulkanError::Loading(e.to_string()))?;

        let app_name_cstr = CString::new(app_name)
            .map_err(|_| VulkanError::InitializationFailed("application name contains NUL".to_string()))?;
        let engine_name = c"SegMesh";
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name_cstr)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(engine_name)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        let (display_handle, _) = platform.raw_handles();
        let mut extensions: Vec<*const c_char> = ash_window::enumerate_required_extensions(display_handle)
            .map_err(VulkanError::Api)?
            .to_vec();

        let validation = enable_validation && Self::validation_layer_available(&entry);
        if enable_validation && !validation {
            log::warn!("{} requested but not installed; continuing without it", VALIDATION_LAYER);
        }
        if validation {
            extensions.push(DebugUtils::name().as_ptr());
        }

        let layer_names = if validation {
            vec![CString::new(VALIDATION_LAYER).map_err(|_| VulkanError::InitializationFailed("layer name".to_string()))?]
        } else {
            Vec::new()
        };
        let layer_ptrs: Vec<*const c_char> = layer_names.iter().map(|name| name.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layer_ptrs);

        let instance = unsafe { entry.create_instance(&create_info, None).map_err(VulkanError::Api)? };

        let debug_utils = if validation {
            let loader = DebugUtils::new(&entry, &instance);
            match Self::setup_debug_messenger(&loader) {
                Ok(messenger) => Some((loader, messenger)),
                Err(e) => {
                    log::warn!("Debug messenger unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        log::info!(
            "Vulkan instance created ({} extensions, validation {})",
            extensions.len(),
            if validation { "on" } else { "off" }
        );

        Ok(Self { entry, instance, debug_utils })
    }

    fn validation_layer_available(entry: &Entry) -> bool {
        entry
            .enumerate_instance_layer_properties()
            .map(|layers| {
                layers.iter().any(|layer| {
                    let name = unsafe { CStr::from_ptr(layer.layer_name.as_ptr()) };
                    name.to_bytes() == VALIDATION_LAYER.as_bytes()
                })
            })
            .unwrap_or(false)
    }

    fn setup_debug_messenger(debug_utils: &DebugUtils) -> VulkanResult<vk::DebugUtilsMessengerEXT> {
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        unsafe {
            debug_utils
                .create_debug_utils_messenger(&create_info, None)
                .map_err(VulkanError::Api)
        }
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            if let Some((loader, messenger)) = self.debug_utils.take() {
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

/// Debug callback for validation layers
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if callback_data.is_null() || (*callback_data).p_message.is_null() {
        return vk::FALSE;
    }
    let message = CStr::from_ptr((*callback_data).p_message).to_string_lossy();

    if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        log::error!("[Vulkan] {:?} - {}", message_type, message);
    } else if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING {
        log::warn!("[Vulkan] {:?} - {}", message_type, message);
    } else {
        log::debug!("[Vulkan] {:?} - {}", message_type, message);
    }

    vk::FALSE
}

/// Physical device selection and capabilities
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle
    pub device: vk::PhysicalDevice,
    /// Device properties and limits
    pub properties: vk::PhysicalDeviceProperties,
    /// Memory heaps and types
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    /// Index of the graphics queue family
    pub graphics_family: u32,
    /// Index of the presentation queue family
    pub present_family: u32,
}

impl PhysicalDeviceInfo {
    /// Select a suitable physical device for rendering
    pub fn select_suitable_device(
        instance: &Instance,
        surface: vk::SurfaceKHR,
        surface_loader: &Surface,
    ) -> VulkanResult<Self> {
        let devices = unsafe { instance.enumerate_physical_devices().map_err(VulkanError::Api)? };

        let mut candidates: Vec<Self> = devices
            .into_iter()
            .filter_map(|device| match Self::evaluate_device(instance, device, surface, surface_loader) {
                Ok(info) => Some(info),
                Err(e) => {
                    log::debug!("Skipping physical device: {}", e);
                    None
                }
            })
            .collect();

        // Discrete GPUs first, otherwise enumeration order
        candidates.sort_by_key(|info| info.properties.device_type != vk::PhysicalDeviceType::DISCRETE_GPU);

        let selected = candidates
            .into_iter()
            .next()
            .ok_or_else(|| VulkanError::InitializationFailed("No suitable GPU found".to_string()))?;

        log::info!("Selected GPU: {}", selected.name());
        Ok(selected)
    }

    /// Device name as reported by the driver
    pub fn name(&self) -> String {
        unsafe { CStr::from_ptr(self.properties.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }

    /// Find a memory type index with the given properties
    pub fn find_memory_type(&self, type_bits: u32, flags: vk::MemoryPropertyFlags) -> VulkanResult<u32> {
        let count = self.memory_properties.memory_type_count as usize;
        self.memory_properties.memory_types[..count]
            .iter()
            .enumerate()
            .find(|(index, memory_type)| {
                type_bits & (1 << index) != 0 && memory_type.property_flags.contains(flags)
            })
            .and_then(|(index, _)| u32::try_from(index).ok())
            .ok_or(VulkanError::NoSuitableMemoryType)
    }

    fn evaluate_device(
        instance: &Instance,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &Surface,
    ) -> VulkanResult<Self> {
        let properties = unsafe { instance.get_physical_device_properties(device) };
        let memory_properties = unsafe { instance.get_physical_device_memory_properties(device) };
        let queue_families = unsafe { instance.get_physical_device_queue_family_properties(device) };

        let mut graphics_family = None;
        let mut present_family = None;

        for (index, family) in queue_families.iter().enumerate() {
            let index = u32::try_from(index)
                .map_err(|_| VulkanError::InitializationFailed("queue family index overflow".to_string()))?;

            if family.queue_flags.contains(vk::QueueFlags::GRAPHICS) && graphics_family.is_none() {
                graphics_family = Some(index);
            }

            let present_support = unsafe {
                surface_loader
                    .get_physical_device_surface_support(device, index, surface)
                    .map_err(VulkanError::Api)?
            };

            if present_support && present_family.is_none() {
                present_family = Some(index);
            }

            if graphics_family.is_some() && present_family.is_some() {
                break;
            }
        }

        let graphics_family = graphics_family
            .ok_or_else(|| VulkanError::InitializationFailed("No graphics queue family found".to_string()))?;
        let present_family = present_family
            .ok_or_else(|| VulkanError::InitializationFailed("No present queue family found".to_string()))?;

        let extensions = unsafe {
            instance
                .enumerate_device_extension_properties(device)
                .map_err(VulkanError::Api)?
        };

        let has_swapchain = extensions.iter().any(|available| {
            let extension_name = unsafe { CStr::from_ptr(available.extension_name.as_ptr()) };
            extension_name == SwapchainLoader::name()
        });

        if !has_swapchain {
            return Err(VulkanError::InitializationFailed(
                "Required device extensions not supported".to_string(),
            ));
        }

        Ok(Self {
            device,
            properties,
            memory_properties,
            graphics_family,
            present_family,
        })
    }
}

/// Logical device wrapper with RAII cleanup
pub struct LogicalDevice {
    /// Vulkan logical device handle
    pub device: Device,
    /// Graphics operations queue
    pub graphics_queue: vk::Queue,
    /// Surface presentation queue
    pub present_queue: vk::Queue,
    /// Swapchain extension loader
    pub swapchain_loader: SwapchainLoader,
}

impl LogicalDevice {
    /// Create a new logical device with required queues
    pub fn new(instance: &Instance, physical_device_info: &PhysicalDeviceInfo) -> VulkanResult<Self> {
        let mut families = vec![physical_device_info.graphics_family];
        if physical_device_info.present_family != physical_device_info.graphics_family {
            families.push(physical_device_info.present_family);
        }

        let priorities = [1.0];
        let queue_infos: Vec<vk::DeviceQueueCreateInfo> = families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(&priorities)
                    .build()
            })
            .collect();

        let required_extensions = [SwapchainLoader::name().as_ptr()];

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&required_extensions);

        let device = unsafe {
            instance
                .create_device(physical_device_info.device, &create_info, None)
                .map_err(VulkanError::Api)?
        };

        let graphics_queue = unsafe { device.get_device_queue(physical_device_info.graphics_family, 0) };
        let present_queue = unsafe { device.get_device_queue(physical_device_info.present_family, 0) };
        let swapchain_loader = SwapchainLoader::new(instance, &device);

        Ok(Self {
            device,
            graphics_queue,
            present_queue,
            swapchain_loader,
        })
    }

    /// Block until the GPU has finished all submitted work
    pub fn wait_idle(&self) -> VulkanResult<()> {
        unsafe { self.device.device_wait_idle().map_err(VulkanError::Api) }
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
    }
}

/// Core Vulkan objects bound to one window surface
///
/// Field order is drop order: the surface is destroyed in `Drop::drop`, then
/// the device, then the instance.
pub struct VulkanContext {
    /// Surface extension loader
    pub surface_loader: Surface,
    /// Surface of the platform window
    pub surface: vk::SurfaceKHR,
    /// Selected physical device information
    pub physical_device: PhysicalDeviceInfo,
    /// Logical device for operations
    pub device: LogicalDevice,
    /// Vulkan instance and debug utilities
    pub instance: VulkanInstance,
}

impl VulkanContext {
    /// Create instance, surface and device for the platform window
    pub fn new(platform: &PlatformData, app_name: &str, enable_validation: bool) -> VulkanResult<Self> {
        let instance = VulkanInstance::new(platform, app_name, enable_validation)?;

        let (display_handle, window_handle) = platform.raw_handles();
        let surface = unsafe {
            ash_window::create_surface(&instance.entry, &instance.instance, display_handle, window_handle, None)
                .map_err(|e| VulkanError::InitializationFailed(format!("Failed to create surface: {e:?}")))?
        };
        let surface_loader = Surface::new(&instance.entry, &instance.instance);

        let physical_device = match PhysicalDeviceInfo::select_suitable_device(&instance.instance, surface, &surface_loader) {
            Ok(info) => info,
            Err(e) => {
                unsafe { surface_loader.destroy_surface(surface, None) };
                return Err(e);
            }
        };

        let device = match LogicalDevice::new(&instance.instance, &physical_device) {
            Ok(device) => device,
            Err(e) => {
                unsafe { surface_loader.destroy_surface(surface, None) };
                return Err(e);
            }
        };

        Ok(Self {
            surface_loader,
            surface,
            physical_device,
            device,
            instance,
        })
    }

    /// Get a reference to the Vulkan instance
    pub fn instance(&self) -> &Instance {
        &self.instance.instance
    }

    /// Get the raw Device handle
    pub fn raw_device(&self) -> Device {
        self.device.device.clone()
    }

    /// Current surface capabilities
    pub fn surface_capabilities(&self) -> VulkanResult<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(self.physical_device.device, self.surface)
                .map_err(VulkanError::Api)
        }
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device.device_wait_idle();
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}
