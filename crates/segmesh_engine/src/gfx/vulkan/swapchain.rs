//! Vulkan swapchain management
//!
//! Creation and recreation share one path; recreation hands the old handle to
//! the driver and the old wrapper is dropped afterwards.

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::{vk, Device};

use super::{VulkanContext, VulkanError, VulkanResult};
use crate::gfx::debug_text::PixelOrder;

/// Swapchain management wrapper with RAII cleanup
pub struct Swapchain {
    device: Device,
    swapchain_loader: SwapchainLoader,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::SurfaceFormatKHR,
    extent: vk::Extent2D,
    present_mode: vk::PresentModeKHR,
    transfer_dst: bool,
}

impl Swapchain {
    /// Create a swapchain for the context's surface
    ///
    /// Returns `Ok(None)` while the surface reports a zero extent (minimized
    /// windows on some platforms); the caller retries on a later frame.
    pub fn new(
        context: &VulkanContext,
        requested: vk::Extent2D,
        vsync: bool,
        old_swapchain: vk::SwapchainKHR,
    ) -> VulkanResult<Option<Self>> {
        let device = context.raw_device();
        let physical_device = context.physical_device.device;
        let surface = context.surface;
        let surface_loader = &context.surface_loader;

        let surface_caps = context.surface_capabilities()?;
        let extent = choose_extent(&surface_caps, requested);
        if extent.width == 0 || extent.height == 0 {
            return Ok(None);
        }

        let surface_formats = unsafe {
            surface_loader
                .get_physical_device_surface_formats(physical_device, surface)
                .map_err(VulkanError::Api)?
        };
        let format = choose_surface_format(&surface_formats)
            .ok_or_else(|| VulkanError::InitializationFailed("Surface reports no formats".to_string()))?;

        let present_modes = unsafe {
            surface_loader
                .get_physical_device_surface_present_modes(physical_device, surface)
                .map_err(VulkanError::Api)?
        };
        let present_mode = choose_present_mode(&present_modes, vsync);

        let image_count = (surface_caps.min_image_count + 1).min(if surface_caps.max_image_count > 0 {
            surface_caps.max_image_count
        } else {
            surface_caps.min_image_count + 1
        });

        let transfer_dst = surface_caps
            .supported_usage_flags
            .contains(vk::ImageUsageFlags::TRANSFER_DST);
        let mut usage = vk::ImageUsageFlags::COLOR_ATTACHMENT;
        if transfer_dst {
            usage |= vk::ImageUsageFlags::TRANSFER_DST;
        }

        let swapchain_loader = context.device.swapchain_loader.clone();
        let swapchain_create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(format.format)
            .image_color_space(format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(usage)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(surface_caps.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let swapchain = unsafe {
            swapchain_loader
                .create_swapchain(&swapchain_create_info, None)
                .map_err(VulkanError::Api)?
        };

        let images = match unsafe { swapchain_loader.get_swapchain_images(swapchain) } {
            Ok(images) => images,
            Err(e) => {
                unsafe { swapchain_loader.destroy_swapchain(swapchain, None) };
                return Err(VulkanError::Api(e));
            }
        };

        let mut result = Self {
            device,
            swapchain_loader,
            swapchain,
            images,
            image_views: Vec::new(),
            format,
            extent,
            present_mode,
            transfer_dst,
        };

        // Views pushed one by one so a failure still releases the earlier ones
        for index in 0..result.images.len() {
            let create_info = vk::ImageViewCreateInfo::builder()
                .image(result.images[index])
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format.format)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(color_subresource_range());

            let view = unsafe { result.device.create_image_view(&create_info, None).map_err(VulkanError::Api)? };
            result.image_views.push(view);
        }

        log::debug!(
            "Swapchain {}x{} {:?} {:?}, {} images",
            extent.width,
            extent.height,
            format.format,
            present_mode,
            result.images.len()
        );

        Ok(Some(result))
    }

    /// Get swapchain extent
    pub const fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Get surface format
    pub const fn format(&self) -> vk::SurfaceFormatKHR {
        self.format
    }

    /// Present mode in use
    pub const fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    /// Whether images accept transfer writes
    pub const fn supports_transfer_dst(&self) -> bool {
        self.transfer_dst
    }

    /// Get swapchain images
    pub fn images(&self) -> &[vk::Image] {
        &self.images
    }

    /// Get image views
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    /// Get swapchain handle
    pub const fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    /// Get swapchain loader
    pub const fn loader(&self) -> &SwapchainLoader {
        &self.swapchain_loader
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for &image_view in &self.image_views {
                self.device.destroy_image_view(image_view, None);
            }
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

/// Full color subresource of a single-layer, single-mip image
pub const fn color_subresource_range() -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        base_mip_level: 0,
        level_count: 1,
        base_array_layer: 0,
        layer_count: 1,
    }
}

/// FIFO always exists and is the only mode that waits for vblank
pub fn choose_present_mode(available: &[vk::PresentModeKHR], vsync: bool) -> vk::PresentModeKHR {
    if vsync {
        return vk::PresentModeKHR::FIFO;
    }
    [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::IMMEDIATE]
        .into_iter()
        .find(|mode| available.contains(mode))
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// Prefer 8-bit UNORM formats so packed clear colors reach the screen unchanged
pub fn choose_surface_format(available: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    let preferred = [vk::Format::B8G8R8A8_UNORM, vk::Format::R8G8B8A8_UNORM];
    preferred
        .iter()
        .find_map(|&format| {
            available
                .iter()
                .find(|sf| sf.format == format && sf.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR)
        })
        .or_else(|| available.first())
        .copied()
}

/// Use the surface's extent when it dictates one, else clamp the request
pub fn choose_extent(caps: &vk::SurfaceCapabilitiesKHR, requested: vk::Extent2D) -> vk::Extent2D {
    if caps.current_extent.width != u32::MAX {
        caps.current_extent
    } else {
        vk::Extent2D {
            width: requested
                .width
                .clamp(caps.min_image_extent.width, caps.max_image_extent.width),
            height: requested
                .height
                .clamp(caps.min_image_extent.height, caps.max_image_extent.height),
        }
    }
}

/// Byte order the text overlay must be written in, if the format is supported
pub fn pixel_order(format: vk::Format) -> Option<PixelOrder> {
    match format {
        vk::Format::B8G8R8A8_UNORM | vk::Format::B8G8R8A8_SRGB => Some(PixelOrder::Bgra8),
        vk::Format::R8G8B8A8_UNORM | vk::Format::R8G8B8A8_SRGB => Some(PixelOrder::Rgba8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface_format(format: vk::Format) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }
    }

    #[test]
    fn test_vsync_forces_fifo() {
        let all = [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::IMMEDIATE, vk::PresentModeKHR::FIFO];
        assert_eq!(choose_present_mode(&all, true), vk::PresentModeKHR::FIFO);
        assert_eq!(choose_present_mode(&all, false), vk::PresentModeKHR::MAILBOX);
        assert_eq!(
            choose_present_mode(&[vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE], false),
            vk::PresentModeKHR::IMMEDIATE
        );
        assert_eq!(choose_present_mode(&[vk::PresentModeKHR::FIFO], false), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_surface_format_prefers_unorm() {
        let formats = [
            surface_format(vk::Format::B8G8R8A8_SRGB),
            surface_format(vk::Format::R8G8B8A8_UNORM),
            surface_format(vk::Format::B8G8R8A8_UNORM),
        ];
        assert_eq!(choose_surface_format(&formats), Some(surface_format(vk::Format::B8G8R8A8_UNORM)));

        let odd = [surface_format(vk::Format::A2B10G10R10_UNORM_PACK32)];
        assert_eq!(choose_surface_format(&odd), Some(odd[0]));
        assert_eq!(choose_surface_format(&[]), None);
    }

    #[test]
    fn test_extent_follows_surface_or_clamps_request() {
        let mut caps = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D { width: 800, height: 600 },
            min_image_extent: vk::Extent2D { width: 1, height: 1 },
            max_image_extent: vk::Extent2D { width: 4096, height: 4096 },
            ..Default::default()
        };
        let requested = vk::Extent2D { width: 1280, height: 720 };
        assert_eq!(choose_extent(&caps, requested), vk::Extent2D { width: 800, height: 600 });

        caps.current_extent = vk::Extent2D { width: u32::MAX, height: u32::MAX };
        assert_eq!(choose_extent(&caps, requested), requested);

        caps.max_image_extent = vk::Extent2D { width: 1024, height: 512 };
        assert_eq!(choose_extent(&caps, requested), vk::Extent2D { width: 1024, height: 512 });
    }

    #[test]
    fn test_pixel_order_for_common_formats() {
        assert_eq!(pixel_order(vk::Format::B8G8R8A8_UNORM), Some(PixelOrder::Bgra8));
        assert_eq!(pixel_order(vk::Format::R8G8B8A8_SRGB), Some(PixelOrder::Rgba8));
        assert_eq!(pixel_order(vk::Format::R16G16B16A16_SFLOAT), None);
    }
}
