//! Vulkan synchronization primitives
//!
//! RAII wrappers for semaphores and fences, plus the per-frame set used to
//! keep two frames in flight.

use ash::{vk, Device};

use super::{VulkanError, VulkanResult};

/// GPU-GPU synchronization primitive with automatic resource management
pub struct Semaphore {
    device: Device,
    semaphore: vk::Semaphore,
}

impl Semaphore {
    /// Create a new semaphore
    pub fn new(device: Device) -> VulkanResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::builder();

        let semaphore = unsafe { device.create_semaphore(&create_info, None).map_err(VulkanError::Api)? };

        Ok(Self { device, semaphore })
    }

    /// Get the semaphore handle
    pub const fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_semaphore(self.semaphore, None);
        }
    }
}

/// Fence wrapper with RAII cleanup
pub struct Fence {
    device: Device,
    fence: vk::Fence,
}

impl Fence {
    /// Create a new fence
    pub fn new(device: Device, signaled: bool) -> VulkanResult<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };

        let create_info = vk::FenceCreateInfo::builder().flags(flags);

        let fence = unsafe { device.create_fence(&create_info, None).map_err(VulkanError::Api)? };

        Ok(Self { device, fence })
    }

    /// Wait for fence
    pub fn wait(&self, timeout: u64) -> VulkanResult<()> {
        unsafe {
            self.device
                .wait_for_fences(&[self.fence], true, timeout)
                .map_err(VulkanError::Api)
        }
    }

    /// Reset fence
    pub fn reset(&self) -> VulkanResult<()> {
        unsafe { self.device.reset_fences(&[self.fence]).map_err(VulkanError::Api) }
    }

    /// Get the fence handle
    pub const fn handle(&self) -> vk::Fence {
        self.fence
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_fence(self.fence, None);
        }
    }
}

/// Synchronization objects of one frame in flight
///
/// The render-finished semaphore lives per swapchain image instead, since
/// presentation may still hold it when this frame slot comes around again.
pub struct FrameSync {
    /// Signaled when the acquired image is ready
    pub image_available: Semaphore,
    /// Signaled when this slot's submission completes
    pub in_flight: Fence,
}

impl FrameSync {
    /// Create frame synchronization objects
    pub fn new(device: Device) -> VulkanResult<Self> {
        let image_available = Semaphore::new(device.clone())?;
        let in_flight = Fence::new(device, true)?;

        Ok(Self {
            image_available,
            in_flight,
        })
    }
}
