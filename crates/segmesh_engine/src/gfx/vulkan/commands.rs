//! Command pool management

use ash::{vk, Device};

use super::{VulkanError, VulkanResult};

/// Command pool wrapper with RAII cleanup
pub struct CommandPool {
    device: Device,
    command_pool: vk::CommandPool,
}

impl CommandPool {
    /// Create a pool whose buffers can be reset individually
    pub fn new(device: Device, queue_family_index: u32) -> VulkanResult<Self> {
        let pool_create_info = vk::CommandPoolCreateInfo::builder()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(queue_family_index);

        let command_pool = unsafe {
            device
                .create_command_pool(&pool_create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self { device, command_pool })
    }

    /// Allocate primary command buffers
    pub fn allocate_command_buffers(&self, count: u32) -> VulkanResult<Vec<vk::CommandBuffer>> {
        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(self.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);

        unsafe { self.device.allocate_command_buffers(&alloc_info).map_err(VulkanError::Api) }
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            // Frees every command buffer allocated from the pool
            let _ = self.device.device_wait_idle();
            self.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
