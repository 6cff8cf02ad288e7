//! Host-visible staging buffer for the text overlay

use std::ffi::c_void;

use ash::{vk, Device};

use super::{PhysicalDeviceInfo, VulkanError, VulkanResult};

/// Persistently mapped transfer source buffer
pub struct StagingBuffer {
    device: Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    mapped: *mut c_void,
    capacity: vk::DeviceSize,
}

impl StagingBuffer {
    /// Allocate and map `capacity` bytes of host-coherent memory
    pub fn new(device: Device, physical_device: &PhysicalDeviceInfo, capacity: vk::DeviceSize) -> VulkanResult<Self> {
        let create_info = vk::BufferCreateInfo::builder()
            .size(capacity)
            .usage(vk::BufferUsageFlags::TRANSFER_SRC)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { device.create_buffer(&create_info, None).map_err(VulkanError::Api)? };
        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };

        let memory_type = match physical_device.find_memory_type(
            requirements.memory_type_bits,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        ) {
            Ok(index) => index,
            Err(e) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type);

        let memory = match unsafe { device.allocate_memory(&alloc_info, None) } {
            Ok(memory) => memory,
            Err(e) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(VulkanError::Api(e));
            }
        };

        let mapped = unsafe {
            device
                .bind_buffer_memory(buffer, memory, 0)
                .and_then(|()| device.map_memory(memory, 0, capacity, vk::MemoryMapFlags::empty()))
        };
        let mapped = match mapped {
            Ok(ptr) => ptr,
            Err(e) => {
                unsafe {
                    device.destroy_buffer(buffer, None);
                    device.free_memory(memory, None);
                }
                return Err(VulkanError::Api(e));
            }
        };

        Ok(Self {
            device,
            buffer,
            memory,
            mapped,
            capacity,
        })
    }

    /// Copy `bytes` to the start of the buffer; they must fit
    pub fn write(&mut self, bytes: &[u8]) -> bool {
        let fits = vk::DeviceSize::try_from(bytes.len()).map_or(false, |len| len <= self.capacity);
        if fits {
            unsafe {
                std::ptr::copy_nonoverlapping(bytes.as_ptr(), self.mapped.cast::<u8>(), bytes.len());
            }
        }
        fits
    }

    /// Size in bytes
    pub const fn capacity(&self) -> vk::DeviceSize {
        self.capacity
    }

    /// Get the buffer handle
    pub const fn handle(&self) -> vk::Buffer {
        self.buffer
    }
}

impl Drop for StagingBuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.unmap_memory(self.memory);
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}
