//! Frame recording and presentation
//!
//! One render pass per frame clears the whole backbuffer to black, then each
//! touched view with a color clear flag gets a `vkCmdClearAttachments` over
//! its rectangle. When the swapchain accepts transfer writes the debug text
//! spans are copied in after the pass and the image is transitioned for
//! presentation by hand.

use ash::vk;

use super::buffer::StagingBuffer;
use super::commands::CommandPool;
use super::render_pass::{Framebuffer, RenderPass};
use super::swapchain::{color_subresource_range, pixel_order, Swapchain};
use super::sync::{FrameSync, Semaphore};
use super::{VulkanContext, VulkanError, VulkanResult};
use crate::gfx::debug_text::{DebugText, PixelOrder, TextRaster};
use crate::gfx::view::ViewTable;
use crate::gfx::{unpack_rgba, ClearFlags, InitDesc, ResetFlags};
use crate::platform::PlatformData;

/// Frames the CPU may record ahead of the GPU
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

const MIN_STAGING_SIZE: vk::DeviceSize = 64 * 1024;

/// What happened to a submitted frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Image rendered and queued for presentation
    Presented,
    /// The swapchain was out of date and has been rebuilt
    SwapchainStale,
    /// No swapchain exists for the current surface size
    Skipped,
}

struct FrameResources {
    command_buffer: vk::CommandBuffer,
    sync: FrameSync,
    staging: Option<StagingBuffer>,
}

/// Presentation state of one window surface
///
/// Field order is drop order; everything is released before the context.
pub struct VulkanRenderer {
    frames: Vec<FrameResources>,
    framebuffers: Vec<Framebuffer>,
    render_finished: Vec<Semaphore>,
    render_pass: Option<RenderPass>,
    swapchain: Option<Swapchain>,
    // Owns the frames' command buffers
    _command_pool: CommandPool,
    context: VulkanContext,
    overlay: Option<PixelOrder>,
    requested: vk::Extent2D,
    vsync: bool,
    current_frame: usize,
}

impl VulkanRenderer {
    /// Bring up the context and the first swapchain
    pub fn new(platform: &PlatformData, desc: &InitDesc) -> VulkanResult<Self> {
        let context = VulkanContext::new(platform, &desc.application_name, desc.enable_validation)?;
        let device = context.raw_device();

        let command_pool = CommandPool::new(device.clone(), context.physical_device.graphics_family)?;
        let command_buffers = command_pool.allocate_command_buffers(MAX_FRAMES_IN_FLIGHT as u32)?;

        let frames = command_buffers
            .into_iter()
            .map(|command_buffer| -> VulkanResult<FrameResources> {
                Ok(FrameResources {
                    command_buffer,
                    sync: FrameSync::new(device.clone())?,
                    staging: None,
                })
            })
            .collect::<VulkanResult<Vec<_>>>()?;

        let mut renderer = Self {
            frames,
            framebuffers: Vec::new(),
            render_finished: Vec::new(),
            render_pass: None,
            swapchain: None,
            _command_pool: command_pool,
            context,
            overlay: None,
            requested: vk::Extent2D {
                width: desc.resolution.width,
                height: desc.resolution.height,
            },
            vsync: desc.resolution.reset.contains(ResetFlags::VSYNC),
            current_frame: 0,
        };

        renderer.recreate_swapchain()?;
        Ok(renderer)
    }

    /// Name of the selected GPU
    pub fn device_name(&self) -> String {
        self.context.physical_device.name()
    }

    /// Current backbuffer extent, if a swapchain exists
    pub fn extent(&self) -> Option<vk::Extent2D> {
        self.swapchain.as_ref().map(Swapchain::extent)
    }

    /// Whether debug text can be drawn on this surface
    pub const fn overlay_supported(&self) -> bool {
        self.overlay.is_some()
    }

    /// Rebuild the swapchain for a new size or present mode
    ///
    /// Returns `false` when the surface currently has no area.
    pub fn resize(&mut self, width: u32, height: u32, vsync: bool) -> VulkanResult<bool> {
        self.requested = vk::Extent2D { width, height };
        self.vsync = vsync;
        self.recreate_swapchain()
    }

    fn recreate_swapchain(&mut self) -> VulkanResult<bool> {
        self.context.device.wait_idle()?;

        self.framebuffers.clear();
        self.render_finished.clear();

        let old = self.swapchain.take();
        let old_handle = old.as_ref().map_or(vk::SwapchainKHR::null(), Swapchain::handle);
        let created = Swapchain::new(&self.context, self.requested, self.vsync, old_handle);
        drop(old);

        let Some(swapchain) = created? else {
            log::debug!("Surface has zero extent; swapchain deferred");
            return Ok(false);
        };

        let format = swapchain.format().format;
        self.overlay = if swapchain.supports_transfer_dst() {
            pixel_order(format)
        } else {
            None
        };
        if self.overlay.is_none() {
            log::warn!("Debug text unavailable for surface format {:?}", format);
        }

        let device = self.context.raw_device();
        let render_pass = RenderPass::new_clear_pass(device.clone(), format, self.overlay.is_some())?;

        for &view in swapchain.image_views() {
            self.framebuffers
                .push(Framebuffer::new(device.clone(), &render_pass, view, swapchain.extent())?);
            self.render_finished.push(Semaphore::new(device.clone())?);
        }

        self.render_pass = Some(render_pass);
        self.swapchain = Some(swapchain);
        Ok(true)
    }

    /// Record, submit and present one frame
    pub fn draw_frame(&mut self, views: &ViewTable, text: &DebugText) -> VulkanResult<FrameOutcome> {
        if self.swapchain.is_none() && !self.recreate_swapchain()? {
            return Ok(FrameOutcome::Skipped);
        }
        let (Some(swapchain), Some(render_pass)) = (self.swapchain.as_ref(), self.render_pass.as_ref()) else {
            return Ok(FrameOutcome::Skipped);
        };

        let frame = &self.frames[self.current_frame];
        frame.sync.in_flight.wait(u64::MAX)?;

        let acquired = unsafe {
            swapchain.loader().acquire_next_image(
                swapchain.handle(),
                u64::MAX,
                frame.sync.image_available.handle(),
                vk::Fence::null(),
            )
        };
        let image_index = match acquired {
            Ok((index, _suboptimal)) => index,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                self.recreate_swapchain()?;
                return Ok(FrameOutcome::SwapchainStale);
            }
            Err(e) => return Err(VulkanError::Api(e)),
        };
        let image_slot = image_index as usize;

        let extent = swapchain.extent();
        let raster = match self.overlay {
            Some(order) if !text.is_empty() => text.rasterize(extent.width, extent.height, order),
            _ => TextRaster::default(),
        };

        let frame = &mut self.frames[self.current_frame];
        if !raster.is_empty() {
            let needed = raster.pixels.len() as vk::DeviceSize;
            if frame.staging.as_ref().map_or(true, |staging| staging.capacity() < needed) {
                let capacity = needed.next_power_of_two().max(MIN_STAGING_SIZE);
                frame.staging = Some(StagingBuffer::new(
                    self.context.raw_device(),
                    &self.context.physical_device,
                    capacity,
                )?);
            }
            if let Some(staging) = frame.staging.as_mut() {
                staging.write(&raster.pixels);
            }
        }

        let device = &self.context.device.device;
        let command_buffer = frame.command_buffer;
        let image = swapchain.images()[image_slot];

        unsafe {
            device
                .reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(VulkanError::Api)?;
            let begin_info =
                vk::CommandBufferBeginInfo::builder().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(VulkanError::Api)?;

            let clear_values = [vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: [0.0, 0.0, 0.0, 1.0],
                },
            }];
            let render_pass_begin = vk::RenderPassBeginInfo::builder()
                .render_pass(render_pass.handle())
                .framebuffer(self.framebuffers[image_slot].handle())
                .render_area(vk::Rect2D {
                    offset: vk::Offset2D { x: 0, y: 0 },
                    extent,
                })
                .clear_values(&clear_values);
            device.cmd_begin_render_pass(command_buffer, &render_pass_begin, vk::SubpassContents::INLINE);

            record_view_clears(device, command_buffer, views, extent);

            device.cmd_end_render_pass(command_buffer);

            if self.overlay.is_some() {
                if let Some(staging) = frame.staging.as_ref().filter(|_| !raster.is_empty()) {
                    let regions = copy_regions(&raster);
                    device.cmd_copy_buffer_to_image(
                        command_buffer,
                        staging.handle(),
                        image,
                        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                        &regions,
                    );
                }

                let to_present = vk::ImageMemoryBarrier::builder()
                    .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                    .dst_access_mask(vk::AccessFlags::empty())
                    .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                    .new_layout(vk::ImageLayout::PRESENT_SRC_KHR)
                    .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .image(image)
                    .subresource_range(color_subresource_range())
                    .build();
                device.cmd_pipeline_barrier(
                    command_buffer,
                    vk::PipelineStageFlags::TRANSFER,
                    vk::PipelineStageFlags::BOTTOM_OF_PIPE,
                    vk::DependencyFlags::empty(),
                    &[],
                    &[],
                    &[to_present],
                );
            }

            device.end_command_buffer(command_buffer).map_err(VulkanError::Api)?;
        }

        let wait_semaphores = [frame.sync.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [self.render_finished[image_slot].handle()];
        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores)
            .build();

        frame.sync.in_flight.reset()?;
        unsafe {
            device
                .queue_submit(self.context.device.graphics_queue, &[submit_info], frame.sync.in_flight.handle())
                .map_err(VulkanError::Api)?;
        }

        let swapchains = [swapchain.handle()];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&signal_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let presented = unsafe {
            swapchain
                .loader()
                .queue_present(self.context.device.present_queue, &present_info)
        };

        self.current_frame = (self.current_frame + 1) % MAX_FRAMES_IN_FLIGHT;

        match presented {
            Ok(false) => Ok(FrameOutcome::Presented),
            Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                self.recreate_swapchain()?;
                Ok(FrameOutcome::SwapchainStale)
            }
            Err(e) => Err(VulkanError::Api(e)),
        }
    }
}

impl Drop for VulkanRenderer {
    fn drop(&mut self) {
        if let Err(e) = self.context.device.wait_idle() {
            log::warn!("Device wait failed during renderer teardown: {}", e);
        }
    }
}

/// Clear every touched view that asks for a color clear
///
/// Depth and stencil flags are accepted but there is no depth attachment to
/// clear.
fn record_view_clears(
    device: &ash::Device,
    command_buffer: vk::CommandBuffer,
    views: &ViewTable,
    extent: vk::Extent2D,
) {
    for (id, state) in views.touched() {
        if !state.clear_flags.contains(ClearFlags::COLOR) {
            continue;
        }
        let Some(rect) = state.rect.clipped(extent.width, extent.height) else {
            log::trace!("View {} is outside the backbuffer", id);
            continue;
        };

        let attachment = vk::ClearAttachment {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            color_attachment: 0,
            clear_value: vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: unpack_rgba(state.clear_rgba),
                },
            },
        };
        let clear_rect = vk::ClearRect {
            rect: vk::Rect2D {
                offset: vk::Offset2D {
                    x: i32::from(rect.x),
                    y: i32::from(rect.y),
                },
                extent: vk::Extent2D {
                    width: u32::from(rect.width),
                    height: u32::from(rect.height),
                },
            },
            base_array_layer: 0,
            layer_count: 1,
        };

        unsafe {
            device.cmd_clear_attachments(command_buffer, &[attachment], &[clear_rect]);
        }
    }
}

fn copy_regions(raster: &TextRaster) -> Vec<vk::BufferImageCopy> {
    raster
        .spans
        .iter()
        .map(|span| vk::BufferImageCopy {
            buffer_offset: span.offset as vk::DeviceSize,
            buffer_row_length: 0,
            buffer_image_height: 0,
            image_subresource: vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            },
            image_offset: vk::Offset3D {
                x: i32::try_from(span.x).unwrap_or(i32::MAX),
                y: i32::try_from(span.y).unwrap_or(i32::MAX),
                z: 0,
            },
            image_extent: vk::Extent3D {
                width: span.len,
                height: 1,
                depth: 1,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_regions_follow_spans() {
        let mut text = DebugText::new();
        text.print(0, 0, 0x0f, "_");
        let raster = text.rasterize(64, 64, PixelOrder::Bgra8);
        let regions = copy_regions(&raster);

        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].buffer_offset, 0);
        assert_eq!(regions[0].image_offset.y, 7);
        assert_eq!(regions[0].image_extent.width, 8);
        assert_eq!(regions[0].image_extent.height, 1);
    }

    #[test]
    fn test_empty_raster_has_no_regions() {
        assert!(copy_regions(&TextRaster::default()).is_empty());
    }
}
