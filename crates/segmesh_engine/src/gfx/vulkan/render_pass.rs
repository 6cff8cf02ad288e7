//! Render pass and framebuffers for the backbuffer clear

use ash::{vk, Device};

use super::{VulkanError, VulkanResult};

/// Render pass wrapper with RAII cleanup
pub struct RenderPass {
    device: Device,
    render_pass: vk::RenderPass,
}

impl RenderPass {
    /// Single color attachment, cleared to black on load
    ///
    /// With `overlay` the pass ends in `TRANSFER_DST_OPTIMAL` so text spans can
    /// be copied in afterwards; otherwise it ends ready for presentation.
    pub fn new_clear_pass(device: Device, color_format: vk::Format, overlay: bool) -> VulkanResult<Self> {
        let final_layout = if overlay {
            vk::ImageLayout::TRANSFER_DST_OPTIMAL
        } else {
            vk::ImageLayout::PRESENT_SRC_KHR
        };

        let color_attachment = vk::AttachmentDescription::builder()
            .format(color_format)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(final_layout)
            .build();
        let attachments = [color_attachment];

        let color_attachment_ref = vk::AttachmentReference::builder()
            .attachment(0)
            .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            .build();
        let color_attachments = [color_attachment_ref];

        let subpass = vk::SubpassDescription::builder()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_attachments)
            .build();
        let subpasses = [subpass];

        let acquire = vk::SubpassDependency::builder()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
            .build();
        let overlay_copy = vk::SubpassDependency::builder()
            .src_subpass(0)
            .dst_subpass(vk::SUBPASS_EXTERNAL)
            .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .src_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
            .dst_stage_mask(vk::PipelineStageFlags::TRANSFER)
            .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE)
            .build();
        let all_dependencies = [acquire, overlay_copy];
        let dependencies = if overlay { &all_dependencies[..] } else { &all_dependencies[..1] };

        let render_pass_create_info = vk::RenderPassCreateInfo::builder()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(dependencies);

        let render_pass = unsafe {
            device
                .create_render_pass(&render_pass_create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self { device, render_pass })
    }

    /// Get the render pass handle
    pub const fn handle(&self) -> vk::RenderPass {
        self.render_pass
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_render_pass(self.render_pass, None);
        }
    }
}

/// Framebuffer wrapper with RAII cleanup
pub struct Framebuffer {
    device: Device,
    framebuffer: vk::Framebuffer,
}

impl Framebuffer {
    /// Wrap one swapchain image view
    pub fn new(
        device: Device,
        render_pass: &RenderPass,
        image_view: vk::ImageView,
        extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        let attachments = [image_view];
        let create_info = vk::FramebufferCreateInfo::builder()
            .render_pass(render_pass.handle())
            .attachments(&attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe { device.create_framebuffer(&create_info, None).map_err(VulkanError::Api)? };

        Ok(Self { device, framebuffer })
    }

    /// Get the framebuffer handle
    pub const fn handle(&self) -> vk::Framebuffer {
        self.framebuffer
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}
