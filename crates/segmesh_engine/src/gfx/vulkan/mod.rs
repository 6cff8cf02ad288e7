//! Vulkan implementation of [`GraphicsBackend`]
//!
//! [`VulkanBackend`] keeps the view table and debug text on the CPU and only
//! touches the GPU in `init`, `frame` and `shutdown`. A pending `reset` is
//! applied at the start of the next frame.

mod buffer;
mod commands;
mod context;
mod render_pass;
mod renderer;
mod swapchain;
mod sync;

pub use context::{LogicalDevice, PhysicalDeviceInfo, VulkanContext, VulkanError, VulkanInstance, VulkanResult};
pub use renderer::{FrameOutcome, VulkanRenderer, MAX_FRAMES_IN_FLIGHT};
pub use swapchain::{choose_extent, choose_present_mode, choose_surface_format, Swapchain};

use super::debug_text::DebugText;
use super::view::{ViewRect, ViewTable};
use super::{
    ClearFlags, GfxError, GfxResult, GraphicsBackend, InitDesc, RendererType, ResetFlags, Resolution, ViewId,
};
use crate::platform::PlatformData;

/// bgfx-style frame API over Vulkan
#[derive(Default)]
pub struct VulkanBackend {
    platform: Option<PlatformData>,
    renderer: Option<VulkanRenderer>,
    views: ViewTable,
    debug_text: DebugText,
    resolution: Option<Resolution>,
    pending_reset: Option<Resolution>,
    frame_number: u32,
}

impl VulkanBackend {
    /// Create an uninitialized backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `init` succeeded and `shutdown` has not run
    pub const fn is_initialized(&self) -> bool {
        self.renderer.is_some()
    }

    /// Backbuffer size last requested through `init` or `reset`
    pub fn resolution(&self) -> Option<Resolution> {
        self.pending_reset.or(self.resolution)
    }

    /// State of the view table
    pub const fn views(&self) -> &ViewTable {
        &self.views
    }

    fn apply_pending_reset(&mut self, renderer: &mut VulkanRenderer) -> GfxResult<()> {
        if let Some(pending) = self.pending_reset.take() {
            renderer.resize(pending.width, pending.height, pending.reset.contains(ResetFlags::VSYNC))?;
            log::debug!("Backbuffer reset to {}x{}", pending.width, pending.height);
            self.resolution = Some(pending);
        }
        Ok(())
    }
}

impl GraphicsBackend for VulkanBackend {
    fn set_platform_data(&mut self, data: PlatformData) {
        log::debug!("Platform data set for {} backend", data.backend());
        self.platform = Some(data);
    }

    fn init(&mut self, desc: &InitDesc) -> GfxResult<()> {
        if self.renderer.is_some() {
            return Err(GfxError::AlreadyInitialized);
        }
        let platform = self.platform.as_ref().ok_or(GfxError::MissingPlatformData)?;
        let Resolution { width, height, .. } = desc.resolution;
        if width == 0 || height == 0 {
            return Err(GfxError::InvalidResolution { width, height });
        }

        let renderer = VulkanRenderer::new(platform, desc)?;
        log::info!(
            "{} renderer ready on {} ({}x{})",
            desc.renderer.name(),
            renderer.device_name(),
            width,
            height
        );

        self.renderer = Some(renderer);
        self.resolution = Some(desc.resolution);
        self.pending_reset = None;
        self.frame_number = 0;
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.renderer.take().is_some() {
            log::info!("Vulkan renderer shut down after {} frames", self.frame_number);
        }
        self.views = ViewTable::new();
        self.debug_text.clear();
        self.resolution = None;
        self.pending_reset = None;
    }

    fn reset(&mut self, width: u32, height: u32, flags: ResetFlags) {
        if width == 0 || height == 0 {
            log::warn!("Ignoring reset to {}x{}", width, height);
            return;
        }
        self.pending_reset = Some(Resolution {
            width,
            height,
            reset: flags,
        });
    }

    fn set_view_clear(&mut self, view: ViewId, flags: ClearFlags, rgba: u32, depth: f32, stencil: u8) {
        if let Some(state) = self.views.get_mut(view) {
            state.clear_flags = flags;
            state.clear_rgba = rgba;
            state.clear_depth = depth;
            state.clear_stencil = stencil;
        }
    }

    fn set_view_rect(&mut self, view: ViewId, x: u16, y: u16, width: u16, height: u16) {
        if let Some(state) = self.views.get_mut(view) {
            state.rect = ViewRect { x, y, width, height };
        }
    }

    fn touch(&mut self, view: ViewId) {
        if let Some(state) = self.views.get_mut(view) {
            state.touched = true;
        }
    }

    fn dbg_text_clear(&mut self) {
        self.debug_text.clear();
    }

    fn dbg_text_print(&mut self, x: u16, y: u16, attr: u8, text: &str) {
        self.debug_text.print(x, y, attr, text);
    }

    fn frame(&mut self) -> GfxResult<u32> {
        let mut renderer = self.renderer.take().ok_or(GfxError::NotInitialized)?;

        let result = self
            .apply_pending_reset(&mut renderer)
            .and_then(|()| renderer.draw_frame(&self.views, &self.debug_text).map_err(GfxError::from));
        self.renderer = Some(renderer);

        match result? {
            FrameOutcome::Presented => {}
            outcome => log::debug!("Frame {} not presented: {:?}", self.frame_number, outcome),
        }

        self.views.end_frame();
        let submitted = self.frame_number;
        self.frame_number = self.frame_number.wrapping_add(1);
        Ok(submitted)
    }

    fn renderer_type(&self) -> RendererType {
        RendererType::Vulkan
    }
}
