//! Graphics backend
//!
//! A view-based frame submission API in the style of bgfx: views carry a
//! clear configuration and a rectangle, a view only clears in frames where it
//! was touched, and `frame` submits and presents everything at once.
//!
//! [`GraphicsBackend`] is the contract the bootstrap drives;
//! [`vulkan::VulkanBackend`] is the implementation over `ash`.

pub mod debug_text;
mod font;
pub mod view;
pub mod vulkan;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::PlatformData;
use vulkan::VulkanError;

/// Index of a render view
pub type ViewId = u16;

/// Number of addressable views
pub const MAX_VIEWS: usize = 256;

bitflags! {
    /// Which buffers a view clears
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u16 {
        /// Clear the color buffer
        const COLOR = 0x0001;
        /// Clear the depth buffer
        const DEPTH = 0x0002;
        /// Clear the stencil buffer
        const STENCIL = 0x0004;
    }
}

bitflags! {
    /// Backbuffer reset options
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResetFlags: u32 {
        /// Present in sync with the display refresh
        const VSYNC = 0x0000_0080;
    }
}

/// GPU API selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RendererType {
    /// Vulkan 1.0
    Vulkan,
}

impl RendererType {
    /// Human readable renderer name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vulkan => "Vulkan",
        }
    }
}

/// Backbuffer size and reset flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Reset flags
    pub reset: ResetFlags,
}

/// Graphics backend initialization parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitDesc {
    /// GPU API to bring up
    pub renderer: RendererType,
    /// Initial backbuffer
    pub resolution: Resolution,
    /// Application name reported to the driver
    pub application_name: String,
    /// Request validation layers when available
    pub enable_validation: bool,
}

/// Graphics backend errors
#[derive(Error, Debug)]
pub enum GfxError {
    /// `init` was called before platform data was injected
    #[error("Platform data must be set before init")]
    MissingPlatformData,

    /// `init` was called twice
    #[error("Graphics backend already initialized")]
    AlreadyInitialized,

    /// A frame call arrived before `init` or after `shutdown`
    #[error("Graphics backend not initialized")]
    NotInitialized,

    /// The requested backbuffer has a zero dimension
    #[error("Invalid resolution {width}x{height}")]
    InvalidResolution {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// Vulkan failure
    #[error(transparent)]
    Vulkan(#[from] VulkanError),
}

/// Result type for graphics operations
pub type GfxResult<T> = Result<T, GfxError>;

/// Contract the bootstrap needs from a graphics backend
pub trait GraphicsBackend {
    /// Inject the native handles `init` binds to
    fn set_platform_data(&mut self, data: PlatformData);

    /// Bring the GPU context online
    fn init(&mut self, desc: &InitDesc) -> GfxResult<()>;

    /// Release the GPU context; a no-op when not initialized
    fn shutdown(&mut self);

    /// Resize the backbuffer; applied at the next `frame`
    fn reset(&mut self, width: u32, height: u32, flags: ResetFlags);

    /// Configure how a view clears
    fn set_view_clear(&mut self, view: ViewId, flags: ClearFlags, rgba: u32, depth: f32, stencil: u8);

    /// Set the rectangle a view renders into
    fn set_view_rect(&mut self, view: ViewId, x: u16, y: u16, width: u16, height: u16);

    /// Clear the view this frame even without draw calls
    fn touch(&mut self, view: ViewId);

    /// Clear the debug text overlay
    fn dbg_text_clear(&mut self);

    /// Print to the debug text overlay at a cell position
    fn dbg_text_print(&mut self, x: u16, y: u16, attr: u8, text: &str);

    /// Submit the frame and present; returns the number of the submitted frame
    fn frame(&mut self) -> GfxResult<u32>;

    /// Renderer currently in use
    fn renderer_type(&self) -> RendererType;
}

/// Split a packed `0xRRGGBBAA` color into normalized floats
pub fn unpack_rgba(rgba: u32) -> [f32; 4] {
    let [r, g, b, a] = rgba.to_be_bytes();
    [r, g, b, a].map(|c| f32::from(c) / 255.0)
}
