//! Windowing service
//!
//! The bootstrap talks to the OS window only through [`WindowService`]. The
//! production implementation is [`GlfwWindowService`]; tests drive the
//! bootstrap with scripted implementations of the same trait.

mod glfw_window;

pub use glfw_window::GlfwWindowService;

use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use thiserror::Error;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not be initialized
    #[error("GLFW initialization failed: {0}")]
    InitializationFailed(String),

    /// The window could not be created
    #[error("Window creation failed: {width}x{height} \"{title}\"")]
    CreationFailed {
        /// Requested title
        title: String,
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// Contract the bootstrap needs from a windowing service
///
/// One implementation owns exactly one window for its whole lifetime.
/// Everything runs on the thread that created it.
pub trait WindowService {
    /// Process pending window events without blocking
    fn poll_events(&mut self);

    /// Block until at least one window event arrives, then process it
    fn wait_events(&mut self);

    /// Current framebuffer size in pixels; may be 0x0 while minimized or mapping
    fn framebuffer_size(&self) -> (u32, u32);

    /// Whether the user asked to close the window
    fn should_close(&self) -> bool;

    /// Ask the window to close at the next loop check
    fn request_close(&mut self);

    /// Seconds since the service was initialized
    fn time(&self) -> f64;

    /// Native display connection of the active windowing backend
    fn raw_display_handle(&self) -> RawDisplayHandle;

    /// Native window/surface handle of the active windowing backend
    fn raw_window_handle(&self) -> RawWindowHandle;

    /// Destroy the window, then terminate the service
    fn terminate(self)
    where
        Self: Sized;
}
