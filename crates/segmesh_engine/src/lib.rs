//! # SegMesh Engine
//!
//! Window and GPU bootstrap for SegMesh: opens a GLFW window, binds a Vulkan
//! backend to its native handles and drives a resize-aware clear loop.
//!
//! ## Layers
//!
//! - **`window`**: windowing service contract and the GLFW implementation
//! - **`platform`**: X11/Wayland detection and native handle resolution
//! - **`gfx`**: view-based graphics backend contract and the Vulkan implementation
//! - **`bootstrap`**: initialization sequence, frame loop and teardown
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use segmesh_engine::prelude::*;
//!
//! fn main() -> std::process::ExitCode {
//!     segmesh_engine::foundation::logging::init();
//!     segmesh_engine::run(&BootstrapConfig::animated())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod bootstrap;
pub mod config;
pub mod foundation;
pub mod gfx;
pub mod platform;
pub mod window;

pub use bootstrap::{exit_status, run, run_with, Bootstrap, BootstrapError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        bootstrap::{animated_clear_color, clear_color, Bootstrap, BootstrapError, FrameState, LoopState, ResizeOutcome},
        config::{BootstrapConfig, ClearMode, Config, ConfigError, RendererConfig, WindowConfig},
        gfx::{ClearFlags, GraphicsBackend, GfxError, InitDesc, RendererType, ResetFlags, Resolution, ViewId},
        platform::{resolve_platform_data, PlatformData, PlatformError, WindowingBackend},
        window::{GlfwWindowService, WindowError, WindowService},
    };
}
