//! Bootstrap and frame loop
//!
//! [`Bootstrap`] owns the window service and the graphics backend for the
//! whole process. Startup, the per-frame resize check and teardown all go
//! through it, so the order in which things are created and destroyed is
//! visible in one place.
//!
//! Startup: resolve platform handles, wait for a non-zero framebuffer, bind
//! and initialize the backend, configure view 0. Every iteration afterwards
//! polls events, resets the backbuffer if the framebuffer changed, touches
//! view 0 and submits a frame. A zero-sized framebuffer skips the iteration.

mod clear_color;
mod frame_state;
#[cfg(test)]
mod mocks;

pub use clear_color::{animated_clear_color, clear_color};
pub use frame_state::{FrameState, LoopState, ResizeOutcome};

use std::process::ExitCode;

use thiserror::Error;

use crate::config::{BootstrapConfig, ClearMode, ConfigError};
use crate::gfx::vulkan::VulkanBackend;
use crate::gfx::{ClearFlags, GfxError, GraphicsBackend, InitDesc, ResetFlags, Resolution, ViewId};
use crate::platform::{resolve_platform_data, PlatformError};
use crate::window::{GlfwWindowService, WindowError, WindowService};

/// The only view the bootstrap renders into
pub const MAIN_VIEW: ViewId = 0;

/// Cell position and attribute of the renderer name overlay
const DEBUG_TEXT_POS: (u16, u16) = (1, 1);
const DEBUG_TEXT_ATTR: u8 = 0x0f;

/// Fatal startup and runtime errors
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Configuration rejected before anything was created
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Windowing service or window creation failed
    #[error(transparent)]
    Window(#[from] WindowError),

    /// Native handles could not be resolved
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// Graphics backend failed to initialize or submit
    #[error(transparent)]
    Gfx(#[from] GfxError),

    /// The window was closed before it ever had a drawable size
    #[error("Window closed before its framebuffer became visible")]
    ClosedDuringStartup,
}

/// Window service and graphics backend bound together for one run
pub struct Bootstrap<W: WindowService, G: GraphicsBackend> {
    window: W,
    gfx: G,
    config: BootstrapConfig,
    frame: FrameState,
    state: LoopState,
    reset_flags: ResetFlags,
}

impl<W: WindowService, G: GraphicsBackend> Bootstrap<W, G> {
    /// Bind `gfx` to `window` and configure view 0
    ///
    /// On failure the window is destroyed and the service terminated before
    /// the error is returned.
    pub fn initialize(mut window: W, mut gfx: G, config: BootstrapConfig) -> Result<Self, BootstrapError> {
        match Self::bring_up(&mut window, &mut gfx, &config) {
            Ok((width, height)) => {
                let reset_flags = reset_flags(&config);
                let mut bootstrap = Self {
                    window,
                    gfx,
                    config,
                    frame: FrameState::new(width, height),
                    state: LoopState::Running,
                    reset_flags,
                };
                bootstrap.configure_main_view(width, height);
                Ok(bootstrap)
            }
            Err(e) => {
                window.terminate();
                Err(e)
            }
        }
    }

    fn bring_up(window: &mut W, gfx: &mut G, config: &BootstrapConfig) -> Result<(u32, u32), BootstrapError> {
        config.validate()?;
        let platform = resolve_platform_data(&*window)?;

        let (width, height) = wait_for_drawable_size(window)?;

        gfx.set_platform_data(platform);
        gfx.init(&InitDesc {
            renderer: config.renderer.renderer,
            resolution: Resolution {
                width,
                height,
                reset: reset_flags(config),
            },
            application_name: config.renderer.application_name.clone(),
            enable_validation: config.renderer.validation_enabled(),
        })?;

        log::info!(
            "{} backend initialized at {}x{} (vsync {})",
            gfx.renderer_type().name(),
            width,
            height,
            if config.renderer.vsync { "on" } else { "off" }
        );
        Ok((width, height))
    }

    fn configure_main_view(&mut self, width: u32, height: u32) {
        // Animated clears are configured per iteration instead
        if let ClearMode::Static { color } = self.config.clear {
            self.set_main_clear(color);
        }
        self.set_main_rect(width, height);
    }

    fn set_main_clear(&mut self, rgba: u32) {
        self.gfx
            .set_view_clear(MAIN_VIEW, ClearFlags::COLOR | ClearFlags::DEPTH, rgba, 1.0, 0);
    }

    fn set_main_rect(&mut self, width: u32, height: u32) {
        self.gfx.set_view_rect(
            MAIN_VIEW,
            0,
            0,
            u16::try_from(width).unwrap_or(u16::MAX),
            u16::try_from(height).unwrap_or(u16::MAX),
        );
    }

    /// Run one loop iteration
    pub fn step(&mut self) -> Result<LoopState, BootstrapError> {
        if self.state == LoopState::ShuttingDown {
            return Ok(self.state);
        }
        if self.window.should_close() {
            log::info!("Close requested, shutting down");
            self.state = LoopState::ShuttingDown;
            return Ok(self.state);
        }

        self.window.poll_events();

        let (width, height) = self.window.framebuffer_size();
        match self.frame.observe(width, height) {
            ResizeOutcome::Suspended => {
                log::trace!("Framebuffer is {}x{}, skipping frame", width, height);
                return Ok(self.state);
            }
            ResizeOutcome::Resized => {
                log::debug!("Resizing backbuffer to {}x{}", width, height);
                self.gfx.reset(width, height, self.reset_flags);
                self.set_main_rect(width, height);
            }
            ResizeOutcome::Unchanged => {}
        }

        let t = self.window.time();
        if self.config.clear == ClearMode::Animated {
            self.set_main_clear(clear_color(self.config.clear, t));
            self.set_main_rect(self.frame.width(), self.frame.height());
        }

        self.gfx.touch(MAIN_VIEW);

        if self.config.debug_text {
            let label = format!("SegMesh: {}", self.gfx.renderer_type().name());
            self.gfx.dbg_text_clear();
            self.gfx
                .dbg_text_print(DEBUG_TEXT_POS.0, DEBUG_TEXT_POS.1, DEBUG_TEXT_ATTR, &label);
        }

        let frame = self.gfx.frame()?;
        log::trace!("Submitted frame {} at t={:.3}s", frame, t);
        self.frame.set_elapsed(t);

        Ok(self.state)
    }

    /// Loop until the window closes, then tear everything down
    pub fn run(mut self) -> Result<(), BootstrapError> {
        let result = loop {
            match self.step() {
                Ok(LoopState::Running) => {}
                Ok(LoopState::ShuttingDown) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        self.shutdown();
        result
    }

    /// Shut down the backend, destroy the window, terminate the service
    pub fn shutdown(self) {
        let Self { window, mut gfx, .. } = self;
        gfx.shutdown();
        window.terminate();
        log::info!("Shutdown complete");
    }

    /// Current loop state
    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// Size and time of the last iteration
    pub const fn frame_state(&self) -> &FrameState {
        &self.frame
    }

    /// The window service
    pub const fn window(&self) -> &W {
        &self.window
    }

    /// Mutable access to the window service
    pub fn window_mut(&mut self) -> &mut W {
        &mut self.window
    }
}

fn reset_flags(config: &BootstrapConfig) -> ResetFlags {
    if config.renderer.vsync {
        ResetFlags::VSYNC
    } else {
        ResetFlags::empty()
    }
}

/// Block on window events until both framebuffer dimensions are non-zero
fn wait_for_drawable_size<W: WindowService>(window: &mut W) -> Result<(u32, u32), BootstrapError> {
    loop {
        let (width, height) = window.framebuffer_size();
        if width > 0 && height > 0 {
            return Ok((width, height));
        }
        if window.should_close() {
            return Err(BootstrapError::ClosedDuringStartup);
        }
        log::debug!("Framebuffer is {}x{}, waiting for the window to map", width, height);
        window.wait_events();
    }
}

/// Open the GLFW window, bring up Vulkan and run until the window closes
///
/// Exit status is 0 after a clean close and 1 on any startup or frame error.
pub fn run(config: &BootstrapConfig) -> ExitCode {
    let result = GlfwWindowService::create(&config.window)
        .map_err(BootstrapError::from)
        .and_then(|window| run_with(window, VulkanBackend::new(), config.clone()));
    ExitCode::from(exit_status(&result))
}

/// Initialize `gfx` on `window` and loop until the window closes
pub fn run_with<W: WindowService, G: GraphicsBackend>(
    window: W,
    gfx: G,
    config: BootstrapConfig,
) -> Result<(), BootstrapError> {
    Bootstrap::initialize(window, gfx, config)?.run()
}

/// Process exit status for the outcome of a run; failures are logged
pub fn exit_status(result: &Result<(), BootstrapError>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(BootstrapError::ClosedDuringStartup) => {
            log::info!("Window closed during startup");
            0
        }
        Err(e) => {
            log::error!("{}", e);
            1
        }
    }
}
