//! GLFW implementation of the windowing service

use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle, RawDisplayHandle, RawWindowHandle};

use super::{WindowError, WindowResult, WindowService};
use crate::config::WindowConfig;

/// GLFW window wrapper with proper resource management
///
/// Field order matters: the window and its event receiver drop before the
/// `Glfw` handle, so the window is destroyed before GLFW terminates.
pub struct GlfwWindowService {
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    glfw: glfw::Glfw,
}

impl GlfwWindowService {
    /// Initialize GLFW and create the single application window
    pub fn create(config: &WindowConfig) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw_error_callback)
            .map_err(|e| WindowError::InitializationFailed(format!("{e:?}")))?;

        // Vulkan owns the surface, so no client API context
        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(config.width, config.height, &config.title, glfw::WindowMode::Windowed)
            .ok_or_else(|| WindowError::CreationFailed {
                title: config.title.clone(),
                width: config.width,
                height: config.height,
            })?;

        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);

        log::info!(
            "Created window \"{}\" ({}x{}), GLFW {}",
            config.title,
            config.width,
            config.height,
            glfw::get_version_string()
        );

        Ok(Self { window, events, glfw })
    }

    fn drain_events(&self) {
        for (_, event) in glfw::flush_messages(&self.events) {
            match event {
                glfw::WindowEvent::FramebufferSize(width, height) => {
                    log::debug!("Framebuffer resized to {}x{}", width, height);
                }
                glfw::WindowEvent::Close => log::info!("Window close requested"),
                other => log::trace!("Ignoring window event {:?}", other),
            }
        }
    }
}

fn glfw_error_callback(error: glfw::Error, description: String) {
    log::error!("GLFW error {:?}: {}", error, description);
}

impl WindowService for GlfwWindowService {
    fn poll_events(&mut self) {
        self.glfw.poll_events();
        self.drain_events();
    }

    fn wait_events(&mut self) {
        self.glfw.wait_events();
        self.drain_events();
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (
            u32::try_from(width).unwrap_or(0),
            u32::try_from(height).unwrap_or(0),
        )
    }

    fn should_close(&self) -> bool {
        self.window.should_close()
    }

    fn request_close(&mut self) {
        self.window.set_should_close(true);
    }

    fn time(&self) -> f64 {
        self.glfw.get_time()
    }

    fn raw_display_handle(&self) -> RawDisplayHandle {
        self.window.raw_display_handle()
    }

    fn raw_window_handle(&self) -> RawWindowHandle {
        self.window.raw_window_handle()
    }

    fn terminate(self) {
        let Self { window, events, glfw } = self;
        drop(window);
        log::debug!("Window destroyed");
        drop(events);
        drop(glfw);
        log::debug!("GLFW terminated");
    }
}
