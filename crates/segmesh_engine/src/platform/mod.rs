//! Platform handle resolution
//!
//! Detects which windowing backend the window service runs on and turns its
//! native handles into the [`PlatformData`] the graphics backend binds to.
//! Resolution happens once at startup; any unsupported or missing handle is
//! fatal.

use std::ffi::c_void;
use std::fmt;
use std::os::raw::c_ulong;
use std::ptr::NonNull;

use raw_window_handle::{
    RawDisplayHandle, RawWindowHandle, WaylandDisplayHandle, WaylandWindowHandle, XlibDisplayHandle,
    XlibWindowHandle,
};
use thiserror::Error;

use crate::window::WindowService;

/// Platform resolution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The window service runs on a backend the graphics layer cannot bind to
    #[error("Unsupported windowing backend: {0}")]
    UnsupportedBackend(&'static str),

    /// Display and window handles come from different backends
    #[error("Display handle is {display} but window handle is {window}")]
    MismatchedHandles {
        /// Kind of the display handle
        display: &'static str,
        /// Kind of the window handle
        window: &'static str,
    },

    /// A supported backend reported a null handle
    #[error("{backend} backend returned a null {handle} handle")]
    MissingHandle {
        /// Detected backend
        backend: WindowingBackend,
        /// Which handle was null
        handle: &'static str,
    },
}

/// Windowing backends the graphics layer can bind to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowingBackend {
    /// Xlib display connection and X11 window id
    X11,
    /// Wayland display and `wl_surface`
    Wayland,
}

impl WindowingBackend {
    /// Identify the backend from its display handle
    pub const fn detect(display: &RawDisplayHandle) -> Option<Self> {
        match display {
            RawDisplayHandle::Xlib(_) => Some(Self::X11),
            RawDisplayHandle::Wayland(_) => Some(Self::Wayland),
            _ => None,
        }
    }
}

impl fmt::Display for WindowingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X11 => f.write_str("X11"),
            Self::Wayland => f.write_str("Wayland"),
        }
    }
}

/// Native window reference, interpreted according to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeWindow {
    /// X11 `Window` id (never zero)
    X11(c_ulong),
    /// Wayland `wl_surface*`
    Wayland(NonNull<c_void>),
}

/// Native handle pair consumed once by the graphics backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformData {
    backend: WindowingBackend,
    display: NonNull<c_void>,
    window: NativeWindow,
}

impl PlatformData {
    /// Which backend the handles belong to
    pub const fn backend(&self) -> WindowingBackend {
        self.backend
    }

    /// Display connection (`Display*` or `wl_display*`)
    pub const fn display(&self) -> NonNull<c_void> {
        self.display
    }

    /// Window reference
    pub const fn window(&self) -> NativeWindow {
        self.window
    }

    /// Validate a raw handle pair and build platform data from it
    pub fn from_raw_handles(display: RawDisplayHandle, window: RawWindowHandle) -> Result<Self, PlatformError> {
        let backend = WindowingBackend::detect(&display)
            .ok_or(PlatformError::UnsupportedBackend(display_kind(&display)))?;

        match (display, window) {
            (RawDisplayHandle::Xlib(display), RawWindowHandle::Xlib(window)) => {
                let display = NonNull::new(display.display)
                    .ok_or(PlatformError::MissingHandle { backend, handle: "display" })?;
                if window.window == 0 {
                    return Err(PlatformError::MissingHandle { backend, handle: "window" });
                }
                Ok(Self {
                    backend,
                    display,
                    window: NativeWindow::X11(window.window),
                })
            }
            (RawDisplayHandle::Wayland(display), RawWindowHandle::Wayland(window)) => {
                let display = NonNull::new(display.display)
                    .ok_or(PlatformError::MissingHandle { backend, handle: "display" })?;
                let surface = NonNull::new(window.surface)
                    .ok_or(PlatformError::MissingHandle { backend, handle: "surface" })?;
                Ok(Self {
                    backend,
                    display,
                    window: NativeWindow::Wayland(surface),
                })
            }
            (display, window) => Err(PlatformError::MismatchedHandles {
                display: display_kind(&display),
                window: window_kind(&window),
            }),
        }
    }

    /// Rebuild the raw handle pair for surface creation
    pub fn raw_handles(&self) -> (RawDisplayHandle, RawWindowHandle) {
        match self.window {
            NativeWindow::X11(id) => {
                let mut display = XlibDisplayHandle::empty();
                display.display = self.display.as_ptr();
                let mut window = XlibWindowHandle::empty();
                window.window = id;
                (RawDisplayHandle::Xlib(display), RawWindowHandle::Xlib(window))
            }
            NativeWindow::Wayland(surface) => {
                let mut display = WaylandDisplayHandle::empty();
                display.display = self.display.as_ptr();
                let mut window = WaylandWindowHandle::empty();
                window.surface = surface.as_ptr();
                (RawDisplayHandle::Wayland(display), RawWindowHandle::Wayland(window))
            }
        }
    }
}

/// Resolve the platform data of an open window
pub fn resolve_platform_data<W: WindowService>(window: &W) -> Result<PlatformData, PlatformError> {
    let data = PlatformData::from_raw_handles(window.raw_display_handle(), window.raw_window_handle())?;
    log::info!("Windowing backend: {}", data.backend());
    Ok(data)
}

const fn display_kind(handle: &RawDisplayHandle) -> &'static str {
    match handle {
        RawDisplayHandle::Xlib(_) => "Xlib",
        RawDisplayHandle::Xcb(_) => "Xcb",
        RawDisplayHandle::Wayland(_) => "Wayland",
        RawDisplayHandle::Windows(_) => "Windows",
        RawDisplayHandle::AppKit(_) => "AppKit",
        RawDisplayHandle::UiKit(_) => "UiKit",
        RawDisplayHandle::Android(_) => "Android",
        RawDisplayHandle::Web(_) => "Web",
        _ => "unknown",
    }
}

const fn window_kind(handle: &RawWindowHandle) -> &'static str {
    match handle {
        RawWindowHandle::Xlib(_) => "Xlib",
        RawWindowHandle::Xcb(_) => "Xcb",
        RawWindowHandle::Wayland(_) => "Wayland",
        RawWindowHandle::Win32(_) => "Win32",
        RawWindowHandle::AppKit(_) => "AppKit",
        RawWindowHandle::UiKit(_) => "UiKit",
        RawWindowHandle::AndroidNdk(_) => "AndroidNdk",
        RawWindowHandle::Web(_) => "Web",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raw_window_handle::{Win32WindowHandle, WindowsDisplayHandle, XcbDisplayHandle, XcbWindowHandle};

    fn fake_ptr(addr: usize) -> *mut c_void {
        addr as *mut c_void
    }

    fn xlib(display: *mut c_void, window: c_ulong) -> (RawDisplayHandle, RawWindowHandle) {
        let mut d = XlibDisplayHandle::empty();
        d.display = display;
        let mut w = XlibWindowHandle::empty();
        w.window = window;
        (RawDisplayHandle::Xlib(d), RawWindowHandle::Xlib(w))
    }

    fn wayland(display: *mut c_void, surface: *mut c_void) -> (RawDisplayHandle, RawWindowHandle) {
        let mut d = WaylandDisplayHandle::empty();
        d.display = display;
        let mut w = WaylandWindowHandle::empty();
        w.surface = surface;
        (RawDisplayHandle::Wayland(d), RawWindowHandle::Wayland(w))
    }

    #[test]
    fn test_x11_handles_resolve() {
        let (d, w) = xlib(fake_ptr(0x1000), 42);
        let data = PlatformData::from_raw_handles(d, w).unwrap();
        assert_eq!(data.backend(), WindowingBackend::X11);
        assert_eq!(data.display().as_ptr(), fake_ptr(0x1000));
        assert_eq!(data.window(), NativeWindow::X11(42));
    }

    #[test]
    fn test_wayland_handles_resolve() {
        let (d, w) = wayland(fake_ptr(0x2000), fake_ptr(0x3000));
        let data = PlatformData::from_raw_handles(d, w).unwrap();
        assert_eq!(data.backend(), WindowingBackend::Wayland);
        assert_eq!(data.display().as_ptr(), fake_ptr(0x2000));
        match data.window() {
            NativeWindow::Wayland(surface) => assert_eq!(surface.as_ptr(), fake_ptr(0x3000)),
            other => panic!("expected a Wayland surface, got {other:?}"),
        }
    }

    #[test]
    fn test_null_handles_are_fatal() {
        let (d, w) = xlib(std::ptr::null_mut(), 42);
        assert_eq!(
            PlatformData::from_raw_handles(d, w),
            Err(PlatformError::MissingHandle { backend: WindowingBackend::X11, handle: "display" })
        );

        let (d, w) = xlib(fake_ptr(0x1000), 0);
        assert_eq!(
            PlatformData::from_raw_handles(d, w),
            Err(PlatformError::MissingHandle { backend: WindowingBackend::X11, handle: "window" })
        );

        let (d, w) = wayland(fake_ptr(0x2000), std::ptr::null_mut());
        assert_eq!(
            PlatformData::from_raw_handles(d, w),
            Err(PlatformError::MissingHandle { backend: WindowingBackend::Wayland, handle: "surface" })
        );
    }

    #[test]
    fn test_unsupported_backends_fail_fast() {
        let mut xcb_display = XcbDisplayHandle::empty();
        xcb_display.connection = fake_ptr(0x1000);
        let mut xcb_window = XcbWindowHandle::empty();
        xcb_window.window = 7;
        assert_eq!(
            PlatformData::from_raw_handles(RawDisplayHandle::Xcb(xcb_display), RawWindowHandle::Xcb(xcb_window)),
            Err(PlatformError::UnsupportedBackend("Xcb"))
        );

        assert_eq!(
            PlatformData::from_raw_handles(
                RawDisplayHandle::Windows(WindowsDisplayHandle::empty()),
                RawWindowHandle::Win32(Win32WindowHandle::empty()),
            ),
            Err(PlatformError::UnsupportedBackend("Windows"))
        );
    }

    #[test]
    fn test_mixed_backends_are_rejected() {
        let (d, _) = xlib(fake_ptr(0x1000), 42);
        let (_, w) = wayland(fake_ptr(0x2000), fake_ptr(0x3000));
        assert_eq!(
            PlatformData::from_raw_handles(d, w),
            Err(PlatformError::MismatchedHandles { display: "Xlib", window: "Wayland" })
        );
    }

    #[test]
    fn test_raw_handles_rebuild_the_same_pair() {
        let (d, w) = wayland(fake_ptr(0x2000), fake_ptr(0x3000));
        let data = PlatformData::from_raw_handles(d, w).unwrap();
        let (d2, w2) = data.raw_handles();
        assert_eq!(PlatformData::from_raw_handles(d2, w2), Ok(data));

        let (d, w) = xlib(fake_ptr(0x1000), 99);
        let data = PlatformData::from_raw_handles(d, w).unwrap();
        let (d2, w2) = data.raw_handles();
        assert_eq!(d2, d);
        assert_eq!(w2, w);
    }
}
