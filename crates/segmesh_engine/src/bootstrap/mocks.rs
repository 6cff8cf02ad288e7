//! Scripted collaborators for driving the bootstrap without a display or GPU

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::c_void;
use std::rc::Rc;

use raw_window_handle::{
    RawDisplayHandle, RawWindowHandle, WaylandDisplayHandle, WaylandWindowHandle, XcbDisplayHandle,
    XcbWindowHandle, XlibDisplayHandle, XlibWindowHandle,
};

use crate::gfx::{
    ClearFlags, GfxError, GfxResult, GraphicsBackend, InitDesc, RendererType, ResetFlags, ViewId,
};
use crate::platform::PlatformData;
use crate::window::WindowService;

/// Every collaborator call, in the order it happened
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    PollEvents,
    WaitEvents,
    DestroyWindow,
    Terminate,
    SetPlatformData,
    Init { width: u32, height: u32, reset: ResetFlags },
    Shutdown,
    Reset { width: u32, height: u32, reset: ResetFlags },
    SetViewClear { view: ViewId, flags: ClearFlags, rgba: u32 },
    SetViewRect { view: ViewId, x: u16, y: u16, width: u16, height: u16 },
    Touch(ViewId),
    DbgTextClear,
    DbgTextPrint { x: u16, y: u16, attr: u8, text: String },
    Frame,
}

/// Shared call log
pub type CallLog = Rc<RefCell<Vec<Call>>>;

pub fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Which native handles the mock window reports
#[derive(Debug, Clone, Copy)]
pub enum MockBackend {
    X11,
    Wayland,
    Xcb,
}

/// Window whose framebuffer size follows a script
///
/// Every `poll_events`/`wait_events` advances to the next scripted size; the
/// window asks to close once the script says so.
pub struct MockWindow {
    log: CallLog,
    backend: MockBackend,
    size: (u32, u32),
    script: VecDeque<(u32, u32)>,
    close_after: Option<usize>,
    polls: usize,
    close_requested: bool,
    time: f64,
}

impl MockWindow {
    pub fn new(log: &CallLog, size: (u32, u32)) -> Self {
        Self {
            log: Rc::clone(log),
            backend: MockBackend::X11,
            size,
            script: VecDeque::new(),
            close_after: None,
            polls: 0,
            close_requested: false,
            time: 0.0,
        }
    }

    pub fn with_backend(mut self, backend: MockBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Sizes reported after each successive event pump
    pub fn with_script(mut self, sizes: &[(u32, u32)]) -> Self {
        self.script = sizes.iter().copied().collect();
        self
    }

    /// Request close after `polls` non-blocking polls
    pub fn close_after(mut self, polls: usize) -> Self {
        self.close_after = Some(polls);
        self
    }

    fn pump(&mut self) {
        if let Some(size) = self.script.pop_front() {
            self.size = size;
        }
        self.time += 1.0 / 60.0;
    }

    fn fake_ptr(addr: usize) -> *mut c_void {
        addr as *mut c_void
    }
}

impl WindowService for MockWindow {
    fn poll_events(&mut self) {
        self.log.borrow_mut().push(Call::PollEvents);
        self.pump();
        self.polls += 1;
        if self.close_after.is_some_and(|limit| self.polls >= limit) {
            self.close_requested = true;
        }
    }

    fn wait_events(&mut self) {
        self.log.borrow_mut().push(Call::WaitEvents);
        self.pump();
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        self.size
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }

    fn request_close(&mut self) {
        self.close_requested = true;
    }

    fn time(&self) -> f64 {
        self.time
    }

    fn raw_display_handle(&self) -> RawDisplayHandle {
        match self.backend {
            MockBackend::X11 => {
                let mut handle = XlibDisplayHandle::empty();
                handle.display = Self::fake_ptr(0x1000);
                RawDisplayHandle::Xlib(handle)
            }
            MockBackend::Wayland => {
                let mut handle = WaylandDisplayHandle::empty();
                handle.display = Self::fake_ptr(0x2000);
                RawDisplayHandle::Wayland(handle)
            }
            MockBackend::Xcb => {
                let mut handle = XcbDisplayHandle::empty();
                handle.connection = Self::fake_ptr(0x4000);
                RawDisplayHandle::Xcb(handle)
            }
        }
    }

    fn raw_window_handle(&self) -> RawWindowHandle {
        match self.backend {
            MockBackend::X11 => {
                let mut handle = XlibWindowHandle::empty();
                handle.window = 42;
                RawWindowHandle::Xlib(handle)
            }
            MockBackend::Wayland => {
                let mut handle = WaylandWindowHandle::empty();
                handle.surface = Self::fake_ptr(0x3000);
                RawWindowHandle::Wayland(handle)
            }
            MockBackend::Xcb => {
                let mut handle = XcbWindowHandle::empty();
                handle.window = 7;
                RawWindowHandle::Xcb(handle)
            }
        }
    }

    fn terminate(self) {
        let mut log = self.log.borrow_mut();
        log.push(Call::DestroyWindow);
        log.push(Call::Terminate);
    }
}

/// Graphics backend that only records what it was asked to do
pub struct RecordingBackend {
    log: CallLog,
    platform: Option<PlatformData>,
    fail_init: bool,
    fail_frame: bool,
    initialized: bool,
    frames: u32,
}

impl RecordingBackend {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: Rc::clone(log),
            platform: None,
            fail_init: false,
            fail_frame: false,
            initialized: false,
            frames: 0,
        }
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Every `frame` call fails as if the device had been lost
    pub fn failing_frame(mut self) -> Self {
        self.fail_frame = true;
        self
    }

    fn record(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }
}

impl GraphicsBackend for RecordingBackend {
    fn set_platform_data(&mut self, data: PlatformData) {
        self.platform = Some(data);
        self.record(Call::SetPlatformData);
    }

    fn init(&mut self, desc: &InitDesc) -> GfxResult<()> {
        self.record(Call::Init {
            width: desc.resolution.width,
            height: desc.resolution.height,
            reset: desc.resolution.reset,
        });
        if self.platform.is_none() {
            return Err(GfxError::MissingPlatformData);
        }
        if self.fail_init {
            return Err(GfxError::InvalidResolution {
                width: desc.resolution.width,
                height: desc.resolution.height,
            });
        }
        self.initialized = true;
        Ok(())
    }

    fn shutdown(&mut self) {
        self.initialized = false;
        self.record(Call::Shutdown);
    }

    fn reset(&mut self, width: u32, height: u32, flags: ResetFlags) {
        self.record(Call::Reset {
            width,
            height,
            reset: flags,
        });
    }

    fn set_view_clear(&mut self, view: ViewId, flags: ClearFlags, rgba: u32, _depth: f32, _stencil: u8) {
        self.record(Call::SetViewClear { view, flags, rgba });
    }

    fn set_view_rect(&mut self, view: ViewId, x: u16, y: u16, width: u16, height: u16) {
        self.record(Call::SetViewRect {
            view,
            x,
            y,
            width,
            height,
        });
    }

    fn touch(&mut self, view: ViewId) {
        self.record(Call::Touch(view));
    }

    fn dbg_text_clear(&mut self) {
        self.record(Call::DbgTextClear);
    }

    fn dbg_text_print(&mut self, x: u16, y: u16, attr: u8, text: &str) {
        self.record(Call::DbgTextPrint {
            x,
            y,
            attr,
            text: text.to_string(),
        });
    }

    fn frame(&mut self) -> GfxResult<u32> {
        if !self.initialized || self.fail_frame {
            return Err(GfxError::NotInitialized);
        }
        self.record(Call::Frame);
        let frame = self.frames;
        self.frames += 1;
        Ok(frame)
    }

    fn renderer_type(&self) -> RendererType {
        RendererType::Vulkan
    }
}
