//! Resize tracking for the frame loop

/// Loop state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Frames are being produced
    Running,
    /// A close was requested; no further iterations run
    ShuttingDown,
}

/// Result of comparing the current framebuffer size with the last one seen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// Same size as the last recorded one
    Unchanged,
    /// New non-zero size; the backbuffer must be reset
    Resized,
    /// A dimension is zero; nothing may be submitted this iteration
    Suspended,
}

/// Last framebuffer size handed to the graphics backend, plus loop time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    width: u32,
    height: u32,
    elapsed: f64,
}

impl FrameState {
    /// Start from the size the backend was initialized with
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            elapsed: 0.0,
        }
    }

    /// Compare an observed size against the recorded one
    ///
    /// Zero sizes are never recorded, so returning from a minimized state to
    /// the old size does not count as a resize.
    pub fn observe(&mut self, width: u32, height: u32) -> ResizeOutcome {
        if width == 0 || height == 0 {
            return ResizeOutcome::Suspended;
        }
        if (width, height) == (self.width, self.height) {
            return ResizeOutcome::Unchanged;
        }
        self.width = width;
        self.height = height;
        ResizeOutcome::Resized
    }

    /// Record the loop time of the current iteration
    pub fn set_elapsed(&mut self, seconds: f64) {
        self.elapsed = seconds;
    }

    /// Recorded width
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Recorded height
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Loop time of the last completed iteration, in seconds
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }
}
