//! Per-view clear and rectangle state

use super::{ClearFlags, ViewId, MAX_VIEWS};

/// View rectangle in backbuffer pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewRect {
    /// Left edge
    pub x: u16,
    /// Top edge
    pub y: u16,
    /// Width
    pub width: u16,
    /// Height
    pub height: u16,
}

impl ViewRect {
    /// Clip against a backbuffer; `None` when nothing is left
    pub fn clipped(&self, width: u32, height: u32) -> Option<Self> {
        let x = u32::from(self.x);
        let y = u32::from(self.y);
        if x >= width || y >= height {
            return None;
        }
        let w = u32::from(self.width).min(width - x);
        let h = u32::from(self.height).min(height - y);
        if w == 0 || h == 0 {
            return None;
        }
        Some(Self {
            x: self.x,
            y: self.y,
            width: u16::try_from(w).unwrap_or(u16::MAX),
            height: u16::try_from(h).unwrap_or(u16::MAX),
        })
    }
}

/// Clear configuration and per-frame state of one view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    /// Buffers to clear
    pub clear_flags: ClearFlags,
    /// Packed `0xRRGGBBAA` clear color
    pub clear_rgba: u32,
    /// Depth clear value
    pub clear_depth: f32,
    /// Stencil clear value
    pub clear_stencil: u8,
    /// Target rectangle
    pub rect: ViewRect,
    /// Touched since the last frame
    pub touched: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            clear_flags: ClearFlags::empty(),
            clear_rgba: 0x0000_00ff,
            clear_depth: 1.0,
            clear_stencil: 0,
            rect: ViewRect::default(),
            touched: false,
        }
    }
}

/// Fixed table of all views
#[derive(Debug, Clone)]
pub struct ViewTable {
    views: Vec<ViewState>,
}

impl Default for ViewTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewTable {
    /// Create a table with every view in its default state
    pub fn new() -> Self {
        Self {
            views: vec![ViewState::default(); MAX_VIEWS],
        }
    }

    /// Mutable access to a view; out-of-range ids are logged and ignored
    pub fn get_mut(&mut self, view: ViewId) -> Option<&mut ViewState> {
        let state = self.views.get_mut(usize::from(view));
        if state.is_none() {
            log::warn!("View {} out of range (max {})", view, MAX_VIEWS - 1);
        }
        state
    }

    /// Read access to a view
    pub fn get(&self, view: ViewId) -> Option<&ViewState> {
        self.views.get(usize::from(view))
    }

    /// Views touched this frame, in submission order
    pub fn touched(&self) -> impl Iterator<Item = (ViewId, &ViewState)> + '_ {
        self.views
            .iter()
            .enumerate()
            .filter(|(_, state)| state.touched)
            .filter_map(|(index, state)| ViewId::try_from(index).ok().map(|id| (id, state)))
    }

    /// Forget touches at the end of a frame
    pub fn end_frame(&mut self) {
        for state in &mut self.views {
            state.touched = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_keeps_inner_rect() {
        let rect = ViewRect { x: 0, y: 0, width: 1280, height: 720 };
        assert_eq!(rect.clipped(1280, 720), Some(rect));
    }

    #[test]
    fn test_clip_trims_to_smaller_backbuffer() {
        let rect = ViewRect { x: 100, y: 50, width: 1280, height: 720 };
        assert_eq!(
            rect.clipped(800, 600),
            Some(ViewRect { x: 100, y: 50, width: 700, height: 550 })
        );
    }

    #[test]
    fn test_clip_outside_or_empty_is_none() {
        assert_eq!(ViewRect { x: 900, y: 0, width: 10, height: 10 }.clipped(800, 600), None);
        assert_eq!(ViewRect { x: 0, y: 0, width: 0, height: 10 }.clipped(800, 600), None);
    }

    #[test]
    fn test_touched_views_reset_at_end_of_frame() {
        let mut views = ViewTable::new();
        views.get_mut(3).unwrap().touched = true;
        views.get_mut(0).unwrap().touched = true;

        let ids: Vec<ViewId> = views.touched().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![0, 3]);

        views.end_frame();
        assert_eq!(views.touched().count(), 0);
    }

    #[test]
    fn test_out_of_range_view_is_ignored() {
        let mut views = ViewTable::new();
        assert!(views.get_mut(ViewId::try_from(MAX_VIEWS).unwrap()).is_none());
        assert!(views.get_mut(255).is_some());
    }
}
