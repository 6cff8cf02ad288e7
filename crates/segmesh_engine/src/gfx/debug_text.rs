//! Debug text overlay
//!
//! A character grid printed to by the application and rasterized on the CPU
//! every frame. The rasterizer emits one span per horizontal run of opaque
//! pixels so the GPU side can copy spans straight into the backbuffer without
//! touching transparent pixels.
//!
//! Attributes follow the VGA convention: low nibble is the foreground color,
//! high nibble the background color, background 0 is transparent.

use std::collections::BTreeMap;

use super::font::{self, GLYPH_SIZE};

/// Cell width and height in pixels
pub const CELL_SIZE: u32 = GLYPH_SIZE;

/// 16-color VGA palette as `0xRRGGBB`
pub const PALETTE: [u32; 16] = [
    0x00_0000, 0x00_00AA, 0x00_AA00, 0x00_AAAA, 0xAA_0000, 0xAA_00AA, 0xAA_5500, 0xAA_AAAA,
    0x55_5555, 0x55_55FF, 0x55_FF55, 0x55_FFFF, 0xFF_5555, 0xFF_55FF, 0xFF_FF55, 0xFF_FFFF,
];

/// Byte order of the target image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelOrder {
    /// `B, G, R, A`
    Bgra8,
    /// `R, G, B, A`
    Rgba8,
}

impl PixelOrder {
    fn encode(self, rgb: u32) -> [u8; 4] {
        let [_, r, g, b] = rgb.to_be_bytes();
        match self {
            Self::Bgra8 => [b, g, r, 0xFF],
            Self::Rgba8 => [r, g, b, 0xFF],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    attr: u8,
}

/// One horizontal run of opaque pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpan {
    /// Left pixel
    pub x: u32,
    /// Scanline
    pub y: u32,
    /// Run length in pixels
    pub len: u32,
    /// Byte offset of the first pixel in [`TextRaster::pixels`]
    pub offset: usize,
}

/// Rasterized overlay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextRaster {
    /// Packed 4-byte pixels of all spans, back to back
    pub pixels: Vec<u8>,
    /// Spans in scanline order
    pub spans: Vec<TextSpan>,
}

impl TextRaster {
    /// Whether nothing would be drawn
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Character grid of the overlay
#[derive(Debug, Clone, Default)]
pub struct DebugText {
    rows: BTreeMap<u16, Vec<Option<Cell>>>,
}

impl DebugText {
    /// Create an empty overlay
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all text
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Whether any cell holds text
    pub fn is_empty(&self) -> bool {
        self.rows.values().all(|row| row.iter().all(Option::is_none))
    }

    /// Write `text` starting at cell (`x`, `y`), overwriting what is there
    pub fn print(&mut self, x: u16, y: u16, attr: u8, text: &str) {
        let row = self.rows.entry(y).or_default();
        for (i, ch) in text.chars().enumerate() {
            let Some(col) = usize::from(x).checked_add(i) else { break };
            if col > usize::from(u16::MAX) {
                break;
            }
            if row.len() <= col {
                row.resize(col + 1, None);
            }
            row[col] = Some(Cell { ch, attr });
        }
    }

    /// Rasterize the grid for a target of `width` x `height` pixels
    pub fn rasterize(&self, width: u32, height: u32, order: PixelOrder) -> TextRaster {
        let mut raster = TextRaster::default();

        for (&cell_y, row) in &self.rows {
            let top = u32::from(cell_y) * CELL_SIZE;
            for line in 0..CELL_SIZE {
                let y = top + line;
                if y >= height {
                    break;
                }
                let mut open: Option<TextSpan> = None;

                for (cell_x, cell) in row.iter().copied().enumerate() {
                    let left = u32::try_from(cell_x).unwrap_or(u32::MAX).saturating_mul(CELL_SIZE);
                    for col in 0..CELL_SIZE {
                        let x = left.saturating_add(col);
                        let color = if x < width { cell.and_then(|c| cell_color(c, col, line)) } else { None };

                        match color {
                            Some(rgb) => {
                                let span = open.get_or_insert(TextSpan {
                                    x,
                                    y,
                                    len: 0,
                                    offset: raster.pixels.len(),
                                });
                                span.len += 1;
                                raster.pixels.extend_from_slice(&order.encode(rgb));
                            }
                            None => {
                                if let Some(span) = open.take() {
                                    raster.spans.push(span);
                                }
                            }
                        }
                    }
                }
                if let Some(span) = open.take() {
                    raster.spans.push(span);
                }
            }
        }

        raster
    }
}

fn cell_color(cell: Cell, col: u32, line: u32) -> Option<u32> {
    let fg = PALETTE[usize::from(cell.attr & 0x0F)];
    let bg_index = usize::from(cell.attr >> 4);

    if font::pixel(font::glyph(cell.ch), col, line) {
        Some(fg)
    } else if bg_index != 0 {
        Some(PALETTE[bg_index])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_overlay_rasterizes_to_nothing() {
        let text = DebugText::new();
        assert!(text.is_empty());
        assert!(text.rasterize(1280, 720, PixelOrder::Bgra8).is_empty());
    }

    #[test]
    fn test_spaces_on_transparent_background_draw_nothing() {
        let mut text = DebugText::new();
        text.print(0, 0, 0x0f, "    ");
        assert!(!text.is_empty());
        assert!(text.rasterize(1280, 720, PixelOrder::Bgra8).is_empty());
    }

    #[test]
    fn test_opaque_background_fills_whole_cell() {
        let mut text = DebugText::new();
        text.print(2, 1, 0x1f, " ");
        let raster = text.rasterize(1280, 720, PixelOrder::Rgba8);

        assert_eq!(raster.spans.len(), CELL_SIZE as usize);
        for (line, span) in raster.spans.iter().enumerate() {
            assert_eq!(span.x, 2 * CELL_SIZE);
            assert_eq!(span.y, CELL_SIZE + line as u32);
            assert_eq!(span.len, CELL_SIZE);
        }
        assert_eq!(&raster.pixels[..4], &[0x00, 0x00, 0xAA, 0xFF]);
        assert_eq!(raster.pixels.len(), (CELL_SIZE * CELL_SIZE * 4) as usize);
    }

    #[test]
    fn test_pixel_order_swaps_red_and_blue() {
        let mut text = DebugText::new();
        text.print(0, 0, 0x0c, "_");
        let bgra = text.rasterize(64, 64, PixelOrder::Bgra8);
        let rgba = text.rasterize(64, 64, PixelOrder::Rgba8);
        assert_eq!(&bgra.pixels[..4], &[0x55, 0x55, 0xFF, 0xFF]);
        assert_eq!(&rgba.pixels[..4], &[0xFF, 0x55, 0x55, 0xFF]);
    }

    #[test]
    fn test_underscore_is_a_single_full_width_span() {
        let mut text = DebugText::new();
        text.print(0, 0, 0x0f, "_");
        let raster = text.rasterize(64, 64, PixelOrder::Bgra8);
        assert_eq!(raster.spans, vec![TextSpan { x: 0, y: 7, len: 8, offset: 0 }]);
    }

    #[test]
    fn test_spans_are_clipped_to_target() {
        let mut text = DebugText::new();
        text.print(0, 0, 0xf0, "  ");
        let raster = text.rasterize(12, 5, PixelOrder::Bgra8);
        assert_eq!(raster.spans.len(), 5);
        assert!(raster.spans.iter().all(|s| s.x == 0 && s.len == 12));

        let raster = text.rasterize(1280, 720, PixelOrder::Bgra8);
        text.print(0, 200, 0xf0, "x");
        assert_eq!(raster, text.rasterize(1280, 720, PixelOrder::Bgra8));
    }

    #[test]
    fn test_span_offsets_index_their_pixels() {
        let mut text = DebugText::new();
        text.print(1, 1, 0x0f, "SegMesh: Vulkan");
        let raster = text.rasterize(1280, 720, PixelOrder::Bgra8);
        assert!(!raster.is_empty());

        let mut expected = 0;
        for span in &raster.spans {
            assert_eq!(span.offset, expected);
            expected += span.len as usize * 4;
        }
        assert_eq!(expected, raster.pixels.len());
    }

    #[test]
    fn test_print_overwrites_and_clear_resets() {
        let mut text = DebugText::new();
        text.print(0, 0, 0x0f, "AAAA");
        text.print(1, 0, 0x0f, "  ");
        let partly = text.rasterize(64, 64, PixelOrder::Bgra8);
        let mut fresh = DebugText::new();
        fresh.print(0, 0, 0x0f, "A");
        fresh.print(3, 0, 0x0f, "A");
        assert_eq!(partly, fresh.rasterize(64, 64, PixelOrder::Bgra8));

        text.clear();
        assert!(text.is_empty());
    }
}
