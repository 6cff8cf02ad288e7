//! Clear color selection

use std::f64::consts::TAU;

use crate::config::ClearMode;

/// Packed `0xRRGGBBAA` clear color for a mode at loop time `t` seconds
pub fn clear_color(mode: ClearMode, t: f64) -> u32 {
    match mode {
        ClearMode::Static { color } => color,
        ClearMode::Animated => animated_clear_color(t),
    }
}

/// Three sinusoids a third of a period apart, one per RGB channel
///
/// Each channel sweeps the full byte range; alpha is always opaque.
pub fn animated_clear_color(t: f64) -> u32 {
    let channel = |phase: f64| -> u32 {
        let level = 0.5 + 0.5 * (t + phase).sin();
        // NaN saturates to 0 in the cast
        (level * 255.0).round().clamp(0.0, 255.0) as u32
    };

    let r = channel(0.0);
    let g = channel(TAU / 3.0);
    let b = channel(2.0 * TAU / 3.0);

    (r << 24) | (g << 16) | (b << 8) | 0xff
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channels(rgba: u32) -> [u8; 4] {
        rgba.to_be_bytes()
    }

    #[test]
    fn test_alpha_is_always_opaque() {
        for step in 0..2_000 {
            let t = f64::from(step) * 0.037 - 20.0;
            assert_eq!(channels(animated_clear_color(t))[3], 0xff, "t = {t}");
        }
        for t in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, f64::MAX, 1e12] {
            assert_eq!(channels(animated_clear_color(t))[3], 0xff, "t = {t}");
        }
    }

    #[test]
    fn test_channels_sweep_full_range() {
        let (mut low, mut high) = ([255u8; 3], [0u8; 3]);
        for step in 0..10_000 {
            let rgb = channels(animated_clear_color(f64::from(step) * 0.001));
            for i in 0..3 {
                low[i] = low[i].min(rgb[i]);
                high[i] = high[i].max(rgb[i]);
            }
        }
        assert!(low.iter().all(|&c| c <= 1), "{low:?}");
        assert!(high.iter().all(|&c| c >= 254), "{high:?}");
    }

    #[test]
    fn test_known_values() {
        // sin(0) = 0 puts red at mid level
        let [r, g, b, a] = channels(animated_clear_color(0.0));
        assert_eq!(r, 128);
        assert_eq!((g, b, a), (238, 17, 0xff));
    }

    #[test]
    fn test_static_mode_ignores_time() {
        let mode = ClearMode::Static { color: 0x1f26_30ff };
        assert_eq!(clear_color(mode, 0.0), 0x1f26_30ff);
        assert_eq!(clear_color(mode, 123.4), 0x1f26_30ff);
        assert_eq!(clear_color(ClearMode::Animated, 2.0), animated_clear_color(2.0));
    }
}
