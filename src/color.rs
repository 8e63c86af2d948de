//! Shortcut colors and their animations
//!
//! Colors are packed `0xAABBGGRR`, alpha in the top byte.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorAnimation {
    #[default]
    None,
    SlowRainbow,
    Rainbow,
    FastRainbow,
    SlowFade,
    Fade,
    FastFade,
}

impl ColorAnimation {
    pub const ALL: [ColorAnimation; 7] = [
        ColorAnimation::None,
        ColorAnimation::SlowRainbow,
        ColorAnimation::Rainbow,
        ColorAnimation::FastRainbow,
        ColorAnimation::SlowFade,
        ColorAnimation::Fade,
        ColorAnimation::FastFade,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ColorAnimation::None => "None",
            ColorAnimation::SlowRainbow => "Slow Rainbow",
            ColorAnimation::Rainbow => "Rainbow",
            ColorAnimation::FastRainbow => "Fast Rainbow",
            ColorAnimation::SlowFade => "Slow Fade",
            ColorAnimation::Fade => "Fade",
            ColorAnimation::FastFade => "Fast Fade",
        }
    }

    /// Degrees of hue (rainbow) or radians*15 of pulse (fade) per second
    fn speed(self) -> f32 {
        match self {
            ColorAnimation::None => 0.0,
            ColorAnimation::SlowRainbow | ColorAnimation::SlowFade => 15.0,
            ColorAnimation::Rainbow | ColorAnimation::Fade => 30.0,
            ColorAnimation::FastRainbow | ColorAnimation::FastFade => 60.0,
        }
    }
}

pub fn to_rgba(color: u32) -> [u8; 4] {
    let [r, g, b, a] = color.to_le_bytes();
    [r, g, b, a]
}

pub fn from_rgba([r, g, b, a]: [u8; 4]) -> u32 {
    u32::from_le_bytes([r, g, b, a])
}

/// Color to draw at `seconds` since start
pub fn animate(color: u32, animation: ColorAnimation, seconds: f32) -> u32 {
    let [r, g, b, a] = to_rgba(color);
    match animation {
        ColorAnimation::None => color,
        ColorAnimation::SlowRainbow | ColorAnimation::Rainbow | ColorAnimation::FastRainbow => {
            let (h, s, v) = rgb_to_hsv(r, g, b);
            // Grey and white have no hue to rotate, so start them from red
            let (s, v) = if s == 0.0 { (1.0, v.max(0.5)) } else { (s, v) };
            let hue = (h + seconds * animation.speed()).rem_euclid(360.0);
            let (r, g, b) = hsv_to_rgb(hue, s, v);
            from_rgba([r, g, b, a])
        }
        ColorAnimation::SlowFade | ColorAnimation::Fade | ColorAnimation::FastFade => {
            let pulse = 0.5 + 0.5 * (seconds * animation.speed() / 15.0 * std::f32::consts::PI).cos();
            let alpha = (a as f32 * pulse).round().clamp(0.0, 255.0) as u8;
            from_rgba([r, g, b, alpha])
        }
    }
}

fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let (r, g, b) = (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let s = if max == 0.0 { 0.0 } else { delta / max };
    (h, s, max)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h as u32 / 60 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_byte = |f: f32| ((f + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_byte(r), to_byte(g), to_byte(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_layout() {
        assert_eq!(to_rgba(0xFF00_00FF), [0xFF, 0, 0, 0xFF]);
        assert_eq!(from_rgba([0x11, 0x22, 0x33, 0x44]), 0x4433_2211);
    }

    #[test]
    fn test_no_animation_is_identity() {
        assert_eq!(animate(0x8012_3456, ColorAnimation::None, 12.5), 0x8012_3456);
    }

    #[test]
    fn test_rainbow_keeps_alpha_and_moves_hue() {
        let red = from_rgba([255, 0, 0, 200]);
        let later = animate(red, ColorAnimation::Rainbow, 4.0);
        let [r, g, _, a] = to_rgba(later);
        assert_eq!(a, 200);
        // 120 degrees later pure red turns green
        assert!(g > r);
    }

    #[test]
    fn test_fade_pulses_alpha() {
        let white = 0xFFFF_FFFF;
        assert_eq!(to_rgba(animate(white, ColorAnimation::Fade, 0.0))[3], 255);
        let half_cycle = animate(white, ColorAnimation::Fade, 0.5);
        assert_eq!(to_rgba(half_cycle)[3], 0);
    }

    #[test]
    fn test_hsv_round_trip() {
        let (h, s, v) = rgb_to_hsv(30, 144, 255);
        assert_eq!(hsv_to_rgb(h, s, v), (30, 144, 255));
    }
}
