//! Colour helpers for spectrum plots.

use image::Rgb;

use crate::error::{Result, VisError};

/// Colour source for plotted spectrum points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Fixed(Rgb<u8>),
    TimeVarying,
}

impl Palette {
    /// Colour for a point whose phase value is `value`
    /// (timestamp plus relative frequency index)
    pub fn color_at(&self, value: f64) -> Rgb<u8> {
        match self {
            Palette::Fixed(color) => *color,
            Palette::TimeVarying => value_to_rgb(value),
        }
    }
}

/// Translate an arbitrary value to a colour.
///
/// Hue swings around 0.8 (violet) by ±0.2 following `sin(value)`, at half
/// saturation and full brightness, so the result repeats every 2π.
pub fn value_to_rgb(value: f64) -> Rgb<u8> {
    let hue = 0.8 + 0.2 * value.sin();
    let (r, g, b) = hsv_to_rgb(hue, 0.5, 1.0);
    Rgb([to_channel(r), to_channel(g), to_channel(b)])
}

/// HSV to RGB, all components in [0, 1]; hue wraps around
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (v, v, v);
    }
    let h = h.rem_euclid(1.0) * 6.0;
    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as u8 % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

fn to_channel(component: f64) -> u8 {
    (component.clamp(0.0, 1.0) * 255.0).floor() as u8
}

/// Parse a `#RRGGBB` colour code
pub fn parse_hex_color(code: &str) -> Result<Rgb<u8>> {
    let digits = code
        .strip_prefix('#')
        .filter(|d| d.len() == 6 && d.is_ascii())
        .ok_or_else(|| VisError::config(format!("colour must look like #RRGGBB, got {:?}", code)))?;

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| VisError::config(format!("invalid hex digits in colour {:?}", code)))
    };
    Ok(Rgb([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn value_to_rgb_is_periodic() {
        assert_eq!(value_to_rgb(0.0), value_to_rgb(2.0 * PI));
        assert_eq!(value_to_rgb(1.0), value_to_rgb(1.0 + 2.0 * PI));
    }

    #[test]
    fn value_to_rgb_at_zero() {
        // hue 0.8, s 0.5, v 1 -> (0.9, 0.5, 1.0)
        assert_eq!(value_to_rgb(0.0), Rgb([229, 127, 255]));
    }

    #[test]
    fn value_to_rgb_stays_in_gamut() {
        // Blue channel is always the brightest component in the 0.6..1.0 hue band
        for step in 0..1000 {
            let value = step as f64 * 0.037 - 10.0;
            let Rgb([r, g, b]) = value_to_rgb(value);
            assert_eq!(b.max(r), 255, "value {} gave {:?}", value, (r, g, b));
            assert!(g >= 127);
        }
    }

    #[test]
    fn hsv_primary_colors() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), (1.0, 0.0, 0.0));
        assert_eq!(hsv_to_rgb(1.0 / 3.0, 1.0, 1.0).1, 1.0);
        assert_eq!(hsv_to_rgb(0.5, 0.0, 0.3), (0.3, 0.3, 0.3));
    }

    #[test]
    fn parses_hex_codes() {
        assert_eq!(parse_hex_color("#5F00FF").unwrap(), Rgb([0x5F, 0x00, 0xFF]));
        assert_eq!(parse_hex_color("#a0b1c2").unwrap(), Rgb([0xA0, 0xB1, 0xC2]));
        assert!(parse_hex_color("5F00FF").is_err());
        assert!(parse_hex_color("#5F00F").is_err());
        assert!(parse_hex_color("#GG0000").is_err());
    }

    #[test]
    fn palette_fixed_ignores_value() {
        let palette = Palette::Fixed(Rgb([1, 2, 3]));
        assert_eq!(palette.color_at(0.0), palette.color_at(123.4));
    }
}
