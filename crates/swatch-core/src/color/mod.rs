//! ARGB color helpers
//!
//! Colors are packed `0xAARRGGBB` values. HSV triples use hue in degrees `[0, 360)`
//! and saturation/value in `[0, 1]`.

pub mod history;

pub use history::{ColorState, HsvChannel, VersionedColor};

/// Packed `0xAARRGGBB` color
pub type Argb = u32;

pub fn alpha(color: Argb) -> u8 {
    (color >> 24) as u8
}

pub fn red(color: Argb) -> u8 {
    (color >> 16) as u8
}

pub fn green(color: Argb) -> u8 {
    (color >> 8) as u8
}

pub fn blue(color: Argb) -> u8 {
    color as u8
}

/// RGB part without alpha
pub fn rgb(color: Argb) -> u32 {
    color & 0x00ff_ffff
}

pub fn argb(a: u8, r: u8, g: u8, b: u8) -> Argb {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Replace the alpha channel of `color`
pub fn with_alpha(alpha: u8, color: Argb) -> Argb {
    ((alpha as u32) << 24) | rgb(color)
}

/// Per-channel linear blend from `from` to `to`; channels are truncated like the
/// integer math the persisted data was produced with
pub fn blend(from: Argb, to: Argb, factor: f32) -> Argb {
    if factor <= 0.0 {
        return from;
    }
    if factor >= 1.0 {
        return to;
    }
    let mix = |a: u8, b: u8| -> u8 {
        let a = a as f32;
        let b = b as f32;
        (a + (b - a) * factor) as u8
    };
    argb(
        mix(alpha(from), alpha(to)),
        mix(red(from), red(to)),
        mix(green(from), green(to)),
        mix(blue(from), blue(to)),
    )
}

/// Linear interpolation between two floats
pub fn lerp(from: f32, to: f32, factor: f32) -> f32 {
    from + (to - from) * factor
}

/// Convert the RGB part of `color` to `[hue, saturation, value]`
pub fn rgb_to_hsv(color: Argb) -> [f32; 3] {
    let r = red(color) as f64 / 255.0;
    let g = green(color) as f64 / 255.0;
    let b = blue(color) as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let value = max;
    let saturation = if max == 0.0 { 0.0 } else { delta / max };
    let mut hue = if delta == 0.0 {
        0.0
    } else if r == max {
        (g - b) / delta
    } else if g == max {
        2.0 + (b - r) / delta
    } else {
        4.0 + (r - g) / delta
    };
    hue *= 60.0;
    if hue < 0.0 {
        hue += 360.0;
    }

    [hue as f32, saturation as f32, value as f32]
}

/// Convert `[hue, saturation, value]` back to a color with the given alpha
pub fn hsv_to_rgb(hsv: [f32; 3], alpha: u8) -> Argb {
    let mut hue = (hsv[0] as f64) % 360.0;
    if hue < 0.0 {
        hue += 360.0;
    }
    let saturation = (hsv[1] as f64).clamp(0.0, 1.0);
    let value = (hsv[2] as f64).clamp(0.0, 1.0);

    let channel = |x: f64| -> u8 { (x * 255.0 + 0.5).clamp(0.0, 255.0) as u8 };

    if saturation == 0.0 {
        let v = channel(value);
        return argb(alpha, v, v, v);
    }

    let sector = hue / 60.0;
    let index = sector.floor();
    let fraction = sector - index;
    let p = value * (1.0 - saturation);
    let q = value * (1.0 - saturation * fraction);
    let t = value * (1.0 - saturation * (1.0 - fraction));

    let (r, g, b) = match index as i32 {
        0 => (value, t, p),
        1 => (q, value, p),
        2 => (p, value, t),
        3 => (p, q, value),
        4 => (t, p, value),
        _ => (value, p, q),
    };
    argb(alpha, channel(r), channel(g), channel(b))
}

/// Lower-case `rrggbb` hex of the RGB part
pub fn hex_name(color: Argb) -> String {
    format!("{:06x}", rgb(color))
}

/// Parse `rrggbb`, `aarrggbb`, optionally prefixed with `#` or `0x`.
/// Six-digit input is returned opaque.
pub fn parse_hex(value: &str) -> Option<Argb> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix('#')
        .or_else(|| trimmed.strip_prefix("0x"))
        .unwrap_or(trimmed);
    let parsed = u32::from_str_radix(digits, 16).ok()?;
    match digits.len() {
        6 => Some(0xff00_0000 | parsed),
        8 => Some(parsed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels() {
        let c = 0x80ff_4020;
        assert_eq!(alpha(c), 0x80);
        assert_eq!(red(c), 0xff);
        assert_eq!(green(c), 0x40);
        assert_eq!(blue(c), 0x20);
        assert_eq!(with_alpha(0xff, c), 0xffff_4020);
    }

    #[test]
    fn test_blend_endpoints_and_midpoint() {
        assert_eq!(blend(0xff00_0000, 0xffff_ffff, 0.0), 0xff00_0000);
        assert_eq!(blend(0xff00_0000, 0xffff_ffff, 1.0), 0xffff_ffff);
        assert_eq!(blend(0xff00_0000, 0xffff_ffff, 0.5), 0xff7f_7f7f);
    }

    #[test]
    fn test_hsv_primary_colors() {
        assert_eq!(rgb_to_hsv(0xffff_0000), [0.0, 1.0, 1.0]);
        assert_eq!(rgb_to_hsv(0xff00_ff00), [120.0, 1.0, 1.0]);
        assert_eq!(rgb_to_hsv(0xff00_00ff), [240.0, 1.0, 1.0]);
        assert_eq!(hsv_to_rgb([120.0, 1.0, 1.0], 0xff), 0xff00_ff00);
        assert_eq!(hsv_to_rgb([0.0, 0.0, 0.5], 0x40), 0x4080_8080);
    }

    #[test]
    fn test_hsv_reproduces_rgb() {
        for color in [
            0xffd6_e4ef,
            0xff3d_6a97,
            0xff12_3456,
            0xff00_0000,
            0xffff_ffff,
            0xff5a_ac3f,
            0xffe5_7d3b,
            0xff80_8080,
        ] {
            assert_eq!(hsv_to_rgb(rgb_to_hsv(color), 0xff), color, "{:08x}", color);
        }
    }

    #[test]
    fn test_hex() {
        assert_eq!(hex_name(0xffd6_e4ef), "d6e4ef");
        assert_eq!(parse_hex("#d6e4ef"), Some(0xffd6_e4ef));
        assert_eq!(parse_hex("80d6e4ef"), Some(0x80d6_e4ef));
        assert_eq!(parse_hex("0x00ff00"), Some(0xff00_ff00));
        assert_eq!(parse_hex("xyz"), None);
        assert_eq!(parse_hex("fff"), None);
    }
}
