pub type Rgb = (u8, u8, u8);

pub fn parse_hex_color(hex: &str) -> Option<Rgb> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

/// Converts HSL (hue in degrees, saturation and lightness in 0..=1) to RGB.
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> Rgb {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = lightness - c / 2.0;

    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}

pub fn mix(from: Rgb, to: Rgb, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    (
        (from.0 as f32 * (1.0 - t) + to.0 as f32 * t) as u8,
        (from.1 as f32 * (1.0 - t) + to.1 as f32 * t) as u8,
        (from.2 as f32 * (1.0 - t) + to.2 as f32 * t) as u8,
    )
}

/// Random confetti colour: any hue at 80% saturation, 60% lightness.
pub fn random_festive() -> Rgb {
    hsl_to_rgb(fastrand::f32() * 360.0, 0.8, 0.6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_with_and_without_hash() {
        assert_eq!(parse_hex_color("1a1b26"), Some((0x1a, 0x1b, 0x26)));
        assert_eq!(parse_hex_color("#ff0080"), Some((255, 0, 128)));
        assert_eq!(parse_hex_color("fff"), None);
        assert_eq!(parse_hex_color("zzzzzz"), None);
    }

    #[test]
    fn hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), (255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), (0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), (0, 0, 255));
        assert_eq!(hsl_to_rgb(360.0, 1.0, 0.5), (255, 0, 0));
        assert_eq!(hsl_to_rgb(42.0, 0.0, 1.0), (255, 255, 255));
    }

    #[test]
    fn mix_clamps() {
        assert_eq!(mix((0, 0, 0), (200, 100, 50), 0.5), (100, 50, 25));
        assert_eq!(mix((0, 0, 0), (200, 100, 50), 3.0), (200, 100, 50));
    }
}
