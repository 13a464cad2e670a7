use crate::error::CoreError;

/// 8-bit RGB triple.
pub type Rgb = (u8, u8, u8);

/// Pure white, the foreground fallback for incomplete themes.
pub const WHITE: Rgb = (255, 255, 255);

/// Pure black, substituted for unreadable pixels.
pub const BLACK: Rgb = (0, 0, 0);

/// CSS-style color names accepted in theme definitions.
const NAMED_COLORS: &[(&str, Rgb)] = &[
    ("black", (0, 0, 0)),
    ("white", (255, 255, 255)),
    ("red", (255, 0, 0)),
    ("lime", (0, 255, 0)),
    ("green", (0, 128, 0)),
    ("blue", (0, 0, 255)),
    ("yellow", (255, 255, 0)),
    ("cyan", (0, 255, 255)),
    ("aqua", (0, 255, 255)),
    ("magenta", (255, 0, 255)),
    ("fuchsia", (255, 0, 255)),
    ("orange", (255, 165, 0)),
    ("amber", (255, 191, 0)),
    ("purple", (128, 0, 128)),
    ("navy", (0, 0, 128)),
    ("teal", (0, 128, 128)),
    ("olive", (128, 128, 0)),
    ("maroon", (128, 0, 0)),
    ("silver", (192, 192, 192)),
    ("gray", (128, 128, 128)),
    ("grey", (128, 128, 128)),
    ("darkgray", (169, 169, 169)),
    ("darkgrey", (169, 169, 169)),
    ("lightgray", (211, 211, 211)),
    ("lightgrey", (211, 211, 211)),
    ("ivory", (255, 255, 240)),
];

/// Parse a color given as `#rgb`, `#rrggbb` or a CSS-style name.
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Errors
/// Returns [`CoreError::UnknownColor`] for anything else.
///
/// # Example
/// ```
/// use gt_core::color::parse_color;
/// assert_eq!(parse_color("#FFBF00").unwrap(), (255, 191, 0));
/// assert_eq!(parse_color("Lime").unwrap(), (0, 255, 0));
/// assert_eq!(parse_color("#fff").unwrap(), (255, 255, 255));
/// ```
pub fn parse_color(value: &str) -> Result<Rgb, CoreError> {
    let normalized = value.trim().to_ascii_lowercase();

    if let Some(hex) = normalized.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(|| CoreError::UnknownColor(value.to_string()));
    }

    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == normalized)
        .map(|(_, rgb)| *rgb)
        .ok_or_else(|| CoreError::UnknownColor(value.to_string()))
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|d| d * 17);
            Some((digit(0)?, digit(1)?, digit(2)?))
        }
        6 => {
            let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some((pair(0)?, pair(2)?, pair(4)?))
        }
        _ => None,
    }
}

/// Format a color as `#rrggbb`.
///
/// # Example
/// ```
/// use gt_core::color::to_hex;
/// assert_eq!(to_hex((240, 240, 240)), "#f0f0f0");
/// ```
#[must_use]
pub fn to_hex(rgb: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb.0, rgb.1, rgb.2)
}

/// Equal-weight channel average in [0.0, 255.0].
#[inline]
#[must_use]
pub fn channel_average(rgb: Rgb) -> f32 {
    (f32::from(rgb.0) + f32::from(rgb.1) + f32::from(rgb.2)) / 3.0
}

/// Multiply every channel by `factor`, truncating toward zero and clamping
/// to [0, 255].
///
/// # Example
/// ```
/// use gt_core::color::scale;
/// assert_eq!(scale((200, 100, 10), 0.7), (140, 70, 7));
/// assert_eq!(scale((255, 255, 255), 0.7), (178, 178, 178));
/// ```
#[inline]
#[must_use]
pub fn scale(rgb: Rgb, factor: f64) -> Rgb {
    let channel = |c: u8| (f64::from(c) * factor).clamp(0.0, 255.0) as u8;
    (channel(rgb.0), channel(rgb.1), channel(rgb.2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(parse_color("#1c1c1c"), Ok((28, 28, 28)));
        assert_eq!(parse_color("#F0F0F0"), Ok((240, 240, 240)));
        assert_eq!(parse_color("#abc"), Ok((170, 187, 204)));
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!(parse_color("  Black "), Ok(BLACK));
        assert_eq!(parse_color("LIGHTGREY"), Ok((211, 211, 211)));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("#gggggg").is_err());
        assert!(parse_color("not-a-color").is_err());
        assert!(parse_color("").is_err());
    }

    #[test]
    fn hex_formatting_matches_parser() {
        let rgb = (1, 128, 255);
        assert_eq!(parse_color(&to_hex(rgb)), Ok(rgb));
    }

    #[test]
    fn scale_clamps() {
        assert_eq!(scale(WHITE, 2.0), WHITE);
        assert_eq!(scale(WHITE, 0.0), BLACK);
        assert_eq!(scale((255, 128, 0), 0.8), (204, 102, 0));
        assert_eq!(scale((255, 1, 3), 0.5), (127, 0, 1));
    }
}
