//! Color utility functions shared across the picker models.
//!
//! Label colors are kept as opaque hex strings (`#RRGGBB` or `#AARRGGBB`)
//! so they can be handed to any rendering layer unchanged.

/// Convert HSV to RGB.
///
/// # Arguments
/// * `h` - Hue in degrees (0-360)
/// * `s` - Saturation (0.0-1.0)
/// * `v` - Value/brightness (0.0-1.0)
///
/// # Returns
/// RGB tuple with values in range 0.0-1.0
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r + m, g + m, b + m)
}

/// Format an RGB triple as `#RRGGBB`.
pub fn to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2])
}

/// Generate a distinct color for the n-th label.
///
/// Hues are spread with the golden angle so consecutive labels differ.
pub fn generated_color(index: usize) -> String {
    let hue = (index as f32 * 137.5) % 360.0;
    let (r, g, b) = hsv_to_rgb(hue, 0.8, 0.95);
    to_hex([
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    ])
}

/// Check that a string looks like `#RRGGBB` or `#AARRGGBB`.
pub fn is_hex_color(color: &str) -> bool {
    let Some(digits) = color.strip_prefix('#') else {
        return false;
    };
    matches!(digits.len(), 6 | 8) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsv_to_rgb_red() {
        let (r, g, b) = hsv_to_rgb(0.0, 1.0, 1.0);
        assert!((r - 1.0).abs() < 0.01);
        assert!(g.abs() < 0.01);
        assert!(b.abs() < 0.01);
    }

    #[test]
    fn test_hsv_to_rgb_green() {
        let (r, g, b) = hsv_to_rgb(120.0, 1.0, 1.0);
        assert!(r.abs() < 0.01);
        assert!((g - 1.0).abs() < 0.01);
        assert!(b.abs() < 0.01);
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex([255, 0, 20]), "#FF0014");
    }

    #[test]
    fn test_generated_colors_are_valid_and_distinct() {
        let a = generated_color(0);
        let b = generated_color(1);
        assert!(is_hex_color(&a));
        assert!(is_hex_color(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_is_hex_color() {
        assert!(is_hex_color("#1EFF00"));
        assert!(is_hex_color("#801EFF00"));
        assert!(!is_hex_color("1EFF00"));
        assert!(!is_hex_color("#12345"));
        assert!(!is_hex_color("#GGGGGG"));
    }
}
