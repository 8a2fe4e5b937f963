//! WCAG 2.x contrast computation

use pdf_core::Color;

/// Relative luminance of an sRGB color
pub fn relative_luminance(color: Color) -> f64 {
    let linear = |c: f32| {
        let c = c as f64;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * linear(color.r) + 0.7152 * linear(color.g) + 0.0722 * linear(color.b)
}

/// Contrast ratio between two colors, in `1.0..=21.0`
///
/// The order of the arguments does not matter.
pub fn contrast_ratio(a: Color, b: Color) -> f64 {
    let (la, lb) = (relative_luminance(a), relative_luminance(b));
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_black_on_white_is_maximum() {
        let ratio = contrast_ratio(Color::black(), Color::white());
        assert!((ratio - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_color_is_minimum() {
        let gray = Color::gray(0.5);
        assert!((contrast_ratio(gray, gray) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_argument_order_is_irrelevant() {
        let bg = Color::from_rgb(0xDE, 0xB8, 0x87);
        let fg = Color::from_rgb(0x8B, 0x45, 0x13);
        assert_eq!(contrast_ratio(bg, fg), contrast_ratio(fg, bg));
    }

    #[test]
    fn test_luminance_bounds() {
        assert_eq!(relative_luminance(Color::black()), 0.0);
        assert!((relative_luminance(Color::white()) - 1.0).abs() < 1e-9);
    }
}
