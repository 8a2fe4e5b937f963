//! RGB colors and their PDF operator forms

use crate::{PdfError, Result};
use lopdf::content::Operation;

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Gray level as an RGB color
    pub fn gray(level: f32) -> Self {
        Self::rgb(level, level, level)
    }

    /// Naive CMYK to RGB conversion (no ICC profile)
    pub fn from_cmyk(c: f32, m: f32, y: f32, k: f32) -> Self {
        Self::rgb(
            (1.0 - c) * (1.0 - k),
            (1.0 - m) * (1.0 - k),
            (1.0 - y) * (1.0 - k),
        )
    }

    /// Interpret 1, 3 or 4 device color components (gray, RGB, CMYK)
    pub fn from_components(components: &[f32]) -> Option<Self> {
        match *components {
            [gray] => Some(Self::gray(gray)),
            [r, g, b] => Some(Self::rgb(r, g, b)),
            [c, m, y, k] => Some(Self::from_cmyk(c, m, y, k)),
            _ => None,
        }
    }

    /// Parse `#RRGGBB` or `RRGGBB` (case-insensitive)
    ///
    /// # Example
    /// ```
    /// use pdf_core::Color;
    ///
    /// let c = Color::from_hex("#2D2D2D").unwrap();
    /// assert_eq!(c.to_hex(), "#2D2D2D");
    /// ```
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().strip_prefix('#').unwrap_or(hex.trim());
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PdfError::InvalidColor(hex.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| PdfError::InvalidColor(hex.to_string()))
        };

        Ok(Self::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Render as uppercase `#RRGGBB`
    pub fn to_hex(&self) -> String {
        let [r, g, b] = self.to_rgb8();
        format!("#{r:02X}{g:02X}{b:02X}")
    }

    /// Channel values rounded to 0-255
    pub fn to_rgb8(&self) -> [u8; 3] {
        let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [to_byte(self.r), to_byte(self.g), to_byte(self.b)]
    }

    /// True when every channel is within `tolerance` of 1.0
    pub fn is_white(&self, tolerance: f32) -> bool {
        [self.r, self.g, self.b]
            .iter()
            .all(|v| (1.0 - v).abs() <= tolerance)
    }

    /// Non-stroking `rg` operation
    pub fn fill_operation(&self) -> Operation {
        Operation::new("rg", vec![self.r.into(), self.g.into(), self.b.into()])
    }

    /// Stroking `RG` operation
    pub fn stroke_operation(&self) -> Operation {
        Operation::new("RG", vec![self.r.into(), self.g.into(), self.b.into()])
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// White color
    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex_accepts_with_and_without_hash() {
        let a = Color::from_hex("#DEB887").unwrap();
        let b = Color::from_hex("deb887").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_rgb8(), [0xDE, 0xB8, 0x87]);
    }

    #[test]
    fn test_from_hex_rejects_garbage() {
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#GGGGGG").is_err());
        assert!(Color::from_hex("").is_err());
    }

    #[test]
    fn test_hex_is_uppercase() {
        assert_eq!(Color::from_rgb(0xe6, 0xf3, 0xe6).to_hex(), "#E6F3E6");
    }

    #[test]
    fn test_cmyk_conversion() {
        assert_eq!(Color::from_cmyk(0.0, 0.0, 0.0, 0.0), Color::white());
        assert_eq!(Color::from_cmyk(0.0, 0.0, 0.0, 1.0), Color::black());
    }

    #[test]
    fn test_is_white() {
        assert!(Color::white().is_white(0.01));
        assert!(Color::rgb(0.995, 1.0, 1.0).is_white(0.01));
        assert!(!Color::gray(0.9).is_white(0.01));
    }
}
