//! Scheme definitions and the built-in table

use crate::contrast::contrast_ratio;
use crate::{Result, SchemeError};
use pdf_core::Color;
use serde::{Deserialize, Serialize};

/// A background/text color pair
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScheme {
    /// Lookup key (e.g. "Dark Mode")
    pub key: String,
    /// Display name
    pub name: String,
    pub description: String,
    pub background: Color,
    pub text: Color,
    /// Published contrast ratio for the pair
    pub contrast_ratio: f64,
}

impl ColorScheme {
    /// WCAG contrast ratio of the two colors
    pub fn computed_contrast(&self) -> f64 {
        contrast_ratio(self.background, self.text)
    }

    /// Info text shown when listing schemes
    pub fn describe(&self) -> String {
        format!(
            "{}\n{}\nBackground: {} | Text: {}\nContrast Ratio: {:.1}:1",
            self.name,
            self.description,
            self.background.to_hex(),
            self.text.to_hex(),
            self.contrast_ratio
        )
    }

    pub fn summary(&self) -> SchemeSummary {
        SchemeSummary {
            key: self.key.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            background: self.background.to_hex(),
            text: self.text.to_hex(),
            contrast_ratio: self.contrast_ratio,
            computed_contrast: (self.computed_contrast() * 10.0).round() / 10.0,
        }
    }
}

fn builtin(
    key: &str,
    name: &str,
    description: &str,
    background: [u8; 3],
    text: [u8; 3],
    ratio: f64,
) -> ColorScheme {
    ColorScheme {
        key: key.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        background: Color::from_rgb(background[0], background[1], background[2]),
        text: Color::from_rgb(text[0], text[1], text[2]),
        contrast_ratio: ratio,
    }
}

/// The built-in schemes in display order
pub fn builtin_schemes() -> Vec<ColorScheme> {
    vec![
        builtin(
            "Dark Mode",
            "Dark Mode",
            "Dark background for low light reading",
            [0x2D, 0x2D, 0x2D],
            [0xFF, 0xFF, 0xFF],
            13.4,
        ),
        builtin(
            "Sepia",
            "Sepia Reading",
            "Warm brown/beige background - easy on the eyes",
            [0xDE, 0xB8, 0x87],
            [0x8B, 0x45, 0x13],
            8.2,
        ),
        builtin(
            "High Contrast",
            "High Contrast",
            "Black text on white background - maximum readability",
            [0xFF, 0xFF, 0xFF],
            [0x00, 0x00, 0x00],
            21.0,
        ),
        builtin(
            "Green Tint",
            "Green Tint",
            "Light green background - gentle on the eyes",
            [0xE6, 0xF3, 0xE6],
            [0x2D, 0x5A, 0x2D],
            9.1,
        ),
    ]
}

/// A scheme as written in a configuration file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SchemeDef {
    pub key: String,
    /// Defaults to the key
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    /// `#RRGGBB`
    pub background: String,
    /// `#RRGGBB`
    pub text: String,
    /// Computed from the colors when omitted
    #[serde(default)]
    pub contrast_ratio: Option<f64>,
}

impl SchemeDef {
    /// Validate the colors and build a scheme
    pub fn into_scheme(self) -> Result<ColorScheme> {
        let key = self.key.trim().to_string();
        if key.is_empty() {
            return Err(SchemeError::EmptyKey);
        }

        let parse = |hex: &str| {
            Color::from_hex(hex).map_err(|source| SchemeError::InvalidColor {
                key: key.clone(),
                source,
            })
        };
        let background = parse(&self.background)?;
        let text = parse(&self.text)?;

        let contrast = self
            .contrast_ratio
            .unwrap_or_else(|| (contrast_ratio(background, text) * 10.0).round() / 10.0);

        Ok(ColorScheme {
            name: self.name.unwrap_or_else(|| key.clone()),
            key,
            description: self.description,
            background,
            text,
            contrast_ratio: contrast,
        })
    }
}

/// Serializable view of a scheme for `--json` listings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemeSummary {
    pub key: String,
    pub name: String,
    pub description: String,
    pub background: String,
    pub text: String,
    pub contrast_ratio: f64,
    pub computed_contrast: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_order_and_keys() {
        let keys: Vec<String> = builtin_schemes().into_iter().map(|s| s.key).collect();
        assert_eq!(keys, vec!["Dark Mode", "Sepia", "High Contrast", "Green Tint"]);
    }

    #[test]
    fn test_builtin_hex_values() {
        let schemes = builtin_schemes();
        let pairs: Vec<(String, String)> = schemes
            .iter()
            .map(|s| (s.background.to_hex(), s.text.to_hex()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("#2D2D2D".to_string(), "#FFFFFF".to_string()),
                ("#DEB887".to_string(), "#8B4513".to_string()),
                ("#FFFFFF".to_string(), "#000000".to_string()),
                ("#E6F3E6".to_string(), "#2D5A2D".to_string()),
            ]
        );
    }

    #[test]
    fn test_builtin_schemes_meet_large_text_contrast() {
        // Sepia's computed ratio (3.8) is well below its published 8.2
        for scheme in builtin_schemes() {
            assert!(
                scheme.computed_contrast() >= 3.0,
                "{} has contrast {}",
                scheme.key,
                scheme.computed_contrast()
            );
        }
    }

    #[test]
    fn test_describe() {
        let dark = &builtin_schemes()[0];
        assert_eq!(
            dark.describe(),
            "Dark Mode\nDark background for low light reading\n\
             Background: #2D2D2D | Text: #FFFFFF\nContrast Ratio: 13.4:1"
        );
    }

    #[test]
    fn test_def_computes_missing_ratio() {
        let def = SchemeDef {
            key: "Night".to_string(),
            name: None,
            description: String::new(),
            background: "#000000".to_string(),
            text: "#FFFFFF".to_string(),
            contrast_ratio: None,
        };
        let scheme = def.into_scheme().unwrap();
        assert_eq!(scheme.name, "Night");
        assert_eq!(scheme.contrast_ratio, 21.0);
    }

    #[test]
    fn test_def_rejects_bad_color() {
        let def = SchemeDef {
            key: "Broken".to_string(),
            name: None,
            description: String::new(),
            background: "#12".to_string(),
            text: "#FFFFFF".to_string(),
            contrast_ratio: None,
        };
        assert!(matches!(
            def.into_scheme(),
            Err(SchemeError::InvalidColor { ref key, .. }) if key == "Broken"
        ));
    }
}
