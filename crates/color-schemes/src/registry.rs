//! Scheme lookup

use crate::scheme::{builtin_schemes, ColorScheme, SchemeDef};
use crate::{Result, SchemeError};

/// Ordered collection of the available schemes
#[derive(Debug, Clone)]
pub struct SchemeRegistry {
    schemes: Vec<ColorScheme>,
}

impl Default for SchemeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SchemeRegistry {
    /// Only the built-in schemes
    pub fn builtin() -> Self {
        Self {
            schemes: builtin_schemes(),
        }
    }

    /// Built-in schemes followed by custom ones
    ///
    /// A custom scheme whose key matches an existing one replaces it in
    /// place, keeping its position in the display order.
    pub fn with_custom(custom: Vec<SchemeDef>) -> Result<Self> {
        let mut registry = Self::builtin();
        for def in custom {
            let scheme = def.into_scheme()?;
            match registry.schemes.iter_mut().find(|s| s.key == scheme.key) {
                Some(existing) => *existing = scheme,
                None => registry.schemes.push(scheme),
            }
        }
        Ok(registry)
    }

    /// Keys in display order
    pub fn names(&self) -> Vec<&str> {
        self.schemes.iter().map(|s| s.key.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColorScheme> {
        self.schemes.iter()
    }

    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }

    /// Find a scheme by key
    ///
    /// Exact match first, then case-insensitive, then with `-`/`_` read as
    /// spaces (`dark-mode`, `green_tint`).
    pub fn get(&self, name: &str) -> Result<&ColorScheme> {
        let name = name.trim();
        let normalized = normalize(name);

        self.schemes
            .iter()
            .find(|s| s.key == name)
            .or_else(|| self.schemes.iter().find(|s| s.key.eq_ignore_ascii_case(name)))
            .or_else(|| self.schemes.iter().find(|s| normalize(&s.key) == normalized))
            .ok_or_else(|| SchemeError::UnknownScheme {
                name: name.to_string(),
                available: self.schemes.iter().map(|s| s.key.clone()).collect(),
            })
    }

    /// Info text for a scheme, as shown in listings
    pub fn describe(&self, name: &str) -> Result<String> {
        self.get(name).map(ColorScheme::describe)
    }
}

fn normalize(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '-' | '_' => ' ',
            c => c.to_ascii_lowercase(),
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Dark Mode"), "dark mode");
        assert_eq!(normalize("dark-mode"), "dark mode");
        assert_eq!(normalize("GREEN__tint"), "green tint");
    }
}
