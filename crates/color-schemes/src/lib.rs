//! Color Schemes - Named reading palettes
//!
//! A scheme pairs a page background with a text color. Four schemes are
//! built in; more can be added from configuration through
//! [`SchemeRegistry::with_custom`].
//!
//! # Example
//!
//! ```
//! use color_schemes::SchemeRegistry;
//!
//! let registry = SchemeRegistry::builtin();
//! let sepia = registry.get("sepia").unwrap();
//! assert_eq!(sepia.background.to_hex(), "#DEB887");
//! ```

mod contrast;
mod registry;
mod scheme;

pub use contrast::{contrast_ratio, relative_luminance};
pub use registry::SchemeRegistry;
pub use scheme::{builtin_schemes, ColorScheme, SchemeDef, SchemeSummary};

use thiserror::Error;

/// Errors that can occur while resolving color schemes
#[derive(Debug, Error)]
pub enum SchemeError {
    #[error("Unknown color scheme: {name} (available: {})", .available.join(", "))]
    UnknownScheme { name: String, available: Vec<String> },

    #[error("Invalid color in scheme {key}: {source}")]
    InvalidColor {
        key: String,
        #[source]
        source: pdf_core::PdfError,
    },

    #[error("Color scheme key must not be empty")]
    EmptyKey,
}

/// Result type for scheme operations
pub type Result<T> = std::result::Result<T, SchemeError>;
