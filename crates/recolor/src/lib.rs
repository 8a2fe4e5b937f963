//! Recolor - Convert PDFs to a reading color scheme
//!
//! Two strategies are available:
//! - [`Mode::Remap`] keeps every page object and rewrites text colors in
//!   place, painting the scheme background beneath the page.
//! - [`Mode::Rebuild`] creates a fresh document with the same page sizes
//!   and redraws only the extracted text, in Helvetica, over the background.
//!
//! # Example
//!
//! ```ignore
//! use color_schemes::SchemeRegistry;
//! use recolor::{ConvertOptions, Converter, Mode, NoProgress};
//!
//! let scheme = SchemeRegistry::builtin().get("Sepia")?.clone();
//! let converter = Converter::new(ConvertOptions::new(scheme).with_mode(Mode::Remap));
//! let report = converter.convert("paper.pdf", "paper_converted.pdf", &mut NoProgress)?;
//! println!("{} pages converted", report.pages);
//! ```

mod config;
mod converter;
mod preview;
mod progress;

pub use config::{default_config_path, Config, ConvertConfig, PreviewConfig};
pub use converter::{default_output_path, ConversionReport, ConvertOptions, Converter, Mode};
pub use preview::{
    clamp_preview_dpi, render_preview, PreviewImage, DEFAULT_PREVIEW_DPI, MAX_PREVIEW_DPI,
    MIN_PREVIEW_DPI,
};
pub use progress::{NoProgress, ProgressEvent, ProgressSink};

use thiserror::Error;

/// Errors that can occur during conversion
#[derive(Debug, Error)]
pub enum RecolorError {
    #[error(transparent)]
    Pdf(#[from] pdf_core::PdfError),

    #[error(transparent)]
    Scheme(#[from] color_schemes::SchemeError),

    #[error("Document has no pages")]
    EmptyDocument,

    #[error("Unknown conversion mode: {0} (expected remap or rebuild)")]
    UnknownMode(String),

    #[error("Preview failed: {0}")]
    Preview(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl RecolorError {
    pub(crate) fn io_with_context(source: std::io::Error, context: impl Into<String>) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, RecolorError>;
