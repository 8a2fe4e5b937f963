//! PDF Core - Low-level PDF manipulation
//!
//! This crate provides functionality for:
//! - Opening and saving PDF documents
//! - Extracting positioned text spans from page content
//! - Rewriting content stream colors in place
//! - Drawing page backgrounds and replacement text
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Color, PdfDocument, RemapColors};
//!
//! let mut doc = PdfDocument::open("input.pdf")?;
//! let colors = RemapColors {
//!     background: Color::from_hex("#2D2D2D")?,
//!     text: Color::white(),
//!     replace_page_fills: true,
//! };
//! doc.fill_page_background(1, colors.background)?;
//! doc.remap_page_colors(1, &colors)?;
//! doc.save("output.pdf")?;
//! ```

mod cmap;
mod color;
mod document;
mod font;
mod remap;
mod text;

pub use cmap::ToUnicodeMap;
pub use color::Color;
pub use document::{has_pdf_header, is_valid_pdf, PageBox, PageGeometry, PdfDocument};
pub use font::{encode_win_ansi, FontInfo, Glyph, SimpleEncoding, OUTPUT_FONT_RESOURCE};
pub use remap::{remap_operations, RemapColors, RemapStats, StreamKind};
pub use text::{generate_text_operators, Matrix, PageText, TextRenderContext, TextSpan};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Not a valid PDF: {0}")]
    InvalidPdf(String),

    #[error("Write permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("Read permission denied: {}", .0.display())]
    ReadPermissionDenied(PathBuf),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;
