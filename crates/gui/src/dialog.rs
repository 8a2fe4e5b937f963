//! Message boxes shown over the main window

use std::path::Path;

use pdf_core::PdfError;
use recolor::{ConversionReport, Mode, RecolorError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub kind: DialogKind,
    pub title: String,
    pub message: String,
}

impl Dialog {
    fn new(kind: DialogKind, title: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.to_string(),
            message: message.into(),
        }
    }

    /// A chosen input could not be opened
    pub fn open_failed(err: &PdfError) -> Self {
        match err {
            PdfError::NotFound(_) => Self::new(DialogKind::Error, "File Not Found", err.to_string()),
            PdfError::InvalidPdf(_) => Self::new(
                DialogKind::Warning,
                "Invalid File",
                "Please select a valid PDF file.",
            ),
            PdfError::ReadPermissionDenied(_) => {
                Self::new(DialogKind::Error, "Permission Denied", err.to_string())
            }
            _ => Self::new(DialogKind::Error, "Error", format!("Could not open PDF: {err}")),
        }
    }

    /// A conversion stopped with an error
    pub fn conversion_failed(err: &RecolorError) -> Self {
        let title = match err {
            RecolorError::Pdf(PdfError::NotFound(_)) => "File Not Found",
            RecolorError::Pdf(PdfError::InvalidPdf(_)) => "Invalid File",
            RecolorError::Pdf(PdfError::PermissionDenied(_))
            | RecolorError::Pdf(PdfError::ReadPermissionDenied(_)) => "Permission Denied",
            _ => "Error",
        };
        Self::new(DialogKind::Error, title, format!("Conversion failed: {err}"))
    }

    /// The conversion thread could not be started
    pub fn worker_failed(err: &std::io::Error) -> Self {
        Self::new(
            DialogKind::Error,
            "Error",
            format!("Conversion failed: could not start worker: {err}"),
        )
    }

    /// The converted file was written
    pub fn converted(report: &ConversionReport, output: &Path) -> Self {
        let mut message = format!(
            "Conversion completed successfully!\n\nSaved to {}\n{} pages in {}.",
            output.display(),
            report.pages,
            report.scheme
        );
        match report.mode {
            Mode::Remap if report.pages_skipped > 0 => {
                message.push_str(&format!(
                    "\n{} pages could not be decoded and were left unchanged.",
                    report.pages_skipped
                ));
            }
            Mode::Rebuild => {
                if report.substituted_chars > 0 {
                    message.push_str(&format!(
                        "\n{} characters were substituted (not in Helvetica).",
                        report.substituted_chars
                    ));
                }
                if !report.dropped_non_text.is_empty() {
                    message.push_str(&format!(
                        "\nImages and graphics were not carried over on pages {:?}.",
                        report.dropped_non_text
                    ));
                }
            }
            Mode::Remap => {}
        }

        let kind = if report.pages_skipped > 0 || !report.dropped_non_text.is_empty() {
            DialogKind::Warning
        } else {
            DialogKind::Info
        };
        Self::new(kind, "Success", message)
    }
}
