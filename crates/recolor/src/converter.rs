//! Document conversion

use crate::progress::{ProgressEvent, ProgressSink};
use crate::{RecolorError, Result};
use color_schemes::ColorScheme;
use pdf_core::{PdfDocument, RemapColors, RemapStats};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Conversion strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Rewrite text colors in place, keeping all page content
    #[default]
    Remap,
    /// Redraw extracted text on fresh pages; images and vector art are lost
    Rebuild,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Remap => f.write_str("remap"),
            Mode::Rebuild => f.write_str("rebuild"),
        }
    }
}

impl FromStr for Mode {
    type Err = RecolorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remap" => Ok(Mode::Remap),
            "rebuild" => Ok(Mode::Rebuild),
            _ => Err(RecolorError::UnknownMode(s.to_string())),
        }
    }
}

/// Options for one conversion
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    pub scheme: ColorScheme,
    pub mode: Mode,
    /// Repaint page-sized white fills in the background color (remap only)
    pub replace_page_fills: bool,
    /// Flate-compress rewritten streams
    pub compress: bool,
}

impl ConvertOptions {
    pub fn new(scheme: ColorScheme) -> Self {
        Self {
            scheme,
            mode: Mode::default(),
            replace_page_fills: true,
            compress: true,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_replace_page_fills(mut self, replace: bool) -> Self {
        self.replace_page_fills = replace;
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

/// What a conversion did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversionReport {
    pub pages: usize,
    pub mode: Mode,
    /// Key of the scheme applied
    pub scheme: String,
    /// Text spans redrawn (rebuild)
    pub spans: usize,
    /// Characters the output font could not show as-is (rebuild)
    pub substituted_chars: usize,
    /// Text objects recolored (remap)
    pub text_objects: usize,
    /// Color operators removed from text objects (remap)
    pub colors_replaced: usize,
    /// White page-sized fills repainted (remap)
    pub page_fills_replaced: usize,
    /// Form XObjects rewritten (remap)
    pub forms_rewritten: usize,
    /// Pages whose content could not be decoded and were left as is (remap)
    pub pages_skipped: usize,
    /// Pages whose images or vector graphics were not carried over (rebuild)
    pub dropped_non_text: Vec<usize>,
}

impl ConversionReport {
    fn add_remap_stats(&mut self, stats: RemapStats) {
        self.text_objects += stats.text_objects;
        self.colors_replaced += stats.colors_replaced;
        self.page_fills_replaced += stats.page_fills_replaced;
        self.forms_rewritten += stats.forms_rewritten;
        self.pages_skipped += stats.pages_skipped;
    }
}

/// Applies a color scheme to PDF documents
#[derive(Debug, Clone)]
pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert `input` and write the result to `output`
    ///
    /// The input is read completely before anything is written, so `output`
    /// may name the input file.
    pub fn convert(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        progress: &mut impl ProgressSink,
    ) -> Result<ConversionReport> {
        let (input, output) = (input.as_ref(), output.as_ref());
        info!(
            input = %input.display(),
            output = %output.display(),
            scheme = %self.options.scheme.key,
            mode = %self.options.mode,
            "converting"
        );

        let source = PdfDocument::open(input)?;
        let (mut converted, report) = self.run(source, progress)?;

        progress.event(ProgressEvent::Saving);
        converted.save(output)?;
        progress.event(ProgressEvent::Finished);

        info!(pages = report.pages, output = %output.display(), "conversion finished");
        Ok(report)
    }

    /// Convert an in-memory PDF
    pub fn convert_bytes(
        &self,
        input: &[u8],
        progress: &mut impl ProgressSink,
    ) -> Result<(Vec<u8>, ConversionReport)> {
        let source = PdfDocument::open_from_bytes(input)?;
        let (mut converted, report) = self.run(source, progress)?;

        progress.event(ProgressEvent::Saving);
        let bytes = converted.to_bytes()?;
        progress.event(ProgressEvent::Finished);

        Ok((bytes, report))
    }

    fn run(
        &self,
        source: PdfDocument,
        progress: &mut impl ProgressSink,
    ) -> Result<(PdfDocument, ConversionReport)> {
        let pages = source.page_count();
        if pages == 0 {
            return Err(RecolorError::EmptyDocument);
        }

        let mut report = ConversionReport {
            pages,
            mode: self.options.mode,
            scheme: self.options.scheme.key.clone(),
            ..ConversionReport::default()
        };
        progress.event(ProgressEvent::Started { pages });

        let converted = match self.options.mode {
            Mode::Remap => self.remap(source, &mut report, progress)?,
            Mode::Rebuild => self.rebuild(&source, &mut report, progress)?,
        };

        if report.substituted_chars > 0 {
            warn!(
                count = report.substituted_chars,
                "characters outside the output font were substituted"
            );
        }
        if !report.dropped_non_text.is_empty() {
            warn!(
                pages = ?report.dropped_non_text,
                "images and vector graphics on these pages were not carried over"
            );
        }

        Ok((converted, report))
    }

    fn remap(
        &self,
        mut doc: PdfDocument,
        report: &mut ConversionReport,
        progress: &mut impl ProgressSink,
    ) -> Result<PdfDocument> {
        let scheme = &self.options.scheme;
        let colors = RemapColors {
            background: scheme.background,
            text: scheme.text,
            replace_page_fills: self.options.replace_page_fills,
        };
        doc.set_compression(self.options.compress);

        let pages = report.pages;
        let mut totals = RemapStats::default();
        for page in 1..=pages {
            let stats = doc.remap_page_colors(page, &colors)?;
            doc.fill_page_background(page, scheme.background)?;
            debug!(page, ?stats, "page remapped");
            totals += stats;
            progress.event(ProgressEvent::PageDone { page, pages });
        }
        report.add_remap_stats(totals);

        Ok(doc)
    }

    fn rebuild(
        &self,
        source: &PdfDocument,
        report: &mut ConversionReport,
        progress: &mut impl ProgressSink,
    ) -> Result<PdfDocument> {
        let scheme = &self.options.scheme;
        let mut out = PdfDocument::new_blank();
        out.set_compression(self.options.compress);

        let pages = report.pages;
        for page in 1..=pages {
            let geometry = source.page_geometry(page)?;
            let new_page = out.add_page_with_geometry(&geometry)?;
            out.fill_page_background(new_page, scheme.background)?;

            let text = source.extract_spans(page)?;
            let mut substituted = 0;
            for span in &text.spans {
                substituted += out.insert_span(new_page, span, scheme.text)?;
            }
            if text.has_graphics {
                report.dropped_non_text.push(page);
            }

            debug!(page, spans = text.spans.len(), substituted, "page rebuilt");
            report.spans += text.spans.len();
            report.substituted_chars += substituted;
            progress.event(ProgressEvent::PageDone { page, pages });
        }

        Ok(out)
    }
}

/// `<stem>_converted.pdf` next to the input
pub fn default_output_path(input: impl AsRef<Path>) -> PathBuf {
    let input = input.as_ref();
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    input.with_file_name(format!("{stem}_converted.pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("remap".parse::<Mode>().unwrap(), Mode::Remap);
        assert_eq!(" Rebuild ".parse::<Mode>().unwrap(), Mode::Rebuild);
        assert!(matches!(
            "invert".parse::<Mode>(),
            Err(RecolorError::UnknownMode(m)) if m == "invert"
        ));
        assert_eq!(Mode::default(), Mode::Remap);
        assert_eq!(Mode::Rebuild.to_string(), "rebuild");
    }

    #[test]
    fn test_report_serializes_mode_lowercase() {
        let report = ConversionReport {
            pages: 2,
            mode: Mode::Rebuild,
            scheme: "Sepia".to_string(),
            dropped_non_text: vec![2],
            ..ConversionReport::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "rebuild");
        assert_eq!(json["dropped_non_text"], serde_json::json!([2]));
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path("/docs/paper.pdf"),
            PathBuf::from("/docs/paper_converted.pdf")
        );
        assert_eq!(
            default_output_path("notes.v2.PDF"),
            PathBuf::from("notes.v2_converted.pdf")
        );
    }
}
