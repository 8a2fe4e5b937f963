//! PNG rendering of a single page

use std::io::Cursor;
use std::sync::Arc;

use hayro::hayro_interpret::InterpreterSettings;
use hayro::hayro_syntax::Pdf;
use hayro::vello_cpu::color::palette::css::WHITE;
use hayro::{render, RenderSettings};
use image::{ImageFormat, RgbaImage};
use tracing::debug;

use crate::{RecolorError, Result};

pub const DEFAULT_PREVIEW_DPI: u32 = 150;
pub const MIN_PREVIEW_DPI: u32 = 36;
pub const MAX_PREVIEW_DPI: u32 = 600;

/// PDF user space units per inch
const POINTS_PER_INCH: f32 = 72.0;

/// Encoded preview of one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

/// Bring a requested resolution into the supported range
pub fn clamp_preview_dpi(dpi: u32) -> u32 {
    dpi.clamp(MIN_PREVIEW_DPI, MAX_PREVIEW_DPI)
}

/// Render page `page` (0-indexed) of a PDF at `dpi` and encode it as PNG
///
/// `dpi` must lie in `MIN_PREVIEW_DPI..=MAX_PREVIEW_DPI`; callers taking
/// user input run it through [`clamp_preview_dpi`] first.
pub fn render_preview(pdf_bytes: &[u8], page: usize, dpi: u32) -> Result<PreviewImage> {
    if !(MIN_PREVIEW_DPI..=MAX_PREVIEW_DPI).contains(&dpi) {
        return Err(RecolorError::Preview(format!(
            "dpi {dpi} is outside {MIN_PREVIEW_DPI}..={MAX_PREVIEW_DPI}"
        )));
    }
    if !pdf_core::has_pdf_header(pdf_bytes) {
        return Err(RecolorError::Preview("input is not a valid PDF header".to_string()));
    }

    let pdf = Pdf::new(Arc::new(pdf_bytes.to_vec()))
        .map_err(|_| RecolorError::Preview("failed to parse PDF".to_string()))?;
    let page_count = pdf.pages().len();
    let page_ref = pdf.pages().get(page).ok_or_else(|| {
        RecolorError::Preview(format!(
            "page {page} is out of range (document has {page_count} pages)"
        ))
    })?;

    let scale = dpi as f32 / POINTS_PER_INCH;
    let render_settings = RenderSettings {
        x_scale: scale,
        y_scale: scale,
        bg_color: WHITE,
        ..Default::default()
    };
    let pixmap = render(page_ref, &InterpreterSettings::default(), &render_settings);

    let (width, height) = (pixmap.width() as u32, pixmap.height() as u32);
    let image = RgbaImage::from_raw(width, height, pixmap.data_as_u8_slice().to_vec())
        .ok_or_else(|| RecolorError::Preview("pixmap size mismatch".to_string()))?;

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| RecolorError::Preview(format!("PNG encoding failed: {e}")))?;

    debug!(page, dpi, width, height, bytes = png.len(), "rendered preview");
    Ok(PreviewImage { width, height, png })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dpi_clamped_to_supported_range() {
        assert_eq!(clamp_preview_dpi(0), MIN_PREVIEW_DPI);
        assert_eq!(clamp_preview_dpi(150), 150);
        assert_eq!(clamp_preview_dpi(100_000), MAX_PREVIEW_DPI);
    }

    #[test]
    fn test_out_of_range_dpi_is_rejected_before_rendering() {
        let err = render_preview(b"%PDF-1.7", 0, 100_000).unwrap_err();
        assert!(err.to_string().contains("100000"), "{err}");
    }
}
