//! Integration tests for the conversion engine

use color_schemes::SchemeRegistry;
use lopdf::{dictionary, Document, Object, Stream};
use pdf_core::{Color, PdfDocument};
use pretty_assertions::assert_eq;
use recolor::{
    default_output_path, render_preview, ConvertOptions, Converter, Mode, NoProgress,
    ProgressEvent, RecolorError,
};
use std::path::PathBuf;

/// Create a PDF with one Letter page per entry of `pages`, each drawing its content with /F1
fn create_test_pdf(pages: &[&[u8]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();
    for content in pages {
        let contents_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "Contents" => contents_id,
        });
        kids.push(Object::Reference(page_id));
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => pages.len() as i64,
            "Kids" => kids,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// One Letter page drawing `page`, with `form` registered as /Fm1
fn create_form_pdf(page: &[u8], form: &[u8]) -> Vec<u8> {
    let mut doc = Document::load_mem(&create_test_pdf(&[page])).unwrap();
    let font_id = doc
        .objects
        .iter()
        .find(|(_, o)| {
            matches!(
                o.as_dict().and_then(|d| d.get(b"Subtype")),
                Ok(Object::Name(n)) if n == b"Type1"
            )
        })
        .map(|(id, _)| *id)
        .unwrap();
    let form_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        },
        form.to_vec(),
    ));

    let page_id = *doc.get_pages().values().next().unwrap();
    let page_dict = doc.get_object_mut(page_id).and_then(Object::as_dict_mut).unwrap();
    page_dict.set(
        "Resources",
        dictionary! {
            "Font" => dictionary! { "F1" => font_id },
            "XObject" => dictionary! { "Fm1" => form_id },
        },
    );

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn converter(scheme: &str, mode: Mode) -> Converter {
    let scheme = SchemeRegistry::builtin().get(scheme).unwrap().clone();
    Converter::new(ConvertOptions::new(scheme).with_mode(mode))
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("recolor-{}-{}", std::process::id(), name))
}

const TWO_LINES: &[u8] = b"BT /F1 12 Tf 0 g 72 700 Td (First line) Tj 0 -14 Td (Second line) Tj ET";

// ============================================================================
// Remap
// ============================================================================

#[test]
fn test_remap_recolors_text_and_keeps_graphics() {
    let pdf = create_test_pdf(&[
        b"1 0 0 rg 100 100 50 50 re f BT /F1 12 Tf 0 g 72 700 Td (Hello) Tj ET",
    ]);
    let (bytes, report) = converter("Dark Mode", Mode::Remap)
        .convert_bytes(&pdf, &mut NoProgress)
        .unwrap();

    assert_eq!(report.pages, 1);
    assert_eq!(report.mode, Mode::Remap);
    assert_eq!(report.scheme, "Dark Mode");
    assert_eq!(report.text_objects, 1);
    assert_eq!(report.colors_replaced, 1);
    assert!(report.dropped_non_text.is_empty());

    let out = PdfDocument::open_from_bytes(&bytes).unwrap();
    let page = out.extract_spans(1).unwrap();
    assert_eq!(page.spans.len(), 1);
    assert_eq!(page.spans[0].color, Some(Color::white()));
    // The red square is still painted
    assert!(page.has_graphics);
}

#[test]
fn test_remap_replaces_white_page_fill_unless_disabled() {
    let pdf = create_test_pdf(&[b"1 g 0 0 612 792 re f BT /F1 12 Tf 72 700 Td (x) Tj ET"]);

    let (_, report) = converter("Sepia", Mode::Remap)
        .convert_bytes(&pdf, &mut NoProgress)
        .unwrap();
    assert_eq!(report.page_fills_replaced, 1);

    let scheme = SchemeRegistry::builtin().get("Sepia").unwrap().clone();
    let keep = Converter::new(ConvertOptions::new(scheme).with_replace_page_fills(false));
    let (_, report) = keep.convert_bytes(&pdf, &mut NoProgress).unwrap();
    assert_eq!(report.page_fills_replaced, 0);
}

#[test]
fn test_remap_preview_shows_background() {
    let pdf = create_test_pdf(&[TWO_LINES]);
    let (bytes, _) = converter("Dark Mode", Mode::Remap)
        .convert_bytes(&pdf, &mut NoProgress)
        .unwrap();

    let preview = render_preview(&bytes, 0, 72).unwrap();
    assert_eq!((preview.width, preview.height), (612, 792));

    let image = image::load_from_memory(&preview.png).unwrap().to_rgba8();
    let pixel = image.get_pixel(20, 20);
    for channel in &pixel.0[..3] {
        assert!((*channel as i32 - 0x2D).abs() <= 2, "pixel {:?}", pixel);
    }
}

#[test]
fn test_remap_form_keeps_inherited_fill() {
    let pdf = create_form_pdf(
        b"1 0 0 rg /Fm1 Do",
        b"BT /F1 10 Tf 50 50 Td (x) Tj ET 100 100 50 50 re f",
    );
    let (bytes, report) = converter("Dark Mode", Mode::Remap)
        .convert_bytes(&pdf, &mut NoProgress)
        .unwrap();
    assert_eq!(report.forms_rewritten, 1);

    let preview = render_preview(&bytes, 0, 72).unwrap();
    let image = image::load_from_memory(&preview.png).unwrap().to_rgba8();
    // Centre of the square drawn after the form's text
    let pixel = image.get_pixel(125, 667);
    assert!(pixel.0[0] > 200 && pixel.0[1] < 50 && pixel.0[2] < 50, "pixel {:?}", pixel);
}

// ============================================================================
// Rebuild
// ============================================================================

#[test]
fn test_rebuild_redraws_text_at_original_positions() {
    let pdf = create_test_pdf(&[TWO_LINES]);
    let (bytes, report) = converter("Green Tint", Mode::Rebuild)
        .convert_bytes(&pdf, &mut NoProgress)
        .unwrap();

    assert_eq!(report.spans, 2);
    assert_eq!(report.substituted_chars, 0);
    assert!(report.dropped_non_text.is_empty());

    let out = PdfDocument::open_from_bytes(&bytes).unwrap();
    let spans = out.extract_spans(1).unwrap().spans;
    let lines: Vec<(&str, f64)> = spans.iter().map(|s| (s.text.as_str(), s.y)).collect();
    assert_eq!(lines, vec![("First line", 700.0), ("Second line", 686.0)]);
    assert!(spans
        .iter()
        .all(|s| s.color.map(|c| c.to_hex()) == Some("#2D5A2D".to_string())));
}

#[test]
fn test_rebuild_flags_dropped_graphics() {
    let pdf = create_test_pdf(&[
        b"BT /F1 12 Tf 72 700 Td (Text only) Tj ET",
        b"0 0 1 RG 10 10 m 200 200 l S BT /F1 12 Tf 72 700 Td (With art) Tj ET",
    ]);
    let (bytes, report) = converter("Sepia", Mode::Rebuild)
        .convert_bytes(&pdf, &mut NoProgress)
        .unwrap();

    assert_eq!(report.pages, 2);
    assert_eq!(report.dropped_non_text, vec![2]);
    assert_eq!(PdfDocument::open_from_bytes(&bytes).unwrap().page_count(), 2);
}

#[test]
fn test_rebuild_keeps_rotation_and_crop_box() {
    let mut doc = Document::load_mem(&create_test_pdf(&[TWO_LINES])).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    let page = doc.get_object_mut(page_id).and_then(Object::as_dict_mut).unwrap();
    page.set("Rotate", Object::Integer(90));
    page.set("CropBox", vec![36.into(), 36.into(), 576.into(), 756.into()]);
    let mut pdf = Vec::new();
    doc.save_to(&mut pdf).unwrap();

    let (bytes, _) = converter("Sepia", Mode::Rebuild)
        .convert_bytes(&pdf, &mut NoProgress)
        .unwrap();
    let source = PdfDocument::open_from_bytes(&pdf).unwrap().page_geometry(1).unwrap();
    let rebuilt = PdfDocument::open_from_bytes(&bytes).unwrap().page_geometry(1).unwrap();

    assert_eq!(rebuilt, source);
    assert_eq!(rebuilt.rotate, 90);
    assert!(rebuilt.crop_box.is_some());
}

// ============================================================================
// Progress, files and errors
// ============================================================================

#[test]
fn test_progress_events_in_order() {
    let pdf = create_test_pdf(&[TWO_LINES, TWO_LINES]);
    let mut events = Vec::new();
    converter("High Contrast", Mode::Remap)
        .convert_bytes(&pdf, &mut |e: ProgressEvent| events.push(e))
        .unwrap();

    assert_eq!(
        events,
        vec![
            ProgressEvent::Started { pages: 2 },
            ProgressEvent::PageDone { page: 1, pages: 2 },
            ProgressEvent::PageDone { page: 2, pages: 2 },
            ProgressEvent::Saving,
            ProgressEvent::Finished,
        ]
    );
}

#[test]
fn test_convert_file_to_default_output() {
    let input = temp_path("report.pdf");
    std::fs::write(&input, create_test_pdf(&[TWO_LINES])).unwrap();
    let output = default_output_path(&input);

    let report = converter("Dark Mode", Mode::Remap)
        .convert(&input, &output, &mut NoProgress)
        .unwrap();
    assert_eq!(report.pages, 1);
    assert!(pdf_core::is_valid_pdf(&output));

    std::fs::remove_file(&input).ok();
    std::fs::remove_file(&output).ok();
}

#[test]
fn test_missing_input_is_reported() {
    let err = converter("Dark Mode", Mode::Remap)
        .convert(temp_path("absent.pdf"), temp_path("absent_out.pdf"), &mut NoProgress)
        .unwrap_err();
    assert!(err.to_string().starts_with("File not found:"));
}

#[test]
fn test_non_pdf_input_is_reported() {
    let err = converter("Dark Mode", Mode::Remap)
        .convert_bytes(b"<html></html>", &mut NoProgress)
        .unwrap_err();
    assert!(matches!(
        err,
        RecolorError::Pdf(pdf_core::PdfError::InvalidPdf(_))
    ));
}

#[test]
fn test_empty_document_is_rejected() {
    let pdf = create_test_pdf(&[]);
    let err = converter("Dark Mode", Mode::Rebuild)
        .convert_bytes(&pdf, &mut NoProgress)
        .unwrap_err();
    assert!(matches!(err, RecolorError::EmptyDocument));
}

#[test]
fn test_preview_errors() {
    let pdf = create_test_pdf(&[TWO_LINES]);
    assert!(matches!(render_preview(&pdf, 3, 150), Err(RecolorError::Preview(_))));
    assert!(matches!(render_preview(&pdf, 0, 0), Err(RecolorError::Preview(_))));
    assert!(matches!(render_preview(b"nope", 0, 150), Err(RecolorError::Preview(_))));
    assert!(matches!(render_preview(&pdf, 0, 4000), Err(RecolorError::Preview(_))));
}

#[test]
fn test_preview_accepts_leading_bytes_before_header() {
    let mut pdf = b"\xEF\xBB\xBF".to_vec();
    pdf.extend(create_test_pdf(&[TWO_LINES]));
    assert!(pdf_core::has_pdf_header(&pdf));

    let preview = render_preview(&pdf, 0, 72).unwrap();
    assert_eq!((preview.width, preview.height), (612, 792));
}
