//! PDF Document wrapper

use crate::color::Color;
use crate::font::{encode_win_ansi, output_font_dict, resolve, OUTPUT_FONT_RESOURCE};
use crate::remap::{remap_operations, RemapColors, RemapStats, StreamKind};
use crate::text::{generate_text_operators, stream_bytes, PageText, SpanExtractor, TextRenderContext, TextSpan};
use crate::{PdfError, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{HashMap, HashSet};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;
use tracing::{debug, warn};

/// The header every PDF starts with, possibly after some junk bytes
const PDF_HEADER: &[u8] = b"%PDF-";

/// How far into the file the header may appear
const HEADER_SEARCH_WINDOW: usize = 1024;

/// A4 in points, used when a page has no usable MediaBox
const A4: PageBox = PageBox {
    x0: 0.0,
    y0: 0.0,
    x1: 595.28,
    y1: 841.89,
};

/// Page rectangle in default user space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl PageBox {
    pub fn width(&self) -> f64 {
        (self.x1 - self.x0).abs()
    }

    pub fn height(&self) -> f64 {
        (self.y1 - self.y0).abs()
    }

    fn to_object(self) -> Object {
        Object::Array(vec![
            Object::Real(self.x0 as f32),
            Object::Real(self.y0 as f32),
            Object::Real(self.x1 as f32),
            Object::Real(self.y1 as f32),
        ])
    }
}

/// Page boxes and rotation, as carried over to a redrawn page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub media_box: PageBox,
    pub crop_box: Option<PageBox>,
    /// Clockwise display rotation in degrees: 0, 90, 180 or 270
    pub rotate: i64,
}

impl From<PageBox> for PageGeometry {
    fn from(media_box: PageBox) -> Self {
        Self {
            media_box,
            crop_box: None,
            rotate: 0,
        }
    }
}

/// PDF Document wrapper providing high-level operations
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Operators drawn beneath existing page content (page number -> operators)
    page_prefix_buffer: HashMap<usize, Vec<u8>>,
    /// Operators drawn above existing page content (page number -> operators)
    page_content_buffer: HashMap<usize, Vec<u8>>,
    /// Shared output font object, created on first text insertion
    output_font: Option<ObjectId>,
    /// Pages whose resources already reference the output font
    pages_with_output_font: HashSet<usize>,
    /// Form XObjects already remapped (shared between pages)
    remapped_forms: HashSet<ObjectId>,
    /// Flate-compress streams written by this wrapper
    compress: bool,
}

impl PdfDocument {
    fn wrap(inner: Document) -> Self {
        Self {
            inner,
            page_prefix_buffer: HashMap::new(),
            page_content_buffer: HashMap::new(),
            output_font: None,
            pages_with_output_font: HashSet::new(),
            remapped_forms: HashSet::new(),
            compress: true,
        }
    }

    /// Open a PDF document from a file path
    ///
    /// # Arguments
    /// * `path` - Path to the PDF file
    ///
    /// # Example
    /// ```ignore
    /// let doc = PdfDocument::open("input.pdf")?;
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| read_error(path, e))?;
        Self::open_from_bytes(&data)
    }

    /// Open a PDF document from bytes
    ///
    /// # Arguments
    /// * `data` - PDF file bytes
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        if !has_pdf_header(data) {
            return Err(PdfError::InvalidPdf("missing %PDF- header".to_string()));
        }
        let inner = Document::load_mem(data).map_err(|e| PdfError::InvalidPdf(e.to_string()))?;
        Ok(Self::wrap(inner))
    }

    /// Create an empty document with a catalog and an empty page tree
    pub fn new_blank() -> Self {
        let mut inner = Document::with_version("1.5");

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Kids", Object::Array(vec![]));
        pages.set("Count", Object::Integer(0));
        let pages_id = inner.add_object(pages);

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = inner.add_object(catalog);

        inner.trailer.set("Root", Object::Reference(catalog_id));

        Self::wrap(inner)
    }

    /// Choose whether streams written by this wrapper are Flate-compressed
    pub fn set_compression(&mut self, compress: bool) {
        self.compress = compress;
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Get all page object IDs in order
    pub fn page_ids(&self) -> Vec<ObjectId> {
        self.inner.get_pages().values().copied().collect()
    }

    /// Object ID of a page (1-indexed)
    fn page_id(&self, page: usize) -> Result<ObjectId> {
        let pages = self.inner.get_pages();
        pages
            .get(&(page as u32))
            .copied()
            .ok_or(PdfError::InvalidPage(page, pages.len()))
    }

    fn page_dict(&self, page_id: ObjectId) -> Result<&Dictionary> {
        self.inner
            .get_object(page_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))
    }

    /// Look up a page attribute, following the Parent chain for inheritable keys
    fn inherited_attribute(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current_id = page_id;

        // Follow parent chain up to 32 levels (safety limit)
        for _ in 0..32 {
            let dict = self.inner.get_object(current_id).ok()?.as_dict().ok()?;
            if let Ok(value) = dict.get(key) {
                return Some(resolve(&self.inner, value));
            }
            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => current_id = *parent_id,
                _ => return None,
            }
        }

        None
    }

    /// Page rectangle (MediaBox, else CropBox, else A4)
    pub fn page_box(&self, page: usize) -> Result<PageBox> {
        let page_id = self.page_id(page)?;
        let media_box = self
            .inherited_attribute(page_id, b"MediaBox")
            .or_else(|| self.inherited_attribute(page_id, b"CropBox"));

        let Some(Object::Array(values)) = media_box else {
            return Ok(A4);
        };
        self.parse_box(values)
            .ok_or_else(|| PdfError::ParseError("Invalid MediaBox format".to_string()))
    }

    /// MediaBox, explicit CropBox and Rotate of a page, following inheritance
    pub fn page_geometry(&self, page: usize) -> Result<PageGeometry> {
        let media_box = self.page_box(page)?;
        let page_id = self.page_id(page)?;

        let crop_box = match self.inherited_attribute(page_id, b"CropBox") {
            Some(Object::Array(values)) => self.parse_box(values),
            _ => None,
        };
        let rotate = match self.inherited_attribute(page_id, b"Rotate") {
            Some(Object::Integer(degrees)) => normalize_rotation(*degrees),
            Some(Object::Real(degrees)) => normalize_rotation(degrees.round() as i64),
            _ => 0,
        };

        Ok(PageGeometry {
            media_box,
            crop_box,
            rotate,
        })
    }

    fn parse_box(&self, values: &[Object]) -> Option<PageBox> {
        let numbers: Vec<f64> = values
            .iter()
            .filter_map(|v| match resolve(&self.inner, v) {
                Object::Integer(i) => Some(*i as f64),
                Object::Real(r) => Some(*r as f64),
                _ => None,
            })
            .collect();
        if numbers.len() < 4 {
            return None;
        }

        Some(PageBox {
            x0: numbers[0].min(numbers[2]),
            y0: numbers[1].min(numbers[3]),
            x1: numbers[0].max(numbers[2]),
            y1: numbers[1].max(numbers[3]),
        })
    }

    fn page_resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        self.inherited_attribute(page_id, b"Resources")
            .and_then(|o| o.as_dict().ok())
    }

    /// Append a page with the given rectangle and return its page number
    pub fn add_page(&mut self, page_box: PageBox) -> Result<usize> {
        self.add_page_with_geometry(&PageGeometry::from(page_box))
    }

    /// Append a page with the given boxes and rotation
    pub fn add_page_with_geometry(&mut self, geometry: &PageGeometry) -> Result<usize> {
        let contents_id = self.inner.add_object(Stream::new(Dictionary::new(), vec![]));
        let pages_id = self.pages_root_id()?;

        let mut page_dict = Dictionary::new();
        page_dict.set("Type", Object::Name(b"Page".to_vec()));
        page_dict.set("Parent", Object::Reference(pages_id));
        page_dict.set("MediaBox", geometry.media_box.to_object());
        if let Some(crop_box) = geometry.crop_box {
            page_dict.set("CropBox", crop_box.to_object());
        }
        if geometry.rotate != 0 {
            page_dict.set("Rotate", Object::Integer(geometry.rotate));
        }
        page_dict.set("Resources", Object::Dictionary(Dictionary::new()));
        page_dict.set("Contents", Object::Reference(contents_id));
        let new_page_id = self.inner.add_object(page_dict);

        let pages_dict = self
            .inner
            .get_object(pages_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Pages object is not a dictionary".to_string()))?;
        let mut kids = match pages_dict.get(b"Kids") {
            Ok(Object::Array(kids)) => kids.clone(),
            _ => Vec::new(),
        };
        kids.push(Object::Reference(new_page_id));
        let count = pages_dict
            .get(b"Count")
            .ok()
            .and_then(|c| c.as_i64().ok())
            .unwrap_or(0);

        let mut new_pages_dict = pages_dict.clone();
        new_pages_dict.set("Kids", Object::Array(kids));
        new_pages_dict.set("Count", Object::Integer(count + 1));
        self.inner.objects.insert(pages_id, new_pages_dict.into());

        Ok(self.page_count())
    }

    fn pages_root_id(&self) -> Result<ObjectId> {
        let catalog_id = self
            .inner
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .map_err(|_| PdfError::ParseError("Document trailer missing Root entry".to_string()))?;
        self.inner
            .get_object(catalog_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Catalog is not a dictionary".to_string()))?
            .get(b"Pages")
            .and_then(Object::as_reference)
            .map_err(|_| PdfError::ParseError("Catalog missing Pages entry".to_string()))
    }

    /// Decoded content of a page; arrays of streams are concatenated
    pub fn page_content(&self, page: usize) -> Result<Vec<u8>> {
        let page_id = self.page_id(page)?;
        let page_dict = self.page_dict(page_id)?;

        let content = match page_dict.get(b"Contents") {
            Ok(Object::Stream(stream)) => stream_bytes(stream),
            Ok(Object::Reference(ref_id)) => match self.inner.get_object(*ref_id) {
                Ok(Object::Stream(stream)) => stream_bytes(stream),
                Ok(Object::Array(arr)) => self.concat_streams(arr),
                _ => Vec::new(),
            },
            Ok(Object::Array(arr)) => self.concat_streams(arr),
            _ => Vec::new(),
        };

        Ok(content)
    }

    fn concat_streams(&self, parts: &[Object]) -> Vec<u8> {
        let mut combined = Vec::new();
        for part in parts {
            if let Object::Stream(stream) = resolve(&self.inner, part) {
                combined.extend_from_slice(&stream_bytes(stream));
                // Streams may split anywhere between tokens
                combined.push(b'\n');
            }
        }
        combined
    }

    /// Replace a page's content with a single new stream
    pub fn set_page_content(&mut self, page: usize, content: Vec<u8>) -> Result<()> {
        let page_id = self.page_id(page)?;
        let stream = self.build_stream(Dictionary::new(), content);
        let stream_id = self.inner.add_object(stream);

        let mut page_dict = self.page_dict(page_id)?.clone();
        page_dict.set("Contents", Object::Reference(stream_id));
        self.inner.objects.insert(page_id, page_dict.into());

        Ok(())
    }

    /// Build a stream, Flate-compressed when compression is enabled
    fn build_stream(&self, mut dict: Dictionary, content: Vec<u8>) -> Stream {
        dict.remove(b"Filter");
        dict.remove(b"DecodeParms");
        if !self.compress {
            return Stream::new(dict, content);
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        match encoder.write_all(&content).and_then(|_| encoder.finish()) {
            Ok(compressed) => {
                dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
                Stream::new(dict, compressed)
            }
            Err(e) => {
                warn!(error = %e, "stream compression failed; writing uncompressed");
                Stream::new(dict, content)
            }
        }
    }

    /// Paint the whole page in `color` beneath its existing content
    pub fn fill_page_background(&mut self, page: usize, color: Color) -> Result<()> {
        let page_box = self.page_box(page)?;
        let operators = format!(
            "q\n{} {} {} rg\n{} {} {} {} re\nf\nQ\n",
            color.r,
            color.g,
            color.b,
            page_box.x0,
            page_box.y0,
            page_box.width(),
            page_box.height()
        );
        self.page_prefix_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(operators.as_bytes());
        Ok(())
    }

    /// Draw one text span in the output font at its recorded origin and size
    ///
    /// Returns the number of characters the output font could not encode
    /// (transliterated or replaced with `?`).
    pub fn insert_span(&mut self, page: usize, span: &TextSpan, color: Color) -> Result<usize> {
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            return Err(PdfError::InvalidPage(page, page_count));
        }
        if span.text.trim().is_empty() {
            return Ok(0);
        }

        self.ensure_output_font(page)?;

        let (encoded, substituted) = encode_win_ansi(&span.text);
        let ctx = TextRenderContext {
            font_name: OUTPUT_FONT_RESOURCE.to_string(),
            font_size: span.font_size,
            color,
        };
        let operators = generate_text_operators(&encoded, span.x, span.y, &ctx);
        self.buffer_content(page, &operators);

        Ok(substituted)
    }

    /// Add the output font to a page's resources
    fn ensure_output_font(&mut self, page: usize) -> Result<()> {
        if self.pages_with_output_font.contains(&page) {
            return Ok(());
        }

        let font_id = match self.output_font {
            Some(id) => id,
            None => {
                let id = self.inner.add_object(output_font_dict());
                self.output_font = Some(id);
                id
            }
        };

        let page_id = self.page_id(page)?;
        let mut resources = self.page_resources(page_id).cloned().unwrap_or_default();
        let mut fonts = resources
            .get(b"Font")
            .ok()
            .map(|o| resolve(&self.inner, o))
            .and_then(|o| o.as_dict().ok())
            .cloned()
            .unwrap_or_default();
        fonts.set(OUTPUT_FONT_RESOURCE, Object::Reference(font_id));
        resources.set("Font", Object::Dictionary(fonts));

        let mut page_dict = self.page_dict(page_id)?.clone();
        page_dict.set("Resources", Object::Dictionary(resources));
        self.inner.objects.insert(page_id, page_dict.into());

        self.pages_with_output_font.insert(page);
        Ok(())
    }

    /// Extract the text spans of a page, including text inside forms
    pub fn extract_spans(&self, page: usize) -> Result<PageText> {
        let page_id = self.page_id(page)?;
        let content = self.page_content(page)?;
        let resources = self.page_resources(page_id);
        SpanExtractor::new(&self.inner).extract(&content, resources)
    }

    /// Force all text on a page to `colors.text`, leaving other content as is
    ///
    /// Form XObjects drawn by the page are rewritten too, once per document.
    /// A page whose content cannot be decoded is left untouched and counted
    /// in [`RemapStats::pages_skipped`].
    pub fn remap_page_colors(&mut self, page: usize, colors: &RemapColors) -> Result<RemapStats> {
        let page_box = self.page_box(page)?;
        let page_id = self.page_id(page)?;
        let raw = self.page_content(page)?;

        let content = match Content::decode(&raw) {
            Ok(content) => content,
            Err(e) => {
                warn!(page, error = %e, "page content could not be decoded; left unchanged");
                return Ok(RemapStats {
                    pages_skipped: 1,
                    ..RemapStats::default()
                });
            }
        };

        let (operations, mut stats) =
            remap_operations(content.operations, colors, StreamKind::Page(page_box));
        let encoded = Content { operations }
            .encode()
            .map_err(|e| PdfError::ParseError(format!("content re-encoding: {e}")))?;
        self.set_page_content(page, encoded)?;

        let forms = self.collect_forms(self.page_resources(page_id));
        for form_id in forms {
            if self.remap_form(form_id, colors)? {
                stats.forms_rewritten += 1;
            }
        }

        debug!(page, ?stats, "remapped page colors");
        Ok(stats)
    }

    /// Form XObjects reachable from a resource dictionary, not yet remapped
    fn collect_forms(&self, resources: Option<&Dictionary>) -> Vec<ObjectId> {
        let mut found = Vec::new();
        let mut queue: Vec<&Dictionary> = resources.into_iter().collect();
        let mut seen = HashSet::new();

        while let Some(res) = queue.pop() {
            let Some(xobjects) = res
                .get(b"XObject")
                .ok()
                .map(|o| resolve(&self.inner, o))
                .and_then(|o| o.as_dict().ok())
            else {
                continue;
            };

            for (_, entry) in xobjects.iter() {
                let Object::Reference(id) = entry else {
                    continue;
                };
                if self.remapped_forms.contains(id) || !seen.insert(*id) {
                    continue;
                }
                let Ok(Object::Stream(stream)) = self.inner.get_object(*id) else {
                    continue;
                };
                if !matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Form") {
                    continue;
                }
                found.push(*id);
                if let Some(inner) = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .map(|o| resolve(&self.inner, o))
                    .and_then(|o| o.as_dict().ok())
                {
                    queue.push(inner);
                }
            }
        }

        found
    }

    fn remap_form(&mut self, form_id: ObjectId, colors: &RemapColors) -> Result<bool> {
        if !self.remapped_forms.insert(form_id) {
            return Ok(false);
        }

        let (dict, raw) = match self.inner.get_object(form_id) {
            Ok(Object::Stream(stream)) => (stream.dict.clone(), stream_bytes(stream)),
            _ => return Ok(false),
        };
        let content = match Content::decode(&raw) {
            Ok(content) => content,
            Err(e) => {
                warn!(?form_id, error = %e, "form content could not be decoded; left unchanged");
                return Ok(false);
            }
        };

        let (operations, _) = remap_operations(content.operations, colors, StreamKind::Form);
        let encoded = Content { operations }
            .encode()
            .map_err(|e| PdfError::ParseError(format!("form re-encoding: {e}")))?;
        let stream = self.build_stream(dict, encoded);
        self.inner.objects.insert(form_id, Object::Stream(stream));

        Ok(true)
    }

    /// Buffer content operators drawn above a page's content (written at save time)
    fn buffer_content(&mut self, page: usize, content: &[u8]) {
        self.page_content_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(content);
    }

    /// Flush all buffered content to page streams
    ///
    /// Called once during save/to_bytes. Each page touched gets a single new
    /// stream: prefix, then the original content isolated in `q`/`Q`, then
    /// appended operators.
    fn flush_content_buffers(&mut self) -> Result<()> {
        let mut prefixes = std::mem::take(&mut self.page_prefix_buffer);
        let mut appended = std::mem::take(&mut self.page_content_buffer);

        let mut pages: Vec<usize> = prefixes.keys().chain(appended.keys()).copied().collect();
        pages.sort_unstable();
        pages.dedup();

        for page in pages {
            let prefix = prefixes.remove(&page).unwrap_or_default();
            let suffix = appended.remove(&page).unwrap_or_default();
            let existing = self.page_content(page)?;

            let mut content = prefix;
            if suffix.is_empty() {
                content.extend_from_slice(&existing);
            } else {
                content.extend_from_slice(b"q\n");
                content.extend_from_slice(&existing);
                content.extend_from_slice(b"\nQ\n");
                content.extend_from_slice(&suffix);
            }
            self.set_page_content(page, content)?;
        }

        Ok(())
    }

    /// Save the document to a file
    ///
    /// # Arguments
    /// * `path` - Output file path
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.flush_content_buffers()?;

        let file = std::fs::File::create(path).map_err(|e| write_error(path, e))?;
        let mut writer = BufWriter::new(file);
        self.inner
            .save_to(&mut writer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        writer.flush()?;
        Ok(())
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush_content_buffers()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        Ok(buffer)
    }

    /// Get reference to the underlying lopdf Document
    pub fn inner(&self) -> &Document {
        &self.inner
    }
}

/// Rotate must be a multiple of 90; anything else is ignored
fn normalize_rotation(degrees: i64) -> i64 {
    let degrees = degrees.rem_euclid(360);
    if degrees % 90 == 0 {
        degrees
    } else {
        0
    }
}

fn read_error(path: &Path, e: std::io::Error) -> PdfError {
    match e.kind() {
        ErrorKind::NotFound => PdfError::NotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => PdfError::ReadPermissionDenied(path.to_path_buf()),
        _ => PdfError::IoError(e),
    }
}

fn write_error(path: &Path, e: std::io::Error) -> PdfError {
    match e.kind() {
        ErrorKind::PermissionDenied => PdfError::PermissionDenied(path.to_path_buf()),
        ErrorKind::NotFound => PdfError::NotFound(path.to_path_buf()),
        _ => PdfError::IoError(e),
    }
}

/// Whether `%PDF-` appears within the first kilobyte
///
/// Leading junk such as a byte order mark is tolerated, as most readers do.
pub fn has_pdf_header(data: &[u8]) -> bool {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(PDF_HEADER.len()).any(|w| w == PDF_HEADER)
}

/// Check whether a file can be opened as a PDF
pub fn is_valid_pdf<P: AsRef<Path>>(path: P) -> bool {
    PdfDocument::open(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_detection() {
        assert!(has_pdf_header(b"%PDF-1.7\n..."));
        assert!(has_pdf_header(b"\xEF\xBB\xBF%PDF-1.4"));
        assert!(!has_pdf_header(b"PK\x03\x04 zip file"));
        assert!(!has_pdf_header(b""));
    }

    #[test]
    fn test_io_errors_keep_their_direction() {
        let path = Path::new("/data/book.pdf");
        let denied = || std::io::Error::from(ErrorKind::PermissionDenied);

        assert!(matches!(
            read_error(path, denied()),
            PdfError::ReadPermissionDenied(p) if p == path
        ));
        assert!(matches!(
            write_error(path, denied()),
            PdfError::PermissionDenied(p) if p == path
        ));
        assert!(matches!(
            read_error(path, std::io::Error::from(ErrorKind::NotFound)),
            PdfError::NotFound(_)
        ));
        assert!(matches!(
            write_error(path, std::io::Error::from(ErrorKind::Interrupted)),
            PdfError::IoError(_)
        ));
    }

    #[test]
    fn test_non_pdf_bytes_are_rejected() {
        let err = PdfDocument::open_from_bytes(b"hello world").err().unwrap();
        assert!(matches!(err, PdfError::InvalidPdf(_)));
    }

    #[test]
    fn test_blank_document_pages() {
        let mut doc = PdfDocument::new_blank();
        assert_eq!(doc.page_count(), 0);

        let letter = PageBox {
            x0: 0.0,
            y0: 0.0,
            x1: 612.0,
            y1: 792.0,
        };
        assert_eq!(doc.add_page(letter).unwrap(), 1);
        assert_eq!(doc.add_page(A4).unwrap(), 2);
        assert_eq!(doc.page_box(1).unwrap(), letter);
        assert!((doc.page_box(2).unwrap().height() - 841.89).abs() < 0.01);
        assert!(matches!(doc.page_box(3), Err(PdfError::InvalidPage(3, 2))));
    }

    #[test]
    fn test_geometry_is_written_to_new_pages() {
        let mut doc = PdfDocument::new_blank();
        let geometry = PageGeometry {
            media_box: A4,
            crop_box: Some(PageBox {
                x0: 20.0,
                y0: 20.0,
                x1: 500.0,
                y1: 800.0,
            }),
            rotate: 270,
        };
        let page = doc.add_page_with_geometry(&geometry).unwrap();
        let read_back = doc.page_geometry(page).unwrap();

        assert_eq!(read_back.rotate, 270);
        assert_eq!(read_back.crop_box, geometry.crop_box);
        assert!((read_back.media_box.width() - A4.width()).abs() < 0.01);

        let plain = doc.add_page(A4).unwrap();
        assert_eq!(doc.page_geometry(plain).unwrap().crop_box, None);
        assert_eq!(doc.page_geometry(plain).unwrap().rotate, 0);
    }

    #[test]
    fn test_rotation_normalized() {
        assert_eq!(normalize_rotation(-90), 270);
        assert_eq!(normalize_rotation(450), 90);
        assert_eq!(normalize_rotation(45), 0);
    }

    #[test]
    fn test_page_box_width_height() {
        let shifted = PageBox {
            x0: 10.0,
            y0: 20.0,
            x1: 110.0,
            y1: 220.0,
        };
        assert_eq!(shifted.width(), 100.0);
        assert_eq!(shifted.height(), 200.0);
    }
}
