//! Text span extraction and text operator generation

use crate::color::Color;
use crate::font::{name_of, number, resolve, FontInfo};
use crate::{PdfError, Result};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, trace};

/// Forms nested deeper than this are not entered
const MAX_FORM_DEPTH: usize = 12;

/// `TJ` adjustments beyond this many thousandths of an em read as a space
const TJ_SPACE_THRESHOLD: f32 = 250.0;

/// One contiguous run of text shown by a single text operator
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// Decoded text
    pub text: String,
    /// Baseline origin X in PDF user space
    pub x: f64,
    /// Baseline origin Y in PDF user space (from bottom)
    pub y: f64,
    /// Effective font size in points
    pub font_size: f32,
    /// Fill color in effect, when it is a device color
    pub color: Option<Color>,
}

/// Text content of one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageText {
    pub spans: Vec<TextSpan>,
    /// The page paints images, shadings or paths that a text-only copy loses
    pub has_graphics: bool,
}

/// Affine transformation `[a b c d e f]` in PDF row-vector convention
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    /// Parse six numeric operands
    pub fn from_operands(operands: &[Object]) -> Option<Self> {
        if operands.len() < 6 {
            return None;
        }
        let v: Vec<f64> = operands[..6]
            .iter()
            .map(|o| number(o).map(f64::from))
            .collect::<Option<_>>()?;
        Some(Self {
            a: v[0],
            b: v[1],
            c: v[2],
            d: v[3],
            e: v[4],
            f: v[5],
        })
    }

    /// `self × other`: apply `self` first, then `other`
    pub fn multiply(&self, o: &Matrix) -> Matrix {
        Matrix {
            a: self.a * o.a + self.b * o.c,
            b: self.a * o.b + self.b * o.d,
            c: self.c * o.a + self.d * o.c,
            d: self.c * o.b + self.d * o.d,
            e: self.e * o.a + self.f * o.c + o.e,
            f: self.e * o.b + self.f * o.d + o.f,
        }
    }

    /// Length of the transformed unit Y vector
    pub fn vertical_scale(&self) -> f64 {
        self.c.hypot(self.d)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FillSpace {
    Gray,
    Rgb,
    Cmyk,
    Other,
}

#[derive(Clone)]
struct GraphicsState {
    ctm: Matrix,
    fill: Option<Color>,
    fill_space: FillSpace,
    font: Option<Rc<FontInfo>>,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horiz_scale: f32,
    leading: f32,
    rise: f32,
}

impl GraphicsState {
    fn new(ctm: Matrix) -> Self {
        Self {
            ctm,
            fill: Some(Color::black()),
            fill_space: FillSpace::Gray,
            font: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horiz_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

/// Text accumulated for the span of one text-showing operator
#[derive(Default)]
struct SpanBuilder {
    text: String,
    origin: Option<(f64, f64, f32)>,
}

/// Content stream interpreter that collects text spans
pub(crate) struct SpanExtractor<'a> {
    doc: &'a Document,
    font_cache: HashMap<ObjectId, Rc<FontInfo>>,
    form_stack: Vec<ObjectId>,
    page: PageText,
}

impl<'a> SpanExtractor<'a> {
    pub(crate) fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            font_cache: HashMap::new(),
            form_stack: Vec::new(),
            page: PageText::default(),
        }
    }

    /// Interpret a page's content and return its spans
    pub(crate) fn extract(
        mut self,
        content: &[u8],
        resources: Option<&'a Dictionary>,
    ) -> Result<PageText> {
        let content = Content::decode(content)
            .map_err(|e| PdfError::ParseError(format!("content stream: {e}")))?;
        self.run(&content.operations, resources, GraphicsState::new(Matrix::IDENTITY));
        debug!(
            spans = self.page.spans.len(),
            has_graphics = self.page.has_graphics,
            "extracted page text"
        );
        Ok(self.page)
    }

    fn run(&mut self, ops: &[Operation], resources: Option<&'a Dictionary>, initial: GraphicsState) {
        let mut gs = initial;
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut tm = Matrix::IDENTITY;
        let mut tlm = Matrix::IDENTITY;

        for op in ops {
            let operands = &op.operands;
            let num = |i: usize| operands.get(i).and_then(number);

            match op.operator.as_str() {
                "q" => stack.push(gs.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        gs = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        gs.ctm = m.multiply(&gs.ctm);
                    }
                }
                "BT" => {
                    tm = Matrix::IDENTITY;
                    tlm = Matrix::IDENTITY;
                }
                "Tf" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        gs.font = self.load_font(resources, name);
                    }
                    if let Some(size) = num(1) {
                        gs.font_size = size;
                    }
                }
                "Tc" => gs.char_spacing = num(0).unwrap_or(0.0),
                "Tw" => gs.word_spacing = num(0).unwrap_or(0.0),
                "Tz" => gs.horiz_scale = num(0).unwrap_or(100.0) / 100.0,
                "TL" => gs.leading = num(0).unwrap_or(0.0),
                "Ts" => gs.rise = num(0).unwrap_or(0.0),
                "Td" | "TD" => {
                    if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                        if op.operator == "TD" {
                            gs.leading = -ty;
                        }
                        tlm = Matrix::translate(tx as f64, ty as f64).multiply(&tlm);
                        tm = tlm;
                    }
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        tm = m;
                        tlm = m;
                    }
                }
                "T*" => {
                    tlm = Matrix::translate(0.0, -gs.leading as f64).multiply(&tlm);
                    tm = tlm;
                }
                "Tj" | "'" | "\"" => {
                    if op.operator == "\"" {
                        gs.word_spacing = num(0).unwrap_or(gs.word_spacing);
                        gs.char_spacing = num(1).unwrap_or(gs.char_spacing);
                    }
                    if op.operator != "Tj" {
                        tlm = Matrix::translate(0.0, -gs.leading as f64).multiply(&tlm);
                        tm = tlm;
                    }
                    let mut span = SpanBuilder::default();
                    if let Some(Object::String(bytes, _)) = operands.last() {
                        self.show(bytes, &gs, &mut tm, &mut span);
                    }
                    self.finish_span(span, &gs);
                }
                "TJ" => {
                    let mut span = SpanBuilder::default();
                    if let Some(Object::Array(items)) = operands.first() {
                        for item in items {
                            match item {
                                Object::String(bytes, _) => {
                                    self.show(bytes, &gs, &mut tm, &mut span)
                                }
                                other => {
                                    let Some(adjust) = number(other) else {
                                        continue;
                                    };
                                    let tx = -adjust / 1000.0 * gs.font_size * gs.horiz_scale;
                                    tm = Matrix::translate(tx as f64, 0.0).multiply(&tm);
                                    if -adjust > TJ_SPACE_THRESHOLD
                                        && !span.text.is_empty()
                                        && !span.text.ends_with(' ')
                                    {
                                        span.text.push(' ');
                                    }
                                }
                            }
                        }
                    }
                    self.finish_span(span, &gs);
                }
                "g" => {
                    gs.fill_space = FillSpace::Gray;
                    gs.fill = num(0).map(Color::gray);
                }
                "rg" => {
                    gs.fill_space = FillSpace::Rgb;
                    gs.fill = match (num(0), num(1), num(2)) {
                        (Some(r), Some(g), Some(b)) => Some(Color::rgb(r, g, b)),
                        _ => None,
                    };
                }
                "k" => {
                    gs.fill_space = FillSpace::Cmyk;
                    gs.fill = match (num(0), num(1), num(2), num(3)) {
                        (Some(c), Some(m), Some(y), Some(k)) => Some(Color::from_cmyk(c, m, y, k)),
                        _ => None,
                    };
                }
                "cs" => {
                    gs.fill_space = match operands.first() {
                        Some(Object::Name(n)) if n == b"DeviceGray" => FillSpace::Gray,
                        Some(Object::Name(n)) if n == b"DeviceRGB" => FillSpace::Rgb,
                        Some(Object::Name(n)) if n == b"DeviceCMYK" => FillSpace::Cmyk,
                        _ => FillSpace::Other,
                    };
                    gs.fill = match gs.fill_space {
                        FillSpace::Other => None,
                        _ => Some(Color::black()),
                    };
                }
                "sc" | "scn" => {
                    let components: Vec<f32> = operands.iter().filter_map(number).collect();
                    gs.fill = match gs.fill_space {
                        FillSpace::Other => None,
                        _ => Color::from_components(&components),
                    };
                }
                "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" | "sh" | "BI" => {
                    self.page.has_graphics = true;
                }
                "Do" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        self.draw_xobject(resources, name, &gs);
                    }
                }
                _ => {}
            }
        }
    }

    /// Advance through a shown string, appending its text to the span
    fn show(&self, bytes: &[u8], gs: &GraphicsState, tm: &mut Matrix, span: &mut SpanBuilder) {
        let Some(font) = gs.font.as_ref() else {
            trace!("text shown without a font; skipped");
            return;
        };

        for glyph in font.decode(bytes) {
            if span.origin.is_none() && !glyph.text.trim().is_empty() {
                let text_space = Matrix {
                    a: (gs.font_size * gs.horiz_scale) as f64,
                    b: 0.0,
                    c: 0.0,
                    d: gs.font_size as f64,
                    e: 0.0,
                    f: gs.rise as f64,
                };
                let trm = text_space.multiply(tm).multiply(&gs.ctm);
                let size = gs.font_size as f64 * tm.multiply(&gs.ctm).vertical_scale();
                span.origin = Some((trm.e, trm.f, size as f32));
            }
            span.text.push_str(&glyph.text);

            let mut advance = glyph.width / 1000.0 * gs.font_size + gs.char_spacing;
            if glyph.is_space {
                advance += gs.word_spacing;
            }
            *tm = Matrix::translate((advance * gs.horiz_scale) as f64, 0.0).multiply(tm);
        }
    }

    fn finish_span(&mut self, span: SpanBuilder, gs: &GraphicsState) {
        let Some((x, y, font_size)) = span.origin else {
            return;
        };
        if span.text.trim().is_empty() {
            return;
        }
        self.page.spans.push(TextSpan {
            text: span.text,
            x,
            y,
            font_size,
            color: gs.fill,
        });
    }

    fn load_font(&mut self, resources: Option<&'a Dictionary>, name: &[u8]) -> Option<Rc<FontInfo>> {
        let doc = self.doc;
        let fonts = resources?
            .get(b"Font")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok())?;
        let entry = fonts.get(name).ok()?;

        if let Object::Reference(id) = entry {
            if let Some(info) = self.font_cache.get(id) {
                return Some(Rc::clone(info));
            }
            let dict = doc.get_object(*id).ok()?.as_dict().ok()?;
            let info = Rc::new(FontInfo::from_dict(doc, dict));
            self.font_cache.insert(*id, Rc::clone(&info));
            return Some(info);
        }

        entry
            .as_dict()
            .ok()
            .map(|dict| Rc::new(FontInfo::from_dict(doc, dict)))
    }

    fn draw_xobject(&mut self, resources: Option<&'a Dictionary>, name: &[u8], gs: &GraphicsState) {
        let doc = self.doc;
        let Some(Object::Reference(id)) = resources
            .and_then(|r| r.get(b"XObject").ok())
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok())
            .and_then(|d| d.get(name).ok())
        else {
            return;
        };
        let Ok(Object::Stream(stream)) = doc.get_object(*id) else {
            return;
        };

        match name_of(stream.dict.get(b"Subtype").ok()).as_deref() {
            Some("Form") => {}
            Some("Image") => {
                self.page.has_graphics = true;
                return;
            }
            _ => return,
        }

        if self.form_stack.contains(id) || self.form_stack.len() >= MAX_FORM_DEPTH {
            debug!(?id, "form xobject recursion stopped");
            return;
        }

        let content = match Content::decode(&stream_bytes(stream)) {
            Ok(content) => content,
            Err(e) => {
                debug!(?id, error = %e, "form content could not be decoded");
                return;
            }
        };
        let form_resources = stream
            .dict
            .get(b"Resources")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok())
            .or(resources);
        let matrix = stream
            .dict
            .get(b"Matrix")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_array().ok())
            .and_then(|arr| Matrix::from_operands(arr))
            .unwrap_or(Matrix::IDENTITY);

        let mut inner = gs.clone();
        inner.ctm = matrix.multiply(&gs.ctm);

        self.form_stack.push(*id);
        self.run(&content.operations, form_resources, inner);
        self.form_stack.pop();
    }
}

/// Decoded stream data, falling back to the raw bytes for unfiltered streams
pub(crate) fn stream_bytes(stream: &Stream) -> Vec<u8> {
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}

/// Context for rendering text
pub struct TextRenderContext {
    /// PDF font resource name (e.g., "F1")
    pub font_name: String,
    /// Font size in points
    pub font_size: f32,
    /// Text color (RGB)
    pub color: Color,
}

/// Generate PDF operators for text insertion
///
/// Creates the PDF text operators (BT, rg, Tf, Td, Tj, ET) that show
/// already-encoded text with its baseline origin at `(x, y)`.
///
/// # Arguments
/// * `encoded` - Text bytes in the font's encoding
/// * `x` - X coordinate in points (PDF coordinates, from left)
/// * `y` - Y coordinate in points (PDF coordinates, from bottom)
/// * `ctx` - Text rendering context
pub fn generate_text_operators(encoded: &[u8], x: f64, y: f64, ctx: &TextRenderContext) -> Vec<u8> {
    let mut ops = String::new();

    ops.push_str("BT\n");
    ops.push_str(&format!(
        "{} {} {} rg\n",
        ctx.color.r, ctx.color.g, ctx.color.b
    ));
    ops.push_str(&format!("/{} {} Tf\n", ctx.font_name, ctx.font_size));
    ops.push_str(&format!("{x:.3} {y:.3} Td\n"));

    ops.push('<');
    for byte in encoded {
        ops.push_str(&format!("{byte:02X}"));
    }
    ops.push_str("> Tj\n");

    ops.push_str("ET\n");

    ops.into_bytes()
}
