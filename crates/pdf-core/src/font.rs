//! Font handling for text extraction and re-insertion

use crate::cmap::ToUnicodeMap;
use lopdf::{Dictionary, Document, Object};
use std::collections::HashMap;
use tracing::trace;

/// Resource name of the built-in output font
pub const OUTPUT_FONT_RESOURCE: &str = "RcHelv";

/// Width used when a font carries no metrics (1/1000 em)
const FALLBACK_WIDTH: f32 = 500.0;

/// Single-byte encoding of a simple font
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimpleEncoding {
    #[default]
    WinAnsi,
    MacRoman,
    Standard,
}

/// One decoded glyph of a shown string
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Character code as it appeared in the string
    pub code: u32,
    /// Unicode text for the code (may be empty or several chars)
    pub text: String,
    /// Advance width in 1/1000 text space units
    pub width: f32,
    /// Single-byte code 32, which receives word spacing
    pub is_space: bool,
}

/// Decoding and metrics information for one font resource
#[derive(Debug, Clone, Default)]
pub struct FontInfo {
    /// Composite (Type0) fonts use two-byte codes
    two_byte: bool,
    encoding: SimpleEncoding,
    to_unicode: Option<ToUnicodeMap>,
    first_char: u32,
    widths: Vec<f32>,
    cid_widths: HashMap<u32, f32>,
    default_width: f32,
}

impl FontInfo {
    /// Build font information from a font dictionary
    pub fn from_dict(doc: &Document, font: &Dictionary) -> Self {
        let subtype = name_of(font.get(b"Subtype").ok());
        let two_byte = subtype.as_deref() == Some("Type0");

        let encoding = match name_of(font.get(b"Encoding").ok().map(|o| resolve(doc, o))) {
            Some(name) if name == "MacRomanEncoding" => SimpleEncoding::MacRoman,
            Some(name) if name == "StandardEncoding" => SimpleEncoding::Standard,
            _ => {
                // Encoding dictionaries name their base encoding
                let base = font
                    .get(b"Encoding")
                    .ok()
                    .map(|o| resolve(doc, o))
                    .and_then(|o| o.as_dict().ok())
                    .and_then(|d| name_of(d.get(b"BaseEncoding").ok()));
                match base.as_deref() {
                    Some("MacRomanEncoding") => SimpleEncoding::MacRoman,
                    Some("StandardEncoding") => SimpleEncoding::Standard,
                    _ => SimpleEncoding::WinAnsi,
                }
            }
        };

        let to_unicode = font
            .get(b"ToUnicode")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_stream().ok())
            .map(|stream| {
                let data = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                ToUnicodeMap::parse(&data)
            })
            .filter(|map| !map.is_empty());

        let mut info = Self {
            two_byte,
            encoding,
            to_unicode,
            default_width: if two_byte { 1000.0 } else { FALLBACK_WIDTH },
            ..Self::default()
        };

        if two_byte {
            info.load_cid_widths(doc, font);
        } else {
            info.first_char = font
                .get(b"FirstChar")
                .ok()
                .and_then(number)
                .map_or(0, |v| v.max(0.0) as u32);
            info.widths = font
                .get(b"Widths")
                .ok()
                .map(|o| resolve(doc, o))
                .and_then(|o| o.as_array().ok())
                .map(|arr| {
                    arr.iter()
                        .map(|w| number(resolve(doc, w)).unwrap_or(FALLBACK_WIDTH))
                        .collect()
                })
                .unwrap_or_default();
        }

        trace!(
            two_byte,
            widths = info.widths.len() + info.cid_widths.len(),
            to_unicode = info.to_unicode.is_some(),
            "loaded font info"
        );
        info
    }

    /// Read `DW` and `W` from the descendant CIDFont
    fn load_cid_widths(&mut self, doc: &Document, font: &Dictionary) {
        let descendant = font
            .get(b"DescendantFonts")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_array().ok())
            .and_then(|arr| arr.first())
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok());
        let Some(cid_font) = descendant else {
            return;
        };

        if let Some(dw) = cid_font.get(b"DW").ok().and_then(number) {
            self.default_width = dw;
        }

        let Some(w) = cid_font
            .get(b"W")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_array().ok())
        else {
            return;
        };

        // W is a sequence of `c [w1 w2 ...]` and `c_first c_last w` entries
        let mut i = 0;
        while i < w.len() {
            let Some(first) = number(resolve(doc, &w[i])) else {
                break;
            };
            let first = first.max(0.0) as u32;
            match w.get(i + 1).map(|o| resolve(doc, o)) {
                Some(Object::Array(run)) => {
                    for (offset, width) in run.iter().enumerate() {
                        if let Some(width) = number(resolve(doc, width)) {
                            self.cid_widths.insert(first + offset as u32, width);
                        }
                    }
                    i += 2;
                }
                Some(last) => {
                    let (Some(last), Some(width)) =
                        (number(last), w.get(i + 2).and_then(|o| number(resolve(doc, o))))
                    else {
                        break;
                    };
                    let last = last.max(0.0) as u32;
                    if last >= first && last - first <= 0xFFFF {
                        for cid in first..=last {
                            self.cid_widths.insert(cid, width);
                        }
                    }
                    i += 3;
                }
                None => break,
            }
        }
    }

    /// Split a shown string into glyphs
    pub fn decode(&self, bytes: &[u8]) -> Vec<Glyph> {
        let code_len = if self.two_byte { 2 } else { 1 };

        bytes
            .chunks(code_len)
            .map(|chunk| {
                let code = chunk.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32);
                let text = self
                    .to_unicode
                    .as_ref()
                    .and_then(|m| m.get(code))
                    .map(str::to_string)
                    .unwrap_or_else(|| self.fallback_text(code));
                Glyph {
                    code,
                    text,
                    width: self.width(code),
                    is_space: !self.two_byte && code == 32,
                }
            })
            .collect()
    }

    fn fallback_text(&self, code: u32) -> String {
        if self.two_byte {
            // Identity mapping is the best guess without a ToUnicode CMap
            return char::from_u32(code)
                .filter(|c| !c.is_control())
                .map(String::from)
                .unwrap_or_default();
        }
        let byte = code as u8;
        let ch = match self.encoding {
            SimpleEncoding::WinAnsi => win_ansi_char(byte),
            SimpleEncoding::MacRoman => mac_roman_char(byte),
            SimpleEncoding::Standard => standard_char(byte),
        };
        ch.filter(|c| !c.is_control()).map(String::from).unwrap_or_default()
    }

    /// Glyph advance in 1/1000 em
    pub fn width(&self, code: u32) -> f32 {
        if self.two_byte {
            return self
                .cid_widths
                .get(&code)
                .copied()
                .unwrap_or(self.default_width);
        }
        code.checked_sub(self.first_char)
            .and_then(|idx| self.widths.get(idx as usize))
            .copied()
            .unwrap_or(self.default_width)
    }
}

/// Dictionary for the built-in Helvetica output font
pub fn output_font_dict() -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"Font".to_vec()));
    dict.set("Subtype", Object::Name(b"Type1".to_vec()));
    dict.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    dict.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    dict
}

/// Characters that Helvetica/WinAnsi cannot show, and the closest ASCII
const TRANSLITERATIONS: &[(char, &str)] = &[
    ('\u{0131}', "i"),
    ('\u{0130}', "I"),
    ('\u{011F}', "g"),
    ('\u{011E}', "G"),
    ('\u{015F}', "s"),
    ('\u{015E}', "S"),
    ('\u{0141}', "L"),
    ('\u{0142}', "l"),
    ('\u{0151}', "o"),
    ('\u{0150}', "O"),
    ('\u{0171}', "u"),
    ('\u{0170}', "U"),
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{2212}', "-"),
    ('\u{2010}', "-"),
    ('\u{2011}', "-"),
    ('\u{2032}', "'"),
    ('\u{2033}', "\""),
    ('\u{2009}', " "),
    ('\u{200A}', " "),
    ('\u{202F}', " "),
];

/// Encode text for the WinAnsi output font
///
/// Returns the encoded bytes and the number of characters that were
/// transliterated or replaced with `?`.
pub fn encode_win_ansi(text: &str) -> (Vec<u8>, usize) {
    let mut out = Vec::with_capacity(text.len());
    let mut substituted = 0;

    for ch in text.chars() {
        if let Some(byte) = win_ansi_byte(ch) {
            out.push(byte);
            continue;
        }
        substituted += 1;
        match TRANSLITERATIONS.iter().find(|(c, _)| *c == ch) {
            Some((_, ascii)) => out.extend_from_slice(ascii.as_bytes()),
            None => out.push(b'?'),
        }
    }

    (out, substituted)
}

/// The 0x80-0x9F block of WinAnsiEncoding
const WIN_ANSI_HIGH: [Option<char>; 32] = [
    Some('€'), None, Some('‚'), Some('ƒ'), Some('„'), Some('…'), Some('†'), Some('‡'),
    Some('ˆ'), Some('‰'), Some('Š'), Some('‹'), Some('Œ'), None, Some('Ž'), None,
    None, Some('‘'), Some('’'), Some('“'), Some('”'), Some('•'), Some('–'), Some('—'),
    Some('˜'), Some('™'), Some('š'), Some('›'), Some('œ'), None, Some('ž'), Some('Ÿ'),
];

fn win_ansi_char(byte: u8) -> Option<char> {
    match byte {
        0x80..=0x9F => WIN_ANSI_HIGH[(byte - 0x80) as usize],
        _ => Some(byte as char),
    }
}

fn win_ansi_byte(ch: char) -> Option<u8> {
    match ch as u32 {
        0x20..=0x7E | 0xA0..=0xFF => Some(ch as u32 as u8),
        _ => WIN_ANSI_HIGH
            .iter()
            .position(|c| *c == Some(ch))
            .map(|idx| 0x80 + idx as u8),
    }
}

fn standard_char(byte: u8) -> Option<char> {
    match byte {
        0x27 => Some('’'),
        0x60 => Some('‘'),
        0x20..=0x7E => Some(byte as char),
        _ => win_ansi_char(byte),
    }
}

/// The 0x80-0xFF block of MacRomanEncoding
const MAC_ROMAN_HIGH: [char; 128] = [
    'Ä', 'Å', 'Ç', 'É', 'Ñ', 'Ö', 'Ü', 'á', 'à', 'â', 'ä', 'ã', 'å', 'ç', 'é', 'è',
    'ê', 'ë', 'í', 'ì', 'î', 'ï', 'ñ', 'ó', 'ò', 'ô', 'ö', 'õ', 'ú', 'ù', 'û', 'ü',
    '†', '°', '¢', '£', '§', '•', '¶', 'ß', '®', '©', '™', '´', '¨', '≠', 'Æ', 'Ø',
    '∞', '±', '≤', '≥', '¥', 'µ', '∂', '∑', '∏', 'π', '∫', 'ª', 'º', 'Ω', 'æ', 'ø',
    '¿', '¡', '¬', '√', 'ƒ', '≈', '∆', '«', '»', '…', '\u{A0}', 'À', 'Ã', 'Õ', 'Œ', 'œ',
    '–', '—', '“', '”', '‘', '’', '÷', '◊', 'ÿ', 'Ÿ', '⁄', '€', '‹', '›', 'ﬁ', 'ﬂ',
    '‡', '·', '‚', '„', '‰', 'Â', 'Ê', 'Á', 'Ë', 'È', 'Í', 'Î', 'Ï', 'Ì', 'Ó', 'Ô',
    '\u{F8FF}', 'Ò', 'Ú', 'Û', 'Ù', 'ı', 'ˆ', '˜', '¯', '˘', '˙', '˚', '¸', '˝', '˛', 'ˇ',
];

fn mac_roman_char(byte: u8) -> Option<char> {
    match byte {
        0x80..=0xFF => Some(MAC_ROMAN_HIGH[(byte - 0x80) as usize]),
        _ => Some(byte as char),
    }
}

/// Follow a reference to its target, leaving direct objects as they are
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Numeric value of an integer or real object
pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

pub(crate) fn name_of(obj: Option<&Object>) -> Option<String> {
    match obj {
        Some(Object::Name(name)) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}
