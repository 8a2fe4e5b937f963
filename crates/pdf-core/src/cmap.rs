//! ToUnicode CMap lookup
//!
//! `adobe_cmap_parser` reads the `bfchar`/`bfrange` mappings and the
//! codespace ranges; destinations are UTF-16BE and decoded with
//! `encoding_rs`.

use adobe_cmap_parser::{get_byte_mapping, get_unicode_map};
use encoding_rs::UTF_16BE;
use std::collections::HashMap;
use tracing::warn;

/// Mapping from character codes to Unicode strings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToUnicodeMap {
    /// Byte length of a character code (1 or 2)
    pub code_len: usize,
    map: HashMap<u32, String>,
}

impl ToUnicodeMap {
    /// Parse a decompressed ToUnicode CMap stream
    ///
    /// A CMap the parser rejects yields an empty map.
    pub fn parse(data: &[u8]) -> Self {
        let raw = match get_unicode_map(data) {
            Ok(raw) => raw,
            Err(_) => {
                warn!("unreadable ToUnicode CMap ignored");
                return Self::default();
            }
        };

        let map: HashMap<u32, String> = raw
            .into_iter()
            .filter_map(|(code, bytes)| decode_destination(&bytes).map(|text| (code, text)))
            .collect();

        // Without a usable codespace, a code above 0xFF means two-byte codes
        let code_len = get_byte_mapping(data)
            .ok()
            .and_then(|mapping| mapping.codespace.iter().map(|range| range.width).max())
            .map(|width| width as usize)
            .unwrap_or_else(|| if map.keys().any(|&code| code > 0xFF) { 2 } else { 1 });

        Self {
            code_len: code_len.clamp(1, 2),
            map,
        }
    }

    /// Look up the Unicode text for a code
    pub fn get(&self, code: u32) -> Option<&str> {
        self.map.get(&code).map(String::as_str)
    }

    /// Number of mapped codes
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn decode_destination(bytes: &[u8]) -> Option<String> {
    match bytes.len() {
        0 => None,
        // Some producers write single-byte destinations
        1 => Some(char::from(bytes[0]).to_string()),
        _ => {
            let text = UTF_16BE
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned());
            if text.is_none() {
                warn!(?bytes, "ToUnicode destination is not valid UTF-16BE");
            }
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CMAP: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0003> <0020>
<0011> <00470068>
endbfchar
1 beginbfrange
<0024> <0026> <0041>
endbfrange
endcmap
CMapName currentdict /CMap defineresource pop
end
end";

    #[test]
    fn test_parse_bfchar_and_bfrange() {
        let map = ToUnicodeMap::parse(CMAP);
        assert_eq!(map.code_len, 2);
        assert_eq!(map.len(), 5);
        assert_eq!(map.get(0x0003), Some(" "));
        assert_eq!(map.get(0x0011), Some("Gh"));
        assert_eq!(map.get(0x0024), Some("A"));
        assert_eq!(map.get(0x0026), Some("C"));
        assert_eq!(map.get(0x0027), None);
    }

    #[test]
    fn test_single_byte_codespace() {
        let map = ToUnicodeMap::parse(
            b"begincmap
1 begincodespacerange
<00> <FF>
endcodespacerange
1 beginbfchar
<41> <0042>
endbfchar
endcmap",
        );
        assert_eq!(map.code_len, 1);
        assert_eq!(map.get(0x41), Some("B"));
    }

    #[test]
    fn test_surrogate_pairs_decode() {
        assert_eq!(decode_destination(&[0xD8, 0x3D, 0xDE, 0x00]).as_deref(), Some("\u{1F600}"));
        assert_eq!(decode_destination(&[0xD8, 0x3D]), None);
        assert_eq!(decode_destination(&[]), None);
    }
}
