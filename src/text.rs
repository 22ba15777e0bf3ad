//! Fixed text codecs for the printer data stream
//!
//! The protocol carries text in exactly two encodings: single-byte EBCDIC
//! (code page 500, the international variant) and double-byte UCS-2
//! big-endian. Both are fixed table codecs; anything fancier (CCSID-driven
//! transcoding) is out of scope and treated as opaque payload bytes.

use crate::error::{Error, Result};

/// EBCDIC code page 500 to Unicode, one entry per code point
const EBCDIC_500: [char; 256] = [
    '\u{00}', '\u{01}', '\u{02}', '\u{03}', '\u{9C}', '\u{09}', '\u{86}', '\u{7F}', //
    '\u{97}', '\u{8D}', '\u{8E}', '\u{0B}', '\u{0C}', '\u{0D}', '\u{0E}', '\u{0F}', //
    '\u{10}', '\u{11}', '\u{12}', '\u{13}', '\u{9D}', '\u{85}', '\u{08}', '\u{87}', //
    '\u{18}', '\u{19}', '\u{92}', '\u{8F}', '\u{1C}', '\u{1D}', '\u{1E}', '\u{1F}', //
    '\u{80}', '\u{81}', '\u{82}', '\u{83}', '\u{84}', '\u{0A}', '\u{17}', '\u{1B}', //
    '\u{88}', '\u{89}', '\u{8A}', '\u{8B}', '\u{8C}', '\u{05}', '\u{06}', '\u{07}', //
    '\u{90}', '\u{91}', '\u{16}', '\u{93}', '\u{94}', '\u{95}', '\u{96}', '\u{04}', //
    '\u{98}', '\u{99}', '\u{9A}', '\u{9B}', '\u{14}', '\u{15}', '\u{9E}', '\u{1A}', //
    ' ', '\u{A0}', 'â', 'ä', 'à', 'á', 'ã', 'å', //
    'ç', 'ñ', '[', '.', '<', '(', '+', '!', //
    '&', 'é', 'ê', 'ë', 'è', 'í', 'î', 'ï', //
    'ì', 'ß', ']', '$', '*', ')', ';', '^', //
    '-', '/', 'Â', 'Ä', 'À', 'Á', 'Ã', 'Å', //
    'Ç', 'Ñ', '¦', ',', '%', '_', '>', '?', //
    'ø', 'É', 'Ê', 'Ë', 'È', 'Í', 'Î', 'Ï', //
    'Ì', '`', ':', '#', '@', '\'', '=', '"', //
    'Ø', 'a', 'b', 'c', 'd', 'e', 'f', 'g', //
    'h', 'i', '«', '»', 'ð', 'ý', 'þ', '±', //
    '°', 'j', 'k', 'l', 'm', 'n', 'o', 'p', //
    'q', 'r', 'ª', 'º', 'æ', '¸', 'Æ', '¤', //
    'µ', '~', 's', 't', 'u', 'v', 'w', 'x', //
    'y', 'z', '¡', '¿', 'Ð', 'Ý', 'Þ', '®', //
    '¢', '£', '¥', '·', '©', '§', '¶', '¼', //
    '½', '¾', '¬', '|', '¯', '¨', '´', '×', //
    '{', 'A', 'B', 'C', 'D', 'E', 'F', 'G', //
    'H', 'I', '\u{AD}', 'ô', 'ö', 'ò', 'ó', 'õ', //
    '}', 'J', 'K', 'L', 'M', 'N', 'O', 'P', //
    'Q', 'R', '¹', 'û', 'ü', 'ù', 'ú', 'ÿ', //
    '\\', '÷', 'S', 'T', 'U', 'V', 'W', 'X', //
    'Y', 'Z', '²', 'Ô', 'Ö', 'Ò', 'Ó', 'Õ', //
    '0', '1', '2', '3', '4', '5', '6', '7', //
    '8', '9', '³', 'Û', 'Ü', 'Ù', 'Ú', '\u{9F}', //
];

/// Decode EBCDIC (code page 500) bytes
///
/// Every byte maps to a character, so decoding is total.
pub fn ebcdic_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| EBCDIC_500[b as usize]).collect()
}

/// Encode a string as EBCDIC (code page 500)
pub fn string_to_ebcdic(s: &str) -> Result<Vec<u8>> {
    s.chars()
        .map(|c| {
            EBCDIC_500
                .iter()
                .position(|&e| e == c)
                .map(|i| i as u8)
                .ok_or_else(|| {
                    Error::InvalidText(format!("{c:?} has no EBCDIC code page 500 mapping"))
                })
        })
        .collect()
}

/// Decode UCS-2 big-endian bytes
pub fn ucs2_to_string(bytes: &[u8]) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(Error::InvalidText(format!(
            "UCS-2 data has odd length {}",
            bytes.len()
        )));
    }
    bytes
        .chunks_exact(2)
        .map(|pair| {
            let unit = u16::from_be_bytes([pair[0], pair[1]]) as u32;
            char::from_u32(unit)
                .ok_or_else(|| Error::InvalidText(format!("invalid UCS-2 unit 0x{unit:04X}")))
        })
        .collect()
}

/// Encode a string as UCS-2 big-endian
///
/// Characters outside the Basic Multilingual Plane are not representable.
pub fn string_to_ucs2(s: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(s.len() * 2);
    for c in s.chars() {
        let code = c as u32;
        if code > 0xFFFF {
            return Err(Error::InvalidText(format!("{c:?} is outside UCS-2")));
        }
        out.extend_from_slice(&(code as u16).to_be_bytes());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ebcdic_roundtrip_ascii() {
        let s = "IPDS PRINTER 01 a-z{}";
        let bytes = string_to_ebcdic(s).unwrap();
        assert_eq!(ebcdic_to_string(&bytes), s);
    }

    #[test]
    fn test_ebcdic_known_values() {
        // Classic anchors: space=0x40, 'A'=0xC1, '0'=0xF0, 'a'=0x81
        assert_eq!(string_to_ebcdic(" A0a").unwrap(), vec![0x40, 0xC1, 0xF0, 0x81]);
        assert_eq!(ebcdic_to_string(&[0xD1, 0xD6, 0xC2]), "JOB");
    }

    #[test]
    fn test_ebcdic_unmappable() {
        assert!(string_to_ebcdic("→").is_err());
    }

    #[test]
    fn test_ucs2_roundtrip() {
        let s = "Grüße Ω";
        let bytes = string_to_ucs2(s).unwrap();
        assert_eq!(bytes.len(), s.chars().count() * 2);
        assert_eq!(ucs2_to_string(&bytes).unwrap(), s);
    }

    #[test]
    fn test_ucs2_odd_length() {
        assert!(ucs2_to_string(&[0x00, 0x41, 0x00]).is_err());
    }

    #[test]
    fn test_ucs2_rejects_astral() {
        assert!(string_to_ucs2("𝄞").is_err());
    }

    #[test]
    fn test_ucs2_rejects_surrogate_unit() {
        assert!(ucs2_to_string(&[0xD8, 0x00]).is_err());
    }
}
