//! # Codec
//!
//! Conversions between opaque buffers and their string forms.
//!
//! ## Encodings
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            ENCODINGS                                    │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  hex     "0aff"          ◄──►  [0x0a, 0xff]                            │
//! │  base64  "Cv8="          ◄──►  [0x0a, 0xff]                            │
//! │  utf8    "\u{a}\u{ff}"   ◄──►  [0x000a, 0x00ff]   (one cell per UTF-16 │
//! │                                                    code unit)          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `utf8` form is NOT UTF-8. Each UTF-16 code unit of the string becomes
//! one cell, and each cell becomes one code unit again on the way back. Peers
//! have used it for years to smuggle bytes through strings, so it is kept
//! exactly as it behaves elsewhere on the network.
//!
//! Cells are 16 bits wide for that reason. Anything byte-oriented (hex,
//! base64, the cipher) sees only the low 8 bits of each cell.

use std::fmt;
use std::str::FromStr;

use base64::alphabet;
use base64::engine::general_purpose::{
    GeneralPurpose, GeneralPurposeConfig, STANDARD, URL_SAFE_NO_PAD,
};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::error::{Error, Result};

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// Base64 decoder that tolerates missing or present padding
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Base64url decoder, padding optional
const LENIENT_BASE64URL: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// String form of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// Lowercase hexadecimal, two digits per byte
    Hex,
    /// One character per cell (UTF-16 code unit). Also accepted as "binary".
    Utf8,
    /// Standard base64 with padding
    #[default]
    Base64,
}

impl Encoding {
    /// The name other peers use for this encoding
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Hex => "hex",
            Encoding::Utf8 => "utf8",
            Encoding::Base64 => "base64",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hex" => Ok(Encoding::Hex),
            "utf8" | "binary" => Ok(Encoding::Utf8),
            "base64" => Ok(Encoding::Base64),
            other => Err(Error::Encoding(format!("unknown encoding: {}", other))),
        }
    }
}

/// A sequence of 16-bit cells
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Buffer(Vec<u16>);

impl Buffer {
    /// Wrap raw bytes, one cell per byte
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.iter().map(|&b| u16::from(b)).collect())
    }

    /// Wrap raw cells
    pub fn from_cells(cells: Vec<u16>) -> Self {
        Self(cells)
    }

    /// A buffer of `length` cells all set to `fill`
    pub fn alloc(length: usize, fill: u8) -> Self {
        Self(vec![u16::from(fill); length])
    }

    /// Join several buffers end to end
    pub fn concat<'a, I>(parts: I) -> Self
    where
        I: IntoIterator<Item = &'a Buffer>,
    {
        Self(parts.into_iter().flat_map(|b| b.0.iter().copied()).collect())
    }

    /// Decode a string in the given encoding
    pub fn from_string(data: &str, encoding: Encoding) -> Result<Self> {
        match encoding {
            Encoding::Hex => decode_hex_pairs(data).map(|bytes| Self::from_bytes(&bytes)),
            Encoding::Utf8 => Ok(Self(data.encode_utf16().collect())),
            Encoding::Base64 => decode_base64(data).map(|bytes| Self::from_bytes(&bytes)),
        }
    }

    /// Encode the whole buffer
    pub fn to_string_as(&self, encoding: Encoding) -> String {
        self.to_string_range(encoding, 0, None)
    }

    /// Encode the cells in `start..end` (end defaults to the buffer length)
    ///
    /// The range is half-open and clamped for every encoding, base64
    /// included. Older implementations read `end` as inclusive for hex and
    /// ignored the range for base64; neither quirk is reproduced.
    pub fn to_string_range(&self, encoding: Encoding, start: usize, end: Option<usize>) -> String {
        let end = end.unwrap_or(self.0.len()).min(self.0.len());
        let start = start.min(end);
        let cells = &self.0[start..end];

        match encoding {
            Encoding::Hex => cells.iter().map(|&c| format!("{:02x}", c as u8)).collect(),
            Encoding::Utf8 => char::decode_utf16(cells.iter().copied())
                .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect(),
            Encoding::Base64 => {
                let bytes: Vec<u8> = cells.iter().map(|&c| c as u8).collect();
                STANDARD.encode(bytes)
            }
        }
    }

    /// Byte view (low 8 bits of each cell)
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.iter().map(|&c| c as u8).collect()
    }

    /// The raw cells
    pub fn cells(&self) -> &[u16] {
        &self.0
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the buffer has no cells
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buffer({} cells)", self.0.len())
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(&bytes)
    }
}

impl From<&[u8]> for Buffer {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

/// Decode bytes from a string in the given encoding
pub fn decode(data: &str, encoding: Encoding) -> Result<Vec<u8>> {
    Buffer::from_string(data, encoding).map(|b| b.to_bytes())
}

/// Encode bytes into a string in the given encoding
pub fn encode(bytes: &[u8], encoding: Encoding) -> String {
    Buffer::from_bytes(bytes).to_string_as(encoding)
}

/// Encode bytes as unpadded base64url (the JWK coordinate form)
pub fn to_base64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode unpadded (or padded) base64url
pub fn from_base64url(data: &str) -> Result<Vec<u8>> {
    LENIENT_BASE64URL
        .decode(data.trim())
        .map_err(|e| Error::Encoding(format!("invalid base64url: {}", e)))
}

fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let trimmed: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    LENIENT_BASE64
        .decode(trimmed.as_bytes())
        .map_err(|e| Error::Encoding(format!("invalid base64: {}", e)))
}

/// Collect every run of two adjacent hex digits
fn decode_hex_pairs(data: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(data.len() / 2);
    let mut pending: Option<u8> = None;

    for c in data.chars() {
        match c.to_digit(16) {
            Some(d) => match pending.take() {
                Some(high) => bytes.push((high << 4) | d as u8),
                None => pending = Some(d as u8),
            },
            None => pending = None,
        }
    }

    if bytes.is_empty() && !data.is_empty() {
        return Err(Error::Encoding("invalid first argument for type 'hex'".into()));
    }
    Ok(bytes)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bytes() -> Vec<u8> {
        (0u8..=255).collect()
    }

    #[test]
    fn test_hex_round_trip() {
        let bytes = sample_bytes();
        let hex = encode(&bytes, Encoding::Hex);
        assert_eq!(hex.len(), 512);
        assert_eq!(decode(&hex, Encoding::Hex).unwrap(), bytes);
    }

    #[test]
    fn test_base64_round_trip() {
        for len in 0..8 {
            let bytes: Vec<u8> = sample_bytes().into_iter().rev().take(len).collect();
            let b64 = encode(&bytes, Encoding::Base64);
            assert_eq!(decode(&b64, Encoding::Base64).unwrap(), bytes);
        }
    }

    #[test]
    fn test_hex_skips_separators() {
        assert_eq!(decode("0a:ff", Encoding::Hex).unwrap(), vec![0x0a, 0xff]);
        assert!(decode("zz", Encoding::Hex).is_err());
    }

    #[test]
    fn test_text_form_is_code_units() {
        let buf = Buffer::from_string("a\u{e9}\u{4e2d}", Encoding::Utf8).unwrap();
        assert_eq!(buf.cells(), &[0x61, 0xe9, 0x4e2d]);
        assert_eq!(buf.to_string_as(Encoding::Utf8), "a\u{e9}\u{4e2d}");
        // byte view truncates to the low 8 bits
        assert_eq!(buf.to_bytes(), vec![0x61, 0xe9, 0x2d]);
    }

    #[test]
    fn test_bytes_through_text_form() {
        let bytes = sample_bytes();
        let text = encode(&bytes, Encoding::Utf8);
        assert_eq!(text.chars().count(), 256);
        assert_eq!(decode(&text, Encoding::Utf8).unwrap(), bytes);
    }

    #[test]
    fn test_range_and_concat() {
        let a = Buffer::from_bytes(&[1, 2, 3]);
        let b = Buffer::alloc(2, 0xff);
        let joined = Buffer::concat([&a, &b]);
        assert_eq!(joined.to_bytes(), vec![1, 2, 3, 0xff, 0xff]);
        assert_eq!(joined.to_string_range(Encoding::Hex, 3, None), "ffff");
        assert_eq!(joined.to_string_range(Encoding::Hex, 1, Some(3)), "0203");
        assert_eq!(joined.to_string_range(Encoding::Hex, 9, None), "");
        assert_eq!(joined.to_string_range(Encoding::Base64, 0, Some(3)), "AQID");
    }

    #[test]
    fn test_base64url() {
        let bytes = [0xfb, 0xff, 0x00];
        let url = to_base64url(&bytes);
        assert_eq!(url, "-_8A");
        assert_eq!(from_base64url(&url).unwrap(), bytes);

        assert_eq!(from_base64url("-_8").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(from_base64url("-_8=").unwrap(), vec![0xfb, 0xff]);
        assert!(from_base64url("+/8A").is_err());
    }

    #[test]
    fn test_encoding_names() {
        assert_eq!("binary".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!(Encoding::Base64.to_string(), "base64");
        assert!("latin1".parse::<Encoding>().is_err());
    }
}
