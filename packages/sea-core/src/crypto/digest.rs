//! Fixed digest primitives.
//!
//! SHA-256 is used everywhere a message or key material is hashed. SHA-1
//! exists only for [`crate::crypto::keyid`] and must not be used for
//! anything new.

use serde_json::Value;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use super::envelope::serialize;
use crate::error::Result;

/// Size of a SHA-256 digest in bytes
pub const SHA256_SIZE: usize = 32;

/// Size of a SHA-1 digest in bytes
pub const SHA1_SIZE: usize = 20;

/// Input accepted by the digest functions
#[derive(Debug, Clone, Copy)]
pub enum DigestInput<'a> {
    /// Raw octets, hashed as-is
    Bytes(&'a [u8]),
    /// Text, hashed as its UTF-8 encoding
    Text(&'a str),
}

impl<'a> DigestInput<'a> {
    fn as_bytes(&self) -> &'a [u8] {
        match *self {
            DigestInput::Bytes(b) => b,
            DigestInput::Text(t) => t.as_bytes(),
        }
    }
}

impl<'a> From<&'a str> for DigestInput<'a> {
    fn from(text: &'a str) -> Self {
        DigestInput::Text(text)
    }
}

impl<'a> From<&'a String> for DigestInput<'a> {
    fn from(text: &'a String) -> Self {
        DigestInput::Text(text.as_str())
    }
}

impl<'a> From<&'a [u8]> for DigestInput<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        DigestInput::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for DigestInput<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        DigestInput::Bytes(bytes.as_slice())
    }
}

/// SHA-256 of octets or text
pub fn sha256<'a>(input: impl Into<DigestInput<'a>>) -> [u8; SHA256_SIZE] {
    Sha256::digest(input.into().as_bytes()).into()
}

/// SHA-256 of a payload in its serialized form
///
/// Strings are hashed verbatim, everything else as JSON with JavaScript
/// number formatting.
pub fn sha256_value(value: &Value) -> Result<[u8; SHA256_SIZE]> {
    Ok(sha256(serialize(value)?.as_str()))
}

/// SHA-1 of raw octets (key fingerprints only)
pub fn sha1(bytes: &[u8]) -> [u8; SHA1_SIZE] {
    Sha1::digest(bytes).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            hex::encode(sha256("abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_text_and_bytes_agree() {
        assert_eq!(sha256("héllo"), sha256("héllo".as_bytes()));
    }

    #[test]
    fn test_sha1_known_vector() {
        assert_eq!(
            hex::encode(sha1(b"abc")),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn test_value_digest_serializes_non_strings() {
        assert_eq!(sha256_value(&json!("hi")).unwrap(), sha256("hi"));
        assert_eq!(sha256_value(&json!({"a": 1})).unwrap(), sha256(r#"{"a":1}"#));
        assert_eq!(
            sha256_value(&json!({"v": 0.0000015})).unwrap(),
            sha256(r#"{"v":0.0000015}"#)
        );
    }
}
