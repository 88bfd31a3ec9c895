//! # Envelopes
//!
//! Signed and encrypted payloads travel as JSON objects with the literal
//! prefix `SEA` in front:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         WIRE ENVELOPES                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  signed     SEA{"m":<payload>,"s":"<base64 r‖s>"}                      │
//! │  encrypted  SEA{"ct":"…","iv":"…","s":"…"}                             │
//! │                                                                         │
//! │  Anything else is an ordinary string or JSON value.                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Parsing is forgiving: a string that is not JSON stays a string, and a
//! tagged string loses its prefix before decoding.
//!
//! Serialization writes numbers the way JavaScript's `JSON.stringify` does
//! (`0.0000015`, `100000000000000000000`, `1e+21`), because digests are
//! taken over the serialized text and must match what other peers hash.

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};

/// Prefix on every tagged envelope
pub const TAG: &str = "SEA";

/// Whether `text` looks like a tagged envelope
pub fn is_tagged(text: &str) -> bool {
    text.strip_prefix(TAG).is_some_and(|rest| rest.starts_with('{'))
}

/// Decode a payload
///
/// Non-strings pass through unchanged. Strings lose the `SEA` prefix when it
/// is followed by `{`, and are then decoded as JSON if they can be,
/// otherwise returned as they were.
pub fn parse(value: &Value) -> Value {
    match value {
        Value::String(text) => parse_text(text),
        other => other.clone(),
    }
}

/// Decode a payload given as text
pub fn parse_text(text: &str) -> Value {
    let body = text
        .strip_prefix(TAG)
        .filter(|rest| rest.starts_with('{'))
        .unwrap_or(text);
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Encode a payload for hashing or encryption
///
/// Strings pass through unchanged, everything else becomes JSON.
pub fn serialize(value: &Value) -> Result<String> {
    match value {
        Value::String(text) => Ok(text.clone()),
        other => to_json(other),
    }
}

/// JSON text with JavaScript number formatting
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut out = Vec::with_capacity(128);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, JsFormatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(out).map_err(|e| Error::Serialization(e.to_string()))
}

/// Render a value the way a JavaScript string coercion would
///
/// Older peers hashed payloads after coercing them to strings, so every
/// object collapsed to the same text. Only used to verify their signatures.
pub fn legacy_text(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => js_number_text(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => legacy_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".into(),
    }
}

// ============================================================================
// JAVASCRIPT NUMBERS
// ============================================================================

/// Largest integer a double holds exactly
const MAX_SAFE_INTEGER: u64 = 9_007_199_254_740_991;

/// ECMAScript `Number::toString` of a double
///
/// Non-finite values give `null`, as `JSON.stringify` writes them.
pub fn js_number_string(f: f64) -> String {
    if !f.is_finite() {
        return "null".into();
    }
    if f == 0.0 {
        return "0".into();
    }

    // shortest round-trip digits, e.g. "1.5e-6"
    let scientific = format!("{:e}", f.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let k = digits.len() as i32;
    let n = exponent.parse::<i32>().unwrap_or(0) + 1;

    let body = if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{}.{}", int, frac)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat(-n as usize), digits)
    } else {
        let (head, tail) = digits.split_at(1);
        let sign = if n - 1 < 0 { '-' } else { '+' };
        if tail.is_empty() {
            format!("{}e{}{}", head, sign, (n - 1).abs())
        } else {
            format!("{}.{}e{}{}", head, tail, sign, (n - 1).abs())
        }
    };

    if f < 0.0 {
        format!("-{}", body)
    } else {
        body
    }
}

fn js_u64(v: u64) -> String {
    if v <= MAX_SAFE_INTEGER {
        v.to_string()
    } else {
        js_number_string(v as f64)
    }
}

fn js_i64(v: i64) -> String {
    if v.unsigned_abs() <= MAX_SAFE_INTEGER {
        v.to_string()
    } else {
        js_number_string(v as f64)
    }
}

fn js_number_text(n: &Number) -> String {
    if let Some(u) = n.as_u64() {
        js_u64(u)
    } else if let Some(i) = n.as_i64() {
        js_i64(i)
    } else {
        n.as_f64().map_or_else(|| n.to_string(), js_number_string)
    }
}

/// `serde_json` formatter that writes numbers as JavaScript would
///
/// Integers beyond 2^53 are rounded to the nearest double first, the same
/// loss a JavaScript peer applies when it parses them.
struct JsFormatter;

impl Formatter for JsFormatter {
    fn write_i64<W>(&mut self, writer: &mut W, value: i64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(js_i64(value).as_bytes())
    }

    fn write_u64<W>(&mut self, writer: &mut W, value: u64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(js_u64(value).as_bytes())
    }

    fn write_f32<W>(&mut self, writer: &mut W, value: f32) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(js_number_string(f64::from(value)).as_bytes())
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(js_number_string(value).as_bytes())
    }
}

/// A JSON number the way other peers would write it
///
/// Whole floats become integers so that `1700000000.0` serializes as
/// `1700000000`.
pub fn js_number(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 {
        Value::from(f as i64)
    } else {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Whether a value is one JavaScript would treat as false
pub(crate) fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Prefix a serialized envelope with the tag
pub fn tag<T: Serialize>(envelope: &T) -> Result<String> {
    Ok(format!("{}{}", TAG, to_json(envelope)?))
}

/// Pull a named string field out of a parsed envelope
pub(crate) fn string_field<'a>(object: &'a Map<String, Value>, name: &str) -> Result<&'a str> {
    object
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::MalformedEnvelope(format!("missing string field '{}'", name)))
}

// ============================================================================
// ENVELOPE TYPES
// ============================================================================

/// A signed payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    /// The payload, in parsed form
    pub m: Value,
    /// base64 of the 64-byte `r‖s` signature
    pub s: String,
}

impl SignedEnvelope {
    /// The `SEA{...}` wire form
    pub fn to_tagged(&self) -> Result<String> {
        tag(self)
    }

    /// Read a signed envelope out of any payload form
    pub fn from_value(value: &Value) -> Result<Self> {
        let parsed = parse(value);
        let object = parsed
            .as_object()
            .ok_or_else(|| Error::MalformedEnvelope("signed data is not an object".into()))?;
        let m = object
            .get("m")
            .filter(|m| !is_falsy(m))
            .ok_or_else(|| Error::MalformedEnvelope("signed data has no message".into()))?;
        let s = object
            .get("s")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::MalformedEnvelope("signed data has no signature".into()))?;
        Ok(Self {
            m: m.clone(),
            s: s.to_string(),
        })
    }
}

impl From<SignedEnvelope> for Value {
    fn from(envelope: SignedEnvelope) -> Self {
        serde_json::json!({ "m": envelope.m, "s": envelope.s })
    }
}

/// An encrypted payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    /// Ciphertext with the GCM tag appended
    pub ct: String,
    /// Nonce
    pub iv: String,
    /// Key-derivation salt
    pub s: String,
}

impl EncryptedEnvelope {
    /// The `SEA{...}` wire form
    pub fn to_tagged(&self) -> Result<String> {
        tag(self)
    }

    /// Read an encrypted envelope out of any payload form
    pub fn from_value(value: &Value) -> Result<Self> {
        let parsed = parse(value);
        let object = parsed
            .as_object()
            .ok_or_else(|| Error::MalformedEnvelope("encrypted data is not an object".into()))?;
        Ok(Self {
            ct: string_field(object, "ct")?.to_string(),
            iv: string_field(object, "iv")?.to_string(),
            s: string_field(object, "s")?.to_string(),
        })
    }
}

impl From<EncryptedEnvelope> for Value {
    fn from(envelope: EncryptedEnvelope) -> Self {
        serde_json::json!({ "ct": envelope.ct, "iv": envelope.iv, "s": envelope.s })
    }
}

// ============================================================================
// TESTS
// ============================================================================
