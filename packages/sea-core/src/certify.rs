//! # Certificates
//!
//! A certificate is a signed policy document in which an authority grants
//! read or write rights over parts of its graph to a set of certificants.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CERTIFICATE DOCUMENT                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   c   certificants  "*" | "<pub>" | ["<pub>", ...]        (required)   │
//! │   e   expiry        epoch seconds                          (optional)   │
//! │   r   read policy   path rule or pattern                   (optional)   │
//! │   w   write policy  path rule or pattern                   (optional)   │
//! │   rb  read block    path of a block list                   (optional)   │
//! │   wb  write block   path of a block list                   (optional)   │
//! │                                                                         │
//! │   At least one of r / w must be present.                               │
//! │   Keys always appear in this order.                                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Trust
//!
//! The signed document does not name its authority. A certificate proves
//! nothing until it is stored inside the authority's own namespace, and
//! checking that is up to the graph engine that stores it.

use serde_json::{Map, Value};

use crate::crypto::envelope::{is_falsy, js_number, SignedEnvelope};
use crate::crypto::provider::CryptoProvider;
use crate::crypto::Identity;
use crate::error::{Error, Result};
use crate::sea::Sea;

/// LEX keys that mark a bare object as a write policy
const LEX_KEYS: [&str; 7] = ["+", "#", ".", "=", "*", ">", "<"];

// ============================================================================
// CERTIFICANTS
// ============================================================================

/// Who a certificate grants rights to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Certificants {
    /// Everyone
    Everyone,
    /// A single public key
    One(String),
    /// Several public keys, in order
    Many(Vec<String>),
}

impl Certificants {
    /// Normalize any accepted certificant form
    ///
    /// Accepts `"*"`, a public key string, an object with a `pub` field, or a
    /// list of strings and such objects. A `*` anywhere means everyone.
    pub fn from_value(value: &Value) -> Result<Self> {
        let none = || Error::PolicyInvalid("no certificant found".into());

        match value {
            Value::String(s) if s.contains('*') => Ok(Certificants::Everyone),
            Value::String(s) if !s.is_empty() => Ok(Certificants::One(s.clone())),
            Value::Object(object) => object
                .get("pub")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(|s| Certificants::One(s.to_string()))
                .ok_or_else(none),
            Value::Array(items) => {
                if items.iter().any(|item| item.as_str() == Some("*")) {
                    return Ok(Certificants::Everyone);
                }
                let keys: Vec<String> = items.iter().filter_map(certificant_key).collect();
                match (items.len(), keys.len()) {
                    (_, 0) => Err(none()),
                    (1, _) => Ok(Certificants::One(keys[0].clone())),
                    _ => Ok(Certificants::Many(keys)),
                }
            }
            _ => Err(none()),
        }
    }

    /// Whether `pub_key` is covered
    pub fn includes(&self, pub_key: &str) -> bool {
        match self {
            Certificants::Everyone => true,
            Certificants::One(key) => key == pub_key,
            Certificants::Many(keys) => keys.iter().any(|k| k == pub_key),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Certificants::Everyone => Value::String("*".into()),
            Certificants::One(key) => Value::String(key.clone()),
            Certificants::Many(keys) => Value::from(keys.clone()),
        }
    }
}

fn certificant_key(item: &Value) -> Option<String> {
    match item {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(object) => object
            .get("pub")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

// ============================================================================
// POLICY & OPTIONS
// ============================================================================

/// Read and write rules, kept as opaque JSON
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Policy {
    /// Read rule
    pub read: Option<Value>,
    /// Write rule
    pub write: Option<Value>,
}

impl Policy {
    /// Interpret a policy argument
    ///
    /// `{read, write}` objects are taken apart. A bare string, a list, or a
    /// LEX-shaped object is a write rule.
    pub fn from_value(value: &Value) -> Self {
        let field = |name: &str| value.get(name).filter(|v| !is_falsy(v)).cloned();
        let read = field("read");
        let write = field("write").or_else(|| {
            let bare = match value {
                Value::String(s) => !s.is_empty(),
                Value::Array(_) => true,
                Value::Object(object) => LEX_KEYS
                    .iter()
                    .any(|k| object.get(*k).is_some_and(|v| !is_falsy(v))),
                _ => false,
            };
            bare.then(|| value.clone())
        });
        Self { read, write }
    }
}

/// Options for [`Sea::certify`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CertifyOptions {
    /// Expiry, epoch seconds
    pub expiry: Option<f64>,
    /// Block list reference (`{read?, write?}` or a bare write path)
    pub block: Option<Value>,
}

impl CertifyOptions {
    /// Read options from JSON
    ///
    /// `expiry` may be a number or a numeric string. The block list may be
    /// given as `block`, `blacklist` or `ban`.
    pub fn from_value(value: &Value) -> Self {
        let expiry = match value.get("expiry") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => parse_float_prefix(s),
            _ => None,
        };
        let block = ["block", "blacklist", "ban"]
            .iter()
            .filter_map(|k| value.get(*k))
            .find(|v| !is_falsy(v))
            .cloned();
        Self { expiry, block }
    }

    fn read_block(&self) -> Option<Value> {
        let read = self.block.as_ref()?.get("read")?;
        is_block_reference(read).then(|| read.clone())
    }

    fn write_block(&self) -> Option<Value> {
        let block = self.block.as_ref()?;
        if block.is_string() {
            return Some(block.clone());
        }
        let write = block.get("write")?;
        is_block_reference(write).then(|| write.clone())
    }
}

fn is_block_reference(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.is_empty(),
        Value::Object(object) => object.get("#").is_some_and(|v| !is_falsy(v)),
        _ => false,
    }
}

/// Longest leading decimal number in `text`, as a float
fn parse_float_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start();
    (1..=text.len())
        .rev()
        .filter(|&end| text.is_char_boundary(end))
        .find_map(|end| text[..end].parse::<f64>().ok())
        .filter(|f| f.is_finite())
}

// ============================================================================
// CERTIFICATE
// ============================================================================

/// A certificate document
#[derive(Debug, Clone, PartialEq)]
pub struct Certificate {
    /// Who is granted rights
    pub certificants: Certificants,
    /// Expiry, epoch seconds
    pub expiry: Option<f64>,
    /// Read rule
    pub read: Option<Value>,
    /// Write rule
    pub write: Option<Value>,
    /// Read block list reference
    pub read_block: Option<Value>,
    /// Write block list reference
    pub write_block: Option<Value>,
}

impl Certificate {
    /// The document in wire form, keys in `c, e, r, w, rb, wb` order
    pub fn to_value(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("c".into(), self.certificants.to_value());
        if let Some(e) = self.expiry {
            doc.insert("e".into(), js_number(e));
        }
        let optional = [
            ("r", &self.read),
            ("w", &self.write),
            ("rb", &self.read_block),
            ("wb", &self.write_block),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                doc.insert(key.into(), value.clone());
            }
        }
        Value::Object(doc)
    }

    /// Read a document, as returned by [`Sea::verify`]
    pub fn from_message(message: &Value) -> Result<Self> {
        let object = message
            .as_object()
            .ok_or_else(|| Error::PolicyInvalid("certificate is not an object".into()))?;
        let certificants = Certificants::from_value(object.get("c").unwrap_or(&Value::Null))?;
        let field = |k: &str| object.get(k).filter(|v| !is_falsy(v)).cloned();

        let cert = Self {
            certificants,
            expiry: object.get("e").and_then(Value::as_f64),
            read: field("r"),
            write: field("w"),
            read_block: field("rb"),
            write_block: field("wb"),
        };
        if cert.read.is_none() && cert.write.is_none() {
            return Err(Error::PolicyInvalid("certificate has no policy".into()));
        }
        Ok(cert)
    }

    /// Whether the certificate has expired at `now` (epoch seconds)
    pub fn is_expired_at(&self, now: f64) -> bool {
        self.expiry.is_some_and(|e| e < now)
    }

    /// Whether the certificate has expired
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
        self.is_expired_at(now)
    }

    /// Whether `pub_key` is one of the certificants
    pub fn grants(&self, pub_key: &str) -> bool {
        self.certificants.includes(pub_key)
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

impl<P: CryptoProvider> Sea<P> {
    /// Issue a certificate and return its tagged form
    pub async fn certify(
        &self,
        certificants: &Value,
        policy: &Value,
        authority: &Identity,
        options: &CertifyOptions,
    ) -> Result<String> {
        let result = match self.issue(certificants, policy, authority, options).await {
            Ok(envelope) => envelope.to_tagged(),
            Err(e) => Err(e),
        };
        self.settle("certify", result)
    }

    /// Issue a certificate and return the envelope object
    pub async fn certify_raw(
        &self,
        certificants: &Value,
        policy: &Value,
        authority: &Identity,
        options: &CertifyOptions,
    ) -> Result<SignedEnvelope> {
        let result = self.issue(certificants, policy, authority, options).await;
        self.settle("certify", result)
    }

    /// Verify a certificate against its authority and read it
    pub async fn verify_certificate(
        &self,
        certificate: impl Into<Value>,
        authority_pub: &str,
    ) -> Result<Certificate> {
        let result = match self.verify(certificate, authority_pub).await {
            Ok(message) => Certificate::from_message(&message),
            Err(e) => Err(e),
        };
        self.settle("certify", result)
    }

    async fn issue(
        &self,
        certificants: &Value,
        policy: &Value,
        authority: &Identity,
        options: &CertifyOptions,
    ) -> Result<SignedEnvelope> {
        let certificants = Certificants::from_value(certificants)?;
        let policy = Policy::from_value(policy);
        if policy.read.is_none() && policy.write.is_none() {
            return Err(Error::PolicyInvalid("no policy found".into()));
        }

        let certificate = Certificate {
            certificants,
            expiry: options.expiry.filter(|e| *e != 0.0 && e.is_finite()),
            read: policy.read,
            write: policy.write,
            read_block: options.read_block(),
            write_block: options.write_block(),
        };
        tracing::debug!(
            expires = ?certificate.expiry,
            everyone = matches!(certificate.certificants, Certificants::Everyone),
            "Issuing certificate"
        );

        self.sign_raw(certificate.to_value(), authority).await
    }
}

// ============================================================================
// TESTS
// ============================================================================
