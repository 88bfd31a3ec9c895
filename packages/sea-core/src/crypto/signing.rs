//! # Signing
//!
//! ECDSA-P256 signatures over the SHA-256 digest of a serialized payload.
//!
//! ## Verification Chain
//!
//! Peers on the network have signed in slightly different ways over time.
//! Verification tries each known way in order and accepts the first match:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      VERIFICATION STRATEGIES                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   #  digest                          signature decoded as              │
//! │   ─  ──────                          ────────────────────              │
//! │   1  sha256(serialize(m))            base64                            │
//! │   2  sha256(serialize(m))            text form                         │
//! │   3  sha256(legacy_text(parse(m)))   base64      (fallback >= 2)       │
//! │   4  sha256(legacy_text(parse(m)))   text form   (fallback >= 2)       │
//! │                                                                         │
//! │   all fail ──► SignatureMismatch                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Imported public keys are cached per context, keyed by the `x.y` string.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;

use super::codec::{decode, encode, Encoding};
use super::digest::{sha256, sha256_value};
use super::envelope::{legacy_text, parse, SignedEnvelope};
use super::keys::{signing_jwk, Identity};
use super::provider::CryptoProvider;
use crate::config::SeaConfig;
use crate::error::{Error, Result};
use crate::sea::Sea;

// ============================================================================
// STRATEGIES
// ============================================================================

/// How the message digest is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestStrategy {
    /// SHA-256 of the serialized message
    Current,
    /// SHA-256 of the string-coerced message, as older peers signed
    Legacy,
}

/// A single verification attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyStrategy {
    /// How to hash the message
    pub digest: DigestStrategy,
    /// How to read the signature string
    pub signature: Encoding,
}

impl VerifyStrategy {
    const fn new(digest: DigestStrategy, signature: Encoding) -> Self {
        Self { digest, signature }
    }

    fn digest(&self, message: &Value) -> Result<[u8; 32]> {
        match self.digest {
            DigestStrategy::Current => sha256_value(message),
            DigestStrategy::Legacy => Ok(sha256(legacy_text(&parse(message)).as_str())),
        }
    }
}

const CURRENT_STRATEGIES: [VerifyStrategy; 2] = [
    VerifyStrategy::new(DigestStrategy::Current, Encoding::Base64),
    VerifyStrategy::new(DigestStrategy::Current, Encoding::Utf8),
];

const LEGACY_STRATEGIES: [VerifyStrategy; 2] = [
    VerifyStrategy::new(DigestStrategy::Legacy, Encoding::Base64),
    VerifyStrategy::new(DigestStrategy::Legacy, Encoding::Utf8),
];

/// The ordered strategy list for a configuration
pub fn strategy_chain(config: &SeaConfig) -> Vec<VerifyStrategy> {
    let mut chain = CURRENT_STRATEGIES.to_vec();
    if config.legacy_digest_enabled() {
        chain.extend_from_slice(&LEGACY_STRATEGIES);
    }
    chain
}

// ============================================================================
// KEY CACHE
// ============================================================================

/// Imported verification keys, keyed by public key string
pub struct KeyCache<K> {
    entries: RwLock<HashMap<String, K>>,
}

impl<K: Clone> KeyCache<K> {
    /// An empty cache
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a key
    pub fn get(&self, pub_key: &str) -> Option<K> {
        self.entries.read().get(pub_key).cloned()
    }

    /// Store a key, keeping whichever import won a race
    pub fn insert(&self, pub_key: &str, key: K) -> K {
        self.entries
            .write()
            .entry(pub_key.to_string())
            .or_insert(key)
            .clone()
    }

    /// Number of cached keys
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<K: Clone> Default for KeyCache<K> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

impl<P: CryptoProvider> Sea<P> {
    /// Sign a payload and return the tagged `SEA{"m":..,"s":..}` form
    pub async fn sign(&self, data: impl Into<Value>, pair: &Identity) -> Result<String> {
        let result = match self.sign_envelope(data.into(), pair).await {
            Ok(envelope) => envelope.to_tagged(),
            Err(e) => Err(e),
        };
        self.settle("sign", result)
    }

    /// Sign a payload and return the envelope object
    pub async fn sign_raw(
        &self,
        data: impl Into<Value>,
        pair: &Identity,
    ) -> Result<SignedEnvelope> {
        let result = self.sign_envelope(data.into(), pair).await;
        self.settle("sign", result)
    }

    async fn sign_envelope(&self, data: Value, pair: &Identity) -> Result<SignedEnvelope> {
        let priv_key = pair
            .priv_key
            .as_deref()
            .ok_or_else(|| Error::MissingKey("no signing key".into()))?;

        let m = parse(&data);
        let digest = sha256_value(&m)?;
        let jwk = signing_jwk(&pair.pub_key, Some(priv_key))?;
        let signature = self.provider().sign(&jwk, &digest).await?;

        Ok(SignedEnvelope {
            m,
            s: encode(&signature, Encoding::Base64),
        })
    }

    /// Verify a signed payload against a public key and return the message
    pub async fn verify(&self, data: impl Into<Value>, pub_key: &str) -> Result<Value> {
        let result = self.verify_envelope(data.into(), pub_key).await;
        self.settle("verify", result)
    }

    async fn verify_envelope(&self, data: Value, pub_key: &str) -> Result<Value> {
        let envelope = SignedEnvelope::from_value(&data)?;
        let key = self.verify_key(pub_key).await?;

        let mut last_failure = Error::SignatureMismatch;
        for (attempt, strategy) in strategy_chain(self.config()).into_iter().enumerate() {
            let signature = match decode(&envelope.s, strategy.signature) {
                Ok(bytes) => bytes,
                Err(e) => {
                    last_failure = e;
                    continue;
                }
            };
            let digest = strategy.digest(&envelope.m)?;

            match self.provider().verify(&key, &signature, &digest).await {
                Ok(true) => {
                    if attempt > 0 {
                        tracing::warn!(?strategy, "Signature accepted by fallback verification");
                    }
                    return Ok(parse(&envelope.m));
                }
                Ok(false) => last_failure = Error::SignatureMismatch,
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => last_failure = e,
            }
        }
        Err(last_failure)
    }

    async fn verify_key(&self, pub_key: &str) -> Result<P::VerifyKey> {
        if let Some(key) = self.key_cache.get(pub_key) {
            return Ok(key);
        }
        let jwk = signing_jwk(pub_key, None)?;
        let key = self.provider().import_verify_key(&jwk).await?;
        Ok(self.key_cache.insert(pub_key, key))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::provider::NativeProvider;
    use serde_json::json;

    #[tokio::test]
    async fn test_sign_verify_string() {
        let sea = Sea::new();
        let pair = sea.pair().await.unwrap();

        let signed = sea.sign("hello", &pair).await.unwrap();
        assert!(signed.starts_with("SEA{\"m\":\"hello\",\"s\":\""));

        let message = sea.verify(signed, &pair.pub_key).await.unwrap();
        assert_eq!(message, json!("hello"));
    }

    #[tokio::test]
    async fn test_sign_verify_object() {
        let sea = Sea::new();
        let pair = sea.pair().await.unwrap();

        let data = json!({"name": "alice", "age": 7});
        let signed = sea.sign(data.clone(), &pair).await.unwrap();
        assert_eq!(sea.verify(signed, &pair.pub_key).await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_json_text_is_signed_parsed() {
        let sea = Sea::new();
        let pair = sea.pair().await.unwrap();

        let envelope = sea.sign_raw(r#"{"a":1}"#, &pair).await.unwrap();
        assert_eq!(envelope.m, json!({"a": 1}));

        let message = sea.verify(envelope, &pair.pub_key).await.unwrap();
        assert_eq!(message, json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_wrong_key_is_mismatch() {
        let sea = Sea::new();
        let alice = sea.pair().await.unwrap();
        let bob = sea.pair().await.unwrap();

        let signed = sea.sign("hello", &alice).await.unwrap();
        let result = sea.verify(signed, &bob.pub_key).await;
        assert_eq!(result, Err(Error::SignatureMismatch));
        assert_eq!(sea.last_error(), Some(Error::SignatureMismatch));
    }

    #[tokio::test]
    async fn test_tampered_message_is_mismatch() {
        let sea = Sea::new();
        let pair = sea.pair().await.unwrap();

        let mut envelope = sea.sign_raw("hello", &pair).await.unwrap();
        envelope.m = json!("hellO");
        let result = sea.verify(envelope, &pair.pub_key).await;
        assert_eq!(result, Err(Error::SignatureMismatch));
    }

    #[tokio::test]
    async fn test_sign_without_private_key() {
        let sea = Sea::new();
        let pair = sea.pair().await.unwrap();
        let result = sea.sign("hello", &pair.public()).await;
        assert!(matches!(result, Err(Error::MissingKey(_))));
    }

    #[tokio::test]
    async fn test_verify_malformed() {
        let sea = Sea::new();
        let pair = sea.pair().await.unwrap();
        let result = sea.verify("not signed", &pair.pub_key).await;
        assert!(matches!(result, Err(Error::MalformedEnvelope(_))));
    }

    #[tokio::test]
    async fn test_legacy_object_signature() {
        let sea = Sea::new();
        let pair = sea.pair().await.unwrap();

        // older peers hashed the coerced text of the message
        let digest = sha256("[object Object]");
        let jwk = signing_jwk(&pair.pub_key, pair.priv_key.as_deref()).unwrap();
        let sig = sea.provider().sign(&jwk, &digest).await.unwrap();
        let envelope = json!({"m": {"any": "thing"}, "s": encode(&sig, Encoding::Base64)});

        let message = sea.verify(envelope.clone(), &pair.pub_key).await.unwrap();
        assert_eq!(message, json!({"any": "thing"}));

        let strict = Sea::with_provider(
            NativeProvider::new(),
            SeaConfig {
                fallback: 1,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(
            strict.verify(envelope, &pair.pub_key).await,
            Err(Error::SignatureMismatch)
        );
    }

    #[tokio::test]
    async fn test_text_form_signature() {
        let sea = Sea::new();
        let pair = sea.pair().await.unwrap();

        let digest = sha256("payload");
        let jwk = signing_jwk(&pair.pub_key, pair.priv_key.as_deref()).unwrap();
        let sig = sea.provider().sign(&jwk, &digest).await.unwrap();
        let envelope = json!({"m": "payload", "s": encode(&sig, Encoding::Utf8)});

        assert_eq!(
            sea.verify(envelope, &pair.pub_key).await.unwrap(),
            json!("payload")
        );
    }

    #[tokio::test]
    async fn test_legacy_text_form_signature() {
        let sea = Sea::new();
        let pair = sea.pair().await.unwrap();

        // legacy digest with the signature carried in text form
        let digest = sha256("[object Object]");
        let jwk = signing_jwk(&pair.pub_key, pair.priv_key.as_deref()).unwrap();
        let sig = sea.provider().sign(&jwk, &digest).await.unwrap();
        let envelope = json!({"m": {"old": "peer"}, "s": encode(&sig, Encoding::Utf8)});

        assert_eq!(
            sea.verify(envelope.clone(), &pair.pub_key).await.unwrap(),
            json!({"old": "peer"})
        );

        let strict = Sea::with_provider(
            NativeProvider::new(),
            SeaConfig {
                fallback: 1,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(
            strict.verify(envelope, &pair.pub_key).await,
            Err(Error::SignatureMismatch)
        );
    }

    #[tokio::test]
    async fn test_tampered_signature_is_mismatch() {
        let sea = Sea::new();
        let pair = sea.pair().await.unwrap();

        let mut envelope = sea.sign_raw("hello", &pair).await.unwrap();
        let mut sig = decode(&envelope.s, Encoding::Base64).unwrap();
        sig[10] ^= 0x01;
        envelope.s = encode(&sig, Encoding::Base64);

        let result = sea.verify(envelope, &pair.pub_key).await;
        assert_eq!(result, Err(Error::SignatureMismatch));
    }

    #[tokio::test]
    async fn test_tag_like_text_round_trips() {
        let sea = Sea::new();
        let pair = sea.pair().await.unwrap();

        for text in ["SEA123", "SEAtrue", "SEAnull", "SEA[1,2]"] {
            let signed = sea.sign(text, &pair).await.unwrap();
            assert_eq!(sea.verify(signed, &pair.pub_key).await.unwrap(), json!(text));
        }
    }

    #[tokio::test]
    async fn test_floats_hash_as_javascript_writes_them() {
        let sea = Sea::new();
        let pair = sea.pair().await.unwrap();
        let jwk = signing_jwk(&pair.pub_key, pair.priv_key.as_deref()).unwrap();

        // a JavaScript peer signs JSON.stringify(m) and sends m inside the envelope
        for js_text in [
            r#"{"v":0.0000015}"#,
            r#"{"v":100000000000000000000}"#,
            r#"{"v":2.5}"#,
        ] {
            let sig = sea.provider().sign(&jwk, &sha256(js_text)).await.unwrap();
            let s = encode(&sig, Encoding::Base64);
            let wire = format!(r#"SEA{{"m":{},"s":"{}"}}"#, js_text, s);

            let message = sea.verify(wire, &pair.pub_key).await.unwrap();
            assert_eq!(message, parse(&json!(js_text)));
        }

        // and what we sign hashes the same text
        let signed = sea.sign(json!({"v": 1.5e-6}), &pair).await.unwrap();
        assert!(signed.starts_with(r#"SEA{"m":{"v":0.0000015},"s":""#));
        let envelope = SignedEnvelope::from_value(&json!(signed)).unwrap();
        let sig = decode(&envelope.s, Encoding::Base64).unwrap();
        let public = signing_jwk(&pair.pub_key, None).unwrap();
        let key = sea.provider().import_verify_key(&public).await.unwrap();
        let digest = sha256(r#"{"v":0.0000015}"#);
        assert!(sea.provider().verify(&key, &sig, &digest).await.unwrap());
    }

    #[tokio::test]
    async fn test_key_cache_reused() {
        let sea = Sea::new();
        let pair = sea.pair().await.unwrap();
        let signed = sea.sign("x", &pair).await.unwrap();

        sea.verify(signed.clone(), &pair.pub_key).await.unwrap();
        sea.verify(signed, &pair.pub_key).await.unwrap();
        assert_eq!(sea.cached_keys(), 1);
    }

    #[test]
    fn test_strategy_chain_order() {
        let chain = strategy_chain(&SeaConfig::default());
        assert_eq!(chain.len(), 4);
        assert_eq!(chain[0].digest, DigestStrategy::Current);
        assert_eq!(chain[0].signature, Encoding::Base64);
        assert_eq!(chain[3].digest, DigestStrategy::Legacy);
        assert_eq!(chain[3].signature, Encoding::Utf8);

        let short = strategy_chain(&SeaConfig {
            fallback: 0,
            ..Default::default()
        });
        assert_eq!(short.len(), 2);
    }
}
