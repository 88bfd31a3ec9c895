//! # Encryption
//!
//! AES-256-GCM over the serialized payload.
//!
//! ## Key Derivation
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CIPHER KEY DERIVATION                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   secret ── identity.epriv, a shared secret, or any passphrase         │
//! │   salt   ── 9 random bytes, one fresh set per message                  │
//! │                                                                         │
//! │   key = SHA-256( secret ‖ text_form(salt) )                            │
//! │                                                                         │
//! │   The key is imported as a non-extractable AES-GCM key and never       │
//! │   leaves the provider call.                                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A 15-byte nonce is generated per message. Every envelope field is written
//! in the same encoding (base64 unless the caller asks otherwise). If
//! decryption fails in the requested encoding it is retried once with the
//! text form, which some older peers used by mistake.

use serde_json::Value;
use zeroize::Zeroizing;

use super::codec::{decode, encode, Buffer, Encoding};
use super::digest::sha256;
use super::envelope::{parse_text, serialize, EncryptedEnvelope};
use super::keys::Identity;
use super::provider::{CryptoProvider, AES_KEY_SIZE};
use crate::config::SUPPORTED_IV_LENGTHS;
use crate::error::{Error, Result};
use crate::resolver::{ResolvePurpose, ResolveRequest};
use crate::sea::Sea;

/// The key material an encryption call is given
#[derive(Debug, Clone, Copy)]
pub enum CipherKey<'a> {
    /// Use the identity's `epriv`
    Pair(&'a Identity),
    /// Use this text directly (a shared secret or passphrase)
    Secret(&'a str),
    /// Ask the context's resolver
    Resolve,
}

impl<'a> From<&'a Identity> for CipherKey<'a> {
    fn from(pair: &'a Identity) -> Self {
        CipherKey::Pair(pair)
    }
}

impl<'a> From<&'a str> for CipherKey<'a> {
    fn from(secret: &'a str) -> Self {
        CipherKey::Secret(secret)
    }
}

impl<'a> From<&'a String> for CipherKey<'a> {
    fn from(secret: &'a String) -> Self {
        CipherKey::Secret(secret.as_str())
    }
}

impl<'a> From<Option<&'a Identity>> for CipherKey<'a> {
    fn from(pair: Option<&'a Identity>) -> Self {
        pair.map_or(CipherKey::Resolve, CipherKey::Pair)
    }
}

/// Options for [`Sea::encrypt`] and [`Sea::decrypt`]
#[derive(Debug, Clone, Default)]
pub struct CipherOptions {
    /// Encoding of the envelope fields (base64 if unset)
    pub encode: Option<Encoding>,
    /// Fixed key-derivation salt instead of a random one
    pub salt: Option<Vec<u8>>,
    /// Fixed nonce instead of a random one
    pub iv: Option<Vec<u8>>,
    /// Reason passed to the key resolver
    pub why: Option<String>,
}

/// Derive the AES key for a secret and salt
pub fn cipher_key(secret: &str, salt: &[u8]) -> Zeroizing<[u8; AES_KEY_SIZE]> {
    let mut combined = Zeroizing::new(String::with_capacity(secret.len() + salt.len()));
    combined.push_str(secret);
    combined.push_str(&Buffer::from_bytes(salt).to_string_as(Encoding::Utf8));
    Zeroizing::new(sha256(combined.as_str()))
}

impl<P: CryptoProvider> Sea<P> {
    /// Encrypt a payload and return the tagged `SEA{"ct":..,"iv":..,"s":..}` form
    pub async fn encrypt<'k>(
        &self,
        data: impl Into<Value>,
        key: impl Into<CipherKey<'k>>,
        options: &CipherOptions,
    ) -> Result<String> {
        let result = match self.seal(data.into(), key.into(), options).await {
            Ok(envelope) => envelope.to_tagged(),
            Err(e) => Err(e),
        };
        self.settle("encrypt", result)
    }

    /// Encrypt a payload and return the envelope object
    pub async fn encrypt_raw<'k>(
        &self,
        data: impl Into<Value>,
        key: impl Into<CipherKey<'k>>,
        options: &CipherOptions,
    ) -> Result<EncryptedEnvelope> {
        let result = self.seal(data.into(), key.into(), options).await;
        self.settle("encrypt", result)
    }

    /// Decrypt an envelope and return the parsed plaintext
    pub async fn decrypt<'k>(
        &self,
        data: impl Into<Value>,
        key: impl Into<CipherKey<'k>>,
        options: &CipherOptions,
    ) -> Result<Value> {
        let result = self.open(data.into(), key.into(), options).await;
        self.settle("decrypt", result)
    }

    async fn cipher_secret(
        &self,
        key: CipherKey<'_>,
        what: &Value,
        how: ResolvePurpose,
        why: Option<&String>,
    ) -> Result<Zeroizing<String>> {
        match key {
            CipherKey::Secret(secret) => return Ok(Zeroizing::new(secret.to_string())),
            CipherKey::Pair(pair) => {
                if let Some(epriv) = pair.epriv.as_deref() {
                    return Ok(Zeroizing::new(epriv.to_string()));
                }
            }
            CipherKey::Resolve => {}
        }

        let resolved = self
            .resolve_identity(ResolveRequest {
                what: what.clone(),
                how,
                why: why.cloned(),
            })
            .await?;
        resolved
            .epriv
            .as_deref()
            .map(|epriv| Zeroizing::new(epriv.to_string()))
            .ok_or_else(|| Error::MissingKey("no encryption key".into()))
    }

    async fn seal(
        &self,
        data: Value,
        key: CipherKey<'_>,
        options: &CipherOptions,
    ) -> Result<EncryptedEnvelope> {
        let secret = self
            .cipher_secret(key, &data, ResolvePurpose::Encrypt, options.why.as_ref())
            .await?;
        let encoding = options.encode.unwrap_or_default();

        let salt = match &options.salt {
            Some(salt) => salt.clone(),
            None => self.provider().random_bytes(self.config().cipher_salt_len)?,
        };
        let iv = match &options.iv {
            Some(iv) => iv.clone(),
            None => self.provider().random_bytes(self.config().cipher_iv_len)?,
        };
        if !SUPPORTED_IV_LENGTHS.contains(&iv.len()) {
            return Err(Error::ProviderFailure(format!(
                "nonce must be one of {:?} bytes, got {}",
                SUPPORTED_IV_LENGTHS,
                iv.len()
            )));
        }

        let plaintext = Zeroizing::new(serialize(&data)?);
        let aes_key = cipher_key(&secret, &salt);
        let ciphertext = self
            .provider()
            .aes_gcm_encrypt(&aes_key, &iv, plaintext.as_bytes())
            .await?;

        Ok(EncryptedEnvelope {
            ct: encode(&ciphertext, encoding),
            iv: encode(&iv, encoding),
            s: encode(&salt, encoding),
        })
    }

    async fn open(
        &self,
        data: Value,
        key: CipherKey<'_>,
        options: &CipherOptions,
    ) -> Result<Value> {
        let secret = self
            .cipher_secret(key, &data, ResolvePurpose::Decrypt, options.why.as_ref())
            .await?;
        let envelope = EncryptedEnvelope::from_value(&data)?;
        let encoding = options.encode.unwrap_or_default();
        let may_retry = encoding != Encoding::Utf8 && self.config().fallback > 0;

        match self.open_with(&secret, &envelope, encoding).await {
            Err(first) if may_retry && first.is_retryable() => {
                tracing::debug!(error = %first, "Decrypt failed, retrying with text-form fields");
                let plain = self.open_with(&secret, &envelope, Encoding::Utf8).await?;
                tracing::warn!("Envelope decrypted only with text-form fields");
                Ok(plain)
            }
            other => other,
        }
    }

    async fn open_with(
        &self,
        secret: &str,
        envelope: &EncryptedEnvelope,
        encoding: Encoding,
    ) -> Result<Value> {
        let salt = decode(&envelope.s, encoding)?;
        let iv = decode(&envelope.iv, encoding)?;
        let ciphertext = decode(&envelope.ct, encoding)?;

        let aes_key = cipher_key(secret, &salt);
        let plaintext = Zeroizing::new(
            self.provider()
                .aes_gcm_decrypt(&aes_key, &iv, &ciphertext)
                .await?,
        );
        let text = std::str::from_utf8(&plaintext)
            .map_err(|e| Error::Encoding(format!("plaintext is not UTF-8: {}", e)))?;
        Ok(parse_text(text))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::StaticResolver;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_round_trip_with_pair() {
        let sea = Sea::new();
        let pair = sea.pair().await.unwrap();
        let opts = CipherOptions::default();

        let sealed = sea.encrypt("hello", &pair, &opts).await.unwrap();
        assert!(sealed.starts_with("SEA{\"ct\":"));

        let plain = sea.decrypt(sealed, &pair, &opts).await.unwrap();
        assert_eq!(plain, json!("hello"));
    }

    #[tokio::test]
    async fn test_round_trip_object_with_passphrase() {
        let sea = Sea::new();
        let opts = CipherOptions::default();
        let data = json!({"x": [1, 2, 3], "y": "z"});

        let envelope = sea.encrypt_raw(data.clone(), "passphrase", &opts).await.unwrap();
        let plain = sea.decrypt(envelope, "passphrase", &opts).await.unwrap();
        assert_eq!(plain, data);
    }

    #[tokio::test]
    async fn test_tag_like_text_round_trips() {
        let sea = Sea::new();
        let pair = sea.pair().await.unwrap();
        let opts = CipherOptions::default();

        for text in ["SEA123", "SEAtrue", "SEAnull", "SEA[1,2]"] {
            let sealed = sea.encrypt(text, &pair, &opts).await.unwrap();
            assert_eq!(sea.decrypt(sealed, &pair, &opts).await.unwrap(), json!(text));
        }
    }

    #[tokio::test]
    async fn test_same_input_encrypts_differently() {
        let sea = Sea::new();
        let opts = CipherOptions::default();

        let a = sea.encrypt_raw("same", "k", &opts).await.unwrap();
        let b = sea.encrypt_raw("same", "k", &opts).await.unwrap();
        assert_ne!(a.ct, b.ct);
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.s, b.s);

        assert_eq!(sea.decrypt(a, "k", &opts).await.unwrap(), json!("same"));
        assert_eq!(sea.decrypt(b, "k", &opts).await.unwrap(), json!("same"));
    }

    #[tokio::test]
    async fn test_field_sizes() {
        let sea = Sea::new();
        let envelope = sea
            .encrypt_raw("abc", "k", &CipherOptions::default())
            .await
            .unwrap();
        assert_eq!(decode(&envelope.s, Encoding::Base64).unwrap().len(), 9);
        assert_eq!(decode(&envelope.iv, Encoding::Base64).unwrap().len(), 15);
        assert_eq!(decode(&envelope.ct, Encoding::Base64).unwrap().len(), 3 + 16);
    }

    #[tokio::test]
    async fn test_wrong_secret_fails() {
        let sea = Sea::new();
        let opts = CipherOptions::default();
        let sealed = sea.encrypt("hello", "right", &opts).await.unwrap();
        let result = sea.decrypt(sealed, "wrong", &opts).await;
        assert!(matches!(result, Err(Error::ProviderFailure(_))));
        assert!(sea.last_error().is_some());
    }

    #[tokio::test]
    async fn test_hex_encoding_and_fixed_parameters() {
        let sea = Sea::new();
        let opts = CipherOptions {
            encode: Some(Encoding::Hex),
            salt: Some(vec![1; 9]),
            iv: Some(vec![2; 12]),
            why: None,
        };
        let a = sea.encrypt_raw("same", "k", &opts).await.unwrap();
        let b = sea.encrypt_raw("same", "k", &opts).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.iv, "020202020202020202020202");

        let plain = sea.decrypt(a, "k", &opts).await.unwrap();
        assert_eq!(plain, json!("same"));
    }

    #[tokio::test]
    async fn test_text_form_envelope_is_retried() {
        let sea = Sea::new();
        let text_opts = CipherOptions {
            encode: Some(Encoding::Utf8),
            ..Default::default()
        };
        let sealed = sea.encrypt("legacy", "k", &text_opts).await.unwrap();

        // reader asks for base64, falls back to the text form
        let plain = sea
            .decrypt(sealed, "k", &CipherOptions::default())
            .await
            .unwrap();
        assert_eq!(plain, json!("legacy"));
    }

    #[tokio::test]
    async fn test_unsupported_iv_length() {
        let sea = Sea::new();
        let opts = CipherOptions {
            iv: Some(vec![0; 16]),
            ..Default::default()
        };
        assert!(sea.encrypt("x", "k", &opts).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_key_without_resolver() {
        let sea = Sea::new();
        let opts = CipherOptions::default();
        let result = sea.encrypt("x", CipherKey::Resolve, &opts).await;
        assert!(matches!(result, Err(Error::MissingKey(_))));

        let pair = sea.pair().await.unwrap();
        let result = sea.encrypt("x", &pair.public(), &opts).await;
        assert!(matches!(result, Err(Error::MissingKey(_))));
    }

    #[tokio::test]
    async fn test_resolver_supplies_key() {
        let pair = Sea::new().pair().await.unwrap();
        let sea = Sea::new().with_resolver(Arc::new(StaticResolver(pair.clone())));
        let opts = CipherOptions::default();

        let sealed = sea.encrypt("x", CipherKey::Resolve, &opts).await.unwrap();
        assert_eq!(sea.decrypt(sealed, &pair, &opts).await.unwrap(), json!("x"));
    }

    #[test]
    fn test_cipher_key_uses_text_form_of_salt() {
        let salt = [0x41u8, 0xe9];
        let expected = sha256("secretA\u{e9}");
        assert_eq!(*cipher_key("secret", &salt), expected);
    }
}
