//! # Proof of Work
//!
//! Stretches a password (or any payload) into key material with
//! PBKDF2-HMAC-SHA256, or hashes it with plain SHA-256 when asked.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                             WORK                                        │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  name starts with "sha"?                                               │
//! │     yes ──► SHA-256(serialize(data)) ──► encode                        │
//! │     no  ──► salt = options.salt                                        │
//! │                  │ else explicit salt                                  │
//! │                  │ else identity.epub   (insecure, logged)             │
//! │                  │ else 9 random bytes                                 │
//! │             PBKDF2(serialize(data), salt, 100 000 iterations, 512 bits)│
//! │             overwrite the input copy with random bytes                 │
//! │             encode (base64 unless asked otherwise)                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde_json::Value;
use zeroize::{Zeroize, Zeroizing};

use super::codec::{encode, Encoding};
use super::digest::sha256;
use super::envelope::serialize;
use super::keys::Identity;
use super::provider::CryptoProvider;
use crate::error::{Error, Result};
use crate::sea::Sea;

/// Where the work salt comes from when options do not override it
#[derive(Debug, Clone, Copy, Default)]
pub enum WorkSalt<'a> {
    /// Generate a random salt
    #[default]
    Random,
    /// Text salt, used as its UTF-8 bytes
    Text(&'a str),
    /// Raw salt bytes
    Bytes(&'a [u8]),
    /// Use the identity's `epub` (deterministic per identity)
    Pair(&'a Identity),
}

impl<'a> From<&'a str> for WorkSalt<'a> {
    fn from(text: &'a str) -> Self {
        WorkSalt::Text(text)
    }
}

impl<'a> From<&'a [u8]> for WorkSalt<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        WorkSalt::Bytes(bytes)
    }
}

impl<'a> From<&'a Identity> for WorkSalt<'a> {
    fn from(pair: &'a Identity) -> Self {
        WorkSalt::Pair(pair)
    }
}

/// Options for [`Sea::work`]
#[derive(Debug, Clone, Default)]
pub struct WorkOptions {
    /// Algorithm name; anything starting with "sha" selects SHA-256,
    /// otherwise it must be "PBKDF2"
    pub name: Option<String>,
    /// PBKDF2 iteration count
    pub iterations: Option<u32>,
    /// Salt that wins over every other salt source
    pub salt: Option<String>,
    /// PBKDF2 hash, only "SHA-256" is supported
    pub hash: Option<String>,
    /// Output length in bits
    pub length: Option<usize>,
    /// Output encoding (base64 if unset)
    pub encode: Option<Encoding>,
}

impl<P: CryptoProvider> Sea<P> {
    /// Derive key material from `data`
    pub async fn work<'s>(
        &self,
        data: impl Into<Value>,
        salt: impl Into<WorkSalt<'s>>,
        options: &WorkOptions,
    ) -> Result<String> {
        let result = self.run_work(data.into(), salt.into(), options).await;
        self.settle("work", result)
    }

    async fn run_work(
        &self,
        data: Value,
        salt: WorkSalt<'_>,
        options: &WorkOptions,
    ) -> Result<String> {
        let encoding = options.encode.unwrap_or_default();
        let name = options.name.as_deref().unwrap_or("PBKDF2");

        if name.get(..3).is_some_and(|prefix| prefix.eq_ignore_ascii_case("sha")) {
            let digest = sha256(serialize(&data)?.as_str());
            return Ok(encode(&digest, encoding));
        }
        if !name.eq_ignore_ascii_case("PBKDF2") {
            return Err(Error::ProviderFailure(format!("unsupported work algorithm: {}", name)));
        }
        if let Some(hash) = options.hash.as_deref() {
            if !hash.eq_ignore_ascii_case("SHA-256") {
                return Err(Error::ProviderFailure(format!("unsupported PBKDF2 hash: {}", hash)));
            }
        }

        let bits = options
            .length
            .unwrap_or(self.config().pbkdf2_key_bytes * 8);
        if bits == 0 || bits % 8 != 0 {
            return Err(Error::ProviderFailure(format!(
                "work length must be a positive multiple of 8 bits, got {}",
                bits
            )));
        }
        let iterations = options.iterations.unwrap_or(self.config().pbkdf2_iterations);
        let salt = self.work_salt(salt, options)?;

        let mut password = Zeroizing::new(serialize(&data)?.into_bytes());
        let derived = self
            .provider()
            .pbkdf2_sha256(&password, &salt, iterations, bits / 8)
            .await;

        // the caller's secret should not linger in this copy
        let noise = self.provider().random_bytes(password.len());
        scrub(&mut password, noise)?;

        Ok(encode(&derived?, encoding))
    }

    fn work_salt(&self, salt: WorkSalt<'_>, options: &WorkOptions) -> Result<Vec<u8>> {
        if let Some(salt) = options.salt.as_deref() {
            return Ok(salt.as_bytes().to_vec());
        }
        match salt {
            WorkSalt::Text(text) => Ok(text.as_bytes().to_vec()),
            WorkSalt::Bytes(bytes) => Ok(bytes.to_vec()),
            WorkSalt::Pair(Identity { epub: Some(epub), .. }) => {
                tracing::warn!("Work salt is an identity's public key; the result is predictable");
                Ok(epub.as_bytes().to_vec())
            }
            WorkSalt::Pair(_) | WorkSalt::Random => {
                self.provider().random_bytes(self.config().work_salt_len)
            }
        }
    }
}

/// Overwrite `buf` with noise and then zero it; the zeroing happens even
/// when no noise was available
fn scrub(buf: &mut [u8], noise: Result<Vec<u8>>) -> Result<()> {
    let outcome = noise.map(|noise| {
        buf.iter_mut().zip(noise).for_each(|(byte, n)| *byte = n);
    });
    buf.zeroize();
    outcome
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeaConfig;
    use crate::crypto::codec::decode;
    use crate::crypto::provider::NativeProvider;

    fn fast_sea() -> Sea {
        Sea::with_provider(
            NativeProvider::new(),
            SeaConfig {
                pbkdf2_iterations: 10,
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_deterministic_with_salt() {
        let sea = fast_sea();
        let opts = WorkOptions::default();
        let a = sea.work("password", "salt", &opts).await.unwrap();
        let b = sea.work("password", "salt", &opts).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(decode(&a, Encoding::Base64).unwrap().len(), 64);

        let c = sea.work("password", "other", &opts).await.unwrap();
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_random_salt_differs() {
        let sea = fast_sea();
        let opts = WorkOptions::default();
        let a = sea.work("password", WorkSalt::Random, &opts).await.unwrap();
        let b = sea.work("password", WorkSalt::Random, &opts).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_matches_provider_pbkdf2() {
        let sea = fast_sea();
        let opts = WorkOptions {
            iterations: Some(1),
            length: Some(128),
            encode: Some(Encoding::Hex),
            ..Default::default()
        };
        let out = sea.work("passwd", "salt", &opts).await.unwrap();
        assert_eq!(out, "55ac046e56e3089fec1691c22544b605");
    }

    #[tokio::test]
    async fn test_options_salt_wins() {
        let sea = fast_sea();
        let opts = WorkOptions {
            salt: Some("fixed".into()),
            ..Default::default()
        };
        let a = sea.work("pw", "ignored", &opts).await.unwrap();
        let b = sea.work("pw", WorkSalt::Random, &opts).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_pair_salt_is_epub() {
        let sea = fast_sea();
        let pair = sea.pair().await.unwrap();
        let opts = WorkOptions::default();
        let via_pair = sea.work("pw", &pair, &opts).await.unwrap();
        let via_text = sea
            .work("pw", pair.epub.as_deref().unwrap(), &opts)
            .await
            .unwrap();
        assert_eq!(via_pair, via_text);
    }

    #[tokio::test]
    async fn test_sha_name() {
        let sea = fast_sea();
        let opts = WorkOptions {
            name: Some("SHA-256".into()),
            encode: Some(Encoding::Hex),
            ..Default::default()
        };
        let out = sea.work("abc", WorkSalt::Random, &opts).await.unwrap();
        assert_eq!(
            out,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_object_payload_is_serialized() {
        let sea = fast_sea();
        let opts = WorkOptions::default();
        let a = sea
            .work(serde_json::json!({"a": 1}), "s", &opts)
            .await
            .unwrap();
        let b = sea.work(r#"{"a":1}"#, "s", &opts).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_unsupported_parameters() {
        let sea = fast_sea();
        for opts in [
            WorkOptions {
                name: Some("scrypt".into()),
                ..Default::default()
            },
            WorkOptions {
                hash: Some("SHA-1".into()),
                ..Default::default()
            },
            WorkOptions {
                length: Some(12),
                ..Default::default()
            },
        ] {
            let result = sea.work("pw", "s", &opts).await;
            assert!(matches!(result, Err(Error::ProviderFailure(_))));
        }
    }

    #[test]
    fn test_scrub_zeroes_without_noise() {
        let mut buf = b"hunter2".to_vec();
        let result = scrub(&mut buf, Err(Error::ProviderFailure("random source".into())));
        assert!(matches!(result, Err(Error::ProviderFailure(_))));
        assert!(buf.iter().all(|b| *b == 0));

        let mut buf = b"hunter2".to_vec();
        scrub(&mut buf, Ok(vec![7; 7])).unwrap();
        assert!(buf.iter().all(|b| *b == 0));
    }
}
