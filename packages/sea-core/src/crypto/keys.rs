//! # Identities
//!
//! An identity is two P-256 keypairs: one for signing, one for key
//! agreement. Each public key travels as `"<x>.<y>"` (the base64url JWK
//! coordinates joined by a dot) and each private key as the base64url
//! scalar `d`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           IDENTITY                                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   pub   "x.y"  ─────► ECDSA verify key     (shared with everyone)      │
//! │   priv  "d"    ─────► ECDSA sign key       (never leaves the device)   │
//! │   epub  "x.y"  ─────► ECDH public key      (shared with everyone)      │
//! │   epriv "d"    ─────► ECDH private key     (never leaves the device)   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Private halves are zeroized when the identity is dropped.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::provider::{CryptoProvider, EcJwk, KeyUsage};
use crate::error::{Error, Result};
use crate::sea::Sea;

/// A signing keypair and an encryption keypair
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Identity {
    /// Signing public key, `x.y`
    #[serde(rename = "pub")]
    pub pub_key: String,
    /// Signing private scalar
    #[serde(rename = "priv", default, skip_serializing_if = "Option::is_none")]
    pub priv_key: Option<String>,
    /// Encryption public key, `x.y`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epub: Option<String>,
    /// Encryption private scalar
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epriv: Option<String>,
}

impl Identity {
    /// The shareable half of this identity
    pub fn public(&self) -> Identity {
        Identity {
            pub_key: self.pub_key.clone(),
            priv_key: None,
            epub: self.epub.clone(),
            epriv: None,
        }
    }

    /// Whether this identity can sign
    pub fn can_sign(&self) -> bool {
        self.priv_key.is_some()
    }

    /// Whether this identity can take part in key agreement
    pub fn can_derive(&self) -> bool {
        self.epub.is_some() && self.epriv.is_some()
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("pub", &self.pub_key)
            .field("priv", &self.priv_key.as_ref().map(|_| "<redacted>"))
            .field("epub", &self.epub)
            .field("epriv", &self.epriv.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Split a `x.y` public key string into its coordinates
pub fn split_public_key(key: &str) -> Result<(&str, &str)> {
    let mut parts = key.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(x), Some(y), None) if !x.is_empty() && !y.is_empty() => Ok((x, y)),
        _ => Err(Error::InvalidKey(format!(
            "public key must be two base64url coordinates joined by '.': {:?}",
            key
        ))),
    }
}

/// JWK for an ECDSA key, private if `d` is given
pub fn signing_jwk(pub_key: &str, d: Option<&str>) -> Result<EcJwk> {
    let (x, y) = split_public_key(pub_key)?;
    let ops: &[&str] = if d.is_some() { &["sign"] } else { &["verify"] };
    Ok(EcJwk::new(x, y, d.map(str::to_string)).with_ops(ops))
}

/// JWK for an ECDH key, private if `d` is given
pub fn agreement_jwk(epub: &str, d: Option<&str>) -> Result<EcJwk> {
    let (x, y) = split_public_key(epub)?;
    let ops: &[&str] = if d.is_some() {
        &["deriveKey", "deriveBits"]
    } else {
        &[]
    };
    Ok(EcJwk::new(x, y, d.map(str::to_string)).with_ops(ops))
}

fn join_public(jwk: &EcJwk) -> String {
    format!("{}.{}", jwk.x, jwk.y)
}

fn take_scalar(jwk: &mut EcJwk) -> Result<String> {
    jwk.d
        .take()
        .ok_or_else(|| Error::ProviderFailure("generated key was exported without d".into()))
}

impl<P: CryptoProvider> Sea<P> {
    /// Generate a fresh identity
    pub async fn pair(&self) -> Result<Identity> {
        let result = self.generate_identity().await;
        self.settle("pair", result)
    }

    async fn generate_identity(&self) -> Result<Identity> {
        let (mut signing, mut agreement) = futures::try_join!(
            self.provider().generate_key(KeyUsage::Sign),
            self.provider().generate_key(KeyUsage::Derive),
        )?;

        let identity = Identity {
            pub_key: join_public(&signing),
            priv_key: Some(take_scalar(&mut signing)?),
            epub: Some(join_public(&agreement)),
            epriv: Some(take_scalar(&mut agreement)?),
        };
        tracing::debug!(pub_key = %identity.pub_key, "Generated identity");
        Ok(identity)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::codec::from_base64url;

    #[tokio::test]
    async fn test_pair_shape() {
        let sea = Sea::new();
        let pair = sea.pair().await.unwrap();

        for public in [&pair.pub_key, pair.epub.as_ref().unwrap()] {
            let (x, y) = split_public_key(public).unwrap();
            assert_eq!(x.len(), 43);
            assert_eq!(y.len(), 43);
            assert_eq!(from_base64url(x).unwrap().len(), 32);
        }
        assert_eq!(from_base64url(pair.priv_key.as_ref().unwrap()).unwrap().len(), 32);
        assert_eq!(from_base64url(pair.epriv.as_ref().unwrap()).unwrap().len(), 32);
        assert_ne!(pair.pub_key, *pair.epub.as_ref().unwrap());
    }

    #[tokio::test]
    async fn test_pairs_are_unique() {
        let sea = Sea::new();
        let a = sea.pair().await.unwrap();
        let b = sea.pair().await.unwrap();
        assert_ne!(a.pub_key, b.pub_key);
    }

    #[tokio::test]
    async fn test_serde_field_names() {
        let pair = Sea::new().pair().await.unwrap();
        let json = serde_json::to_value(&pair).unwrap();
        assert!(json.get("pub").is_some());
        assert!(json.get("priv").is_some());
        assert!(json.get("epub").is_some());
        assert!(json.get("epriv").is_some());

        let back: Identity = serde_json::from_value(json).unwrap();
        assert_eq!(back, pair);

        let public = serde_json::to_value(pair.public()).unwrap();
        assert!(public.get("priv").is_none());
        assert!(public.get("epriv").is_none());
    }

    #[test]
    fn test_split_public_key_rejects_bad_shapes() {
        assert!(split_public_key("abc").is_err());
        assert!(split_public_key("a.b.c").is_err());
        assert!(split_public_key(".b").is_err());
        assert_eq!(split_public_key("a.b").unwrap(), ("a", "b"));
    }

    #[tokio::test]
    async fn test_debug_redacts() {
        let pair = Sea::new().pair().await.unwrap();
        let shown = format!("{:?}", pair);
        assert!(!shown.contains(pair.priv_key.as_ref().unwrap().as_str()));
        assert!(shown.contains(&pair.pub_key));
    }
}
