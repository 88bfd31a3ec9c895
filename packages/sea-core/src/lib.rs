//! # SEA Core
//!
//! Security, Encryption and Authorization for decentralized graph
//! databases: identities, signed and encrypted payloads, shared secrets,
//! authorization certificates and key fingerprints, wire-compatible with
//! existing SEA peers.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          SEA CORE MODULES                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌──────────────┐   │
//! │  │  Identity   │  │   Signing   │  │   Cipher    │  │  Certify     │   │
//! │  │             │  │             │  │             │  │              │   │
//! │  │ - pair()    │  │ - sign()    │  │ - encrypt() │  │ - certify()  │   │
//! │  │ - secret()  │  │ - verify()  │  │ - decrypt() │  │ - Certificate│   │
//! │  │ - keyid()   │  │ - fallback  │  │ - resolver  │  │              │   │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘  └──────┬───────┘   │
//! │         │                │                │                │           │
//! │         └────────────────┴────────────────┴────────────────┘           │
//! │                                   │                                     │
//! │  ┌─────────────┐  ┌─────────────┐ │ ┌─────────────────────────────────┐│
//! │  │   Codec     │  │   Work      │ │ │       CryptoProvider            ││
//! │  │             │  │             │ │ │                                 ││
//! │  │ - hex       │  │ - PBKDF2    │◄┘ │ - P-256 ECDSA / ECDH            ││
//! │  │ - base64    │  │ - SHA-256   │   │ - AES-256-GCM                   ││
//! │  │ - text form │  │             │   │ - PBKDF2, random bytes          ││
//! │  └─────────────┘  └─────────────┘   └─────────────────────────────────┘│
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`config`] - Tunable parameters
//! - [`crypto`] - Cryptographic primitives (codec, keys, signing, cipher)
//! - [`certify`] - Authorization certificates
//! - [`resolver`] - Interactive key resolution
//! - [`sea`] - The context object every operation runs on
//!
//! ## Example
//!
//! ```ignore
//! use sea_core::{Sea, CipherOptions};
//!
//! let sea = Sea::new();
//! let alice = sea.pair().await?;
//!
//! let signed = sea.sign("hello", &alice).await?;
//! let message = sea.verify(signed, &alice.pub_key).await?;
//!
//! let sealed = sea.encrypt("secret", &alice, &CipherOptions::default()).await?;
//! let plain = sea.decrypt(sealed, &alice, &CipherOptions::default()).await?;
//! ```
//!
//! ## Errors
//!
//! Every operation returns a [`Result`]. Failures are also copied into the
//! context's diagnostic slot ([`Sea::last_error`]) so callers that ignore a
//! result can still find out what went wrong.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod certify;
pub mod config;
pub mod crypto;
pub mod error;
pub mod resolver;
pub mod sea;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use certify::{Certificants, Certificate, CertifyOptions, Policy};
pub use config::SeaConfig;
pub use crypto::{
    is_tagged, keyid, Buffer, CipherKey, CipherOptions, CryptoProvider, Encoding,
    EncryptedEnvelope, Identity, NativeProvider, SignedEnvelope, WorkOptions, WorkSalt,
};
pub use error::{Error, Result};
pub use resolver::{KeyResolver, ResolvePurpose, ResolveRequest, StaticResolver};
pub use sea::{on_complete, Sea};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of SEA Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[tokio::test]
    async fn test_sign_then_corrupt() {
        let sea = Sea::new();
        let alice = sea.pair().await.unwrap();

        let data = json!({"hello": "world"});
        let signed = sea.sign(data.clone(), &alice).await.unwrap();
        assert!(is_tagged(&signed));
        assert_eq!(sea.verify(signed.clone(), &alice.pub_key).await.unwrap(), data);

        // flip one character of the message
        let corrupted = signed.replacen("world", "worle", 1);
        assert!(sea.verify(corrupted, &alice.pub_key).await.is_err());
    }

    #[tokio::test]
    async fn test_shared_secret_exchange() {
        let sea = Sea::new();
        let alice = sea.pair().await.unwrap();
        let bob = sea.pair().await.unwrap();
        let opts = CipherOptions::default();

        let key = sea.secret(bob.epub.as_ref().unwrap(), Some(&alice)).await.unwrap();
        let sealed = sea.encrypt(json!({"msg": "hi bob"}), &key, &opts).await.unwrap();

        let key = sea.secret(alice.epub.as_ref().unwrap(), Some(&bob)).await.unwrap();
        let plain = sea.decrypt(sealed, &key, &opts).await.unwrap();
        assert_eq!(plain, json!({"msg": "hi bob"}));
    }

    #[tokio::test]
    async fn test_distinct_identities_have_distinct_keyids() {
        let sea = Sea::new();
        let a = sea.pair().await.unwrap();
        let b = sea.pair().await.unwrap();
        assert_ne!(keyid(&a.pub_key).unwrap(), keyid(&b.pub_key).unwrap());
    }
}
