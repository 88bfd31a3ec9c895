//! # Cryptography Module
//!
//! Every primitive SEA exposes, built on a pluggable [`CryptoProvider`].
//!
//! ## Security Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    IDENTITY                                     │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                     Sea::pair()                                 │   │
//! │  │                          │                                      │   │
//! │  │            ┌─────────────┴─────────────┐                       │   │
//! │  │            ▼                           ▼                       │   │
//! │  │  ┌─────────────────┐         ┌─────────────────┐              │   │
//! │  │  │  pub / priv     │         │  epub / epriv   │              │   │
//! │  │  │  ECDSA P-256    │         │  ECDH P-256     │              │   │
//! │  │  │                 │         │                 │              │   │
//! │  │  │ • Signatures    │         │ • Shared secret │              │   │
//! │  │  │ • Certificates  │         │ • Own-data key  │              │   │
//! │  │  │ • Key ids       │         │                 │              │   │
//! │  │  └─────────────────┘         └─────────────────┘              │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 ENCRYPTION SCHEME                               │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  1. Secret: epriv, ECDH shared secret, or passphrase           │   │
//! │  │  2. Key: SHA-256(secret ‖ salt), fresh 9-byte salt             │   │
//! │  │  3. Encryption: AES-256-GCM, fresh 15-byte nonce               │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 SIGNATURE SCHEME                                │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  ECDSA P-256 over SHA-256(serialize(message))                  │   │
//! │  │  • Signature size: 64 bytes (r‖s), base64 on the wire          │   │
//! │  │  • Public key: two 32-byte coordinates, base64url "x.y"        │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm Choices
//!
//! | Algorithm | Purpose |
//! |-----------|---------|
//! | ECDSA P-256 / SHA-256 | Signing, certificates |
//! | ECDH P-256 | Shared secrets |
//! | AES-256-GCM | Encryption |
//! | PBKDF2-HMAC-SHA256 | Proof of work, password stretching |
//! | SHA-1 | Key ids only |
//!
//! ## Security Considerations
//!
//! 1. **Key Zeroization**: Private halves of identities are zeroized on drop
//! 2. **Secure Random**: Salts and nonces come from `rand::rngs::OsRng`
//! 3. **No Key Reuse**: Every encryption draws a fresh salt and nonce

pub mod codec;
pub mod digest;
pub mod encryption;
pub mod envelope;
pub mod keyid;
pub mod keys;
pub mod provider;
pub mod secret;
pub mod signing;
pub mod work;

pub use codec::{Buffer, Encoding};
pub use encryption::{CipherKey, CipherOptions};
pub use envelope::{is_tagged, EncryptedEnvelope, SignedEnvelope};
pub use keyid::keyid;
pub use keys::Identity;
pub use provider::{CryptoProvider, EcJwk, KeyUsage, NativeProvider};
pub use signing::{DigestStrategy, VerifyStrategy};
pub use work::{WorkOptions, WorkSalt};
