//! # Cryptographic Provider
//!
//! Every primitive SEA needs is requested through [`CryptoProvider`]. Keys
//! cross the seam as JSON Web Keys, the same interchange format other peers'
//! WebCrypto engines use, so a provider can be swapped for a hardware or
//! platform engine without touching the protocol code.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PROVIDER SEAM                                    │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   Sea (protocol)                         CryptoProvider                 │
//! │   ──────────────                         ──────────────                 │
//! │   pair()      ── generate_key(usage) ──► P-256 keygen → EcJwk           │
//! │   sign()      ── sign(jwk, digest) ────► ECDSA-P256/SHA-256 (r‖s)       │
//! │   verify()    ── import_verify_key ────► handle (cached by Sea)         │
//! │               ── verify(handle, …) ────► bool                           │
//! │   work()      ── pbkdf2_sha256 ────────► blocking pool                  │
//! │   encrypt()   ── aes_gcm_encrypt ──────► ct ‖ tag                       │
//! │   secret()    ── ecdh(local, remote) ──► shared x-coordinate            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use aes_gcm::aead::consts::{U12, U15};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use async_trait::async_trait;
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use p256::{EncodedPoint, FieldBytes, PublicKey, SecretKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::crypto::codec::{from_base64url, to_base64url};
use crate::error::{Error, Result};

/// Size of a P-256 coordinate or scalar in bytes
pub const COORDINATE_SIZE: usize = 32;

/// Size of an AES-256 key in bytes
pub const AES_KEY_SIZE: usize = 32;

/// What a generated or imported EC key is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyUsage {
    /// ECDSA sign/verify
    Sign,
    /// ECDH key agreement
    Derive,
}

/// An elliptic-curve JSON Web Key on P-256
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcJwk {
    /// Key type, always "EC"
    pub kty: String,
    /// Curve name, always "P-256"
    pub crv: String,
    /// base64url x coordinate
    pub x: String,
    /// base64url y coordinate
    pub y: String,
    /// base64url private scalar, absent for public keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    /// Extractable flag
    #[serde(default)]
    pub ext: bool,
    /// Permitted operations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_ops: Vec<String>,
}

impl EcJwk {
    /// Build a JWK from its coordinates and optional private scalar
    pub fn new(x: impl Into<String>, y: impl Into<String>, d: Option<String>) -> Self {
        Self {
            kty: "EC".into(),
            crv: "P-256".into(),
            x: x.into(),
            y: y.into(),
            d,
            ext: true,
            key_ops: Vec::new(),
        }
    }

    /// Same key with `key_ops` set
    pub fn with_ops(mut self, ops: &[&str]) -> Self {
        self.key_ops = ops.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Whether this JWK carries a private scalar
    pub fn is_private(&self) -> bool {
        self.d.is_some()
    }

    fn check_curve(&self) -> Result<()> {
        if self.kty != "EC" || self.crv != "P-256" {
            return Err(Error::InvalidKey(format!(
                "unsupported key type {}/{}",
                self.kty, self.crv
            )));
        }
        Ok(())
    }

    fn public_key(&self) -> Result<PublicKey> {
        self.check_curve()?;
        let x = coordinate(&self.x, "x")?;
        let y = coordinate(&self.y, "y")?;
        let point = EncodedPoint::from_affine_coordinates(
            FieldBytes::from_slice(&x),
            FieldBytes::from_slice(&y),
            false,
        );
        Option::from(PublicKey::from_encoded_point(&point))
            .ok_or_else(|| Error::InvalidKey("point is not on P-256".into()))
    }

    fn secret_key(&self) -> Result<SecretKey> {
        self.check_curve()?;
        let d = self
            .d
            .as_deref()
            .ok_or_else(|| Error::MissingKey("JWK has no private scalar".into()))?;
        let scalar = Zeroizing::new(coordinate(d, "d")?);
        let secret = SecretKey::from_slice(&scalar)
            .map_err(|_| Error::InvalidKey("private scalar out of range".into()))?;

        // the public half must belong to the scalar, as WebCrypto enforces
        if secret.public_key() != self.public_key()? {
            return Err(Error::InvalidKey("private scalar does not match x/y".into()));
        }
        Ok(secret)
    }

    fn from_secret(secret: &SecretKey) -> Result<Self> {
        let point = secret.public_key().to_encoded_point(false);
        let (x, y) = match (point.x(), point.y()) {
            (Some(x), Some(y)) => (x, y),
            _ => return Err(Error::ProviderFailure("generated identity point".into())),
        };
        Ok(Self::new(
            to_base64url(x),
            to_base64url(y),
            Some(to_base64url(&secret.to_bytes())),
        ))
    }
}

impl std::fmt::Debug for EcJwk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcJwk")
            .field("crv", &self.crv)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("d", &self.d.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn coordinate(value: &str, name: &str) -> Result<Vec<u8>> {
    let bytes = from_base64url(value)
        .map_err(|e| Error::InvalidKey(format!("JWK {}: {}", name, e)))?;
    if bytes.len() != COORDINATE_SIZE {
        return Err(Error::InvalidKey(format!(
            "JWK {} must be {} bytes, got {}",
            name,
            COORDINATE_SIZE,
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// The external cryptographic engine
///
/// Implementations must be usable from many tasks at once. Handles returned
/// by [`CryptoProvider::import_verify_key`] are cached by the caller for the
/// life of the process, so they must be cheap to clone.
#[async_trait]
pub trait CryptoProvider: Send + Sync + 'static {
    /// Imported public-key handle used for verification
    type VerifyKey: Clone + Send + Sync + 'static;

    /// Fill a fresh buffer from the secure random source
    fn random_bytes(&self, len: usize) -> Result<Vec<u8>>;

    /// Generate an extractable P-256 key and export it as a private JWK
    async fn generate_key(&self, usage: KeyUsage) -> Result<EcJwk>;

    /// Import a public JWK for ECDSA verification
    async fn import_verify_key(&self, jwk: &EcJwk) -> Result<Self::VerifyKey>;

    /// ECDSA-P256/SHA-256 over `data`, returning the 64-byte `r‖s` form
    async fn sign(&self, jwk: &EcJwk, data: &[u8]) -> Result<Vec<u8>>;

    /// Check an ECDSA-P256/SHA-256 signature over `data`
    async fn verify(&self, key: &Self::VerifyKey, signature: &[u8], data: &[u8]) -> Result<bool>;

    /// PBKDF2-HMAC-SHA256
    async fn pbkdf2_sha256(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        length: usize,
    ) -> Result<Vec<u8>>;

    /// AES-256-GCM seal; output is ciphertext followed by the 16-byte tag
    async fn aes_gcm_encrypt(
        &self,
        key: &[u8; AES_KEY_SIZE],
        iv: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>>;

    /// AES-256-GCM open
    async fn aes_gcm_decrypt(
        &self,
        key: &[u8; AES_KEY_SIZE],
        iv: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>>;

    /// ECDH on P-256, returning the 256-bit shared x-coordinate
    async fn ecdh(&self, local: &EcJwk, remote: &EcJwk) -> Result<[u8; COORDINATE_SIZE]>;
}

// ============================================================================
// NATIVE PROVIDER
// ============================================================================

/// Pure-Rust provider built on the RustCrypto crates
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeProvider;

impl NativeProvider {
    /// Create a provider
    pub fn new() -> Self {
        Self
    }
}

/// Run CPU-heavy work off the async executor when one is available
async fn offload<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Ok(handle.spawn_blocking(work).await?),
        Err(_) => Ok(work()),
    }
}

#[async_trait]
impl CryptoProvider for NativeProvider {
    type VerifyKey = VerifyingKey;

    fn random_bytes(&self, len: usize) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; len];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| Error::ProviderFailure(format!("random source: {}", e)))?;
        Ok(bytes)
    }

    async fn generate_key(&self, usage: KeyUsage) -> Result<EcJwk> {
        let secret = SecretKey::random(&mut OsRng);
        let jwk = EcJwk::from_secret(&secret)?;
        Ok(match usage {
            KeyUsage::Sign => jwk.with_ops(&["sign"]),
            KeyUsage::Derive => jwk.with_ops(&["deriveKey", "deriveBits"]),
        })
    }

    async fn import_verify_key(&self, jwk: &EcJwk) -> Result<VerifyingKey> {
        Ok(VerifyingKey::from(jwk.public_key()?))
    }

    async fn sign(&self, jwk: &EcJwk, data: &[u8]) -> Result<Vec<u8>> {
        let key = SigningKey::from(jwk.secret_key()?);
        let signature: Signature = key.sign(data);
        Ok(signature.to_bytes().to_vec())
    }

    async fn verify(&self, key: &VerifyingKey, signature: &[u8], data: &[u8]) -> Result<bool> {
        // a signature of the wrong shape simply does not verify
        let Ok(signature) = Signature::from_slice(signature) else {
            return Ok(false);
        };
        Ok(key.verify(data, &signature).is_ok())
    }

    async fn pbkdf2_sha256(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        length: usize,
    ) -> Result<Vec<u8>> {
        if iterations == 0 || length == 0 {
            return Err(Error::ProviderFailure("PBKDF2 parameters must be non-zero".into()));
        }
        let password = Zeroizing::new(password.to_vec());
        let salt = salt.to_vec();
        offload(move || {
            let mut out = vec![0u8; length];
            pbkdf2::pbkdf2_hmac::<Sha256>(&password, &salt, iterations, &mut out);
            out
        })
        .await
    }

    async fn aes_gcm_encrypt(
        &self,
        key: &[u8; AES_KEY_SIZE],
        iv: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        let sealed = match iv.len() {
            12 => AesGcm::<Aes256, U12>::new_from_slice(key)
                .map_err(|e| Error::ProviderFailure(format!("AES key: {}", e)))?
                .encrypt(Nonce::<U12>::from_slice(iv), plaintext),
            15 => AesGcm::<Aes256, U15>::new_from_slice(key)
                .map_err(|e| Error::ProviderFailure(format!("AES key: {}", e)))?
                .encrypt(Nonce::<U15>::from_slice(iv), plaintext),
            n => {
                return Err(Error::ProviderFailure(format!(
                    "AES-GCM nonce of {} bytes is not supported",
                    n
                )))
            }
        };
        sealed.map_err(|_| Error::ProviderFailure("AES-GCM encryption failed".into()))
    }

    async fn aes_gcm_decrypt(
        &self,
        key: &[u8; AES_KEY_SIZE],
        iv: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        let opened = match iv.len() {
            12 => AesGcm::<Aes256, U12>::new_from_slice(key)
                .map_err(|e| Error::ProviderFailure(format!("AES key: {}", e)))?
                .decrypt(Nonce::<U12>::from_slice(iv), ciphertext),
            15 => AesGcm::<Aes256, U15>::new_from_slice(key)
                .map_err(|e| Error::ProviderFailure(format!("AES key: {}", e)))?
                .decrypt(Nonce::<U15>::from_slice(iv), ciphertext),
            n => {
                return Err(Error::ProviderFailure(format!(
                    "AES-GCM nonce of {} bytes is not supported",
                    n
                )))
            }
        };
        opened.map_err(|_| Error::ProviderFailure("AES-GCM authentication tag mismatch".into()))
    }

    async fn ecdh(&self, local: &EcJwk, remote: &EcJwk) -> Result<[u8; COORDINATE_SIZE]> {
        let secret = local.secret_key()?;
        let public = remote.public_key()?;
        let shared = p256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
        let mut out = [0u8; COORDINATE_SIZE];
        out.copy_from_slice(shared.raw_secret_bytes());
        Ok(out)
    }
}

// ============================================================================
// TESTS
// ============================================================================
