//! Tunable constants for a [`crate::Sea`] context.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Nonce lengths the AES-GCM backend can run with
pub const SUPPORTED_IV_LENGTHS: [usize; 2] = [12, 15];

/// Configuration for a SEA context
///
/// The defaults are the values every existing peer on the network was built
/// with; changing them only makes sense for tests or private deployments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeaConfig {
    /// PBKDF2 iteration count
    pub pbkdf2_iterations: u32,
    /// PBKDF2 output length in bytes
    pub pbkdf2_key_bytes: usize,
    /// Length of the random salt chosen by `work` when none is given
    pub work_salt_len: usize,
    /// Length of the random salt mixed into each cipher key
    pub cipher_salt_len: usize,
    /// Length of the AES-GCM nonce
    pub cipher_iv_len: usize,
    /// Compatibility version threshold for signature verification.
    /// Legacy digest strategies are tried when this is 2 or more.
    pub fallback: u8,
}

impl Default for SeaConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: 100_000,
            pbkdf2_key_bytes: 64,
            work_salt_len: 9,
            cipher_salt_len: 9,
            cipher_iv_len: 15,
            fallback: 2,
        }
    }
}

impl SeaConfig {
    /// Check the values can actually be run by the provider
    pub fn validate(&self) -> Result<()> {
        if self.pbkdf2_iterations == 0 {
            return Err(Error::ProviderFailure(
                "PBKDF2 iteration count must be non-zero".into(),
            ));
        }
        if self.pbkdf2_key_bytes == 0 {
            return Err(Error::ProviderFailure(
                "PBKDF2 output length must be non-zero".into(),
            ));
        }
        if !SUPPORTED_IV_LENGTHS.contains(&self.cipher_iv_len) {
            return Err(Error::ProviderFailure(format!(
                "AES-GCM nonce of {} bytes is not supported",
                self.cipher_iv_len
            )));
        }
        Ok(())
    }

    /// Whether the legacy digest strategies are part of the verify chain
    pub fn legacy_digest_enabled(&self) -> bool {
        self.fallback >= 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SeaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pbkdf2_iterations, 100_000);
        assert_eq!(config.cipher_iv_len, 15);
        assert!(config.legacy_digest_enabled());
    }

    #[test]
    fn test_rejects_unsupported_iv() {
        let config = SeaConfig {
            cipher_iv_len: 16,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::ProviderFailure(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SeaConfig = serde_json::from_str(r#"{"pbkdf2_iterations": 10}"#).unwrap();
        assert_eq!(config.pbkdf2_iterations, 10);
        assert_eq!(config.pbkdf2_key_bytes, 64);
    }
}
