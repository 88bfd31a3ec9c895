//! Diffie-Hellman shared secrets.
//!
//! Both sides of an ECDH exchange on P-256 arrive at the same 256-bit
//! x-coordinate. It is handed back as base64url, the `k` of the AES key a
//! WebCrypto peer would derive, so either side can feed it straight into
//! [`Sea::encrypt`] as a [`super::encryption::CipherKey::Secret`].

use zeroize::Zeroizing;

use super::codec::to_base64url;
use super::keys::{agreement_jwk, Identity};
use super::provider::CryptoProvider;
use crate::error::{Error, Result};
use crate::resolver::{ResolvePurpose, ResolveRequest};
use crate::sea::Sea;

impl<P: CryptoProvider> Sea<P> {
    /// Derive the secret shared between `pair` and the owner of `counterpart_epub`
    ///
    /// If `pair` is missing or cannot take part in key agreement, the
    /// context's resolver is asked for one.
    pub async fn secret(&self, counterpart_epub: &str, pair: Option<&Identity>) -> Result<String> {
        let result = self.derive_secret(counterpart_epub, pair).await;
        self.settle("secret", result)
    }

    async fn derive_secret(
        &self,
        counterpart_epub: &str,
        pair: Option<&Identity>,
    ) -> Result<String> {
        let resolved;
        let pair = match pair {
            Some(pair) if pair.can_derive() => pair,
            _ => {
                resolved = self
                    .resolve_identity(ResolveRequest {
                        what: counterpart_epub.into(),
                        how: ResolvePurpose::Secret,
                        why: None,
                    })
                    .await?;
                &resolved
            }
        };

        let (Some(epub), Some(epriv)) = (pair.epub.as_deref(), pair.epriv.as_deref()) else {
            return Err(Error::MissingKey("no agreement key".into()));
        };

        let local = agreement_jwk(epub, Some(epriv))?;
        let remote = agreement_jwk(counterpart_epub, None)?;
        let shared = Zeroizing::new(self.provider().ecdh(&local, &remote).await?);
        Ok(to_base64url(shared.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::encryption::CipherOptions;
    use crate::resolver::StaticResolver;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_secret_is_symmetric() {
        let sea = Sea::new();
        let alice = sea.pair().await.unwrap();
        let bob = sea.pair().await.unwrap();

        let ab = sea.secret(bob.epub.as_ref().unwrap(), Some(&alice)).await.unwrap();
        let ba = sea.secret(alice.epub.as_ref().unwrap(), Some(&bob)).await.unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.len(), 43);
    }

    #[tokio::test]
    async fn test_secret_feeds_encryption() {
        let sea = Sea::new();
        let alice = sea.pair().await.unwrap();
        let bob = sea.pair().await.unwrap();
        let opts = CipherOptions::default();

        let ab = sea.secret(bob.epub.as_ref().unwrap(), Some(&alice)).await.unwrap();
        let sealed = sea.encrypt("for bob", &ab, &opts).await.unwrap();

        let ba = sea.secret(alice.epub.as_ref().unwrap(), Some(&bob)).await.unwrap();
        assert_eq!(sea.decrypt(sealed, &ba, &opts).await.unwrap(), json!("for bob"));
    }

    #[tokio::test]
    async fn test_missing_pair() {
        let sea = Sea::new();
        let bob = sea.pair().await.unwrap();
        let result = sea.secret(bob.epub.as_ref().unwrap(), None).await;
        assert!(matches!(result, Err(Error::MissingKey(_))));

        let result = sea.secret(bob.epub.as_ref().unwrap(), Some(&bob.public())).await;
        assert!(matches!(result, Err(Error::MissingKey(_))));
    }

    #[tokio::test]
    async fn test_resolved_pair() {
        let alice = Sea::new().pair().await.unwrap();
        let sea = Sea::new().with_resolver(Arc::new(StaticResolver(alice.clone())));
        let bob = sea.pair().await.unwrap();

        let resolved = sea.secret(bob.epub.as_ref().unwrap(), None).await.unwrap();
        let direct = sea.secret(bob.epub.as_ref().unwrap(), Some(&alice)).await.unwrap();
        assert_eq!(resolved, direct);
    }

    #[tokio::test]
    async fn test_bad_counterpart_key() {
        let sea = Sea::new();
        let alice = sea.pair().await.unwrap();
        let result = sea.secret("not-a-key", Some(&alice)).await;
        assert!(matches!(result, Err(Error::InvalidKey(_))));
    }
}
