//! # SEA Context
//!
//! [`Sea`] owns everything the operations share: the provider, the
//! configuration, the optional key resolver, the verification key cache and
//! the "last error" diagnostic slot. Applications usually build one and keep
//! it in an `Arc`; tests build as many as they like.
//!
//! ## Lifecycle
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          SEA CONTEXT                                    │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Sea::new() / Sea::with_provider(p, cfg)                               │
//! │        │                                                                │
//! │        ├──► .with_resolver(r)      optional interactive key source     │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  pair / work / sign / verify / encrypt / decrypt / secret / certify    │
//! │        │                                                                │
//! │        ├──► Ok(value)                                                  │
//! │        └──► Err(e) ──► copied into last_error, then returned           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::SeaConfig;
use crate::crypto::provider::{CryptoProvider, NativeProvider};
use crate::crypto::signing::KeyCache;
use crate::crypto::Identity;
use crate::error::{Error, Result};
use crate::resolver::{KeyResolver, ResolveRequest};

/// Security, encryption and authorization context
pub struct Sea<P: CryptoProvider = NativeProvider> {
    provider: P,
    config: SeaConfig,
    resolver: Option<Arc<dyn KeyResolver>>,
    pub(crate) key_cache: KeyCache<P::VerifyKey>,
    last_error: RwLock<Option<Error>>,
}

impl Sea<NativeProvider> {
    /// Context on the native provider with default settings
    pub fn new() -> Self {
        Self {
            provider: NativeProvider::new(),
            config: SeaConfig::default(),
            resolver: None,
            key_cache: KeyCache::new(),
            last_error: RwLock::new(None),
        }
    }
}

impl Default for Sea<NativeProvider> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: CryptoProvider> Sea<P> {
    /// Context on a custom provider
    ///
    /// Fails if the configuration asks for something the cipher cannot do.
    pub fn with_provider(provider: P, config: SeaConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            provider,
            config,
            resolver: None,
            key_cache: KeyCache::new(),
            last_error: RwLock::new(None),
        })
    }

    /// Install an interactive key resolver
    pub fn with_resolver(mut self, resolver: Arc<dyn KeyResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// The active configuration
    pub fn config(&self) -> &SeaConfig {
        &self.config
    }

    /// The underlying provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The most recent failure of any operation on this context
    pub fn last_error(&self) -> Option<Error> {
        self.last_error.read().clone()
    }

    /// Clear the diagnostic slot
    pub fn clear_last_error(&self) {
        *self.last_error.write() = None;
    }

    /// Number of public keys imported for verification so far
    pub fn cached_keys(&self) -> usize {
        self.key_cache.len()
    }

    /// Secure random bytes from the provider
    pub fn random(&self, len: usize) -> Result<Vec<u8>> {
        let result = self.provider.random_bytes(len);
        self.settle("random", result)
    }

    /// Record a failure in the diagnostic slot and hand the result back
    pub(crate) fn settle<T>(&self, op: &'static str, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            tracing::warn!(op, code = err.code(), "SEA operation failed: {}", err);
            *self.last_error.write() = Some(err.clone());
        }
        result
    }

    /// Ask the resolver for an identity, failing with `MissingKey` if there
    /// is none or it declines
    pub(crate) async fn resolve_identity(&self, request: ResolveRequest) -> Result<Identity> {
        let Some(resolver) = self.resolver.as_ref() else {
            return Err(Error::MissingKey(format!(
                "no key supplied and no resolver installed ({:?})",
                request.how
            )));
        };
        let how = request.how;
        resolver
            .resolve(None, request)
            .await
            .ok_or_else(|| Error::MissingKey(format!("resolver declined ({:?})", how)))
    }
}

/// Drive an operation to completion and hand the outcome to a callback
///
/// The callback sees `Some(value)` on success and `None` on failure; the
/// failure itself is still available from [`Sea::last_error`].
pub async fn on_complete<T, Fut, F>(operation: Fut, callback: F)
where
    Fut: Future<Output = Result<T>>,
    F: FnOnce(Option<T>),
{
    callback(operation.await.ok());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{ResolvePurpose, StaticResolver};
    use serde_json::json;

    #[test]
    fn test_settle_records_last_error() {
        let sea = Sea::new();
        assert!(sea.last_error().is_none());

        let result: Result<()> = sea.settle("test", Err(Error::SignatureMismatch));
        assert!(result.is_err());
        assert_eq!(sea.last_error(), Some(Error::SignatureMismatch));

        sea.clear_last_error();
        assert!(sea.last_error().is_none());
    }

    #[test]
    fn test_contexts_are_isolated() {
        let a = Sea::new();
        let b = Sea::new();
        let _ = a.settle::<()>("test", Err(Error::SignatureMismatch));
        assert!(a.last_error().is_some());
        assert!(b.last_error().is_none());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SeaConfig {
            cipher_iv_len: 7,
            ..Default::default()
        };
        assert!(Sea::with_provider(NativeProvider::new(), config).is_err());
    }

    #[test]
    fn test_random_length() {
        let sea = Sea::new();
        assert_eq!(sea.random(15).unwrap().len(), 15);
    }

    #[tokio::test]
    async fn test_resolve_without_resolver_is_missing_key() {
        let sea = Sea::new();
        let request = ResolveRequest {
            what: json!("x"),
            how: ResolvePurpose::Encrypt,
            why: None,
        };
        let result = sea.resolve_identity(request).await;
        assert!(matches!(result, Err(Error::MissingKey(_))));
    }

    #[tokio::test]
    async fn test_resolve_with_static_resolver() {
        let pair = Sea::new().pair().await.unwrap();
        let sea = Sea::new().with_resolver(Arc::new(StaticResolver(pair.clone())));
        let request = ResolveRequest {
            what: json!("x"),
            how: ResolvePurpose::Secret,
            why: Some("test".into()),
        };
        assert_eq!(sea.resolve_identity(request).await.unwrap(), pair);
    }

    #[test]
    fn test_blocking_caller() {
        let sea = Sea::new();
        let pair = tokio_test::block_on(sea.pair()).unwrap();
        let signed = tokio_test::block_on(sea.sign("sync", &pair)).unwrap();
        let message = tokio_test::block_on(sea.verify(signed, &pair.pub_key)).unwrap();
        assert_eq!(message, json!("sync"));
    }

    #[tokio::test]
    async fn test_on_complete_callback() {
        let sea = Sea::new();
        let mut seen = None;
        on_complete(sea.pair(), |pair| seen = pair).await;
        assert!(seen.is_some());

        let mut failed = Some(0);
        on_complete(async { Err::<i32, _>(Error::SignatureMismatch) }, |v| failed = v).await;
        assert!(failed.is_none());
    }
}
