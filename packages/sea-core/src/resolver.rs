//! Interactive key resolution.
//!
//! When an operation needs an encryption key the caller did not pass, the
//! context asks an injected [`KeyResolver`] (for example a UI prompt that
//! unlocks a stored identity). Without one the operation fails with
//! [`crate::Error::MissingKey`].

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::crypto::Identity;

/// Why a key is being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvePurpose {
    /// Encrypting a payload
    Encrypt,
    /// Decrypting a payload
    Decrypt,
    /// Deriving a Diffie-Hellman secret
    Secret,
}

/// Context handed to the resolver
#[derive(Debug, Clone, Serialize)]
pub struct ResolveRequest {
    /// The payload (or counterpart key) the operation is working on
    pub what: Value,
    /// The operation asking
    pub how: ResolvePurpose,
    /// Free-form reason supplied by the caller
    pub why: Option<String>,
}

/// Supplies an identity on demand
#[async_trait]
pub trait KeyResolver: Send + Sync {
    /// Return an identity for the request, or `None` to refuse
    async fn resolve(&self, hint: Option<&str>, request: ResolveRequest) -> Option<Identity>;
}

/// Resolver that always answers with the same identity
#[derive(Debug, Clone)]
pub struct StaticResolver(pub Identity);

#[async_trait]
impl KeyResolver for StaticResolver {
    async fn resolve(&self, _hint: Option<&str>, request: ResolveRequest) -> Option<Identity> {
        tracing::debug!(how = ?request.how, "Resolving key from static identity");
        Some(self.0.clone())
    }
}
