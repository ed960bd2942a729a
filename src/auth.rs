// Credential providers for bearer authentication.
// The gateway asks its provider for a token before every request.

use std::sync::Arc;

use crate::error::Result;
use crate::storage::KeyValueStore;

/// Key under which the bearer token is persisted.
pub const TOKEN_KEY: &str = "token";

/// Source of the bearer token attached to outgoing requests.
///
/// Called once per request; implementations must not cache stale values.
pub trait CredentialProvider: Send + Sync {
    /// Current token, or `None` to send the request unauthenticated.
    fn bearer_token(&self) -> Result<Option<String>>;
}

impl<P: CredentialProvider + ?Sized> CredentialProvider for Arc<P> {
    fn bearer_token(&self) -> Result<Option<String>> {
        (**self).bearer_token()
    }
}

/// Never authenticates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn bearer_token(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

/// A fixed token.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl CredentialProvider for StaticToken {
    fn bearer_token(&self) -> Result<Option<String>> {
        Ok(Some(self.0.clone()).filter(|t| !t.is_empty()))
    }
}

/// Token read from a key-value store on every call.
#[derive(Debug, Clone)]
pub struct StoredToken<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> StoredToken<S> {
    /// Read the token from `store` under [`TOKEN_KEY`].
    pub fn new(store: S) -> Self {
        Self::with_key(store, TOKEN_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }
}

impl<S: KeyValueStore> CredentialProvider for StoredToken<S> {
    fn bearer_token(&self) -> Result<Option<String>> {
        // An empty entry counts as logged out
        Ok(self.store.get(&self.key)?.filter(|t| !t.is_empty()))
    }
}
