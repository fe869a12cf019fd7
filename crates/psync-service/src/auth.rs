//! Credential resolution.
//!
//! Token issuance, signing, and expiry live outside this system; all the
//! operations need is a way to turn an opaque bearer credential into an
//! authenticated user id. [`CredentialResolver`] is that seam, and
//! [`StaticTokenResolver`] is the in-memory implementation used by tests
//! and embedding callers.

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;
use uuid::Uuid;

/// Credential resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// The credential is unknown, malformed, or expired.
    #[error("could not validate credentials")]
    InvalidCredential,
}

/// Resolves an opaque bearer credential to an authenticated user id.
pub trait CredentialResolver: Send + Sync {
    /// Resolves `credential` to the user id it authenticates.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredential`] when the credential does
    /// not resolve. The error carries no detail on purpose; callers learn
    /// only that authentication failed.
    fn resolve(&self, credential: &str) -> Result<Uuid, AuthError>;
}

/// In-memory token map resolver.
#[derive(Debug, Default)]
pub struct StaticTokenResolver {
    tokens: RwLock<HashMap<String, Uuid>>,
}

impl StaticTokenResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `token` as authenticating `user_id`, replacing any prior
    /// binding for the same token.
    pub fn insert_token(&self, token: impl Into<String>, user_id: Uuid) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.insert(token.into(), user_id);
        }
    }

    /// Removes a token binding.
    pub fn revoke_token(&self, token: &str) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.remove(token);
        }
    }
}

impl CredentialResolver for StaticTokenResolver {
    fn resolve(&self, credential: &str) -> Result<Uuid, AuthError> {
        self.tokens
            .read()
            .ok()
            .and_then(|tokens| tokens.get(credential).copied())
            .ok_or(AuthError::InvalidCredential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_registered_tokens() {
        let resolver = StaticTokenResolver::new();
        let user_id = Uuid::new_v4();
        resolver.insert_token("tok-1", user_id);

        assert_eq!(resolver.resolve("tok-1").unwrap(), user_id);
    }

    #[test]
    fn unknown_token_is_invalid() {
        let resolver = StaticTokenResolver::new();
        assert_eq!(
            resolver.resolve("missing").unwrap_err(),
            AuthError::InvalidCredential
        );
    }

    #[test]
    fn revoked_token_stops_resolving() {
        let resolver = StaticTokenResolver::new();
        let user_id = Uuid::new_v4();
        resolver.insert_token("tok-1", user_id);
        resolver.revoke_token("tok-1");

        assert!(resolver.resolve("tok-1").is_err());
    }
}
