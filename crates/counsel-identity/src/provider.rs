use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("invalid or expired token")]
    InvalidToken,

    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Authenticated caller, as established from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

/// Profile data mirrored from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub email: String,
    pub name: Option<String>,
}

/// Token verification seam. The production provider lives outside this
/// service; the API only ever talks to this trait.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, bearer: &str) -> Result<Session, IdentityError>;

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>, IdentityError>;
}

/// Table-driven provider for tests and local development.
#[derive(Default)]
pub struct StaticTokenProvider {
    tokens: HashMap<String, String>,
    profiles: HashMap<String, Profile>,
}

impl StaticTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), user_id.into());
        self
    }

    pub fn with_profile(mut self, user_id: impl Into<String>, profile: Profile) -> Self {
        self.profiles.insert(user_id.into(), profile);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenProvider {
    async fn authenticate(&self, bearer: &str) -> Result<Session, IdentityError> {
        self.tokens
            .get(bearer)
            .map(|user_id| Session {
                user_id: user_id.clone(),
            })
            .ok_or(IdentityError::InvalidToken)
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>, IdentityError> {
        Ok(self.profiles.get(user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_token_authenticates() {
        let provider = StaticTokenProvider::new().with_token("tok-1", "user-1");
        let session = provider.authenticate("tok-1").await.unwrap();
        assert_eq!(session.user_id, "user-1");
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let provider = StaticTokenProvider::new();
        assert!(matches!(
            provider.authenticate("nope").await,
            Err(IdentityError::InvalidToken)
        ));
    }
}
