//! Bearer token sources.

use std::future::Future;

use crate::{PublishError, PublishResult};

/// Supplies the bearer token sent with every backend request.
///
/// Identity providers refresh tokens asynchronously, so fetching one is a
/// future.
pub trait TokenProvider {
    fn token(&self) -> impl Future<Output = PublishResult<String>> + Send;
}

/// A fixed token, from config or the environment.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Reads the token from an environment variable, falling back to `fallback`.
    pub fn from_env_or(var: &str, fallback: Option<&str>) -> PublishResult<Self> {
        match std::env::var(var) {
            Ok(token) if !token.trim().is_empty() => Ok(Self::new(token.trim())),
            _ => fallback
                .filter(|t| !t.trim().is_empty())
                .map(|t| Self::new(t.trim()))
                .ok_or_else(|| PublishError::Auth(format!("no token in ${var} or config"))),
        }
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(***)")
    }
}

impl TokenProvider for StaticToken {
    async fn token(&self) -> PublishResult<String> {
        Ok(self.0.clone())
    }
}
