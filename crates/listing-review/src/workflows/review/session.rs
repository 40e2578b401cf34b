use std::fmt;
use std::sync::{Arc, RwLock};

/// Bearer credential issued by the login flow. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Returns `None` for blank input so an empty token never counts as a session.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Supplies the credential used to authorize mutating calls.
pub trait SessionProvider: Send + Sync {
    fn access_token(&self) -> Option<AccessToken>;

    fn is_logged_in(&self) -> bool {
        self.access_token().is_some()
    }
}

impl<T> SessionProvider for Arc<T>
where
    T: SessionProvider + ?Sized,
{
    fn access_token(&self) -> Option<AccessToken> {
        (**self).access_token()
    }
}

/// Process-local token slot with log-in/log-out semantics.
#[derive(Debug, Default)]
pub struct TokenStore {
    token: RwLock<Option<AccessToken>>,
}

impl TokenStore {
    pub fn new(token: Option<AccessToken>) -> Self {
        Self {
            token: RwLock::new(token),
        }
    }

    pub fn logged_out() -> Self {
        Self::default()
    }

    /// Stores the token; blank values are ignored and leave the current session intact.
    pub fn set_token(&self, raw: &str) {
        if let Some(token) = AccessToken::new(raw) {
            *self.token.write().expect("token store lock poisoned") = Some(token);
        }
    }

    pub fn clear(&self) {
        *self.token.write().expect("token store lock poisoned") = None;
    }
}

impl SessionProvider for TokenStore {
    fn access_token(&self) -> Option<AccessToken> {
        self.token.read().expect("token store lock poisoned").clone()
    }
}
