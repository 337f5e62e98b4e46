//! Credentials consumed at the network-call boundary.
//!
//! The client asks its provider on every request, so a rotated token is
//! picked up without rebuilding the client. There is no global token store.

use adm_config::ResolvedCredentials;

pub trait CredentialProvider: Send + Sync {
    /// Sent as `Authorization: Bearer <token>` when present.
    fn bearer_token(&self) -> Option<String>;

    /// Sent as `X-System-Key` when present.
    fn system_key(&self) -> Option<String> {
        None
    }
}

/// Fixed credentials. `Debug` is redacted.
#[derive(Clone, Default)]
pub struct StaticCredentials {
    token: Option<String>,
    system_key: Option<String>,
}

impl StaticCredentials {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            system_key: None,
        }
    }

    pub fn with_system_key(mut self, key: impl Into<String>) -> Self {
        self.system_key = Some(key.into());
        self
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("token", &self.token.as_ref().map(|_| "<REDACTED>"))
            .field("system_key", &self.system_key.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl CredentialProvider for StaticCredentials {
    fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }

    fn system_key(&self) -> Option<String> {
        self.system_key.clone()
    }
}

impl CredentialProvider for ResolvedCredentials {
    fn bearer_token(&self) -> Option<String> {
        self.bearer_token.clone()
    }

    fn system_key(&self) -> Option<String> {
        self.system_key.clone()
    }
}
