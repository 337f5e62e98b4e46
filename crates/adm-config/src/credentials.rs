//! Credential resolution.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** (`auth.token_env`,
//!   `auth.system_key_env`).
//! - Callers resolve once at startup and pass [`ResolvedCredentials`] into the
//!   HTTP client; there is no process-wide token store.
//! - `Debug` redacts values; errors name the env var, never its value.

use anyhow::{bail, Result};

use crate::AdminSettings;

/// Credentials attached to every admin API request.
#[derive(Clone, Default)]
pub struct ResolvedCredentials {
    /// Sent as `Authorization: Bearer <token>`.
    pub bearer_token: Option<String>,
    /// Sent as `X-System-Key` on management endpoints.
    pub system_key: Option<String>,
}

impl std::fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "<REDACTED>"),
            )
            .field("system_key", &self.system_key.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

/// Resolve from the process environment.
pub fn resolve_credentials(settings: &AdminSettings) -> Result<ResolvedCredentials> {
    resolve_credentials_with(settings, |name| std::env::var(name).ok())
}

/// Resolve through an arbitrary lookup. Blank values count as unset.
///
/// # Errors
/// `CREDENTIALS_MISSING` naming `auth.token_env` when no token is available
/// and `auth.allow_anonymous` is false.
pub fn resolve_credentials_with<F>(
    settings: &AdminSettings,
    lookup: F,
) -> Result<ResolvedCredentials>
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let bearer_token = non_blank(&settings.token_env);
    if bearer_token.is_none() && !settings.allow_anonymous {
        bail!(
            "CREDENTIALS_MISSING: required env var '{}' (admin bearer token) is not set or empty",
            settings.token_env
        );
    }

    Ok(ResolvedCredentials {
        bearer_token,
        system_key: non_blank(&settings.system_key_env),
    })
}
