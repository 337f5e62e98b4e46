//! Typed view over the merged config JSON.
//!
//! ```yaml
//! api:
//!   base_url: "https://api.example.com"
//!   page_limit: 50
//!   timeout_secs: 15
//! poll:
//!   interval_secs: 60
//!   auto_refresh: true
//! auth:
//!   token_env: "ADM_ADMIN_TOKEN"
//!   system_key_env: "ADM_SYSTEM_KEY"
//!   allow_anonymous: false
//! export:
//!   dir: "exports"
//! ```

use anyhow::{bail, Context, Result};
use serde_json::Value;

pub const DEFAULT_PAGE_LIMIT: u32 = 50;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_TOKEN_ENV: &str = "ADM_ADMIN_TOKEN";
pub const DEFAULT_SYSTEM_KEY_ENV: &str = "ADM_SYSTEM_KEY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSettings {
    pub base_url: String,
    pub page_limit: u32,
    pub timeout_secs: u64,
    pub poll_interval_secs: u64,
    pub auto_refresh: bool,
    /// Env var NAME holding the bearer token.
    pub token_env: String,
    /// Env var NAME holding the optional `X-System-Key`.
    pub system_key_env: String,
    pub allow_anonymous: bool,
    pub export_dir: Option<String>,
}

impl AdminSettings {
    pub fn from_config_json(config: &Value) -> Result<Self> {
        let base_url = read_str_at(config, "/api/base_url")
            .context("CONFIG_MISSING: /api/base_url is required")?;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            bail!("CONFIG_INVALID: /api/base_url must be an http(s) URL, got '{base_url}'");
        }

        let page_limit =
            read_u64_at(config, "/api/page_limit")?.unwrap_or(DEFAULT_PAGE_LIMIT as u64);
        if page_limit == 0 || page_limit > 500 {
            bail!("CONFIG_INVALID: /api/page_limit must be within 1..=500, got {page_limit}");
        }

        let timeout_secs =
            read_u64_at(config, "/api/timeout_secs")?.unwrap_or(DEFAULT_TIMEOUT_SECS);

        let poll_interval_secs =
            read_u64_at(config, "/poll/interval_secs")?.unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        if poll_interval_secs == 0 {
            bail!("CONFIG_INVALID: /poll/interval_secs must be >= 1");
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            page_limit: page_limit as u32,
            timeout_secs,
            poll_interval_secs,
            auto_refresh: read_bool_at(config, "/poll/auto_refresh")?.unwrap_or(true),
            token_env: read_str_at(config, "/auth/token_env")
                .unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string()),
            system_key_env: read_str_at(config, "/auth/system_key_env")
                .unwrap_or_else(|| DEFAULT_SYSTEM_KEY_ENV.to_string()),
            allow_anonymous: read_bool_at(config, "/auth/allow_anonymous")?.unwrap_or(false),
            export_dir: read_str_at(config, "/export/dir"),
        })
    }
}

/// Non-empty trimmed string at `pointer`, `None` if absent, not a string or blank.
fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn read_u64_at(config: &Value, pointer: &str) -> Result<Option<u64>> {
    match config.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => match v.as_u64() {
            Some(n) => Ok(Some(n)),
            None => bail!("CONFIG_INVALID: {pointer} must be a non-negative integer"),
        },
    }
}

fn read_bool_at(config: &Value, pointer: &str) -> Result<Option<bool>> {
    match config.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => bail!("CONFIG_INVALID: {pointer} must be a boolean"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trailing_slash_is_trimmed() {
        let s = AdminSettings::from_config_json(&json!({"api": {"base_url": "http://x/"}})).unwrap();
        assert_eq!(s.base_url, "http://x");
    }

    #[test]
    fn wrong_type_is_rejected() {
        let err = AdminSettings::from_config_json(
            &json!({"api": {"base_url": "http://x", "page_limit": "fifty"}}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("/api/page_limit"));
    }
}
