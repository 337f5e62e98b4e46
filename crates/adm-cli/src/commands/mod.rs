//! Command handler modules for adm-cli.
//!
//! Shared config/client bootstrap lives here. Command-specific logic lives in
//! the submodules.

pub mod invites;
pub mod orders;
pub mod payments;

use std::sync::Arc;
use std::time::Duration;

use adm_config::{AdminSettings, UnusedKeyPolicy};
use adm_feed::AdminApiClient;
use adm_reconcile::Filter;
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Load layered config and validate the admin settings.
///
/// Unused keys are reported, not fatal.
pub fn load_settings(config_paths: &[String]) -> Result<AdminSettings> {
    let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = adm_config::load_layered_yaml(&path_refs)?;

    let report = adm_config::report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    if !report.is_clean() {
        warn!(keys = ?report.unused_leaf_pointers, "config has unused keys");
    }

    let settings = AdminSettings::from_config_json(&loaded.config_json)?;
    info!(
        config_hash = %loaded.config_hash,
        base_url = %settings.base_url,
        "config loaded"
    );
    Ok(settings)
}

/// Settings plus an authenticated client. Credentials come from the env vars
/// the config names.
pub fn connect(config_paths: &[String]) -> Result<(AdminSettings, Arc<AdminApiClient>)> {
    let settings = load_settings(config_paths)?;
    let credentials = adm_config::resolve_credentials(&settings)?;
    let client = AdminApiClient::new(
        &settings.base_url,
        Arc::new(credentials),
        Duration::from_secs(settings.timeout_secs),
    )
    .context("admin api client init failed")?;
    Ok((settings, Arc::new(client)))
}

pub fn filter_from_arg(status: Option<String>) -> Filter {
    match status {
        Some(s) => Filter::status(s),
        None => Filter::all(),
    }
}
