//! adm-config
//!
//! Layered YAML configuration for the admin tooling.
//!
//! - YAML layers merge in order: earlier docs are base, later docs override.
//! - The merged document is canonicalized to JSON and hashed (sha256).
//! - Literal secrets in config are rejected; config stores env var NAMES only.
//! - Typed settings are extracted in [`settings`]; credentials are resolved
//!   once in [`credentials`].

pub mod credentials;
pub mod settings;

pub use credentials::{resolve_credentials, resolve_credentials_with, ResolvedCredentials};
pub use settings::AdminSettings;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;

/// Known secret-like prefixes. If any leaf string value in the effective
/// config starts with one of these, loading aborts with CONFIG_SECRET_DETECTED.
const SECRET_PREFIXES: &[&str] = &[
    "eyJ",        // JWT (base64 '{"')
    "Bearer ",    // pasted Authorization header
    "sk-",        // OpenAI style
    "sk_live",    // Stripe live
    "sk_test",    // Stripe test
    "AKIA",       // AWS access key ID
    "-----BEGIN", // PEM private keys
    "ghp_",       // GitHub PAT
    "glpat-",     // GitLab PAT
    "xoxb-",      // Slack bot token
];

/// JSON-pointer prefixes actually read by [`AdminSettings::from_config_json`].
///
/// Keep in sync with `settings.rs`. Anything outside these is reported as unused.
pub const CONSUMED_POINTERS: &[&str] = &["/api", "/poll", "/auth", "/export"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Minimal set of unused leaf pointers (sorted)
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Report config leaves no consumer reads (typos, stale keys).
/// If `policy == Fail`, returns an error when unused keys exist.
pub fn report_unused_keys(
    config_json: &Value,
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeyReport> {
    let consumed: Vec<String> = CONSUMED_POINTERS.iter().map(|p| normalize_pointer(p)).collect();

    let mut unused = BTreeSet::new();
    visit_leaves(config_json, |pointer, _| {
        if !consumed.iter().any(|c| pointer_covers(c, &pointer)) {
            unused.insert(pointer);
        }
    });

    let report = UnusedKeyReport {
        unused_leaf_pointers: unused.into_iter().collect(),
    };
    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        bail!(
            "CONFIG_UNUSED_KEYS: {} unused config leaf key(s) detected. First few: {:?}",
            report.unused_leaf_pointers.len(),
            &report.unused_leaf_pointers[..report.unused_leaf_pointers.len().min(12)]
        );
    }
    Ok(report)
}

/// `"api/"` and `" /api"` both become `"/api"`; blank becomes `"/"`.
fn normalize_pointer(p: &str) -> String {
    let body = p.trim().trim_matches('/');
    format!("/{body}")
}

/// `/a/b` covers `/a/b` and `/a/b/c`, never `/a/bc`.
fn pointer_covers(prefix: &str, leaf: &str) -> bool {
    match leaf.strip_prefix(prefix) {
        _ if prefix == "/" => true,
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Calls `f` with the JSON pointer of every scalar leaf (including nulls).
/// Empty objects and arrays produce no leaf.
fn visit_leaves<'a>(root: &'a Value, mut f: impl FnMut(String, &'a Value)) {
    let mut stack: Vec<(String, &'a Value)> = vec![(String::new(), root)];
    while let Some((pointer, value)) = stack.pop() {
        match value {
            Value::Object(map) => {
                for (key, child) in map.iter().rev() {
                    let token = key.replace('~', "~0").replace('/', "~1");
                    stack.push((format!("{pointer}/{token}"), child));
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate().rev() {
                    stack.push((format!("{pointer}/{i}"), child));
                }
            }
            scalar if pointer.is_empty() => f("/".to_string(), scalar),
            scalar => f(pointer, scalar),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let docs = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}")))
        .collect::<Result<Vec<String>>>()?;
    let doc_refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(serde_json::Map::new());
    for (layer, raw) in yaml_docs.iter().enumerate() {
        let doc: serde_yaml::Value =
            serde_yaml::from_str(raw).with_context(|| format!("invalid yaml in layer {layer}"))?;
        let doc = serde_json::to_value(doc).context("yaml->json conversion failed")?;
        overlay(&mut merged, doc);
    }

    reject_secret_literals(&merged)?;

    let canonical_json = canonicalize_json(&merged)?;
    Ok(LoadedConfig {
        config_hash: hex::encode(Sha256::digest(canonical_json.as_bytes())),
        canonical_json,
        config_json: merged,
    })
}

/// Objects merge key by key; any other layer value (null included) replaces
/// what was below it.
fn overlay(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(below), Value::Object(above)) => {
            for (key, value) in above {
                overlay(below.entry(key).or_insert(Value::Null), value);
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Keys are emitted sorted at every level so that key order in the YAML
/// source never changes the hash.
fn canonicalize_json(v: &Value) -> Result<String> {
    fn sorted(v: &Value) -> Value {
        match v {
            Value::Object(map) => {
                let ordered: BTreeMap<&String, Value> =
                    map.iter().map(|(k, child)| (k, sorted(child))).collect();
                Value::Object(ordered.into_iter().map(|(k, v)| (k.clone(), v)).collect())
            }
            Value::Array(arr) => Value::Array(arr.iter().map(sorted).collect()),
            other => other.clone(),
        }
    }
    serde_json::to_string(&sorted(v)).context("canonical json serialize failed")
}

fn reject_secret_literals(v: &Value) -> Result<()> {
    let mut offending: Option<String> = None;
    visit_leaves(v, |pointer, leaf| {
        if offending.is_none() && leaf.as_str().is_some_and(looks_like_secret) {
            offending = Some(pointer);
        }
    });
    match offending {
        Some(ptr) => bail!("CONFIG_SECRET_DETECTED leaf={ptr} value=REDACTED"),
        None => Ok(()),
    }
}

/// Values shorter than this are env var names or placeholders, not keys.
const MIN_SECRET_LEN: usize = 8;

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    t.len() >= MIN_SECRET_LEN && SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}
