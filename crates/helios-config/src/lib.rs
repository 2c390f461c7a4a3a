use anyhow::{bail, Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;

pub mod consumption;
pub mod env;
pub mod secrets;

pub use consumption::{consumed_pointers, ConfigMode};
pub use env::{BrokerMode, EnvConfig};
pub use secrets::{resolve_secrets_for_mode, ResolvedDiscordWebhooks, ResolvedSecrets};

/// Load + merge YAML files in order, then canonicalize to JSON and hash.
/// Later files override earlier files via deep-merge.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Default::default());

    for p in paths {
        let s = fs::read_to_string(p).with_context(|| format!("read config: {p}"))?;
        let yaml_val: serde_yaml::Value =
            serde_yaml::from_str(&s).with_context(|| format!("parse yaml: {p}"))?;
        let json_val = serde_json::to_value(yaml_val).context("yaml->json conversion failed")?;
        deep_merge(&mut merged, json_val);
    }

    finalize(merged)
}

/// Same pipeline as [`load_layered_yaml`], but takes YAML document bodies
/// directly rather than file paths. Used by tests and by any caller that
/// already holds config text (inline defaults, fixtures).
pub fn load_layered_yaml_from_strings(yamls: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Default::default());

    for (i, s) in yamls.iter().enumerate() {
        let yaml_val: serde_yaml::Value =
            serde_yaml::from_str(s).with_context(|| format!("parse yaml layer #{i}"))?;
        let json_val = serde_json::to_value(yaml_val).context("yaml->json conversion failed")?;
        deep_merge(&mut merged, json_val);
    }

    finalize(merged)
}

/// Shared tail of both loaders: reject embedded secrets, canonicalize, hash.
fn finalize(merged: Value) -> Result<LoadedConfig> {
    reject_embedded_secrets(&merged, &mut String::new())?;

    // Canonicalize (stable key order) by round-tripping through serde_json::to_string,
    // which orders keys deterministically for maps (BTreeMap) only if we ensure sorting.
    // So we implement a manual canonicalization step that sorts object keys.
    let canonical = canonicalize_json(&merged);

    // Hash canonical bytes
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let hash = hex::encode(hasher.finalize());

    Ok(LoadedConfig {
        config_json: serde_json::from_str(&canonical).context("canonical json parse failed")?,
        canonical_json: canonical,
        config_hash: hash,
    })
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_json: Value,
    pub canonical_json: String,
    pub config_hash: String,
}

/// Deep-merge: objects merge recursively; arrays replaced; scalars overwritten.
fn deep_merge(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst_map), Value::Object(src_map)) => {
            for (k, v) in src_map {
                match dst_map.get_mut(&k) {
                    Some(existing) => deep_merge(existing, v),
                    None => {
                        dst_map.insert(k, v);
                    }
                }
            }
        }
        (dst_slot, src_val) => {
            *dst_slot = src_val;
        }
    }
}

/// Canonicalize JSON by sorting all object keys recursively and emitting compact JSON.
fn canonicalize_json(v: &Value) -> String {
    let sorted = sort_keys(v);
    serde_json::to_string(&sorted).expect("json serialization must not fail")
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}

// ---------------------------------------------------------------------------
// Secrets exclusion (docs/specs/config_layering_and_hashing.md section 5)
// ---------------------------------------------------------------------------
//
// Config YAML must store env-var *names*, never resolved secret values
// (see `secrets.rs`'s module doc for the full contract). This is a
// best-effort content scan over literal string values at load time, not a
// substitute for the mode-aware enforcement in `resolve_secrets_for_mode`.

/// Recognizes common secret-shaped literals: provider API-key prefixes
/// (`sk-...`, the OpenAI/Stripe/Anthropic-style convention), AWS access-key
/// IDs (`AKIA...`), and PEM-encoded private key blocks.
fn looks_like_secret_literal(s: &str) -> bool {
    s.starts_with("sk-") || s.starts_with("AKIA") || s.contains("-----BEGIN")
}

fn reject_embedded_secrets(v: &Value, pointer: &mut String) -> Result<()> {
    match v {
        Value::Object(map) => {
            for (k, val) in map {
                let len = pointer.len();
                pointer.push('/');
                pointer.push_str(&k.replace('~', "~0").replace('/', "~1"));
                reject_embedded_secrets(val, pointer)?;
                pointer.truncate(len);
            }
            Ok(())
        }
        Value::Array(arr) => {
            for (i, val) in arr.iter().enumerate() {
                let len = pointer.len();
                pointer.push('/');
                pointer.push_str(&i.to_string());
                reject_embedded_secrets(val, pointer)?;
                pointer.truncate(len);
            }
            Ok(())
        }
        Value::String(s) if looks_like_secret_literal(s) => {
            bail!(
                "CONFIG_SECRET_DETECTED at {}: value looks like a literal secret; \
                 store the env var NAME instead (see helios_config::secrets)",
                pointer
            )
        }
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Unused-key governance (PATCH 26)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

/// Report of config leaf pointers that no consumer (per [`consumed_pointers`])
/// is known to read for the run's [`ConfigMode`].
#[derive(Debug, Clone, Default)]
pub struct UnusedKeysReport {
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeysReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Diff `config_json`'s leaf pointers against the consumed-pointer registry
/// for `mode`. `UnusedKeyPolicy::Fail` turns a non-empty report into an
/// error (`CONFIG_UNUSED_KEYS`); `Warn` always returns `Ok`, leaving the
/// caller to decide how loudly to log it.
pub fn report_unused_keys(
    mode: ConfigMode,
    config_json: &Value,
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeysReport> {
    let consumed: BTreeSet<&str> = consumed_pointers(mode).iter().copied().collect();

    let mut leaves = Vec::new();
    collect_leaf_pointers(config_json, &mut String::new(), &mut leaves);
    leaves.retain(|p| !consumed.contains(p.as_str()));
    leaves.sort();

    let report = UnusedKeysReport {
        unused_leaf_pointers: leaves,
    };

    if !report.is_clean() && policy == UnusedKeyPolicy::Fail {
        bail!(
            "CONFIG_UNUSED_KEYS mode={:?} unused_leaf_keys={} pointers={:?}",
            mode,
            report.unused_leaf_pointers.len(),
            report.unused_leaf_pointers
        );
    }

    Ok(report)
}

fn collect_leaf_pointers(v: &Value, pointer: &mut String, out: &mut Vec<String>) {
    match v {
        Value::Object(map) if !map.is_empty() => {
            for (k, val) in map {
                let len = pointer.len();
                pointer.push('/');
                pointer.push_str(&k.replace('~', "~0").replace('/', "~1"));
                collect_leaf_pointers(val, pointer, out);
                pointer.truncate(len);
            }
        }
        _ => out.push(pointer.clone()),
    }
}
