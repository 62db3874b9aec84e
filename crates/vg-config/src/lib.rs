//! vg-config
//!
//! Layered YAML configuration for the promotion gate and the predictor.
//! Documents are `section: { key: value }` mappings merged in order, so an
//! overlay replaces single keys and leaves sibling keys alone. The merged
//! tree is hashed (SHA-256 over canonical JSON) and every promotion cycle
//! stamps that hash into its manifest.
//!
//! [`GateSettings`] is the typed view the binaries consume. The
//! [`keys::SETTING_KEYS`] table drives both that view and the unused-key lint.

pub mod keys;
mod settings;

pub use keys::{
    consumed_pointers_for_mode, report_unused_keys, SettingKey, UnusedKeyPolicy, UnusedKeyReport,
    SETTING_KEYS,
};
pub use settings::{GateSettings, DEFAULT_DAEMON_ADDR};

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs;

/// Which surface is reading the config.
///
/// `Promote` runs a gate cycle (CLI `promote`/`evaluate`, daemon);
/// `Serve` only answers predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigMode {
    Promote,
    Serve,
}

impl ConfigMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigMode::Promote => "PROMOTE",
            ConfigMode::Serve => "SERVE",
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
    let mut docs: Vec<String> = Vec::with_capacity(paths.len());
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged: Map<String, Value> = Map::new();
    for (i, raw) in yaml_docs.iter().enumerate() {
        let v_yaml: serde_yaml::Value =
            serde_yaml::from_str(raw).with_context(|| format!("invalid yaml in layer {i}"))?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        overlay_sections(&mut merged, v_json, i)?;
    }

    // serde_json's default Map is ordered by key, so compact serialization is
    // canonical regardless of key order in the source documents.
    let config_json = Value::Object(merged);
    let canonical_json =
        serde_json::to_string(&config_json).context("canonical json serialize failed")?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json,
    })
}

/// Apply one layer. Keys inside a section replace earlier values whole; a
/// section that is not a mapping replaces the earlier section.
fn overlay_sections(base: &mut Map<String, Value>, layer: Value, index: usize) -> Result<()> {
    let sections = match layer {
        Value::Null => return Ok(()),
        Value::Object(m) => m,
        _ => bail!("CONFIG_INVALID: layer {index} must be a mapping of sections"),
    };

    for (name, body) in sections {
        let body = match (base.get_mut(&name), body) {
            (Some(Value::Object(existing)), Value::Object(keys)) => {
                existing.extend(keys);
                continue;
            }
            (_, body) => body,
        };
        base.insert(name, body);
    }
    Ok(())
}
