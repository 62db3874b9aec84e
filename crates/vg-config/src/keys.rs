use std::collections::BTreeSet;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ConfigMode;

/// One `/section/key` leaf the gate understands, and the modes that read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingKey {
    pub pointer: &'static str,
    pub promote: bool,
    pub serve: bool,
}

impl SettingKey {
    const fn both(pointer: &'static str) -> Self {
        Self { pointer, promote: true, serve: true }
    }

    const fn promote_only(pointer: &'static str) -> Self {
        Self { pointer, promote: true, serve: false }
    }

    pub fn read_in(&self, mode: ConfigMode) -> bool {
        match mode {
            ConfigMode::Promote => self.promote,
            ConfigMode::Serve => self.serve,
        }
    }

    /// The value at this key, or `None` when absent or when `mode` never
    /// reads it. [`crate::GateSettings`] only looks values up through here,
    /// so the lint below cannot drift from the typed reader.
    pub fn lookup<'a>(&self, v: &'a Value, mode: ConfigMode) -> Option<&'a Value> {
        if !self.read_in(mode) {
            return None;
        }
        v.pointer(self.pointer).filter(|x| !x.is_null())
    }
}

pub const ACTIVE_MODEL_PATH: SettingKey = SettingKey::both("/storage/active_model_path");
pub const ARCHIVE_MODEL_PATH: SettingKey = SettingKey::both("/storage/archive_model_path");
pub const CYCLES_ROOT: SettingKey = SettingKey::both("/storage/cycles_root");
pub const HISTORY_LOG: SettingKey = SettingKey::both("/storage/history_log");
pub const TEST_DATASET_PATH: SettingKey = SettingKey::promote_only("/evaluation/test_dataset_path");
pub const CURRENT_YEAR: SettingKey = SettingKey::promote_only("/evaluation/current_year");
pub const DAEMON_ADDR: SettingKey = SettingKey::both("/daemon/addr");

pub const SETTING_KEYS: &[SettingKey] = &[
    ACTIVE_MODEL_PATH,
    ARCHIVE_MODEL_PATH,
    CYCLES_ROOT,
    HISTORY_LOG,
    TEST_DATASET_PATH,
    CURRENT_YEAR,
    DAEMON_ADDR,
];

/// Pointers read in `mode`, in table order.
pub fn consumed_pointers_for_mode(mode: ConfigMode) -> Vec<&'static str> {
    SETTING_KEYS
        .iter()
        .filter(|k| k.read_in(mode))
        .map(|k| k.pointer)
        .collect()
}

// ---------------------------------------------------------------------------
// Unused-key lint
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    pub mode: String,
    /// Sorted pointers present in the config that `mode` never reads.
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Report config entries the given mode ignores.
///
/// The config is two levels deep (`section: { key: value }`). A section that
/// is not a mapping is reported as `/section`. Whatever sits under a known key
/// is that key's value; `GateSettings` rejects it if it has the wrong shape.
pub fn report_unused_keys(
    mode: ConfigMode,
    config_json: &Value,
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeyReport> {
    let consumed: BTreeSet<&str> = consumed_pointers_for_mode(mode).into_iter().collect();

    let unused: Vec<String> = present_pointers(config_json)
        .into_iter()
        .filter(|p| !consumed.contains(p.as_str()))
        .collect();

    let report = UnusedKeyReport {
        mode: mode.as_str().to_string(),
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        bail!(
            "CONFIG_UNUSED_KEYS (mode={}): {} key(s) not read in this mode: {:?}",
            report.mode,
            report.unused_leaf_pointers.len(),
            report.unused_leaf_pointers
        );
    }

    Ok(report)
}

fn present_pointers(v: &Value) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    let Value::Object(sections) = v else {
        out.insert("/".to_string());
        return out;
    };
    for (section, body) in sections {
        match body {
            Value::Object(keys) if !keys.is_empty() => {
                out.extend(keys.keys().map(|k| format!("/{section}/{k}")));
            }
            _ => {
                out.insert(format!("/{section}"));
            }
        }
    }
    out
}
