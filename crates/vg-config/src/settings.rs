use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Datelike;
use serde_json::Value;

use crate::keys::{
    SettingKey, ACTIVE_MODEL_PATH, ARCHIVE_MODEL_PATH, CURRENT_YEAR, CYCLES_ROOT, DAEMON_ADDR,
    HISTORY_LOG, TEST_DATASET_PATH,
};
use crate::ConfigMode;

pub const DEFAULT_DAEMON_ADDR: &str = "127.0.0.1:8899";

/// Typed view of the merged config.
#[derive(Debug, Clone, PartialEq)]
pub struct GateSettings {
    /// Active-serving slot read by the predictor.
    pub active_model_path: PathBuf,
    /// Evaluation-archive slot written before the active slot on acceptance.
    pub archive_model_path: PathBuf,
    /// Root of per-cycle directories (`<root>/<cycle_id>/`).
    pub cycles_root: PathBuf,
    /// Hash-chained JSONL history of every cycle.
    pub history_log: PathBuf,
    /// Held-out CSV. Required in `Promote` mode only.
    pub test_dataset_path: Option<PathBuf>,
    /// Year used to derive `company_age`. Defaults to the current UTC year,
    /// and always does in `Serve` mode.
    pub current_year: i32,
    pub daemon_addr: SocketAddr,
}

impl GateSettings {
    /// Every value is looked up through [`SettingKey::lookup`], so a key
    /// outside `mode` is never read here and always shows up in the lint.
    pub fn from_config_json(mode: ConfigMode, v: &Value) -> Result<Self> {
        let active_model_path = required_path(v, mode, &ACTIVE_MODEL_PATH)?;
        let archive_model_path = required_path(v, mode, &ARCHIVE_MODEL_PATH)?;
        let cycles_root = required_path(v, mode, &CYCLES_ROOT)?;
        let history_log = required_path(v, mode, &HISTORY_LOG)?;

        if active_model_path == archive_model_path {
            bail!("CONFIG_INVALID: active and archive slots must be distinct paths");
        }

        let test_dataset_path = match mode {
            ConfigMode::Promote => Some(required_path(v, mode, &TEST_DATASET_PATH)?),
            ConfigMode::Serve => None,
        };

        let current_year = match CURRENT_YEAR.lookup(v, mode) {
            None => chrono::Utc::now().year(),
            Some(raw) => {
                let y = raw
                    .as_i64()
                    .with_context(|| format!("CONFIG_INVALID: {} must be an integer", CURRENT_YEAR.pointer))?;
                i32::try_from(y)
                    .with_context(|| format!("CONFIG_INVALID: {} out of range", CURRENT_YEAR.pointer))?
            }
        };

        let daemon_addr = optional_str(v, mode, &DAEMON_ADDR)?
            .unwrap_or_else(|| DEFAULT_DAEMON_ADDR.to_string())
            .parse::<SocketAddr>()
            .with_context(|| format!("CONFIG_INVALID: {} must be host:port", DAEMON_ADDR.pointer))?;

        Ok(Self {
            active_model_path,
            archive_model_path,
            cycles_root,
            history_log,
            test_dataset_path,
            current_year,
            daemon_addr,
        })
    }
}

fn optional_str(v: &Value, mode: ConfigMode, key: &SettingKey) -> Result<Option<String>> {
    match key.lookup(v, mode) {
        None => Ok(None),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(Some(s.trim().to_string())),
        Some(_) => bail!("CONFIG_INVALID: {} must be a non-empty string", key.pointer),
    }
}

fn required_path(v: &Value, mode: ConfigMode, key: &SettingKey) -> Result<PathBuf> {
    optional_str(v, mode, key)?
        .map(PathBuf::from)
        .with_context(|| format!("CONFIG_MISSING: {} is required", key.pointer))
}
