//! Command handler modules for the `vg` CLI.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod predict;
pub mod promote;

use anyhow::{Context, Result};
use tracing::warn;
use vg_audit::VerifyResult;
use vg_config::{ConfigMode, GateSettings, LoadedConfig, UnusedKeyPolicy};
use vg_schemas::ModelError;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Logs go to stderr; stdout carries `key=value` results only.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// Load layered config, warn on keys this mode never reads, and build the
/// typed settings.
pub fn load_settings(config_paths: &[String], mode: ConfigMode) -> Result<(LoadedConfig, GateSettings)> {
    let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = vg_config::load_layered_yaml(&path_refs)?;

    let report = vg_config::report_unused_keys(mode, &loaded.config_json, UnusedKeyPolicy::Warn)?;
    if !report.is_clean() {
        warn!(
            mode = mode.as_str(),
            unused = ?report.unused_leaf_pointers,
            "config contains keys this command does not read"
        );
    }

    let settings = GateSettings::from_config_json(mode, &loaded.config_json)
        .with_context(|| format!("invalid config for mode {}", mode.as_str()))?;
    Ok((loaded, settings))
}

/// Surface the stable error kind first so operators and scripts can match on it.
pub fn model_err(e: ModelError) -> anyhow::Error {
    anyhow::anyhow!("{}: {}", e.kind(), e)
}

pub fn run_audit_verify(path: &str) -> Result<()> {
    match vg_audit::verify_hash_chain(path)? {
        VerifyResult::Valid { lines } => {
            println!("chain=valid lines={lines}");
            Ok(())
        }
        VerifyResult::Broken { line, reason } => {
            println!("chain=broken line={line}");
            anyhow::bail!("AUDIT_CHAIN_BROKEN: line {line}: {reason}")
        }
    }
}
