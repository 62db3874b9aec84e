use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Written at the start of every promotion cycle, before any decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleManifest {
    pub schema_version: i32,
    pub cycle_id: Uuid,
    pub config_hash: String,
    pub challenger_path: String,
    pub challenger_f1: f64,
    pub active_slot: String,
    pub archive_slot: String,
    pub created_at_utc: DateTime<Utc>,
}

pub struct InitCycleArtifactsArgs<'a> {
    pub cycles_root: &'a Path,
    pub cycle_id: Uuid,
    pub config_hash: &'a str,
    pub challenger_path: &'a Path,
    pub challenger_f1: f64,
    pub active_slot: &'a Path,
    pub archive_slot: &'a Path,
}

pub struct InitCycleArtifactsResult {
    pub cycle_dir: PathBuf,
    pub manifest_path: PathBuf,
}

/// Create `<cycles_root>/<cycle_id>/manifest.json`.
pub fn init_cycle_artifacts(args: InitCycleArtifactsArgs<'_>) -> Result<InitCycleArtifactsResult> {
    let cycle_dir = args.cycles_root.join(args.cycle_id.to_string());
    fs::create_dir_all(&cycle_dir)
        .with_context(|| format!("create cycle dir failed: {}", cycle_dir.display()))?;

    let manifest = CycleManifest {
        schema_version: 1,
        cycle_id: args.cycle_id,
        config_hash: args.config_hash.to_string(),
        challenger_path: args.challenger_path.display().to_string(),
        challenger_f1: args.challenger_f1,
        active_slot: args.active_slot.display().to_string(),
        archive_slot: args.archive_slot.display().to_string(),
        created_at_utc: Utc::now(),
    };

    let manifest_path = cycle_dir.join("manifest.json");
    let json = serde_json::to_string_pretty(&manifest).context("serialize manifest failed")?;
    fs::write(&manifest_path, format!("{json}\n"))
        .with_context(|| format!("write manifest failed: {}", manifest_path.display()))?;

    Ok(InitCycleArtifactsResult {
        cycle_dir,
        manifest_path,
    })
}
