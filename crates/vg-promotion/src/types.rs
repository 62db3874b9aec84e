use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vg_schemas::ModelError;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Output of the training pipeline, handed to the gate.
///
/// `f1_score` is the training-time F1 on the held-out set and is trusted as
/// is; only the incumbent gets re-scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengerModel {
    pub artifact_path: PathBuf,
    pub f1_score: f64,
}

impl ChallengerModel {
    pub fn new(artifact_path: impl Into<PathBuf>, f1_score: f64) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            f1_score,
        }
    }

    /// F1 must be a finite value in `[0, 1]`.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.f1_score.is_finite() && (0.0..=1.0).contains(&self.f1_score) {
            Ok(())
        } else {
            Err(ModelError::InvalidPrediction {
                detail: format!("challenger f1 {} is outside [0, 1]", self.f1_score),
            })
        }
    }
}

/// Where a gate reads and writes.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionPaths {
    pub active_model: PathBuf,
    pub archive_model: PathBuf,
    pub cycles_root: PathBuf,
    pub history_log: PathBuf,
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Outcome of comparing the challenger with the incumbent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub challenger_score: f64,
    /// `None` on cold start.
    pub incumbent_score: Option<f64>,
    pub accepted: bool,
    /// `challenger_score - incumbent_score.unwrap_or(0.0)`
    pub score_delta: f64,
}

impl EvaluationResult {
    /// Accept iff the challenger is strictly better than the incumbent
    /// (or than `0.0` on cold start). Ties keep the incumbent.
    pub fn decide(challenger_score: f64, incumbent_score: Option<f64>) -> Self {
        let baseline = incumbent_score.unwrap_or(0.0);
        Self {
            challenger_score,
            incumbent_score,
            accepted: challenger_score > baseline,
            score_delta: challenger_score - baseline,
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Written once per completed cycle, accepted or rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionRecord {
    pub cycle_id: Uuid,
    pub accepted: bool,
    /// Archive slot of this gate. Holds the challenger only when `accepted`.
    pub promoted_model_path: PathBuf,
    pub score_delta: f64,
    pub challenger_score: f64,
    pub incumbent_score: Option<f64>,
    pub decided_at_utc: DateTime<Utc>,
}

impl PromotionRecord {
    pub fn event_type(&self) -> &'static str {
        if self.accepted {
            "ACCEPTED"
        } else {
            "REJECTED"
        }
    }
}

/// Write the record as pretty-printed JSON to `out_dir/promotion_record.json`.
/// Returns the path written.
pub fn write_promotion_record_json(out_dir: &Path, record: &PromotionRecord) -> io::Result<PathBuf> {
    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join("promotion_record.json");
    let json = serde_json::to_string_pretty(record).map_err(io::Error::other)?;
    std::fs::write(&path, format!("{json}\n"))?;
    Ok(path)
}

// ---------------------------------------------------------------------------
// Cycle state + error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CycleState {
    Start,
    IncumbentResolved,
    Scored,
    Decided,
    Persisted,
    Aborted,
}

impl CycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleState::Start => "START",
            CycleState::IncumbentResolved => "INCUMBENT_RESOLVED",
            CycleState::Scored => "SCORED",
            CycleState::Decided => "DECIDED",
            CycleState::Persisted => "PERSISTED",
            CycleState::Aborted => "ABORTED",
        }
    }
}

impl std::fmt::Display for CycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cycle that did not reach `Persisted`. `stage` is the last state reached.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionError {
    pub cycle_id: Uuid,
    pub stage: CycleState,
    pub source: ModelError,
    /// True when both slots were already replaced before the failure, i.e.
    /// the promotion stands but its record could not be persisted.
    pub slots_published: bool,
}

impl PromotionError {
    pub fn kind(&self) -> &'static str {
        self.source.kind()
    }
}

impl std::fmt::Display for PromotionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "promotion cycle {} aborted at {}: {}",
            self.cycle_id, self.stage, self.source
        )?;
        if self.slots_published {
            write!(f, " (new model already active)")?;
        }
        Ok(())
    }
}

impl std::error::Error for PromotionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
