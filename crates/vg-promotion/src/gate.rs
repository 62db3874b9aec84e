use std::fs;
use std::path::Path;

use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;
use vg_artifacts::{
    init_cycle_artifacts, load_incumbent, ArtifactSlot, InitCycleArtifactsArgs, ModelArtifact,
};
use vg_audit::AuditWriter;
use vg_config::GateSettings;
use vg_eval::{score, EvaluationDataset};
use vg_schemas::{canonical_columns, ensure_same_schema, ModelError};

use crate::types::{
    write_promotion_record_json, ChallengerModel, CycleState, EvaluationResult, PromotionError,
    PromotionPaths, PromotionRecord,
};

const HISTORY_TOPIC: &str = "promotion";

/// Decides whether a freshly trained challenger replaces the serving model.
///
/// One call to [`PromotionGate::run_cycle`] is one cycle. Cycles against the
/// same active slot are serialized by the slot's advisory lock, so two
/// processes (or threads) can never interleave resolve/decide/publish.
#[derive(Debug, Clone)]
pub struct PromotionGate {
    active: ArtifactSlot,
    archive: ArtifactSlot,
    paths: PromotionPaths,
}

struct Progress {
    cycle_id: Uuid,
    stage: CycleState,
    slots_published: bool,
}

impl Progress {
    fn advance(&mut self, next: CycleState) {
        self.stage = next;
        info!(cycle_id = %self.cycle_id, stage = %next, "promotion cycle advanced");
    }
}

impl PromotionGate {
    pub fn new(paths: PromotionPaths) -> Self {
        Self {
            active: ArtifactSlot::new(&paths.active_model),
            archive: ArtifactSlot::new(&paths.archive_model),
            paths,
        }
    }

    pub fn from_settings(settings: &GateSettings) -> Self {
        Self::new(PromotionPaths {
            active_model: settings.active_model_path.clone(),
            archive_model: settings.archive_model_path.clone(),
            cycles_root: settings.cycles_root.clone(),
            history_log: settings.history_log.clone(),
        })
    }

    pub fn active_slot(&self) -> &ArtifactSlot {
        &self.active
    }

    pub fn archive_slot(&self) -> &ArtifactSlot {
        &self.archive
    }

    pub fn paths(&self) -> &PromotionPaths {
        &self.paths
    }

    /// Run one promotion cycle.
    ///
    /// Resolves and re-scores the incumbent on `dataset`, compares it with
    /// the challenger's training-time F1 and, on acceptance, publishes the
    /// challenger to the archive slot and then the active slot. Every
    /// completed cycle writes `promotion_record.json` into its cycle directory
    /// and appends `ACCEPTED`/`REJECTED` to the history log. Failures append
    /// `ABORTED` (best effort) and leave the active slot as it was, unless
    /// both publishes had already succeeded.
    pub fn run_cycle(
        &self,
        challenger: &ChallengerModel,
        dataset: &EvaluationDataset,
        config_hash: &str,
    ) -> Result<PromotionRecord, PromotionError> {
        let mut progress = Progress {
            cycle_id: Uuid::new_v4(),
            stage: CycleState::Start,
            slots_published: false,
        };
        info!(
            cycle_id = %progress.cycle_id,
            challenger = %challenger.artifact_path.display(),
            challenger_f1 = challenger.f1_score,
            "promotion cycle started"
        );

        let _lock = self
            .active
            .lock()
            .map_err(|source| self.fail(&progress, source))?;

        match self.run_locked(&mut progress, challenger, dataset, config_hash) {
            Ok(record) => Ok(record),
            Err(source) => {
                self.append_aborted(&progress, &source);
                Err(self.fail(&progress, source))
            }
        }
    }

    fn run_locked(
        &self,
        progress: &mut Progress,
        challenger: &ChallengerModel,
        dataset: &EvaluationDataset,
        config_hash: &str,
    ) -> Result<PromotionRecord, ModelError> {
        challenger.validate()?;

        let cycle = init_cycle_artifacts(InitCycleArtifactsArgs {
            cycles_root: &self.paths.cycles_root,
            cycle_id: progress.cycle_id,
            config_hash,
            challenger_path: &challenger.artifact_path,
            challenger_f1: challenger.f1_score,
            active_slot: self.active.path(),
            archive_slot: self.archive.path(),
        })
        .map_err(|e| anyhow_io(&self.paths.cycles_root, &e))?;

        let incumbent = load_incumbent(self.active.path())?;
        progress.advance(CycleState::IncumbentResolved);

        let incumbent_score = match &incumbent {
            Some(model) => {
                let s = score(model, dataset)?;
                progress.advance(CycleState::Scored);
                Some(s)
            }
            None => {
                info!(cycle_id = %progress.cycle_id, "no incumbent deployed; cold start");
                None
            }
        };

        let evaluation = EvaluationResult::decide(challenger.f1_score, incumbent_score);
        progress.advance(CycleState::Decided);

        if evaluation.accepted {
            info!(
                cycle_id = %progress.cycle_id,
                challenger_f1 = evaluation.challenger_score,
                incumbent_f1 = ?evaluation.incumbent_score,
                score_delta = evaluation.score_delta,
                "challenger accepted"
            );
            self.publish_challenger(challenger)?;
            progress.slots_published = true;
        } else {
            warn!(
                cycle_id = %progress.cycle_id,
                challenger_f1 = evaluation.challenger_score,
                incumbent_f1 = ?evaluation.incumbent_score,
                score_delta = evaluation.score_delta,
                "challenger rejected; incumbent kept"
            );
        }

        let record = PromotionRecord {
            cycle_id: progress.cycle_id,
            accepted: evaluation.accepted,
            promoted_model_path: self.archive.path().to_path_buf(),
            score_delta: evaluation.score_delta,
            challenger_score: evaluation.challenger_score,
            incumbent_score: evaluation.incumbent_score,
            decided_at_utc: Utc::now(),
        };

        write_promotion_record_json(&cycle.cycle_dir, &record)
            .map_err(|e| ModelError::io(&cycle.cycle_dir, &e))?;
        self.append_history(progress.cycle_id, record.event_type(), record_payload(&record))?;

        progress.advance(CycleState::Persisted);
        Ok(record)
    }

    /// Copy the challenger bytes to the archive slot, then the active slot.
    ///
    /// The bytes are validated first, so a corrupt or mismatched challenger
    /// never reaches either slot.
    fn publish_challenger(&self, challenger: &ChallengerModel) -> Result<(), ModelError> {
        let path = &challenger.artifact_path;
        let bytes = fs::read(path).map_err(|e| ModelError::io(path, &e))?;
        let model = ModelArtifact::from_bytes(&bytes, path)?;
        ensure_same_schema(&canonical_columns(), &model.feature_columns)?;

        self.archive.publish(&bytes)?;
        self.active.publish(&bytes)?;
        info!(
            model_id = %model.model_id,
            archive = %self.archive.path().display(),
            active = %self.active.path().display(),
            "challenger published"
        );
        Ok(())
    }

    fn append_history(
        &self,
        cycle_id: Uuid,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<(), ModelError> {
        let log = &self.paths.history_log;
        let mut writer = AuditWriter::resume(log).map_err(|e| anyhow_io(log, &e))?;
        writer
            .append(cycle_id, HISTORY_TOPIC, event_type, payload)
            .map_err(|e| anyhow_io(log, &e))?;
        Ok(())
    }

    fn append_aborted(&self, progress: &Progress, source: &ModelError) {
        error!(
            cycle_id = %progress.cycle_id,
            stage = %progress.stage,
            kind = source.kind(),
            slots_published = progress.slots_published,
            error = %source,
            "promotion cycle aborted"
        );
        let payload = json!({
            "stage": progress.stage.as_str(),
            "kind": source.kind(),
            "error": source.to_string(),
            "slots_published": progress.slots_published,
        });
        if let Err(e) = self.append_history(progress.cycle_id, "ABORTED", payload) {
            warn!(cycle_id = %progress.cycle_id, error = %e, "could not record aborted cycle");
        }
    }

    fn fail(&self, progress: &Progress, source: ModelError) -> PromotionError {
        PromotionError {
            cycle_id: progress.cycle_id,
            stage: progress.stage,
            source,
            slots_published: progress.slots_published,
        }
    }
}

fn record_payload(record: &PromotionRecord) -> serde_json::Value {
    json!({
        "accepted": record.accepted,
        "promoted_model_path": record.promoted_model_path.display().to_string(),
        "score_delta": record.score_delta,
        "challenger_score": record.challenger_score,
        "incumbent_score": record.incumbent_score,
        "decided_at_utc": record.decided_at_utc.to_rfc3339(),
    })
}

fn anyhow_io(path: &Path, e: &anyhow::Error) -> ModelError {
    ModelError::Io {
        path: path.display().to_string(),
        reason: format!("{e:#}"),
    }
}
