use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;
use vg_artifacts::{ArtifactSlot, ModelArtifact};
use vg_schemas::{Classifier, FeatureFrame, FeatureRow, ModelError, VisaOutcome};

/// One answered request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: u8,
    pub outcome: VisaOutcome,
    /// Model that produced the label.
    pub model_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct Predictor {
    slot: ArtifactSlot,
}

impl Predictor {
    pub fn new(slot: ArtifactSlot) -> Self {
        Self { slot }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(ArtifactSlot::new(path))
    }

    pub fn slot(&self) -> &ArtifactSlot {
        &self.slot
    }

    pub fn predict(&self, row: &FeatureRow) -> Result<VisaOutcome, ModelError> {
        Ok(self.predict_label(row)?.outcome)
    }

    /// Validate raw form fields, then predict.
    pub fn predict_fields(&self, fields: &BTreeMap<String, String>) -> Result<Prediction, ModelError> {
        let row = FeatureRow::from_fields(fields)?;
        self.predict_label(&row)
    }

    /// Snapshot the active slot once and classify `row` with it.
    ///
    /// - empty slot → `NoModelDeployed`
    /// - model trained on a different column order → `FeatureSchemaMismatch`
    pub fn predict_label(&self, row: &FeatureRow) -> Result<Prediction, ModelError> {
        let model = self.current_model()?;
        let labels = model.predict(&FeatureFrame::single(row.clone()))?;
        let label = match labels.as_slice() {
            [label] => *label,
            other => {
                return Err(ModelError::InvalidPrediction {
                    detail: format!("expected 1 label, got {}", other.len()),
                })
            }
        };
        let outcome = VisaOutcome::from_label(label)?;

        debug!(
            model_id = %model.model_id,
            label,
            outcome = %outcome,
            "prediction served"
        );
        Ok(Prediction {
            label,
            outcome,
            model_id: model.model_id,
        })
    }

    /// The model currently deployed, if any. Errors only on unreadable or
    /// corrupt slot content.
    pub fn deployed_model(&self) -> Result<Option<ModelArtifact>, ModelError> {
        match self.slot.read()? {
            Some(bytes) => ModelArtifact::from_bytes(&bytes, self.slot.path()).map(Some),
            None => Ok(None),
        }
    }

    fn current_model(&self) -> Result<ModelArtifact, ModelError> {
        self.deployed_model()?.ok_or_else(|| ModelError::NoModelDeployed {
            slot: self.slot.path().display().to_string(),
        })
    }
}
