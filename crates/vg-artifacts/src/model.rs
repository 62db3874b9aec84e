use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vg_schemas::{
    ensure_same_schema, Classifier, FeatureFrame, FeatureRow, FeatureValue, ModelError,
    NUMERIC_COLUMNS,
};

pub const MODEL_SCHEMA_VERSION: i32 = 1;

// ---------------------------------------------------------------------------
// Classifier body
// ---------------------------------------------------------------------------

/// Standardized numeric contribution: `weight * (x - center) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericTerm {
    pub center: f64,
    pub scale: f64,
    pub weight: f64,
}

/// Linear decision function over one-hot categoricals and standardized
/// numerics. Label is `1` iff the decision value is strictly above
/// `threshold`. Unseen category values contribute nothing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub intercept: f64,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub numeric: BTreeMap<String, NumericTerm>,
    /// column -> category value -> weight
    #[serde(default)]
    pub categorical: BTreeMap<String, BTreeMap<String, f64>>,
}

impl LinearClassifier {
    pub fn decision_value(&self, row: &FeatureRow) -> f64 {
        let mut z = self.intercept;
        for (col, term) in &self.numeric {
            if let Some(FeatureValue::Numeric(x)) = row.value(col) {
                z += term.weight * (x - term.center) / term.scale;
            }
        }
        for (col, weights) in &self.categorical {
            if let Some(FeatureValue::Categorical(v)) = row.value(col) {
                z += weights.get(v).copied().unwrap_or(0.0);
            }
        }
        z
    }

    pub fn predict_row(&self, row: &FeatureRow) -> u8 {
        u8::from(self.decision_value(row) > self.threshold)
    }
}

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// A trained model as persisted in a slot. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelArtifact {
    pub schema_version: i32,
    pub model_id: Uuid,
    pub trained_at_utc: DateTime<Utc>,
    /// Training-time feature columns, in training order.
    pub feature_columns: Vec<String>,
    pub classifier: LinearClassifier,
}

impl ModelArtifact {
    pub fn new(feature_columns: Vec<String>, classifier: LinearClassifier) -> Self {
        Self {
            schema_version: MODEL_SCHEMA_VERSION,
            model_id: Uuid::new_v4(),
            trained_at_utc: Utc::now(),
            feature_columns,
            classifier,
        }
    }

    /// Deserialize and validate. Any failure is `CorruptArtifact` naming `origin`.
    pub fn from_bytes(bytes: &[u8], origin: &Path) -> Result<Self, ModelError> {
        let corrupt = |reason: String| ModelError::CorruptArtifact {
            path: origin.display().to_string(),
            reason,
        };

        let artifact: ModelArtifact =
            serde_json::from_slice(bytes).map_err(|e| corrupt(e.to_string()))?;
        artifact.validate().map_err(corrupt)?;
        Ok(artifact)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ModelError> {
        self.validate().map_err(|reason| ModelError::CorruptArtifact {
            path: format!("<model {}>", self.model_id),
            reason,
        })?;
        let mut bytes =
            serde_json::to_vec_pretty(self).map_err(|e| ModelError::CorruptArtifact {
                path: format!("<model {}>", self.model_id),
                reason: e.to_string(),
            })?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    fn validate(&self) -> Result<(), String> {
        if self.schema_version != MODEL_SCHEMA_VERSION {
            return Err(format!(
                "unsupported schema_version {} (supported: {})",
                self.schema_version, MODEL_SCHEMA_VERSION
            ));
        }
        FeatureFrame::new(self.feature_columns.clone(), Vec::new()).map_err(|e| e.to_string())?;

        let c = &self.classifier;
        if !c.intercept.is_finite() || !c.threshold.is_finite() {
            return Err("non-finite intercept or threshold".to_string());
        }
        for (col, term) in &c.numeric {
            if !NUMERIC_COLUMNS.contains(&col.as_str()) {
                return Err(format!("numeric term on non-numeric column '{col}'"));
            }
            if !(term.center.is_finite() && term.weight.is_finite() && term.scale.is_finite())
                || term.scale == 0.0
            {
                return Err(format!("invalid numeric term for '{col}'"));
            }
        }
        for (col, weights) in &c.categorical {
            if NUMERIC_COLUMNS.contains(&col.as_str())
                || !self.feature_columns.iter().any(|f| f == col)
            {
                return Err(format!("categorical term on unknown or numeric column '{col}'"));
            }
            if weights.values().any(|w| !w.is_finite()) {
                return Err(format!("non-finite categorical weight for '{col}'"));
            }
        }
        Ok(())
    }
}

impl Classifier for ModelArtifact {
    fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<u8>, ModelError> {
        ensure_same_schema(&self.feature_columns, frame.columns())?;
        Ok(frame
            .rows()
            .iter()
            .map(|row| self.classifier.predict_row(row))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vg_schemas::canonical_columns;

    fn row(continent: &str, wage: f64) -> FeatureRow {
        FeatureRow {
            continent: continent.to_string(),
            education_of_employee: "Bachelor's".to_string(),
            has_job_experience: "Y".to_string(),
            requires_job_training: "N".to_string(),
            no_of_employees: 100,
            region_of_employment: "West".to_string(),
            prevailing_wage: wage,
            unit_of_wage: "Year".to_string(),
            full_time_position: "Y".to_string(),
            company_age: 10,
        }
    }

    fn model() -> ModelArtifact {
        let mut classifier = LinearClassifier {
            intercept: -0.5,
            ..Default::default()
        };
        classifier.categorical.insert(
            "continent".to_string(),
            BTreeMap::from([("Asia".to_string(), 1.0)]),
        );
        classifier.numeric.insert(
            "prevailing_wage".to_string(),
            NumericTerm {
                center: 50_000.0,
                scale: 10_000.0,
                weight: -1.0,
            },
        );
        ModelArtifact::new(canonical_columns(), classifier)
    }

    #[test]
    fn decision_combines_terms() {
        let m = model();
        // -0.5 + 1.0 + (-1.0 * 0) = 0.5 > 0
        assert_eq!(m.classifier.predict_row(&row("Asia", 50_000.0)), 1);
        // -0.5 + 0 (unseen) + 0 = -0.5
        assert_eq!(m.classifier.predict_row(&row("Europe", 50_000.0)), 0);
        // -0.5 + 1.0 - 1.0 = -0.5
        assert_eq!(m.classifier.predict_row(&row("Asia", 60_000.0)), 0);
    }

    #[test]
    fn bytes_round_trip() {
        let m = model();
        let bytes = m.to_bytes().unwrap();
        let back = ModelArtifact::from_bytes(&bytes, Path::new("mem")).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn zero_scale_is_corrupt() {
        let mut m = model();
        m.classifier
            .numeric
            .get_mut("prevailing_wage")
            .unwrap()
            .scale = 0.0;
        let raw = serde_json::to_vec(&m).unwrap();
        let err = ModelArtifact::from_bytes(&raw, Path::new("slot.json")).unwrap_err();
        assert_eq!(err.kind(), "CORRUPT_ARTIFACT");
    }

    #[test]
    fn predict_rejects_reordered_frame() {
        let m = model();
        let mut cols = canonical_columns();
        cols.swap(3, 4);
        let frame = FeatureFrame::new(cols, vec![row("Asia", 1.0)]).unwrap();
        assert!(matches!(
            m.predict(&frame),
            Err(ModelError::FeatureSchemaMismatch { .. })
        ));
    }
}
