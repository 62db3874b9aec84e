use std::path::Path;

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Failures shared by the loader, the evaluator and the predictor.
///
/// A missing incumbent is *not* represented here: loaders return
/// `Ok(None)` for cold start so it can never be confused with corruption.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// The path exists but its bytes are not a valid model artifact.
    CorruptArtifact { path: String, reason: String },
    /// Feature columns (names or order) differ from the training-time schema,
    /// or an input field is missing / malformed.
    FeatureSchemaMismatch { detail: String },
    /// A target value outside the fixed label mapping.
    UnknownLabel { value: String, row: usize },
    /// The active-serving slot is empty.
    NoModelDeployed { slot: String },
    /// The evaluation dataset is empty or lacks the target column.
    InvalidDataset { reason: String },
    /// The model returned the wrong number of labels or a non-binary label.
    InvalidPrediction { detail: String },
    /// Filesystem failure other than "not found".
    Io { path: String, reason: String },
}

impl ModelError {
    /// Stable machine-readable code, used in logs, audit payloads and HTTP bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ModelError::CorruptArtifact { .. } => "CORRUPT_ARTIFACT",
            ModelError::FeatureSchemaMismatch { .. } => "FEATURE_SCHEMA_MISMATCH",
            ModelError::UnknownLabel { .. } => "UNKNOWN_LABEL",
            ModelError::NoModelDeployed { .. } => "NO_MODEL_DEPLOYED",
            ModelError::InvalidDataset { .. } => "INVALID_DATASET",
            ModelError::InvalidPrediction { .. } => "INVALID_PREDICTION",
            ModelError::Io { .. } => "IO",
        }
    }

    pub fn io(path: &Path, err: &std::io::Error) -> Self {
        ModelError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }

    pub fn schema(detail: impl Into<String>) -> Self {
        ModelError::FeatureSchemaMismatch {
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::CorruptArtifact { path, reason } => {
                write!(f, "corrupt model artifact at {path}: {reason}")
            }
            ModelError::FeatureSchemaMismatch { detail } => {
                write!(f, "feature schema mismatch: {detail}")
            }
            ModelError::UnknownLabel { value, row } => {
                write!(f, "unknown target label {value:?} at row {row}")
            }
            ModelError::NoModelDeployed { slot } => {
                write!(f, "no model deployed in active slot {slot}")
            }
            ModelError::InvalidDataset { reason } => write!(f, "invalid dataset: {reason}"),
            ModelError::InvalidPrediction { detail } => write!(f, "invalid prediction: {detail}"),
            ModelError::Io { path, reason } => write!(f, "io failure at {path}: {reason}"),
        }
    }
}

impl std::error::Error for ModelError {}
