use tracing::debug;
use vg_schemas::{ensure_same_schema, Classifier, ModelError};

use crate::dataset::EvaluationDataset;
use crate::metrics::{ClassificationMetrics, ConfusionCounts};

/// F1 of `model` on `dataset`. Deterministic for a given model and dataset.
pub fn score<M: Classifier + ?Sized>(
    model: &M,
    dataset: &EvaluationDataset,
) -> Result<f64, ModelError> {
    Ok(evaluate(model, dataset)?.f1)
}

/// Full metric breakdown of `model` on `dataset`.
///
/// Errors:
/// - `InvalidDataset` if the dataset is empty
/// - `FeatureSchemaMismatch` if the dataset columns differ from the model's
///   training-time columns in name or order
/// - `InvalidPrediction` if the model returns the wrong number of labels or
///   a label outside `{0, 1}`
pub fn evaluate<M: Classifier + ?Sized>(
    model: &M,
    dataset: &EvaluationDataset,
) -> Result<ClassificationMetrics, ModelError> {
    if dataset.is_empty() {
        return Err(ModelError::InvalidDataset {
            reason: "dataset has no rows".to_string(),
        });
    }
    ensure_same_schema(model.feature_columns(), dataset.frame().columns())?;

    let predicted = model.predict(dataset.frame())?;
    if predicted.len() != dataset.len() {
        return Err(ModelError::InvalidPrediction {
            detail: format!(
                "model returned {} labels for {} rows",
                predicted.len(),
                dataset.len()
            ),
        });
    }
    if let Some((row, label)) = predicted.iter().enumerate().find(|(_, l)| **l > 1) {
        return Err(ModelError::InvalidPrediction {
            detail: format!("non-binary label {label} at row {row}"),
        });
    }

    let metrics = ClassificationMetrics::from(ConfusionCounts::tally(&predicted, dataset.targets()));
    debug!(
        rows = metrics.rows,
        f1 = metrics.f1,
        precision = metrics.precision,
        recall = metrics.recall,
        "model evaluated"
    );
    Ok(metrics)
}
