//! vg-eval
//!
//! Held-out evaluation of a [`vg_schemas::Classifier`]:
//! - [`EvaluationDataset`] loads the test CSV and applies the same feature
//!   engineering as training (`company_age = current_year - yr_of_estab`)
//! - [`score`] is the single metric the promotion gate compares: F1 over the
//!   positive class (label `1`, i.e. `Denied`)
//! - [`evaluate`] reports the full confusion breakdown for operators

mod dataset;
mod evaluator;
mod metrics;

pub use dataset::EvaluationDataset;
pub use evaluator::{evaluate, score};
pub use metrics::{ClassificationMetrics, ConfusionCounts};
