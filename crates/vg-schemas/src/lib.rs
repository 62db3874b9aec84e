//! vg-schemas
//!
//! Shared vocabulary for the promotion gate and the predictor:
//! - the training-time feature schema (column names, order, typed row)
//! - the fixed target-label mapping and the outcome mapping shown to users
//! - the `Classifier` capability every servable model implements
//! - the `ModelError` taxonomy shared by loader, evaluator and predictor
//!
//! Pure types. No IO.

mod classifier;
mod error;
mod features;
mod labels;

pub use classifier::Classifier;
pub use error::ModelError;
pub use features::{
    canonical_columns, ensure_same_schema, FeatureFrame, FeatureRow, FeatureValue,
    CASE_ID_COLUMN, COMPANY_AGE_COLUMN, ESTABLISHMENT_YEAR_COLUMN, FEATURE_COLUMNS,
    NUMERIC_COLUMNS, TARGET_COLUMN, WAGE_UNITS,
};
pub use labels::{CaseStatus, TargetValueMapping, VisaOutcome, POSITIVE_LABEL};
