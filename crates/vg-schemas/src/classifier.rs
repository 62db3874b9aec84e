use crate::error::ModelError;
use crate::features::FeatureFrame;

/// A servable binary classifier.
///
/// Implementations must be deterministic: the same frame always yields the
/// same labels. Labels are the binary encoding of
/// [`crate::TargetValueMapping`].
pub trait Classifier {
    /// Feature columns the model was trained on, in training order.
    fn feature_columns(&self) -> &[String];

    /// One label per row of `frame`.
    ///
    /// Implementations should fail with `FeatureSchemaMismatch` when
    /// `frame.columns()` differs from [`Classifier::feature_columns`].
    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<u8>, ModelError>;
}
