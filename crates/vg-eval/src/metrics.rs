use serde::{Deserialize, Serialize};
use vg_schemas::POSITIVE_LABEL;

/// Binary confusion matrix with [`POSITIVE_LABEL`] as the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positive: u64,
    pub false_positive: u64,
    pub false_negative: u64,
    pub true_negative: u64,
}

impl ConfusionCounts {
    /// Tally aligned `(predicted, actual)` pairs. Extra elements of the longer
    /// slice are ignored; callers check lengths first.
    pub fn tally(predicted: &[u8], actual: &[u8]) -> Self {
        let mut c = Self::default();
        for (&p, &a) in predicted.iter().zip(actual) {
            match (p == POSITIVE_LABEL, a == POSITIVE_LABEL) {
                (true, true) => c.true_positive += 1,
                (true, false) => c.false_positive += 1,
                (false, true) => c.false_negative += 1,
                (false, false) => c.true_negative += 1,
            }
        }
        c
    }

    /// `2tp / (2tp + fp + fn)`, or `0.0` when the denominator is zero.
    pub fn f1(&self) -> f64 {
        let num = 2 * self.true_positive;
        let den = num + self.false_positive + self.false_negative;
        ratio(num, den)
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    pub fn total(&self) -> u64 {
        self.true_positive + self.false_positive + self.false_negative + self.true_negative
    }
}

// Single division of exact integer counts, so e.g. 8/10 is exactly 0.8.
fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Operator-facing breakdown produced by [`crate::evaluate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub f1: f64,
    pub precision: f64,
    pub recall: f64,
    /// Number of positive targets.
    pub support: u64,
    pub rows: u64,
    pub confusion: ConfusionCounts,
}

impl From<ConfusionCounts> for ClassificationMetrics {
    fn from(c: ConfusionCounts) -> Self {
        Self {
            f1: c.f1(),
            precision: c.precision(),
            recall: c.recall(),
            support: c.true_positive + c.false_negative,
            rows: c.total(),
            confusion: c,
        }
    }
}
