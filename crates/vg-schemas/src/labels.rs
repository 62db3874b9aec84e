use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// The class F1 is computed over.
pub const POSITIVE_LABEL: u8 = 1;

/// Raw `case_status` vocabulary of the visa dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseStatus {
    Certified,
    Denied,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Certified => "Certified",
            CaseStatus::Denied => "Denied",
        }
    }
}

/// Fixed bidirectional mapping between `case_status` values and the binary
/// encoding the model was trained on.
pub struct TargetValueMapping;

impl TargetValueMapping {
    pub const ENTRIES: [(CaseStatus, u8); 2] = [(CaseStatus::Certified, 0), (CaseStatus::Denied, 1)];

    /// Map a raw target value. `row` is only used for error context.
    pub fn encode(raw: &str, row: usize) -> Result<u8, ModelError> {
        let raw = raw.trim();
        Self::ENTRIES
            .iter()
            .find(|(status, _)| status.as_str() == raw)
            .map(|(_, label)| *label)
            .ok_or_else(|| ModelError::UnknownLabel {
                value: raw.to_string(),
                row,
            })
    }

    pub fn decode(label: u8) -> Result<CaseStatus, ModelError> {
        Self::ENTRIES
            .iter()
            .find(|(_, l)| *l == label)
            .map(|(status, _)| *status)
            .ok_or_else(|| ModelError::InvalidPrediction {
                detail: format!("label {label} is outside the binary encoding"),
            })
    }
}

/// Human-readable answer returned to the web form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisaOutcome {
    Approved,
    NotApproved,
}

impl VisaOutcome {
    /// Label → outcome goes through the target mapping: a predicted
    /// `Certified` is an approval, a predicted `Denied` is not.
    ///
    /// This deliberately differs from the legacy web front end, which showed
    /// "Visa-approved" for label `1` (`Denied`) against its own encoding.
    pub fn from_label(label: u8) -> Result<Self, ModelError> {
        Ok(match TargetValueMapping::decode(label)? {
            CaseStatus::Certified => VisaOutcome::Approved,
            CaseStatus::Denied => VisaOutcome::NotApproved,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VisaOutcome::Approved => "Visa-approved",
            VisaOutcome::NotApproved => "Visa Not-Approved",
        }
    }
}

impl std::fmt::Display for VisaOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
