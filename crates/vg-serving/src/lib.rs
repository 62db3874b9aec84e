//! vg-serving
//!
//! Answers single-applicant predictions from whatever model currently sits
//! in the active slot. The slot is re-read on every call, so a promotion is
//! visible to the very next request without restarting anything.

mod form;
mod predictor;

pub use form::{fields_from_assignments, parse_assignment};
pub use predictor::{Prediction, Predictor};
