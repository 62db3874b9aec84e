//! vg-promotion
//!
//! Promotion gate for the visa-approval classifier. A cycle moves through
//! `Start -> IncumbentResolved -> Scored -> Decided -> Persisted`, or stops
//! at `Aborted` with the active slot untouched.

mod gate;
mod types;

pub use gate::PromotionGate;
pub use types::{
    write_promotion_record_json, ChallengerModel, CycleState, EvaluationResult, PromotionError,
    PromotionPaths, PromotionRecord,
};
