//! vg-artifacts
//!
//! Everything that touches persisted model bytes:
//! - [`ModelArtifact`]: the serialized, servable classifier
//! - [`load_incumbent`]: absent (`Ok(None)`) vs corrupt (`Err(CorruptArtifact)`)
//! - [`ArtifactSlot`]: a named location published by temp-file + rename and
//!   guarded by an advisory lock
//! - [`init_cycle_artifacts`]: per-cycle directory + manifest

mod loader;
mod manifest;
mod model;
mod slot;

pub use loader::{load_incumbent, load_model, save_model};
pub use manifest::{init_cycle_artifacts, CycleManifest, InitCycleArtifactsArgs, InitCycleArtifactsResult};
pub use model::{LinearClassifier, ModelArtifact, NumericTerm, MODEL_SCHEMA_VERSION};
pub use slot::{ArtifactSlot, SlotLock};
