use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use vg_schemas::ModelError;

use crate::model::ModelArtifact;
use crate::slot::ArtifactSlot;

/// Resolve the model stored at `path`.
///
/// - nothing at `path` → `Ok(None)`: cold start, never an error
/// - bytes present but not a valid model → `Err(CorruptArtifact)`
/// - any other read failure → `Err(Io)`
///
/// Reads the file exactly once, so a concurrent atomic publish is observed
/// either entirely or not at all.
pub fn load_incumbent(path: &Path) -> Result<Option<ModelArtifact>, ModelError> {
    match fs::read(path) {
        Ok(bytes) => ModelArtifact::from_bytes(&bytes, path).map(Some),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ModelError::io(path, &e)),
    }
}

/// Load a model that must exist (e.g. a challenger handed over by training).
pub fn load_model(path: &Path) -> Result<ModelArtifact, ModelError> {
    let bytes = fs::read(path).map_err(|e| ModelError::io(path, &e))?;
    ModelArtifact::from_bytes(&bytes, path)
}

/// Persist `model` at `path` with the same atomic publish the slots use.
pub fn save_model(path: &Path, model: &ModelArtifact) -> Result<(), ModelError> {
    ArtifactSlot::new(path).publish(&model.to_bytes()?)
}
