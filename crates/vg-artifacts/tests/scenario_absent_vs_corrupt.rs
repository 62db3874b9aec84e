//! Incumbent resolution.
//!
//! GREEN when:
//! - a missing path resolves to `None` (cold start)
//! - garbage, truncated or empty bytes fail with CORRUPT_ARTIFACT
//! - a valid artifact loads unchanged
//! - resolution has no side effects on the filesystem

use std::fs;

use tempfile::tempdir;
use vg_artifacts::{load_incumbent, load_model, save_model, LinearClassifier, ModelArtifact};
use vg_schemas::{canonical_columns, ModelError};

fn sample_model() -> ModelArtifact {
    ModelArtifact::new(
        canonical_columns(),
        LinearClassifier {
            intercept: 0.25,
            ..Default::default()
        },
    )
}

#[test]
fn missing_path_is_absent_not_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("serving").join("model.json");

    assert_eq!(load_incumbent(&path).unwrap(), None);
    assert!(!path.exists(), "resolution must not create the slot");
    assert!(!dir.path().join("serving").exists());
}

#[test]
fn garbage_bytes_are_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.json");
    fs::write(&path, b"\x00\x01not a model").unwrap();

    let err = load_incumbent(&path).unwrap_err();
    match err {
        ModelError::CorruptArtifact { path: p, .. } => {
            assert_eq!(p, path.display().to_string());
        }
        other => panic!("expected CorruptArtifact, got {other:?}"),
    }
}

#[test]
fn empty_and_truncated_files_are_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.json");

    fs::write(&path, b"").unwrap();
    assert_eq!(load_incumbent(&path).unwrap_err().kind(), "CORRUPT_ARTIFACT");

    let bytes = sample_model().to_bytes().unwrap();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
    assert_eq!(load_incumbent(&path).unwrap_err().kind(), "CORRUPT_ARTIFACT");
}

#[test]
fn wrong_feature_schema_in_artifact_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.json");

    let mut m = sample_model();
    m.feature_columns.retain(|c| c != "company_age");
    fs::write(&path, serde_json::to_vec(&m).unwrap()).unwrap();

    assert_eq!(load_incumbent(&path).unwrap_err().kind(), "CORRUPT_ARTIFACT");
}

#[test]
fn valid_artifact_loads_unchanged() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.json");
    let m = sample_model();
    save_model(&path, &m).unwrap();

    assert_eq!(load_incumbent(&path).unwrap(), Some(m.clone()));
    assert_eq!(load_model(&path).unwrap(), m);
}

#[test]
fn load_model_requires_presence() {
    let dir = tempdir().unwrap();
    let err = load_model(&dir.path().join("nope.json")).unwrap_err();
    assert_eq!(err.kind(), "IO");
}
