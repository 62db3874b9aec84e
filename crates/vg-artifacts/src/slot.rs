use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;
use uuid::Uuid;
use vg_schemas::ModelError;

const LOCK_SUFFIX: &str = ".lock";

// ---------------------------------------------------------------------------
// ArtifactSlot
// ---------------------------------------------------------------------------

/// A single named location holding at most one serialized artifact.
///
/// Readers see either the previous complete bytes or the new complete bytes:
/// [`ArtifactSlot::publish`] writes a sibling temp file, fsyncs it, then
/// renames it over the slot. Nothing ever writes the slot path in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSlot {
    path: PathBuf,
}

impl ArtifactSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(LOCK_SUFFIX);
        PathBuf::from(name)
    }

    pub fn is_occupied(&self) -> bool {
        self.path.is_file()
    }

    /// Current bytes, or `None` if nothing was ever published.
    pub fn read(&self) -> Result<Option<Vec<u8>>, ModelError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ModelError::io(&self.path, &e)),
        }
    }

    /// Atomically replace the slot content with `bytes`.
    ///
    /// On failure the slot keeps its previous content and no temp file is
    /// left behind.
    pub fn publish(&self, bytes: &[u8]) -> Result<(), ModelError> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| ModelError::io(&parent, &e))?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ModelError::Io {
                path: self.path.display().to_string(),
                reason: "slot path has no file name".to_string(),
            })?;
        let tmp = parent.join(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));

        let staged = write_synced(&tmp, bytes).and_then(|_| {
            fs::rename(&tmp, &self.path).map_err(|e| ModelError::io(&self.path, &e))
        });
        if let Err(e) = staged {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        sync_dir(&parent);
        debug!(slot = %self.path.display(), bytes = bytes.len(), "slot published");
        Ok(())
    }

    /// Block until this process holds the slot's exclusive lock.
    pub fn lock(&self) -> Result<SlotLock, ModelError> {
        let (file, path) = self.open_lock_file()?;
        file.lock_exclusive().map_err(|e| ModelError::io(&path, &e))?;
        Ok(SlotLock { file, path })
    }

    /// Like [`ArtifactSlot::lock`] but returns `None` if someone else holds it.
    pub fn try_lock(&self) -> Result<Option<SlotLock>, ModelError> {
        let (file, path) = self.open_lock_file()?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(SlotLock { file, path })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(ModelError::io(&path, &e)),
        }
    }

    fn open_lock_file(&self) -> Result<(File, PathBuf), ModelError> {
        let path = self.lock_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ModelError::io(parent, &e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| ModelError::io(&path, &e))?;
        Ok((file, path))
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), ModelError> {
    let mut f = File::create(path).map_err(|e| ModelError::io(path, &e))?;
    f.write_all(bytes).map_err(|e| ModelError::io(path, &e))?;
    f.sync_all().map_err(|e| ModelError::io(path, &e))?;
    Ok(())
}

/// Persist the rename itself. Best effort.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Ok(d) = File::open(dir) {
        let _ = d.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

// ---------------------------------------------------------------------------
// SlotLock
// ---------------------------------------------------------------------------

/// Exclusive advisory lock on a slot; released on drop.
#[derive(Debug)]
pub struct SlotLock {
    file: File,
    path: PathBuf,
}

impl SlotLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SlotLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_replaces_content_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let slot = ArtifactSlot::new(dir.path().join("serving").join("model.json"));

        assert_eq!(slot.read().unwrap(), None);
        slot.publish(b"first").unwrap();
        slot.publish(b"second").unwrap();
        assert_eq!(slot.read().unwrap().as_deref(), Some(&b"second"[..]));

        let names: Vec<String> = fs::read_dir(dir.path().join("serving"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["model.json".to_string()]);
    }

    #[test]
    fn failed_rename_keeps_previous_target_untouched() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory at the slot path makes the rename fail.
        let slot_path = dir.path().join("model.json");
        fs::create_dir_all(slot_path.join("occupied")).unwrap();
        let slot = ArtifactSlot::new(&slot_path);

        assert!(slot.publish(b"new").is_err());
        assert!(slot_path.join("occupied").is_dir());

        let stray = fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .ends_with(".tmp")
            })
            .count();
        assert_eq!(stray, 0, "temp file must be cleaned up");
    }

    #[test]
    fn second_lock_is_refused_while_first_is_held() {
        let dir = tempfile::tempdir().unwrap();
        let slot = ArtifactSlot::new(dir.path().join("model.json"));

        let held = slot.lock().unwrap();
        assert!(slot.try_lock().unwrap().is_none());
        drop(held);
        assert!(slot.try_lock().unwrap().is_some());
    }
}
