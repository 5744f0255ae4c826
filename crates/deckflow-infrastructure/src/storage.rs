//! Atomic file operations shared by the file-backed stores.
//!
//! Writes go through a temporary file, an fsync and an atomic rename, so a
//! crash mid-write leaves either the old document or the new one, never a
//! torn file. Cross-process exclusion uses an advisory lock on a `.lock`
//! sidecar next to the document.

use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use deckflow_core::{DeckflowError, Result};

/// Writes `contents` to `path` atomically.
///
/// The parent directory is created if missing. The data is written to a
/// hidden temporary file in the same directory, flushed to disk, and renamed
/// over the target.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path(path)?;
    let mut tmp_file = File::create(&tmp_path)?;
    tmp_file.write_all(contents.as_bytes())?;
    tmp_file.sync_all()?;
    drop(tmp_file);

    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let parent = path.parent().ok_or_else(|| {
        DeckflowError::io(format!("path {} has no parent directory", path.display()))
    })?;
    let file_name = path
        .file_name()
        .ok_or_else(|| DeckflowError::io(format!("path {} has no file name", path.display())))?;
    Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
}

/// An advisory lock guard. The lock is released when the guard drops.
pub struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    /// Acquires an exclusive lock guarding `path`.
    ///
    /// The lock lives on a `.lock` sidecar so the document itself can still
    /// be renamed over while the lock is held.
    pub fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive().map_err(|e| {
                DeckflowError::io(format!("failed to lock {}: {}", lock_path.display(), e))
            })?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Unlocking is automatic when the handle closes; removing the
        // sidecar is best effort.
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_atomic_leaves_no_temp_file_behind() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.json");

        write_atomic(&path, "{\"ok\":true}").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"ok\":true}");
        assert!(!temp_dir.path().join(".doc.json.tmp").exists());
    }

    #[test]
    fn write_atomic_creates_missing_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/deeper/doc.json");

        write_atomic(&path, "x").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn write_atomic_replaces_existing_contents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.json");

        write_atomic(&path, "first").unwrap();
        write_atomic(&path, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn lock_sidecar_is_removed_on_release() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.json");

        {
            let _lock = FileLock::acquire(&path).unwrap();
            assert!(temp_dir.path().join("doc.lock").exists());
        }
        assert!(!temp_dir.path().join("doc.lock").exists());
    }
}
