//! Filesystem side of a compression: staging files, recoverable deletion of
//! displaced destinations, and the final commit.

use crate::constants::STAGING_PREFIX;
use crate::error::{CompressionError, Result};
use crate::verbose;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

fn commit_error(path: &Path, reason: impl ToString) -> CompressionError {
    CompressionError::CommitError {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Uniquely named scratch file, deleted on drop unless committed.
#[derive(Debug)]
pub struct StagingFile {
    path: TempPath,
}

impl StagingFile {
    /// Creates an empty staging file in `dir`.
    ///
    /// Staging next to the destination keeps the commit a same-volume rename.
    pub fn new_in(dir: &Path, extension: &str) -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(&format!(".{}", extension))
            .tempfile_in(dir)
            .map_err(|source| CompressionError::TempFileError {
                path: dir.to_path_buf(),
                source,
            })?;

        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> Result<u64> {
        Ok(fs::metadata(&self.path)?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Staging files are created owner-only; give the result the same mode as
    /// the file it stands in for.
    pub fn copy_permissions_from(&self, source: &Path) {
        if let Ok(metadata) = fs::metadata(source) {
            let _ = fs::set_permissions(&self.path, metadata.permissions());
        }
    }

    /// Moves the staged content onto `destination`.
    ///
    /// Tries an atomic rename first; when that is impossible (for example
    /// across volumes) falls back to copy, length check, then removal of the
    /// staged file.
    pub fn commit(self, destination: &Path) -> Result<()> {
        match self.path.persist(destination) {
            Ok(()) => Ok(()),
            Err(err) => {
                verbose!(
                    "Rename into {} failed ({}), copying instead",
                    destination.display(),
                    err.error
                );
                // err.path is still a TempPath and removes the source on drop
                copy_verified(&err.path, destination)
            }
        }
    }
}

fn copy_verified(source: &Path, destination: &Path) -> Result<()> {
    let expected = fs::metadata(source)
        .map_err(|e| commit_error(destination, e))?
        .len();
    fs::copy(source, destination).map_err(|e| commit_error(destination, e))?;

    let written = fs::metadata(destination)
        .map_err(|e| commit_error(destination, e))?
        .len();
    if written != expected {
        return Err(commit_error(
            destination,
            format!("copied {} bytes, expected {}", written, expected),
        ));
    }
    Ok(())
}

/// Moves `path` into `trash_dir` under a unique name and returns where it went.
pub fn move_to_trash(path: &Path, trash_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(trash_dir).map_err(|e| commit_error(trash_dir, e))?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let slot = tempfile::Builder::new()
        .prefix(&format!("{}-", stem))
        .suffix(&suffix)
        .tempfile_in(trash_dir)
        .map_err(|e| commit_error(trash_dir, e))?
        .into_temp_path();

    if fs::rename(path, &slot).is_err() {
        copy_verified(path, &slot)?;
        fs::remove_file(path).map_err(|e| commit_error(path, e))?;
    }

    let trashed = slot.keep().map_err(|e| commit_error(path, e.error))?;
    verbose!("Moved {} to {}", path.display(), trashed.display());
    Ok(trashed)
}

/// Puts a trashed file back after a failed commit.
pub fn restore_from_trash(trashed: &Path, original: &Path) -> Result<()> {
    if fs::rename(trashed, original).is_ok() {
        return Ok(());
    }
    copy_verified(trashed, original)?;
    fs::remove_file(trashed).map_err(|e| commit_error(trashed, e))
}

/// Removes a file on drop unless disarmed.
///
/// Guards direct codec writes so a failed call leaves no half-written output.
pub struct OutputGuard {
    path: PathBuf,
    armed: bool,
}

impl OutputGuard {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            armed: true,
        }
    }

    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_staging_file_removed_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let staged_path = {
            let staging = StagingFile::new_in(temp_dir.path(), "png").unwrap();
            assert!(staging.path().exists());
            assert!(staging.is_empty().unwrap());
            assert_eq!(staging.path().extension().unwrap(), "png");
            staging.path().to_path_buf()
        };
        assert!(!staged_path.exists());
    }

    #[test]
    fn test_staging_file_unique_names() {
        let temp_dir = TempDir::new().unwrap();
        let a = StagingFile::new_in(temp_dir.path(), "jpg").unwrap();
        let b = StagingFile::new_in(temp_dir.path(), "jpg").unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_staging_file_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let result = StagingFile::new_in(&temp_dir.path().join("missing"), "jpg");
        assert!(matches!(result, Err(CompressionError::TempFileError { .. })));
    }

    #[test]
    fn test_commit_replaces_destination() {
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("final.jpg");
        fs::write(&destination, b"old").unwrap();

        let staging = StagingFile::new_in(temp_dir.path(), "jpg").unwrap();
        fs::write(staging.path(), b"new content").unwrap();
        let staged_path = staging.path().to_path_buf();
        staging.commit(&destination).unwrap();

        assert_eq!(fs::read(&destination).unwrap(), b"new content");
        assert!(!staged_path.exists());
    }

    #[test]
    fn test_copy_verified() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("a.bin");
        let destination = temp_dir.path().join("b.bin");
        fs::write(&source, vec![7u8; 4096]).unwrap();

        copy_verified(&source, &destination).unwrap();
        assert_eq!(fs::read(&destination).unwrap().len(), 4096);

        let missing = copy_verified(&temp_dir.path().join("nope"), &destination);
        assert!(matches!(missing, Err(CompressionError::CommitError { .. })));
    }

    #[test]
    fn test_move_to_trash_and_restore() {
        let temp_dir = TempDir::new().unwrap();
        let trash = temp_dir.path().join("trash");
        let file = temp_dir.path().join("photo.jpg");
        fs::write(&file, b"original bytes").unwrap();

        let trashed = move_to_trash(&file, &trash).unwrap();
        assert!(!file.exists());
        assert!(trashed.starts_with(&trash));
        assert_eq!(trashed.extension().unwrap(), "jpg");
        assert_eq!(fs::read(&trashed).unwrap(), b"original bytes");

        restore_from_trash(&trashed, &file).unwrap();
        assert_eq!(fs::read(&file).unwrap(), b"original bytes");
        assert!(!trashed.exists());
    }

    #[test]
    fn test_output_guard() {
        let temp_dir = TempDir::new().unwrap();
        let removed = temp_dir.path().join("partial.png");
        fs::write(&removed, b"partial").unwrap();
        drop(OutputGuard::new(&removed));
        assert!(!removed.exists());

        let kept = temp_dir.path().join("done.png");
        fs::write(&kept, b"done").unwrap();
        OutputGuard::new(&kept).disarm();
        assert!(kept.exists());
    }
}
