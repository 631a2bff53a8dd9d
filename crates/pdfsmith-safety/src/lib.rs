//! File safety for destructive operations.
//!
//! Content hashing, collision detection, and timestamped backups with a
//! bounded retention count. Used by the CLI before any operation that
//! overwrites an existing file.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::Local;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

const BACKUP_SUFFIX: &str = ".backup";

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("source file does not exist: {0}")]
    SourceMissing(PathBuf),
    #[error("collision detected: {0} exists with different content")]
    Collision(PathBuf),
    #[error("target directory not writable: {0}")]
    TargetNotWritable(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// SHA-256 of a file's content as a lowercase hex string, read in 4 KiB
/// chunks so large documents never load fully into memory.
pub fn file_sha256(path: &Path) -> Result<String, SafetyError> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 4096];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// A collision is a target that already exists under the same file name
/// as the source but with different content. Overwriting it would silently
/// destroy unrelated data.
pub fn files_collide(source: &Path, target: &Path) -> Result<bool, SafetyError> {
    if !target.exists() {
        return Ok(false);
    }
    if source.file_name() != target.file_name() {
        return Ok(false);
    }
    let collide = file_sha256(source)? != file_sha256(target)?;
    if collide {
        warn!(target = %target.display(), "target exists with different content");
    }
    Ok(collide)
}

/// Timestamped backups next to the original, oldest pruned beyond the
/// retention count.
#[derive(Debug, Clone)]
pub struct BackupManager {
    pub enabled: bool,
    pub retention: usize,
}

impl Default for BackupManager {
    fn default() -> Self {
        Self {
            enabled: true,
            retention: 5,
        }
    }
}

impl BackupManager {
    pub fn new(enabled: bool, retention: usize) -> Self {
        Self { enabled, retention }
    }

    /// Copy `path` to `{stem}_{timestamp}.backup{ext}` in the same
    /// directory. Returns the backup path, or `None` when backups are
    /// disabled or there is nothing to back up.
    pub fn backup(&self, path: &Path) -> Result<Option<PathBuf>, SafetyError> {
        if !self.enabled || !path.is_file() {
            return Ok(None);
        }

        let stem = stem_of(path);
        let ext = extension_of(path);
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let parent = path.parent().unwrap_or(Path::new("."));

        let mut backup_path = parent.join(format!("{stem}_{timestamp}{BACKUP_SUFFIX}{ext}"));
        let mut counter = 1;
        while backup_path.exists() {
            backup_path =
                parent.join(format!("{stem}_{timestamp}_{counter}{BACKUP_SUFFIX}{ext}"));
            counter += 1;
        }

        std::fs::copy(path, &backup_path)?;
        info!(backup = %backup_path.display(), "backup created");

        self.prune(path);
        Ok(Some(backup_path))
    }

    /// Drop the oldest backups of `original` beyond the retention count.
    /// Pruning failures are logged, never raised: losing an old backup is
    /// not worth failing the main operation for.
    fn prune(&self, original: &Path) {
        let stem = stem_of(original);
        let ext = extension_of(original);
        let parent = original.parent().unwrap_or(Path::new("."));

        let Ok(entries) = std::fs::read_dir(parent) else {
            return;
        };

        let prefix = format!("{stem}_");
        let suffix = format!("{BACKUP_SUFFIX}{ext}");
        let mut backups: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy())
                    .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(&suffix))
            })
            .collect();

        if backups.len() <= self.retention {
            return;
        }

        // Newest first by modification time.
        backups.sort_by_key(|p| {
            std::cmp::Reverse(
                p.metadata()
                    .and_then(|m| m.modified())
                    .unwrap_or(std::time::SystemTime::UNIX_EPOCH),
            )
        });
        for old in backups.split_off(self.retention) {
            match std::fs::remove_file(&old) {
                Ok(()) => debug!(removed = %old.display(), "pruned old backup"),
                Err(e) => warn!(backup = %old.display(), error = %e, "could not prune backup"),
            }
        }
    }
}

/// Full safety gate before writing `target` from `source`: refuse
/// collisions, back up an existing target, and ensure the target
/// directory exists.
pub fn safe_write_check(
    source: &Path,
    target: &Path,
    backups: &BackupManager,
) -> Result<(), SafetyError> {
    if !source.exists() {
        return Err(SafetyError::SourceMissing(source.to_path_buf()));
    }
    if files_collide(source, target)? {
        return Err(SafetyError::Collision(target.to_path_buf()));
    }
    if target.exists() {
        backups.backup(target)?;
    }
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|_| SafetyError::TargetNotWritable(parent.to_path_buf()))?;
        }
    }
    Ok(())
}

/// First free variant of `path`, appending `_1`, `_2`, … before the
/// extension.
pub fn unique_output_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let stem = stem_of(path);
    let ext = extension_of(path);
    let parent = path.parent().unwrap_or(Path::new("."));

    let mut counter = 1;
    loop {
        let candidate = parent.join(format!("{stem}_{counter}{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string())
}

/// Extension including the leading dot, or empty.
fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_file_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"hello world").unwrap();

        // Known SHA-256 of "hello world".
        assert_eq!(
            file_sha256(&path).unwrap(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn identical_files_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a").join("doc.pdf");
        let b = dir.path().join("b").join("doc.pdf");
        std::fs::create_dir_all(a.parent().unwrap()).unwrap();
        std::fs::create_dir_all(b.parent().unwrap()).unwrap();
        std::fs::write(&a, b"same content").unwrap();
        std::fs::write(&b, b"same content").unwrap();

        assert!(!files_collide(&a, &b).unwrap());
    }

    #[test]
    fn same_name_different_content_collides() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a").join("doc.pdf");
        let b = dir.path().join("b").join("doc.pdf");
        std::fs::create_dir_all(a.parent().unwrap()).unwrap();
        std::fs::create_dir_all(b.parent().unwrap()).unwrap();
        std::fs::write(&a, b"original").unwrap();
        std::fs::write(&b, b"different").unwrap();

        assert!(files_collide(&a, &b).unwrap());
    }

    #[test]
    fn different_names_never_collide() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("in.pdf");
        let b = dir.path().join("out.pdf");
        std::fs::write(&a, b"one").unwrap();
        std::fs::write(&b, b"two").unwrap();

        assert!(!files_collide(&a, &b).unwrap());
    }

    #[test]
    fn backup_copies_next_to_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"content").unwrap();

        let backup = BackupManager::default().backup(&path).unwrap().unwrap();
        assert!(backup.exists());
        assert_eq!(std::fs::read(&backup).unwrap(), b"content");
        let name = backup.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("report_"));
        assert!(name.ends_with(".backup.pdf"));
        // Original untouched.
        assert_eq!(std::fs::read(&path).unwrap(), b"content");
    }

    #[test]
    fn disabled_manager_backs_nothing_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"content").unwrap();

        let manager = BackupManager::new(false, 5);
        assert!(manager.backup(&path).unwrap().is_none());
    }

    #[test]
    fn retention_prunes_oldest_backups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"v").unwrap();

        let manager = BackupManager::new(true, 2);
        for _ in 0..4 {
            manager.backup(&path).unwrap();
        }

        let backups = std::fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().contains(".backup"))
            .count();
        assert_eq!(backups, 2);
    }

    #[test]
    fn safe_write_check_rejects_collisions() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a").join("doc.pdf");
        let target = dir.path().join("b").join("doc.pdf");
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&source, b"new").unwrap();
        std::fs::write(&target, b"old").unwrap();

        let result = safe_write_check(&source, &target, &BackupManager::default());
        assert!(matches!(result, Err(SafetyError::Collision(_))));
    }

    #[test]
    fn safe_write_check_backs_up_existing_target() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.pdf");
        let target = dir.path().join("out.pdf");
        std::fs::write(&source, b"new").unwrap();
        std::fs::write(&target, b"old").unwrap();

        safe_write_check(&source, &target, &BackupManager::default()).unwrap();

        let backed_up = std::fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .any(|e| e.file_name().to_string_lossy().contains(".backup"));
        assert!(backed_up);
    }

    #[test]
    fn safe_write_check_creates_missing_target_directory() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.pdf");
        let target = dir.path().join("deep").join("nested").join("out.pdf");
        std::fs::write(&source, b"content").unwrap();

        safe_write_check(&source, &target, &BackupManager::default()).unwrap();
        assert!(target.parent().unwrap().is_dir());
    }

    #[test]
    fn unique_output_path_counts_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        assert_eq!(unique_output_path(&path), path);

        std::fs::write(&path, b"x").unwrap();
        let next = unique_output_path(&path);
        assert!(next.ends_with("out_1.pdf"));

        std::fs::write(&next, b"x").unwrap();
        assert!(unique_output_path(&path).ends_with("out_2.pdf"));
    }
}
