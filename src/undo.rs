//! Undo support for move-mode runs.
//!
//! A non-dry move-mode run appends every relocation (category moves and
//! quarantined duplicates) to a history file in the destination root.
//! Undo replays that history in reverse, moving files back to their
//! original locations. A file that now conflicts with something at its
//! original location is not overwritten; the conflicting file is backed up
//! with a timestamp suffix first.
//!
//! Copy-mode runs record no history: their sources were never touched, so
//! "undoing" one would mean deleting user data.

use crate::organizer::{FileRecord, FileStatus};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the history file written into the destination root.
pub const HISTORY_FILE_NAME: &str = ".dupesort_history.json";

/// Errors in history bookkeeping and undo.
#[derive(Debug, Error)]
pub enum UndoError {
    #[error("destination root does not exist: {0}")]
    InvalidRoot(PathBuf),

    #[error("no previous organization found to undo")]
    NoHistory,

    #[error("failed to read history file: {0}")]
    HistoryRead(#[source] std::io::Error),

    #[error("failed to write history file: {0}")]
    HistoryWrite(#[source] std::io::Error),

    #[error("invalid history file format: {0}")]
    InvalidHistory(String),
}

/// One recorded relocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub original_path: PathBuf,
    pub new_path: PathBuf,
    pub category: String,
}

/// The relocations of one run, persisted for undo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryLog {
    /// RFC 3339 timestamp of the run that produced this history.
    pub timestamp: String,
    pub destination_root: PathBuf,
    pub operations: Vec<HistoryEntry>,
}

impl HistoryLog {
    /// Creates an empty log for a destination root.
    pub fn new(destination_root: PathBuf) -> Self {
        Self {
            timestamp: Local::now().to_rfc3339(),
            destination_root,
            operations: Vec::new(),
        }
    }

    /// Records a file's relocation if the record represents one: an
    /// organized move or a quarantined duplicate. Anything without a
    /// destination (report-only duplicates, skips, failures) is ignored.
    pub fn record(&mut self, record: &FileRecord) {
        let relocated = matches!(record.status, FileStatus::Organized)
            || (matches!(record.status, FileStatus::Duplicate)
                && record.destination_path.is_some());
        if !relocated {
            return;
        }
        let Some(new_path) = record.destination_path.clone() else {
            return;
        };
        if new_path == record.source_path {
            return;
        }
        self.operations.push(HistoryEntry {
            original_path: record.source_path.clone(),
            new_path,
            category: record.category.dir_name().to_string(),
        });
    }

    fn history_file_path(destination_root: &Path) -> PathBuf {
        destination_root.join(HISTORY_FILE_NAME)
    }

    /// Saves this log into the destination root.
    pub fn save(&self, destination_root: &Path) -> Result<(), UndoError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| UndoError::InvalidHistory(e.to_string()))?;
        fs::write(Self::history_file_path(destination_root), json)
            .map_err(UndoError::HistoryWrite)
    }

    /// Loads the most recent log, or `None` if no history exists.
    pub fn load(destination_root: &Path) -> Result<Option<Self>, UndoError> {
        let path = Self::history_file_path(destination_root);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(UndoError::HistoryRead)?;
        let log = serde_json::from_str(&content)
            .map_err(|e| UndoError::InvalidHistory(e.to_string()))?;
        Ok(Some(log))
    }

    /// Deletes the history file for a destination root.
    pub fn delete(destination_root: &Path) -> Result<(), UndoError> {
        let path = Self::history_file_path(destination_root);
        if path.exists() {
            fs::remove_file(&path).map_err(UndoError::HistoryWrite)?;
        }
        Ok(())
    }
}

/// What an undo pass accomplished.
#[derive(Debug)]
pub struct UndoReport {
    /// Files moved back to their original locations.
    pub restored_files: usize,
    /// Files that could not be restored, with the failure reason.
    pub failed_restores: Vec<(PathBuf, String)>,
    /// Files no longer present at their recorded location.
    pub skipped_files: Vec<(PathBuf, String)>,
}

impl UndoReport {
    fn new() -> Self {
        Self {
            restored_files: 0,
            failed_restores: Vec::new(),
            skipped_files: Vec::new(),
        }
    }

    /// Returns true if every recorded operation was restored.
    pub fn is_complete_success(&self) -> bool {
        self.failed_restores.is_empty() && self.skipped_files.is_empty()
    }
}

/// Replays a run's history in reverse.
pub struct UndoManager;

impl UndoManager {
    /// Undoes the most recent move-mode run recorded in `destination_root`.
    ///
    /// The history file is deleted only after a fully clean undo, so a
    /// partially failed undo can be retried.
    pub fn undo(destination_root: &Path) -> Result<UndoReport, UndoError> {
        if !destination_root.exists() {
            return Err(UndoError::InvalidRoot(destination_root.to_path_buf()));
        }

        let log = HistoryLog::load(destination_root)?.ok_or(UndoError::NoHistory)?;

        // LIFO: reverse the run's order so later renames unwind first.
        let mut report = UndoReport::new();
        for operation in log.operations.iter().rev() {
            match Self::restore_file(operation) {
                Ok(()) => report.restored_files += 1,
                Err((path, reason)) => {
                    if reason.contains("not found") {
                        report.skipped_files.push((path, reason));
                    } else {
                        report.failed_restores.push((path, reason));
                    }
                }
            }
        }

        if report.is_complete_success() {
            HistoryLog::delete(destination_root)?;
        }

        Ok(report)
    }

    fn restore_file(operation: &HistoryEntry) -> Result<(), (PathBuf, String)> {
        if !operation.new_path.exists() {
            return Err((
                operation.new_path.clone(),
                "file not found at expected location".to_string(),
            ));
        }

        if operation.original_path.exists() {
            let backup_path = Self::generate_backup_path(&operation.original_path);
            fs::rename(&operation.original_path, &backup_path).map_err(|e| {
                (
                    operation.original_path.clone(),
                    format!("could not back up conflicting file: {}", e),
                )
            })?;
        }

        if let Some(parent) = operation.original_path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| {
                (
                    operation.original_path.clone(),
                    format!("could not recreate original directory: {}", e),
                )
            })?;
        }

        fs::rename(&operation.new_path, &operation.original_path).map_err(|e| {
            (
                operation.new_path.clone(),
                format!("failed to restore file: {}", e),
            )
        })
    }

    /// `notes.txt` → `notes.txt.bak.20260807-143052`
    fn generate_backup_path(original_path: &Path) -> PathBuf {
        let timestamp = Local::now().format("%Y%m%d-%H%M%S");
        let filename = original_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file");
        let backup_name = format!("{}.bak.{}", filename, timestamp);

        match original_path.parent() {
            Some(parent) => parent.join(backup_name),
            None => PathBuf::from(backup_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_category::Category;
    use tempfile::TempDir;

    fn organized_record(source: &Path, dest: &Path) -> FileRecord {
        FileRecord {
            source_path: source.to_path_buf(),
            size_bytes: 4,
            content_hash: Some("cafe".to_string()),
            category: Category::Document,
            destination_path: Some(dest.to_path_buf()),
            duplicate_of: None,
            status: FileStatus::Organized,
            reason: None,
        }
    }

    #[test]
    fn test_undo_without_history_errors() {
        let temp_dir = TempDir::new().unwrap();
        let result = UndoManager::undo(temp_dir.path());
        assert!(matches!(result, Err(UndoError::NoHistory)));
    }

    #[test]
    fn test_record_ignores_untouched_files() {
        let mut log = HistoryLog::new(PathBuf::from("/dest"));
        let mut record = organized_record(Path::new("/src/a.txt"), Path::new("/dest/a.txt"));
        record.status = FileStatus::SkippedExists;
        log.record(&record);

        let mut dup = organized_record(Path::new("/src/b.txt"), Path::new("/dest/b.txt"));
        dup.status = FileStatus::Duplicate;
        dup.destination_path = None;
        log.record(&dup);

        assert!(log.operations.is_empty());
    }

    #[test]
    fn test_undo_restores_moved_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let original = root.join("test.txt");
        let moved = root.join("document").join("test.txt");

        fs::create_dir(root.join("document")).unwrap();
        fs::write(&moved, "content").unwrap();

        let mut log = HistoryLog::new(root.to_path_buf());
        log.record(&organized_record(&original, &moved));
        log.save(root).unwrap();

        let report = UndoManager::undo(root).expect("undo failed");
        assert_eq!(report.restored_files, 1);
        assert!(report.is_complete_success());
        assert!(original.exists());
        assert!(!moved.exists());
        assert!(!root.join(HISTORY_FILE_NAME).exists());
    }

    #[test]
    fn test_undo_backs_up_conflicting_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let original = root.join("test.txt");
        let moved = root.join("document").join("test.txt");

        fs::create_dir(root.join("document")).unwrap();
        fs::write(&moved, "original content").unwrap();
        // Something new appeared at the original location since the run.
        fs::write(&original, "new content").unwrap();

        let mut log = HistoryLog::new(root.to_path_buf());
        log.record(&organized_record(&original, &moved));
        log.save(root).unwrap();

        let report = UndoManager::undo(root).expect("undo failed");
        assert_eq!(report.restored_files, 1);
        assert_eq!(fs::read_to_string(&original).unwrap(), "original content");

        let backups: Vec<_> = fs::read_dir(root)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".bak."))
            .collect();
        assert_eq!(backups.len(), 1);
    }

    #[test]
    fn test_undo_skips_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let mut log = HistoryLog::new(root.to_path_buf());
        log.record(&organized_record(
            &root.join("gone.txt"),
            &root.join("document").join("gone.txt"),
        ));
        log.save(root).unwrap();

        let report = UndoManager::undo(root).expect("undo failed");
        assert_eq!(report.restored_files, 0);
        assert_eq!(report.skipped_files.len(), 1);
        // History survives an incomplete undo.
        assert!(root.join(HISTORY_FILE_NAME).exists());
    }

    #[test]
    fn test_history_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let mut log = HistoryLog::new(root.to_path_buf());
        log.record(&organized_record(
            &root.join("a.pdf"),
            &root.join("document").join("a.pdf"),
        ));
        log.save(root).unwrap();

        let loaded = HistoryLog::load(root).unwrap().expect("history exists");
        assert_eq!(loaded.operations.len(), 1);
        assert_eq!(loaded.operations[0].category, "document");
    }

    #[test]
    fn test_load_corrupt_history_errors() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(HISTORY_FILE_NAME), "not json").unwrap();
        let result = HistoryLog::load(temp_dir.path());
        assert!(matches!(result, Err(UndoError::InvalidHistory(_))));
    }
}
