//! Persistent duplicate index.
//!
//! The index maps a content hash to the canonical (first-seen) path that
//! owns it. It is an explicit object handed to the organizer at
//! construction time rather than hidden global state: tests run it fully
//! in memory, the CLI optionally loads it from and flushes it back to a
//! JSON file so later runs can detect duplicates across runs.
//!
//! Single-writer discipline: the file is read once at run start, entries
//! are added only by the organizer's decision point, and the file is
//! written once at run end.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Content hash → canonical first-seen path.
///
/// First-seen-wins: once a hash is recorded its canonical path is never
/// reassigned, so "which copy is the original" is stable for the life of
/// the index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateIndex {
    // BTreeMap keeps the persisted JSON key order stable across runs.
    entries: BTreeMap<String, PathBuf>,
}

impl DuplicateIndex {
    /// Creates an empty in-memory index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads an index from a JSON file.
    ///
    /// A missing file yields an empty index. A file that exists but fails
    /// to parse also yields an empty index, plus a warning message for the
    /// run report; a stale or damaged index must never abort a run.
    pub fn load(path: &Path) -> (Self, Option<String>) {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return (Self::new(), None),
            Err(e) => {
                return (
                    Self::new(),
                    Some(format!(
                        "duplicate index {} could not be read ({}); starting with an empty index",
                        path.display(),
                        e
                    )),
                );
            }
        };

        match serde_json::from_str(&content) {
            Ok(index) => (index, None),
            Err(e) => (
                Self::new(),
                Some(format!(
                    "duplicate index {} is corrupt ({}); starting with an empty index",
                    path.display(),
                    e
                )),
            ),
        }
    }

    /// Writes the index to a JSON file, creating parent directories as
    /// needed.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, json)
    }

    /// Returns the canonical path recorded for a hash, if any.
    pub fn canonical_for(&self, hash: &str) -> Option<&Path> {
        self.entries.get(hash).map(PathBuf::as_path)
    }

    /// Records a hash with its source path unless the hash is already
    /// present. Returns `true` when the entry was newly inserted, i.e.
    /// this path is now the canonical owner of the hash.
    pub fn record(&mut self, hash: &str, path: &Path) -> bool {
        if self.entries.contains_key(hash) {
            return false;
        }
        self.entries.insert(hash.to_string(), path.to_path_buf());
        true
    }

    /// Number of distinct hashes in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_seen_wins() {
        let mut index = DuplicateIndex::new();
        assert!(index.record("abc123", Path::new("/tmp/first.txt")));
        assert!(!index.record("abc123", Path::new("/tmp/second.txt")));
        assert_eq!(
            index.canonical_for("abc123"),
            Some(Path::new("/tmp/first.txt"))
        );
    }

    #[test]
    fn test_unknown_hash_has_no_canonical() {
        let index = DuplicateIndex::new();
        assert_eq!(index.canonical_for("missing"), None);
        assert!(index.is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let index_path = temp_dir.path().join("index.json");

        let mut index = DuplicateIndex::new();
        index.record("deadbeef", Path::new("/data/a.pdf"));
        index.record("cafebabe", Path::new("/data/b.jpg"));
        index.save(&index_path).expect("Failed to save index");

        let (loaded, warning) = DuplicateIndex::load(&index_path);
        assert!(warning.is_none());
        assert_eq!(loaded.len(), 2);
        assert_eq!(
            loaded.canonical_for("deadbeef"),
            Some(Path::new("/data/a.pdf"))
        );
    }

    #[test]
    fn test_load_missing_file_is_empty_without_warning() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let (index, warning) = DuplicateIndex::load(&temp_dir.path().join("nope.json"));
        assert!(index.is_empty());
        assert!(warning.is_none());
    }

    #[test]
    fn test_load_corrupt_file_is_empty_with_warning() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let index_path = temp_dir.path().join("index.json");
        std::fs::write(&index_path, "{ not json at all").unwrap();

        let (index, warning) = DuplicateIndex::load(&index_path);
        assert!(index.is_empty());
        let warning = warning.expect("corrupt index should warn");
        assert!(warning.contains("corrupt"));
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let index_path = temp_dir.path().join("nested").join("dir").join("index.json");

        let mut index = DuplicateIndex::new();
        index.record("abc", Path::new("/x"));
        index.save(&index_path).expect("Failed to save index");
        assert!(index_path.exists());
    }
}
