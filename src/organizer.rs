//! The organization engine.
//!
//! The organizer walks a source directory in stable lexicographic order,
//! hashes and classifies each file, consults the duplicate index, resolves
//! a destination path under the category tree, and performs the transfer.
//! It is the only component that mutates the filesystem.
//!
//! Failure is local: an unreadable file or a failed transfer is recorded in
//! that file's [`FileRecord`] and the run continues. Only an inaccessible
//! source root or an uncreatable destination root abort the run.

use crate::config::CompiledFilters;
use crate::file_category::{Category, FileMapper};
use crate::hasher;
use crate::index::DuplicateIndex;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Whether organized files are moved out of the source tree or copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Move,
    Copy,
}

/// What happens to files recognized as duplicates.
///
/// The default leaves duplicates where they are and only reports them.
/// `Quarantine` moves them into a `duplicates/` holding area under the
/// destination root; it applies to move-mode runs only, since a copy-mode
/// run never relocates source files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    ReportOnly,
    Quarantine,
}

/// Directory name of the quarantine holding area under the destination root.
pub const QUARANTINE_DIR: &str = "duplicates";

/// Settings for one organization run.
#[derive(Debug, Clone)]
pub struct OrganizeOptions {
    /// Directory to scan.
    pub source_root: PathBuf,
    /// Root under which the category tree is built.
    pub destination_root: PathBuf,
    /// Directory where run reports land; excluded from scanning.
    pub reports_dir: PathBuf,
    pub mode: TransferMode,
    pub duplicate_policy: DuplicatePolicy,
    /// Bookkeeping files (history, duplicate index) the scan must ignore.
    pub exclude_files: Vec<PathBuf>,
    /// Analyze and decide without touching the filesystem.
    pub dry_run: bool,
}

/// Final disposition of one scanned file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Transferred into the category tree (or planned to be, in a dry run).
    Organized,
    /// Content hash already owned by another file.
    Duplicate,
    /// Could not be opened or read; left untouched.
    SkippedUnreadable,
    /// Identical content already present at the destination.
    SkippedExists,
    /// The transfer itself failed; source left intact.
    MoveFailed,
}

/// One entry per file discovered at scan start.
///
/// Created during the scan pass and never mutated after the run's report
/// is built.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub source_path: PathBuf,
    pub size_bytes: u64,
    /// Hex SHA-256 digest; absent when the file could not be read.
    pub content_hash: Option<String>,
    pub category: Category,
    /// Where the file went (organized) or would go (dry run, quarantine).
    pub destination_path: Option<PathBuf>,
    /// Canonical owner of this content, for duplicates.
    pub duplicate_of: Option<PathBuf>,
    pub status: FileStatus,
    /// Human-readable explanation for skips and failures.
    pub reason: Option<String>,
}

/// Errors that abort a run before or during the scan.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("cannot access source directory {path}: {source}")]
    SourceRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot create destination root {path}: {source}")]
    DestinationRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Everything a run produced, ready for the reporter.
#[derive(Debug)]
pub struct RunOutcome {
    /// One record per scanned file, in discovery order.
    pub records: Vec<FileRecord>,
    /// Non-fatal conditions worth surfacing (unreadable subdirectories,
    /// recovered index corruption).
    pub warnings: Vec<String>,
}

/// Orchestrates the scan → hash → classify → decide → transfer sequence.
pub struct Organizer {
    options: OrganizeOptions,
    mapper: FileMapper,
    index: DuplicateIndex,
    filters: CompiledFilters,
    /// Destination paths already decided this run. Covers the dry-run case
    /// where nothing is written, and keeps destination uniqueness
    /// independent of filesystem state.
    claimed: HashMap<PathBuf, String>,
    warnings: Vec<String>,
}

impl Organizer {
    /// Creates an organizer with an injected duplicate index and compiled
    /// filter rules.
    pub fn new(options: OrganizeOptions, index: DuplicateIndex, filters: CompiledFilters) -> Self {
        Self {
            options,
            mapper: FileMapper::default(),
            index,
            filters,
            claimed: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Consumes the organizer, returning the duplicate index so the caller
    /// can flush it at run end.
    pub fn into_index(self) -> DuplicateIndex {
        self.index
    }

    /// Runs a full organization pass. `on_record` is invoked once per file
    /// as its record is finalized, in discovery order, with the file's
    /// 1-based position and the total file count.
    ///
    /// # Errors
    ///
    /// Only root-level problems abort the run: an unreadable source root or
    /// an uncreatable destination root. Per-file failures are data in the
    /// returned records.
    pub fn run<F>(&mut self, mut on_record: F) -> Result<RunOutcome, OrganizeError>
    where
        F: FnMut(&FileRecord, usize, usize),
    {
        let files = self.scan()?;

        if !self.options.dry_run {
            fs::create_dir_all(&self.options.destination_root).map_err(|e| {
                OrganizeError::DestinationRoot {
                    path: self.options.destination_root.clone(),
                    source: e,
                }
            })?;
        }

        let total = files.len();
        let mut records = Vec::with_capacity(total);
        for (position, path) in files.into_iter().enumerate() {
            let record = self.process_file(&path);
            on_record(&record, position + 1, total);
            records.push(record);
        }

        Ok(RunOutcome {
            records,
            warnings: std::mem::take(&mut self.warnings),
        })
    }

    /// Collects the files to process, in stable lexicographic order.
    fn scan(&mut self) -> Result<Vec<PathBuf>, OrganizeError> {
        let source_root = self.options.source_root.clone();
        let metadata = fs::metadata(&source_root).map_err(|e| OrganizeError::SourceRoot {
            path: source_root.clone(),
            source: e,
        })?;
        if !metadata.is_dir() {
            return Err(OrganizeError::SourceRoot {
                path: source_root.clone(),
                source: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
            });
        }

        let quarantine_root = self.options.destination_root.join(QUARANTINE_DIR);
        let reports_dir = self.options.reports_dir.clone();

        let mut files = Vec::new();
        let walker = WalkDir::new(&source_root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let path = entry.path();
                path != quarantine_root && path != reports_dir
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    // A subdirectory we cannot descend into is not fatal,
                    // but the report should say its contents were missed.
                    self.warnings.push(format!("scan could not read {}", e));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            if self.options.exclude_files.contains(&path) {
                continue;
            }
            if self.filters.should_include(&path) {
                files.push(path);
            }
        }

        Ok(files)
    }

    /// Processes one file through hash → classify → decide → transfer.
    fn process_file(&mut self, path: &Path) -> FileRecord {
        let size_bytes = fs::metadata(path).map(|m| m.len()).unwrap_or(0);

        let hash = match hasher::hash_file(path) {
            Ok(hash) => hash,
            Err(e) => {
                // Extension-only classification; content is off limits.
                let category = self.mapper.categorize(None, extension_of(path).as_deref());
                return FileRecord {
                    source_path: path.to_path_buf(),
                    size_bytes,
                    content_hash: None,
                    category,
                    destination_path: None,
                    duplicate_of: None,
                    status: FileStatus::SkippedUnreadable,
                    reason: Some(e.to_string()),
                };
            }
        };

        let category = self.classify(path);

        // Duplicate check against the index. A hash hit only counts when
        // the canonical path is a different file, so re-scanning a file
        // recorded by an earlier run does not mark it a duplicate of
        // itself.
        if let Some(canonical) = self.index.canonical_for(&hash)
            && canonical != path
        {
            let canonical = canonical.to_path_buf();
            return self.handle_duplicate(path, size_bytes, hash, category, canonical);
        }
        self.index.record(&hash, path);

        let category_dir = self.options.destination_root.join(category.dir_name());
        match self.resolve_destination(path, &category_dir, &hash) {
            Resolved::AlreadyThere(destination) => FileRecord {
                source_path: path.to_path_buf(),
                size_bytes,
                content_hash: Some(hash),
                category,
                destination_path: Some(destination),
                duplicate_of: None,
                status: FileStatus::SkippedExists,
                reason: Some("identical content already at destination".to_string()),
            },
            Resolved::Fresh(destination) => {
                self.execute_transfer(path, size_bytes, hash, category, destination)
            }
        }
    }

    fn handle_duplicate(
        &mut self,
        path: &Path,
        size_bytes: u64,
        hash: String,
        category: Category,
        canonical: PathBuf,
    ) -> FileRecord {
        let quarantine = self.options.duplicate_policy == DuplicatePolicy::Quarantine
            && self.options.mode == TransferMode::Move;

        if !quarantine {
            return FileRecord {
                source_path: path.to_path_buf(),
                size_bytes,
                content_hash: Some(hash),
                category,
                destination_path: None,
                duplicate_of: Some(canonical),
                status: FileStatus::Duplicate,
                reason: None,
            };
        }

        let quarantine_dir = self.options.destination_root.join(QUARANTINE_DIR);
        let destination = match self.resolve_destination(path, &quarantine_dir, &hash) {
            // Identical bytes already quarantined under this name.
            Resolved::AlreadyThere(dest) => Some(dest),
            Resolved::Fresh(dest) => {
                if self.options.dry_run {
                    self.claimed.insert(dest.clone(), hash.clone());
                    Some(dest)
                } else {
                    match self.place(path, &dest, &quarantine_dir) {
                        Ok(()) => {
                            self.claimed.insert(dest.clone(), hash.clone());
                            Some(dest)
                        }
                        Err(e) => {
                            self.warnings.push(format!(
                                "could not quarantine {}: {}",
                                path.display(),
                                e
                            ));
                            None
                        }
                    }
                }
            }
        };

        FileRecord {
            source_path: path.to_path_buf(),
            size_bytes,
            content_hash: Some(hash),
            category,
            destination_path: destination,
            duplicate_of: Some(canonical),
            status: FileStatus::Duplicate,
            reason: None,
        }
    }

    fn execute_transfer(
        &mut self,
        path: &Path,
        size_bytes: u64,
        hash: String,
        category: Category,
        destination: PathBuf,
    ) -> FileRecord {
        let category_dir = self.options.destination_root.join(category.dir_name());

        if self.options.dry_run {
            self.claimed.insert(destination.clone(), hash.clone());
            return FileRecord {
                source_path: path.to_path_buf(),
                size_bytes,
                content_hash: Some(hash),
                category,
                destination_path: Some(destination),
                duplicate_of: None,
                status: FileStatus::Organized,
                reason: None,
            };
        }

        match self.place(path, &destination, &category_dir) {
            Ok(()) => {
                self.claimed.insert(destination.clone(), hash.clone());
                FileRecord {
                    source_path: path.to_path_buf(),
                    size_bytes,
                    content_hash: Some(hash),
                    category,
                    destination_path: Some(destination),
                    duplicate_of: None,
                    status: FileStatus::Organized,
                    reason: None,
                }
            }
            Err(e) => FileRecord {
                source_path: path.to_path_buf(),
                size_bytes,
                content_hash: Some(hash),
                category,
                destination_path: None,
                duplicate_of: None,
                status: FileStatus::MoveFailed,
                reason: Some(e.to_string()),
            },
        }
    }

    /// Decides where a file lands inside `target_dir`.
    ///
    /// The basename is kept when free. An occupied name with identical
    /// content means the file is already organized. An occupied name with
    /// different content gets a numeric suffix before the extension:
    /// `notes.txt` → `notes_1.txt` → `notes_2.txt` until a free (or
    /// identical-content) name is found.
    fn resolve_destination(&self, source: &Path, target_dir: &Path, hash: &str) -> Resolved {
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unnamed".to_string());

        let mut candidate = target_dir.join(&file_name);
        let mut counter = 0usize;

        loop {
            if candidate == source {
                // The file already sits at its own destination.
                return Resolved::AlreadyThere(candidate);
            }

            if let Some(claimed_hash) = self.claimed.get(&candidate) {
                if claimed_hash == hash {
                    return Resolved::AlreadyThere(candidate);
                }
            } else if candidate.exists() {
                if hasher::hash_file(&candidate).is_ok_and(|h| h == hash) {
                    return Resolved::AlreadyThere(candidate);
                }
            } else {
                return Resolved::Fresh(candidate);
            }

            counter += 1;
            candidate = target_dir.join(suffixed_name(&file_name, counter));
        }
    }

    /// Transfers `source` to `destination`, creating `target_dir` first.
    ///
    /// Copy mode streams into a temporary file in the destination directory
    /// and renames it into place, so a crash mid-write never leaves a
    /// truncated file at the final path. Move mode prefers a plain rename
    /// (atomic on the same filesystem) and falls back to copy-then-delete
    /// across filesystems. Failures leave the source untouched.
    fn place(&self, source: &Path, destination: &Path, target_dir: &Path) -> io::Result<()> {
        fs::create_dir_all(target_dir)?;

        match self.options.mode {
            TransferMode::Move => match fs::rename(source, destination) {
                Ok(()) => Ok(()),
                Err(_) => {
                    atomic_copy(source, destination)?;
                    fs::remove_file(source)
                }
            },
            TransferMode::Copy => atomic_copy(source, destination),
        }
    }

    fn classify(&self, path: &Path) -> Category {
        let mime = infer::get_from_path(path)
            .ok()
            .flatten()
            .map(|kind| kind.mime_type().to_string());
        self.mapper
            .categorize(mime.as_deref(), extension_of(path).as_deref())
    }
}

enum Resolved {
    /// Identical content already lives at this path; nothing to do.
    AlreadyThere(PathBuf),
    /// Free destination for this file.
    Fresh(PathBuf),
}

/// `notes.txt`, 2 → `notes_2.txt`; `archive.tar.gz`, 1 → `archive.tar_1.gz`;
/// `Makefile`, 1 → `Makefile_1`.
fn suffixed_name(file_name: &str, counter: usize) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, counter, ext),
        _ => format!("{}_{}", file_name, counter),
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_string())
}

/// Streams `source` into a temporary file next to `destination`, then
/// renames it into place. The temp file is cleaned up automatically if any
/// step fails.
fn atomic_copy(source: &Path, destination: &Path) -> io::Result<()> {
    let dir = destination.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent")
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    let mut reader = File::open(source)?;
    io::copy(&mut reader, temp.as_file_mut())?;
    temp.as_file().sync_all()?;
    temp.persist(destination).map_err(|e| e.error)?;
    Ok(())
}
