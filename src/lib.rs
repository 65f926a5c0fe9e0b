//! dupesort - file organization with content-hash duplicate detection
//!
//! This library scans a directory of arbitrary files, classifies each into
//! one of seven categories, hashes content to detect duplicates within and
//! across runs, moves or copies unique files into a categorized directory
//! tree, and emits a structured JSON report of every run. Move-mode runs
//! can be undone from their recorded operation history.

pub mod cli;
pub mod config;
pub mod file_category;
pub mod hasher;
pub mod index;
pub mod organizer;
pub mod output;
pub mod report;
pub mod undo;

pub use config::{CompiledFilters, ConfigError, FilterConfig};
pub use file_category::{Category, FileMapper};
pub use index::DuplicateIndex;
pub use organizer::{
    DuplicatePolicy, FileRecord, FileStatus, OrganizeError, OrganizeOptions, Organizer,
    RunOutcome, TransferMode,
};
pub use report::{OrganizationReport, ReportSummary, RunStatus};
pub use undo::{HistoryLog, UndoManager, UndoReport};

pub use cli::{Cli, run_cli};
