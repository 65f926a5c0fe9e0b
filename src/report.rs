//! Run reports.
//!
//! Aggregates the organizer's per-file records into a single
//! [`OrganizationReport`], the structure a dashboard or automation layer
//! consumes. Serialization uses a fixed field order and sorted category
//! keys so two reports over the same tree diff cleanly.
//!
//! Every run gets its own timestamped report file; an existing report is
//! never overwritten, even when two runs start within the same second.

use crate::organizer::{FileRecord, FileStatus};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every file was organized, deduplicated or already in place.
    Ok,
    /// At least one file was unreadable or failed to transfer.
    PartialFailure,
    /// The run aborted before processing files.
    FatalError,
}

/// Aggregate counters for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportSummary {
    pub files_scanned: usize,
    pub files_organized: usize,
    pub duplicates_found: usize,
    pub files_skipped: usize,
    /// Bytes moved or copied into the category tree.
    pub total_size_bytes: u64,
    pub processing_time_seconds: f64,
}

/// A successfully organized file.
#[derive(Debug, Clone, Serialize)]
pub struct OrganizedFileEntry {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub category: String,
    pub size_bytes: u64,
    pub hash: String,
}

/// A file whose content was already owned by another file.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateEntry {
    pub source_path: PathBuf,
    pub hash: String,
    /// The canonical first-seen copy this file duplicates.
    pub duplicate_of: PathBuf,
    /// Present when the quarantine policy relocated the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarantined_to: Option<PathBuf>,
}

/// A file that was counted but not organized.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedEntry {
    pub source_path: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// The persisted record of one organization run.
///
/// Immutable once built; the report owns its entries exclusively.
#[derive(Debug, Serialize)]
pub struct OrganizationReport {
    /// Run start time, RFC 3339.
    pub timestamp: String,
    pub status: RunStatus,
    pub summary: ReportSummary,
    /// Category name → number of files organized into it. Sorted keys.
    pub type_distribution: BTreeMap<String, usize>,
    pub organized_files: Vec<OrganizedFileEntry>,
    pub duplicates: Vec<DuplicateEntry>,
    pub skipped: Vec<SkippedEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Populated only for a fatal run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OrganizationReport {
    /// Builds a report from the organizer's records, in discovery order.
    pub fn build(
        records: &[FileRecord],
        warnings: Vec<String>,
        started_at: DateTime<Local>,
        elapsed: Duration,
    ) -> Self {
        let mut summary = ReportSummary {
            files_scanned: records.len(),
            processing_time_seconds: elapsed.as_secs_f64(),
            ..Default::default()
        };
        let mut type_distribution: BTreeMap<String, usize> = BTreeMap::new();
        let mut organized_files = Vec::new();
        let mut duplicates = Vec::new();
        let mut skipped = Vec::new();

        for record in records {
            match record.status {
                FileStatus::Organized => {
                    summary.files_organized += 1;
                    summary.total_size_bytes += record.size_bytes;
                    *type_distribution
                        .entry(record.category.dir_name().to_string())
                        .or_insert(0) += 1;
                    organized_files.push(OrganizedFileEntry {
                        source_path: record.source_path.clone(),
                        destination_path: record
                            .destination_path
                            .clone()
                            .unwrap_or_else(|| record.source_path.clone()),
                        category: record.category.dir_name().to_string(),
                        size_bytes: record.size_bytes,
                        hash: record.content_hash.clone().unwrap_or_default(),
                    });
                }
                FileStatus::Duplicate => {
                    summary.duplicates_found += 1;
                    duplicates.push(DuplicateEntry {
                        source_path: record.source_path.clone(),
                        hash: record.content_hash.clone().unwrap_or_default(),
                        duplicate_of: record
                            .duplicate_of
                            .clone()
                            .unwrap_or_else(|| record.source_path.clone()),
                        quarantined_to: record.destination_path.clone(),
                    });
                }
                FileStatus::SkippedUnreadable
                | FileStatus::SkippedExists
                | FileStatus::MoveFailed => {
                    summary.files_skipped += 1;
                    skipped.push(SkippedEntry {
                        source_path: record.source_path.clone(),
                        status: record.status,
                        reason: record.reason.clone(),
                    });
                }
            }
        }

        let any_failure = records.iter().any(|r| {
            matches!(
                r.status,
                FileStatus::SkippedUnreadable | FileStatus::MoveFailed
            )
        });
        let status = if any_failure {
            RunStatus::PartialFailure
        } else {
            RunStatus::Ok
        };

        Self {
            timestamp: started_at.to_rfc3339(),
            status,
            summary,
            type_distribution,
            organized_files,
            duplicates,
            skipped,
            warnings,
            error: None,
        }
    }

    /// Builds the minimal report for a run that aborted before touching
    /// any file, so consumers always have something structured to render.
    pub fn fatal(error: String, started_at: DateTime<Local>, elapsed: Duration) -> Self {
        Self {
            timestamp: started_at.to_rfc3339(),
            status: RunStatus::FatalError,
            summary: ReportSummary {
                processing_time_seconds: elapsed.as_secs_f64(),
                ..Default::default()
            },
            type_distribution: BTreeMap::new(),
            organized_files: Vec::new(),
            duplicates: Vec::new(),
            skipped: Vec::new(),
            warnings: Vec::new(),
            error: Some(error),
        }
    }

    /// Serializes with stable field order and sorted category keys.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Writes the report into `reports_dir` under a timestamped name,
    /// never overwriting an existing report. Returns the path written.
    pub fn persist(&self, reports_dir: &Path, started_at: DateTime<Local>) -> io::Result<PathBuf> {
        fs::create_dir_all(reports_dir)?;

        let stamp = started_at.format("%Y%m%d_%H%M%S");
        let mut path = reports_dir.join(format!("organization_report_{}.json", stamp));
        let mut counter = 1usize;
        while path.exists() {
            path = reports_dir.join(format!("organization_report_{}_{}.json", stamp, counter));
            counter += 1;
        }

        let json = self
            .to_json()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&path, json)?;
        Ok(path)
    }
}
