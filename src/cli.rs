//! Command-line interface.
//!
//! Argument parsing and orchestration only: wire up the filter
//! configuration, the duplicate index and the organizer, render progress,
//! then hand the records to the reporter. No engine logic lives here.

use crate::config::FilterConfig;
use crate::index::DuplicateIndex;
use crate::organizer::{
    DuplicatePolicy, FileStatus, OrganizeOptions, Organizer, TransferMode,
};
use crate::output::OutputFormatter;
use crate::report::OrganizationReport;
use crate::undo::{HISTORY_FILE_NAME, HistoryLog, UndoManager};
use chrono::Local;
use clap::Parser;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Organize files into category subdirectories with duplicate detection.
#[derive(Debug, Parser)]
#[command(name = "dupesort", version, about)]
pub struct Cli {
    /// Directory to scan.
    pub source: PathBuf,

    /// Root of the categorized tree. Defaults to the source directory.
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Copy files into the category tree instead of moving them.
    #[arg(long)]
    pub copy: bool,

    /// Move duplicates into <dest>/duplicates/ instead of leaving them
    /// in place (move mode only).
    #[arg(long)]
    pub quarantine: bool,

    /// Duplicate index file: seeded at run start, updated at run end.
    /// Enables duplicate detection across runs.
    #[arg(long, value_name = "FILE")]
    pub index: Option<PathBuf>,

    /// Directory for run reports. Defaults to <dest>/reports.
    #[arg(long, value_name = "DIR")]
    pub reports_dir: Option<PathBuf>,

    /// Filter configuration file (TOML).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Analyze and print the plan without touching the filesystem.
    #[arg(long)]
    pub dry_run: bool,

    /// Revert the most recent move-mode run recorded in the destination
    /// root.
    #[arg(long)]
    pub undo: bool,
}

/// Entry point for CLI operations.
pub fn run_cli(cli: Cli) -> Result<(), String> {
    let dest = cli.dest.clone().unwrap_or_else(|| cli.source.clone());

    if cli.undo {
        return run_undo(&dest);
    }

    run_organize(&cli, &dest)
}

fn run_organize(cli: &Cli, dest: &Path) -> Result<(), String> {
    let reports_dir = cli
        .reports_dir
        .clone()
        .unwrap_or_else(|| dest.join("reports"));

    let config = FilterConfig::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let filters = config
        .compile()
        .map_err(|e| format!("Error compiling filters: {}", e))?;

    let (index, index_warning) = match &cli.index {
        Some(path) => DuplicateIndex::load(path),
        None => (DuplicateIndex::new(), None),
    };
    if let Some(warning) = &index_warning {
        OutputFormatter::warning(warning);
    }

    let mode = if cli.copy {
        TransferMode::Copy
    } else {
        TransferMode::Move
    };
    if cli.quarantine && cli.copy {
        OutputFormatter::warning("--quarantine has no effect in copy mode; duplicates are reported only");
    }

    let mut exclude_files = vec![dest.join(HISTORY_FILE_NAME)];
    if let Some(index_path) = &cli.index {
        exclude_files.push(index_path.clone());
    }

    let options = OrganizeOptions {
        source_root: cli.source.clone(),
        destination_root: dest.to_path_buf(),
        reports_dir: reports_dir.clone(),
        mode,
        duplicate_policy: if cli.quarantine {
            DuplicatePolicy::Quarantine
        } else {
            DuplicatePolicy::ReportOnly
        },
        exclude_files,
        dry_run: cli.dry_run,
    };

    if cli.dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "Analyzing contents of {}",
            cli.source.display()
        ));
    } else {
        OutputFormatter::info(&format!("Organizing contents of {}", cli.source.display()));
    }

    let started_at = Local::now();
    let start = Instant::now();

    let mut organizer = Organizer::new(options, index, filters);
    let mut progress: Option<ProgressBar> = None;
    let dry_run = cli.dry_run;

    let run_result = organizer.run(|record, _position, total| {
        let pb = progress
            .get_or_insert_with(|| OutputFormatter::create_progress_bar(total as u64));
        pb.println(describe_record(record, dry_run));
        pb.inc(1);
    });

    let outcome = match run_result {
        Ok(outcome) => outcome,
        Err(e) => {
            // Even a fatal run leaves a structured report behind.
            let report =
                OrganizationReport::fatal(e.to_string(), started_at, start.elapsed());
            if !cli.dry_run {
                match report.persist(&reports_dir, started_at) {
                    Ok(path) => {
                        OutputFormatter::warning(&format!("Report written to {}", path.display()));
                    }
                    Err(persist_err) => {
                        OutputFormatter::error(&format!(
                            "Could not write report: {}",
                            persist_err
                        ));
                    }
                }
            }
            return Err(e.to_string());
        }
    };

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    let mut warnings = outcome.warnings.clone();
    if let Some(warning) = index_warning {
        warnings.push(warning);
    }

    let report = OrganizationReport::build(&outcome.records, warnings, started_at, start.elapsed());

    if cli.dry_run {
        OutputFormatter::run_summary(&report);
        OutputFormatter::success("Dry run complete. No files were modified.");
        return Ok(());
    }

    // Operation history enables undo for move-mode runs.
    if mode == TransferMode::Move {
        let mut history = HistoryLog::new(dest.to_path_buf());
        for record in &outcome.records {
            history.record(record);
        }
        if let Err(e) = history.save(dest) {
            OutputFormatter::warning(&format!("Could not save history: {}", e));
            OutputFormatter::warning("Undo will not be available for this run.");
        }
    }

    if let Some(index_path) = &cli.index {
        let index = organizer.into_index();
        if let Err(e) = index.save(index_path) {
            OutputFormatter::warning(&format!("Could not save duplicate index: {}", e));
        }
    }

    match report.persist(&reports_dir, started_at) {
        Ok(path) => OutputFormatter::plain(&format!("Report written to {}", path.display())),
        Err(e) => OutputFormatter::error(&format!("Could not write report: {}", e)),
    }

    OutputFormatter::run_summary(&report);
    if mode == TransferMode::Move && report.summary.files_organized > 0 {
        OutputFormatter::plain(&format!(
            "Use 'dupesort {} --undo' to revert.",
            dest.display()
        ));
    }

    Ok(())
}

fn describe_record(record: &crate::organizer::FileRecord, dry_run: bool) -> String {
    let name = record
        .source_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| record.source_path.display().to_string());

    match record.status {
        FileStatus::Organized => {
            let verb = if dry_run { "would move to" } else { "→" };
            format!(
                " - {} {} {}/",
                name,
                verb,
                record.category.dir_name()
            )
        }
        FileStatus::Duplicate => match &record.duplicate_of {
            Some(canonical) => format!(" - {} duplicate of {}", name, canonical.display()),
            None => format!(" - {} duplicate", name),
        },
        FileStatus::SkippedExists => format!(" - {} already organized", name),
        FileStatus::SkippedUnreadable => format!(
            " - {} unreadable: {}",
            name,
            record.reason.as_deref().unwrap_or("unknown error")
        ),
        FileStatus::MoveFailed => format!(
            " - {} move failed: {}",
            name,
            record.reason.as_deref().unwrap_or("unknown error")
        ),
    }
}

fn run_undo(dest: &Path) -> Result<(), String> {
    OutputFormatter::info("Undoing previous organization...");

    match UndoManager::undo(dest) {
        Ok(report) => {
            OutputFormatter::success("Undo complete!");
            OutputFormatter::plain(&format!("  Restored: {}", report.restored_files));

            if !report.skipped_files.is_empty() {
                OutputFormatter::plain(&format!("  Skipped: {}", report.skipped_files.len()));
                for (path, reason) in &report.skipped_files {
                    OutputFormatter::plain(&format!("    - {}: {}", path.display(), reason));
                }
            }

            if !report.failed_restores.is_empty() {
                OutputFormatter::error(&format!("  Failed: {}", report.failed_restores.len()));
                for (path, reason) in &report.failed_restores {
                    OutputFormatter::error(&format!("    - {}: {}", path.display(), reason));
                }
                OutputFormatter::warning(
                    "History file was NOT deleted due to failures. Fix the issues and retry.",
                );
            }

            Ok(())
        }
        Err(e) => Err(format!("Error: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["dupesort", "/tmp/inbox"]);
        assert_eq!(cli.source, PathBuf::from("/tmp/inbox"));
        assert!(cli.dest.is_none());
        assert!(!cli.copy);
        assert!(!cli.quarantine);
        assert!(!cli.dry_run);
        assert!(!cli.undo);
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from([
            "dupesort",
            "/tmp/inbox",
            "--dest",
            "/tmp/sorted",
            "--copy",
            "--quarantine",
            "--index",
            "/tmp/index.json",
            "--dry-run",
        ]);
        assert_eq!(cli.dest, Some(PathBuf::from("/tmp/sorted")));
        assert!(cli.copy);
        assert!(cli.quarantine);
        assert_eq!(cli.index, Some(PathBuf::from("/tmp/index.json")));
        assert!(cli.dry_run);
    }
}
