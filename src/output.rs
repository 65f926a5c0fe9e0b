//! Output formatting and styling.
//!
//! Centralizes all CLI output: colored status lines, progress tracking and
//! the end-of-run summary table. The engine itself never prints; it returns
//! records and the CLI renders them through this module.

use crate::report::OrganizationReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages CLI output with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for per-file processing.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints the end-of-run summary: counters, byte totals and the
    /// per-category breakdown of organized files.
    pub fn run_summary(report: &OrganizationReport) {
        Self::header("SUMMARY");

        let summary = &report.summary;
        println!("  Scanned:     {}", summary.files_scanned);
        println!(
            "  Organized:   {}",
            summary.files_organized.to_string().green()
        );
        if summary.duplicates_found > 0 {
            println!(
                "  Duplicates:  {}",
                summary.duplicates_found.to_string().yellow()
            );
        }
        if summary.files_skipped > 0 {
            println!("  Skipped:     {}", summary.files_skipped);
        }
        println!("  Bytes moved: {}", format_bytes(summary.total_size_bytes));
        println!(
            "  Elapsed:     {:.2}s",
            summary.processing_time_seconds
        );

        if !report.type_distribution.is_empty() {
            let max_category_len = report
                .type_distribution
                .keys()
                .map(|name| name.len())
                .max()
                .unwrap_or(0)
                .max(8);

            println!(
                "\n{:<width$} | {}",
                "Category".bold(),
                "Files".bold(),
                width = max_category_len
            );
            println!("{}", "-".repeat(max_category_len + 10));
            for (category, count) in &report.type_distribution {
                println!(
                    "{:<width$} | {}",
                    category,
                    count.to_string().green(),
                    width = max_category_len
                );
            }
        }

        for warning in &report.warnings {
            Self::warning(warning);
        }
    }
}

/// 1536 → "1.5 KB"
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
