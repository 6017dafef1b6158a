//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Single operation
//!
//! ```text
//! compress: beach.jpg
//!     Input:  beach.jpg (2.4 MB, image/jpeg)
//!     Output: beach.jpg (812.5 KB, image/jpeg, 4096x2731)
//!     Saved:  66.9%
//! ```
//!
//! ## Metadata
//!
//! ```text
//! beach.jpg
//!     Camera Make: Canon
//!     Camera Model: EOS R5
//!     F-Number: f/2.8
//! ```
//!
//! ## Batch
//!
//! ```text
//! Batch resize: 3 files
//! [1/3] photos/a.jpg: 1.2 MB → 320 KB
//! [2/3] photos/c.png: failed: failed to load image: ...
//! [3/3] photos/b.jpg: 900 KB → 210.5 KB
//! Done: 2 succeeded, 1 failed
//! Manifest: out/manifest.json
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::batch::{BatchEvent, BatchReport, ItemOutcome};
use crate::imaging::{MetadataReport, format_metadata};
use crate::types::{FileInfo, OutputSummary};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Human-readable size: `"0 Bytes"`, then base-1024 units rounded to two
/// decimals with trailing zeros dropped (`"1.5 KB"`, `"2 MB"`).
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut exponent = 0;
    while exponent + 1 < UNITS.len() && bytes >= 1u64 << (10 * (exponent + 1)) {
        exponent += 1;
    }
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exponent])
}

/// Percentage of the original size saved, with one decimal.
/// Negative when the output grew.
pub fn compression_ratio(original: u64, compressed: u64) -> String {
    if original == 0 {
        return "0.0".to_string();
    }
    let saved = (1.0 - compressed as f64 / original as f64) * 100.0;
    format!("{saved:.1}")
}

fn file_line(label: &str, info: &FileInfo, dimensions: Option<(u32, u32)>) -> String {
    let mut details = vec![format_file_size(info.size), info.mime.clone()];
    if let Some((w, h)) = dimensions {
        details.push(format!("{w}x{h}"));
    }
    format!("    {label} {} ({})", info.name, details.join(", "))
}

// ============================================================================
// Single operation
// ============================================================================

pub fn format_summary(summary: &OutputSummary) -> Vec<String> {
    vec![
        format!("{}: {}", summary.operation, summary.input.name),
        file_line("Input: ", &summary.input, None),
        file_line("Output:", &summary.output, summary.dimensions),
        format!(
            "    Saved:  {}%",
            compression_ratio(summary.input.size, summary.output.size)
        ),
    ]
}

pub fn print_summary(summary: &OutputSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Metadata
// ============================================================================

pub fn format_metadata_report(name: &str, report: &MetadataReport) -> Vec<String> {
    let mut lines = vec![name.to_string()];
    match report {
        MetadataReport::NoMetadata => lines.push("    No metadata found".to_string()),
        MetadataReport::Tags(record) => {
            let rows = format_metadata(record);
            if rows.is_empty() {
                lines.push(format!("    {} tags, none displayable", record.len()));
            }
            lines.extend(
                rows.into_iter()
                    .map(|(label, value)| format!("    {label}: {value}")),
            );
        }
    }
    lines
}

pub fn print_metadata_report(name: &str, report: &MetadataReport) {
    for line in format_metadata_report(name, report) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { operation, total } => {
            let noun = if *total == 1 { "file" } else { "files" };
            vec![format!("Batch {operation}: {total} {noun}")]
        }
        BatchEvent::ItemFinished {
            completed,
            total,
            input,
            outcome,
        } => {
            let status = match outcome {
                ItemOutcome::Done {
                    input_size,
                    output_size,
                } => format!(
                    "{} \u{2192} {}",
                    format_file_size(*input_size),
                    format_file_size(*output_size)
                ),
                ItemOutcome::Failed(reason) => format!("failed: {reason}"),
            };
            vec![format!("[{completed}/{total}] {input}: {status}")]
        }
    }
}

pub fn format_batch_summary(report: &BatchReport, manifest: &Path) -> Vec<String> {
    vec![
        format!(
            "Done: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        ),
        format!("Manifest: {}", manifest.display()),
    ]
}

pub fn print_batch_summary(report: &BatchReport, manifest: &Path) {
    for line in format_batch_summary(report, manifest) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
