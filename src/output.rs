//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output leads with what happened to each image — final dimensions,
//! format, and byte size — with the filesystem path shown as secondary
//! context via an indented `Source:` line.
//!
//! ```text
//! Fitting 3 images
//! 001 photo.jpg
//!     Source: shoots/photo.jpg (4.2 MiB)
//!     1200x800 image/jpeg 410.3 KiB quality 0.6 (4 passes)
//! 002 icon.png
//!     Source: assets/icon.png (3.1 KiB)
//!     unchanged (3.1 KiB)
//! 003 scan.bmp
//!     Source: scans/scan.bmp (1.8 MiB)
//!     failed: decode failed: ...
//!
//! Fitted 2 of 3 images -> out (1 failed)
//! Cache: 0 hits, 3 misses
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects.

use std::path::Path;

use crate::batch::{BatchOutcome, FileRecord, FitEvent, FitStatus};
use crate::pipeline::Inspection;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Render a byte count in binary units with one decimal.
pub fn human_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    let b = bytes as f64;
    if b >= MIB {
        format!("{:.1} MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{bytes} B")
    }
}

fn passes(iterations: u32) -> String {
    if iterations == 1 {
        "1 pass".to_string()
    } else {
        format!("{iterations} passes")
    }
}

fn file_header(index: usize, source: &str) -> String {
    let name = Path::new(source)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_string());
    format!("{} {}", format_index(index), name)
}

// ============================================================================
// Fit progress
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_fit_event(event: &FitEvent) -> Vec<String> {
    match event {
        FitEvent::Started { total } => {
            let noun = if *total == 1 { "image" } else { "images" };
            vec![format!("Fitting {total} {noun}")]
        }
        FitEvent::FileFinished(record) => format_file_record(record),
    }
}

fn format_file_record(record: &FileRecord) -> Vec<String> {
    let mut lines = vec![
        file_header(record.index, &record.source),
        format!(
            "    Source: {} ({})",
            record.source,
            human_bytes(record.original_bytes)
        ),
    ];

    match &record.status {
        FitStatus::Normalized {
            final_bytes,
            width,
            height,
            mime,
            quality,
            iterations,
            ..
        } => {
            let mut line = format!(
                "    {width}x{height} {mime} {}",
                human_bytes(*final_bytes)
            );
            if let Some(q) = quality {
                line.push_str(&format!(" quality {q:.1}"));
            }
            line.push_str(&format!(" ({})", passes(*iterations)));
            lines.push(line);
        }
        FitStatus::PassedThrough { final_bytes, .. } => {
            lines.push(format!("    unchanged ({})", human_bytes(*final_bytes)));
        }
        FitStatus::Cached { output } => {
            lines.push(format!("    cached -> {output}"));
        }
        FitStatus::Failed { error } => {
            lines.push(format!("    failed: {error}"));
        }
    }

    lines
}

/// Print one batch event to stdout.
pub fn print_fit_event(event: &FitEvent) {
    for line in format_fit_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch summary
// ============================================================================

/// Format the end-of-run summary.
pub fn format_summary(outcome: &BatchOutcome, out_dir: &Path) -> Vec<String> {
    let total = outcome.files.len();
    let failed = outcome.failed_count();
    let fitted = total - failed;

    let mut headline = format!("Fitted {fitted} of {total} images -> {}", out_dir.display());
    if failed > 0 {
        headline.push_str(&format!(" ({failed} failed)"));
    }

    vec![String::new(), headline, format!("Cache: {}", outcome.cache)]
}

/// Print the end-of-run summary to stdout.
pub fn print_summary(outcome: &BatchOutcome, out_dir: &Path) {
    for line in format_summary(outcome, out_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Inspect
// ============================================================================

/// Format one inspection result.
pub fn format_inspection(index: usize, source: &str, inspection: &Inspection) -> Vec<String> {
    let mut lines = vec![
        file_header(index, source),
        format!(
            "    {} {}x{}, {}",
            inspection.kind.mime(),
            inspection.width,
            inspection.height,
            human_bytes(inspection.byte_len)
        ),
    ];

    if inspection.pass_through {
        lines.push("    already fits - would pass through".to_string());
    } else {
        let (fw, fh) = inspection.fitted;
        let mut action = format!(
            "    would become {} at {fw}x{fh} or smaller",
            inspection.target.mime()
        );
        if inspection.target != inspection.kind {
            action.push_str(" (converted)");
        }
        lines.push(action);
    }

    lines
}

/// Print one inspection result to stdout.
pub fn print_inspection(index: usize, source: &str, inspection: &Inspection) {
    for line in format_inspection(index, source, inspection) {
        println!("{}", line);
    }
}

/// Format an inspection that could not be performed.
pub fn format_inspection_failure(index: usize, source: &str, error: &str) -> Vec<String> {
    vec![
        file_header(index, source),
        format!("    failed: {error}"),
    ]
}

/// Print an inspection failure to stdout.
pub fn print_inspection_failure(index: usize, source: &str, error: &str) {
    for line in format_inspection_failure(index, source, error) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
