//! Batch normalization over files and directories.
//!
//! Drives the [`pipeline`](crate::pipeline) across many inputs:
//!
//! - directory arguments are walked recursively ([`walkdir`]) and filtered
//!   to known image extensions; explicit file arguments are always taken
//!   (the pipeline's own sniffing rejects non-images),
//! - files are processed in parallel with [rayon](https://docs.rs/rayon) —
//!   invocations share no mutable state, so no locking is needed,
//! - a per-file failure is recorded and reported, never aborts the batch,
//! - unchanged files are skipped via the content-addressed
//!   [cache](crate::cache),
//! - progress events stream over an `mpsc` channel for the CLI to render,
//! - the whole run can be serialized as a JSON report.
//!
//! Directory structure is preserved: an input found at
//! `photos/team/ada.png` lands at `<out>/team/ada.png`.

use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

use crate::cache::{self, CacheManifest, CacheStats};
use crate::pipeline::{Constraints, Quality, SUPPORTED_EXTENSIONS, normalize};

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("input not found: {0}")]
    InputNotFound(PathBuf),
    #[error("no image files found under the given inputs")]
    NoInputs,
}

/// One file queued for processing.
#[derive(Debug, Clone)]
pub struct InputFile {
    /// Where the bytes come from.
    pub path: PathBuf,
    /// Output location relative to the output directory.
    pub rel: PathBuf,
}

/// Terminal state of one file in the batch.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum FitStatus {
    /// Went through the compressor and was re-encoded.
    Normalized {
        output: String,
        final_bytes: u64,
        width: u32,
        height: u32,
        mime: String,
        quality: Option<f32>,
        iterations: u32,
    },
    /// Already inside every constraint; copied through byte-identical.
    PassedThrough { output: String, final_bytes: u64 },
    /// Unchanged since a previous run; output reused.
    Cached { output: String },
    Failed { error: String },
}

/// Result record for one input file.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    /// 1-based position in the batch.
    pub index: usize,
    pub source: String,
    pub original_bytes: u64,
    #[serde(flatten)]
    pub status: FitStatus,
}

/// Progress events streamed while the batch runs.
#[derive(Debug, Clone)]
pub enum FitEvent {
    Started { total: usize },
    FileFinished(FileRecord),
}

/// Everything a finished batch produced.
#[derive(Debug, Serialize)]
pub struct BatchOutcome {
    pub files: Vec<FileRecord>,
    pub cache: CacheStats,
}

impl BatchOutcome {
    /// Write the run as a pretty-printed JSON report.
    pub fn write_report(&self, path: &Path) -> Result<(), BatchError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn failed_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FitStatus::Failed { .. }))
            .count()
    }
}

/// Expand CLI inputs into the concrete file list, in stable order.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<InputFile>, BatchError> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_file() && has_supported_extension(entry.path()) {
                    let rel = entry
                        .path()
                        .strip_prefix(input)
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|_| entry.file_name().into());
                    files.push(InputFile {
                        path: entry.path().to_path_buf(),
                        rel,
                    });
                }
            }
        } else if input.is_file() {
            // Explicit files are always taken; sniffing rejects non-images.
            let rel = input
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| input.clone());
            files.push(InputFile {
                path: input.clone(),
                rel,
            });
        } else {
            return Err(BatchError::InputNotFound(input.clone()));
        }
    }

    Ok(files)
}

/// Run the batch: normalize every input into `out_dir`.
pub fn run(
    inputs: &[PathBuf],
    out_dir: &Path,
    constraints: &Constraints,
    use_cache: bool,
    events: Option<Sender<FitEvent>>,
) -> Result<BatchOutcome, BatchError> {
    let files = collect_inputs(inputs)?;
    if files.is_empty() {
        return Err(BatchError::NoInputs);
    }
    std::fs::create_dir_all(out_dir)?;

    let manifest = if use_cache {
        CacheManifest::load(out_dir)
    } else {
        CacheManifest::empty()
    };
    let params_hash = cache::hash_params(constraints);

    if let Some(tx) = &events {
        let _ = tx.send(FitEvent::Started { total: files.len() });
    }

    let results: Vec<(FileRecord, Option<CacheInsert>)> = files
        .par_iter()
        .enumerate()
        .map_with(events, |tx, (i, input)| {
            let (record, insert) =
                process_one(i + 1, input, out_dir, constraints, &manifest, &params_hash);
            if let Some(tx) = tx {
                let _ = tx.send(FitEvent::FileFinished(record.clone()));
            }
            (record, insert)
        })
        .collect();

    let mut manifest = manifest;
    let mut stats = CacheStats::default();
    let mut records = Vec::with_capacity(results.len());
    for (record, insert) in results {
        if matches!(record.status, FitStatus::Cached { .. }) {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        if let Some(insert) = insert {
            manifest.insert(&insert.source_hash, &params_hash, insert.output);
        }
        records.push(record);
    }
    if use_cache {
        manifest.save(out_dir)?;
    }

    Ok(BatchOutcome {
        files: records,
        cache: stats,
    })
}

/// Cache insertion deferred until the parallel phase is done.
struct CacheInsert {
    source_hash: String,
    output: String,
}

fn process_one(
    index: usize,
    input: &InputFile,
    out_dir: &Path,
    constraints: &Constraints,
    manifest: &CacheManifest,
    params_hash: &str,
) -> (FileRecord, Option<CacheInsert>) {
    let source = input.path.display().to_string();
    let record = |original_bytes: u64, status: FitStatus| FileRecord {
        index,
        source: source.clone(),
        original_bytes,
        status,
    };

    let bytes = match std::fs::read(&input.path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("{source}: read failed: {e}");
            return (
                record(0, FitStatus::Failed { error: e.to_string() }),
                None,
            );
        }
    };
    let original_bytes = bytes.len() as u64;

    let source_hash = cache::hash_bytes(&bytes);
    if let Some(entry) = manifest.lookup(out_dir, &source_hash, params_hash) {
        return (
            record(
                original_bytes,
                FitStatus::Cached {
                    output: entry.output.clone(),
                },
            ),
            None,
        );
    }

    let file_name = input
        .rel
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.clone());

    match normalize(&file_name, &bytes, constraints, None) {
        Ok(result) => {
            let output_rel = input.rel.with_file_name(&result.file_name);
            let output_path = out_dir.join(&output_rel);
            if let Some(parent) = output_path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    return (
                        record(original_bytes, FitStatus::Failed { error: e.to_string() }),
                        None,
                    );
                }
            }
            if let Err(e) = std::fs::write(&output_path, &result.bytes) {
                return (
                    record(original_bytes, FitStatus::Failed { error: e.to_string() }),
                    None,
                );
            }

            let output = output_rel.to_string_lossy().into_owned();
            let status = if result.iterations == 0 {
                FitStatus::PassedThrough {
                    output: output.clone(),
                    final_bytes: result.byte_len(),
                }
            } else {
                FitStatus::Normalized {
                    output: output.clone(),
                    final_bytes: result.byte_len(),
                    width: result.width,
                    height: result.height,
                    mime: result.mime().to_string(),
                    quality: result.quality.map(Quality::value),
                    iterations: result.iterations,
                }
            };
            (
                record(original_bytes, status),
                Some(CacheInsert {
                    source_hash,
                    output,
                }),
            )
        }
        Err(e) => {
            log::warn!("{source}: {e}");
            (
                record(original_bytes, FitStatus::Failed { error: e.to_string() }),
                None,
            )
        }
    }
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            let lower = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&lower.as_str())
        })
}
