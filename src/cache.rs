//! Normalization cache for repeated batch runs.
//!
//! Re-encoding every image on every run is the slow part of a batch — the
//! compressor may take several encode passes per file. This module lets the
//! batch stage skip files whose bytes and constraints haven't changed since
//! the last run. The pipeline itself stays stateless; caching is purely a
//! batch-layer concern.
//!
//! # Design
//!
//! The cache is **content-addressed**: lookups are by the combination of
//! `source_hash` and `params_hash`, not by input path. Renames and moves do
//! not invalidate the cache — only actual content or constraint changes do.
//!
//! - **`source_hash`**: SHA-256 of the source file bytes. Content-based
//!   rather than mtime-based so it survives `git checkout` (which resets
//!   modification times).
//!
//! - **`params_hash`**: SHA-256 of the constraint values. If any bound,
//!   budget, or quality setting changes, every file is re-processed.
//!
//! A cache hit requires:
//! 1. An entry with matching `source_hash` and `params_hash` exists
//! 2. The previously-written output file still exists on disk
//!
//! # Storage
//!
//! The cache manifest is a JSON file at `<out_dir>/.pixfit-cache.json`. It
//! lives alongside the outputs so it travels with the directory.
//!
//! # Bypassing
//!
//! `--no-cache` loads an empty manifest, so every file is re-processed and
//! old outputs are overwritten naturally.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::Path;

use crate::pipeline::Constraints;

/// Name of the cache manifest file within the output directory.
const MANIFEST_FILENAME: &str = ".pixfit-cache.json";

/// Version of the cache manifest format. Bump this to invalidate all
/// existing caches when the format or key computation changes.
const MANIFEST_VERSION: u32 = 1;

/// A single cached output.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    /// Output file name relative to the output directory.
    pub output: String,
}

/// On-disk cache manifest keyed by `"{source_hash}:{params_hash}"`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
}

impl CacheManifest {
    /// Create an empty manifest (used for `--no-cache` or a first run).
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
        }
    }

    /// Load from the output directory. Returns an empty manifest if the
    /// file doesn't exist or can't be parsed (version mismatch, corruption).
    pub fn load(out_dir: &Path) -> Self {
        let path = out_dir.join(MANIFEST_FILENAME);
        let Ok(content) = std::fs::read_to_string(&path) else {
            return Self::empty();
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(manifest) if manifest.version == MANIFEST_VERSION => manifest,
            _ => Self::empty(),
        }
    }

    /// Persist to the output directory.
    pub fn save(&self, out_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(out_dir.join(MANIFEST_FILENAME), json)
    }

    /// Look up a usable cached output: the entry must exist and its output
    /// file must still be on disk.
    pub fn lookup(
        &self,
        out_dir: &Path,
        source_hash: &str,
        params_hash: &str,
    ) -> Option<&CacheEntry> {
        let entry = self.entries.get(&key(source_hash, params_hash))?;
        out_dir.join(&entry.output).exists().then_some(entry)
    }

    pub fn insert(&mut self, source_hash: &str, params_hash: &str, output: String) {
        self.entries
            .insert(key(source_hash, params_hash), CacheEntry { output });
    }
}

fn key(source_hash: &str, params_hash: &str) -> String {
    format!("{source_hash}:{params_hash}")
}

/// SHA-256 of raw bytes, hex-encoded.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_string(&hasher.finalize())
}

/// SHA-256 over every constraint that affects an output.
pub fn hash_params(constraints: &Constraints) -> String {
    let mut hasher = Sha256::new();
    hasher.update(constraints.max_width.to_le_bytes());
    hasher.update(constraints.max_height.to_le_bytes());
    hasher.update(constraints.max_bytes.to_le_bytes());
    hasher.update(constraints.flatten_threshold.to_le_bytes());
    hasher.update(constraints.max_iterations.to_le_bytes());
    hasher.update(constraints.initial_quality.as_percent().to_le_bytes());
    hex_string(&hasher.finalize())
}

fn hex_string(digest: &[u8]) -> String {
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Hit/miss counters for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} hits, {} misses", self.hits, self.misses)
    }
}
