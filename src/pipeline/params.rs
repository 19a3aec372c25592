//! Parameter types for the normalization pipeline.
//!
//! These structs describe *what* the pipeline should produce, not *how*.
//! [`Constraints`] is the immutable configuration object threaded through
//! the entry point — never module-level state, never hidden in closures.
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality in [0.1, 1.0]. Clamped on
//!   construction; stepped down in fixed 0.1 decrements by the compressor.
//! - [`Constraints`] — Pixel bounds, initial quality, byte budget, and the
//!   fixed thresholds/ceilings of one invocation.
//! - [`CancelToken`] — Cooperative cancellation flag checked between
//!   pipeline steps.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Lossy encoding quality in [0.1, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality(f32);

impl Quality {
    /// Minimum permitted quality; below this the compressor switches to
    /// dimension reduction instead of further quality loss.
    pub const FLOOR: f32 = 0.1;

    /// Quality after a dimension-reduction reset. A reset, not a continued
    /// decrease: shrinking the raster already bought size headroom.
    pub const RESET: f32 = 0.7;

    /// Step size of one quality reduction.
    pub const STEP: f32 = 0.1;

    pub fn new(value: f32) -> Self {
        Self(value.clamp(Self::FLOOR, 1.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// One compressor step down, clamped at the floor.
    pub fn step_down(self) -> Self {
        Self::new(self.0 - Self::STEP)
    }

    /// Whether further quality reduction is permitted.
    pub fn at_floor(self) -> bool {
        self.0 <= Self::FLOOR + f32::EPSILON
    }

    /// The value an encoder's 1–100 percent scale expects.
    pub fn as_percent(self) -> u8 {
        (self.0 * 100.0).round() as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(0.8)
    }
}

/// Immutable per-invocation constraints.
///
/// Supplied by the caller (CLI flags or `pixfit.toml`); the pipeline never
/// mutates them and holds no state beyond one invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraints {
    /// Maximum output width in pixels.
    pub max_width: u32,
    /// Maximum output height in pixels.
    pub max_height: u32,
    /// Starting quality for quality-tunable targets.
    pub initial_quality: Quality,
    /// Hard upper bound on output byte size.
    pub max_bytes: u64,
    /// Source size above which a non-alpha image is converted to JPEG.
    pub flatten_threshold: u64,
    /// Acceptance ceiling — larger inputs are rejected before decoding.
    pub max_upload_bytes: u64,
    /// Compressor iteration ceiling.
    pub max_iterations: u32,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            max_width: 1600,
            max_height: 1600,
            initial_quality: Quality::default(),
            max_bytes: 500 * 1024,
            flatten_threshold: super::format::CONVERT_TO_JPEG_THRESHOLD,
            max_upload_bytes: 20 * 1024 * 1024,
            max_iterations: 20,
        }
    }
}

/// Cooperative cancellation flag.
///
/// Clone freely — all clones share one flag. The pipeline checks it after
/// decode and before each encode attempt, surfacing cancellation as a
/// distinct terminal error rather than a partial result.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
