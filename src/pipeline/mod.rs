//! Image normalization — pure Rust, zero external dependencies.
//!
//! Takes an arbitrary image file and produces a byte-budget-constrained,
//! dimension-bounded image suitable for storage as an inline document
//! field. Linear pipeline with one feedback loop:
//!
//! ```text
//! decode → classify format → fit dimensions → rasterize → compress loop → package
//! ```
//!
//! The module is split into:
//! - **Calculations**: pure functions for dimension math (unit testable)
//! - **Format**: container variants with alpha/quality capability flags
//! - **Parameters**: [`Constraints`], [`Quality`], [`CancelToken`]
//! - **Raster**: scaling + transparency flattening policy
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Compressor**: the iterative quality/dimension reduction loop
//! - **Operations**: the [`normalize`] entry point and result packaging

pub mod backend;
mod calculations;
mod compressor;
pub mod format;
pub mod operations;
mod params;
mod raster;
pub mod rust_backend;

use thiserror::Error;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{fit_within, shrink_step};
pub use compressor::Compressed;
pub use format::{ImageKind, SUPPORTED_EXTENSIONS, choose_target};
pub use operations::{Inspection, ResultImage, inspect, normalize, normalize_with_backend};
pub use params::{CancelToken, Constraints, Quality};
pub use raster::{Raster, rasterize};
pub use rust_backend::RustBackend;

/// Terminal failures of one pipeline invocation.
///
/// Either a complete, valid image comes back or one of these does — the
/// pipeline never surfaces a partial result.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Rejected before decoding: unrecognized bytes or over the acceptance
    /// ceiling.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The bitmap could not be decoded (corrupt file, unsupported encoding).
    #[error("decode failed: {0}")]
    Decode(String),
    /// An individual encode attempt produced no output.
    #[error("compression failed: {0}")]
    Compression(String),
    /// Iteration ceiling reached without meeting the byte budget.
    #[error(
        "byte budget not met after {iterations} iterations \
         (best {achieved} bytes, budget {budget})"
    )]
    BudgetExceeded {
        iterations: u32,
        achieved: u64,
        budget: u64,
    },
    /// The caller's [`CancelToken`] fired.
    #[error("cancelled")]
    Cancelled,
}

impl From<BackendError> for PipelineError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Decode(msg) => Self::Decode(msg),
            BackendError::Encode(msg) => Self::Compression(msg),
        }
    }
}
