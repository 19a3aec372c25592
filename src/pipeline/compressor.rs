//! Iterative size compressor.
//!
//! Re-encodes the working raster until the output fits the byte budget,
//! trading quality first and geometry second:
//!
//! - quality-tunable targets (JPEG) step quality down 0.1 at a time; at the
//!   0.1 floor the dimensions shrink by 10% and quality resets to 0.7.
//! - everything else (alpha-capable containers, plus lossless non-alpha
//!   ones) has no quality lever and shrinks dimensions only.
//!
//! Termination is explicit: the byte budget is met, the iteration ceiling
//! is hit ([`PipelineError::BudgetExceeded`]), or geometry degenerates to
//! 1×1 — at which point the smallest attempt seen is returned rather than
//! looping forever.

use image::DynamicImage;

use super::PipelineError;
use super::backend::ImageBackend;
use super::calculations::shrink_step;
use super::format::ImageKind;
use super::params::{CancelToken, Constraints, Quality};
use super::raster::rasterize;

/// Output of a successful compression run.
#[derive(Debug, Clone)]
pub struct Compressed {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Final quality, for quality-tunable targets.
    pub quality: Option<Quality>,
    /// Encode attempts consumed.
    pub iterations: u32,
}

/// Drive the encode loop until `target` bytes fit `constraints.max_bytes`.
///
/// `initial_dims` already respect the caller's pixel bounds; the loop only
/// shrinks from there, never grows.
pub fn compress_to_budget(
    backend: &impl ImageBackend,
    source: &DynamicImage,
    target: ImageKind,
    initial_dims: (u32, u32),
    constraints: &Constraints,
    cancel: Option<&CancelToken>,
) -> Result<Compressed, PipelineError> {
    let (mut width, mut height) = initial_dims;
    let mut quality = target
        .supports_quality()
        .then_some(constraints.initial_quality);
    let mut raster = rasterize(source, width, height, target);
    let mut best: Option<Compressed> = None;

    for iteration in 1..=constraints.max_iterations {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(PipelineError::Cancelled);
        }

        let bytes = backend.encode(&raster, target, quality)?;
        let size = bytes.len() as u64;
        log::debug!(
            "encode pass {iteration}: {}x{} {} q={:?} -> {size} bytes (budget {})",
            width,
            height,
            target.mime(),
            quality.map(Quality::value),
            constraints.max_bytes
        );

        let attempt = Compressed {
            bytes,
            width,
            height,
            quality,
            iterations: iteration,
        };
        if size <= constraints.max_bytes {
            return Ok(attempt);
        }
        if best
            .as_ref()
            .is_none_or(|b| size < b.bytes.len() as u64)
        {
            best = Some(attempt);
        }

        match quality {
            // Quality lever still available: same raster, one step down.
            Some(q) if !q.at_floor() => quality = Some(q.step_down()),
            // Out of quality headroom (or no lever at all): shrink geometry.
            _ => {
                let shrunk = shrink_step((width, height));
                if shrunk == (width, height) {
                    // Geometry can degenerate no further; hand back the
                    // smallest attempt instead of spinning.
                    return best.ok_or_else(|| {
                        PipelineError::Compression("no encode attempt recorded".to_string())
                    });
                }
                (width, height) = shrunk;
                if quality.is_some() {
                    quality = Some(Quality::new(Quality::RESET));
                }
                raster = rasterize(source, width, height, target);
            }
        }
    }

    Err(PipelineError::BudgetExceeded {
        iterations: constraints.max_iterations,
        achieved: best.map(|b| b.bytes.len() as u64).unwrap_or(0),
        budget: constraints.max_bytes,
    })
}
