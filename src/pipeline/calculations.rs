//! Pure calculation functions for working dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Fit dimensions inside a bounding box, preserving aspect ratio.
///
/// Applies `ratio = min(max_w/w, max_h/h)` to both axes, but only when the
/// image actually exceeds a bound — an image that already fits is returned
/// unchanged. Scaled axes are floored to integer pixels and clamped to at
/// least 1.
///
/// # Examples
/// ```
/// # use pixfit::pipeline::fit_within;
/// // 5000x5000 into 1200x1200 → 1200x1200
/// assert_eq!(fit_within((5000, 5000), (1200, 1200)), (1200, 1200));
///
/// // 3000x1500 into 1200x1200 → fit to width, aspect kept
/// assert_eq!(fit_within((3000, 1500), (1200, 1200)), (1200, 600));
///
/// // already inside the box → untouched
/// assert_eq!(fit_within((640, 480), (1200, 1200)), (640, 480));
/// ```
pub fn fit_within(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (w, h) = source;
    let (max_w, max_h) = bounds;

    if w <= max_w && h <= max_h {
        return (w, h);
    }

    let ratio = (max_w as f64 / w as f64).min(max_h as f64 / h as f64);
    (scale_axis(w, ratio), scale_axis(h, ratio))
}

/// One compressor shrink step: both axes × 0.9, floored, clamped to ≥ 1.
///
/// Returns the input unchanged once both axes have degenerated to 1 — the
/// caller uses that as its "no further progress" signal.
pub fn shrink_step(dims: (u32, u32)) -> (u32, u32) {
    (scale_axis(dims.0, 0.9), scale_axis(dims.1, 0.9))
}

fn scale_axis(axis: u32, ratio: f64) -> u32 {
    ((axis as f64 * ratio).floor() as u32).max(1)
}
