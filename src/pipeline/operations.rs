//! High-level pipeline operations.
//!
//! [`normalize`] is the one entry point the rest of the crate consumes:
//! bytes in, [`ResultImage`] out, or a typed [`PipelineError`]. The steps
//! combine the pure calculations with backend execution:
//!
//! 1. pre-checks (acceptance ceiling, format sniff)
//! 2. decode
//! 3. target-format choice (flatten-to-JPEG only for heavy non-alpha input)
//! 4. bounding-box dimension fit
//! 5. pass-through for inputs already inside every constraint
//! 6. the compression loop
//! 7. packaging (extension swap only on a real JPEG conversion)

use std::io::Cursor;
use std::path::Path;

use super::PipelineError;
use super::backend::ImageBackend;
use super::calculations::fit_within;
use super::compressor::compress_to_budget;
use super::format::{ImageKind, choose_target};
use super::params::{CancelToken, Constraints, Quality};
use super::rust_backend::RustBackend;

/// The packaged output of one normalization.
#[derive(Debug, Clone)]
pub struct ResultImage {
    pub bytes: Vec<u8>,
    pub kind: ImageKind,
    /// Output file name. Matches the input name unless the image was
    /// converted to JPEG, in which case the extension becomes `jpg`.
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    /// Final encoding quality, for quality-tunable targets that went
    /// through the compressor.
    pub quality: Option<Quality>,
    /// Encode attempts consumed; 0 means the input passed through untouched.
    pub iterations: u32,
}

impl ResultImage {
    pub fn byte_len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn mime(&self) -> &'static str {
        self.kind.mime()
    }
}

/// Header-only report of what normalization would do, without encoding.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub kind: ImageKind,
    pub width: u32,
    pub height: u32,
    pub byte_len: u64,
    pub target: ImageKind,
    /// Dimensions after the bounding-box fit.
    pub fitted: (u32, u32),
    /// Whether the input would pass through untouched.
    pub pass_through: bool,
}

/// Normalize with the production codec backend.
pub fn normalize(
    file_name: &str,
    bytes: &[u8],
    constraints: &Constraints,
    cancel: Option<&CancelToken>,
) -> Result<ResultImage, PipelineError> {
    normalize_with_backend(&RustBackend::new(), file_name, bytes, constraints, cancel)
}

/// Normalize using a specific backend (allows testing with a mock).
pub fn normalize_with_backend(
    backend: &impl ImageBackend,
    file_name: &str,
    bytes: &[u8],
    constraints: &Constraints,
    cancel: Option<&CancelToken>,
) -> Result<ResultImage, PipelineError> {
    let kind = precheck(bytes, constraints)?;

    let decoded = backend.decode(bytes)?;
    if cancel.is_some_and(CancelToken::is_cancelled) {
        return Err(PipelineError::Cancelled);
    }

    let dims = (decoded.width(), decoded.height());
    let fitted = fit_within(dims, (constraints.max_width, constraints.max_height));
    let target = choose_target(kind, bytes.len() as u64, constraints.flatten_threshold);

    // Already inside every constraint and keeping its container: hand the
    // original bytes back untouched. Pixels (alpha included) stay
    // bit-identical and the output can never be larger than the input.
    if fitted == dims && bytes.len() as u64 <= constraints.max_bytes && target == kind {
        return Ok(ResultImage {
            bytes: bytes.to_vec(),
            kind,
            file_name: file_name.to_string(),
            width: dims.0,
            height: dims.1,
            quality: None,
            iterations: 0,
        });
    }

    let compressed = compress_to_budget(backend, &decoded, target, fitted, constraints, cancel)?;

    Ok(ResultImage {
        bytes: compressed.bytes,
        kind: target,
        file_name: package_name(file_name, kind, target),
        width: compressed.width,
        height: compressed.height,
        quality: compressed.quality,
        iterations: compressed.iterations,
    })
}

/// Report what normalization would do, reading only the container header.
pub fn inspect(bytes: &[u8], constraints: &Constraints) -> Result<Inspection, PipelineError> {
    let kind = precheck(bytes, constraints)?;

    let (width, height) = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PipelineError::InvalidInput(e.to_string()))?
        .into_dimensions()
        .map_err(|e| PipelineError::Decode(e.to_string()))?;

    let fitted = fit_within((width, height), (constraints.max_width, constraints.max_height));
    let target = choose_target(kind, bytes.len() as u64, constraints.flatten_threshold);
    let pass_through = fitted == (width, height)
        && bytes.len() as u64 <= constraints.max_bytes
        && target == kind;

    Ok(Inspection {
        kind,
        width,
        height,
        byte_len: bytes.len() as u64,
        target,
        fitted,
        pass_through,
    })
}

/// Reject inputs before any decoding happens.
fn precheck(bytes: &[u8], constraints: &Constraints) -> Result<ImageKind, PipelineError> {
    if bytes.len() as u64 > constraints.max_upload_bytes {
        return Err(PipelineError::InvalidInput(format!(
            "{} bytes exceeds the {} byte acceptance ceiling",
            bytes.len(),
            constraints.max_upload_bytes
        )));
    }
    ImageKind::sniff(bytes)
        .ok_or_else(|| PipelineError::InvalidInput("not a recognized image format".to_string()))
}

/// Output file name: the extension changes only on a real JPEG conversion.
///
/// A source that already was JPEG keeps its name byte-for-byte, so
/// `photo.jpeg` is not renamed `photo.jpg`.
fn package_name(file_name: &str, source: ImageKind, target: ImageKind) -> String {
    if target == ImageKind::Jpeg && source != ImageKind::Jpeg {
        Path::new(file_name)
            .with_extension(target.extension())
            .to_string_lossy()
            .into_owned()
    } else {
        file_name.to_string()
    }
}
