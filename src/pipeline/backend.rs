//! Codec backend trait and shared error type.
//!
//! The [`ImageBackend`] trait defines the two operations the pipeline needs
//! from a codec: decode bytes into a bitmap, and encode a raster back into
//! container bytes. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend) — pure Rust via the
//! `image` crate, statically linked.
//!
//! Keeping encoding behind a trait lets the compressor loop be tested with
//! a mock that returns scripted byte sizes, so every state transition is
//! exercised deterministically without real codecs.

use image::DynamicImage;
use thiserror::Error;

use super::format::ImageKind;
use super::params::Quality;
use super::raster::Raster;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Trait for codec backends.
pub trait ImageBackend: Sync {
    /// Decode raw container bytes into a bitmap.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Encode a raster into `target` container bytes.
    ///
    /// `quality` is `Some` only for quality-tunable targets; encoders for
    /// other formats ignore it.
    fn encode(
        &self,
        raster: &Raster,
        target: ImageKind,
        quality: Option<Quality>,
    ) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// One recorded encode call, for asserting compressor transitions.
    #[derive(Debug, Clone, PartialEq)]
    pub struct EncodeOp {
        pub target: ImageKind,
        pub quality_percent: Option<u8>,
        pub width: u32,
        pub height: u32,
    }

    /// Mock backend with scripted encode sizes.
    ///
    /// Each `encode` call pops the next size from the script and returns a
    /// zero-filled buffer of that length; the final script entry repeats
    /// forever, so a one-element script means "every encode is this big".
    /// Uses Mutex (not RefCell) so it is Sync and works across rayon.
    #[derive(Default)]
    pub struct MockBackend {
        pub decode_results: Mutex<Vec<DynamicImage>>,
        encode_sizes: Mutex<VecDeque<usize>>,
        pub operations: Mutex<Vec<EncodeOp>>,
        pub fail_encodes: bool,
    }

    impl MockBackend {
        pub fn with_encode_sizes(sizes: Vec<usize>) -> Self {
            Self {
                encode_sizes: Mutex::new(sizes.into()),
                ..Self::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail_encodes: true,
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<EncodeOp> {
            self.operations.lock().unwrap().clone()
        }

        fn next_size(&self) -> Option<usize> {
            let mut sizes = self.encode_sizes.lock().unwrap();
            match sizes.len() {
                0 => None,
                1 => sizes.front().copied(),
                _ => sizes.pop_front(),
            }
        }
    }

    impl ImageBackend for MockBackend {
        fn decode(&self, _bytes: &[u8]) -> Result<DynamicImage, BackendError> {
            self.decode_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BackendError::Decode("no mock bitmap".to_string()))
        }

        fn encode(
            &self,
            raster: &Raster,
            target: ImageKind,
            quality: Option<Quality>,
        ) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(EncodeOp {
                target,
                quality_percent: quality.map(Quality::as_percent),
                width: raster.width(),
                height: raster.height(),
            });

            if self.fail_encodes {
                return Err(BackendError::Encode("mock encode failure".to_string()));
            }
            let size = self
                .next_size()
                .ok_or_else(|| BackendError::Encode("no scripted encode size".to_string()))?;
            Ok(vec![0u8; size])
        }
    }

    #[test]
    fn mock_records_encode_calls() {
        let backend = MockBackend::with_encode_sizes(vec![100]);
        let raster = Raster::Opaque(image::RgbImage::new(8, 4));

        let bytes = backend
            .encode(&raster, ImageKind::Jpeg, Some(Quality::new(0.8)))
            .unwrap();
        assert_eq!(bytes.len(), 100);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert_eq!(
            ops[0],
            EncodeOp {
                target: ImageKind::Jpeg,
                quality_percent: Some(80),
                width: 8,
                height: 4,
            }
        );
    }

    #[test]
    fn mock_last_size_repeats() {
        let backend = MockBackend::with_encode_sizes(vec![300, 200]);
        let raster = Raster::Opaque(image::RgbImage::new(2, 2));

        let sizes: Vec<usize> = (0..4)
            .map(|_| {
                backend
                    .encode(&raster, ImageKind::Jpeg, None)
                    .unwrap()
                    .len()
            })
            .collect();
        assert_eq!(sizes, vec![300, 200, 200, 200]);
    }

    #[test]
    fn mock_failing_encodes_error() {
        let backend = MockBackend::failing();
        let raster = Raster::Opaque(image::RgbImage::new(2, 2));
        let result = backend.encode(&raster, ImageKind::Jpeg, None);
        assert!(matches!(result, Err(BackendError::Encode(_))));
    }
}
