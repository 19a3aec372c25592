//! Pure Rust codec backend — zero external dependencies.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP, BMP, TIFF) | `image::load_from_memory` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality 1–100) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → GIF | `image::codecs::gif::GifEncoder` |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless) |
//! | Encode → BMP / TIFF | respective `image` codecs |
//!
//! WebP output is lossless because the `image` crate's pure-Rust WebP
//! encoder has no lossy mode — which lines up with the pipeline treating
//! alpha-capable formats as dimension-only anyway.

use std::io::Cursor;

use image::codecs::bmp::BmpEncoder;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};

use super::backend::{BackendError, ImageBackend};
use super::format::ImageKind;
use super::params::Quality;
use super::raster::Raster;

/// Production backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw pixel view of a raster for the `image` encoder APIs.
fn raw_parts(raster: &Raster) -> (&[u8], u32, u32, ExtendedColorType) {
    match raster {
        Raster::Transparent(buf) => (
            buf.as_raw(),
            buf.width(),
            buf.height(),
            ExtendedColorType::Rgba8,
        ),
        Raster::Opaque(buf) => (
            buf.as_raw(),
            buf.width(),
            buf.height(),
            ExtendedColorType::Rgb8,
        ),
    }
}

fn encode_error(target: ImageKind, err: impl std::fmt::Display) -> BackendError {
    BackendError::Encode(format!("{} encode failed: {}", target.mime(), err))
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn encode(
        &self,
        raster: &Raster,
        target: ImageKind,
        quality: Option<Quality>,
    ) -> Result<Vec<u8>, BackendError> {
        let (data, width, height, color) = raw_parts(raster);
        let mut buf = Vec::new();

        match target {
            ImageKind::Jpeg => {
                let percent = quality.unwrap_or_default().as_percent();
                JpegEncoder::new_with_quality(&mut buf, percent)
                    .write_image(data, width, height, color)
                    .map_err(|e| encode_error(target, e))?;
            }
            ImageKind::Png => {
                PngEncoder::new(&mut buf)
                    .write_image(data, width, height, color)
                    .map_err(|e| encode_error(target, e))?;
            }
            ImageKind::Gif => {
                GifEncoder::new(&mut buf)
                    .encode(data, width, height, color)
                    .map_err(|e| encode_error(target, e))?;
            }
            ImageKind::WebP => {
                WebPEncoder::new_lossless(&mut buf)
                    .write_image(data, width, height, color)
                    .map_err(|e| encode_error(target, e))?;
            }
            ImageKind::Bmp => {
                // The BMP and TIFF writers patch headers in place, so they
                // need a seekable sink.
                let mut cursor = Cursor::new(Vec::new());
                BmpEncoder::new(&mut cursor)
                    .write_image(data, width, height, color)
                    .map_err(|e| encode_error(target, e))?;
                buf = cursor.into_inner();
            }
            ImageKind::Tiff => {
                let mut cursor = Cursor::new(Vec::new());
                TiffEncoder::new(&mut cursor)
                    .write_image(data, width, height, color)
                    .map_err(|e| encode_error(target, e))?;
                buf = cursor.into_inner();
            }
        }

        Ok(buf)
    }
}
