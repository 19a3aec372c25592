//! Container formats and their capabilities.
//!
//! Every format decision in the pipeline goes through [`ImageKind`] and its
//! two capability flags, never through scattered format-list checks:
//!
//! - [`ImageKind::supports_alpha`] — can the container encode per-pixel
//!   transparency? Gates flattening in the rasterizer and restricts the
//!   compressor to dimension-only reduction.
//! - [`ImageKind::supports_quality`] — does the encoder expose a lossy
//!   quality parameter the compressor can turn down?

use image::ImageFormat;

/// Threshold above which a non-alpha source is converted to JPEG (300 KiB).
///
/// Alpha-capable sources are never converted — transparency is preserved
/// end-to-end regardless of size.
pub const CONVERT_TO_JPEG_THRESHOLD: u64 = 300 * 1024;

/// An image container format the pipeline can decode and re-encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    WebP,
    Bmp,
    Tiff,
}

impl ImageKind {
    /// Sniff the format from magic bytes. `None` for anything that is not
    /// one of the supported containers — the caller treats that as invalid
    /// input, not a decode failure.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        Self::from_image_format(image::guess_format(bytes).ok()?)
    }

    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::WebP => Some(Self::WebP),
            ImageFormat::Bmp => Some(Self::Bmp),
            ImageFormat::Tiff => Some(Self::Tiff),
            _ => None,
        }
    }

    /// Whether the container can encode per-pixel transparency.
    pub fn supports_alpha(self) -> bool {
        matches!(self, Self::Png | Self::Gif | Self::WebP)
    }

    /// Whether the encoder exposes a lossy quality parameter.
    ///
    /// Only JPEG output is quality-tunable here: PNG/GIF/BMP/TIFF are not
    /// lossy, and WebP is encoded losslessly (see the backend).
    pub fn supports_quality(self) -> bool {
        matches!(self, Self::Jpeg)
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
        }
    }

    /// Canonical file extension for the format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::WebP => "webp",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        }
    }
}

/// File extensions the CLI accepts when collecting inputs from a directory.
pub const SUPPORTED_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff"];

/// Pick the output container for a source image.
///
/// Flatten-to-JPEG happens only when the source cannot carry alpha AND the
/// original payload is heavy enough to be worth the conversion; otherwise
/// the source container is kept.
pub fn choose_target(source: ImageKind, source_bytes: u64, convert_threshold: u64) -> ImageKind {
    if !source.supports_alpha() && source_bytes > convert_threshold {
        ImageKind::Jpeg
    } else {
        source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_capable_formats() {
        assert!(ImageKind::Png.supports_alpha());
        assert!(ImageKind::Gif.supports_alpha());
        assert!(ImageKind::WebP.supports_alpha());
        assert!(!ImageKind::Jpeg.supports_alpha());
        assert!(!ImageKind::Bmp.supports_alpha());
        assert!(!ImageKind::Tiff.supports_alpha());
    }

    #[test]
    fn only_jpeg_is_quality_tunable() {
        assert!(ImageKind::Jpeg.supports_quality());
        for kind in [
            ImageKind::Png,
            ImageKind::Gif,
            ImageKind::WebP,
            ImageKind::Bmp,
            ImageKind::Tiff,
        ] {
            assert!(!kind.supports_quality(), "{kind:?} must not be quality-tunable");
        }
    }

    #[test]
    fn sniff_png_magic() {
        let magic = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0];
        assert_eq!(ImageKind::sniff(&magic), Some(ImageKind::Png));
    }

    #[test]
    fn sniff_jpeg_magic() {
        let magic = [0xff, 0xd8, 0xff, 0xe0, 0, 0, 0, 0];
        assert_eq!(ImageKind::sniff(&magic), Some(ImageKind::Jpeg));
    }

    #[test]
    fn sniff_garbage_is_none() {
        assert_eq!(ImageKind::sniff(b"this is not an image at all"), None);
    }

    #[test]
    fn target_large_jpeg_stays_jpeg() {
        let target = choose_target(ImageKind::Jpeg, 4 * 1024 * 1024, CONVERT_TO_JPEG_THRESHOLD);
        assert_eq!(target, ImageKind::Jpeg);
    }

    #[test]
    fn target_large_bmp_converts_to_jpeg() {
        let target = choose_target(ImageKind::Bmp, 500 * 1024, CONVERT_TO_JPEG_THRESHOLD);
        assert_eq!(target, ImageKind::Jpeg);
    }

    #[test]
    fn target_small_bmp_keeps_container() {
        let target = choose_target(ImageKind::Bmp, 100 * 1024, CONVERT_TO_JPEG_THRESHOLD);
        assert_eq!(target, ImageKind::Bmp);
    }

    #[test]
    fn target_large_png_never_converts() {
        // Alpha-capable sources keep their container regardless of size.
        let target = choose_target(ImageKind::Png, 10 * 1024 * 1024, CONVERT_TO_JPEG_THRESHOLD);
        assert_eq!(target, ImageKind::Png);
    }

    #[test]
    fn target_at_threshold_keeps_container() {
        // Strictly-greater-than: exactly at the threshold keeps the source format.
        let target = choose_target(
            ImageKind::Jpeg,
            CONVERT_TO_JPEG_THRESHOLD,
            CONVERT_TO_JPEG_THRESHOLD,
        );
        assert_eq!(target, ImageKind::Jpeg);
    }
}
