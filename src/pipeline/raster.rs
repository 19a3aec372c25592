//! Rasterization: scale the decoded bitmap to the working dimensions and
//! resolve transparency for the target container.
//!
//! Two buffer policies, chosen by the target's alpha capability:
//!
//! - alpha-capable target → the buffer starts cleared; transparent source
//!   pixels stay transparent in the output.
//! - non-alpha target → the buffer starts opaque white; transparent source
//!   regions are composited onto white.

use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage, RgbaImage};

use super::format::ImageKind;

/// A pixel buffer ready for encoding.
///
/// The variant records whether alpha survived rasterization, which also
/// tells the backend which color layout to hand the encoder.
#[derive(Debug, Clone)]
pub enum Raster {
    /// RGBA buffer, alpha preserved.
    Transparent(RgbaImage),
    /// RGB buffer, flattened onto opaque white.
    Opaque(RgbImage),
}

impl Raster {
    pub fn width(&self) -> u32 {
        match self {
            Self::Transparent(buf) => buf.width(),
            Self::Opaque(buf) => buf.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Self::Transparent(buf) => buf.height(),
            Self::Opaque(buf) => buf.height(),
        }
    }
}

/// Draw `source` into a `width` × `height` buffer for the given target.
///
/// Dimensions were computed upstream with the aspect ratio already
/// preserved, so the resize is exact. Lanczos3 throughout.
pub fn rasterize(source: &DynamicImage, width: u32, height: u32, target: ImageKind) -> Raster {
    let resized = if source.width() == width && source.height() == height {
        source.clone()
    } else {
        source.resize_exact(width, height, FilterType::Lanczos3)
    };

    if target.supports_alpha() {
        Raster::Transparent(resized.into_rgba8())
    } else {
        Raster::Opaque(flatten_onto_white(&resized.into_rgba8()))
    }
}

/// Composite an RGBA buffer onto an opaque white background.
fn flatten_onto_white(rgba: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let px = rgba.get_pixel(x, y);
        let alpha = px[3] as u32;
        let blend = |c: u8| -> u8 {
            // c·a + 255·(1−a), in integer arithmetic with rounding
            ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8
        };
        Rgb([blend(px[0]), blend(px[1]), blend(px[2])])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn checkerboard_rgba(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([200, 40, 40, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        }))
    }

    #[test]
    fn alpha_target_keeps_transparency() {
        let src = checkerboard_rgba(8, 8);
        let raster = rasterize(&src, 8, 8, ImageKind::Png);
        match raster {
            Raster::Transparent(buf) => {
                assert_eq!(buf.get_pixel(1, 0)[3], 0, "transparent pixel lost its alpha");
                assert_eq!(buf.get_pixel(0, 0)[3], 255);
            }
            Raster::Opaque(_) => panic!("png target must not flatten"),
        }
    }

    #[test]
    fn non_alpha_target_flattens_to_white() {
        let src = checkerboard_rgba(8, 8);
        let raster = rasterize(&src, 8, 8, ImageKind::Jpeg);
        match raster {
            Raster::Opaque(buf) => {
                assert_eq!(*buf.get_pixel(1, 0), Rgb([255, 255, 255]));
                assert_eq!(*buf.get_pixel(0, 0), Rgb([200, 40, 40]));
            }
            Raster::Transparent(_) => panic!("jpeg target must flatten"),
        }
    }

    #[test]
    fn semi_transparent_blends_with_white() {
        let src = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 128])));
        let raster = rasterize(&src, 2, 2, ImageKind::Jpeg);
        let Raster::Opaque(buf) = raster else {
            panic!("expected opaque raster");
        };
        // 50% black over white ≈ mid gray.
        let px = buf.get_pixel(0, 0);
        assert!((126..=129).contains(&px[0]), "got {}", px[0]);
    }

    #[test]
    fn rasterize_resizes_to_requested_dimensions() {
        let src = checkerboard_rgba(64, 32);
        let raster = rasterize(&src, 16, 8, ImageKind::Png);
        assert_eq!((raster.width(), raster.height()), (16, 8));
    }

    #[test]
    fn same_size_skips_resample() {
        // Opaque source at identical dimensions must come through pixel-exact.
        let src = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255])));
        let raster = rasterize(&src, 4, 4, ImageKind::Jpeg);
        let Raster::Opaque(buf) = raster else {
            panic!("expected opaque raster");
        };
        assert_eq!(*buf.get_pixel(2, 2), Rgb([10, 20, 30]));
    }
}
