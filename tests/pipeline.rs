//! End-to-end pipeline tests over real codecs.
//!
//! Inputs are synthetic: gradients where the scenario needs a
//! well-compressing photo stand-in, hash noise where it needs
//! incompressible pixels, and alpha patterns where transparency matters.

use image::{ImageEncoder, Rgb, RgbImage, Rgba, RgbaImage};
use pixfit::pipeline::{
    Constraints, ImageKind, PipelineError, Quality, normalize,
};

// ============================================================================
// Synthetic inputs
// ============================================================================

fn hash(x: u32, y: u32) -> u32 {
    x.wrapping_mul(2654435761)
        .wrapping_add(y.wrapping_mul(40503))
        .wrapping_mul(2246822519)
}

/// Smooth gradient — compresses very well as JPEG.
fn gradient_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    })
}

/// High-frequency noise — resists compression in every format.
fn noise_rgba(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let h = hash(x, y);
        Rgba([
            (h >> 8) as u8,
            (h >> 16) as u8,
            (h >> 24) as u8,
            ((h >> 4) % 200) as u8,
        ])
    })
}

fn encode_jpeg(img: &RgbImage, quality: u8) -> Vec<u8> {
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    buf
}

fn encode_png(img: &RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
    buf
}

fn encode_bmp(img: &RgbImage) -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    image::codecs::bmp::BmpEncoder::new(&mut cursor)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    cursor.into_inner()
}

// ============================================================================
// Scenario: oversized JPEG
// ============================================================================

#[test]
fn oversized_jpeg_is_bounded_and_stays_jpeg() {
    let input = encode_jpeg(&gradient_rgb(2600, 2600), 85);
    let mut constraints = Constraints::default();
    constraints.max_width = 1200;
    constraints.max_height = 1200;

    let result = normalize("photo.jpg", &input, &constraints, None).unwrap();

    assert_eq!(result.kind, ImageKind::Jpeg);
    assert_eq!(result.mime(), "image/jpeg");
    assert_eq!(result.file_name, "photo.jpg");
    assert!(result.width <= 1200 && result.height <= 1200);
    assert!(result.byte_len() <= constraints.max_bytes);
    assert!(result.quality.is_some_and(|q| q.value() >= Quality::FLOOR));
    assert_eq!(ImageKind::sniff(&result.bytes), Some(ImageKind::Jpeg));
}

#[test]
fn initial_reduction_preserves_aspect_ratio() {
    let input = encode_jpeg(&gradient_rgb(3000, 2000), 85);
    let mut constraints = Constraints::default();
    constraints.max_width = 1200;
    constraints.max_height = 1200;

    let result = normalize("wide.jpg", &input, &constraints, None).unwrap();

    // A well-compressing gradient fits the budget on the first pass, so the
    // dimensions are exactly the bounding-box fit.
    assert_eq!((result.width, result.height), (1200, 800));
    assert_eq!(result.iterations, 1);
}

// ============================================================================
// Scenario: transparent PNG
// ============================================================================

#[test]
fn small_transparent_png_passes_through_byte_identical() {
    let mut img = noise_rgba(100, 100);
    // A fully transparent region the pipeline must not disturb.
    for y in 0..100 {
        for x in 0..40 {
            img.put_pixel(x, y, Rgba([0, 0, 0, 0]));
        }
    }
    let input = encode_png(&img);
    assert!(input.len() as u64 <= Constraints::default().max_bytes);

    let result = normalize("badge.png", &input, &Constraints::default(), None).unwrap();

    assert_eq!(result.kind, ImageKind::Png);
    assert_eq!(result.bytes, input);
    assert_eq!(result.iterations, 0);
    assert_eq!((result.width, result.height), (100, 100));
}

#[test]
fn large_transparent_png_keeps_alpha_and_container() {
    let mut img = noise_rgba(900, 900);
    for y in 0..900 {
        for x in 0..450 {
            img.put_pixel(x, y, Rgba([0, 0, 0, 0]));
        }
    }
    let input = encode_png(&img);
    let mut constraints = Constraints::default();
    constraints.max_width = 400;
    constraints.max_height = 400;

    let result = normalize("logo.png", &input, &constraints, None).unwrap();

    assert_eq!(result.kind, ImageKind::Png);
    assert_eq!(result.file_name, "logo.png");
    assert!(result.width <= 400 && result.height <= 400);
    assert!(result.byte_len() <= constraints.max_bytes);

    // The transparent half must still be transparent, never white.
    let decoded = image::load_from_memory(&result.bytes).unwrap().into_rgba8();
    let deep_left = decoded.get_pixel(decoded.width() / 8, decoded.height() / 2);
    assert_eq!(deep_left[3], 0, "transparent region was filled in");
}

#[test]
fn incompressible_png_shrinks_dimensions_until_it_fits() {
    let input = encode_png(&noise_rgba(256, 256));
    let mut constraints = Constraints::default();
    constraints.max_bytes = 128 * 1024;
    assert!(input.len() as u64 > constraints.max_bytes);

    let result = normalize("noise.png", &input, &constraints, None).unwrap();

    assert_eq!(result.kind, ImageKind::Png);
    assert!(result.iterations > 1, "expected multiple shrink passes");
    assert!(result.byte_len() <= constraints.max_bytes);
    assert!(result.width < 256 && result.height < 256);
    // PNG targets never carry a quality value.
    assert!(result.quality.is_none());

    // Alpha survives the re-encode.
    let decoded = image::load_from_memory(&result.bytes).unwrap().into_rgba8();
    assert!(decoded.pixels().any(|p| p[3] < 255));
}

// ============================================================================
// Scenario: flatten-to-JPEG conversion
// ============================================================================

#[test]
fn heavy_bmp_converts_to_jpeg_and_renames() {
    let input = encode_bmp(&gradient_rgb(500, 500));
    assert!(input.len() as u64 > Constraints::default().flatten_threshold);

    let result = normalize("scan.bmp", &input, &Constraints::default(), None).unwrap();

    assert_eq!(result.kind, ImageKind::Jpeg);
    assert_eq!(result.file_name, "scan.jpg");
    assert_eq!(ImageKind::sniff(&result.bytes), Some(ImageKind::Jpeg));
    assert!(result.byte_len() <= Constraints::default().max_bytes);
}

// ============================================================================
// Scenario: small inputs are idempotent
// ============================================================================

#[test]
fn small_jpeg_passes_through_unchanged() {
    let input = encode_jpeg(&gradient_rgb(320, 240), 80);

    let result = normalize("thumb.jpg", &input, &Constraints::default(), None).unwrap();

    assert_eq!(result.bytes, input);
    assert_eq!(result.iterations, 0);
    assert!(result.byte_len() <= input.len() as u64);
}

#[test]
fn tiny_gif_passes_through_unchanged() {
    let img = RgbaImage::from_pixel(10, 10, Rgba([200, 100, 50, 255]));
    let mut input = Vec::new();
    image::codecs::gif::GifEncoder::new(&mut input)
        .encode(img.as_raw(), 10, 10, image::ExtendedColorType::Rgba8)
        .unwrap();

    let result = normalize("dot.gif", &input, &Constraints::default(), None).unwrap();

    assert_eq!(result.kind, ImageKind::Gif);
    assert_eq!(result.bytes, input);
    assert_eq!(result.file_name, "dot.gif");
}

// ============================================================================
// Scenario: rejected inputs
// ============================================================================

#[test]
fn corrupt_image_rejects_with_decode_error() {
    // Valid PNG magic followed by junk: sniffable, not decodable.
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    bytes.extend((0..2048u32).map(|i| hash(i, 7) as u8));

    let err = normalize("broken.png", &bytes, &Constraints::default(), None).unwrap_err();
    assert!(matches!(err, PipelineError::Decode(_)));
}

#[test]
fn non_image_bytes_reject_with_invalid_input() {
    let err = normalize(
        "readme.md",
        b"# definitely markdown",
        &Constraints::default(),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(_)));
}

#[test]
fn over_ceiling_input_rejects_before_decoding() {
    let mut constraints = Constraints::default();
    constraints.max_upload_bytes = 1024;
    let input = encode_png(&noise_rgba(64, 64));
    assert!(input.len() > 1024);

    let err = normalize("big.png", &input, &constraints, None).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(_)));
}

// ============================================================================
// Scenario: ceiling reached
// ============================================================================

#[test]
fn impossible_budget_fails_with_budget_exceeded() {
    let input = encode_png(&noise_rgba(64, 64));
    let mut constraints = Constraints::default();
    constraints.max_bytes = 10;
    constraints.max_iterations = 3;

    let err = normalize("noise.png", &input, &constraints, None).unwrap_err();

    match err {
        PipelineError::BudgetExceeded {
            iterations,
            achieved,
            budget,
        } => {
            assert_eq!(iterations, 3);
            assert_eq!(budget, 10);
            assert!(achieved > 10);
        }
        other => panic!("expected BudgetExceeded, got {other:?}"),
    }
}
