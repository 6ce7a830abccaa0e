//! Image normalization for the sink.
//!
//! Palette/alpha images are flattened to opaque RGB; anything outside the
//! accepted dimension range is resized to a fixed fallback resolution
//! (a lossy compromise — aspect ratio is not preserved). Output is always
//! baseline JPEG.

use image::{DynamicImage, ImageFormat};

use crate::error::ImageError;

pub const MIN_DIMENSION: u32 = 320;
pub const MAX_DIMENSION: u32 = 10_000;
pub const FALLBACK_WIDTH: u32 = 1280;
pub const FALLBACK_HEIGHT: u32 = 720;

/// Decode, normalize, and re-encode an image.
///
/// Corrupt or non-image input yields `ImageError`; the caller drops the
/// attachment and keeps the rest of the post.
pub fn normalize_image(bytes: &[u8]) -> Result<Vec<u8>, ImageError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| ImageError::Decode(e.to_string()))?;

    // Flatten palette and alpha modes to opaque RGB.
    let mut img = DynamicImage::ImageRgb8(decoded.to_rgb8());

    let (w, h) = (img.width(), img.height());
    if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&w) || !(MIN_DIMENSION..=MAX_DIMENSION).contains(&h)
    {
        img = img.resize_exact(
            FALLBACK_WIDTH,
            FALLBACK_HEIGHT,
            image::imageops::FilterType::Triangle,
        );
    }

    let mut out = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut out), ImageFormat::Jpeg)
        .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn encode(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([120, 80, 40]),
        ));
        let mut out = Vec::new();
        // BMP keeps test input generation cheap for large dimensions.
        img.write_to(&mut std::io::Cursor::new(&mut out), ImageFormat::Bmp)
            .unwrap();
        out
    }

    fn dimensions(bytes: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory(bytes).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn tiny_image_resized_to_fallback() {
        let out = normalize_image(&encode(50, 50)).unwrap();
        assert_eq!(dimensions(&out), (FALLBACK_WIDTH, FALLBACK_HEIGHT));
    }

    #[test]
    fn oversized_image_resized_to_fallback() {
        let out = normalize_image(&encode(10_500, 400)).unwrap();
        assert_eq!(dimensions(&out), (FALLBACK_WIDTH, FALLBACK_HEIGHT));
    }

    #[test]
    fn in_bounds_image_passes_through_unresized() {
        let out = normalize_image(&encode(5000, 3000)).unwrap();
        assert_eq!(dimensions(&out), (5000, 3000));
        // Re-encoded as JPEG regardless.
        assert_eq!(out[..2], [0xFF, 0xD8]);
    }

    #[test]
    fn output_is_always_within_bounds() {
        for (w, h) in [(50u32, 50u32), (320, 320), (319, 400), (400, 2000)] {
            let out = normalize_image(&encode(w, h)).unwrap();
            let (ow, oh) = dimensions(&out);
            assert!((MIN_DIMENSION..=MAX_DIMENSION).contains(&ow));
            assert!((MIN_DIMENSION..=MAX_DIMENSION).contains(&oh));
        }
    }

    #[test]
    fn alpha_input_flattens_to_rgb_jpeg() {
        let rgba = image::RgbaImage::from_pixel(400, 400, image::Rgba([10, 20, 30, 128]));
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(rgba)
            .write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let out = normalize_image(&png).unwrap();
        assert_eq!(out[..2], [0xFF, 0xD8]);
        assert_eq!(dimensions(&out), (400, 400));
    }

    #[test]
    fn garbage_input_is_a_decode_error() {
        let result = normalize_image(b"definitely not an image");
        assert!(matches!(result, Err(ImageError::Decode(_))));
    }
}
