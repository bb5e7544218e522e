//! Per-entry image transformation: decode, resize to the two target
//! boxes, watermark, and re-encode as JPEG.
//!
//! The original bytes are never modified; both renditions derive from a
//! fresh decode. Any decode or encode failure is entry-scoped.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};

use crate::config::{PipelineConfig, WatermarkConfig};
use crate::error::EntryFailure;
use crate::watermark;

/// Output of one transformation: two encoded renditions plus the
/// original pixel dimensions.
#[derive(Debug, Clone)]
pub struct TransformedImage {
    pub display_bytes: Vec<u8>,
    pub thumbnail_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Run the full transform for one validated entry.
pub fn process_image(
    bytes: &[u8],
    config: &PipelineConfig,
) -> Result<TransformedImage, EntryFailure> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| EntryFailure::Decode(e.to_string()))?;
    let (width, height) = decoded.dimensions();

    let display = derive_rendition(&decoded, config.display_max_dim, &config.watermark);
    let thumbnail = derive_rendition(&decoded, config.thumbnail_max_dim, &config.watermark);

    Ok(TransformedImage {
        display_bytes: encode_jpeg(display, config.display_quality)?,
        thumbnail_bytes: encode_jpeg(thumbnail, config.thumbnail_quality)?,
        width,
        height,
    })
}

/// Resize-to-fit, flatten to RGB, and watermark one rendition.
fn derive_rendition(
    original: &DynamicImage,
    max_dim: u32,
    watermark_config: &WatermarkConfig,
) -> RgbImage {
    let mut rendition = resize_to_fit(original, max_dim).to_rgb8();
    watermark::apply_tiled(&mut rendition, watermark_config);
    rendition
}

/// Bound `img` by a `max_dim` square, preserving aspect ratio. Images
/// already inside the box pass through untouched.
pub fn resize_to_fit(img: &DynamicImage, max_dim: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width <= max_dim && height <= max_dim {
        img.clone()
    } else {
        img.resize(max_dim, max_dim, FilterType::Lanczos3)
    }
}

fn encode_jpeg(rendition: RgbImage, quality: u8) -> Result<Vec<u8>, EntryFailure> {
    let mut buf = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    DynamicImage::ImageRgb8(rendition)
        .write_with_encoder(encoder)
        .map_err(|e| EntryFailure::Encode(e.to_string()))?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encode a synthetic gradient JPEG fully in memory.
    fn synthetic_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_with_encoder(image::codecs::jpeg::JpegEncoder::new(&mut buf))
            .unwrap();
        buf.into_inner()
    }

    fn small_config() -> PipelineConfig {
        PipelineConfig {
            display_max_dim: 100,
            thumbnail_max_dim: 40,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_captures_original_dimensions() {
        let bytes = synthetic_jpeg(300, 200);
        let out = process_image(&bytes, &small_config()).unwrap();
        assert_eq!((out.width, out.height), (300, 200));
    }

    #[test]
    fn test_renditions_fit_their_boxes() {
        let bytes = synthetic_jpeg(300, 200);
        let out = process_image(&bytes, &small_config()).unwrap();

        let display = image::load_from_memory(&out.display_bytes).unwrap();
        assert!(display.width() <= 100 && display.height() <= 100);
        // Aspect ratio preserved: 300x200 -> 100x66.
        assert_eq!(display.width(), 100);

        let thumb = image::load_from_memory(&out.thumbnail_bytes).unwrap();
        assert!(thumb.width() <= 40 && thumb.height() <= 40);
    }

    #[test]
    fn test_small_image_not_upscaled() {
        let bytes = synthetic_jpeg(50, 30);
        let out = process_image(&bytes, &small_config()).unwrap();

        let display = image::load_from_memory(&out.display_bytes).unwrap();
        assert_eq!((display.width(), display.height()), (50, 30));
    }

    #[test]
    fn test_png_input_decodes() {
        let img = RgbImage::from_pixel(60, 60, image::Rgb([10, 20, 30]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_with_encoder(image::codecs::png::PngEncoder::new(&mut buf))
            .unwrap();

        let out = process_image(&buf.into_inner(), &small_config()).unwrap();
        assert_eq!((out.width, out.height), (60, 60));
        assert!(!out.display_bytes.is_empty());
    }

    #[test]
    fn test_garbage_bytes_fail_decode() {
        let err = process_image(b"not an image at all", &small_config()).unwrap_err();
        assert!(matches!(err, EntryFailure::Decode(_)));
    }

    #[test]
    fn test_renditions_are_watermarked() {
        let bytes = synthetic_jpeg(80, 80);
        let config = PipelineConfig {
            watermark: WatermarkConfig {
                opacity: 0.8,
                spacing: 10,
                ..WatermarkConfig::default()
            },
            ..small_config()
        };
        let plain_config = PipelineConfig {
            watermark: WatermarkConfig {
                opacity: 0.0,
                ..config.watermark.clone()
            },
            ..config.clone()
        };

        let marked = process_image(&bytes, &config).unwrap();
        let plain = process_image(&bytes, &plain_config).unwrap();
        assert_ne!(marked.display_bytes, plain.display_bytes);
    }

    #[test]
    fn test_display_encoded_larger_than_thumbnail() {
        let bytes = synthetic_jpeg(500, 500);
        let out = process_image(&bytes, &small_config()).unwrap();
        assert!(out.display_bytes.len() > out.thumbnail_bytes.len());
    }
}
