//! Tiled diagonal watermarking.
//!
//! A rectangular stamp (sized from the configured text) is repeated on a
//! rotated grid across the whole raster and alpha-blended into the
//! covered pixels. Only derived renditions are watermarked; original
//! bytes never pass through here.

use image::RgbImage;

use crate::config::WatermarkConfig;

/// Horizontal pixels budgeted per character of watermark text.
const GLYPH_ADVANCE_PX: u32 = 7;

/// Stamp height in pixels.
const STAMP_HEIGHT_PX: u32 = 12;

/// Blend color of the stamp.
const OVERLAY: [u8; 3] = [255, 255, 255];

/// Apply the repeating watermark pattern to `img` in place.
///
/// A no-op when the text is empty or the opacity is zero.
pub fn apply_tiled(img: &mut RgbImage, config: &WatermarkConfig) {
    let text_len = config.text.chars().count() as u32;
    let opacity = config.opacity.clamp(0.0, 1.0);
    if text_len == 0 || opacity <= 0.0 {
        return;
    }

    let stamp_w = text_len * GLYPH_ADVANCE_PX;
    let stamp_h = STAMP_HEIGHT_PX;
    let spacing = config.spacing.max(1) as f32;
    let (width, height) = img.dimensions();

    let (sin, cos) = config.angle_degrees.to_radians().sin_cos();
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;

    // Walk a square grid large enough that its rotation still covers the
    // full raster.
    let diagonal = ((width * width + height * height) as f32).sqrt();
    let steps = (diagonal / spacing).ceil() as i32 + 1;

    for i in -steps..=steps {
        for j in -steps..=steps {
            let grid_x = i as f32 * spacing;
            let grid_y = j as f32 * spacing;
            let stamp_cx = center_x + grid_x * cos - grid_y * sin;
            let stamp_cy = center_y + grid_x * sin + grid_y * cos;
            blend_block(img, stamp_cx, stamp_cy, stamp_w, stamp_h, opacity);
        }
    }
}

/// Alpha-blend one stamp rectangle centred at (`cx`, `cy`), clipped to
/// the image bounds.
fn blend_block(img: &mut RgbImage, cx: f32, cy: f32, stamp_w: u32, stamp_h: u32, opacity: f32) {
    let (width, height) = img.dimensions();
    let left = (cx - stamp_w as f32 / 2.0).floor() as i64;
    let top = (cy - stamp_h as f32 / 2.0).floor() as i64;

    for y in top..top + stamp_h as i64 {
        if y < 0 || y >= height as i64 {
            continue;
        }
        for x in left..left + stamp_w as i64 {
            if x < 0 || x >= width as i64 {
                continue;
            }
            let pixel = img.get_pixel_mut(x as u32, y as u32);
            for (channel, overlay) in pixel.0.iter_mut().zip(OVERLAY) {
                let blended =
                    *channel as f32 * (1.0 - opacity) + overlay as f32 * opacity;
                *channel = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black_canvas(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, image::Rgb([0, 0, 0]))
    }

    fn changed_pixels(before: &RgbImage, after: &RgbImage) -> usize {
        before
            .pixels()
            .zip(after.pixels())
            .filter(|(a, b)| a != b)
            .count()
    }

    fn test_config() -> WatermarkConfig {
        WatermarkConfig {
            text: "gala".to_string(),
            opacity: 0.2,
            angle_degrees: 45.0,
            spacing: 20,
        }
    }

    #[test]
    fn test_stamps_change_pixels() {
        let before = black_canvas(64, 64);
        let mut after = before.clone();
        apply_tiled(&mut after, &test_config());
        assert!(changed_pixels(&before, &after) > 0);
    }

    #[test]
    fn test_not_every_pixel_is_stamped() {
        let before = black_canvas(128, 128);
        let mut after = before.clone();
        apply_tiled(&mut after, &test_config());

        let changed = changed_pixels(&before, &after);
        assert!(changed < (128 * 128), "stamps should leave gaps");
    }

    #[test]
    fn test_zero_opacity_is_noop() {
        let before = black_canvas(64, 64);
        let mut after = before.clone();
        let config = WatermarkConfig {
            opacity: 0.0,
            ..test_config()
        };
        apply_tiled(&mut after, &config);
        assert_eq!(changed_pixels(&before, &after), 0);
    }

    #[test]
    fn test_empty_text_is_noop() {
        let before = black_canvas(64, 64);
        let mut after = before.clone();
        let config = WatermarkConfig {
            text: String::new(),
            ..test_config()
        };
        apply_tiled(&mut after, &config);
        assert_eq!(changed_pixels(&before, &after), 0);
    }

    #[test]
    fn test_pattern_is_deterministic() {
        let mut first = black_canvas(64, 64);
        let mut second = black_canvas(64, 64);
        apply_tiled(&mut first, &test_config());
        apply_tiled(&mut second, &test_config());
        assert_eq!(first, second);
    }

    #[test]
    fn test_blend_respects_opacity() {
        let before = black_canvas(64, 64);
        let mut after = before.clone();
        apply_tiled(&mut after, &test_config());

        // 0.2 opacity over black blends to 51; overlapping stamps may go
        // higher but never past the overlay value.
        let max_channel = after.pixels().flat_map(|p| p.0).max().unwrap();
        assert!(max_channel > 0);
        assert!(max_channel <= 255);
        let min_changed = after
            .pixels()
            .flat_map(|p| p.0)
            .filter(|&c| c > 0)
            .min()
            .unwrap();
        assert_eq!(min_changed, 51);
    }

    #[test]
    fn test_tiling_covers_distant_regions() {
        // Dense spacing on a larger canvas: stamps must land far from the
        // centre as well.
        let before = black_canvas(200, 200);
        let mut after = before.clone();
        apply_tiled(&mut after, &test_config());

        let quadrant_changed = |x0: u32, y0: u32| {
            (y0..y0 + 100)
                .flat_map(|y| (x0..x0 + 100).map(move |x| (x, y)))
                .any(|(x, y)| after.get_pixel(x, y) != before.get_pixel(x, y))
        };
        assert!(quadrant_changed(0, 0));
        assert!(quadrant_changed(100, 0));
        assert!(quadrant_changed(0, 100));
        assert!(quadrant_changed(100, 100));
    }
}
