//! Text watermark drawn near the bottom edge of an image

use super::ImageError;
use ab_glyph::{Font, FontRef, PxScale, ScaleFont};
use image::{DynamicImage, GrayImage, Luma};
use imageproc::drawing::{draw_text_mut, text_size};
use std::sync::OnceLock;
use tracing::debug;

/// Glyph height in pixels
pub const WATERMARK_SIZE: f32 = 30.0;

/// Opacity of the white text
pub const WATERMARK_ALPHA: f32 = 0.5;

/// Distance from the bottom edge to the text baseline
pub const WATERMARK_BASELINE_OFFSET: f32 = 50.0;

static WATERMARK_FONT: OnceLock<Option<FontRef<'static>>> = OnceLock::new();

/// First embedded font that parses as an outline font
fn watermark_font() -> Option<&'static FontRef<'static>> {
    WATERMARK_FONT
        .get_or_init(|| {
            let font = typst_assets::fonts().find_map(|data| FontRef::try_from_slice(data).ok());
            debug!(found = font.is_some(), "Loaded watermark font");
            font
        })
        .as_ref()
}

/// Blend `text` in translucent white onto `image`, centred horizontally
/// with its baseline [`WATERMARK_BASELINE_OFFSET`] pixels above the bottom
pub fn draw_watermark(image: DynamicImage, text: &str) -> Result<DynamicImage, ImageError> {
    if text.trim().is_empty() {
        return Err(ImageError::EmptyWatermark);
    }
    let font = watermark_font().ok_or(ImageError::FontUnavailable)?;
    let scale = PxScale::from(WATERMARK_SIZE);

    let mut canvas = image.into_rgba8();
    let (width, height) = canvas.dimensions();
    let (text_width, _) = text_size(scale, font, text);
    let x = (width as i64 - text_width as i64) / 2;
    let top = height as f32 - WATERMARK_BASELINE_OFFSET - font.as_scaled(scale).ascent();

    // Glyph coverage goes into a mask first, so anti-aliased edges blend
    // towards white instead of darkening
    let mut coverage = GrayImage::new(width, height);
    draw_text_mut(&mut coverage, Luma([255]), x as i32, top.round() as i32, scale, font, text);

    for (pixel, Luma([cover])) in canvas.pixels_mut().zip(coverage.pixels()) {
        if *cover == 0 {
            continue;
        }
        let alpha = *cover as f32 / 255.0 * WATERMARK_ALPHA;
        for channel in pixel.0.iter_mut().take(3) {
            *channel = (*channel as f32 + (255.0 - *channel as f32) * alpha).round() as u8;
        }
    }
    Ok(DynamicImage::ImageRgba8(canvas))
}
