//! Raster image operations
//!
//! Every operation decodes the input bytes, transforms the pixels and
//! re-encodes in the input's format unless the operation says otherwise.

mod filters;
mod watermark;
mod worker;

pub use filters::{FilterChain, FilterStep, SHARPEN_CHAIN};
pub use watermark::{draw_watermark, WATERMARK_ALPHA, WATERMARK_BASELINE_OFFSET, WATERMARK_SIZE};
pub use worker::{ImageWorker, WorkerTask};

use crate::file::Blob;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

/// Longest side after compression
pub const MAX_COMPRESS_SIDE: u32 = 1920;

/// Quality used when converting to a lossy format
pub const CONVERT_QUALITY: f32 = 0.9;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImageError {
    #[error("Failed to load image")]
    Decode,

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Rotation must be a multiple of 90 degrees, got {0}")]
    InvalidRotation(i64),

    #[error("Invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Crop origin ({x}, {y}) is outside the {width}x{height} image")]
    CropOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Watermark text is empty")]
    EmptyWatermark,

    #[error("No font available to draw text")]
    FontUnavailable,

    #[error("Image worker is not running")]
    WorkerStopped,
}

/// A decoded image and the format it was stored in
pub struct Decoded {
    pub image: DynamicImage,
    pub format: ImageFormat,
}

pub fn decode(bytes: &[u8]) -> Result<Decoded, ImageError> {
    let format = image::guess_format(bytes).map_err(|_| ImageError::Decode)?;
    let image =
        image::load_from_memory_with_format(bytes, format).map_err(|_| ImageError::Decode)?;
    Ok(Decoded { image, format })
}

/// Encode `image` as `format`. `quality` in `(0, 1]` applies to JPEG;
/// PNG always uses the best compression level.
pub fn encode(image: &DynamicImage, format: ImageFormat, quality: f32) -> Result<Vec<u8>, ImageError> {
    let mut buffer = Vec::new();
    let result = match format {
        ImageFormat::Jpeg => {
            let quality = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
            DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)
        }
        ImageFormat::Png => {
            let encoder = PngEncoder::new_with_quality(
                &mut buffer,
                CompressionType::Best,
                PngFilter::Adaptive,
            );
            image.write_with_encoder(encoder)
        }
        other => DynamicImage::ImageRgba8(image.to_rgba8()).write_to(&mut Cursor::new(&mut buffer), other),
    };
    result.map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(buffer)
}

fn to_blob(image: &DynamicImage, format: ImageFormat, quality: f32) -> Result<Blob, ImageError> {
    Ok(Blob::new(encode(image, format, quality)?, format.to_mime_type()))
}

/// Parse an output format name such as `png`, `jpg` or `image/webp`
pub fn parse_format(name: &str) -> Result<ImageFormat, ImageError> {
    let lower = name.trim().to_ascii_lowercase();
    let short = lower.strip_prefix("image/").unwrap_or(&lower);
    match short {
        "png" => Ok(ImageFormat::Png),
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        "webp" => Ok(ImageFormat::WebP),
        "gif" => Ok(ImageFormat::Gif),
        "bmp" => Ok(ImageFormat::Bmp),
        "tif" | "tiff" => Ok(ImageFormat::Tiff),
        _ => Err(ImageError::UnsupportedFormat(name.to_string())),
    }
}

/// Downscale to fit [`MAX_COMPRESS_SIDE`] and re-encode at `quality`.
///
/// The output is never larger than the input: when re-encoding does not
/// help, the input bytes are returned unchanged.
pub fn compress_image(bytes: &[u8], quality: f32) -> Result<Blob, ImageError> {
    let Decoded { mut image, format } = decode(bytes)?;

    if image.width().max(image.height()) > MAX_COMPRESS_SIDE {
        image = image.resize(MAX_COMPRESS_SIDE, MAX_COMPRESS_SIDE, FilterType::Lanczos3);
    }

    let encoded = encode(&image, format, quality)?;
    if encoded.len() >= bytes.len() {
        debug!(
            input = bytes.len(),
            output = encoded.len(),
            "Re-encoded image is not smaller, keeping input"
        );
        return Ok(Blob::new(bytes.to_vec(), format.to_mime_type()));
    }
    Ok(Blob::new(encoded, format.to_mime_type()))
}

/// Resize to exactly `width` x `height`
pub fn resize_image(bytes: &[u8], width: u32, height: u32) -> Result<Blob, ImageError> {
    if width == 0 || height == 0 {
        return Err(ImageError::InvalidDimensions { width, height });
    }
    let Decoded { image, format } = decode(bytes)?;
    let resized = image.resize_exact(width, height, FilterType::Lanczos3);
    to_blob(&resized, format, CONVERT_QUALITY)
}

/// Re-encode in another format
pub fn convert_format(bytes: &[u8], target: &str) -> Result<Blob, ImageError> {
    let format = parse_format(target)?;
    let Decoded { image, .. } = decode(bytes)?;
    to_blob(&image, format, CONVERT_QUALITY)
}

/// Rotate clockwise by a right angle; negative angles rotate counter-clockwise
pub fn rotate_image(bytes: &[u8], degrees: i64) -> Result<Blob, ImageError> {
    if degrees % 90 != 0 {
        return Err(ImageError::InvalidRotation(degrees));
    }
    let Decoded { image, format } = decode(bytes)?;
    let rotated = match degrees.rem_euclid(360) {
        90 => image.rotate90(),
        180 => image.rotate180(),
        270 => image.rotate270(),
        _ => image,
    };
    to_blob(&rotated, format, CONVERT_QUALITY)
}

/// Mirror horizontally or vertically
pub fn flip_image(bytes: &[u8], horizontal: bool) -> Result<Blob, ImageError> {
    let Decoded { image, format } = decode(bytes)?;
    let flipped = if horizontal {
        image.fliph()
    } else {
        image.flipv()
    };
    to_blob(&flipped, format, CONVERT_QUALITY)
}

/// Copy a `width` x `height` rectangle at `(x, y)`.
///
/// The output always has the requested size; parts of the rectangle beyond
/// the source are transparent.
pub fn crop_image(bytes: &[u8], x: u32, y: u32, width: u32, height: u32) -> Result<Blob, ImageError> {
    if width == 0 || height == 0 {
        return Err(ImageError::InvalidDimensions { width, height });
    }
    let Decoded { image, format } = decode(bytes)?;
    let (src_width, src_height) = image.dimensions();
    if x >= src_width || y >= src_height {
        return Err(ImageError::CropOutOfBounds {
            x,
            y,
            width: src_width,
            height: src_height,
        });
    }

    let visible = image
        .crop_imm(
            x,
            y,
            width.min(src_width - x),
            height.min(src_height - y),
        )
        .to_rgba8();
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    imageops::replace(&mut canvas, &visible, 0, 0);

    to_blob(&DynamicImage::ImageRgba8(canvas), format, CONVERT_QUALITY)
}

/// Add `delta` to the R, G and B channels, clamped to `0..=255`
pub fn adjust_brightness(bytes: &[u8], delta: i32) -> Result<Blob, ImageError> {
    let Decoded { image, format } = decode(bytes)?;
    let mut pixels = image.to_rgba8();
    for pixel in pixels.pixels_mut() {
        for channel in pixel.0.iter_mut().take(3) {
            *channel = (*channel as i32 + delta).clamp(0, 255) as u8;
        }
    }
    to_blob(&DynamicImage::ImageRgba8(pixels), format, CONVERT_QUALITY)
}

/// Apply a CSS-style filter chain such as `grayscale(100%) blur(2px)`
pub fn apply_filters(bytes: &[u8], chain: &str) -> Result<Blob, ImageError> {
    let chain = FilterChain::parse(chain)?;
    let Decoded { image, format } = decode(bytes)?;
    to_blob(&chain.apply(image), format, CONVERT_QUALITY)
}

pub fn blur_image(bytes: &[u8], amount: f32) -> Result<Blob, ImageError> {
    if amount < 0.0 {
        return Err(ImageError::InvalidFilter(format!("blur({}px)", amount)));
    }
    apply_filters(bytes, &format!("blur({}px)", amount))
}

pub fn sharpen_image(bytes: &[u8]) -> Result<Blob, ImageError> {
    apply_filters(bytes, SHARPEN_CHAIN)
}

/// Stamp `text` in translucent white near the bottom, keeping the format
pub fn add_watermark(bytes: &[u8], text: &str) -> Result<Blob, ImageError> {
    let Decoded { image, format } = decode(bytes)?;
    to_blob(&draw_watermark(image, text)?, format, CONVERT_QUALITY)
}


#[cfg(test)]
mod tests {
    use super::test_support::{noisy_image, solid_image};
    use super::*;

    fn dimensions(blob: &Blob) -> (u32, u32) {
        decode(&blob.data).unwrap().image.dimensions()
    }

    #[test]
    fn test_decode_failure_message() {
        let err = resize_image(b"not an image", 10, 10).unwrap_err();
        assert_eq!(err.to_string(), "Failed to load image");
    }

    #[test]
    fn test_resize_is_exact() {
        let png = solid_image(40, 20, [255, 0, 0, 255], ImageFormat::Png);
        let blob = resize_image(&png, 100, 100).unwrap();
        assert_eq!(dimensions(&blob), (100, 100));
        assert_eq!(blob.mime, "image/png");
    }

    #[test]
    fn test_resize_rejects_zero() {
        let png = solid_image(4, 4, [0, 0, 0, 255], ImageFormat::Png);
        assert!(matches!(
            resize_image(&png, 0, 10),
            Err(ImageError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_compress_never_grows() {
        let png = noisy_image(64, 64);
        let blob = compress_image(&png, 0.8).unwrap();
        assert!(blob.data.len() <= png.len());
    }

    #[test]
    fn test_compress_downscales_large_images() {
        let jpeg = solid_image(3000, 1500, [10, 200, 30, 255], ImageFormat::Jpeg);
        let blob = compress_image(&jpeg, 0.5).unwrap();
        let (w, h) = dimensions(&blob);
        if blob.data != jpeg {
            assert_eq!((w, h), (1920, 960));
        }
        assert_eq!(blob.mime, "image/jpeg");
    }

    #[test]
    fn test_convert_to_jpeg() {
        let png = solid_image(8, 8, [0, 0, 255, 255], ImageFormat::Png);
        let blob = convert_format(&png, "jpeg").unwrap();
        assert_eq!(blob.mime, "image/jpeg");
        assert_eq!(&blob.data[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_convert_rejects_unknown_format() {
        let png = solid_image(8, 8, [0, 0, 255, 255], ImageFormat::Png);
        assert!(matches!(
            convert_format(&png, "heic"),
            Err(ImageError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_rotate_swaps_dimensions() {
        let png = solid_image(30, 10, [1, 2, 3, 255], ImageFormat::Png);
        assert_eq!(dimensions(&rotate_image(&png, 90).unwrap()), (10, 30));
        assert_eq!(dimensions(&rotate_image(&png, -90).unwrap()), (10, 30));
        assert_eq!(dimensions(&rotate_image(&png, 180).unwrap()), (30, 10));
        assert!(matches!(
            rotate_image(&png, 45),
            Err(ImageError::InvalidRotation(45))
        ));
    }

    #[test]
    fn test_flip_horizontal_mirrors_pixels() {
        let mut image = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        let png = encode(&DynamicImage::ImageRgba8(image), ImageFormat::Png, 1.0).unwrap();

        let flipped = decode(&flip_image(&png, true).unwrap().data)
            .unwrap()
            .image
            .to_rgba8();
        assert_eq!(flipped.get_pixel(1, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(flipped.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_crop_pads_with_transparency() {
        let png = solid_image(10, 10, [200, 100, 50, 255], ImageFormat::Png);
        let blob = crop_image(&png, 5, 5, 10, 10).unwrap();
        let cropped = decode(&blob.data).unwrap().image.to_rgba8();

        assert_eq!(cropped.dimensions(), (10, 10));
        assert_eq!(cropped.get_pixel(0, 0), &Rgba([200, 100, 50, 255]));
        assert_eq!(cropped.get_pixel(9, 9).0[3], 0);
    }

    #[test]
    fn test_crop_origin_outside_fails() {
        let png = solid_image(10, 10, [0, 0, 0, 255], ImageFormat::Png);
        assert!(matches!(
            crop_image(&png, 10, 0, 5, 5),
            Err(ImageError::CropOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_brightness_clamps_and_keeps_alpha() {
        let png = solid_image(2, 2, [250, 10, 100, 128], ImageFormat::Png);
        let blob = adjust_brightness(&png, 20).unwrap();
        let pixel = *decode(&blob.data).unwrap().image.to_rgba8().get_pixel(0, 0);
        assert_eq!(pixel, Rgba([255, 30, 120, 128]));

        let blob = adjust_brightness(&png, -20).unwrap();
        let pixel = *decode(&blob.data).unwrap().image.to_rgba8().get_pixel(0, 0);
        assert_eq!(pixel, Rgba([230, 0, 80, 128]));
    }

    #[test]
    fn test_blur_and_sharpen_keep_dimensions() {
        let png = noisy_image(16, 12);
        assert_eq!(dimensions(&blur_image(&png, 5.0).unwrap()), (16, 12));
        assert_eq!(dimensions(&sharpen_image(&png).unwrap()), (16, 12));
    }

    #[test]
    fn test_watermark_keeps_format_and_size() {
        let jpeg = solid_image(200, 120, [20, 40, 60, 255], ImageFormat::Jpeg);
        let blob = add_watermark(&jpeg, "Proof").unwrap();
        assert_eq!(blob.mime, "image/jpeg");
        assert_eq!(dimensions(&blob), (200, 120));
    }

    #[test]
    fn test_watermark_lightens_only_the_text_band() {
        let png = solid_image(200, 120, [0, 0, 0, 255], ImageFormat::Png);
        let marked = decode(&add_watermark(&png, "PROOF").unwrap().data).unwrap().image.to_rgba8();
        assert_eq!(*marked.get_pixel(5, 5), Rgba([0, 0, 0, 255]));
        assert!(marked.pixels().any(|p| p[0] > 100));
    }

    #[test]
    fn test_parse_format_accepts_mime() {
        assert_eq!(parse_format("image/webp").unwrap(), ImageFormat::WebP);
        assert_eq!(parse_format("JPG").unwrap(), ImageFormat::Jpeg);
    }
}
