//! CSS-style filter chains: `grayscale(100%) contrast(1.2) blur(2px)`

use super::ImageError;
use image::{DynamicImage, Rgba};
use lazy_static::lazy_static;
use regex::Regex;

/// Filter chain used by the sharpen tool
pub const SHARPEN_CHAIN: &str = "contrast(1.2) brightness(1.1)";

lazy_static! {
    static ref FILTER_CALL: Regex = Regex::new(r"([a-z-]+)\(\s*([^)]*?)\s*\)").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterStep {
    /// 0 leaves the image unchanged, 1 is fully grey
    Grayscale(f32),
    Sepia(f32),
    Invert(f32),
    /// Gaussian sigma in pixels
    Blur(f32),
    /// 1 leaves the image unchanged
    Contrast(f32),
    Brightness(f32),
    /// 0 is fully grey, 1 leaves the image unchanged, above 1 oversaturates
    Saturate(f32),
    /// Degrees around the colour wheel
    HueRotate(f32),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain(pub Vec<FilterStep>);

impl FilterChain {
    /// Parse a chain of filter calls. `none` or an empty string is the
    /// identity chain.
    pub fn parse(input: &str) -> Result<Self, ImageError> {
        let input = input.trim();
        if input.is_empty() || input == "none" {
            return Ok(Self::default());
        }

        let mut steps = Vec::new();
        let mut consumed = 0;
        for caps in FILTER_CALL.captures_iter(input) {
            let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
            if !input[consumed..whole.start].trim().is_empty() {
                return Err(ImageError::InvalidFilter(input.to_string()));
            }
            consumed = whole.end;
            steps.push(parse_step(&caps[1], &caps[2])?);
        }

        if steps.is_empty() || !input[consumed..].trim().is_empty() {
            return Err(ImageError::InvalidFilter(input.to_string()));
        }
        Ok(Self(steps))
    }

    pub fn apply(&self, image: DynamicImage) -> DynamicImage {
        self.0.iter().fold(image, |image, step| step.apply(image))
    }
}

fn parse_step(name: &str, arg: &str) -> Result<FilterStep, ImageError> {
    let invalid = || ImageError::InvalidFilter(format!("{}({})", name, arg));

    if name == "hue-rotate" {
        return parse_angle(arg).map(FilterStep::HueRotate).ok_or_else(invalid);
    }

    let amount = if arg.is_empty() {
        None
    } else if let Some(percent) = arg.strip_suffix('%') {
        Some(percent.trim().parse::<f32>().map_err(|_| invalid())? / 100.0)
    } else {
        Some(
            arg.trim_end_matches("px")
                .trim()
                .parse::<f32>()
                .map_err(|_| invalid())?,
        )
    };
    if amount.is_some_and(|a| a < 0.0) {
        return Err(invalid());
    }

    let step = match name {
        "grayscale" => FilterStep::Grayscale(amount.unwrap_or(1.0).min(1.0)),
        "sepia" => FilterStep::Sepia(amount.unwrap_or(1.0).min(1.0)),
        "invert" => FilterStep::Invert(amount.unwrap_or(1.0).min(1.0)),
        "blur" => FilterStep::Blur(amount.unwrap_or(0.0)),
        "contrast" => FilterStep::Contrast(amount.unwrap_or(1.0)),
        "brightness" => FilterStep::Brightness(amount.unwrap_or(1.0)),
        "saturate" => FilterStep::Saturate(amount.unwrap_or(1.0)),
        _ => return Err(invalid()),
    };
    Ok(step)
}

/// An angle in degrees from `90deg`, `0.25turn`, `1.5rad` or a bare number
fn parse_angle(arg: &str) -> Option<f32> {
    if arg.is_empty() {
        return Some(0.0);
    }
    let (number, scale) = if let Some(n) = arg.strip_suffix("deg") {
        (n, 1.0)
    } else if let Some(n) = arg.strip_suffix("turn") {
        (n, 360.0)
    } else if let Some(n) = arg.strip_suffix("rad") {
        (n, 180.0 / std::f32::consts::PI)
    } else {
        (arg, 1.0)
    };
    number
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|n| n.is_finite())
        .map(|n| n * scale)
}

impl FilterStep {
    fn apply(&self, image: DynamicImage) -> DynamicImage {
        match *self {
            FilterStep::Blur(sigma) if sigma > 0.0 => image.blur(sigma),
            FilterStep::Blur(_) => image,
            FilterStep::Grayscale(a) => map_rgb(image, |[r, g, b]| {
                let y = 0.2126 * r + 0.7152 * g + 0.0722 * b;
                [lerp(r, y, a), lerp(g, y, a), lerp(b, y, a)]
            }),
            FilterStep::Sepia(a) => map_rgb(image, |[r, g, b]| {
                let sr = 0.393 * r + 0.769 * g + 0.189 * b;
                let sg = 0.349 * r + 0.686 * g + 0.168 * b;
                let sb = 0.272 * r + 0.534 * g + 0.131 * b;
                [lerp(r, sr, a), lerp(g, sg, a), lerp(b, sb, a)]
            }),
            FilterStep::Invert(a) => {
                map_rgb(image, |[r, g, b]| {
                    [lerp(r, 255.0 - r, a), lerp(g, 255.0 - g, a), lerp(b, 255.0 - b, a)]
                })
            }
            FilterStep::Contrast(k) => map_rgb(image, |rgb| rgb.map(|c| (c - 127.5) * k + 127.5)),
            FilterStep::Brightness(k) => map_rgb(image, |rgb| rgb.map(|c| c * k)),
            FilterStep::Saturate(k) => map_rgb(image, |[r, g, b]| {
                // Rec. 709 luma weights, as used by the CSS saturate() matrix
                let y = 0.213 * r + 0.715 * g + 0.072 * b;
                [y + (r - y) * k, y + (g - y) * k, y + (b - y) * k]
            }),
            FilterStep::HueRotate(degrees) => image.huerotate((degrees.round() as i64 % 360) as i32),
        }
    }
}

fn lerp(from: f32, to: f32, amount: f32) -> f32 {
    from + (to - from) * amount
}

fn map_rgb(image: DynamicImage, f: impl Fn([f32; 3]) -> [f32; 3]) -> DynamicImage {
    let mut pixels = image.into_rgba8();
    for pixel in pixels.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        let [r, g, b] = f([r as f32, g as f32, b as f32]);
        *pixel = Rgba([channel(r), channel(g), channel(b), a]);
    }
    DynamicImage::ImageRgba8(pixels)
}

fn channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use pretty_assertions::assert_eq;

    fn pixel_after(chain: &str, color: [u8; 4]) -> Rgba<u8> {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba(color)));
        *FilterChain::parse(chain)
            .unwrap()
            .apply(image)
            .to_rgba8()
            .get_pixel(0, 0)
    }

    #[test]
    fn test_parse_chain() {
        let chain = FilterChain::parse("grayscale(100%) blur(5px) contrast(1.2)").unwrap();
        assert_eq!(
            chain.0,
            vec![
                FilterStep::Grayscale(1.0),
                FilterStep::Blur(5.0),
                FilterStep::Contrast(1.2)
            ]
        );
    }

    #[test]
    fn test_parse_rejects_unknown_and_garbage() {
        assert!(FilterChain::parse("hue-rotate(ninety)").is_err());
        assert!(FilterChain::parse("saturate(-1)").is_err());
        assert!(FilterChain::parse("grayscale(abc)").is_err());
        assert!(FilterChain::parse("grayscale(1) junk").is_err());
        assert!(FilterChain::parse("junk").is_err());
    }

    #[test]
    fn test_none_is_identity() {
        assert_eq!(pixel_after("none", [10, 20, 30, 255]), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_grayscale_equalises_channels() {
        let Rgba([r, g, b, a]) = pixel_after("grayscale(100%)", [255, 0, 0, 200]);
        assert_eq!((r, g, b, a), (54, 54, 54, 200));
    }

    #[test]
    fn test_invert() {
        assert_eq!(pixel_after("invert(1)", [0, 100, 255, 255]), Rgba([255, 155, 0, 255]));
    }

    #[test]
    fn test_brightness_scales_and_clamps() {
        assert_eq!(
            pixel_after("brightness(2)", [100, 200, 0, 255]),
            Rgba([200, 255, 0, 255])
        );
    }

    #[test]
    fn test_parse_saturate_and_hue_rotate() {
        let chain = FilterChain::parse("saturate(150%) hue-rotate(90deg) hue-rotate(-0.5turn)").unwrap();
        assert_eq!(
            chain.0,
            vec![
                FilterStep::Saturate(1.5),
                FilterStep::HueRotate(90.0),
                FilterStep::HueRotate(-180.0)
            ]
        );
    }

    #[test]
    fn test_saturate_zero_is_grey_and_one_is_identity() {
        let Rgba([r, g, b, a]) = pixel_after("saturate(0)", [255, 0, 0, 255]);
        assert_eq!((r, g, b, a), (54, 54, 54, 255));
        assert_eq!(pixel_after("saturate(1)", [200, 40, 90, 255]), Rgba([200, 40, 90, 255]));
    }

    #[test]
    fn test_saturate_above_one_pushes_channels_apart() {
        let Rgba([r, g, _, _]) = pixel_after("saturate(2)", [150, 100, 100, 255]);
        assert!(r > 150);
        assert!(g < 100);
    }

    #[test]
    fn test_hue_rotate_moves_red_towards_green() {
        let Rgba([r, g, b, a]) = pixel_after("hue-rotate(120deg)", [255, 0, 0, 255]);
        assert!(g > r && g > b, "got {:?}", (r, g, b));
        assert_eq!(a, 255);
    }

    #[test]
    fn test_sharpen_chain_parses() {
        let chain = FilterChain::parse(SHARPEN_CHAIN).unwrap();
        assert_eq!(
            chain.0,
            vec![FilterStep::Contrast(1.2), FilterStep::Brightness(1.1)]
        );
    }
}
