use image::{DynamicImage, GrayImage, Luma, RgbImage};
use imageproc::definitions::Image;
use crate::{
    error::{ColonyError, Result},
    params::{validate_bias, validate_block_size, validate_kernel_size},
    traits::ImagePreprocessor,
    types::{BACKGROUND, FOREGROUND},
};

/// Convert a decoded image to single-channel intensity.
///
/// Only 8-bit RGB input is accepted; anything else is a pipeline bug
/// upstream (the loader always produces RGB).
pub fn to_grayscale(image: &DynamicImage) -> Result<GrayImage> {
    match image {
        DynamicImage::ImageRgb8(rgb) => Ok(rgb_to_gray(rgb)),
        other => Err(ColonyError::ChannelMismatch { found: other.color() }),
    }
}

/// BT.601 luma, rounded to the nearest integer.
pub fn rgb_to_gray(image: &RgbImage) -> GrayImage {
    imageproc::map::map_colors(image, |pixel| {
        let [r, g, b] = pixel.0;
        let weighted = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
        Luma([((weighted + 500) / 1000) as u8])
    })
}

/// Normalised 1D Gaussian taps for an odd kernel size.
///
/// Small kernels use fixed binomial taps; larger ones derive sigma from the
/// size as `0.3 * ((size - 1) / 2 - 1) + 0.8`.
pub fn gaussian_kernel(size: u32) -> Result<Vec<f32>> {
    validate_kernel_size(size)?;

    let taps: Vec<f64> = match size {
        1 => vec![1.0],
        3 => vec![0.25, 0.5, 0.25],
        5 => vec![0.0625, 0.25, 0.375, 0.25, 0.0625],
        7 => vec![0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
        _ => {
            let sigma = 0.3 * ((f64::from(size) - 1.0) * 0.5 - 1.0) + 0.8;
            let center = f64::from(size / 2);
            let raw: Vec<f64> = (0..size)
                .map(|i| {
                    let d = f64::from(i) - center;
                    (-(d * d) / (2.0 * sigma * sigma)).exp()
                })
                .collect();
            let sum: f64 = raw.iter().sum();
            raw.into_iter().map(|w| w / sum).collect()
        }
    };

    Ok(taps.into_iter().map(|w| w as f32).collect())
}

/// Separable Gaussian smoothing with a `size`×`size` kernel.
///
/// Both passes run in f32 and the result is rounded once. Samples beyond the
/// image edge replicate the nearest edge pixel.
pub fn gaussian_blur(image: &GrayImage, size: u32) -> Result<GrayImage> {
    let taps = gaussian_kernel(size)?;
    if taps.len() == 1 {
        return Ok(image.clone());
    }

    let intensity: Image<Luma<f32>> =
        imageproc::map::map_colors(image, |p| Luma([f32::from(p.0[0])]));
    let smoothed = imageproc::filter::separable_filter_equal(&intensity, &taps);

    Ok(imageproc::map::map_colors(&smoothed, |p| {
        Luma([p.0[0].round().clamp(0.0, 255.0) as u8])
    }))
}

/// Inverted adaptive binarization.
///
/// A pixel becomes foreground when it is strictly darker than the
/// Gaussian-weighted mean of its `block_size` neighborhood minus `c`.
pub fn adaptive_threshold(image: &GrayImage, block_size: u32, c: f64) -> Result<GrayImage> {
    validate_block_size(block_size)?;
    let local_mean = gaussian_blur(image, block_size)?;

    let mut mask = GrayImage::new(image.width(), image.height());
    for ((out, src), mean) in mask
        .pixels_mut()
        .zip(image.pixels())
        .zip(local_mean.pixels())
    {
        let threshold = f64::from(mean.0[0]) - c;
        out.0[0] = if f64::from(src.0[0]) < threshold {
            FOREGROUND
        } else {
            BACKGROUND
        };
    }

    Ok(mask)
}

/// Gaussian blur stage for noise suppression
#[derive(Debug, Clone)]
pub struct GaussianBlur {
    pub kernel_size: u32,
}

impl Default for GaussianBlur {
    fn default() -> Self {
        Self { kernel_size: 21 }
    }
}

impl ImagePreprocessor for GaussianBlur {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        gaussian_blur(image, self.kernel_size)
    }

    fn name(&self) -> &'static str {
        "gaussian_blur"
    }

    fn validate(&self) -> Result<()> {
        validate_kernel_size(self.kernel_size)
    }
}

/// Adaptive threshold stage (dark-on-light)
#[derive(Debug, Clone)]
pub struct AdaptiveThreshold {
    pub block_size: u32,
    pub c: f64,
}

impl Default for AdaptiveThreshold {
    fn default() -> Self {
        Self {
            block_size: 19,
            c: 1.0,
        }
    }
}

impl ImagePreprocessor for AdaptiveThreshold {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        adaptive_threshold(image, self.block_size, self.c)
    }

    fn name(&self) -> &'static str {
        "adaptive_threshold"
    }

    fn validate(&self) -> Result<()> {
        validate_block_size(self.block_size)?;
        validate_bias(self.c)
    }
}
