//! Binary morphology with a square, all-foreground structuring element.
//!
//! A square element is separable, so erosion and dilation run as a row pass
//! followed by a column pass. The element is anchored at `size / 2`, which
//! also gives even sizes a well-defined origin. Pixels outside the image
//! never take part, so shapes touching the border are not eaten away.

use image::GrayImage;
use crate::{error::Result, params::validate_morph_kernel_size, traits::ImagePreprocessor};

#[derive(Debug, Clone, Copy)]
enum Extremum {
    Min,
    Max,
}

impl Extremum {
    fn pick(self, a: u8, b: u8) -> u8 {
        match self {
            Extremum::Min => a.min(b),
            Extremum::Max => a.max(b),
        }
    }
}

fn window(center: usize, size: u32, len: usize) -> (usize, usize) {
    let anchor = (size / 2) as usize;
    let start = center.saturating_sub(anchor);
    let end = (center + size as usize - 1 - anchor).min(len - 1);
    (start, end)
}

fn square_filter(mask: &GrayImage, size: u32, op: Extremum) -> GrayImage {
    let size = size.max(1);
    let (w, h) = (mask.width() as usize, mask.height() as usize);
    let src = mask.as_raw();

    let mut rows = vec![0u8; w * h];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            let (start, end) = window(x, size, w);
            rows[y * w + x] = row[start..=end]
                .iter()
                .copied()
                .reduce(|a, b| op.pick(a, b))
                .unwrap_or(row[x]);
        }
    }

    let mut out = GrayImage::new(mask.width(), mask.height());
    for y in 0..h {
        let (start, end) = window(y, size, h);
        for x in 0..w {
            let value = (start..=end)
                .map(|sy| rows[sy * w + x])
                .reduce(|a, b| op.pick(a, b))
                .unwrap_or(rows[y * w + x]);
            out.put_pixel(x as u32, y as u32, image::Luma([value]));
        }
    }

    out
}

/// Shrink foreground: a pixel survives only if its whole neighborhood is foreground.
pub fn erode(mask: &GrayImage, size: u32) -> GrayImage {
    square_filter(mask, size, Extremum::Min)
}

/// Grow foreground: a pixel becomes foreground if any neighbor is foreground.
pub fn dilate(mask: &GrayImage, size: u32) -> GrayImage {
    square_filter(mask, size, Extremum::Max)
}

/// `iterations` rounds of erosion followed by dilation.
///
/// Zero iterations return an identical copy of the input.
pub fn open(mask: &GrayImage, size: u32, iterations: u32) -> GrayImage {
    let mut current = mask.clone();
    for _ in 0..iterations {
        let eroded = erode(&current, size);
        current = dilate(&eroded, size);
    }
    current
}

/// Morphological opening stage for speck removal
#[derive(Debug, Clone)]
pub struct MorphologicalOpening {
    pub kernel_size: u32,
    pub iterations: u32,
}

impl Default for MorphologicalOpening {
    fn default() -> Self {
        Self {
            kernel_size: 3,
            iterations: 4,
        }
    }
}

impl ImagePreprocessor for MorphologicalOpening {
    fn preprocess(&self, mask: &GrayImage) -> Result<GrayImage> {
        Ok(open(mask, self.kernel_size, self.iterations))
    }

    fn name(&self) -> &'static str {
        "morphological_opening"
    }

    fn validate(&self) -> Result<()> {
        validate_morph_kernel_size(self.kernel_size)
    }
}
