//! Distance-transform based separation of touching blobs.
//!
//! Pixels deep inside a blob sit far from any background pixel. Keeping only
//! pixels whose distance exceeds a fraction of the global maximum shrinks each
//! blob to its core, and two blobs joined by a narrow neck fall apart into
//! separate components.

use image::{GrayImage, Luma};
use tracing::trace;
use crate::{
    error::Result,
    params::{validate_distance_threshold, DistanceMask},
    traits::ImagePreprocessor,
    types::{DistanceField, BACKGROUND, FOREGROUND},
};

/// 3x3 chamfer weights (axial, diagonal).
const CHAMFER3: [(isize, isize, f32); 4] = [
    (-1, 0, 0.955),
    (-1, -1, 1.3693),
    (0, -1, 0.955),
    (1, -1, 1.3693),
];

/// 5x5 chamfer weights (axial, diagonal, knight move).
const CHAMFER5: [(isize, isize, f32); 8] = [
    (-1, 0, 1.0),
    (-1, -1, 1.4),
    (0, -1, 1.0),
    (1, -1, 1.4),
    (-2, -1, 2.1969),
    (-1, -2, 2.1969),
    (1, -2, 2.1969),
    (2, -1, 2.1969),
];

/// Distance from every pixel to the nearest background pixel.
///
/// Background pixels are 0. Pixels outside the image do not count as
/// background; a mask without any background saturates to `f32::MAX`.
pub fn distance_transform(mask: &GrayImage, kind: DistanceMask) -> DistanceField {
    let (w, h) = mask.dimensions();
    if !mask.pixels().any(|p| p.0[0] == BACKGROUND) {
        return DistanceField::from_pixel(w, h, Luma([f32::MAX]));
    }

    match kind {
        DistanceMask::Precise => precise(mask),
        DistanceMask::Chamfer3 => chamfer(mask, &CHAMFER3),
        DistanceMask::Chamfer5 => chamfer(mask, &CHAMFER5),
    }
}

fn precise(mask: &GrayImage) -> DistanceField {
    // imageproc measures distance to the nearest non-zero pixel, so the
    // background has to become the non-zero set.
    let background = imageproc::map::map_colors(mask, |p| {
        Luma([if p.0[0] == BACKGROUND { FOREGROUND } else { BACKGROUND }])
    });
    let squared = imageproc::distance_transform::euclidean_squared_distance_transform(&background);

    imageproc::map::map_colors(&squared, |p| {
        let d = p.0[0].sqrt() as f32;
        Luma([if d.is_finite() { d } else { f32::MAX }])
    })
}

fn chamfer(mask: &GrayImage, forward: &[(isize, isize, f32)]) -> DistanceField {
    let (w, h) = (mask.width() as isize, mask.height() as isize);
    let mut dist: Vec<f32> = mask
        .pixels()
        .map(|p| if p.0[0] == BACKGROUND { 0.0 } else { f32::INFINITY })
        .collect();

    let relax = |x: isize, y: isize, dx: isize, dy: isize, weight: f32, dist: &mut [f32]| {
        let (nx, ny) = (x + dx, y + dy);
        if nx < 0 || ny < 0 || nx >= w || ny >= h {
            return;
        }
        let here = (y * w + x) as usize;
        let candidate = dist[(ny * w + nx) as usize] + weight;
        if candidate < dist[here] {
            dist[here] = candidate;
        }
    };

    for y in 0..h {
        for x in 0..w {
            for &(dx, dy, weight) in forward {
                relax(x, y, dx, dy, weight, &mut dist);
            }
        }
    }
    for y in (0..h).rev() {
        for x in (0..w).rev() {
            for &(dx, dy, weight) in forward {
                relax(x, y, -dx, -dy, weight, &mut dist);
            }
        }
    }

    let samples = dist
        .into_iter()
        .map(|d| if d.is_finite() { d } else { f32::MAX })
        .collect();
    DistanceField::from_raw(mask.width(), mask.height(), samples)
        .unwrap_or_else(|| DistanceField::new(mask.width(), mask.height()))
}

/// Keep pixels whose distance strictly exceeds `ratio` times the field maximum.
///
/// An all-zero field yields an all-background mask. A saturated field (no
/// background anywhere) keeps every pixel for any ratio below 1; the area
/// band then decides what the single image-sized blob is worth.
pub fn sure_foreground(field: &DistanceField, ratio: f32) -> GrayImage {
    let d_max = field.pixels().fold(0.0f32, |acc, p| acc.max(p.0[0]));
    let cutoff = ratio * d_max;
    trace!(d_max, cutoff, "distance field threshold");

    imageproc::map::map_colors(field, |p| {
        Luma([if p.0[0] > cutoff { FOREGROUND } else { BACKGROUND }])
    })
}

/// Blob separation stage: distance transform followed by core extraction
#[derive(Debug, Clone)]
pub struct BlobSeparator {
    pub mask: DistanceMask,
    pub threshold: f32,
}

impl Default for BlobSeparator {
    fn default() -> Self {
        Self {
            mask: DistanceMask::Chamfer3,
            threshold: 0.3,
        }
    }
}

impl ImagePreprocessor for BlobSeparator {
    fn preprocess(&self, mask: &GrayImage) -> Result<GrayImage> {
        let field = distance_transform(mask, self.mask);
        Ok(sure_foreground(&field, self.threshold))
    }

    fn name(&self) -> &'static str {
        "blob_separator"
    }

    fn validate(&self) -> Result<()> {
        validate_distance_threshold(self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::region_labelling::{connected_components, Connectivity};

    fn block(w: u32, h: u32, rects: &[(u32, u32, u32, u32)]) -> GrayImage {
        let mut mask = GrayImage::new(w, h);
        for &(x0, y0, x1, y1) in rects {
            for y in y0..y1 {
                for x in x0..x1 {
                    mask.put_pixel(x, y, Luma([FOREGROUND]));
                }
            }
        }
        mask
    }

    fn components(mask: &GrayImage) -> u32 {
        connected_components(mask, Connectivity::Eight, Luma([BACKGROUND]))
            .pixels()
            .map(|p| p.0[0])
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn test_center_distance_per_kernel() {
        let mask = block(9, 9, &[(1, 1, 8, 8)]);
        let expected = [
            (DistanceMask::Precise, 4.0),
            (DistanceMask::Chamfer5, 4.0),
            (DistanceMask::Chamfer3, 4.0 * 0.955),
        ];
        for (kind, want) in expected {
            let field = distance_transform(&mask, kind);
            let got = field.get_pixel(4, 4).0[0];
            assert!((got - want).abs() < 1e-4, "{kind:?}: {got} != {want}");
            assert_eq!(field.get_pixel(0, 0).0[0], 0.0);
        }
    }

    #[test]
    fn test_empty_mask_yields_empty_seeds() {
        let mask = GrayImage::new(16, 16);
        for kind in [DistanceMask::Precise, DistanceMask::Chamfer3, DistanceMask::Chamfer5] {
            let field = distance_transform(&mask, kind);
            assert!(field.pixels().all(|p| p.0[0] == 0.0));
            let seeds = sure_foreground(&field, 0.5);
            assert!(seeds.pixels().all(|p| p.0[0] == BACKGROUND));
        }
    }

    #[test]
    fn test_full_mask_keeps_every_pixel() {
        let mask = GrayImage::from_pixel(6, 6, Luma([FOREGROUND]));
        for kind in [DistanceMask::Precise, DistanceMask::Chamfer3, DistanceMask::Chamfer5] {
            let field = distance_transform(&mask, kind);
            assert!(field.pixels().all(|p| p.0[0] == f32::MAX));
        }

        let seeds = BlobSeparator::default().preprocess(&mask).unwrap();
        assert_eq!(seeds, mask);

        // Only the top of the range removes everything.
        let none = sure_foreground(&distance_transform(&mask, DistanceMask::Precise), 1.0);
        assert!(none.pixels().all(|p| p.0[0] == BACKGROUND));
    }

    #[test]
    fn test_neck_is_cut_at_high_ratio() {
        // Two 9x9 blocks joined by a one pixel bridge.
        let mask = block(30, 13, &[(1, 2, 10, 11), (16, 2, 25, 11), (10, 6, 16, 7)]);
        assert_eq!(components(&mask), 1);

        for kind in [DistanceMask::Precise, DistanceMask::Chamfer3, DistanceMask::Chamfer5] {
            let separator = BlobSeparator {
                mask: kind,
                threshold: 0.5,
            };
            let seeds = separator.preprocess(&mask).unwrap();
            assert_eq!(components(&seeds), 2, "{kind:?}");
        }
    }

    #[test]
    fn test_zero_ratio_keeps_all_foreground() {
        let mask = block(30, 13, &[(1, 2, 10, 11), (16, 2, 25, 11), (10, 6, 16, 7)]);
        let separator = BlobSeparator {
            mask: DistanceMask::Precise,
            threshold: 0.0,
        };
        assert_eq!(separator.preprocess(&mask).unwrap(), mask);
    }
}
