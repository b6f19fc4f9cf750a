use geo_types::{Coord, LineString, Polygon};
use image::{ImageBuffer, Luma, RgbImage};
use serde::{Deserialize, Serialize};

/// Sample value of a foreground pixel in a binary mask.
pub const FOREGROUND: u8 = 255;
/// Sample value of a background pixel in a binary mask.
pub const BACKGROUND: u8 = 0;

/// Per-pixel distance to the nearest background pixel.
pub type DistanceField = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Closed boundary polygon of one connected foreground region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contour {
    /// Boundary pixels in tracing order; the last point connects back to the first
    pub points: Vec<[i32; 2]>,
}

impl Contour {
    pub fn new(points: Vec<[i32; 2]>) -> Self {
        Self { points }
    }

    /// Convert to geo-types Polygon for geometric operations
    pub fn to_geo_polygon(&self) -> Polygon<f64> {
        let coords: Vec<Coord<f64>> = self
            .points
            .iter()
            .map(|&[x, y]| Coord {
                x: f64::from(x),
                y: f64::from(y),
            })
            .collect();

        Polygon::new(LineString::new(coords), vec![])
    }

    /// Enclosed polygon area. Degenerate contours (fewer than three points) have zero area.
    pub fn area(&self) -> f64 {
        use geo::Area;
        if self.points.len() < 3 {
            return 0.0;
        }
        self.to_geo_polygon().unsigned_area()
    }

    /// Axis-aligned bounds as `(min, max)` corners
    pub fn bounding_box(&self) -> ([i32; 2], [i32; 2]) {
        let mut min = [i32::MAX, i32::MAX];
        let mut max = [i32::MIN, i32::MIN];

        for &[x, y] in &self.points {
            min[0] = min[0].min(x);
            min[1] = min[1].min(y);
            max[0] = max[0].max(x);
            max[1] = max[1].max(y);
        }

        (min, max)
    }

    /// Get the centroid of the contour
    pub fn centroid(&self) -> [f64; 2] {
        use geo::Centroid;
        if self.points.len() >= 3 {
            if let Some(centroid) = self.to_geo_polygon().centroid() {
                return [centroid.x(), centroid.y()];
            }
        }
        // Fallback to bounding box center
        let (min, max) = self.bounding_box();
        [
            f64::from(min[0] + max[0]) / 2.0,
            f64::from(min[1] + max[1]) / 2.0,
        ]
    }

    /// Length of the closed boundary
    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| {
                let [x0, y0] = self.points[i];
                let [x1, y1] = self.points[(i + 1) % n];
                f64::from(x1 - x0).hypot(f64::from(y1 - y0))
            })
            .sum()
    }
}

/// A traced contour with its area and the verdict of the area filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColonyRecord {
    pub contour: Contour,
    pub area: f64,
    pub accepted: bool,
}

/// Output of one pipeline run.
#[derive(Debug, Clone)]
pub struct ColonyCount {
    /// Number of accepted records
    pub count: usize,
    /// Copy of the working-size color image with accepted contours outlined
    pub annotated: RgbImage,
    /// Every traced contour, accepted or not, in extraction order
    pub records: Vec<ColonyRecord>,
}

impl ColonyCount {
    pub fn accepted(&self) -> impl Iterator<Item = &ColonyRecord> {
        self.records.iter().filter(|record| record.accepted)
    }

    /// Summary suitable for printing or serializing.
    pub fn report(&self) -> ColonyReport {
        ColonyReport {
            count: self.count,
            image_width: self.annotated.width(),
            image_height: self.annotated.height(),
            rejected: self.records.len() - self.count,
            colonies: self
                .accepted()
                .map(|record| ColonySummary {
                    area: record.area,
                    centroid: record.contour.centroid(),
                    perimeter: record.contour.perimeter(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColonyReport {
    pub count: usize,
    /// Working-size image dimensions
    pub image_width: u32,
    pub image_height: u32,
    /// Contours discarded by the area filter
    pub rejected: usize,
    pub colonies: Vec<ColonySummary>,
}

impl ColonyReport {
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColonySummary {
    pub area: f64,
    pub centroid: [f64; 2],
    pub perimeter: f64,
}
