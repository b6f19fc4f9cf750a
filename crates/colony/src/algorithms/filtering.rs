use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use crate::{
    error::Result,
    params::validate_area_band,
    types::{ColonyCount, ColonyRecord, Contour},
};

/// Outline color of accepted colonies
pub const HIGHLIGHT: Rgb<u8> = Rgb([0, 255, 0]);

/// Exclusive area band a contour must fall inside to count as a colony
#[derive(Debug, Clone, PartialEq)]
pub struct AreaFilter {
    pub min_area: f64,
    pub max_area: f64,
}

impl Default for AreaFilter {
    fn default() -> Self {
        Self {
            min_area: 10.0,
            max_area: 400.0,
        }
    }
}

impl AreaFilter {
    /// Bounds must be finite, non-negative and ordered
    pub fn validate(&self) -> Result<()> {
        validate_area_band(self.min_area, self.max_area)
    }

    pub fn accepts(&self, area: f64) -> bool {
        self.min_area < area && area < self.max_area
    }

    /// Tag every contour with its area and verdict, keeping input order.
    pub fn classify(&self, contours: Vec<Contour>) -> Vec<ColonyRecord> {
        contours
            .into_iter()
            .map(|contour| {
                let area = contour.area();
                ColonyRecord {
                    accepted: self.accepts(area),
                    area,
                    contour,
                }
            })
            .collect()
    }
}

/// Draw a closed, 1-pixel outline of the contour.
pub fn draw_contour_mut(canvas: &mut RgbImage, contour: &Contour, color: Rgb<u8>) {
    let points = &contour.points;
    if let [[x, y]] = points.as_slice() {
        if *x >= 0 && *y >= 0 && (*x as u32) < canvas.width() && (*y as u32) < canvas.height() {
            canvas.put_pixel(*x as u32, *y as u32, color);
        }
        return;
    }

    for i in 0..points.len() {
        let [x0, y0] = points[i];
        let [x1, y1] = points[(i + 1) % points.len()];
        draw_line_segment_mut(
            canvas,
            (x0 as f32, y0 as f32),
            (x1 as f32, y1 as f32),
            color,
        );
    }
}

/// Apply the area band and outline accepted contours on a copy of `original`.
pub fn filter_and_annotate(
    contours: Vec<Contour>,
    original: &RgbImage,
    filter: &AreaFilter,
) -> ColonyCount {
    let records = filter.classify(contours);
    let mut annotated = original.clone();

    let mut count = 0;
    for record in records.iter().filter(|record| record.accepted) {
        draw_contour_mut(&mut annotated, &record.contour, HIGHLIGHT);
        count += 1;
    }

    ColonyCount {
        count,
        annotated,
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: i32, y: i32, side: i32) -> Contour {
        Contour::new(vec![[x, y], [x + side, y], [x + side, y + side], [x, y + side]])
    }

    #[test]
    fn test_bounds_are_exclusive() {
        let filter = AreaFilter {
            min_area: 16.0,
            max_area: 100.0,
        };
        assert!(!filter.accepts(16.0));
        assert!(filter.accepts(16.5));
        assert!(filter.accepts(99.9));
        assert!(!filter.accepts(100.0));
    }

    #[test]
    fn test_only_accepted_contours_are_drawn() {
        let original = RgbImage::from_pixel(40, 40, Rgb([200, 200, 200]));
        let contours = vec![square(2, 2, 4), square(10, 10, 8), square(0, 25, 14)];
        let filter = AreaFilter {
            min_area: 20.0,
            max_area: 100.0,
        };

        let result = filter_and_annotate(contours, &original, &filter);
        assert_eq!(result.count, 1);
        assert_eq!(result.records.len(), 3);
        assert_eq!(
            result.records.iter().map(|r| r.accepted).collect::<Vec<_>>(),
            vec![false, true, false]
        );

        assert_eq!(*result.annotated.get_pixel(10, 10), HIGHLIGHT);
        assert_eq!(*result.annotated.get_pixel(18, 14), HIGHLIGHT);
        assert_eq!(*result.annotated.get_pixel(14, 14), Rgb([200, 200, 200]));
        assert_eq!(*result.annotated.get_pixel(2, 2), Rgb([200, 200, 200]));
        // The source buffer is left untouched.
        assert!(original.pixels().all(|p| *p == Rgb([200, 200, 200])));
    }

    #[test]
    fn test_single_point_contour() {
        let mut canvas = RgbImage::new(5, 5);
        draw_contour_mut(&mut canvas, &Contour::new(vec![[3, 1]]), HIGHLIGHT);
        assert_eq!(*canvas.get_pixel(3, 1), HIGHLIGHT);
        assert_eq!(canvas.pixels().filter(|p| **p == HIGHLIGHT).count(), 1);
    }
}
