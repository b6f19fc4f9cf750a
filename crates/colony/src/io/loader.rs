use std::path::Path;

use image::{imageops::FilterType, DynamicImage, RgbImage};
use tracing::debug;
use crate::error::Result;

/// Decode an image file into an RGB buffer rescaled to `working_width`.
pub fn load_image<P: AsRef<Path>>(path: P, working_width: u32) -> Result<RgbImage> {
    let path = path.as_ref();
    let decoded = image::open(path)?;
    debug!(path = %path.display(), width = decoded.width(), height = decoded.height(), "decoded image");
    Ok(prepare_image(&decoded, working_width))
}

/// Decode an in-memory encoded image (PNG, JPEG, TIFF)
pub fn load_image_from_bytes(bytes: &[u8], working_width: u32) -> Result<RgbImage> {
    let decoded = image::load_from_memory(bytes)?;
    Ok(prepare_image(&decoded, working_width))
}

/// Drop any alpha channel and rescale to the working width.
pub fn prepare_image(image: &DynamicImage, working_width: u32) -> RgbImage {
    resize_to_width(&image.to_rgb8(), working_width)
}

/// Rescale to `width`, keeping the aspect ratio. Height is rounded and at least 1.
///
/// An image already at the requested width is copied without resampling.
pub fn resize_to_width(image: &RgbImage, width: u32) -> RgbImage {
    if image.width() == width {
        return image.clone();
    }

    let aspect_ratio = f64::from(image.width()) / f64::from(image.height());
    let height = ((f64::from(width) / aspect_ratio).round() as u32).max(1);
    image::imageops::resize(image, width, height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ColonyError;
    use image::Rgb;

    #[test]
    fn test_resize_preserves_aspect_ratio() {
        let image = RgbImage::from_pixel(300, 200, Rgb([10, 20, 30]));
        let resized = resize_to_width(&image, 1280);
        assert_eq!(resized.dimensions(), (1280, 853));

        let tall = RgbImage::new(3, 1000);
        assert_eq!(resize_to_width(&tall, 12).dimensions(), (12, 4000));

        let wide = RgbImage::new(4000, 1);
        assert_eq!(resize_to_width(&wide, 10).dimensions(), (10, 1));
    }

    #[test]
    fn test_same_width_is_untouched() {
        let mut image = RgbImage::new(64, 48);
        image.put_pixel(5, 7, Rgb([1, 2, 3]));
        assert_eq!(resize_to_width(&image, 64), image);
    }

    #[test]
    fn test_alpha_is_dropped() {
        let rgba = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            8,
            8,
            image::Rgba([40, 50, 60, 128]),
        ));
        let prepared = prepare_image(&rgba, 8);
        assert_eq!(*prepared.get_pixel(3, 3), Rgb([40, 50, 60]));
    }

    #[test]
    fn test_missing_file_is_decode_error() {
        let result = load_image("/definitely/not/here.png", 1280);
        assert!(matches!(result, Err(ColonyError::Decode(_))));
    }

    #[test]
    fn test_garbage_bytes_are_decode_error() {
        let result = load_image_from_bytes(b"not an image at all", 1280);
        assert!(matches!(result, Err(ColonyError::Decode(_))));
    }
}
