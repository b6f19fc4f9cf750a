use image::GrayImage;
use crate::{error::Result, types::Contour};

/// Trait for single-channel buffer-to-buffer stages (blur, threshold, morphology, separation)
pub trait ImagePreprocessor: Send + Sync {
    /// Produce a new buffer from the input; the input is never modified
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage>;

    /// Short stage name used in logs
    fn name(&self) -> &'static str;

    /// Check the stage's configuration; called once when a pipeline is built
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Trait for contour extraction algorithms
pub trait ContourExtractor: Send + Sync {
    /// Extract contours from a binary mask
    fn extract_contours(&self, mask: &GrayImage) -> Result<Vec<Contour>>;
}
