pub mod builder;

use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};
use tracing::{debug, debug_span};
use crate::{
    algorithms::{filter_and_annotate, rgb_to_gray, AreaFilter},
    error::Result,
    io::{load_image, prepare_image},
    params::PipelineParameters,
    traits::{ContourExtractor, ImagePreprocessor},
    types::{ColonyCount, FOREGROUND},
};

/// Linear image-to-count pipeline.
///
/// Grayscale conversion feeds a chain of single-channel stages (blur,
/// adaptive threshold, opening, blob separation); the final mask is traced
/// into contours, which are area-filtered and drawn onto a copy of the
/// color input. Every stage allocates its own output, and the pipeline holds
/// no state between runs, so one instance can serve concurrent callers.
pub struct Pipeline {
    working_width: u32,
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    contour_extractor: Box<dyn ContourExtractor>,
    area_filter: AreaFilter,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Validate `params` and assemble the standard stage chain from them
    pub fn from_parameters(params: &PipelineParameters) -> Result<Self> {
        builder::PipelineBuilder::from_parameters(params)?.build()
    }

    pub(crate) fn new(
        working_width: u32,
        preprocessors: Vec<Box<dyn ImagePreprocessor>>,
        contour_extractor: Box<dyn ContourExtractor>,
        area_filter: AreaFilter,
    ) -> Self {
        Self {
            working_width,
            preprocessors,
            contour_extractor,
            area_filter,
        }
    }

    pub fn working_width(&self) -> u32 {
        self.working_width
    }

    /// Decode `path`, rescale it, and run the pipeline
    pub fn process_file<P: AsRef<Path>>(&self, path: P) -> Result<ColonyCount> {
        let image = load_image(path, self.working_width)?;
        self.process(&image)
    }

    /// Rescale an already decoded image and run the pipeline
    pub fn process_image(&self, image: &DynamicImage) -> Result<ColonyCount> {
        let prepared = prepare_image(image, self.working_width);
        self.process(&prepared)
    }

    /// Run every stage on a working-size color image
    pub fn process(&self, image: &RgbImage) -> Result<ColonyCount> {
        let span = debug_span!("pipeline", width = image.width(), height = image.height());
        let _enter = span.enter();

        // Step 1: Intensity. Input is already 8-bit RGB, so the channel check
        // in `to_grayscale` cannot fail here.
        let mut current = rgb_to_gray(image);

        // Step 2: Apply all mask stages in sequence
        for stage in &self.preprocessors {
            current = stage.preprocess(&current)?;
            debug!(stage = stage.name(), foreground = foreground_count(&current), "stage complete");
        }

        // Step 3: Trace external boundaries
        let contours = self.contour_extractor.extract_contours(&current)?;

        // Step 4: Area band and annotation
        let result = filter_and_annotate(contours, image, &self.area_filter);
        debug!(
            accepted = result.count,
            rejected = result.records.len() - result.count,
            "area filter applied"
        );

        Ok(result)
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        let stages: Vec<&str> = self.preprocessors.iter().map(|stage| stage.name()).collect();
        format!(
            "Pipeline (width {}): grayscale -> {} -> contours -> area ({}, {})",
            self.working_width,
            stages.join(" -> "),
            self.area_filter.min_area,
            self.area_filter.max_area
        )
    }
}

fn foreground_count(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p.0[0] == FOREGROUND).count()
}
