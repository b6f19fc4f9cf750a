use crate::{
    algorithms::{
        AdaptiveThreshold, AreaFilter, BlobSeparator, ExternalContourExtractor, GaussianBlur,
        MorphologicalOpening,
    },
    error::Result,
    params::{validate_working_width, DistanceMask, PipelineParameters, DEFAULT_WORKING_WIDTH},
    pipeline::Pipeline,
    traits::{ContourExtractor, ImagePreprocessor},
};

/// Builder for creating processing pipelines with a fluent API
pub struct PipelineBuilder {
    working_width: u32,
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    contour_extractor: Option<Box<dyn ContourExtractor>>,
    area_filter: AreaFilter,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            working_width: DEFAULT_WORKING_WIDTH,
            preprocessors: Vec::new(),
            contour_extractor: None,
            area_filter: AreaFilter::default(),
        }
    }

    /// Standard stage chain for a validated parameter set.
    ///
    /// Validation happens here, before any stage can run.
    pub fn from_parameters(params: &PipelineParameters) -> Result<Self> {
        params.validate()?;

        Ok(Self::new()
            .working_width(params.working_width)
            .with_blur(params.blur_kernel_size)
            .with_adaptive_threshold(
                params.adaptive_threshold_block_size,
                params.adaptive_threshold_c,
            )
            .with_opening(params.morph_kernel_size, params.morph_iterations)
            .with_separation(
                params.distance_transform_mask_size,
                params.distance_transform_threshold,
            )
            .set_contour_extractor(ExternalContourExtractor)
            .with_area_band(params.min_area, params.max_area))
    }

    /// Width inputs are rescaled to before processing
    pub fn working_width(mut self, width: u32) -> Self {
        self.working_width = width;
        self
    }

    /// Add a mask stage to the pipeline
    pub fn add_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: ImagePreprocessor + 'static,
    {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Set the contour extractor (replaces any existing one)
    pub fn set_contour_extractor<E>(mut self, extractor: E) -> Self
    where
        E: ContourExtractor + 'static,
    {
        self.contour_extractor = Some(Box::new(extractor));
        self
    }

    pub fn with_blur(self, kernel_size: u32) -> Self {
        self.add_preprocessor(GaussianBlur { kernel_size })
    }

    pub fn with_adaptive_threshold(self, block_size: u32, c: f64) -> Self {
        self.add_preprocessor(AdaptiveThreshold { block_size, c })
    }

    pub fn with_opening(self, kernel_size: u32, iterations: u32) -> Self {
        self.add_preprocessor(MorphologicalOpening {
            kernel_size,
            iterations,
        })
    }

    pub fn with_separation(self, mask: DistanceMask, threshold: f32) -> Self {
        self.add_preprocessor(BlobSeparator { mask, threshold })
    }

    /// Accept contours whose area lies strictly between the bounds
    pub fn with_area_band(mut self, min_area: f64, max_area: f64) -> Self {
        self.area_filter = AreaFilter { min_area, max_area };
        self
    }

    /// Validate every stage and build the pipeline, using default components
    /// where none were set
    pub fn build(self) -> Result<Pipeline> {
        validate_working_width(self.working_width)?;
        for stage in &self.preprocessors {
            stage.validate()?;
        }
        self.area_filter.validate()?;

        let contour_extractor = self
            .contour_extractor
            .unwrap_or_else(|| Box::new(ExternalContourExtractor));

        Ok(Pipeline::new(
            self.working_width,
            self.preprocessors,
            contour_extractor,
            self.area_filter,
        ))
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ColonyError;

    #[test]
    fn test_invalid_parameters_fail_before_building() {
        let params = PipelineParameters {
            adaptive_threshold_block_size: 20,
            ..Default::default()
        };
        assert!(matches!(
            PipelineBuilder::from_parameters(&params),
            Err(ColonyError::InvalidBlockSize(20))
        ));
    }

    #[test]
    fn test_working_width_is_carried() {
        let params = PipelineParameters {
            working_width: 640,
            ..Default::default()
        };
        let pipeline = PipelineBuilder::from_parameters(&params).unwrap().build().unwrap();
        assert_eq!(pipeline.working_width(), 640);
    }

    #[test]
    fn test_build_rejects_nan_ratio() {
        let result = PipelineBuilder::new()
            .with_separation(DistanceMask::Precise, f32::NAN)
            .build();
        assert!(matches!(result, Err(ColonyError::InvalidParameter(_))));
    }

    #[test]
    fn test_build_rejects_inverted_area_band() {
        let result = PipelineBuilder::new().with_area_band(500.0, 10.0).build();
        assert!(matches!(result, Err(ColonyError::InvalidParameter(_))));
    }

    #[test]
    fn test_build_rejects_zero_working_width() {
        let result = PipelineBuilder::new().working_width(0).build();
        assert!(matches!(result, Err(ColonyError::InvalidParameter(_))));
    }

    #[test]
    fn test_build_checks_each_stage() {
        assert!(matches!(
            PipelineBuilder::new().with_blur(4).build(),
            Err(ColonyError::InvalidKernelSize(4))
        ));
        assert!(matches!(
            PipelineBuilder::new().with_adaptive_threshold(3, -1.0).build(),
            Err(ColonyError::InvalidParameter(_))
        ));
        assert!(matches!(
            PipelineBuilder::new().with_opening(0, 2).build(),
            Err(ColonyError::InvalidParameter(_))
        ));
        assert!(PipelineBuilder::new()
            .with_blur(5)
            .with_adaptive_threshold(11, 2.0)
            .with_opening(3, 1)
            .with_separation(DistanceMask::Chamfer5, 1.0)
            .with_area_band(0.0, 10.0)
            .build()
            .is_ok());
    }
}
