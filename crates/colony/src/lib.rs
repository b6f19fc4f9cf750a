//! # Colony Counting Library
//!
//! Counts roughly circular dark objects (bacterial colonies) in a photographed
//! plate and returns an annotated copy of the image with every accepted
//! colony outlined.
//!
//! ## Pipeline
//!
//! 1. Decode and rescale to a fixed working width
//! 2. Grayscale conversion (BT.601 luma)
//! 3. Gaussian smoothing
//! 4. Inverted adaptive threshold (dark colonies become foreground)
//! 5. Morphological opening to remove specks
//! 6. Distance transform and core extraction to split touching colonies
//! 7. External contour tracing
//! 8. Area filtering and annotation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use colony::{count_colonies, PipelineParameters};
//!
//! let result = count_colonies("plate.jpg", &PipelineParameters::default())?;
//! println!("{} colonies", result.count);
//! result.annotated.save("plate_annotated.png")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use colony::{Pipeline, DistanceMask};
//!
//! let pipeline = Pipeline::builder()
//!     .working_width(800)
//!     .with_blur(5)
//!     .with_adaptive_threshold(31, 2.0)
//!     .with_opening(3, 1)
//!     .with_separation(DistanceMask::Precise, 0.5)
//!     .with_area_band(20.0, 2000.0)
//!     .build()?;
//!
//! let result = pipeline.process_file("plate.png")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Colonies are assumed darker than the plate background; lighter colonies
//! are not detected.

pub mod error;
pub mod params;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod io;

use std::path::Path;

use image::DynamicImage;

pub use error::{ColonyError, Result};
pub use params::{DistanceMask, PipelineParameters, DEFAULT_WORKING_WIDTH};
pub use types::{ColonyCount, ColonyRecord, ColonyReport, Contour, DistanceField};
pub use traits::*;
pub use algorithms::*;
pub use pipeline::{Pipeline, builder::PipelineBuilder};
pub use io::*;

/// Count colonies in the image at `path`.
///
/// Parameters are validated before the file is read. Fails with
/// [`ColonyError::Decode`] when the file cannot be decoded.
pub fn count_colonies<P: AsRef<Path>>(path: P, params: &PipelineParameters) -> Result<ColonyCount> {
    let pipeline = Pipeline::from_parameters(params)?;
    pipeline.process_file(path)
}

/// Same as [`count_colonies`] for an image that is already decoded.
pub fn count_colonies_in_image(image: &DynamicImage, params: &PipelineParameters) -> Result<ColonyCount> {
    let pipeline = Pipeline::from_parameters(params)?;
    pipeline.process_image(image)
}
