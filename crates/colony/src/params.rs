use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{ColonyError, Result};

/// Width every input is rescaled to before processing.
pub const DEFAULT_WORKING_WIDTH: u32 = 1280;

/// Kernel approximation used by the distance transform.
///
/// Serialized as the integer mask size (`0`, `3` or `5`) so parameter files
/// read the same way the control panel labels them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum DistanceMask {
    /// Exact Euclidean distance.
    #[strum(to_string = "0", serialize = "precise")]
    Precise,
    /// 3x3 chamfer approximation.
    #[strum(to_string = "3", serialize = "chamfer3")]
    Chamfer3,
    /// 5x5 chamfer approximation.
    #[strum(to_string = "5", serialize = "chamfer5")]
    Chamfer5,
}

impl DistanceMask {
    pub fn size(self) -> u8 {
        match self {
            Self::Precise => 0,
            Self::Chamfer3 => 3,
            Self::Chamfer5 => 5,
        }
    }
}

impl Default for DistanceMask {
    fn default() -> Self {
        Self::Chamfer3
    }
}

impl TryFrom<u8> for DistanceMask {
    type Error = ColonyError;

    fn try_from(size: u8) -> Result<Self> {
        match size {
            0 => Ok(Self::Precise),
            3 => Ok(Self::Chamfer3),
            5 => Ok(Self::Chamfer5),
            other => Err(ColonyError::InvalidParameter(format!(
                "distance transform mask size must be 0, 3 or 5, got {other}"
            ))),
        }
    }
}

impl From<DistanceMask> for u8 {
    fn from(mask: DistanceMask) -> Self {
        mask.size()
    }
}

/// Every tunable knob of one pipeline run.
///
/// A value is supplied fresh per invocation and never mutated while the
/// pipeline runs. Fields omitted from a parameter file take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PipelineParameters {
    /// Exclusive lower bound of the accepted contour area (pixels²)
    #[schemars(range(min = 0.0))]
    pub min_area: f64,
    /// Exclusive upper bound of the accepted contour area (pixels²)
    #[schemars(range(min = 0.0))]
    pub max_area: f64,
    /// Gaussian smoothing kernel size (odd, >= 1)
    #[schemars(range(min = 1))]
    pub blur_kernel_size: u32,
    /// Neighborhood size of the adaptive threshold (odd, >= 3)
    #[schemars(range(min = 3))]
    pub adaptive_threshold_block_size: u32,
    /// Bias subtracted from the local mean
    #[serde(alias = "adaptive_threshold_C")]
    #[schemars(range(min = 0.0))]
    pub adaptive_threshold_c: f64,
    /// Side of the square structuring element
    #[schemars(range(min = 1))]
    pub morph_kernel_size: u32,
    /// Number of opening rounds
    pub morph_iterations: u32,
    /// Fraction of the maximum distance a seed pixel must exceed
    #[schemars(range(min = 0.0, max = 1.0))]
    pub distance_transform_threshold: f32,
    /// Distance transform kernel: 0 (precise), 3 or 5
    #[schemars(with = "u8")]
    pub distance_transform_mask_size: DistanceMask,
    /// Width the input is rescaled to, preserving aspect ratio
    #[schemars(range(min = 1))]
    pub working_width: u32,
}

impl Default for PipelineParameters {
    fn default() -> Self {
        Self {
            min_area: 10.0,
            max_area: 400.0,
            blur_kernel_size: 21,
            adaptive_threshold_block_size: 19,
            adaptive_threshold_c: 1.0,
            morph_kernel_size: 3,
            morph_iterations: 4,
            distance_transform_threshold: 0.3,
            distance_transform_mask_size: DistanceMask::Chamfer3,
            working_width: DEFAULT_WORKING_WIDTH,
        }
    }
}

impl PipelineParameters {
    /// JSON schema describing a parameter file.
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(PipelineParameters)
    }

    /// Reject out-of-contract values before any stage runs.
    pub fn validate(&self) -> Result<()> {
        validate_kernel_size(self.blur_kernel_size)?;
        validate_block_size(self.adaptive_threshold_block_size)?;
        validate_area_band(self.min_area, self.max_area)?;
        validate_bias(self.adaptive_threshold_c)?;
        validate_morph_kernel_size(self.morph_kernel_size)?;
        validate_distance_threshold(self.distance_transform_threshold)?;
        validate_working_width(self.working_width)?;

        Ok(())
    }
}

pub(crate) fn validate_kernel_size(size: u32) -> Result<()> {
    if size == 0 || size % 2 == 0 {
        return Err(ColonyError::InvalidKernelSize(size));
    }
    Ok(())
}

pub(crate) fn validate_block_size(size: u32) -> Result<()> {
    if size < 3 || size % 2 == 0 {
        return Err(ColonyError::InvalidBlockSize(size));
    }
    Ok(())
}

pub(crate) fn validate_area_band(min_area: f64, max_area: f64) -> Result<()> {
    if !min_area.is_finite() || !max_area.is_finite() || min_area < 0.0 {
        return Err(ColonyError::InvalidParameter(format!(
            "area bounds must be finite and non-negative, got [{min_area}, {max_area}]"
        )));
    }
    if min_area >= max_area {
        return Err(ColonyError::InvalidParameter(format!(
            "min_area ({min_area}) must be less than max_area ({max_area})"
        )));
    }
    Ok(())
}

pub(crate) fn validate_bias(c: f64) -> Result<()> {
    if !c.is_finite() || c < 0.0 {
        return Err(ColonyError::InvalidParameter(format!(
            "adaptive_threshold_c must be >= 0, got {c}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_morph_kernel_size(size: u32) -> Result<()> {
    if size == 0 {
        return Err(ColonyError::InvalidParameter(
            "morph_kernel_size must be >= 1".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_distance_threshold(ratio: f32) -> Result<()> {
    // NaN fails the range check.
    if !(0.0..=1.0).contains(&ratio) {
        return Err(ColonyError::InvalidParameter(format!(
            "distance_transform_threshold must be within [0, 1], got {ratio}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_working_width(width: u32) -> Result<()> {
    if width == 0 {
        return Err(ColonyError::InvalidParameter(
            "working_width must be >= 1".to_string(),
        ));
    }
    Ok(())
}
