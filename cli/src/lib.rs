use clap::Args;
use colony::{DistanceMask, PipelineParameters};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("No input image given on the command line or in the configuration file")]
    MissingImage,
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// Counting job configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CountConfig {
    /// Image to process when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Where to write the annotated image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default)]
    pub parameters: PipelineParameters,
}

impl CountConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load configuration from a JSON string
    pub fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    /// Save configuration, picking the format from the extension
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        let path_ref = path.as_ref();
        let content = match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => self.to_toml()?,
            Some("json") => self.to_json()?,
            _ => return Err(CliError::UnsupportedFileFormat),
        };
        fs::write(path_ref, content)?;
        Ok(())
    }

    /// Convert to a TOML string
    pub fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    /// Convert to a JSON string
    pub fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }
}

/// Command-line overrides for individual pipeline parameters
#[derive(Debug, Clone, Default, Args)]
pub struct ParameterOverrides {
    /// Exclusive lower bound of accepted contour area
    #[arg(long)]
    pub min_area: Option<f64>,
    /// Exclusive upper bound of accepted contour area
    #[arg(long)]
    pub max_area: Option<f64>,
    /// Gaussian blur kernel size (odd)
    #[arg(long)]
    pub blur_kernel_size: Option<u32>,
    /// Adaptive threshold block size (odd, >= 3)
    #[arg(long)]
    pub block_size: Option<u32>,
    /// Adaptive threshold bias
    #[arg(long, short = 'C')]
    pub c: Option<f64>,
    /// Morphological structuring element size
    #[arg(long)]
    pub morph_kernel_size: Option<u32>,
    /// Morphological opening rounds
    #[arg(long)]
    pub morph_iterations: Option<u32>,
    /// Fraction of the maximum distance kept as colony cores
    #[arg(long)]
    pub distance_threshold: Option<f32>,
    /// Distance transform mask: 0 (precise), 3 or 5
    #[arg(long)]
    pub mask_size: Option<DistanceMask>,
    /// Working width the image is rescaled to
    #[arg(long)]
    pub working_width: Option<u32>,
}

impl ParameterOverrides {
    /// Replace every field that was given on the command line
    pub fn apply(&self, params: &mut PipelineParameters) {
        if let Some(v) = self.min_area {
            params.min_area = v;
        }
        if let Some(v) = self.max_area {
            params.max_area = v;
        }
        if let Some(v) = self.blur_kernel_size {
            params.blur_kernel_size = v;
        }
        if let Some(v) = self.block_size {
            params.adaptive_threshold_block_size = v;
        }
        if let Some(v) = self.c {
            params.adaptive_threshold_c = v;
        }
        if let Some(v) = self.morph_kernel_size {
            params.morph_kernel_size = v;
        }
        if let Some(v) = self.morph_iterations {
            params.morph_iterations = v;
        }
        if let Some(v) = self.distance_threshold {
            params.distance_transform_threshold = v;
        }
        if let Some(v) = self.mask_size {
            params.distance_transform_mask_size = v;
        }
        if let Some(v) = self.working_width {
            params.working_width = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = CountConfig::from_toml(
            r#"
image = "plate.jpg"

[parameters]
min_area = 25
distance_transform_mask_size = 5
"#,
        )
        .expect("valid TOML");

        assert_eq!(config.image.as_deref(), Some("plate.jpg"));
        assert_eq!(config.output, None);
        assert_eq!(config.parameters.min_area, 25.0);
        assert_eq!(config.parameters.distance_transform_mask_size, DistanceMask::Chamfer5);
        assert_eq!(config.parameters.blur_kernel_size, 21);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = CountConfig {
            image: Some("plate.png".to_string()),
            output: Some("annotated.png".to_string()),
            parameters: PipelineParameters {
                morph_iterations: 2,
                distance_transform_mask_size: DistanceMask::Precise,
                ..Default::default()
            },
        };

        for name in ["params.toml", "params.json"] {
            let path = dir.path().join(name);
            config.to_file(&path).expect("write config");
            assert_eq!(CountConfig::from_file(&path).expect("read config"), config);
        }

        assert!(matches!(
            CountConfig::from_file(dir.path().join("params.yaml")),
            Err(CliError::UnsupportedFileFormat)
        ));
    }

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let mut params = PipelineParameters::default();
        let overrides = ParameterOverrides {
            max_area: Some(900.0),
            mask_size: Some(DistanceMask::Precise),
            ..Default::default()
        };
        overrides.apply(&mut params);

        assert_eq!(params.max_area, 900.0);
        assert_eq!(params.distance_transform_mask_size, DistanceMask::Precise);
        assert_eq!(params.min_area, PipelineParameters::default().min_area);
    }
}
