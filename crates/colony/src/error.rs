use image::ColorType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ColonyError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Expected an 8-bit RGB buffer, got {found:?}")]
    ChannelMismatch { found: ColorType },

    #[error("Invalid kernel size {0}: must be a positive odd integer")]
    InvalidKernelSize(u32),

    #[error("Invalid block size {0}: must be an odd integer >= 3")]
    InvalidBlockSize(u32),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ColonyError>;
