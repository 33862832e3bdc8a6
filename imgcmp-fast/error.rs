use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FastError {
    #[error("Invalid image dimensions: {width}x{height} (must be > 0)")]
    InvalidImageSize { width: usize, height: usize },

    #[error("Image data length mismatch: expected {expected_len}, got {actual_len}")]
    InvalidImageData { expected_len: usize, actual_len: usize },

    #[error("Invalid threshold: {0} (must be 1-127)")]
    InvalidThreshold(u8),

    #[error("Invalid patch size {0} (must be odd and at least 3)")]
    InvalidPatchSize(usize),

    #[error("Invalid segment test length FAST-{0} (must be 9-12)")]
    InvalidFastN(u8),

    #[error("Invalid pyramid scale factor {0} (must be > 1.0)")]
    InvalidScaleFactor(f32),

    #[error("Invalid blur sigma {0} (must be 0 to disable, or finite and > 0)")]
    InvalidBlurSigma(f32),

    #[error("Image {width}x{height} too small (minimum {min_size}x{min_size})")]
    ImageTooSmall { width: usize, height: usize, min_size: usize },
}

pub type FastResult<T> = Result<T, FastError>;

/// Failure to read a serialized `DetectorConfig`
#[cfg(feature = "serde")]
#[derive(Debug, Error)]
pub enum ConfigFormatError {
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] FastError),
}
