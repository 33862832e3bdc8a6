use imgcmp_fast::FastError;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for one interactive session
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Input(#[from] InputError),

    #[error("{0}")]
    Compare(#[from] CompareError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Extract(#[from] ExtractError),
}

/// Errors that end the prompt loop; invalid tokens are re-prompted instead
#[derive(Error, Debug)]
pub enum InputError {
    #[error("input ended while waiting for {expected}")]
    UnexpectedEof { expected: &'static str },

    #[error("console I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort the pairwise sweep
#[derive(Error, Debug)]
pub enum CompareError {
    #[error("could not open the image: {}", path.display())]
    OpenImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("could not score {} against {}: {source}", first.display(), second.display())]
    Score {
        first: PathBuf,
        second: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("could not write results: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from feature extraction
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("detector error: {0}")]
    Fast(#[from] FastError),

    #[error("frame buffer does not match {width}x{height}")]
    InvalidFrame { width: usize, height: usize },
}

/// Errors loading or validating the configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read configuration {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid detector configuration: {0}")]
    Detector(#[from] FastError),

    #[error("invalid scoring configuration: {0}")]
    Scoring(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
