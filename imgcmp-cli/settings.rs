use crate::error::ConfigError;
use imgcmp_core::ScoringConfig;
use imgcmp_fast::DetectorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything that tunes a comparison run.
///
/// ```toml
/// [detector]
/// nms_distance = 3.0
///
/// [detector.core]
/// threshold = 20
/// max_features = 500
///
/// [scoring]
/// knn_k = 5
/// ratio = 0.75
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detector: DetectorConfig,
    pub scoring: ScoringConfig,
}

impl AppConfig {
    /// Read and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detector.validate()?;
        if self.scoring.knn_k < 2 {
            return Err(ConfigError::Scoring(format!(
                "knn_k = {} leaves the ratio test nothing to compare (must be >= 2)",
                self.scoring.knn_k
            )));
        }
        if !(self.scoring.ratio > 0.0 && self.scoring.ratio <= 1.0) {
            return Err(ConfigError::Scoring(format!(
                "ratio = {} (must be in (0, 1])",
                self.scoring.ratio
            )));
        }
        Ok(())
    }
}
