use imgcmp_core::OrbConfig;
use crate::error::{FastError, FastResult};
#[cfg(feature = "serde")]
use crate::error::ConfigFormatError;
use crate::builder::DetectorBuilder;

#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};

/// Complete detector configuration, independent of image size
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DetectorConfig {
    /// Core ORB configuration
    pub core: OrbConfig,
    /// Minimum distance between keypoints surviving suppression, in level pixels
    pub nms_distance: f32,
    pub subpixel_refinement: bool,
    /// Pyramid downscale ratio between consecutive levels
    pub scale_factor: f32,
    pub max_levels: usize,
    /// Metadata
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub description: Option<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::balanced_preset()
    }
}

impl DetectorConfig {
    /// Balanced preset, the default for image comparison
    pub fn balanced_preset() -> Self {
        Self {
            core: OrbConfig::default(),
            nms_distance: 3.0,
            subpixel_refinement: false,
            scale_factor: 1.2,
            max_levels: 8,
            name: None,
            description: None,
        }
    }

    /// Fast preset: fewer levels and stronger corners only
    pub fn fast_preset() -> Self {
        Self {
            core: OrbConfig {
                threshold: 30,
                patch_size: 15,
                max_features: 300,
                ..OrbConfig::default()
            },
            nms_distance: 5.0,
            subpixel_refinement: false,
            scale_factor: 1.5,
            max_levels: 4,
            name: Some("Fast".to_string()),
            description: Some("Fewer, stronger keypoints for quick comparisons".to_string()),
        }
    }

    /// Precision preset: more keypoints over a finer pyramid
    pub fn precision_preset() -> Self {
        Self {
            core: OrbConfig {
                threshold: 12,
                max_features: 1500,
                ..OrbConfig::default()
            },
            nms_distance: 2.0,
            subpixel_refinement: true,
            scale_factor: 1.2,
            max_levels: 10,
            name: Some("Precision".to_string()),
            description: Some("Dense keypoints for near-duplicate detection".to_string()),
        }
    }

    /// Add metadata to configuration
    pub fn with_metadata(mut self, name: &str, description: &str) -> Self {
        self.name = Some(name.to_string());
        self.description = Some(description.to_string());
        self
    }

    /// Convert to DetectorBuilder for further customization
    pub fn to_builder(self) -> DetectorBuilder {
        DetectorBuilder::from_config(self)
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "DetectorConfig: threshold={}, FAST-{}, patch_size={}, max_features={}, levels={}x{:.2}, NMS:{:.1}, Subpixel:{}, threads={}",
            self.core.threshold, self.core.fast_n, self.core.patch_size, self.core.max_features,
            self.max_levels, self.scale_factor, self.nms_distance, self.subpixel_refinement,
            self.core.n_threads
        )
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> FastResult<()> {
        if self.core.threshold == 0 || self.core.threshold > 127 {
            return Err(FastError::InvalidThreshold(self.core.threshold));
        }
        if self.core.patch_size % 2 == 0 || self.core.patch_size < 3 {
            return Err(FastError::InvalidPatchSize(self.core.patch_size));
        }
        if !(9..=12).contains(&self.core.fast_n) {
            return Err(FastError::InvalidFastN(self.core.fast_n));
        }
        if !(self.scale_factor > 1.0) {
            return Err(FastError::InvalidScaleFactor(self.scale_factor));
        }
        let sigma = self.core.blur_sigma;
        if !(sigma == 0.0 || (sigma.is_finite() && sigma > 0.0)) {
            return Err(FastError::InvalidBlurSigma(sigma));
        }
        Ok(())
    }

    /// Serialize to JSON string
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, ConfigFormatError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserialize from TOML string
    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigFormatError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for cfg in [
            DetectorConfig::balanced_preset(),
            DetectorConfig::fast_preset(),
            DetectorConfig::precision_preset(),
        ] {
            assert!(cfg.validate().is_ok(), "{}", cfg.summary());
        }
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = DetectorConfig::default();
        cfg.core.threshold = 0;
        assert_eq!(cfg.validate(), Err(FastError::InvalidThreshold(0)));

        let mut cfg = DetectorConfig::default();
        cfg.core.threshold = 200;
        assert_eq!(cfg.validate(), Err(FastError::InvalidThreshold(200)));

        let mut cfg = DetectorConfig::default();
        cfg.core.patch_size = 16;
        assert_eq!(cfg.validate(), Err(FastError::InvalidPatchSize(16)));

        let mut cfg = DetectorConfig::default();
        cfg.core.fast_n = 8;
        assert_eq!(cfg.validate(), Err(FastError::InvalidFastN(8)));

        let mut cfg = DetectorConfig::default();
        cfg.scale_factor = 1.0;
        assert!(matches!(cfg.validate(), Err(FastError::InvalidScaleFactor(_))));
    }

    #[test]
    fn test_validate_blur_sigma() {
        for bad in [f32::NAN, f32::INFINITY, -1.0] {
            let mut cfg = DetectorConfig::default();
            cfg.core.blur_sigma = bad;
            assert!(matches!(cfg.validate(), Err(FastError::InvalidBlurSigma(_))), "{bad}");
        }

        let mut cfg = DetectorConfig::default();
        cfg.core.blur_sigma = 0.0;
        assert!(cfg.validate().is_ok());
        cfg.core.blur_sigma = 1.5;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_metadata_and_summary() {
        let cfg = DetectorConfig::default().with_metadata("Mine", "custom");
        assert_eq!(cfg.name.as_deref(), Some("Mine"));
        assert!(cfg.summary().contains("FAST-9"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_and_toml_round_trip() {
        let cfg = DetectorConfig::precision_preset();
        let json = cfg.to_json().unwrap();
        assert_eq!(DetectorConfig::from_json(&json).unwrap(), cfg);

        let toml_text = cfg.to_toml().unwrap();
        assert_eq!(DetectorConfig::from_toml(&toml_text).unwrap(), cfg);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_toml_uses_defaults() {
        let cfg = DetectorConfig::from_toml("nms_distance = 4.5\n[core]\nthreshold = 25\n").unwrap();
        assert_eq!(cfg.core.threshold, 25);
        assert_eq!(cfg.core.fast_n, 9);
        assert_eq!(cfg.nms_distance, 4.5);
        assert_eq!(cfg.max_levels, 8);

        assert!(matches!(
            DetectorConfig::from_toml("[core]\nthreshold = 0\n"),
            Err(ConfigFormatError::Invalid(FastError::InvalidThreshold(0)))
        ));
        assert!(matches!(
            DetectorConfig::from_toml("[core]\nblur_sigma = nan\n"),
            Err(ConfigFormatError::Invalid(FastError::InvalidBlurSigma(_)))
        ));
        assert!(matches!(DetectorConfig::from_toml("[core"), Err(ConfigFormatError::Toml(_))));
        assert!(matches!(DetectorConfig::from_json("{"), Err(ConfigFormatError::Json(_))));
    }
}
