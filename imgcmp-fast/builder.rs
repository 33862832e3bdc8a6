use crate::config::DetectorConfig;
use crate::detector::FastDetector;
use crate::error::FastResult;

/// Fluent builder for `DetectorConfig` and sized `FastDetector`s
#[derive(Debug, Clone, Default)]
pub struct DetectorBuilder {
    config: DetectorConfig,
}

impl DetectorBuilder {
    /// Create a new builder with the balanced defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the FAST threshold (1-127)
    pub fn threshold(mut self, threshold: u8) -> Self {
        self.config.core.threshold = threshold;
        self
    }

    /// Set the patch size for orientation calculation
    pub fn patch_size(mut self, patch_size: usize) -> Self {
        self.config.core.patch_size = patch_size;
        self
    }

    /// Set the number of threads for parallel processing
    pub fn threads(mut self, n_threads: usize) -> Self {
        self.config.core.n_threads = n_threads;
        self
    }

    /// Set the segment-test arc length (FAST-9 .. FAST-12)
    pub fn fast_n(mut self, n: u8) -> Self {
        self.config.core.fast_n = n;
        self
    }

    /// Keep at most `n` keypoints per image (0 keeps all)
    pub fn max_features(mut self, n: usize) -> Self {
        self.config.core.max_features = n;
        self
    }

    pub fn blur_sigma(mut self, sigma: f32) -> Self {
        self.config.core.blur_sigma = sigma;
        self
    }

    /// Set the non-maximum suppression (NMS) distance
    pub fn nms_distance(mut self, distance: f32) -> Self {
        self.config.nms_distance = distance;
        self
    }

    /// Enable or disable subpixel refinement
    pub fn subpixel_refinement(mut self, enable: bool) -> Self {
        self.config.subpixel_refinement = enable;
        self
    }

    pub fn scale_factor(mut self, factor: f32) -> Self {
        self.config.scale_factor = factor;
        self
    }

    pub fn max_levels(mut self, levels: usize) -> Self {
        self.config.max_levels = levels;
        self
    }

    /// Apply the fast preset
    pub fn preset_fast(mut self) -> Self {
        self.config = DetectorConfig::fast_preset();
        self
    }

    /// Apply the precision preset
    pub fn preset_precision(mut self) -> Self {
        self.config = DetectorConfig::precision_preset();
        self
    }

    /// Apply the balanced preset
    pub fn preset_balanced(mut self) -> Self {
        self.config = DetectorConfig::balanced_preset();
        self
    }

    /// Build a detector for images of the given size
    pub fn build(&self, width: usize, height: usize) -> FastResult<FastDetector> {
        FastDetector::new(self.config.clone(), width, height)
    }

    /// Generate a summary of the builder's configuration
    pub fn summary(&self) -> String {
        self.config.summary()
    }

    /// Create a builder from an existing `DetectorConfig`
    pub fn from_config(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Convert the builder into a `DetectorConfig`
    pub fn to_config(self) -> DetectorConfig {
        self.config
    }
}
