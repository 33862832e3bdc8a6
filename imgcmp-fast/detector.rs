use imgcmp_core::{Image, Keypoint};
use crate::config::DetectorConfig;
use crate::corner_detection::CornerDetector;
use crate::error::{FastError, FastResult};
use crate::pyramid::ImagePyramid;
use crate::refinement::KeypointRefinement;
use crate::types::{ScaleLevel, ScoredKeypoint};
use rayon::prelude::*;

/// FAST requires at least 7x7 image (3-pixel border on each side)
pub const MIN_IMAGE_SIZE: usize = 7;

/// Multi-scale FAST corner detector for images of one fixed size
#[derive(Debug, Clone)]
pub struct FastDetector {
    cfg: DetectorConfig,
    w: usize,
    h: usize,
    scale_levels: Vec<ScaleLevel>,
}

impl FastDetector {
    /// Creates a new FAST detector with validation
    pub fn new(cfg: DetectorConfig, width: usize, height: usize) -> FastResult<Self> {
        if width == 0 || height == 0 {
            return Err(FastError::InvalidImageSize { width, height });
        }

        if width < MIN_IMAGE_SIZE || height < MIN_IMAGE_SIZE {
            return Err(FastError::ImageTooSmall {
                width,
                height,
                min_size: MIN_IMAGE_SIZE,
            });
        }

        cfg.validate()?;

        let scale_levels = ImagePyramid::generate_scale_levels(width, height, cfg.scale_factor, cfg.max_levels);

        Ok(Self {
            cfg,
            w: width,
            h: height,
            scale_levels,
        })
    }

    /// Validates image data before processing
    fn validate_image(&self, img: &Image) -> FastResult<()> {
        let expected_len = self.w * self.h;
        if img.len() != expected_len {
            return Err(FastError::InvalidImageData {
                expected_len,
                actual_len: img.len(),
            });
        }
        Ok(())
    }

    /// Detect oriented keypoints, strongest first, in base-image coordinates
    pub fn detect_keypoints(&self, img: &Image) -> FastResult<Vec<Keypoint>> {
        let scored = self.detect_keypoints_with_response(img)?;
        Ok(scored.into_iter().map(|sk| sk.keypoint).collect())
    }

    /// Detect keypoints across all pyramid levels with their responses.
    ///
    /// The result is sorted by descending response (ties keep level, then
    /// row-major order) and truncated to `max_features`.
    pub fn detect_keypoints_with_response(&self, img: &Image) -> FastResult<Vec<ScoredKeypoint>> {
        self.validate_image(img)?;

        let pyramid = ImagePyramid::build_image_pyramid(img, self.w, self.h, &self.scale_levels);

        let per_level: Vec<Vec<ScoredKeypoint>> = self
            .scale_levels
            .par_iter()
            .zip(pyramid.par_iter())
            .map(|(scale_level, scaled_img)| self.detect_keypoints_at_scale(scaled_img, scale_level))
            .collect();

        let mut all_keypoints: Vec<ScoredKeypoint> = per_level.into_iter().flatten().collect();
        all_keypoints.sort_by(|a, b| b.response.total_cmp(&a.response));

        let max_features = self.cfg.core.max_features;
        if max_features > 0 {
            all_keypoints.truncate(max_features);
        }

        tracing::trace!(
            levels = self.scale_levels.len(),
            keypoints = all_keypoints.len(),
            "FAST detection finished"
        );

        Ok(all_keypoints)
    }

    /// Detect, suppress, refine and orient corners on one pyramid level,
    /// returning them in base-image coordinates
    pub fn detect_keypoints_at_scale(&self, img: &Image, scale_level: &ScaleLevel) -> Vec<ScoredKeypoint> {
        let core = &self.cfg.core;
        let corners = CornerDetector::detect_keypoints_at_scale(img, scale_level, core.threshold, core.fast_n);
        let suppressed = KeypointRefinement::non_maximum_suppression(&corners, self.cfg.nms_distance);

        suppressed
            .into_iter()
            .map(|mut sk| {
                if self.cfg.subpixel_refinement {
                    sk.keypoint = KeypointRefinement::refine_keypoint_subpixel(
                        img,
                        scale_level.width,
                        scale_level.height,
                        sk.keypoint,
                    );
                }
                let angle = KeypointRefinement::compute_orientation(
                    img,
                    scale_level.width,
                    scale_level.height,
                    sk.keypoint.x,
                    sk.keypoint.y,
                    core.patch_size,
                );
                sk.keypoint = Keypoint {
                    x: sk.keypoint.x * scale_level.scale,
                    y: sk.keypoint.y * scale_level.scale,
                    angle,
                    scale: scale_level.scale,
                };
                sk
            })
            .collect()
    }

    /// Get scale levels for this detector
    pub fn scale_levels(&self) -> &[ScaleLevel] {
        &self.scale_levels
    }

    /// Get detector configuration
    pub fn config(&self) -> &DetectorConfig {
        &self.cfg
    }

    /// Get image dimensions
    pub fn dimensions(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    /// Compute orientation using intensity centroid method on the base image
    pub fn compute_orientation(&self, img: &Image, x: f32, y: f32) -> FastResult<f32> {
        self.validate_image(img)?;
        Ok(KeypointRefinement::compute_orientation(img, self.w, self.h, x, y, self.cfg.core.patch_size))
    }
}
