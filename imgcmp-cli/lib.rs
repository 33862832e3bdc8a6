//! Interactive pairwise image similarity.
//!
//! A session asks for an accuracy threshold and a list of image paths, then
//! scores every pair with oriented FAST keypoints, steered BRIEF descriptors
//! and a Hamming kNN ratio test, printing the pairs that clear the threshold.

pub mod comparator;
pub mod error;
pub mod input;
pub mod scorer;
pub mod settings;

use imgcmp_brief::BriefGenerator;
use imgcmp_core::{FeatureExtractor, Features, Frame};
use imgcmp_fast::{DetectorConfig, FastDetector, FastError};
use imgcmp_match::BruteForceMatcher;
use std::io::{BufRead, Write};
use std::path::Path;

pub use comparator::{load_grayscale, Comparator, ComparisonContext, PairResult, SweepReport};
pub use error::{AppError, CompareError, ConfigError, ExtractError, InputError, Result};
pub use input::{Accuracy, InputCollector};
pub use scorer::{similarity_percentage, PairScorer, Similarity, SimilarityScorer};
pub use settings::AppConfig;

/// FAST detection on the raw frame, BRIEF description on a blurred copy
#[derive(Debug, Clone)]
pub struct OrbExtractor {
    config: DetectorConfig,
    brief: BriefGenerator,
}

impl OrbExtractor {
    pub fn new(config: DetectorConfig) -> std::result::Result<Self, ExtractError> {
        config.validate()?;
        Ok(Self {
            config,
            brief: BriefGenerator::new(),
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Gaussian-smoothed copy of the frame; a sigma of 0 leaves it untouched
    fn smooth(&self, frame: &Frame) -> std::result::Result<Frame, ExtractError> {
        let sigma = self.config.core.blur_sigma;
        if sigma <= 0.0 {
            return Ok(frame.clone());
        }

        let invalid = || ExtractError::InvalidFrame {
            width: frame.width,
            height: frame.height,
        };
        let width = u32::try_from(frame.width).map_err(|_| invalid())?;
        let height = u32::try_from(frame.height).map_err(|_| invalid())?;
        let gray = image::GrayImage::from_raw(width, height, frame.pixels.clone()).ok_or_else(invalid)?;
        let blurred = imageproc::filter::gaussian_blur_f32(&gray, sigma);

        Ok(Frame {
            width: frame.width,
            height: frame.height,
            pixels: blurred.into_raw(),
        })
    }
}

impl FeatureExtractor for OrbExtractor {
    type Error = ExtractError;

    fn detect_and_describe(&self, frame: &Frame) -> std::result::Result<Features, ExtractError> {
        if frame.pixels.len() != frame.width * frame.height {
            return Err(ExtractError::InvalidFrame {
                width: frame.width,
                height: frame.height,
            });
        }

        let detector = match FastDetector::new(self.config.clone(), frame.width, frame.height) {
            Ok(detector) => detector,
            Err(FastError::ImageTooSmall { .. } | FastError::InvalidImageSize { .. }) => {
                tracing::debug!(width = frame.width, height = frame.height, "frame too small for detection");
                return Ok(Features::default());
            }
            Err(e) => return Err(e.into()),
        };

        let keypoints = detector.detect_keypoints(&frame.pixels)?;
        let smoothed = self.smooth(frame)?;
        let descriptors = self.brief.generate_descriptors(&smoothed, &keypoints);

        tracing::debug!(
            width = frame.width,
            height = frame.height,
            keypoints = keypoints.len(),
            "extracted features"
        );

        Ok(Features { keypoints, descriptors })
    }
}

/// The scorer the binary runs: ORB features, brute-force Hamming matching
pub type OrbScorer = SimilarityScorer<OrbExtractor, BruteForceMatcher>;

impl OrbScorer {
    pub fn from_config(config: &AppConfig) -> std::result::Result<Self, ExtractError> {
        let extractor = OrbExtractor::new(config.detector.clone())?;
        Ok(SimilarityScorer::new(extractor, BruteForceMatcher::new(), config.scoring.clone()))
    }
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise only warnings, or debug output with
/// `verbose`. Calling twice is harmless.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Exit status for an image that could not be decoded
pub const EXIT_OPEN_IMAGE: u8 = 255;
/// Exit status for every other failure
pub const EXIT_FAILURE: u8 = 1;

/// Configuration from `path`, or the built-in defaults without one
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    tracing::debug!("{}", config.detector.summary());
    Ok(config)
}

/// Print a failed run the way the session reports it and pick the exit status.
///
/// A decode failure belongs to the comparison results and goes to `out`;
/// everything else goes to `err`.
pub fn report_failure<O: Write, E: Write>(error: &AppError, out: &mut O, err: &mut E) -> u8 {
    match error {
        AppError::Compare(e @ CompareError::OpenImage { .. }) => {
            tracing::debug!(error = ?e, "image decode failed");
            let _ = writeln!(out, "Failed: {e}");
            let _ = out.flush();
            EXIT_OPEN_IMAGE
        }
        other => {
            let _ = writeln!(err, "Failed: {other}");
            EXIT_FAILURE
        }
    }
}

/// Run one full session: collect input, then sweep every pair
pub fn run_session<R, W, S>(input: R, output: W, scorer: &S) -> Result<SweepReport>
where
    R: BufRead,
    W: Write,
    S: PairScorer,
{
    let mut collector = InputCollector::new(input, output);
    let ctx = collector.collect()?;
    tracing::info!(accuracy = ctx.accuracy.get(), images = ctx.paths.len(), "input collected");

    let mut output = collector.into_output();
    let report = Comparator::new(scorer).run(&ctx, &mut output)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgcmp_core::ScoringConfig;
    use std::path::PathBuf;

    /// Deterministic blocky texture with plenty of corners
    fn textured_frame(width: usize, height: usize, seed: u32) -> Frame {
        let mut state = seed.max(1);
        let blocks_x = width.div_ceil(8);
        let blocks: Vec<u8> = (0..blocks_x * height.div_ceil(8))
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state & 0xff) as u8
            })
            .collect();
        let pixels = (0..width * height)
            .map(|i| blocks[(i / width / 8) * blocks_x + (i % width) / 8])
            .collect();
        Frame::new(width, height, pixels).unwrap()
    }

    fn scorer() -> OrbScorer {
        OrbScorer::from_config(&AppConfig::default()).unwrap()
    }

    #[test]
    fn test_extractor_aligns_keypoints_and_descriptors() {
        let extractor = OrbExtractor::new(DetectorConfig::default()).unwrap();
        let features = extractor.detect_and_describe(&textured_frame(128, 96, 7)).unwrap();
        assert!(!features.is_empty());
        assert_eq!(features.keypoints.len(), features.descriptors.len());
        assert!(features.len() <= extractor.config().core.max_features);
    }

    #[test]
    fn test_extractor_is_deterministic() {
        let extractor = OrbExtractor::new(DetectorConfig::default()).unwrap();
        let frame = textured_frame(96, 96, 3);
        let a = extractor.detect_and_describe(&frame).unwrap();
        let b = extractor.detect_and_describe(&frame).unwrap();
        assert_eq!(a.keypoints, b.keypoints);
        assert_eq!(a.descriptors, b.descriptors);
    }

    #[test]
    fn test_tiny_and_flat_frames_have_no_features() {
        let extractor = OrbExtractor::new(DetectorConfig::default()).unwrap();
        assert!(extractor.detect_and_describe(&Frame::filled(5, 5, 0)).unwrap().is_empty());
        assert!(extractor.detect_and_describe(&Frame::filled(0, 0, 0)).unwrap().is_empty());
        assert!(extractor.detect_and_describe(&Frame::filled(64, 64, 128)).unwrap().is_empty());
    }

    #[test]
    fn test_extractor_rejects_inconsistent_frame() {
        let extractor = OrbExtractor::new(DetectorConfig::default()).unwrap();
        let frame = Frame { width: 10, height: 10, pixels: vec![0; 7] };
        assert!(matches!(
            extractor.detect_and_describe(&frame),
            Err(ExtractError::InvalidFrame { width: 10, height: 10 })
        ));
    }

    #[test]
    fn test_nan_blur_sigma_rejected_before_scoring() {
        let mut config = AppConfig::default();
        config.detector.core.blur_sigma = f32::NAN;
        assert!(matches!(
            OrbScorer::from_config(&config),
            Err(ExtractError::Fast(FastError::InvalidBlurSigma(_)))
        ));
    }

    #[test]
    fn test_zero_blur_sigma_skips_smoothing() {
        let mut config = DetectorConfig::default();
        config.core.blur_sigma = 0.0;
        let extractor = OrbExtractor::new(config).unwrap();
        let frame = textured_frame(64, 64, 9);
        assert_eq!(extractor.smooth(&frame).unwrap(), frame);
    }

    #[test]
    fn test_decode_failure_reported_on_stdout_with_255() {
        let error = AppError::from(CompareError::OpenImage {
            path: PathBuf::from("photos/broken.png"),
            source: image::ImageError::IoError(std::io::Error::other("truncated")),
        });
        let (mut out, mut err) = (Vec::new(), Vec::new());

        assert_eq!(report_failure(&error, &mut out, &mut err), 255);
        assert_eq!(String::from_utf8(out).unwrap(), "Failed: could not open the image: photos/broken.png\n");
        assert!(err.is_empty());
    }

    #[test]
    fn test_other_failures_reported_on_stderr_with_1() {
        let errors = [
            AppError::from(InputError::UnexpectedEof { expected: "an image path" }),
            AppError::from(ConfigError::Scoring("knn_k = 1".to_string())),
            AppError::from(ExtractError::InvalidFrame { width: 3, height: 3 }),
            AppError::from(CompareError::Io(std::io::Error::other("closed"))),
        ];
        for error in &errors {
            let (mut out, mut err) = (Vec::new(), Vec::new());
            assert_eq!(report_failure(error, &mut out, &mut err), EXIT_FAILURE);
            assert!(out.is_empty());
            assert_eq!(String::from_utf8(err).unwrap(), format!("Failed: {error}\n"));
        }
    }

    #[test]
    fn test_load_config_routes_errors_through_app_error() {
        assert_eq!(load_config(None).unwrap(), AppConfig::default());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imgcmp.toml");
        std::fs::write(&path, "[detector.core]\nblur_sigma = nan\n").unwrap();
        assert!(matches!(
            load_config(Some(&path)),
            Err(AppError::Config(ConfigError::Detector(FastError::InvalidBlurSigma(_))))
        ));
    }

    #[test]
    fn test_invalid_detector_config_rejected() {
        let mut config = DetectorConfig::default();
        config.core.fast_n = 4;
        assert!(matches!(OrbExtractor::new(config), Err(ExtractError::Fast(FastError::InvalidFastN(4)))));
    }

    #[test]
    fn test_same_image_scores_high() {
        let frame = textured_frame(160, 120, 11);
        let similarity = scorer().score(&frame, &frame).unwrap();
        assert!(similarity.keypoints_a > 0);
        assert_eq!(similarity.keypoints_a, similarity.keypoints_b);
        assert!(similarity.score >= 60, "score {}", similarity.score);
    }

    #[test]
    fn test_flat_image_scores_zero() {
        let similarity = scorer()
            .score(&textured_frame(96, 96, 5), &Frame::filled(96, 96, 40))
            .unwrap();
        assert_eq!(similarity.keypoints_b, 0);
        assert_eq!(similarity.score, 0);
    }

    #[test]
    fn test_scoring_config_flows_through() {
        let config = AppConfig {
            scoring: ScoringConfig { knn_k: 3, ratio: 0.5 },
            ..AppConfig::default()
        };
        let scorer = OrbScorer::from_config(&config).unwrap();
        assert_eq!(scorer.scoring().knn_k, 3);
        assert_eq!(scorer.scoring().ratio, 0.5);
    }
}
