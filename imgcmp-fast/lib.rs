//! Multi-scale FAST keypoint detection.
//!
//! A `FastDetector` is built for one image size. It runs the FAST-N segment
//! test on every level of an image pyramid, suppresses clustered corners,
//! assigns each survivor an intensity-centroid orientation and returns the
//! strongest keypoints in base-image coordinates.
//!
//! ```no_run
//! use imgcmp_fast::DetectorBuilder;
//!
//! let pixels = vec![0u8; 640 * 480];
//! let detector = DetectorBuilder::new().threshold(25).build(640, 480)?;
//! let keypoints = detector.detect_keypoints(&pixels)?;
//! # Ok::<(), imgcmp_fast::FastError>(())
//! ```

mod builder;
mod config;
mod corner_detection;
mod detector;
mod error;
mod pyramid;
mod refinement;
mod types;
pub mod utils;

pub use builder::DetectorBuilder;
pub use config::DetectorConfig;
pub use corner_detection::CornerDetector;
pub use detector::{FastDetector, MIN_IMAGE_SIZE};
pub use error::{FastError, FastResult};
#[cfg(feature = "serde")]
pub use error::ConfigFormatError;
pub use pyramid::ImagePyramid;
pub use refinement::KeypointRefinement;
pub use types::{ScaleLevel, ScoredKeypoint};
