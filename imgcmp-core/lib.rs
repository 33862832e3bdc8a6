#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Row-major 8-bit grayscale image
pub type Image = Vec<u8>;

/// 256-bit binary descriptor = 32 bytes
pub type Descriptor = [u8; 32];

/// Grayscale raster together with its dimensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub pixels: Image,
}

impl Frame {
    /// Wrap raw pixels, returning `None` when the buffer does not match `width * height`
    pub fn new(width: usize, height: usize, pixels: Image) -> Option<Self> {
        if pixels.len() != width * height {
            return None;
        }
        Some(Self { width, height, pixels })
    }

    /// Frame with every pixel set to `value`
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![value; width * height],
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Key-point ≙ FAST corner + orientation (radians), in base-image coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    /// Pyramid scale the corner was found at (1.0 = full resolution)
    pub scale: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            angle: 0.0,
            scale: 1.0,
        }
    }
}

/// Keypoints and their descriptors, index-aligned
#[derive(Debug, Clone, Default)]
pub struct Features {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl Features {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// One candidate correspondence from a query descriptor into a train set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub query_idx: usize,
    pub train_idx: usize,
    /// Hamming distance between the two descriptors
    pub distance: u32,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OrbConfig {
    pub threshold: u8,
    pub patch_size: usize,
    pub n_threads: usize,
    /// Contiguous arc length required by the segment test (FAST-9 .. FAST-12)
    pub fast_n: u8,
    /// Strongest keypoints kept per image, 0 keeps all
    pub max_features: usize,
    /// Gaussian sigma applied before descriptor sampling, 0 disables smoothing
    pub blur_sigma: f32,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            threshold: 20,
            patch_size: 31,
            n_threads: num_cpus::get().max(1),
            fast_n: 9,
            max_features: 500,
            blur_sigma: 2.0,
        }
    }
}

/// Parameters of the nearest-neighbour ratio test
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScoringConfig {
    /// Candidates requested per query descriptor
    pub knn_k: usize,
    /// Maximum best/second-best distance ratio for a confident match
    pub ratio: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            knn_k: 5,
            ratio: 0.75,
        }
    }
}

/// Detects keypoints and computes their descriptors for one frame.
pub trait FeatureExtractor {
    type Error: std::error::Error + Send + Sync + 'static;

    fn detect_and_describe(&self, frame: &Frame) -> Result<Features, Self::Error>;
}

/// Finds, for each query descriptor, its `k` nearest train descriptors.
///
/// Every returned list is sorted by ascending distance and there is exactly
/// one list per query descriptor.
pub trait DescriptorMatcher {
    fn knn_match(&self, query: &[Descriptor], train: &[Descriptor], k: usize) -> Vec<Vec<Match>>;
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rejects_mismatched_buffer() {
        assert!(Frame::new(4, 4, vec![0; 15]).is_none());
        let frame = Frame::new(4, 3, vec![7; 12]).unwrap();
        assert_eq!(frame.dimensions(), (4, 3));
        assert!(!frame.is_empty());
    }

    #[test]
    fn test_filled_frame() {
        let frame = Frame::filled(5, 2, 200);
        assert_eq!(frame.pixels.len(), 10);
        assert!(frame.pixels.iter().all(|&p| p == 200));
    }

    #[test]
    fn test_default_configs() {
        let cfg = OrbConfig::default();
        assert_eq!(cfg.threshold, 20);
        assert_eq!(cfg.patch_size % 2, 1);
        assert!(cfg.n_threads >= 1);
        assert_eq!(cfg.fast_n, 9);

        let scoring = ScoringConfig::default();
        assert_eq!(scoring.knn_k, 5);
        assert_eq!(scoring.ratio, 0.75);
    }

    #[test]
    fn test_keypoint_defaults_to_base_scale() {
        let kp = Keypoint::new(3.0, 4.0);
        assert_eq!(kp.scale, 1.0);
        assert_eq!(kp.angle, 0.0);
    }
}
