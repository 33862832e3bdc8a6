use imgcmp_core::{DescriptorMatcher, FeatureExtractor, Frame, ScoringConfig};
use imgcmp_match::count_confident;

/// Outcome of scoring one image pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Similarity {
    pub keypoints_a: usize,
    pub keypoints_b: usize,
    pub confident_matches: usize,
    /// `confident_matches` as a percentage of the smaller keypoint count.
    /// Not clamped, so it can exceed 100.
    pub score: u32,
}

/// Integer percentage of `confident` over `min(keypoints_a, keypoints_b)`,
/// truncated. Zero when either image has no keypoints.
pub fn similarity_percentage(confident: usize, keypoints_a: usize, keypoints_b: usize) -> u32 {
    let base = keypoints_a.min(keypoints_b) as u64;
    if base == 0 {
        return 0;
    }
    let percent = confident as u64 * 100 / base;
    u32::try_from(percent).unwrap_or(u32::MAX)
}

/// Anything that can turn two decoded frames into a similarity
pub trait PairScorer {
    type Error: std::error::Error + Send + Sync + 'static;

    fn score_pair(&self, a: &Frame, b: &Frame) -> Result<Similarity, Self::Error>;
}

impl<T: PairScorer + ?Sized> PairScorer for &T {
    type Error = T::Error;

    fn score_pair(&self, a: &Frame, b: &Frame) -> Result<Similarity, Self::Error> {
        (**self).score_pair(a, b)
    }
}

/// Detect, kNN-match A into B, ratio-test, normalize
#[derive(Debug, Clone)]
pub struct SimilarityScorer<E, M> {
    extractor: E,
    matcher: M,
    scoring: ScoringConfig,
}

impl<E: FeatureExtractor, M: DescriptorMatcher> SimilarityScorer<E, M> {
    pub fn new(extractor: E, matcher: M, scoring: ScoringConfig) -> Self {
        Self {
            extractor,
            matcher,
            scoring,
        }
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    /// Score two frames. Features are computed independently for each.
    pub fn score(&self, a: &Frame, b: &Frame) -> Result<Similarity, E::Error> {
        let features_a = self.extractor.detect_and_describe(a)?;
        let features_b = self.extractor.detect_and_describe(b)?;

        let candidates = self
            .matcher
            .knn_match(&features_a.descriptors, &features_b.descriptors, self.scoring.knn_k);
        let confident_matches = count_confident(&candidates, self.scoring.ratio);

        let similarity = Similarity {
            keypoints_a: features_a.len(),
            keypoints_b: features_b.len(),
            confident_matches,
            score: similarity_percentage(confident_matches, features_a.len(), features_b.len()),
        };

        tracing::debug!(
            keypoints_a = similarity.keypoints_a,
            keypoints_b = similarity.keypoints_b,
            confident = similarity.confident_matches,
            score = similarity.score,
            "scored pair"
        );

        Ok(similarity)
    }
}

impl<E: FeatureExtractor, M: DescriptorMatcher> PairScorer for SimilarityScorer<E, M> {
    type Error = E::Error;

    fn score_pair(&self, a: &Frame, b: &Frame) -> Result<Similarity, Self::Error> {
        self.score(a, b)
    }
}
