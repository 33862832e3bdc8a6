use imgcmp_core::{Descriptor, DescriptorMatcher, Match};
use rayon::prelude::*;

/// Number of differing bits between two binary descriptors
#[inline]
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Exhaustive k-nearest-neighbour matcher under Hamming distance
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceMatcher;

impl BruteForceMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Up to `k` nearest train descriptors for one query, closest first.
    ///
    /// Ties are broken by the lower train index.
    fn nearest(query_idx: usize, query: &Descriptor, train: &[Descriptor], k: usize) -> Vec<Match> {
        let mut best: Vec<Match> = Vec::with_capacity(k + 1);

        for (train_idx, candidate) in train.iter().enumerate() {
            let distance = hamming_distance(query, candidate);
            if best.len() == k && best.last().is_some_and(|worst| worst.distance <= distance) {
                continue;
            }
            let pos = best.partition_point(|m| m.distance <= distance);
            best.insert(pos, Match { query_idx, train_idx, distance });
            best.truncate(k);
        }

        best
    }
}

impl DescriptorMatcher for BruteForceMatcher {
    fn knn_match(&self, query: &[Descriptor], train: &[Descriptor], k: usize) -> Vec<Vec<Match>> {
        if k == 0 {
            return vec![Vec::new(); query.len()];
        }

        query
            .par_iter()
            .enumerate()
            .map(|(query_idx, q)| Self::nearest(query_idx, q, train, k))
            .collect()
    }
}

/// Lowe's ratio test on one candidate list sorted by ascending distance.
///
/// Needs at least two candidates. A zero second-best distance never passes,
/// since the best is then indistinguishable from the runner-up.
pub fn passes_ratio_test(candidates: &[Match], ratio: f32) -> bool {
    match candidates {
        [best, second, ..] => {
            second.distance > 0 && (best.distance as f32 / second.distance as f32) <= ratio
        }
        _ => false,
    }
}

/// Number of candidate lists passing the ratio test
pub fn count_confident(matches: &[Vec<Match>], ratio: f32) -> usize {
    matches.iter().filter(|candidates| passes_ratio_test(candidates, ratio)).count()
}

/// Best candidate of every list passing the ratio test
pub fn confident_matches(matches: &[Vec<Match>], ratio: f32) -> Vec<Match> {
    matches
        .iter()
        .filter(|candidates| passes_ratio_test(candidates, ratio))
        .map(|candidates| candidates[0])
        .collect()
}
