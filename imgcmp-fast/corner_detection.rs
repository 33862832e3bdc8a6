use imgcmp_core::{Image, Keypoint};
use crate::types::{CornerType, ScaleLevel, ScoredKeypoint};
use crate::utils::has_consecutive_bits;
use rayon::prelude::*;

/// FAST segment-test corner detection
pub struct CornerDetector;

impl CornerDetector {
    /// Bresenham circle of radius 3, in contiguous (clockwise) order
    pub const FAST_OFFSETS: [(i32, i32); 16] = [
        (0, -3), (1, -3), (2, -2), (3, -1),
        (3, 0), (3, 1), (2, 2), (1, 3),
        (0, 3), (-1, 3), (-2, 2), (-3, 1),
        (-3, 0), (-3, -1), (-2, -2), (-1, -3),
    ];

    /// Circle pixels used by the quick rejection test
    const COMPASS: [usize; 4] = [0, 4, 8, 12];

    /// Detect corners on one pyramid level, rows in parallel.
    ///
    /// Coordinates are in the level's own pixel grid. Output order is
    /// row-major regardless of scheduling.
    pub fn detect_keypoints_at_scale(
        img: &Image,
        scale_level: &ScaleLevel,
        threshold: u8,
        fast_n: u8,
    ) -> Vec<ScoredKeypoint> {
        let width = scale_level.width;
        let height = scale_level.height;
        if width < 7 || height < 7 {
            return Vec::new();
        }

        (3..height - 3)
            .into_par_iter()
            .flat_map_iter(|y| {
                let mut row_keypoints = Vec::new();
                for x in 3..width - 3 {
                    let corner = Self::segment_test(img, width, x, y, threshold, fast_n);
                    if corner == CornerType::None {
                        continue;
                    }
                    let response = Self::compute_intensity_response(img, width, x, y, threshold);
                    row_keypoints.push(ScoredKeypoint {
                        keypoint: Keypoint::new(x as f32, y as f32),
                        response,
                    });
                }
                row_keypoints
            })
            .collect()
    }

    /// Classify `(x, y)` with the FAST-N segment test.
    ///
    /// Caller guarantees a 3-pixel border around `(x, y)`.
    pub(crate) fn segment_test(
        img: &Image,
        width: usize,
        x: usize,
        y: usize,
        threshold: u8,
        fast_n: u8,
    ) -> CornerType {
        let center = img[y * width + x] as i16;
        let t = threshold as i16;
        let pixel = |i: usize| {
            let (dx, dy) = Self::FAST_OFFSETS[i];
            let px = (x as i32 + dx) as usize;
            let py = (y as i32 + dy) as usize;
            img[py * width + px] as i16
        };

        // Any arc of 9 or more covers at least two compass pixels
        let mut bright = 0;
        let mut dark = 0;
        for &i in &Self::COMPASS {
            let p = pixel(i);
            if p > center + t {
                bright += 1;
            } else if p < center - t {
                dark += 1;
            }
        }
        if bright < 2 && dark < 2 {
            return CornerType::None;
        }

        let mut bright_mask = 0u16;
        let mut dark_mask = 0u16;
        for i in 0..16 {
            let p = pixel(i);
            if p > center + t {
                bright_mask |= 1 << i;
            } else if p < center - t {
                dark_mask |= 1 << i;
            }
        }

        let n = fast_n as usize;
        if has_consecutive_bits(bright_mask, n) {
            CornerType::Bright
        } else if has_consecutive_bits(dark_mask, n) {
            CornerType::Dark
        } else {
            CornerType::None
        }
    }

    /// Mean squared contrast of the circle pixels that clear the threshold
    fn compute_intensity_response(img: &Image, width: usize, x: usize, y: usize, threshold: u8) -> f32 {
        let center = img[y * width + x] as f32;
        let mut sum_diff = 0.0f32;
        let mut count = 0;

        for &(dx, dy) in Self::FAST_OFFSETS.iter() {
            let px = (x as i32 + dx) as usize;
            let py = (y as i32 + dy) as usize;
            let diff = (center - img[py * width + px] as f32).abs();
            if diff > threshold as f32 {
                sum_diff += diff * diff;
                count += 1;
            }
        }

        if count > 0 {
            sum_diff / count as f32
        } else {
            0.0
        }
    }
}
