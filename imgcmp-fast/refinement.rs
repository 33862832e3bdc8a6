use imgcmp_core::{Image, Keypoint};
use crate::types::ScoredKeypoint;

/// Subpixel refinement, orientation and suppression of raw corners
pub struct KeypointRefinement;

impl KeypointRefinement {
    /// Refine keypoint to subpixel accuracy using quadratic surface fitting
    pub fn refine_keypoint_subpixel(img: &Image, width: usize, height: usize, kp: Keypoint) -> Keypoint {
        let x = kp.x as usize;
        let y = kp.y as usize;

        // Ensure we have enough border for 3x3 sampling
        if x < 1 || y < 1 || x + 1 >= width || y + 1 >= height {
            return kp;
        }

        let at = |sx: usize, sy: usize| img[sy * width + sx] as f32;
        let samples = [
            [at(x - 1, y - 1), at(x, y - 1), at(x + 1, y - 1)],
            [at(x - 1, y), at(x, y), at(x + 1, y)],
            [at(x - 1, y + 1), at(x, y + 1), at(x + 1, y + 1)],
        ];

        // Finite differences of f(x,y) = Ax² + By² + Cxy + Dx + Ey + F
        let dx = (samples[1][2] - samples[1][0]) / 2.0;
        let dy = (samples[2][1] - samples[0][1]) / 2.0;
        let dxx = samples[1][2] - 2.0 * samples[1][1] + samples[1][0];
        let dyy = samples[2][1] - 2.0 * samples[1][1] + samples[0][1];
        let dxy = (samples[2][2] - samples[2][0] - samples[0][2] + samples[0][0]) / 4.0;

        let det = dxx * dyy - dxy * dxy;
        if det.abs() < 1e-6 {
            return kp;
        }

        let offset_x = (-(dyy * dx - dxy * dy) / det).clamp(-0.5, 0.5);
        let offset_y = (-(dxx * dy - dxy * dx) / det).clamp(-0.5, 0.5);

        Keypoint {
            x: kp.x + offset_x,
            y: kp.y + offset_y,
            ..kp
        }
    }

    /// Orientation by the intensity centroid of a circular patch.
    ///
    /// Pixels outside the image are clamped to the nearest edge.
    pub fn compute_orientation(img: &Image, width: usize, height: usize, x: f32, y: f32, patch_size: usize) -> f32 {
        let half = (patch_size / 2) as i32;
        let radius_sq = half * half;
        let (cx, cy) = (x.round() as i32, y.round() as i32);
        let mut m10 = 0i64;
        let mut m01 = 0i64;

        for dy in -half..=half {
            let yy = (cy + dy).clamp(0, height as i32 - 1) as usize;
            for dx in -half..=half {
                if dx * dx + dy * dy > radius_sq {
                    continue;
                }
                let xx = (cx + dx).clamp(0, width as i32 - 1) as usize;
                let val = img[yy * width + xx] as i64;
                m10 += dx as i64 * val;
                m01 += dy as i64 * val;
            }
        }

        if m10 == 0 && m01 == 0 {
            0.0
        } else {
            (m01 as f32).atan2(m10 as f32)
        }
    }

    /// Greedy non-maximum suppression: strongest first, drop anything closer
    /// than `min_distance` to an accepted keypoint.
    ///
    /// Accepted points are bucketed on a grid of `min_distance` cells so each
    /// candidate only inspects its 3x3 cell neighbourhood. Ties in response
    /// keep input order.
    pub fn non_maximum_suppression(keypoints: &[ScoredKeypoint], min_distance: f32) -> Vec<ScoredKeypoint> {
        if keypoints.is_empty() {
            return Vec::new();
        }
        if min_distance <= 0.0 {
            return keypoints.to_vec();
        }

        let mut sorted_keypoints = keypoints.to_vec();
        sorted_keypoints.sort_by(|a, b| b.response.total_cmp(&a.response));

        let cell = min_distance;
        let max_x = keypoints.iter().map(|k| k.keypoint.x).fold(0.0f32, f32::max);
        let max_y = keypoints.iter().map(|k| k.keypoint.y).fold(0.0f32, f32::max);
        let cols = (max_x / cell) as usize + 1;
        let rows = (max_y / cell) as usize + 1;
        let mut grid: Vec<Vec<usize>> = vec![Vec::new(); cols * rows];

        let mut suppressed: Vec<ScoredKeypoint> = Vec::new();
        let min_distance_sq = min_distance * min_distance;

        for candidate in sorted_keypoints {
            let gx = (candidate.keypoint.x.max(0.0) / cell) as usize;
            let gy = (candidate.keypoint.y.max(0.0) / cell) as usize;

            let mut is_local_max = true;
            'search: for ny in gy.saturating_sub(1)..=(gy + 1).min(rows - 1) {
                for nx in gx.saturating_sub(1)..=(gx + 1).min(cols - 1) {
                    for &idx in &grid[ny * cols + nx] {
                        let existing = &suppressed[idx];
                        let dx = candidate.keypoint.x - existing.keypoint.x;
                        let dy = candidate.keypoint.y - existing.keypoint.y;
                        if dx * dx + dy * dy < min_distance_sq {
                            is_local_max = false;
                            break 'search;
                        }
                    }
                }
            }

            if is_local_max {
                grid[gy * cols + gx].push(suppressed.len());
                suppressed.push(candidate);
            }
        }

        suppressed
    }
}
