use imgcmp_core::{Descriptor, Frame, Keypoint};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;
use std::sync::OnceLock;

const DESCRIPTOR_SIZE: usize = 32;
const DESCRIPTOR_BITS: usize = DESCRIPTOR_SIZE * 8;

/// Side of the square patch the sampling pattern is drawn from
pub const PATCH_SIZE: usize = 31;

/// Two sample offsets relative to the keypoint: (x1, y1, x2, y2)
pub type SamplePair = (i32, i32, i32, i32);

/// Seed of the sampling pattern; changing it invalidates stored descriptors
const PATTERN_SEED: u64 = 0x6272_6965_665f_7061;

/// Fixed sampling pattern shared by every generator.
///
/// Offsets follow an isotropic Gaussian with sigma = PATCH_SIZE / 5, clamped
/// to the patch radius (BRIEF pattern G II). ChaCha8 with a fixed seed keeps
/// the pattern identical across runs and machines.
pub fn sampling_pattern() -> &'static [SamplePair; DESCRIPTOR_BITS] {
    static PATTERN: OnceLock<[SamplePair; DESCRIPTOR_BITS]> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let mut rng = ChaCha8Rng::seed_from_u64(PATTERN_SEED);
        let sigma = PATCH_SIZE as f64 / 5.0;
        let radius = (PATCH_SIZE / 2) as i32;
        let mut sample = || {
            let z: f64 = rng.sample(StandardNormal);
            ((z * sigma).round() as i32).clamp(-radius, radius)
        };

        let mut pattern = [(0, 0, 0, 0); DESCRIPTOR_BITS];
        for pair in pattern.iter_mut() {
            loop {
                let candidate = (sample(), sample(), sample(), sample());
                // A pair comparing a pixel with itself carries no information
                if (candidate.0, candidate.1) != (candidate.2, candidate.3) {
                    *pair = candidate;
                    break;
                }
            }
        }
        pattern
    })
}

/// Steered BRIEF: the sampling pattern is rotated by each keypoint's angle
/// and scaled by its pyramid scale.
///
/// Input frames should already be smoothed; single-pixel comparisons on a
/// raw image are dominated by noise.
#[derive(Debug, Clone, Copy)]
pub struct BriefGenerator {
    pattern: &'static [SamplePair; DESCRIPTOR_BITS],
}

impl Default for BriefGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl BriefGenerator {
    pub fn new() -> Self {
        Self {
            pattern: sampling_pattern(),
        }
    }

    /// One descriptor per keypoint, in keypoint order
    pub fn generate_descriptors(&self, frame: &Frame, kps: &[Keypoint]) -> Vec<Descriptor> {
        if frame.is_empty() {
            return vec![[0u8; DESCRIPTOR_SIZE]; kps.len()];
        }

        kps.par_iter()
            .map(|kp| self.describe(frame, kp))
            .collect()
    }

    fn describe(&self, frame: &Frame, kp: &Keypoint) -> Descriptor {
        let (s, c) = kp.angle.sin_cos();
        let (s, c) = (s * kp.scale, c * kp.scale);
        let (cx, cy) = (kp.x, kp.y);
        let mut d = [0u8; DESCRIPTOR_SIZE];

        for (i, &(dx1, dy1, dx2, dy2)) in self.pattern.iter().enumerate() {
            let (rx1, ry1) = (
                cx + c * dx1 as f32 - s * dy1 as f32,
                cy + s * dx1 as f32 + c * dy1 as f32,
            );
            let (rx2, ry2) = (
                cx + c * dx2 as f32 - s * dy2 as f32,
                cy + s * dx2 as f32 + c * dy2 as f32,
            );

            let val1 = Self::bilinear_sample(frame, rx1, ry1);
            let val2 = Self::bilinear_sample(frame, rx2, ry2);

            let bit = (val1 < val2) as u8;
            d[i / 8] |= bit << (i % 8);
        }
        d
    }

    /// Bilinear interpolation for subpixel sampling, clamped at the border
    fn bilinear_sample(frame: &Frame, x: f32, y: f32) -> f32 {
        let (w, h) = (frame.width, frame.height);
        let img = &frame.pixels;
        let x0 = x.floor();
        let y0 = y.floor();
        let x1 = x0 + 1.0;
        let y1 = y0 + 1.0;

        if x0 < 0.0 || y0 < 0.0 || x1 >= w as f32 || y1 >= h as f32 {
            let cx = x.round().clamp(0.0, (w - 1) as f32) as usize;
            let cy = y.round().clamp(0.0, (h - 1) as f32) as usize;
            return img[cy * w + cx] as f32;
        }

        let dx = x - x0;
        let dy = y - y0;

        let x0_idx = x0 as usize;
        let y0_idx = y0 as usize;
        let x1_idx = x1 as usize;
        let y1_idx = y1 as usize;

        let p00 = img[y0_idx * w + x0_idx] as f32;
        let p10 = img[y0_idx * w + x1_idx] as f32;
        let p01 = img[y1_idx * w + x0_idx] as f32;
        let p11 = img[y1_idx * w + x1_idx] as f32;

        let top = p00 * (1.0 - dx) + p10 * dx;
        let bottom = p01 * (1.0 - dx) + p11 * dx;

        top * (1.0 - dy) + bottom * dy
    }
}
