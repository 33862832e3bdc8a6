use imgcmp_core::Image;
use crate::types::ScaleLevel;

/// Levels below this size are not worth searching, except the base level
const MIN_LEVEL_SIZE: usize = 32;

/// Image pyramid operations for multi-scale feature detection
pub struct ImagePyramid;

impl ImagePyramid {
    /// Generate scale levels for image pyramid
    pub fn generate_scale_levels(width: usize, height: usize, scale_factor: f32, max_levels: usize) -> Vec<ScaleLevel> {
        let mut levels = vec![ScaleLevel {
            level: 0,
            scale: 1.0,
            width,
            height,
        }];
        let mut current_scale = scale_factor;

        for level in 1..max_levels.max(1) {
            let scaled_width = ((width as f32) / current_scale) as usize;
            let scaled_height = ((height as f32) / current_scale) as usize;

            if scaled_width < MIN_LEVEL_SIZE || scaled_height < MIN_LEVEL_SIZE {
                break;
            }

            levels.push(ScaleLevel {
                level,
                scale: current_scale,
                width: scaled_width,
                height: scaled_height,
            });

            current_scale *= scale_factor;
        }

        levels
    }

    /// Build image pyramid from base image, one image per scale level
    pub fn build_image_pyramid(img: &Image, width: usize, height: usize, scale_levels: &[ScaleLevel]) -> Vec<Image> {
        scale_levels
            .iter()
            .map(|scale_level| {
                if scale_level.level == 0 {
                    img.clone()
                } else {
                    Self::downsample_image(img, width, height, scale_level.width, scale_level.height)
                }
            })
            .collect()
    }

    /// Downsample image using bilinear interpolation at pixel centres
    fn downsample_image(img: &Image, src_width: usize, src_height: usize, target_width: usize, target_height: usize) -> Image {
        let mut downsampled = vec![0u8; target_width * target_height];

        let x_ratio = src_width as f32 / target_width as f32;
        let y_ratio = src_height as f32 / target_height as f32;

        for y in 0..target_height {
            let src_y = ((y as f32 + 0.5) * y_ratio - 0.5).max(0.0);
            for x in 0..target_width {
                let src_x = ((x as f32 + 0.5) * x_ratio - 0.5).max(0.0);
                let value = Self::bilinear_sample(img, src_width, src_height, src_x, src_y);
                downsampled[y * target_width + x] = value.round().clamp(0.0, 255.0) as u8;
            }
        }

        downsampled
    }

    /// Sample image at fractional coordinates using bilinear interpolation
    fn bilinear_sample(img: &Image, width: usize, height: usize, x: f32, y: f32) -> f32 {
        let x1 = (x.floor() as usize).min(width - 1);
        let y1 = (y.floor() as usize).min(height - 1);
        let x2 = (x1 + 1).min(width - 1);
        let y2 = (y1 + 1).min(height - 1);

        let fx = x - x1 as f32;
        let fy = y - y1 as f32;

        let p11 = img[y1 * width + x1] as f32;
        let p12 = img[y1 * width + x2] as f32;
        let p21 = img[y2 * width + x1] as f32;
        let p22 = img[y2 * width + x2] as f32;

        let interpolated_top = p11 * (1.0 - fx) + p12 * fx;
        let interpolated_bottom = p21 * (1.0 - fx) + p22 * fx;

        interpolated_top * (1.0 - fy) + interpolated_bottom * fy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_image_keeps_base_level() {
        let levels = ImagePyramid::generate_scale_levels(20, 20, 1.2, 8);
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].scale, 1.0);
        assert_eq!((levels[0].width, levels[0].height), (20, 20));
    }

    #[test]
    fn test_levels_shrink_and_stop() {
        let levels = ImagePyramid::generate_scale_levels(640, 480, 1.2, 8);
        assert_eq!(levels.len(), 8);
        for pair in levels.windows(2) {
            assert!(pair[1].width < pair[0].width);
            assert!(pair[1].scale > pair[0].scale);
        }

        let levels = ImagePyramid::generate_scale_levels(64, 64, 2.0, 8);
        assert_eq!(levels.len(), 2);
    }

    #[test]
    fn test_zero_max_levels_still_has_base() {
        assert_eq!(ImagePyramid::generate_scale_levels(100, 100, 1.2, 0).len(), 1);
    }

    #[test]
    fn test_pyramid_preserves_uniform_intensity() {
        let (w, h) = (96, 64);
        let img = vec![77u8; w * h];
        let levels = ImagePyramid::generate_scale_levels(w, h, 1.5, 4);
        let pyramid = ImagePyramid::build_image_pyramid(&img, w, h, &levels);

        assert_eq!(pyramid.len(), levels.len());
        for (level, scaled) in levels.iter().zip(&pyramid) {
            assert_eq!(scaled.len(), level.width * level.height);
            assert!(scaled.iter().all(|&p| p == 77));
        }
    }
}
