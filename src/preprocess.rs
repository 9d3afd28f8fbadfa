//! Grayscale + Gaussian blur preprocessing.
//!
//! Two profiles: a heavy blur for seeding the baseline (it has to stay stable across
//! many cycles) and a light blur for per-cycle comparison frames (so real motion
//! survives). All functions are pure.

use image::imageops;

use crate::frame::{Frame, RawFrame};

/// Square Gaussian kernel, side length in pixels (odd).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlurProfile {
    pub kernel: u32,
}

impl BlurProfile {
    /// 21x21, used when seeding the baseline.
    pub const BASELINE: BlurProfile = BlurProfile { kernel: 21 };
    /// 5x5, used for every armed cycle.
    pub const COMPARISON: BlurProfile = BlurProfile { kernel: 5 };

    /// Standard deviation implied by the kernel size.
    pub fn sigma(self) -> f32 {
        let k = self.kernel.max(1) as f32;
        0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8
    }
}

pub fn grayscale(frame: &RawFrame) -> Frame {
    Frame::from_gray(imageops::grayscale(frame.as_image()))
}

pub fn blur(frame: &Frame, profile: BlurProfile) -> Frame {
    Frame::from_gray(imageops::blur(frame.as_image(), profile.sigma()))
}

/// Grayscale, then 21x21 blur.
pub fn to_baseline_representation(frame: &RawFrame) -> Frame {
    blur(&grayscale(frame), BlurProfile::BASELINE)
}

/// Grayscale, then 5x5 blur.
pub fn to_comparison_representation(frame: &RawFrame) -> Frame {
    blur(&grayscale(frame), BlurProfile::COMPARISON)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(width: u32, height: u32) -> RawFrame {
        RawFrame::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                [255, 255, 255]
            } else {
                [0, 0, 0]
            }
        })
    }

    fn spread(frame: &Frame) -> u8 {
        let max = frame.samples().iter().copied().max().unwrap_or(0);
        let min = frame.samples().iter().copied().min().unwrap_or(0);
        max - min
    }

    #[test]
    fn sigma_follows_kernel_size() {
        assert!((BlurProfile::BASELINE.sigma() - 3.5).abs() < 1e-5);
        assert!((BlurProfile::COMPARISON.sigma() - 1.1).abs() < 1e-5);
    }

    #[test]
    fn representations_keep_dimensions() {
        let frame = checkerboard(40, 30);
        assert_eq!(to_baseline_representation(&frame).dimensions(), (40, 30));
        assert_eq!(to_comparison_representation(&frame).dimensions(), (40, 30));
    }

    #[test]
    fn baseline_blur_is_heavier_than_comparison_blur() {
        let frame = checkerboard(40, 30);
        let heavy = to_baseline_representation(&frame);
        let light = to_comparison_representation(&frame);
        assert!(spread(&heavy) <= spread(&light));
        assert!(spread(&light) < 255);
    }

    #[test]
    fn uniform_frames_stay_uniform() {
        let frame = RawFrame::from_fn(16, 16, |_, _| [90, 90, 90]);
        let gray = to_comparison_representation(&frame);
        assert!(gray.samples().iter().all(|&v| v.abs_diff(90) <= 2));
    }

    #[test]
    fn preprocessing_is_pure() {
        let frame = checkerboard(20, 20);
        assert_eq!(
            to_comparison_representation(&frame),
            to_comparison_representation(&frame)
        );
    }
}
