use image::GrayImage;

use crate::detect::result::{AnomalyScore, DifferenceMask, Observation, MASK_ON};
use crate::frame::Frame;

/// Absolute per-sample difference a sample must exceed to count as changed.
pub const INTENSITY_DELTA: u8 = 25;

/// Current frame and baseline disagree on size. Always a setup error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DimensionMismatch {
    pub expected: (u32, u32),
    pub actual: (u32, u32),
}

impl std::fmt::Display for DimensionMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "frame is {}x{} but baseline is {}x{}",
            self.actual.0, self.actual.1, self.expected.0, self.expected.1
        )
    }
}

impl std::error::Error for DimensionMismatch {}

/// Threshold `|current - baseline|` at `delta`: strictly greater is on.
pub fn difference_mask(
    current: &Frame,
    baseline: &Frame,
    delta: u8,
) -> Result<DifferenceMask, DimensionMismatch> {
    let mismatch = DimensionMismatch {
        expected: baseline.dimensions(),
        actual: current.dimensions(),
    };
    if mismatch.expected != mismatch.actual {
        return Err(mismatch);
    }

    let (width, height) = current.dimensions();
    let samples: Vec<u8> = current
        .samples()
        .iter()
        .zip(baseline.samples())
        .map(|(&a, &b)| if a.abs_diff(b) > delta { MASK_ON } else { 0 })
        .collect();
    let image = GrayImage::from_raw(width, height, samples).ok_or(mismatch)?;
    Ok(DifferenceMask::from_gray(image))
}

/// Score `current` against `baseline` with the default intensity delta.
pub fn score(
    current: &Frame,
    baseline: &Frame,
) -> Result<(AnomalyScore, DifferenceMask), DimensionMismatch> {
    let mask = difference_mask(current, baseline, INTENSITY_DELTA)?;
    Ok((mask.score(), mask))
}

/// Holds the rolling baseline.
///
/// Every successful `observe` replaces the baseline with the observed frame, so the
/// detector only ever compares consecutive armed frames (apart from the very first,
/// which is compared against the seeded baseline). A dimension mismatch leaves the
/// baseline untouched.
#[derive(Clone, Debug)]
pub struct MotionDetector {
    baseline: Frame,
    delta: u8,
    observations: u64,
}

impl MotionDetector {
    pub fn new(baseline: Frame) -> Self {
        Self {
            baseline,
            delta: INTENSITY_DELTA,
            observations: 0,
        }
    }

    pub fn with_delta(mut self, delta: u8) -> Self {
        self.delta = delta;
        self
    }

    pub fn baseline(&self) -> &Frame {
        &self.baseline
    }

    pub fn observations(&self) -> u64 {
        self.observations
    }

    pub fn observe(&mut self, current: Frame) -> Result<Observation, DimensionMismatch> {
        let mask = difference_mask(&current, &self.baseline, self.delta)?;
        let score = mask.score();
        self.baseline = current;
        self.observations += 1;
        log::trace!(
            "observation #{}: score={} lit={}",
            self.observations,
            score,
            mask.lit_count()
        );
        Ok(Observation { score, mask })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_patch(width: u32, height: u32, patch: &[(u32, u32)], value: u8) -> Frame {
        let mut samples = vec![100u8; (width * height) as usize];
        for &(x, y) in patch {
            samples[(y * width + x) as usize] = value;
        }
        Frame::from_samples(width, height, samples).unwrap()
    }

    #[test]
    fn threshold_is_strictly_greater_than_delta() {
        let baseline = Frame::filled(2, 1, 100);
        let current = Frame::from_samples(2, 1, vec![125, 126]).unwrap();
        let mask = difference_mask(&current, &baseline, INTENSITY_DELTA).unwrap();
        assert_eq!(mask.samples(), &[0, MASK_ON]);
    }

    #[test]
    fn difference_is_absolute() {
        let baseline = Frame::filled(2, 1, 100);
        let current = Frame::from_samples(2, 1, vec![60, 140]).unwrap();
        let (score, mask) = score(&current, &baseline).unwrap();
        assert_eq!(mask.lit_count(), 2);
        assert_eq!(score, AnomalyScore(2 * MASK_ON as u64));
    }

    #[test]
    fn identical_frames_score_zero() {
        let frame = Frame::filled(8, 8, 77);
        let (score, mask) = score(&frame, &frame).unwrap();
        assert_eq!(score.value(), 0);
        assert_eq!(mask.lit_count(), 0);
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let baseline = Frame::filled(8, 8, 0);
        let current = Frame::filled(8, 6, 0);
        let err = score(&current, &baseline).unwrap_err();
        assert_eq!(err.expected, (8, 8));
        assert_eq!(err.actual, (8, 6));
    }

    #[test]
    fn observe_rolls_the_baseline() {
        let first = Frame::filled(4, 4, 100);
        let moved = frame_with_patch(4, 4, &[(0, 0), (1, 1), (2, 2)], 200);
        let mut detector = MotionDetector::new(first);

        let obs = detector.observe(moved.clone()).unwrap();
        assert_eq!(obs.mask.lit_count(), 3);
        assert_eq!(detector.baseline(), &moved);

        // Same frame again: baseline already caught up.
        let obs = detector.observe(moved).unwrap();
        assert_eq!(obs.score.value(), 0);
        assert_eq!(detector.observations(), 2);
    }

    #[test]
    fn mismatch_keeps_previous_baseline() {
        let baseline = Frame::filled(4, 4, 10);
        let mut detector = MotionDetector::new(baseline.clone());
        assert!(detector.observe(Frame::filled(5, 4, 10)).is_err());
        assert_eq!(detector.baseline(), &baseline);
        assert_eq!(detector.observations(), 0);
    }

    #[test]
    fn custom_delta_is_honored() {
        let mut detector = MotionDetector::new(Frame::filled(1, 1, 100)).with_delta(5);
        let obs = detector.observe(Frame::filled(1, 1, 110)).unwrap();
        assert_eq!(obs.mask.lit_count(), 1);
    }
}
