//! Motion detection against a rolling baseline.
//!
//! The detector compares each comparison frame with the baseline sample by sample,
//! thresholds the absolute difference, and sums the binary mask into an anomaly
//! score. The scored frame then becomes the baseline for the next cycle.

mod motion;
mod result;

pub use motion::{difference_mask, score, DimensionMismatch, MotionDetector, INTENSITY_DELTA};
pub use result::{AnomalyScore, DifferenceMask, Observation, MASK_ON};
