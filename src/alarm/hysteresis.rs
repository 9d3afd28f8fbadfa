/// Per-cycle score above which an anomaly is considered present.
pub const AREA_THRESHOLD: u64 = 300;

/// Saturation cap for the counter during prolonged motion.
pub const DEFAULT_COUNTER_CAP: u32 = 100;

/// What one armed cycle did to the counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Anomaly present, counter incremented.
    Rose,
    /// Anomaly present, counter already at the cap.
    Saturated,
    /// Anomaly absent, counter decremented. An alert attempt is due.
    Drained,
    /// Anomaly absent, counter already at zero.
    Idle,
}

impl Step {
    pub fn emits_alert(self) -> bool {
        matches!(self, Step::Drained)
    }
}

/// Saturating integrator over per-cycle anomaly flags.
///
/// Every cycle where motion has stopped but credit remains emits an alert attempt;
/// only the alert throttle limits how many of those become notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HysteresisCounter {
    value: u32,
    cap: u32,
}

impl HysteresisCounter {
    pub fn new() -> Self {
        Self::with_cap(DEFAULT_COUNTER_CAP)
    }

    /// A cap of zero is raised to one.
    pub fn with_cap(cap: u32) -> Self {
        Self {
            value: 0,
            cap: cap.max(1),
        }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    pub fn step(&mut self, anomaly: bool) -> Step {
        if anomaly {
            if self.value >= self.cap {
                Step::Saturated
            } else {
                self.value += 1;
                Step::Rose
            }
        } else if self.value > 0 {
            self.value -= 1;
            Step::Drained
        } else {
            Step::Idle
        }
    }

    pub fn reset(&mut self) {
        self.value = 0;
    }
}

impl Default for HysteresisCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rises_then_drains_with_alerts() {
        let mut counter = HysteresisCounter::new();
        assert_eq!(counter.step(true), Step::Rose);
        assert_eq!(counter.step(true), Step::Rose);
        assert_eq!(counter.value(), 2);

        let step = counter.step(false);
        assert_eq!(step, Step::Drained);
        assert!(step.emits_alert());
        assert_eq!(counter.step(false), Step::Drained);
        assert_eq!(counter.step(false), Step::Idle);
        assert_eq!(counter.value(), 0);
    }

    #[test]
    fn stasis_never_alerts() {
        let mut counter = HysteresisCounter::new();
        for _ in 0..50 {
            assert!(!counter.step(false).emits_alert());
        }
        assert_eq!(counter.value(), 0);
    }

    #[test]
    fn saturates_at_cap() {
        let mut counter = HysteresisCounter::with_cap(3);
        for _ in 0..10 {
            counter.step(true);
        }
        assert_eq!(counter.value(), 3);
        assert_eq!(counter.step(true), Step::Saturated);
        assert_eq!(counter.step(false), Step::Drained);
        assert_eq!(counter.value(), 2);
    }

    #[test]
    fn zero_cap_is_raised_to_one() {
        let mut counter = HysteresisCounter::with_cap(0);
        assert_eq!(counter.cap(), 1);
        assert_eq!(counter.step(true), Step::Rose);
        assert_eq!(counter.step(true), Step::Saturated);
    }

    #[test]
    fn changes_by_at_most_one_per_step() {
        let mut counter = HysteresisCounter::with_cap(5);
        let pattern = [true, true, false, true, true, true, true, true, true, false, false];
        let mut prev = counter.value();
        for anomaly in pattern {
            counter.step(anomaly);
            assert!(counter.value().abs_diff(prev) <= 1);
            prev = counter.value();
        }
    }

    #[test]
    fn reset_clears_value() {
        let mut counter = HysteresisCounter::new();
        counter.step(true);
        counter.step(true);
        counter.reset();
        assert_eq!(counter.value(), 0);
    }
}
