use std::time::{Duration, Instant};

/// Minimum spacing between two visible notifications.
pub const ALERT_INTERVAL: Duration = Duration::from_secs(10);

/// Minimum-interval gate on notifications.
///
/// Not shared: the alert dispatcher's consumer thread owns the only instance, so the
/// check-and-set in `attempt` is serialized by construction.
#[derive(Clone, Debug)]
pub struct AlertThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl AlertThrottle {
    pub fn new() -> Self {
        Self::with_interval(ALERT_INTERVAL)
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn last_fired(&self) -> Option<Instant> {
        self.last
    }

    /// Returns true (and records `now`) when the attempt may notify.
    pub fn attempt(&mut self, now: Instant) -> bool {
        let fires = match self.last {
            None => true,
            Some(last) => now
                .checked_duration_since(last)
                .is_some_and(|elapsed| elapsed >= self.interval),
        };
        if fires {
            self.last = Some(now);
        }
        fires
    }
}

impl Default for AlertThrottle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_attempt_fires() {
        let mut throttle = AlertThrottle::new();
        let now = Instant::now();
        assert!(throttle.attempt(now));
        assert_eq!(throttle.last_fired(), Some(now));
    }

    #[test]
    fn attempts_inside_window_are_suppressed() {
        let mut throttle = AlertThrottle::new();
        let t0 = Instant::now();
        assert!(throttle.attempt(t0));
        assert!(!throttle.attempt(t0 + Duration::from_secs(3)));
        assert!(!throttle.attempt(t0 + Duration::from_millis(9_999)));
        assert_eq!(throttle.last_fired(), Some(t0));
        assert!(throttle.attempt(t0 + Duration::from_secs(11)));
    }

    #[test]
    fn exactly_one_interval_later_fires() {
        let mut throttle = AlertThrottle::new();
        let t0 = Instant::now();
        assert!(throttle.attempt(t0));
        assert!(throttle.attempt(t0 + ALERT_INTERVAL));
    }

    #[test]
    fn out_of_order_instants_never_fire() {
        let mut throttle = AlertThrottle::with_interval(Duration::from_secs(1));
        let t0 = Instant::now() + Duration::from_secs(5);
        assert!(throttle.attempt(t0));
        assert!(!throttle.attempt(t0 - Duration::from_secs(3)));
    }
}
