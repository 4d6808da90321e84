use std::time::Duration;

/// Default pass cadence, matching the fastest screens of the host.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_millis(150);

/// Gates work to a minimum interval of accumulated host time.
///
/// The host reports elapsed real time each frame; a pass is allowed once the
/// accumulated time reaches the interval, after which the accumulator
/// restarts from zero. Surplus time is dropped, so a long frame yields one
/// pass, not several.
#[derive(Debug, Clone)]
pub struct ScanScheduler {
    interval: Duration,
    accumulated: Duration,
}

impl ScanScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            accumulated: Duration::ZERO,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn accumulated(&self) -> Duration {
        self.accumulated
    }

    /// Add elapsed time. Returns the time covered by the pass when one is due.
    ///
    /// A frame that reports no elapsed time never allows a pass.
    pub fn advance(&mut self, elapsed: Duration) -> Option<Duration> {
        if elapsed.is_zero() {
            return None;
        }
        self.accumulated += elapsed;
        if self.accumulated < self.interval {
            return None;
        }
        let covered = self.accumulated;
        self.accumulated = Duration::ZERO;
        Some(covered)
    }

    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
    }
}

impl Default for ScanScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_INTERVAL)
    }
}
