use std::time::Duration;

/// Fixed-rate clock fed with elapsed host time.
#[derive(Debug, Clone)]
pub struct Timer {
    interval: Duration,
    accumulated: Duration,
}

impl Timer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            accumulated: Duration::ZERO,
        }
    }

    pub fn from_hz(hz: u32) -> Self {
        Self::new(Duration::from_secs(1) / hz.max(1))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn advance(&mut self, elapsed: Duration) {
        self.accumulated += elapsed;
    }

    /// Consume one interval if it has elapsed. At most one interval of
    /// backlog is kept.
    pub fn tick(&mut self) -> bool {
        if self.accumulated >= self.interval {
            self.accumulated = (self.accumulated - self.interval).min(self.interval);
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
    }
}
