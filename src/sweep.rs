use std::time::{Duration, Instant};

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Decides when the next overdue sweep should run. Starts out due so the
/// first sweep happens right away.
#[derive(Debug, Clone)]
pub struct SweepTimer {
    interval: Duration,
    last_run: Option<Instant>,
}

impl SweepTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.time_until_due(now).is_zero()
    }

    pub fn mark_run(&mut self, now: Instant) {
        self.last_run = Some(now);
    }

    pub fn time_until_due(&self, now: Instant) -> Duration {
        match self.last_run {
            None => Duration::ZERO,
            Some(last) => (last + self.interval).saturating_duration_since(now),
        }
    }
}

impl Default for SweepTimer {
    fn default() -> Self {
        Self::new(DEFAULT_SWEEP_INTERVAL)
    }
}
