//! Periodic task scheduling for producer loops

use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};

use crate::error::SchedulerError;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Period of a loop running at `hz`
///
/// Whole seconds and the nanosecond remainder of `1 / hz`.
pub fn period_from_frequency(hz: f64) -> Result<Duration, SchedulerError> {
    if !hz.is_finite() || hz <= 0.0 {
        return Err(SchedulerError::InvalidFrequency(hz));
    }

    let period = 1.0 / hz;
    if !period.is_finite() || period >= u64::MAX as f64 {
        return Err(SchedulerError::InvalidFrequency(hz));
    }
    let secs = period.trunc();
    let nanos = ((period - secs) * NANOS_PER_SEC) as u32;
    Ok(Duration::new(secs as u64, nanos.min(999_999_999)))
}

/// Suspend the current task for `duration`
pub async fn sleep_for(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Fixed-rate loop pacing
///
/// The first cycle starts immediately; a late cycle pushes the schedule back
/// rather than bursting to catch up.
#[derive(Debug)]
pub struct PeriodicTask {
    period: Duration,
    interval: Interval,
    cycle: u64,
}

impl PeriodicTask {
    /// Must be called from within a Tokio runtime.
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            period,
            interval,
            cycle: 0,
        }
    }

    pub fn from_frequency(hz: f64) -> Result<Self, SchedulerError> {
        Ok(Self::new(period_from_frequency(hz)?))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Cycles started so far
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Wait for the start of the next cycle and return its 1-based number
    pub async fn wait_next_cycle(&mut self) -> u64 {
        self.interval.tick().await;
        self.cycle += 1;
        self.cycle
    }
}
