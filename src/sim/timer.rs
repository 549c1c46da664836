//! Accumulator-driven stepping
//!
//! Converts variable frame deltas into whole simulation steps. Elapsed time is
//! added to an accumulator and drained in `period`-sized chunks; the fractional
//! remainder carries over to the next call.

use serde::{Deserialize, Serialize};

/// Fixed-period step accumulator (milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepTimer {
    period: f64,
    elapsed: f64,
}

impl StepTimer {
    pub fn new(period: f64) -> Self {
        Self {
            period,
            elapsed: 0.0,
        }
    }

    /// Milliseconds per step
    pub fn period(&self) -> f64 {
        self.period
    }

    /// Change the step length, keeping accumulated time
    pub fn set_period(&mut self, period: f64) {
        self.period = period;
    }

    /// Accumulated, not yet consumed time
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Add elapsed time (negative or NaN deltas are ignored)
    pub fn accumulate(&mut self, dt: f64) {
        if dt > 0.0 {
            self.elapsed += dt;
        }
    }

    /// Add elapsed time but never bank more than one step
    pub fn charge(&mut self, dt: f64) {
        self.accumulate(dt);
        self.elapsed = self.elapsed.min(self.period);
    }

    /// Consume one step if enough time has accumulated
    pub fn try_step(&mut self) -> bool {
        if self.elapsed >= self.period {
            self.elapsed -= self.period;
            true
        } else {
            false
        }
    }

    /// Accumulate then consume at most one step
    pub fn tick(&mut self, dt: f64) -> bool {
        self.accumulate(dt);
        self.try_step()
    }

    /// Accumulate then consume every whole step available
    pub fn drain(&mut self, dt: f64) -> u32 {
        self.accumulate(dt);
        let mut steps = 0;
        while self.try_step() {
            steps += 1;
        }
        steps
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}
