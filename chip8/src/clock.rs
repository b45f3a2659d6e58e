//! Wall clock gates.
use std::{
    thread,
    time::{Duration, Instant},
};

use crate::constants::*;

/// CPU clock frequency, in hertz (per second)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct Hz(pub u64);

impl From<Hz> for Duration {
    fn from(freq: Hz) -> Self {
        if freq.0 == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(NANOS_IN_SECOND / freq.0)
        }
    }
}

/// Timer to synchronize the thread with a software clock.
///
/// It is designed to work with the cooperative pattern of the
/// outer run loop. Time elapses between calls, and the elapsed
/// time is taken into account when checking for the next tick.
pub(crate) struct Clock {
    last: Instant,
    interval: Duration,
}

impl Clock {
    /// Creates a new clock with the current time as internal state.
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            last: Instant::now(),
            interval,
        }
    }

    /// The 60Hz clock that drives the delay and sound timers.
    pub(crate) fn timer() -> Self {
        Self::new(Duration::from_nanos(CLOCK_CYCLE_TIME))
    }

    /// Set the clock state back to zero.
    pub(crate) fn reset(&mut self) {
        self.reset_at(Instant::now())
    }

    pub(crate) fn reset_at(&mut self, now: Instant) {
        self.last = now;
    }

    /// Checks whether at least one interval has passed since the last tick.
    ///
    /// Only a single tick is reported no matter how much time has passed.
    pub(crate) fn tick_at(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) >= self.interval {
            self.last = now;
            true
        } else {
            false
        }
    }

    /// Block the current thread until the next clock cycle.
    pub(crate) fn wait(&mut self) {
        if self.interval.is_zero() {
            return;
        }

        loop {
            if self.last.elapsed() < self.interval {
                // Sleep does not have enough resolution, and causes
                // the clock to run at 30 FPS.
                //
                // Spinning a loop causes high CPU usage and fan madness.
                //
                // Yielding in a loop is the best alternative.
                thread::yield_now();
            } else {
                // Reset back to zero, rather than trying to catch up.
                //
                // If the VM was paused for debugging, and a large
                // amount of time has elapsed until it is resumed,
                // it should simply continue at the next cycle running
                // at its usual speed.
                self.reset();
                return;
            }
        }
    }
}
