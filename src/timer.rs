// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Wall-clock pacing for the timers and the instruction stream
//!
//! The host loop owns one [Ticker] per cadence (60 Hz timers, N Hz frames),
//! and polls each with the current time. Both run on the same thread,
//! so the timers are never touched while an instruction executes.

use std::time::{Duration, Instant};

/// Rate the delay and sound timers count down at
pub const TIMER_HZ: u32 = 60;

/// Most ticks [Ticker::ticks] will report at once, after a long stall
const MAX_CATCHUP: u32 = 8;

/// Counts whole periods of a fixed rate as they elapse
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ticker {
    period: Duration,
    next: Instant,
}

impl Ticker {
    /// Creates a [Ticker] firing `rate` times per second, starting now
    ///
    /// A `rate` of 0 is treated as 1
    pub fn new(rate: u32) -> Self {
        Self::starting_at(rate, Instant::now())
    }

    /// Creates a [Ticker] firing `rate` times per second, starting at `start`
    pub fn starting_at(rate: u32, start: Instant) -> Self {
        let period = Duration::from_secs(1) / rate.max(1);
        Ticker {
            period,
            next: start + period,
        }
    }

    /// Gets the length of one tick
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Returns the number of whole periods that elapsed before `now`,
    /// since the last call.
    ///
    /// After a stall, at most a handful of ticks are reported, and the rest dropped.
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// # use std::time::{Duration, Instant};
    /// let start = Instant::now();
    /// let mut ticker = Ticker::starting_at(60, start);
    /// assert_eq!(0, ticker.ticks(start));
    /// assert_eq!(2, ticker.ticks(start + Duration::from_millis(34)));
    /// assert_eq!(0, ticker.ticks(start + Duration::from_millis(34)));
    /// ```
    pub fn ticks(&mut self, now: Instant) -> u32 {
        let mut ticks = 0;
        while self.next <= now {
            ticks += 1;
            self.next += self.period;
            if ticks == MAX_CATCHUP {
                // Drop the backlog
                if self.next <= now {
                    self.next = now + self.period;
                }
                break;
            }
        }
        ticks
    }

    /// Gets the time remaining until the next tick
    pub fn remaining(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }
}
