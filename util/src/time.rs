//! General time utility functions and tick pacing

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::thread;
use std::time::{Duration, Instant};

use chrono;
use log::warn;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Paces a cyclic executive.
///
/// A `Ticker` is waited on at the top of every cycle. Implementations decide
/// how long to block for, which lets tests drive a loop at full speed with
/// [`NoDelayTicker`] while flight code uses [`WallClockTicker`]. Timing never
/// feeds any integration maths, all delta-times come from parameters.
pub trait Ticker {
    /// Block until the next tick boundary.
    fn wait(&mut self);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A [`Ticker`] which holds a fixed real-time period between ticks.
///
/// Each wait sleeps for the remainder of the period measured from the end of
/// the previous wait. If the cycle overran the period a warning is logged and
/// the next tick starts immediately.
pub struct WallClockTicker {
    period: Duration,

    /// Instant at which the previous wait returned, `None` before the first
    /// wait.
    last_tick: Option<Instant>,

    /// Number of consecutive tick overruns
    num_consec_overruns: u64,
}

/// A [`Ticker`] which never blocks, used to run loops at full speed in tests.
pub struct NoDelayTicker;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WallClockTicker {
    /// Create a new ticker with the given period in seconds.
    pub fn new(period_s: f64) -> Self {
        Self {
            period: Duration::from_secs_f64(period_s),
            last_tick: None,
            num_consec_overruns: 0,
        }
    }
}

impl Ticker for WallClockTicker {
    fn wait(&mut self) {
        match self.last_tick {
            Some(t0) => {
                let elapsed = Instant::now() - t0;

                match self.period.checked_sub(elapsed) {
                    Some(d) => {
                        self.num_consec_overruns = 0;
                        thread::sleep(d);
                    }
                    None => {
                        self.num_consec_overruns += 1;
                        warn!(
                            "Tick overran by {:.06} s ({} consecutive)",
                            elapsed.as_secs_f64() - self.period.as_secs_f64(),
                            self.num_consec_overruns
                        );
                    }
                }
            }
            // First tick happens one full period after construction
            None => thread::sleep(self.period),
        }

        self.last_tick = Some(Instant::now());
    }
}

impl Ticker for NoDelayTicker {
    fn wait(&mut self) {}
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}
