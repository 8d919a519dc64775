//! Drive manager module
//!
//! The drive manager runs the single-shot drive test: a fixed-period control
//! loop which holds the vehicle at a target speed while integrating its
//! attitude from IMU data, until the vehicle reaches a target position or a
//! tick ceiling expires. One manager runs one test, there is no re-arm.
//!
//! Each tick the manager:
//!
//! 1. blocks on the [`util::time::Ticker`] for the tick period,
//! 2. polls one vehicle [`Sample`] and one IMU batch from the
//!    [`SampleSource`],
//! 3. computes a throttle demand from the speed error and issues it to the
//!    [`Actuator`],
//! 4. integrates the IMU batch into the cumulative attitude,
//! 5. appends the tick to the trace,
//! 6. evaluates the termination conditions, proximity to the target before
//!    the tick ceiling.
//!
//! Whichever way the loop exits, the vehicle is commanded to stop (zero
//! throttle, full brake). On the nominal exits the stop must be delivered,
//! on the error exits delivery is best-effort and failure is only logged.
//!
//! [`Sample`]: sim_if::eqpt::veh::Sample
//! [`SampleSource`]: sim_if::eqpt::veh::SampleSource
//! [`Actuator`]: sim_if::eqpt::veh::Actuator

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Mode of the drive manager.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum DriveMode {
    /// The drive test is in progress.
    Running,

    /// The drive test has stopped for the given cause.
    Stopped(StopCause),
}

/// Cause of a nominal drive test stop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum StopCause {
    /// The vehicle came within the proximity threshold of the target
    /// position.
    TargetProximity,

    /// The tick ceiling expired before the target was reached.
    TickLimit,
}

/// Possible errors that can occur during DriveMgr operation.
#[derive(Debug, thiserror::Error)]
pub enum DriveMgrError {
    #[error("Could not load the drive manager parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("The target speed must be non-negative and finite, found {0} m/s")]
    InvalidTargetSpeed(f64),

    #[error("The tick period must be positive and finite, found {0} s")]
    InvalidTickPeriod(f64),

    #[error("The maximum tick count must be at least 1")]
    ZeroMaxTicks,

    #[error("The proximity threshold must be non-negative and finite, found {0} m")]
    InvalidProximityThreshold(f64),

    #[error("The target position must be finite, found {0:?}")]
    NonFiniteTargetPosition([f64; 3]),

    #[error("Invalid speed control parameters: {0}")]
    SpeedCtrlError(crate::speed_ctrl::SpeedCtrlError),

    #[error("Invalid attitude estimation parameters: {0}")]
    AttEstError(crate::att_est::AttEstError),

    #[error("Cannot process a tick, the drive test is not running")]
    NotRunning,

    #[error("The sample source is unavailable: {0}")]
    SourceUnavailable(sim_if::eqpt::veh::SourceError),

    #[error("The drive actuator is unavailable: {0}")]
    ActuatorUnavailable(sim_if::eqpt::veh::ActuatorError),
}
