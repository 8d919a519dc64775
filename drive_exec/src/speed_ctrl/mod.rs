//! Speed control module
//!
//! Converts the error between the target and current speed over ground into a
//! throttle demand for the vehicle. Two control laws are supported, selected
//! by parameter:
//!
//! - `Proportional` - a proportional term plus a fixed cruise bias, so the
//!   vehicle holds a steady throttle at zero error rather than stalling.
//! - `Pid` - a full proportional-integral-derivative law with no bias.
//!
//! Whatever the law, the demand is saturated to the actuator's `[0, 1]`
//! throttle range. Saturation is nominal behaviour and is reported through
//! the demand's `saturated` flag, never as an error.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Lower bound of the throttle demand.
pub const THROTTLE_MIN: f64 = 0.0;

/// Upper bound of the throttle demand.
pub const THROTTLE_MAX: f64 = 1.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during SpeedCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum SpeedCtrlError {
    #[error("The {0} gain must be non-negative and finite, found {1}")]
    InvalidGain(&'static str, f64),

    #[error("Base throttle ({0}) is outside the valid range [0, 1]")]
    BaseThrottleOutOfRange(f64),
}
