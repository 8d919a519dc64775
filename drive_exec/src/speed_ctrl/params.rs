//! Parameters structure for SpeedCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::SpeedCtrlError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Speed control.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Params {
    /// The control law used to compute the throttle demand.
    pub control_law: ControlLaw,

    /// Proportional gain.
    ///
    /// Units: throttle/(meters/second)
    pub k_p: f64,

    /// Integral gain. Only used by the `Pid` control law.
    ///
    /// Units: throttle/meters
    pub k_i: f64,

    /// Derivative gain. Only used by the `Pid` control law.
    ///
    /// Units: throttle/(meters/second^2)
    pub k_d: f64,

    /// Fixed cruise bias added to the proportional term under the
    /// `Proportional` control law, so that the vehicle holds speed at zero
    /// error. Takes no part in the `Pid` law.
    ///
    /// Units: throttle
    pub base_throttle: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Selects the control law used by SpeedCtrl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlLaw {
    /// Proportional term plus the fixed cruise bias.
    Proportional,

    /// Full proportional-integral-derivative law, no bias.
    Pid,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check the parameters are usable, rejecting gains and cruise biases
    /// outside their valid ranges.
    ///
    /// Each guard tests for membership of the valid range, so NaN (which
    /// fails every ordered comparison) is rejected too.
    pub fn validate(&self) -> Result<(), SpeedCtrlError> {
        if !(self.k_p >= 0.0 && self.k_p.is_finite()) {
            return Err(SpeedCtrlError::InvalidGain("k_p", self.k_p));
        }
        if !(self.k_i >= 0.0 && self.k_i.is_finite()) {
            return Err(SpeedCtrlError::InvalidGain("k_i", self.k_i));
        }
        if !(self.k_d >= 0.0 && self.k_d.is_finite()) {
            return Err(SpeedCtrlError::InvalidGain("k_d", self.k_d));
        }
        if !(self.base_throttle >= 0.0 && self.base_throttle <= 1.0) {
            return Err(SpeedCtrlError::BaseThrottleOutOfRange(self.base_throttle));
        }

        Ok(())
    }
}

impl Default for ControlLaw {
    fn default() -> Self {
        ControlLaw::Proportional
    }
}
