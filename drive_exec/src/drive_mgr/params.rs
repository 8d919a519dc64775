//! Parameters for the drive manager module

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use super::DriveMgrError;
use crate::{att_est, speed_ctrl};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the drive manager module.
///
/// This is the whole configuration surface of a drive test, including the
/// nested parameters of the modules the manager owns.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Params {
    /// Target speed over ground the controller should hold.
    ///
    /// Units: meters/second
    pub target_speed_mps: f64,

    /// Fixed period of the control tick.
    ///
    /// Units: seconds
    pub tick_period_s: f64,

    /// Maximum number of control ticks before the test is stopped.
    pub max_ticks: u64,

    /// Position of the drive target in the simulator's world frame.
    ///
    /// Units: meters
    pub target_position_m: [f64; 3],

    /// Distance from the target position at which the test is considered
    /// complete.
    ///
    /// Units: meters
    pub proximity_threshold_m: f64,

    /// Parameters for the speed control module.
    pub speed_ctrl: speed_ctrl::Params,

    /// Parameters for the attitude estimation module.
    pub att_est: att_est::Params,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check the parameters for validity, returning an error describing the
    /// first invalid item found.
    ///
    /// Each guard tests for membership of the valid range, so NaN (which
    /// fails every ordered comparison) is rejected too.
    ///
    /// The nested module parameters are checked too, so a manager with a
    /// valid `Params` can construct its modules without further checks.
    pub fn validate(&self) -> Result<(), DriveMgrError> {
        if !(self.target_speed_mps >= 0.0 && self.target_speed_mps.is_finite()) {
            return Err(DriveMgrError::InvalidTargetSpeed(self.target_speed_mps));
        }
        if !(self.tick_period_s > 0.0 && self.tick_period_s.is_finite()) {
            return Err(DriveMgrError::InvalidTickPeriod(self.tick_period_s));
        }
        if self.max_ticks == 0 {
            return Err(DriveMgrError::ZeroMaxTicks);
        }
        if !(self.proximity_threshold_m >= 0.0 && self.proximity_threshold_m.is_finite()) {
            return Err(DriveMgrError::InvalidProximityThreshold(
                self.proximity_threshold_m,
            ));
        }
        if self.target_position_m.iter().any(|p| !p.is_finite()) {
            return Err(DriveMgrError::NonFiniteTargetPosition(
                self.target_position_m,
            ));
        }

        self.speed_ctrl
            .validate()
            .map_err(DriveMgrError::SpeedCtrlError)?;
        self.att_est.validate().map_err(DriveMgrError::AttEstError)?;

        Ok(())
    }
}
