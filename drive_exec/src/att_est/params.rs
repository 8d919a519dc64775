//! Parameters for the attitude estimation module

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use super::AttEstError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the attitude estimation module.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Params {
    /// Integration step between consecutive IMU sub-samples in a batch.
    ///
    /// Units: seconds
    pub imu_step_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check the parameters for validity, returning an error describing the
    /// first invalid item found.
    ///
    /// The guard tests for membership of the valid range, so NaN (which
    /// fails every ordered comparison) is rejected too.
    pub fn validate(&self) -> Result<(), AttEstError> {
        if !(self.imu_step_s > 0.0 && self.imu_step_s.is_finite()) {
            return Err(AttEstError::InvalidStep(self.imu_step_s));
        }

        Ok(())
    }
}
