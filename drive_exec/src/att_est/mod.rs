//! Attitude estimation module
//!
//! Integrates the batch of IMU angular-velocity sub-samples received each
//! tick into a cumulative roll/pitch/yaw attitude, using first-order (Euler
//! forward) integration at a fixed per-sub-sample step.
//!
//! Being first-order, the estimate drifts: the error grows linearly with the
//! step size and the number of sub-samples, and no complementary filter or
//! wrap-around correction is applied. The angles are raw integrals of the
//! angular rates, which is exactly what the drive test wants to record.

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
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during AttEst operation.
#[derive(Debug, thiserror::Error)]
pub enum AttEstError {
    #[error("The IMU integration step must be positive and finite, found {0} s")]
    InvalidStep(f64),
}
