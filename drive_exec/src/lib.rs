//! # Drive test library.
//!
//! This library allows other crates in the workspace to access items defined inside the drive
//! test crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Speed control module - converts the speed error into a saturated throttle demand
pub mod speed_ctrl;

/// Attitude estimation module - integrates IMU angular rates into roll/pitch/yaw
pub mod att_est;

/// Drive manager module - runs the fixed-tick control loop over the capability traits
pub mod drive_mgr;

/// Simulation clients - provide samples from and send drive demands to the simulator
pub mod sim_client;

/// Drive trace - per-run record accumulation and CSV archiving
pub mod trace;
