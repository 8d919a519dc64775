//! # Simulation interface crate.
//!
//! Provides the data structures, capability traits, and networking layer used
//! to talk to the driving simulator.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command and response definitions for equipment (the simulated vehicle)
pub mod eqpt;

/// Network module
pub mod net;
