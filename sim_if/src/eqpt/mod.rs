//! # Equipment Interface
//!
//! This module defines the interface structures which are exchanged with the
//! simulator-side equipment servers.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod veh;
