//! # Equipment Interface
//!
//! This module defines the interface structures which are produced by equipment on the vehicle.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod cam;
