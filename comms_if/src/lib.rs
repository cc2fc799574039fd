//! # Communications interface crate.
//!
//! Provides the data structures exchanged between the planning and control
//! core and its external collaborators (localisation, route source, camera,
//! light classifier and the drive-by-wire layer).

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Equipment interfaces (cameras)
pub mod eqpt;

/// Messages passed between the drive stack nodes
pub mod msg;
