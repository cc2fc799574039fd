//! Cyclic module interface
//!
//! The planning and control modules of the drive stack all follow the same
//! life cycle: they are initialised once from a parameter file within a
//! session, then processed once per cycle on the latest snapshot of their
//! inputs.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// Persistent state of a cyclic module.
pub trait State {
    /// Name used to identify the module in logs
    const NAME: &'static str;

    /// Data needed to initialise the module, usually a parameter file path
    type InitData;
    type InitError;

    /// Snapshot of the inputs for a single cycle
    type InputData;
    type OutputData;

    /// Record of the decisions made during a cycle, archived by the module
    type StatusReport;
    type ProcError;

    /// Load parameters and open archives within `session`.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Run one cycle, returning the output and the cycle's status report.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
