//! Closed-form Multilateration
//!
//! Solves for a receiver's position and a shared timing offset from range
//! readings to four reference points, substituting scanned grid values for
//! any unknowns the caller chooses not to solve directly.

pub mod core;
pub mod algorithms;
pub mod scan;
pub mod utils;
pub mod cli;

// Re-export commonly used types
pub use crate::core::{
    GroundTruth, Point3, RangeReadings, ReferenceGeometry, RootChoice, Solution, SolverError,
    SolverResult, Unknown, UnknownSet,
};
pub use crate::algorithms::{distance, locate, solve, ClosedFormSolver, Normalisation};
pub use crate::scan::{ScanAxes, ScanDriver, ScanSummary};
pub use crate::utils::{GridRange, ScanConfig};
