//! Error types for solving, configuration and scanning

use std::io;
use thiserror::Error;

use crate::core::types::RootChoice;

/// Result type for solver operations
pub type SolverResult<T> = Result<T, SolverError>;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for scan runs
pub type ScanResult<T> = Result<T, ScanError>;

/// Failures of the closed-form solver
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// The offset quadratic has a negative discriminant for this root
    #[error("No real solution for root {root} with this geometry (discriminant {discriminant:.6})")]
    NoRealSolution { root: RootChoice, discriminant: f64 },

    /// Leading coefficient of the offset quadratic is (nearly) zero
    #[error("Degenerate geometry, cannot isolate timing offset (denominator {denominator:e})")]
    DegenerateDenominator { denominator: f64 },

    /// Reference points do not span the constrained layout
    #[error("Degenerate reference geometry: {reason}")]
    DegenerateGeometry { reason: String },

    /// A computed quantity came out as NaN or infinite
    #[error("Non-finite {quantity} computed")]
    NonFinite { quantity: &'static str },
}

impl SolverError {
    /// Outcomes the mathematics rejects; a scan skips over these
    pub fn is_domain_error(&self) -> bool {
        !matches!(self, SolverError::NonFinite { .. })
    }
}

/// Scan configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read or written
    #[error("Config file I/O failed for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// JSON (de)serialization failed
    #[error("Config serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A parameter is out of its valid range
    #[error("Invalid {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
}

/// Fatal scan failures (domain errors never reach this level)
#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Writing a tuple to the sink failed
    #[error("Failed to write scan output: {0}")]
    Output(#[from] io::Error),

    /// A solver failure that is not a routine domain error
    #[error("Solver failed at grid point: {0}")]
    Solver(SolverError),
}
