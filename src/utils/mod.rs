//! Utility modules for configuration

pub mod config;

pub use config::{GridRange, ScanConfig, ScanGrid, ValidationResult};
