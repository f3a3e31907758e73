//! Core types, constants and errors for the multilateration solver

pub mod types;
pub mod constants;
pub mod error;

pub use types::*;
pub use constants::*;
pub use error::*;
