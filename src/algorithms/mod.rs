//! Closed-form positioning algorithms

pub mod geometry;
pub mod multilateration;
pub mod normalisation;

pub use geometry::distance;
pub use multilateration::{affine_coefficients, solve, AffineCoefficients, AffineForm, ClosedFormSolver, OffsetQuadratic};
pub use normalisation::{locate, Normalisation};
