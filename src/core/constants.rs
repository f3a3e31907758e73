//! Physical constants and solver/scan parameters

/// Microseconds for sound to travel one centimetre in air
pub const US_PER_CM: f64 = 29.3866996;

/// Geometry scalars with a magnitude below this are treated as zero
pub const GEOMETRY_EPSILON: f64 = 1e-9;

/// Smallest usable magnitude for the leading coefficient of the offset quadratic
pub const DENOMINATOR_EPSILON: f64 = 1e-12;

/// Default scan grid: [-1000, 1000) in steps of 100 on every axis
pub const DEFAULT_GRID_START: i64 = -1000;
pub const DEFAULT_GRID_END: i64 = 1000;
pub const DEFAULT_GRID_STEP: i64 = 100;
