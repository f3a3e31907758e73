//! Core data types for the multilateration solver

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::constants::{GEOMETRY_EPSILON, US_PER_CM};
use crate::core::error::{SolverError, SolverResult};

/// 3D point in the solver's Cartesian frame
pub type Point3 = Vector3<f64>;

/// Layout of the three non-origin references in normal form.
///
/// Reference A sits at the origin, B on the x axis at `bc_x`, C in the x-y
/// plane at `(cc_x, cc_y)` and D anywhere off that plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceGeometry {
    pub bc_x: f64,
    pub cc_x: f64,
    pub cc_y: f64,
    pub dc_x: f64,
    pub dc_y: f64,
    pub dc_z: f64,
}

impl ReferenceGeometry {
    pub fn new(bc_x: f64, cc_x: f64, cc_y: f64, dc_x: f64, dc_y: f64, dc_z: f64) -> Self {
        Self { bc_x, cc_x, cc_y, dc_x, dc_y, dc_z }
    }

    /// Reference positions A, B, C and D in that order
    pub fn reference_points(&self) -> [Point3; 4] {
        [
            Point3::zeros(),
            Point3::new(self.bc_x, 0.0, 0.0),
            Point3::new(self.cc_x, self.cc_y, 0.0),
            Point3::new(self.dc_x, self.dc_y, self.dc_z),
        ]
    }

    /// Fails when any scalar the elimination divides by is (near) zero
    pub fn check_non_degenerate(&self) -> SolverResult<()> {
        let divisors = [("bc_x", self.bc_x), ("cc_y", self.cc_y), ("dc_z", self.dc_z)];
        for (name, value) in divisors {
            if !value.is_finite() || value.abs() < GEOMETRY_EPSILON {
                return Err(SolverError::DegenerateGeometry {
                    reason: format!("{} = {} must be finite and non-zero", name, value),
                });
            }
        }
        Ok(())
    }
}

impl Default for ReferenceGeometry {
    fn default() -> Self {
        Self::new(100.0, 0.0, 100.0, 0.0, -20.0, 20.0)
    }
}

/// Range readings to references A, B, C and D, each including the shared offset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeReadings {
    pub ar: f64,
    pub br: f64,
    pub cr: f64,
    pub dr: f64,
}

impl RangeReadings {
    pub fn new(ar: f64, br: f64, cr: f64, dr: f64) -> Self {
        Self { ar, br, cr, dr }
    }

    /// Converts four ultrasonic echo times (microseconds) to ranges in centimetres
    pub fn from_echo_times_us(echo_us: [f64; 4]) -> Self {
        let [a, b, c, d] = echo_us.map(|t| t / US_PER_CM);
        Self::new(a, b, c, d)
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.ar, self.br, self.cr, self.dr]
    }
}

/// Known receiver state used to synthesize ideal readings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    /// Timing offset added to every range
    pub e: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl GroundTruth {
    pub fn position(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }
}

impl Default for GroundTruth {
    fn default() -> Self {
        Self { e: 3.0, x: 400.0, y: 500.0, z: 600.0 }
    }
}

/// One unknown of the problem: either supplied by the caller or left to the solver
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Unknown {
    Known(f64),
    ToSolve,
}

impl Unknown {
    pub fn value(self) -> Option<f64> {
        match self {
            Unknown::Known(v) => Some(v),
            Unknown::ToSolve => None,
        }
    }

    pub fn is_known(self) -> bool {
        matches!(self, Unknown::Known(_))
    }
}

impl From<Option<f64>> for Unknown {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Unknown::ToSolve, Unknown::Known)
    }
}

/// The four unknowns (timing offset and position) of one solver call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnknownSet {
    pub e: Unknown,
    pub x: Unknown,
    pub y: Unknown,
    pub z: Unknown,
}

impl UnknownSet {
    pub fn new(e: Unknown, x: Unknown, y: Unknown, z: Unknown) -> Self {
        Self { e, x, y, z }
    }

    pub fn all_to_solve() -> Self {
        Self::new(Unknown::ToSolve, Unknown::ToSolve, Unknown::ToSolve, Unknown::ToSolve)
    }

    pub fn all_known(e: f64, x: f64, y: f64, z: f64) -> Self {
        Self::new(Unknown::Known(e), Unknown::Known(x), Unknown::Known(y), Unknown::Known(z))
    }

    pub fn is_fully_known(&self) -> bool {
        self.e.is_known() && self.x.is_known() && self.y.is_known() && self.z.is_known()
    }
}

impl Default for UnknownSet {
    fn default() -> Self {
        Self::all_to_solve()
    }
}

/// Which root of the timing-offset quadratic to take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RootChoice {
    /// The "−√" branch, historically solution 1
    Lower,
    /// The "+√" branch, historically solution 2
    Upper,
}

impl RootChoice {
    /// Both roots in the order a scan tries them
    pub const ALL: [RootChoice; 2] = [RootChoice::Lower, RootChoice::Upper];

    pub fn number(self) -> u8 {
        match self {
            RootChoice::Lower => 1,
            RootChoice::Upper => 2,
        }
    }
}

impl TryFrom<u8> for RootChoice {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(RootChoice::Lower),
            2 => Ok(RootChoice::Upper),
            other => Err(format!("root choice must be 1 or 2, got {}", other)),
        }
    }
}

impl fmt::Display for RootChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// A resolved (e, x, y, z) tuple
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub e: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Solution {
    pub fn new(e: f64, x: f64, y: f64, z: f64) -> Self {
        Self { e, x, y, z }
    }

    pub fn position(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }

    /// Plot line in x, y, z, e column order
    pub fn to_tuple_line(&self) -> String {
        format!("{:.6}\t{:.6}\t{:.6}\t{:.6}", self.x, self.y, self.z, self.e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_geometry_degeneracy() {
        assert!(ReferenceGeometry::default().check_non_degenerate().is_ok());

        let flat_b = ReferenceGeometry { bc_x: 0.0, ..ReferenceGeometry::default() };
        let flat_c = ReferenceGeometry { cc_y: 0.0, ..ReferenceGeometry::default() };
        let flat_d = ReferenceGeometry { dc_z: 1e-12, ..ReferenceGeometry::default() };

        for geometry in [flat_b, flat_c, flat_d] {
            let err = geometry.check_non_degenerate().unwrap_err();
            assert!(matches!(err, SolverError::DegenerateGeometry { .. }));
        }
    }

    #[test]
    fn test_reference_points_layout() {
        let points = ReferenceGeometry::default().reference_points();
        assert_eq!(points[0], Point3::zeros());
        assert_eq!(points[1], Point3::new(100.0, 0.0, 0.0));
        assert_eq!(points[2], Point3::new(0.0, 100.0, 0.0));
        assert_eq!(points[3], Point3::new(0.0, -20.0, 20.0));
    }

    #[test]
    fn test_unknown_from_option() {
        assert_eq!(Unknown::from(Some(0.0)), Unknown::Known(0.0));
        assert_eq!(Unknown::from(None), Unknown::ToSolve);
        assert!(Unknown::Known(0.0).is_known());
        assert_eq!(Unknown::ToSolve.value(), None);
    }

    #[test]
    fn test_unknown_set_fully_known() {
        assert!(UnknownSet::all_known(0.0, 0.0, 0.0, 0.0).is_fully_known());
        assert!(!UnknownSet::all_to_solve().is_fully_known());

        let mut partial = UnknownSet::all_known(1.0, 2.0, 3.0, 4.0);
        partial.y = Unknown::ToSolve;
        assert!(!partial.is_fully_known());
    }

    #[test]
    fn test_root_choice_numbering() {
        assert_eq!(RootChoice::try_from(1), Ok(RootChoice::Lower));
        assert_eq!(RootChoice::try_from(2), Ok(RootChoice::Upper));
        assert!(RootChoice::try_from(3).is_err());
        assert_eq!(RootChoice::ALL.map(RootChoice::number), [1, 2]);
        assert_eq!(RootChoice::Upper.to_string(), "2");
    }

    #[test]
    fn test_tuple_line_column_order() {
        let solution = Solution::new(3.0, 400.0, 500.0, -600.25);
        assert_eq!(
            solution.to_tuple_line(),
            "400.000000\t500.000000\t-600.250000\t3.000000"
        );
    }

    #[test]
    fn test_ranges_from_echo_times() {
        let ranges = RangeReadings::from_echo_times_us([US_PER_CM * 100.0, 0.0, US_PER_CM, 2938.66996]);
        assert_relative_eq!(ranges.ar, 100.0, epsilon = 1e-9);
        assert_eq!(ranges.br, 0.0);
        assert_relative_eq!(ranges.cr, 1.0, epsilon = 1e-12);
        assert_relative_eq!(ranges.dr, 100.0, epsilon = 1e-9);
    }
}
