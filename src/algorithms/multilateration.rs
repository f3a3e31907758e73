//! Closed-form multilateration with a shared timing offset
//!
//! Four range equations `|P - R_i| = r_i - e` are reduced by elimination:
//! subtracting the origin equation from the other three leaves three linear
//! relations, each giving one coordinate as an affine function of the timing
//! offset `e`. Substituting those back into the origin equation yields a
//! quadratic in `e` alone, whose two roots are the two candidate fixes.
//!
//! Any of the four unknowns may be supplied by the caller. Supplied values are
//! returned verbatim and only the remaining ones are derived.

use crate::core::{
    Point3, RangeReadings, ReferenceGeometry, RootChoice, Solution, SolverError, SolverResult,
    Unknown, UnknownSet, DENOMINATOR_EPSILON,
};

/// One coordinate expressed as `p1 * e + p0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineForm {
    pub p1: f64,
    pub p0: f64,
}

impl AffineForm {
    pub fn at(&self, e: f64) -> f64 {
        e * self.p1 + self.p0
    }
}

/// Affine forms for x, y and z, derived in that order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineCoefficients {
    pub x: AffineForm,
    pub y: AffineForm,
    pub z: AffineForm,
}

impl AffineCoefficients {
    /// Runs the elimination cascade; x feeds y, and both feed z.
    pub fn derive(ranges: &RangeReadings, geometry: &ReferenceGeometry) -> SolverResult<Self> {
        geometry.check_non_degenerate()?;

        let RangeReadings { ar, br, cr, dr } = *ranges;
        let ReferenceGeometry { bc_x, cc_x, cc_y, dc_x, dc_y, dc_z } = *geometry;

        let x = AffineForm {
            p1: (br - ar) / bc_x,
            p0: -(br * br - bc_x * bc_x - ar * ar) / (2.0 * bc_x),
        };
        let y = AffineForm {
            p1: -(cc_x * x.p1 - cr + ar) / cc_y,
            p0: -(2.0 * cc_x * x.p0 + cr * cr - cc_y * cc_y - cc_x * cc_x - ar * ar) / (2.0 * cc_y),
        };
        let z = AffineForm {
            p1: -(dc_y * y.p1 + dc_x * x.p1 - dr + ar) / dc_z,
            p0: -(2.0 * dc_y * y.p0 + 2.0 * dc_x * x.p0 + dr * dr
                - dc_z * dc_z
                - dc_y * dc_y
                - dc_x * dc_x
                - ar * ar)
                / (2.0 * dc_z),
        };

        Ok(Self { x, y, z })
    }

    pub fn position_at(&self, e: f64) -> Point3 {
        Point3::new(self.x.at(e), self.y.at(e), self.z.at(e))
    }

    /// Quadratic in `e` from substituting the affine forms into
    /// `x² + y² + z² = (ar - e)²`.
    pub fn offset_quadratic(&self, ar: f64) -> OffsetQuadratic {
        let forms = [self.x, self.y, self.z];
        let slope_sq: f64 = forms.iter().map(|f| f.p1 * f.p1).sum();
        let cross: f64 = forms.iter().map(|f| f.p1 * f.p0).sum();
        let intercept_sq: f64 = forms.iter().map(|f| f.p0 * f.p0).sum();

        OffsetQuadratic {
            a: slope_sq - 1.0,
            half_b: cross + ar,
            c: intercept_sq - ar * ar,
        }
    }
}

/// `a·e² + 2·half_b·e + c = 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetQuadratic {
    pub a: f64,
    pub half_b: f64,
    pub c: f64,
}

impl OffsetQuadratic {
    /// Reduced discriminant `half_b² - a·c`
    pub fn discriminant(&self) -> f64 {
        self.half_b * self.half_b - self.a * self.c
    }

    pub fn root(&self, choice: RootChoice) -> SolverResult<f64> {
        self.root_with_epsilon(choice, DENOMINATOR_EPSILON)
    }

    pub fn root_with_epsilon(&self, choice: RootChoice, epsilon: f64) -> SolverResult<f64> {
        if self.a.is_nan() || self.a.abs() < epsilon {
            return Err(SolverError::DegenerateDenominator { denominator: self.a });
        }

        let discriminant = self.discriminant();
        if discriminant < 0.0 {
            return Err(SolverError::NoRealSolution { root: choice, discriminant });
        }

        let sqrt_d = discriminant.sqrt();
        Ok(match choice {
            RootChoice::Lower => -(sqrt_d + self.half_b) / self.a,
            RootChoice::Upper => (sqrt_d - self.half_b) / self.a,
        })
    }
}

/// Closed-form solver bound to one reference geometry
#[derive(Debug, Clone)]
pub struct ClosedFormSolver {
    pub geometry: ReferenceGeometry,
    /// Below this the offset quadratic is treated as degenerate
    pub denominator_epsilon: f64,
}

impl ClosedFormSolver {
    pub fn new(geometry: ReferenceGeometry) -> Self {
        Self {
            geometry,
            denominator_epsilon: DENOMINATOR_EPSILON,
        }
    }

    pub fn with_denominator_epsilon(mut self, epsilon: f64) -> Self {
        self.denominator_epsilon = epsilon;
        self
    }

    /// Resolves every unknown left as `ToSolve`.
    ///
    /// With all four supplied this is a passthrough that never looks at the
    /// ranges or geometry.
    pub fn solve(
        &self,
        ranges: &RangeReadings,
        unknowns: &UnknownSet,
        root: RootChoice,
    ) -> SolverResult<Solution> {
        if let (Unknown::Known(e), Unknown::Known(x), Unknown::Known(y), Unknown::Known(z)) =
            (unknowns.e, unknowns.x, unknowns.y, unknowns.z)
        {
            return Ok(Solution::new(e, x, y, z));
        }

        let coefficients = AffineCoefficients::derive(ranges, &self.geometry)?;

        let e = match unknowns.e {
            Unknown::Known(e) => e,
            Unknown::ToSolve => coefficients
                .offset_quadratic(ranges.ar)
                .root_with_epsilon(root, self.denominator_epsilon)?,
        };

        let x = resolve(unknowns.x, &coefficients.x, e, "x")?;
        let y = resolve(unknowns.y, &coefficients.y, e, "y")?;
        let z = resolve(unknowns.z, &coefficients.z, e, "z")?;

        if !e.is_finite() {
            return Err(SolverError::NonFinite { quantity: "e" });
        }

        Ok(Solution::new(e, x, y, z))
    }
}

fn resolve(unknown: Unknown, form: &AffineForm, e: f64, axis: &'static str) -> SolverResult<f64> {
    match unknown {
        Unknown::Known(value) => Ok(value),
        Unknown::ToSolve => {
            let value = form.at(e);
            if value.is_finite() {
                Ok(value)
            } else {
                Err(SolverError::NonFinite { quantity: axis })
            }
        }
    }
}

/// Affine forms for the given readings; lets callers re-derive coordinates from a returned `e`
pub fn affine_coefficients(
    ranges: &RangeReadings,
    geometry: &ReferenceGeometry,
) -> SolverResult<AffineCoefficients> {
    AffineCoefficients::derive(ranges, geometry)
}

/// Solves the remaining unknowns with the default degeneracy threshold
pub fn solve(
    ranges: &RangeReadings,
    geometry: &ReferenceGeometry,
    unknowns: &UnknownSet,
    root: RootChoice,
) -> SolverResult<Solution> {
    ClosedFormSolver::new(*geometry).solve(ranges, unknowns, root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::geometry::distance;
    use approx::assert_abs_diff_eq;

    fn ground_truth_ranges(geometry: &ReferenceGeometry, truth: Point3, e: f64) -> RangeReadings {
        let [a, b, c, d] = geometry.reference_points().map(|r| distance(&r, &truth) + e);
        RangeReadings::new(a, b, c, d)
    }

    fn reference_case() -> (ReferenceGeometry, RangeReadings) {
        let geometry = ReferenceGeometry::new(100.0, 0.0, 100.0, 0.0, -20.0, 20.0);
        let ranges = ground_truth_ranges(&geometry, Point3::new(400.0, 500.0, 600.0), 3.0);
        (geometry, ranges)
    }

    fn matches_truth(solution: &Solution) -> bool {
        (solution.e - 3.0).abs() < 1e-6
            && (solution.x - 400.0).abs() < 1e-6
            && (solution.y - 500.0).abs() < 1e-6
            && (solution.z - 600.0).abs() < 1e-6
    }

    #[test]
    fn test_recovers_ground_truth_for_exactly_one_root() {
        let (geometry, ranges) = reference_case();

        let matching: Vec<RootChoice> = RootChoice::ALL
            .into_iter()
            .filter(|&root| {
                let solution = solve(&ranges, &geometry, &UnknownSet::all_to_solve(), root)
                    .expect("both roots are real for the reference case");
                matches_truth(&solution)
            })
            .collect();

        assert_eq!(matching, vec![RootChoice::Upper]);
    }

    #[test]
    fn test_passthrough_when_everything_known() {
        let unknowns = UnknownSet::all_known(-7.5, 0.0, 12.0, -300.0);
        let degenerate = ReferenceGeometry::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let nonsense = RangeReadings::new(f64::NAN, -1.0, f64::INFINITY, 0.0);

        for root in RootChoice::ALL {
            let solution = solve(&nonsense, &degenerate, &unknowns, root).unwrap();
            assert_eq!(solution, Solution::new(-7.5, 0.0, 12.0, -300.0));
        }
    }

    #[test]
    fn test_caller_values_are_authoritative() {
        let (geometry, ranges) = reference_case();
        let unknowns = UnknownSet::new(
            Unknown::ToSolve,
            Unknown::Known(123.0),
            Unknown::ToSolve,
            Unknown::Known(-45.0),
        );

        let solution = solve(&ranges, &geometry, &unknowns, RootChoice::Upper).unwrap();
        assert_eq!(solution.x, 123.0);
        assert_eq!(solution.z, -45.0);
        assert_abs_diff_eq!(solution.e, 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(solution.y, 500.0, epsilon = 1e-6);
    }

    #[test]
    fn test_solved_coordinates_follow_affine_forms() {
        let (geometry, ranges) = reference_case();
        let coefficients = affine_coefficients(&ranges, &geometry).unwrap();

        for e in [-1000.0, -300.0, 0.0, 3.0, 700.0] {
            let unknowns = UnknownSet::new(
                Unknown::Known(e),
                Unknown::ToSolve,
                Unknown::ToSolve,
                Unknown::Known(100.0),
            );
            let solution = solve(&ranges, &geometry, &unknowns, RootChoice::Lower).unwrap();
            assert_abs_diff_eq!(solution.x, coefficients.x.at(solution.e), epsilon = 1e-9);
            assert_abs_diff_eq!(solution.y, coefficients.y.at(solution.e), epsilon = 1e-9);
            assert_eq!(solution.z, 100.0);
        }

        for root in RootChoice::ALL {
            let solution = solve(&ranges, &geometry, &UnknownSet::all_to_solve(), root).unwrap();
            let position = coefficients.position_at(solution.e);
            assert_abs_diff_eq!(solution.position(), position, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_known_offset_gives_same_fix_for_both_roots() {
        let (geometry, ranges) = reference_case();
        let mut unknowns = UnknownSet::all_to_solve();
        unknowns.e = Unknown::Known(3.0);

        let lower = solve(&ranges, &geometry, &unknowns, RootChoice::Lower).unwrap();
        let upper = solve(&ranges, &geometry, &unknowns, RootChoice::Upper).unwrap();
        assert_eq!(lower, upper);
        assert!(matches_truth(&lower));
    }

    #[test]
    fn test_zero_baseline_is_a_domain_error() {
        let (_, ranges) = reference_case();
        let geometry = ReferenceGeometry::new(0.0, 0.0, 100.0, 0.0, -20.0, 20.0);

        let partial = UnknownSet::new(
            Unknown::Known(3.0),
            Unknown::ToSolve,
            Unknown::Known(500.0),
            Unknown::Known(600.0),
        );
        for unknowns in [UnknownSet::all_to_solve(), partial] {
            for root in RootChoice::ALL {
                let err = solve(&ranges, &geometry, &unknowns, root).unwrap_err();
                assert!(matches!(err, SolverError::DegenerateGeometry { .. }));
                assert!(err.is_domain_error());
            }
        }
    }

    #[test]
    fn test_negative_discriminant_rejects_both_roots() {
        let geometry = ReferenceGeometry::new(100.0, 0.0, 100.0, 0.0, -20.0, 20.0);
        let ranges = RangeReadings::new(100.0, 0.0, 0.0, 0.0);

        let quadratic = affine_coefficients(&ranges, &geometry)
            .unwrap()
            .offset_quadratic(ranges.ar);
        assert!(quadratic.discriminant() < 0.0);
        assert!(quadratic.root(RootChoice::Lower).is_err());

        for root in RootChoice::ALL {
            let err = solve(&ranges, &geometry, &UnknownSet::all_to_solve(), root).unwrap_err();
            assert!(matches!(err, SolverError::NoRealSolution { root: r, .. } if r == root));
            assert!(err.is_domain_error());
        }
    }

    #[test]
    fn test_flat_quadratic_is_degenerate_denominator() {
        // Receiver far out along +x: x moves one-for-one with e, so the e² terms cancel
        let geometry = ReferenceGeometry::new(100.0, 0.0, 100.0, 0.0, 0.0, 100.0);
        let ranges = RangeReadings::new(10.0, 110.0, 10.0, 10.0);

        let quadratic = affine_coefficients(&ranges, &geometry)
            .unwrap()
            .offset_quadratic(ranges.ar);
        assert_eq!(quadratic.a, 0.0);

        for root in RootChoice::ALL {
            let err = solve(&ranges, &geometry, &UnknownSet::all_to_solve(), root).unwrap_err();
            assert!(matches!(err, SolverError::DegenerateDenominator { .. }));
        }
    }

    #[test]
    fn test_nan_ranges_are_reported_not_returned() {
        let geometry = ReferenceGeometry::default();
        let ranges = RangeReadings::new(f64::NAN, 10.0, 10.0, 10.0);
        let mut unknowns = UnknownSet::all_to_solve();
        unknowns.e = Unknown::Known(0.0);

        let err = solve(&ranges, &geometry, &unknowns, RootChoice::Lower).unwrap_err();
        assert_eq!(err, SolverError::NonFinite { quantity: "x" });
        assert!(!err.is_domain_error());
    }

    #[test]
    fn test_custom_denominator_epsilon() {
        let (geometry, ranges) = reference_case();
        let strict = ClosedFormSolver::new(geometry).with_denominator_epsilon(1.0);

        let err = strict
            .solve(&ranges, &UnknownSet::all_to_solve(), RootChoice::Upper)
            .unwrap_err();
        assert!(matches!(err, SolverError::DegenerateDenominator { .. }));
    }
}
