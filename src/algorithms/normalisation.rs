//! Normal-form transforms for arbitrary reference layouts
//!
//! The closed-form solver needs reference A at the origin, B on the x axis and
//! C in the x-y plane. `Normalisation` builds the homogeneous transform that
//! moves any three non-collinear points into that layout, plus its inverse to
//! carry a fix back into the original frame. Both are rigid motions, so
//! ranges are unaffected.

use nalgebra::{Matrix3, Matrix4};

use crate::algorithms::multilateration::solve;
use crate::core::{
    Point3, RangeReadings, ReferenceGeometry, RootChoice, Solution, SolverError, SolverResult,
    UnknownSet, GEOMETRY_EPSILON,
};

/// Pair of 4x4 homogeneous transforms into and out of normal form
#[derive(Debug, Clone, PartialEq)]
pub struct Normalisation {
    pub to_normal_form: Matrix4<f64>,
    pub from_normal_form: Matrix4<f64>,
}

impl Normalisation {
    /// A goes to the origin, B onto +x and C into the x-y plane with positive y.
    pub fn from_points(a: &Point3, b: &Point3, c: &Point3) -> SolverResult<Self> {
        let ab = b - a;
        let baseline = ab.norm();
        if baseline.is_nan() || baseline <= GEOMETRY_EPSILON {
            return Err(SolverError::DegenerateGeometry {
                reason: "references A and B coincide".to_string(),
            });
        }
        let x_axis = ab / baseline;

        let ac = c - a;
        let off_axis = ac - x_axis * ac.dot(&x_axis);
        let spread = off_axis.norm();
        if spread.is_nan() || spread <= GEOMETRY_EPSILON * baseline.max(1.0) {
            return Err(SolverError::DegenerateGeometry {
                reason: "references A, B and C are collinear".to_string(),
            });
        }
        let y_axis = off_axis / spread;
        let z_axis = x_axis.cross(&y_axis);

        let rotation = Matrix3::from_rows(&[
            x_axis.transpose(),
            y_axis.transpose(),
            z_axis.transpose(),
        ]);

        let to_normal_form = rotation.to_homogeneous() * Matrix4::new_translation(&(-a));
        let from_normal_form = Matrix4::new_translation(a) * rotation.transpose().to_homogeneous();

        Ok(Self { to_normal_form, from_normal_form })
    }

    pub fn to_normal(&self, p: &Point3) -> Point3 {
        (self.to_normal_form * p.push(1.0)).xyz()
    }

    pub fn from_normal(&self, p: &Point3) -> Point3 {
        (self.from_normal_form * p.push(1.0)).xyz()
    }

    /// Solver geometry for B, C and D once moved into normal form
    pub fn normal_geometry(&self, references: &[Point3; 4]) -> ReferenceGeometry {
        let b = self.to_normal(&references[1]);
        let c = self.to_normal(&references[2]);
        let d = self.to_normal(&references[3]);
        ReferenceGeometry::new(b.x, c.x, c.y, d.x, d.y, d.z)
    }
}

/// Solves for a receiver among four references at arbitrary positions.
///
/// Known x/y/z values in `unknowns` are taken in the normal frame; the
/// returned position is in the original frame.
pub fn locate(
    references: &[Point3; 4],
    ranges: &RangeReadings,
    unknowns: &UnknownSet,
    root: RootChoice,
) -> SolverResult<Solution> {
    let normalisation = Normalisation::from_points(&references[0], &references[1], &references[2])?;
    let geometry = normalisation.normal_geometry(references);

    let normal = solve(ranges, &geometry, unknowns, root)?;
    let position = normalisation.from_normal(&normal.position());

    Ok(Solution::new(normal.e, position.x, position.y, position.z))
}
