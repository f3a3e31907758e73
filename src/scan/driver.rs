//! Grid scan over the unknowns the caller does not solve directly
//!
//! Ideal readings are synthesized from a ground truth, then every scanned
//! unknown is swept over its grid and handed to the solver as a known value.
//! The solver derives whatever is left. Loop order is e (outermost), y, x,
//! z (innermost); an unscanned axis runs a single pass with the unknown left
//! to the solver.

use std::io::Write;
use tracing::{debug, info, trace, warn};

use crate::algorithms::{distance, ClosedFormSolver};
use crate::core::{
    GroundTruth, RangeReadings, ReferenceGeometry, RootChoice, ScanError, ScanResult, Solution,
    Unknown, UnknownSet,
};
use crate::scan::output::write_tuple;
use crate::utils::{GridRange, ScanConfig};

/// Ideal noiseless readings: true distance to each reference plus the offset
pub fn synthesize_ranges(geometry: &ReferenceGeometry, truth: &GroundTruth) -> RangeReadings {
    let receiver = truth.position();
    let [ar, br, cr, dr] = geometry
        .reference_points()
        .map(|reference| distance(&reference, &receiver) + truth.e);
    RangeReadings::new(ar, br, cr, dr)
}

/// Which unknowns are swept over the grid (`true`) rather than solved (`false`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanAxes {
    pub e: bool,
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl ScanAxes {
    pub fn all_scanned() -> Self {
        Self { e: true, x: true, y: true, z: true }
    }

    pub fn none_scanned() -> Self {
        Self { e: false, x: false, y: false, z: false }
    }

    /// From "solve directly" flags in command-line order (e, z, y, x).
    /// A flag that is set means the axis is not scanned.
    pub fn from_solve_flags(solve_e: bool, solve_z: bool, solve_y: bool, solve_x: bool) -> Self {
        Self {
            e: !solve_e,
            x: !solve_x,
            y: !solve_y,
            z: !solve_z,
        }
    }
}

/// Parses a textual solve flag: only the exact text `True` sets it
pub fn parse_solve_flag(name: &str, value: &str) -> bool {
    match value {
        "True" => true,
        "False" => false,
        other => {
            warn!("{} flag {:?} is neither \"True\" nor \"False\"; treating it as False", name, other);
            false
        }
    }
}

/// Counters for one scan run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Grid points visited
    pub grid_points: u64,
    /// Solver calls made (two per grid point)
    pub attempts: u64,
    /// Solutions produced
    pub emitted: u64,
    /// Solver calls rejected as having no valid solution
    pub rejected: u64,
}

/// Runs the solver over the configured grid
pub struct ScanDriver {
    config: ScanConfig,
    axes: ScanAxes,
    ranges: RangeReadings,
    solver: ClosedFormSolver,
}

impl ScanDriver {
    pub fn new(config: ScanConfig, axes: ScanAxes) -> Self {
        let ranges = synthesize_ranges(&config.geometry, &config.ground_truth);
        let solver = ClosedFormSolver::new(config.geometry);
        Self { config, axes, ranges, solver }
    }

    /// Overrides the threshold below which the offset quadratic counts as degenerate
    pub fn with_denominator_epsilon(mut self, epsilon: f64) -> Self {
        self.solver = self.solver.with_denominator_epsilon(epsilon);
        self
    }

    pub fn ranges(&self) -> &RangeReadings {
        &self.ranges
    }

    pub fn axes(&self) -> ScanAxes {
        self.axes
    }

    fn axis_values(range: &GridRange, scanned: bool) -> Vec<Unknown> {
        if scanned {
            range.values().map(Unknown::Known).collect()
        } else {
            vec![Unknown::ToSolve]
        }
    }

    /// Visits every grid point and root, handing each solution to `emit`
    pub fn for_each_solution<F>(&self, mut emit: F) -> ScanResult<ScanSummary>
    where
        F: FnMut(&Solution) -> ScanResult<()>,
    {
        let grid = &self.config.grid;
        let e_values = Self::axis_values(&grid.e, self.axes.e);
        let y_values = Self::axis_values(&grid.y, self.axes.y);
        let x_values = Self::axis_values(&grid.x, self.axes.x);
        let z_values = Self::axis_values(&grid.z, self.axes.z);

        debug!(
            ranges = ?self.ranges.as_array(),
            axes = ?self.axes,
            "starting scan"
        );

        let mut summary = ScanSummary::default();
        for &e in &e_values {
            for &y in &y_values {
                for &x in &x_values {
                    for &z in &z_values {
                        let unknowns = UnknownSet::new(e, x, y, z);
                        summary.grid_points += 1;

                        for root in RootChoice::ALL {
                            summary.attempts += 1;
                            match self.solver.solve(&self.ranges, &unknowns, root) {
                                Ok(solution) => {
                                    emit(&solution)?;
                                    summary.emitted += 1;
                                }
                                Err(err) if err.is_domain_error() => {
                                    trace!(?unknowns, %root, "rejected: {}", err);
                                    summary.rejected += 1;
                                }
                                Err(err) => return Err(ScanError::Solver(err)),
                            }
                        }
                    }
                }
            }
        }

        info!(
            grid_points = summary.grid_points,
            emitted = summary.emitted,
            rejected = summary.rejected,
            "scan complete"
        );
        Ok(summary)
    }

    /// Streams every solution to `sink` as a tuple line
    pub fn run<W: Write + ?Sized>(&self, sink: &mut W) -> ScanResult<ScanSummary> {
        let summary = self.for_each_solution(|solution| {
            write_tuple(&mut *sink, solution)?;
            Ok(())
        })?;
        sink.flush()?;
        Ok(summary)
    }

    /// All solutions in enumeration order
    pub fn solutions(&self) -> ScanResult<Vec<Solution>> {
        let mut solutions = Vec::new();
        self.for_each_solution(|solution| {
            solutions.push(*solution);
            Ok(())
        })?;
        Ok(solutions)
    }
}
