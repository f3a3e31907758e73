//! Scan configuration: reference geometry, ground truth and per-axis grids
//!
//! Loaded from JSON and validated in full before a scan starts, so a bad file
//! fails with a config error rather than partway through the grid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::algorithms::affine_coefficients;
use crate::core::{
    ConfigError, ConfigResult, GroundTruth, ReferenceGeometry, DEFAULT_GRID_END,
    DEFAULT_GRID_START, DEFAULT_GRID_STEP,
};
use crate::scan::synthesize_ranges;

/// Scans with more grid points than this get a size warning
const LARGE_SCAN_POINTS: u64 = 10_000_000;

/// Half-open integer range `[start, end)` walked in `step` increments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRange {
    pub start: i64,
    pub end: i64,
    pub step: i64,
}

impl GridRange {
    pub fn new(start: i64, end: i64, step: i64) -> Self {
        Self { start, end, step }
    }

    /// Number of values the range yields, or `None` if its span overflows `i64`
    pub fn checked_len(&self) -> Option<u64> {
        if self.step <= 0 || self.end <= self.start {
            return Some(0);
        }
        let span = self.end.checked_sub(self.start)?;
        let count = span / self.step + i64::from(span % self.step != 0);
        u64::try_from(count).ok()
    }

    /// Number of values the range yields (zero for an invalid range)
    pub fn len(&self) -> usize {
        self.checked_len()
            .and_then(|count| usize::try_from(count).ok())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn values(&self) -> impl Iterator<Item = f64> {
        let GridRange { start, step, .. } = *self;
        let count = i64::try_from(self.len()).unwrap_or(0);
        (0..count).filter_map(move |i| {
            i.checked_mul(step)
                .and_then(|offset| start.checked_add(offset))
                .map(|value| value as f64)
        })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.start as f64 && value < self.end as f64
    }

    fn validate(&self, axis: &str, errors: &mut Vec<ConfigError>) {
        if self.step <= 0 {
            errors.push(ConfigError::InvalidParameter {
                parameter: format!("grid.{}.step", axis),
                value: self.step.to_string(),
                reason: "step must be positive".to_string(),
            });
        }
        if self.end <= self.start {
            errors.push(ConfigError::InvalidParameter {
                parameter: format!("grid.{}.end", axis),
                value: self.end.to_string(),
                reason: format!("end must be greater than start ({})", self.start),
            });
        } else if self.checked_len().is_none() {
            errors.push(ConfigError::InvalidParameter {
                parameter: format!("grid.{}.end", axis),
                value: self.end.to_string(),
                reason: format!("span from start ({}) overflows a 64-bit integer", self.start),
            });
        }
    }
}

impl Default for GridRange {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_START, DEFAULT_GRID_END, DEFAULT_GRID_STEP)
    }
}

/// Grid ranges for each of the four unknowns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanGrid {
    pub e: GridRange,
    pub x: GridRange,
    pub y: GridRange,
    pub z: GridRange,
}

/// Everything a scan run needs besides the per-axis scan flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Reference layout in normal form
    pub geometry: ReferenceGeometry,
    /// Receiver state the synthetic ranges are generated from
    pub ground_truth: GroundTruth,
    /// Values swept for every scanned unknown
    #[serde(default)]
    pub grid: ScanGrid,
}

/// Configuration validation result
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Whether configuration is valid
    pub is_valid: bool,
    /// Validation errors
    pub errors: Vec<ConfigError>,
    /// Validation warnings
    pub warnings: Vec<String>,
}

impl ScanConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path_str.clone(),
            source,
        })?;
        let config: ScanConfig = serde_json::from_str(&content)?;

        let validation = config.validate();
        for warning in &validation.warnings {
            tracing::warn!("{}: {}", path_str, warning);
        }
        if let Some(error) = validation.errors.into_iter().next() {
            return Err(error);
        }

        tracing::debug!(path = %path_str, "loaded scan configuration");
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let content = serde_json::to_string_pretty(self)?;

        fs::write(&path, content).map_err(|source| ConfigError::Io {
            path: path_str,
            source,
        })
    }

    /// Checks geometry, ground truth and grid before any computation
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if let Err(err) = self.geometry.check_non_degenerate() {
            errors.push(ConfigError::InvalidParameter {
                parameter: "geometry".to_string(),
                value: format!("{:?}", self.geometry),
                reason: err.to_string(),
            });
        }

        let GroundTruth { e, x, y, z } = self.ground_truth;
        for (name, value) in [("e", e), ("x", x), ("y", y), ("z", z)] {
            if !value.is_finite() {
                errors.push(ConfigError::InvalidParameter {
                    parameter: format!("ground_truth.{}", name),
                    value: value.to_string(),
                    reason: "must be finite".to_string(),
                });
            }
        }

        if errors.is_empty() {
            self.check_synthesized_readings(&mut errors);
        }

        let ScanGrid { e: ge, x: gx, y: gy, z: gz } = self.grid;
        for (axis, range) in [("e", ge), ("x", gx), ("y", gy), ("z", gz)] {
            range.validate(axis, &mut errors);
        }

        if errors.is_empty() {
            let total = [ge, gx, gy, gz]
                .iter()
                .map(|r| r.checked_len().unwrap_or(u64::MAX))
                .fold(1u64, u64::saturating_mul);
            if total > LARGE_SCAN_POINTS {
                warnings.push(format!(
                    "full scan covers {} grid points; expect a very large output",
                    total
                ));
            }

            let truth = [(e, ge, "e"), (x, gx, "x"), (y, gy, "y"), (z, gz, "z")];
            for (value, range, axis) in truth {
                if !range.contains(value) {
                    warnings.push(format!(
                        "ground truth {} = {} lies outside the scanned grid [{}, {})",
                        axis, value, range.start, range.end
                    ));
                }
            }
        }

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Readings synthesized from the ground truth, and the offset quadratic
    /// built from them, must be finite for the solver to produce anything.
    fn check_synthesized_readings(&self, errors: &mut Vec<ConfigError>) {
        let ranges = synthesize_ranges(&self.geometry, &self.ground_truth);
        let readings_finite = ranges.as_array().iter().all(|r| r.is_finite());
        let quadratic_finite = affine_coefficients(&ranges, &self.geometry)
            .map(|coefficients| {
                let quadratic = coefficients.offset_quadratic(ranges.ar);
                quadratic.a.is_finite() && quadratic.c.is_finite() && quadratic.discriminant().is_finite()
            })
            .unwrap_or(false);

        if !readings_finite || !quadratic_finite {
            errors.push(ConfigError::InvalidParameter {
                parameter: "ground_truth".to_string(),
                value: format!("{:?}", self.ground_truth),
                reason: format!("synthesized readings {:?} overflow the solver", ranges.as_array()),
            });
        }
    }
}
