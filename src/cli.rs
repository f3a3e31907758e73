//! Command-line interface for the scan driver
//!
//! ```bash
//! # Solve e and x directly, sweep z and y over the grid
//! multilateration True False False True > points.dat
//! ```
//!
//! The output can be plotted with gnuplot, for example
//! `splot "points.dat" using 1:2:3:4 palette notitle`, colouring each
//! candidate position by its timing offset.

use clap::Parser;
use std::path::PathBuf;

use crate::core::ScanResult;
use crate::scan::{open_sink, parse_solve_flag, ScanAxes, ScanDriver, ScanSummary};
use crate::utils::ScanConfig;

/// Partially solve a multilateration problem and scan the rest
#[derive(Parser, Debug)]
#[command(name = "multilateration")]
#[command(author, version, about = "Closed-form multilateration with scanned unknowns")]
pub struct Cli {
    /// "True" to solve the timing offset e directly instead of scanning it
    pub solve_e: String,

    /// "True" to solve z directly instead of scanning it
    pub solve_z: String,

    /// "True" to solve y directly instead of scanning it
    pub solve_y: String,

    /// "True" to solve x directly instead of scanning it
    pub solve_x: String,

    /// JSON scan configuration (geometry, ground truth, grid)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write tuples to this file instead of standard output
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl Cli {
    pub fn scan_axes(&self) -> ScanAxes {
        ScanAxes::from_solve_flags(
            parse_solve_flag("solve_e", &self.solve_e),
            parse_solve_flag("solve_z", &self.solve_z),
            parse_solve_flag("solve_y", &self.solve_y),
            parse_solve_flag("solve_x", &self.solve_x),
        )
    }

    /// Loads the configuration, failing before any computation if it is invalid
    pub fn scan_config(&self) -> ScanResult<ScanConfig> {
        match &self.config {
            Some(path) => Ok(ScanConfig::load_from_file(path)?),
            None => Ok(ScanConfig::default()),
        }
    }
}

/// Runs the scan described by the command line
pub fn run(cli: &Cli) -> ScanResult<ScanSummary> {
    let config = cli.scan_config()?;
    let driver = ScanDriver::new(config, cli.scan_axes());

    let mut sink = open_sink(cli.output.as_deref())?;
    driver.run(&mut *sink)
}

/// Process exit status for a finished run, logging the failure if there was one
pub fn exit_status(result: &ScanResult<ScanSummary>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(e) => {
            tracing::error!("scan failed: {}", e);
            1
        }
    }
}
