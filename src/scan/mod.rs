//! Grid scan driver and plot output

pub mod driver;
pub mod output;

pub use driver::{parse_solve_flag, synthesize_ranges, ScanAxes, ScanDriver, ScanSummary};
pub use output::{open_sink, write_tuple};
