//! Plot tuple output
//!
//! Each solution becomes one `x\ty\tz\te` line with six decimals, the column
//! order plotting tools expect (three spatial columns, then a colour channel).

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::core::Solution;

/// Writes one solution as a newline-terminated tuple line
pub fn write_tuple<W: Write + ?Sized>(sink: &mut W, solution: &Solution) -> io::Result<()> {
    writeln!(sink, "{}", solution.to_tuple_line())
}

/// Buffered sink: the given file, or standard output when no path is set
pub fn open_sink(path: Option<&Path>) -> io::Result<Box<dyn Write>> {
    match path {
        Some(path) => Ok(Box::new(BufWriter::new(File::create(path)?))),
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}
