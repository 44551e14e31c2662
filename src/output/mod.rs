//! Output module for exporting results and reporting on runs
//!
//! This module handles:
//! - Writing the result table as CSV
//! - Writing the optional JSON report
//! - Collecting and printing run statistics

mod csv_export;
mod json_export;
pub mod stats;
mod traits;

pub use csv_export::{CsvExporter, CSV_HEADER};
pub use json_export::JsonExporter;
pub use stats::{print_report, RunStats};
pub use traits::{write_atomically, Exporter};
