//! Report spreadsheets: one xlsx workbook per processed document.

pub mod reader;
pub mod writer;

pub use reader::read_report;
pub use writer::{write_report, write_workbook};
