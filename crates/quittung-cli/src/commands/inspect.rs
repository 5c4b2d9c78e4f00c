use quittung_core::error::QuittungError;
use quittung_core::spreadsheet::read_report;
use std::path::Path;

use crate::output;

pub fn run(file: &Path, output_format: &str) -> Result<(), QuittungError> {
    let report = read_report(file)?;

    match output_format {
        "json" => output::json::print(&report)?,
        _ => print!("{}", output::table::format_report(&report)),
    }

    Ok(())
}
