use quittung_core::error::QuittungError;
use quittung_core::model::ReportTable;

pub fn print(report: &ReportTable) -> Result<(), QuittungError> {
    let json = serde_json::to_string_pretty(&report.rows)?;
    println!("{json}");
    Ok(())
}
