use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx, XlsxError};

use crate::error::QuittungError;
use crate::model::{ReportRow, ReportTable, REPORT_COLUMNS};

/// Load a report workbook written by [`write_report`](super::write_report).
///
/// The first sheet must start with the report header row.
pub fn read_report(path: &Path) -> Result<ReportTable, QuittungError> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e: XlsxError| {
        QuittungError::Spreadsheet(format!("failed to open {}: {e}", path.display()))
    })?;

    let sheet = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| QuittungError::Spreadsheet("workbook has no sheets".into()))?
        .map_err(|e| QuittungError::Spreadsheet(format!("failed to read sheet: {e}")))?;

    let mut rows = sheet.rows();
    let header: Vec<Option<String>> = rows
        .next()
        .map(|r| r.iter().map(cell_as_string).collect())
        .unwrap_or_default();
    let expected: Vec<Option<String>> = REPORT_COLUMNS
        .iter()
        .map(|c| Some(c.to_string()))
        .collect();
    if header.len() < expected.len() || header[..expected.len()] != expected[..] {
        return Err(QuittungError::Spreadsheet(format!(
            "not a report sheet: expected header {}",
            REPORT_COLUMNS.join(", ")
        )));
    }

    let mut report = ReportTable::default();
    for (i, row) in rows.enumerate() {
        // spreadsheet row number, header is row 1
        let line = i + 2;
        let artikel = row.first().and_then(cell_as_string);
        let Some(artikel) = artikel else {
            continue;
        };
        report.rows.push(ReportRow {
            artikel,
            menge: required_f64(row, 1, line)?,
            einzel_preis: cell_as_f64(row.get(2), line)?,
            aktion_preis: cell_as_f64(row.get(3), line)?,
            total_preis: required_f64(row, 4, line)?,
            rabatt: cell_as_f64(row.get(5), line)?,
            assigned_to: row.get(6).and_then(cell_as_string),
        });
    }

    Ok(report)
}

fn cell_as_string(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Empty => None,
        _ => Some(format!("{cell}")),
    }
}

fn cell_as_f64(cell: Option<&Data>, line: usize) -> Result<Option<f64>, QuittungError> {
    match cell {
        None | Some(Data::Empty) => Ok(None),
        Some(Data::Float(f)) => Ok(Some(*f)),
        Some(Data::Int(i)) => Ok(Some(*i as f64)),
        Some(Data::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Data::String(s)) => s.trim().parse().map(Some).map_err(|_| {
            QuittungError::Spreadsheet(format!("row {line}: '{s}' is not a number"))
        }),
        Some(other) => Err(QuittungError::Spreadsheet(format!(
            "row {line}: unexpected cell {other}"
        ))),
    }
}

fn required_f64(row: &[Data], col: usize, line: usize) -> Result<f64, QuittungError> {
    cell_as_f64(row.get(col), line)?.ok_or_else(|| {
        QuittungError::Spreadsheet(format!("row {line}: {} is empty", REPORT_COLUMNS[col]))
    })
}
