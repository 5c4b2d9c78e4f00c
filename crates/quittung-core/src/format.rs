use crate::error::QuittungError;
use crate::model::{FormattedRow, FormattedTable, RawTable, TABLE_COLUMNS};
use tracing::debug;

/// Normalize an extracted table into typed line items.
///
/// Keeps the first five columns, drops a first row that repeats the column
/// names, and parses the numeric columns. Empty cells become missing values.
pub fn format_table(raw: &RawTable) -> Result<FormattedTable, QuittungError> {
    if raw.is_empty() {
        return Err(QuittungError::EmptyTable);
    }

    let found = raw.column_count();
    if found < TABLE_COLUMNS.len() {
        return Err(QuittungError::ShapeMismatch {
            expected: TABLE_COLUMNS.len(),
            found,
        });
    }
    if found > TABLE_COLUMNS.len() {
        debug!("dropping {} extra column(s)", found - TABLE_COLUMNS.len());
    }

    let skip = usize::from(is_header_row(&raw.rows[0]));
    if skip == 1 {
        debug!("first row repeats the column names, dropping it");
    }

    // line items are numbered from 1, after any dropped header row
    let rows = raw
        .rows
        .iter()
        .skip(skip)
        .enumerate()
        .map(|(i, row)| format_row(i + 1, row))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FormattedTable { rows })
}

fn is_header_row(row: &[Option<String>]) -> bool {
    row.iter()
        .take(TABLE_COLUMNS.len())
        .flatten()
        .any(|cell| TABLE_COLUMNS.contains(&cell.trim()))
}

fn format_row(line_item: usize, row: &[Option<String>]) -> Result<FormattedRow, QuittungError> {
    let cell = |col: usize| row.get(col).and_then(|c| c.as_deref());
    let number = |col: usize| parse_number(line_item, TABLE_COLUMNS[col], cell(col));

    Ok(FormattedRow {
        artikel: cell(0)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        menge: number(1)?,
        preis: number(2)?,
        aktion: number(3)?,
        total: number(4)?,
    })
}

fn parse_number(
    row: usize,
    column: &'static str,
    value: Option<&str>,
) -> Result<Option<f64>, QuittungError> {
    let Some(value) = value.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|_| QuittungError::Coercion {
            row,
            column,
            value: value.to_string(),
        })
}
