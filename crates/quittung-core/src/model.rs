use serde::{Deserialize, Serialize};

/// Column names of a formatted line-item table, in positional order.
pub const TABLE_COLUMNS: [&str; 5] = ["Artikel", "Menge", "Preis", "Aktion", "Total"];

/// Column names of the exported report, in output order.
pub const REPORT_COLUMNS: [&str; 7] = [
    "Artikel",
    "Menge",
    "EinzelPreis",
    "AktionPreis",
    "TotalPreis",
    "Rabatt",
    "Assigned_to",
];

/// A grid of cells as returned by a table extractor. Empty cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<Option<String>>>) -> Self {
        RawTable { rows }
    }

    /// Build a table from string literals, treating `""` as an empty cell.
    pub fn from_strings(rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        if cell.is_empty() {
                            None
                        } else {
                            Some(cell.to_string())
                        }
                    })
                    .collect()
            })
            .collect();
        RawTable { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Widest row; rows of a raw table may be ragged.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Iterate over all non-empty cell values.
    pub fn cells(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .flat_map(|row| row.iter().filter_map(|c| c.as_deref()))
    }
}

/// One typed line item. Missing values come from empty source cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedRow {
    pub artikel: Option<String>,
    pub menge: Option<f64>,
    pub preis: Option<f64>,
    pub aktion: Option<f64>,
    pub total: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormattedTable {
    pub rows: Vec<FormattedRow>,
}

/// One article of the final report, net of returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "Artikel")]
    pub artikel: String,
    #[serde(rename = "Menge")]
    pub menge: f64,
    #[serde(rename = "EinzelPreis")]
    pub einzel_preis: Option<f64>,
    #[serde(rename = "AktionPreis")]
    pub aktion_preis: Option<f64>,
    #[serde(rename = "TotalPreis")]
    pub total_preis: f64,
    #[serde(rename = "Rabatt")]
    pub rabatt: Option<f64>,
    #[serde(rename = "Assigned_to")]
    pub assigned_to: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportTable {
    pub rows: Vec<ReportRow>,
}

impl ReportTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
