use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum QuittungError {
    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("failed to load template from {path}: {reason}")]
    TemplateLoad { path: PathBuf, reason: String },

    #[error("extracted table has no rows")]
    EmptyTable,

    #[error("extracted table has {found} column(s), expected at least {expected}")]
    ShapeMismatch { expected: usize, found: usize },

    #[error("line item {row}: cannot read '{value}' in column {column} as a number")]
    Coercion {
        /// 1-based line item, not counting a dropped header row.
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}
