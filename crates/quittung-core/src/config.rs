//! Batch configuration, loadable from a JSON file with every field defaulted.

use crate::error::QuittungError;
use crate::extraction::stream::StreamOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub paths: PathSettings,
    pub search: SearchSettings,
    /// Table detection tuning for the pdftotext backend.
    pub extraction: StreamOptions,
}

/// Where documents, templates and reports live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Directory scanned for source PDFs.
    pub input_dir: PathBuf,

    /// Directory receiving one spreadsheet per processed document.
    pub output_dir: PathBuf,

    /// Immutable full-page region template.
    pub full_page_template: PathBuf,

    /// Where the derived template of the current attempt is written.
    /// `None` keeps derived templates in memory only.
    pub working_template: Option<PathBuf>,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("pdfs_to_process"),
            output_dir: PathBuf::from("processed"),
            full_page_template: PathBuf::from("templates/full_page_table_template.json"),
            working_template: Some(PathBuf::from("templates/template.json")),
        }
    }
}

/// Parameters of the template offset search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// 1-based page the table is read from.
    pub page: u32,

    /// Increment between tried offsets, in points.
    pub step: u32,

    /// Largest offset tried, inclusive.
    pub max_offset: u32,

    /// Cell text marking a region that still reaches into the receipt footer.
    pub sentinel: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            page: 1,
            step: 10,
            max_offset: 600,
            sentinel: "Total CHF".to_string(),
        }
    }
}

impl SearchSettings {
    /// Offsets tried by the search: `step, 2*step, ...` up to `max_offset`.
    pub fn offsets(&self) -> impl Iterator<Item = u32> {
        let step = self.step.max(1) as usize;
        (self.step.max(1)..=self.max_offset).step_by(step)
    }
}

impl Settings {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, QuittungError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| QuittungError::Config(format!("{}: {}", path.display(), e)))?;
        let settings: Settings = serde_json::from_str(&content)
            .map_err(|e| QuittungError::Config(format!("{}: {}", path.display(), e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), QuittungError> {
        if self.search.step == 0 {
            return Err(QuittungError::Config("search.step must be positive".into()));
        }
        if self.search.page == 0 {
            return Err(QuittungError::Config(
                "search.page is 1-based and must be positive".into(),
            ));
        }
        if self.search.sentinel.trim().is_empty() {
            return Err(QuittungError::Config(
                "search.sentinel must not be empty".into(),
            ));
        }
        if self.extraction.min_columns == 0 || self.extraction.min_rows == 0 {
            return Err(QuittungError::Config(
                "extraction.min_columns and extraction.min_rows must be positive".into(),
            ));
        }
        Ok(())
    }
}
