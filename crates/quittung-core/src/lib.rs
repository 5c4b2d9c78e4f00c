pub mod aggregate;
pub mod config;
pub mod error;
pub mod extraction;
pub mod format;
pub mod locate;
pub mod model;
pub mod spreadsheet;
pub mod template;

use std::path::{Path, PathBuf};

use tracing::{error, info, info_span};

use config::Settings;
use error::QuittungError;
use extraction::TableExtractor;
use locate::{AcceptTable, RejectSentinel, TableLocator};
use model::ReportTable;
use template::TemplateStore;

/// Log line bracketing the output of each document.
pub const LOG_SEPARATOR: &str =
    "===================================================================";

/// Placeholder that keeps an empty input directory under version control.
pub const PLACEHOLDER_FILE: &str = ".gitkeep";

/// What happened to a single document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    Exported {
        output: PathBuf,
        articles: usize,
        /// Template offset that isolated the table, `None` for the first attempt.
        offset: Option<u32>,
    },
    NoTable,
}

/// Per-document results of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub processed: Vec<PathBuf>,
    pub no_table: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.processed.len() + self.no_table.len() + self.failed.len()
    }
}

/// Locate, format and aggregate the line items of one receipt.
///
/// Returns `Ok(None)` when no acceptable table was found.
pub fn extract_report(
    pdf_path: &Path,
    extractor: &dyn TableExtractor,
    settings: &Settings,
    acceptance: &dyn AcceptTable,
) -> Result<Option<(ReportTable, Option<u32>)>, QuittungError> {
    let templates = TemplateStore::new(
        settings.paths.full_page_template.clone(),
        settings.paths.working_template.clone(),
    );
    let locator = TableLocator::new(extractor, &templates, &settings.search, acceptance);

    let Some(located) = locator.locate(pdf_path)? else {
        return Ok(None);
    };

    let formatted = format::format_table(&located.table)?;
    let report = aggregate::aggregate(&formatted);
    Ok(Some((report, located.offset)))
}

/// Process one receipt and write its report spreadsheet.
pub fn process_document(
    pdf_path: &Path,
    extractor: &dyn TableExtractor,
    settings: &Settings,
    acceptance: &dyn AcceptTable,
) -> Result<DocumentOutcome, QuittungError> {
    let Some((report, offset)) = extract_report(pdf_path, extractor, settings, acceptance)? else {
        return Ok(DocumentOutcome::NoTable);
    };

    let output = output_path(&settings.paths.output_dir, pdf_path);
    info!("saving table as Excel file...");
    spreadsheet::write_report(&report, &output)?;

    Ok(DocumentOutcome::Exported {
        output,
        articles: report.len(),
        offset,
    })
}

/// Report path for a document: its file name up to the first `.`, as xlsx.
pub fn output_path(output_dir: &Path, pdf_path: &Path) -> PathBuf {
    let name = pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = match name.split('.').next() {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => name,
    };
    output_dir.join(format!("{stem}.xlsx"))
}

/// List the documents to process, sorted by file name.
pub fn list_documents(input_dir: &Path) -> Result<Vec<PathBuf>, QuittungError> {
    let mut documents = Vec::new();
    for entry in std::fs::read_dir(input_dir)? {
        let entry = entry?;
        if entry.file_name() == PLACEHOLDER_FILE || !entry.file_type()?.is_file() {
            continue;
        }
        documents.push(entry.path());
    }
    documents.sort();
    Ok(documents)
}

/// Process every document of the input directory.
///
/// A failing document is logged and counted; it never stops the batch.
/// Only an invalid configuration or an unreadable input directory is an error.
pub fn run_batch(
    settings: &Settings,
    extractor: &dyn TableExtractor,
) -> Result<BatchSummary, QuittungError> {
    settings.validate()?;
    let documents = list_documents(&settings.paths.input_dir)?;
    let acceptance = RejectSentinel::new(settings.search.sentinel.clone());
    let mut summary = BatchSummary::default();

    info!(
        "processing {} document(s) from {} with {}",
        documents.len(),
        settings.paths.input_dir.display(),
        extractor.backend_name()
    );

    for path in documents {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let span = info_span!("document", file = %name);
        let _guard = span.enter();

        info!("{LOG_SEPARATOR}");
        info!("reading table from file {name}...");
        match process_document(&path, extractor, settings, &acceptance) {
            Ok(DocumentOutcome::Exported {
                output, articles, ..
            }) => {
                info!("saved {articles} article(s) to {}", output.display());
                summary.processed.push(path);
            }
            Ok(DocumentOutcome::NoTable) => {
                info!("could not read any tables from file {name}");
                summary.no_table.push(path);
            }
            Err(e) => {
                error!("{e}");
                summary.failed.push((path, e.to_string()));
            }
        }
        info!("{LOG_SEPARATOR}");
    }

    info!(
        "batch complete: {} exported, {} without table, {} failed",
        summary.processed.len(),
        summary.no_table.len(),
        summary.failed.len()
    );
    Ok(summary)
}
