//! Bounded search for the line-item table of a receipt.
//!
//! A full-page region usually reaches into the receipt's summary block, so
//! the search moves the bottom edge up step by step until the captured table
//! passes the acceptance check.

use crate::config::SearchSettings;
use crate::error::QuittungError;
use crate::extraction::{ExtractionRequest, TableExtractor};
use crate::model::RawTable;
use crate::template::TemplateStore;
use std::path::Path;
use tracing::debug;

/// Decides whether an extracted table is the line-item body.
pub trait AcceptTable {
    fn accept(&self, table: &RawTable) -> bool;
}

impl<F> AcceptTable for F
where
    F: Fn(&RawTable) -> bool,
{
    fn accept(&self, table: &RawTable) -> bool {
        self(table)
    }
}

/// Rejects tables that contain a footer marker cell such as "Total CHF".
#[derive(Debug, Clone)]
pub struct RejectSentinel {
    sentinel: String,
}

impl RejectSentinel {
    pub fn new(sentinel: impl Into<String>) -> Self {
        RejectSentinel {
            sentinel: sentinel.into(),
        }
    }
}

impl AcceptTable for RejectSentinel {
    fn accept(&self, table: &RawTable) -> bool {
        !table.cells().any(|c| c.trim() == self.sentinel)
    }
}

/// The table that was found and the offset that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedTable {
    pub table: RawTable,
    /// `None` when the table came from the template-free first attempt.
    pub offset: Option<u32>,
}

pub struct TableLocator<'a> {
    extractor: &'a dyn TableExtractor,
    templates: &'a TemplateStore,
    search: &'a SearchSettings,
    acceptance: &'a dyn AcceptTable,
}

impl<'a> TableLocator<'a> {
    pub fn new(
        extractor: &'a dyn TableExtractor,
        templates: &'a TemplateStore,
        search: &'a SearchSettings,
        acceptance: &'a dyn AcceptTable,
    ) -> Self {
        TableLocator {
            extractor,
            templates,
            search,
            acceptance,
        }
    }

    /// Find the line-item table of the document at `path`.
    ///
    /// Returns `Ok(None)` when no offset up to the configured maximum yields
    /// an acceptable table. Extraction and template errors propagate.
    pub fn locate(&self, path: &Path) -> Result<Option<LocatedTable>, QuittungError> {
        let request = ExtractionRequest::stream(self.search.page, None);
        let tables = self.extractor.extract(path, &request)?;
        if let Some(table) = tables.into_iter().next() {
            debug!("table found without template");
            return Ok(Some(LocatedTable {
                table,
                offset: None,
            }));
        }

        let baseline = self.templates.load_baseline()?;
        for offset in self.search.offsets() {
            let template = self.templates.derive(&baseline, offset)?;
            let Some(area) = template.area_for_page(self.search.page) else {
                debug!("template has no region for page {}", self.search.page);
                return Ok(None);
            };

            let request = ExtractionRequest::stream(self.search.page, Some(area));
            let Some(table) = self.extractor.extract(path, &request)?.into_iter().next() else {
                debug!("offset {offset}: no table");
                continue;
            };

            if !self.acceptance.accept(&table) {
                debug!("offset {offset}: table rejected, region still reaches the footer");
                continue;
            }

            debug!("successful read using template with offset {offset}");
            return Ok(Some(LocatedTable {
                table,
                offset: Some(offset),
            }));
        }

        Ok(None)
    }
}
