pub mod pdftotext;
pub mod stream;

use crate::error::QuittungError;
use crate::model::RawTable;
use std::path::Path;

/// Rectangle on a page in PDF points, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Area {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Area {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}

/// A word and its bounding box as reported by the PDF backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl Word {
    pub fn center_x(&self) -> f32 {
        (self.x_min + self.x_max) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.y_min + self.y_max) / 2.0
    }

    pub fn height(&self) -> f32 {
        (self.y_max - self.y_min).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    /// 1-based page number.
    pub page: u32,
    /// Region to read; `None` lets the backend find tables on the whole page.
    pub area: Option<Area>,
    /// Return everything found as one table instead of splitting into blocks.
    pub single_table: bool,
}

impl ExtractionRequest {
    /// Single-table request; columns are inferred from whitespace between words.
    pub fn stream(page: u32, area: Option<Area>) -> Self {
        ExtractionRequest {
            page,
            area,
            single_table: true,
        }
    }
}

/// Trait for table extraction backends.
pub trait TableExtractor {
    /// Extract tables from the PDF at `path`. An empty vec means nothing matched.
    fn extract(
        &self,
        path: &Path,
        request: &ExtractionRequest,
    ) -> Result<Vec<RawTable>, QuittungError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
