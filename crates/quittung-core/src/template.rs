//! Extraction region templates and the offset adjuster.
//!
//! Templates use the JSON layout of tabula-style template files: an array of
//! regions in PDF points, origin at the top-left corner of the page.

use crate::error::QuittungError;
use crate::extraction::Area;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const FULL_PAGE_TEMPLATE_JSON: &str = include_str!("../../../templates/full_page_table_template.json");

/// One rectangular region of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_method: Option<String>,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub width: f64,
    pub height: f64,
    /// Metadata this crate does not interpret, kept so saving is lossless.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Region {
    pub fn area(&self) -> Area {
        Area {
            left: self.x1 as f32,
            top: self.y1 as f32,
            right: self.x2 as f32,
            bottom: self.y2 as f32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template {
    pub regions: Vec<Region>,
}

impl Template {
    /// Parse a template from JSON. A template must have at least one region.
    pub fn from_json(json: &str) -> Result<Template, serde_json::Error> {
        let template: Template = serde_json::from_str(json)?;
        if template.regions.is_empty() {
            return Err(serde::de::Error::custom("template has no regions"));
        }
        Ok(template)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Area of the first region on `page`, if any.
    pub fn area_for_page(&self, page: u32) -> Option<Area> {
        self.regions
            .iter()
            .find(|r| r.page == page)
            .map(Region::area)
    }
}

/// The A4 full-page template shipped with the crate.
pub fn builtin_full_page() -> Result<Template, QuittungError> {
    Ok(Template::from_json(FULL_PAGE_TEMPLATE_JSON)?)
}

/// Shrink the bottom edge of the first region of `baseline` by `offset` points.
pub fn derive_template(baseline: &Template, offset: u32) -> Template {
    let mut derived = baseline.clone();
    if let Some(region) = derived.regions.first_mut() {
        region.y2 -= f64::from(offset);
        region.height -= f64::from(offset);
    }
    derived
}

/// Baseline template file plus an optional working-template file.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    baseline: PathBuf,
    working: Option<PathBuf>,
}

impl TemplateStore {
    pub fn new(baseline: impl Into<PathBuf>, working: Option<PathBuf>) -> Self {
        TemplateStore {
            baseline: baseline.into(),
            working,
        }
    }

    /// Read the full-page baseline template.
    pub fn load_baseline(&self) -> Result<Template, QuittungError> {
        load_template(&self.baseline)
    }

    /// Derive the template for `offset` and write it to the working path,
    /// replacing whatever the previous attempt left there.
    pub fn derive(&self, baseline: &Template, offset: u32) -> Result<Template, QuittungError> {
        let derived = derive_template(baseline, offset);
        if let Some(ref path) = self.working {
            save_template(&derived, path)?;
            debug!("wrote working template for offset {offset} to {}", path.display());
        }
        Ok(derived)
    }
}

/// Load a template from a JSON file.
pub fn load_template(path: &Path) -> Result<Template, QuittungError> {
    let content = std::fs::read_to_string(path).map_err(|e| QuittungError::TemplateLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Template::from_json(&content).map_err(|e| QuittungError::TemplateLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Write a template as JSON, creating the parent directory if needed.
pub fn save_template(template: &Template, path: &Path) -> Result<(), QuittungError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, template.to_json()?)?;
    Ok(())
}
