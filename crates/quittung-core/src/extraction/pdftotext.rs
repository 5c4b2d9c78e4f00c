use crate::error::QuittungError;
use crate::extraction::stream::{detect_tables, StreamOptions};
use crate::extraction::{ExtractionRequest, TableExtractor, Word};
use crate::model::RawTable;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;
use std::process::Command;
use tracing::trace;

/// Table extraction backend using pdftotext (from poppler-utils).
///
/// Uses `pdftotext -bbox` to get every word with its bounding box, then
/// rebuilds rows and columns from the word geometry (stream layout).
pub struct PdftotextExtractor {
    options: StreamOptions,
}

impl PdftotextExtractor {
    pub fn new() -> Self {
        PdftotextExtractor {
            options: StreamOptions::default(),
        }
    }

    pub fn with_options(options: StreamOptions) -> Self {
        PdftotextExtractor { options }
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TableExtractor for PdftotextExtractor {
    fn extract(
        &self,
        path: &Path,
        request: &ExtractionRequest,
    ) -> Result<Vec<RawTable>, QuittungError> {
        let words = extract_page_words(path, request.page)?;
        trace!("pdftotext returned {} word(s) on page {}", words.len(), request.page);

        Ok(detect_tables(
            &words,
            request.area.as_ref(),
            request.single_table,
            &self.options,
        ))
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

fn extract_page_words(pdf_path: &Path, page: u32) -> Result<Vec<Word>, QuittungError> {
    let page_arg = page.to_string();
    let output = Command::new("pdftotext")
        .arg("-bbox")
        .args(["-f", &page_arg, "-l", &page_arg])
        .arg(pdf_path)
        .arg("-") // output to stdout
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                QuittungError::PdftotextNotFound
            } else {
                QuittungError::Extraction(format!("pdftotext -bbox failed: {}", e))
            }
        })?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(QuittungError::PdftotextFailed { code, stderr });
    }

    let xhtml = String::from_utf8_lossy(&output.stdout);
    let mut pages = parse_bbox_xhtml(&xhtml)?;
    // -f/-l restrict the output to the requested page
    Ok(if pages.is_empty() {
        Vec::new()
    } else {
        pages.swap_remove(0)
    })
}

/// Parse `pdftotext -bbox` output into the words of each page.
fn parse_bbox_xhtml(xhtml: &str) -> Result<Vec<Vec<Word>>, QuittungError> {
    let mut reader = Reader::from_str(xhtml);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = false;

    let mut pages: Vec<Vec<Word>> = Vec::new();
    let mut current: Option<Word> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"page" => pages.push(Vec::new()),
                b"word" => current = word_from_tag(&e),
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let Some(word) = current.as_mut() {
                    let text = t
                        .unescape()
                        .map_err(|e| QuittungError::Extraction(format!("bad word text: {e}")))?;
                    word.text.push_str(&text);
                }
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"word" => {
                if let Some(word) = current.take() {
                    if word.text.trim().is_empty() {
                        continue;
                    }
                    if pages.is_empty() {
                        pages.push(Vec::new());
                    }
                    if let Some(page) = pages.last_mut() {
                        page.push(word);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(QuittungError::Extraction(format!(
                    "unreadable pdftotext output at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    Ok(pages)
}

fn word_from_tag(tag: &BytesStart) -> Option<Word> {
    let mut word = Word {
        text: String::new(),
        x_min: f32::NAN,
        y_min: f32::NAN,
        x_max: f32::NAN,
        y_max: f32::NAN,
    };

    for attr in tag.attributes().flatten() {
        let value: f32 = attr.unescape_value().ok()?.parse().ok()?;
        match attr.key.as_ref() {
            b"xMin" => word.x_min = value,
            b"yMin" => word.y_min = value,
            b"xMax" => word.x_max = value,
            b"yMax" => word.y_max = value,
            _ => {}
        }
    }

    let coords = [word.x_min, word.y_min, word.x_max, word.y_max];
    if coords.iter().any(|c| c.is_nan()) {
        return None;
    }
    Some(word)
}
