//! Integration tests for the locate → format → aggregate → export pipeline.
//!
//! Uses a MockExtractor that answers each request from a script instead of
//! invoking pdftotext, so these tests run without poppler-utils.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use quittung_core::config::Settings;
use quittung_core::error::QuittungError;
use quittung_core::extraction::stream::{detect_tables, StreamOptions};
use quittung_core::extraction::{ExtractionRequest, TableExtractor, Word};
use quittung_core::locate::{RejectSentinel, TableLocator};
use quittung_core::model::RawTable;
use quittung_core::spreadsheet::read_report;
use quittung_core::template::{load_template, TemplateStore};
use quittung_core::{extract_report, process_document, run_batch, DocumentOutcome};

type Script = Box<dyn Fn(&Path, &ExtractionRequest) -> Result<Vec<RawTable>, QuittungError>>;

struct MockExtractor {
    script: Script,
    calls: RefCell<Vec<ExtractionRequest>>,
}

impl MockExtractor {
    fn new(
        script: impl Fn(&Path, &ExtractionRequest) -> Result<Vec<RawTable>, QuittungError> + 'static,
    ) -> Self {
        MockExtractor {
            script: Box::new(script),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl TableExtractor for MockExtractor {
    fn extract(
        &self,
        path: &Path,
        request: &ExtractionRequest,
    ) -> Result<Vec<RawTable>, QuittungError> {
        self.calls.borrow_mut().push(request.clone());
        (self.script)(path, request)
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

/// Baseline region: top 20, bottom 800.
const BASELINE: &str = r#"[
  {"page": 1, "extraction_method": "guess", "x1": 0.0, "x2": 595.0,
   "y1": 20.0, "y2": 800.0, "width": 595.0, "height": 780.0}
]"#;

struct Workspace {
    _dir: tempfile::TempDir,
    settings: Settings,
}

fn workspace(max_offset: u32) -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("pdfs_to_process")).unwrap();
    std::fs::create_dir_all(root.join("templates")).unwrap();
    std::fs::write(
        root.join("templates/full_page_table_template.json"),
        BASELINE,
    )
    .unwrap();

    let mut settings = Settings::default();
    settings.paths.input_dir = root.join("pdfs_to_process");
    settings.paths.output_dir = root.join("processed");
    settings.paths.full_page_template = root.join("templates/full_page_table_template.json");
    settings.paths.working_template = Some(root.join("templates/template.json"));
    settings.search.max_offset = max_offset;

    Workspace {
        _dir: dir,
        settings,
    }
}

fn add_document(ws: &Workspace, name: &str) -> PathBuf {
    let path = ws.settings.paths.input_dir.join(name);
    std::fs::write(&path, b"%PDF-1.4").unwrap();
    path
}

fn body_table() -> RawTable {
    RawTable::from_strings(&[
        &["Artikel", "Menge", "Preis", "Aktion", "Total"],
        &["Milk", "2", "3.00", "3.00", "6.00"],
        &["Bread", "1", "5.00", "4.00", "4.00", "A"],
        &["Milk", "-1", "3.00", "3.00", "-3.00"],
    ])
}

fn footer_table() -> RawTable {
    let mut t = body_table();
    t.rows
        .push(vec![Some("Total CHF".into()), None, None, None, Some("7.00".into())]);
    t
}

/// Region that reaches down to 760 or lower no longer includes the footer.
fn shrinking_receipt(_: &Path, request: &ExtractionRequest) -> Result<Vec<RawTable>, QuittungError> {
    Ok(match request.area {
        None => vec![],
        Some(area) if area.bottom > 760.0 => vec![footer_table()],
        Some(_) => vec![body_table()],
    })
}

fn locate(ws: &Workspace, extractor: &MockExtractor) -> Option<quittung_core::locate::LocatedTable> {
    let templates = TemplateStore::new(
        ws.settings.paths.full_page_template.clone(),
        ws.settings.paths.working_template.clone(),
    );
    let acceptance = RejectSentinel::new("Total CHF");
    TableLocator::new(extractor, &templates, &ws.settings.search, &acceptance)
        .locate(Path::new("receipt.pdf"))
        .unwrap()
}

// ---------------------------------------------------------------------------
// Locator
// ---------------------------------------------------------------------------
#[test]
fn fast_path_returns_first_table_without_template() {
    let ws = workspace(600);
    let extractor = MockExtractor::new(|_, req| {
        assert!(req.area.is_none());
        Ok(vec![body_table(), footer_table()])
    });

    let located = locate(&ws, &extractor).unwrap();
    assert_eq!(located.offset, None);
    assert_eq!(located.table, body_table());
    assert_eq!(extractor.call_count(), 1);

    let first = &extractor.calls.borrow()[0];
    assert_eq!(first.page, 1);
    assert!(first.single_table);
}

#[test]
fn retries_until_sentinel_disappears() {
    let ws = workspace(600);
    let extractor = MockExtractor::new(shrinking_receipt);

    let located = locate(&ws, &extractor).unwrap();
    assert_eq!(located.offset, Some(40));
    assert_eq!(located.table, body_table());
    // fast path + offsets 10, 20, 30, 40
    assert_eq!(extractor.call_count(), 5);

    let bottoms: Vec<f32> = extractor
        .calls
        .borrow()
        .iter()
        .filter_map(|r| r.area.map(|a| a.bottom))
        .collect();
    assert_eq!(bottoms, vec![790.0, 780.0, 770.0, 760.0]);
}

#[test]
fn empty_extractions_are_skipped() {
    let ws = workspace(600);
    let extractor = MockExtractor::new(|_, req| {
        Ok(match req.area {
            Some(area) if area.bottom <= 770.0 => vec![body_table()],
            _ => vec![],
        })
    });

    let located = locate(&ws, &extractor).unwrap();
    assert_eq!(located.offset, Some(30));
}

#[test]
fn exhausted_search_returns_none_and_never_exceeds_max() {
    let ws = workspace(50);
    let extractor = MockExtractor::new(|_, req| {
        Ok(match req.area {
            None => vec![],
            Some(_) => vec![footer_table()],
        })
    });

    assert!(locate(&ws, &extractor).is_none());
    // fast path + offsets 10..=50
    assert_eq!(extractor.call_count(), 6);
    let lowest = extractor
        .calls
        .borrow()
        .iter()
        .filter_map(|r| r.area.map(|a| a.bottom))
        .fold(f32::INFINITY, f32::min);
    assert_eq!(lowest, 750.0);
}

#[test]
fn working_template_holds_accepted_offset() {
    let ws = workspace(600);
    let extractor = MockExtractor::new(shrinking_receipt);
    locate(&ws, &extractor).unwrap();

    let working = ws.settings.paths.working_template.as_ref().unwrap();
    let template = load_template(working).unwrap();
    assert_eq!(template.regions[0].y2, 760.0);
    assert_eq!(template.regions[0].height, 740.0);
}

#[test]
fn acceptance_predicate_is_injectable() {
    let ws = workspace(600);
    let templates = TemplateStore::new(ws.settings.paths.full_page_template.clone(), None);
    let extractor = MockExtractor::new(|_, req| {
        Ok(match req.area {
            None => vec![],
            Some(area) => vec![RawTable::from_strings(&[&[&area.bottom.to_string()]])],
        })
    });
    let at_780 = |t: &RawTable| t.cells().any(|c| c == "780");

    let located = TableLocator::new(&extractor, &templates, &ws.settings.search, &at_780)
        .locate(Path::new("receipt.pdf"))
        .unwrap()
        .unwrap();
    assert_eq!(located.offset, Some(20));
}

#[test]
fn extraction_error_propagates() {
    let ws = workspace(600);
    let templates = TemplateStore::new(ws.settings.paths.full_page_template.clone(), None);
    let acceptance = RejectSentinel::new("Total CHF");
    let extractor = MockExtractor::new(|_, _| Err(QuittungError::Extraction("boom".into())));

    let result = TableLocator::new(&extractor, &templates, &ws.settings.search, &acceptance)
        .locate(Path::new("receipt.pdf"));
    assert!(matches!(result, Err(QuittungError::Extraction(_))));
}

#[test]
fn missing_baseline_only_matters_when_fast_path_fails() {
    let ws = workspace(600);
    let templates = TemplateStore::new("no/such/template.json", None);
    let acceptance = RejectSentinel::new("Total CHF");

    let fast = MockExtractor::new(|_, _| Ok(vec![body_table()]));
    assert!(
        TableLocator::new(&fast, &templates, &ws.settings.search, &acceptance)
            .locate(Path::new("receipt.pdf"))
            .unwrap()
            .is_some()
    );

    let slow = MockExtractor::new(shrinking_receipt);
    let result = TableLocator::new(&slow, &templates, &ws.settings.search, &acceptance)
        .locate(Path::new("receipt.pdf"));
    assert!(matches!(result, Err(QuittungError::TemplateLoad { .. })));
}

// ---------------------------------------------------------------------------
// Word layout
// ---------------------------------------------------------------------------

/// Word at `(x, y)`, 6pt per character and 10pt high.
fn word(text: &str, x: f32, y: f32) -> Word {
    Word {
        text: text.to_string(),
        x_min: x,
        y_min: y,
        x_max: x + 6.0 * text.chars().count() as f32,
        y_max: y + 10.0,
    }
}

fn item(name: &str, values: [&str; 4], y: f32) -> Vec<Word> {
    let mut words = vec![word(name, 40.0, y)];
    for (value, x) in values.into_iter().zip([210.0, 262.0, 326.0, 404.0]) {
        words.push(word(value, x, y));
    }
    words
}

fn shop_header() -> Vec<Word> {
    vec![
        word("Migros", 40.0, 40.0),
        word("Filiale", 40.0, 54.0),
        word("Bern", 200.0, 54.0),
        word("Datum", 40.0, 68.0),
        word("12.03.2024", 200.0, 68.0),
    ]
}

fn footer(total: &str, y: f32) -> Vec<Word> {
    vec![word("Total", 40.0, y), word("CHF", 76.0, y), word(total, 404.0, y)]
}

/// Extractor that runs stream detection over a fixed page of words.
fn page_extractor(words: Vec<Word>) -> MockExtractor {
    MockExtractor::new(move |_, req| {
        Ok(detect_tables(
            &words,
            req.area.as_ref(),
            req.single_table,
            &StreamOptions::default(),
        ))
    })
}

#[test]
fn receipt_page_reads_line_items_without_template() {
    let ws = workspace(600);
    let mut words = shop_header();
    words.extend(item("Artikel", ["Menge", "Preis", "Aktion", "Total"], 700.0));
    words.extend(item("Milch", ["2", "1.60", "1.60", "3.20"], 714.0));
    words.extend(item("Brot", ["1", "4.50", "3.90", "3.90"], 728.0));
    words.extend(footer("7.10", 742.0));
    let extractor = page_extractor(words);

    let acceptance = RejectSentinel::new("Total CHF");
    let (report, offset) = extract_report(
        Path::new("receipt.pdf"),
        &extractor,
        &ws.settings,
        &acceptance,
    )
    .unwrap()
    .unwrap();

    assert_eq!(offset, None);
    assert_eq!(extractor.call_count(), 1);
    let articles: Vec<(&str, f64)> = report
        .rows
        .iter()
        .map(|r| (r.artikel.as_str(), r.menge))
        .collect();
    assert_eq!(articles, vec![("Milch", 2.0), ("Brot", 1.0)]);
}

#[test]
fn single_item_receipt_found_by_template_search() {
    let ws = workspace(600);
    let mut words = shop_header();
    words.extend(item("Milch", ["2", "1.60", "1.60", "3.20"], 730.0));
    // footer centre at 765: inside the region until its bottom is 760
    words.extend(footer("3.20", 760.0));
    let extractor = page_extractor(words);

    let acceptance = RejectSentinel::new("Total CHF");
    let (report, offset) = extract_report(
        Path::new("receipt.pdf"),
        &extractor,
        &ws.settings,
        &acceptance,
    )
    .unwrap()
    .unwrap();

    assert_eq!(offset, Some(40));
    // fast path + offsets 10, 20, 30, 40
    assert_eq!(extractor.call_count(), 5);
    assert_eq!(report.len(), 1);
    assert_eq!(report.rows[0].artikel, "Milch");
    assert_eq!(report.rows[0].menge, 2.0);
    assert_eq!(report.rows[0].total_preis, 3.2);
    assert_eq!(report.rows[0].rabatt, Some(0.0));
}

// ---------------------------------------------------------------------------
// Whole document
// ---------------------------------------------------------------------------
#[test]
fn document_exported_as_aggregated_spreadsheet() {
    let ws = workspace(600);
    let pdf = add_document(&ws, "migros.pdf");
    let extractor = MockExtractor::new(shrinking_receipt);
    let acceptance = RejectSentinel::new("Total CHF");

    let outcome = process_document(&pdf, &extractor, &ws.settings, &acceptance).unwrap();
    let output = ws.settings.paths.output_dir.join("migros.xlsx");
    assert_eq!(
        outcome,
        DocumentOutcome::Exported {
            output: output.clone(),
            articles: 2,
            offset: Some(40),
        }
    );

    let report = read_report(&output).unwrap();
    assert_eq!(report.len(), 2);

    let milk = &report.rows[0];
    assert_eq!(milk.artikel, "Milk");
    assert_eq!(milk.menge, 1.0);
    assert_eq!(milk.einzel_preis, Some(3.0));
    assert_eq!(milk.aktion_preis, Some(3.0));
    assert_eq!(milk.total_preis, 3.0);
    assert_eq!(milk.rabatt, Some(0.0));
    assert_eq!(milk.assigned_to, None);

    let bread = &report.rows[1];
    assert_eq!(bread.artikel, "Bread");
    assert_eq!(bread.rabatt, Some(1.0));
}

#[test]
fn format_then_aggregate_is_repeatable() {
    let raw = body_table();
    let first = quittung_core::aggregate::aggregate(&quittung_core::format::format_table(&raw).unwrap());
    let second =
        quittung_core::aggregate::aggregate(&quittung_core::format::format_table(&raw).unwrap());
    assert_eq!(first, second);
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------
#[test]
fn batch_isolates_failures() {
    let ws = workspace(100);
    add_document(&ws, "a_good.pdf");
    add_document(&ws, "b_currency.pdf");
    add_document(&ws, "c_blank.pdf");
    add_document(&ws, "d_broken.pdf");
    std::fs::write(ws.settings.paths.input_dir.join(".gitkeep"), b"").unwrap();

    let extractor = MockExtractor::new(|path, req| {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        match name.as_str() {
            "a_good.pdf" => shrinking_receipt(path, req),
            "b_currency.pdf" => Ok(vec![RawTable::from_strings(&[&[
                "Milk", "2", "CHF 3.00", "3.00", "6.00",
            ]])]),
            "c_blank.pdf" => Ok(vec![]),
            _ => Err(QuittungError::PdftotextFailed {
                code: 1,
                stderr: "Syntax Error: Couldn't find trailer dictionary".into(),
            }),
        }
    });

    let summary = run_batch(&ws.settings, &extractor).unwrap();
    assert_eq!(summary.total(), 4);
    assert_eq!(summary.processed.len(), 1);
    assert_eq!(summary.no_table.len(), 1);
    assert_eq!(summary.failed.len(), 2);
    assert!(summary.failed[0].0.ends_with("b_currency.pdf"));
    assert!(summary.failed[1].0.ends_with("d_broken.pdf"));

    let mut written: Vec<String> = std::fs::read_dir(&ws.settings.paths.output_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    written.sort();
    assert_eq!(written, vec!["a_good.xlsx"]);
}

#[test]
fn batch_rejects_invalid_settings() {
    let mut ws = workspace(100);
    ws.settings.search.step = 0;
    let extractor = MockExtractor::new(|_, _| Ok(vec![]));
    assert!(matches!(
        run_batch(&ws.settings, &extractor),
        Err(QuittungError::Config(_))
    ));
    assert_eq!(extractor.call_count(), 0);
}
