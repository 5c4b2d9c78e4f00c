use crate::error::QuittungError;
use crate::model::{ReportRow, ReportTable, REPORT_COLUMNS};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::{Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const SHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

enum CellValue<'a> {
    Text(&'a str),
    Number(f64),
    Empty,
}

impl<'a> CellValue<'a> {
    fn number(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => CellValue::Number(v),
            _ => CellValue::Empty,
        }
    }

    fn text(value: Option<&'a str>) -> Self {
        value.map_or(CellValue::Empty, CellValue::Text)
    }
}

fn report_cells(row: &ReportRow) -> [CellValue<'_>; 7] {
    [
        CellValue::Text(&row.artikel),
        CellValue::number(Some(row.menge)),
        CellValue::number(row.einzel_preis),
        CellValue::number(row.aktion_preis),
        CellValue::number(Some(row.total_preis)),
        CellValue::number(row.rabatt),
        CellValue::text(row.assigned_to.as_deref()),
    ]
}

/// Write `report` to `path` as an xlsx workbook.
///
/// The workbook is assembled in a temporary file next to `path` and moved
/// into place at the end, so a failure never leaves a partial file behind.
pub fn write_report(report: &ReportTable, path: &Path) -> Result<(), QuittungError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    write_workbook(report, tmp.as_file_mut())?;
    tmp.persist(path).map_err(|e| QuittungError::Io(e.error))?;
    Ok(())
}

/// Write `report` as an xlsx workbook with a single sheet to `out`.
pub fn write_workbook<W: Write + Seek>(report: &ReportTable, out: W) -> Result<W, QuittungError> {
    let mut zip = ZipWriter::new(out);
    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", ROOT_RELS_XML),
        ("xl/workbook.xml", WORKBOOK_XML),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML),
    ];
    for (name, xml) in parts {
        zip.start_file(name, file_options())?;
        zip.write_all(xml.as_bytes())?;
    }

    zip.start_file("xl/worksheets/sheet1.xml", file_options())?;
    zip.write_all(&sheet_xml(report)?)?;

    Ok(zip.finish()?)
}

fn file_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

fn sheet_xml(report: &ReportTable) -> Result<Vec<u8>, QuittungError> {
    let mut writer = Writer::new(Vec::new());
    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))),
    )?;

    let mut worksheet = BytesStart::new("worksheet");
    worksheet.push_attribute(("xmlns", SHEET_NS));
    emit(&mut writer, Event::Start(worksheet))?;
    emit(&mut writer, Event::Start(BytesStart::new("sheetData")))?;

    let header = REPORT_COLUMNS.map(CellValue::Text);
    write_row(&mut writer, 1, &header)?;
    for (i, row) in report.rows.iter().enumerate() {
        write_row(&mut writer, i + 2, &report_cells(row))?;
    }

    emit(&mut writer, Event::End(BytesEnd::new("sheetData")))?;
    emit(&mut writer, Event::End(BytesEnd::new("worksheet")))?;
    Ok(writer.into_inner())
}

fn write_row(
    writer: &mut Writer<Vec<u8>>,
    row_number: usize,
    cells: &[CellValue],
) -> Result<(), QuittungError> {
    let row_ref = row_number.to_string();
    let mut row = BytesStart::new("row");
    row.push_attribute(("r", row_ref.as_str()));
    emit(writer, Event::Start(row))?;

    for (col, value) in cells.iter().enumerate() {
        let cell_ref = format!("{}{}", column_letter(col), row_number);
        match value {
            CellValue::Empty => {}
            CellValue::Number(n) => {
                let mut c = BytesStart::new("c");
                c.push_attribute(("r", cell_ref.as_str()));
                emit(writer, Event::Start(c))?;
                emit(writer, Event::Start(BytesStart::new("v")))?;
                emit(writer, Event::Text(BytesText::new(&n.to_string())))?;
                emit(writer, Event::End(BytesEnd::new("v")))?;
                emit(writer, Event::End(BytesEnd::new("c")))?;
            }
            CellValue::Text(s) => {
                let mut c = BytesStart::new("c");
                c.push_attribute(("r", cell_ref.as_str()));
                c.push_attribute(("t", "inlineStr"));
                emit(writer, Event::Start(c))?;
                emit(writer, Event::Start(BytesStart::new("is")))?;
                emit(writer, Event::Start(BytesStart::new("t")))?;
                emit(writer, Event::Text(BytesText::new(s)))?;
                emit(writer, Event::End(BytesEnd::new("t")))?;
                emit(writer, Event::End(BytesEnd::new("is")))?;
                emit(writer, Event::End(BytesEnd::new("c")))?;
            }
        }
    }

    emit(writer, Event::End(BytesEnd::new("row")))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), QuittungError> {
    writer
        .write_event(event)
        .map_err(|e| QuittungError::Spreadsheet(format!("failed to write sheet XML: {e}")))
}

/// Spreadsheet column name for a 0-based index: 0 -> A, 25 -> Z, 26 -> AA.
fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}
