use quittung_core::model::{ReportRow, ReportTable, REPORT_COLUMNS};

/// Render a report as an aligned plain-text table.
pub fn format_report(report: &ReportTable) -> String {
    let rows: Vec<[String; 7]> = report.rows.iter().map(row_cells).collect();

    let mut widths = REPORT_COLUMNS.map(str::len);
    for cells in &rows {
        for (w, cell) in widths.iter_mut().zip(cells) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &REPORT_COLUMNS.map(String::from), &widths);
    let rule_len = widths.iter().sum::<usize>() + 2 * (widths.len() - 1);
    out.push_str(&"-".repeat(rule_len));
    out.push('\n');
    for cells in &rows {
        push_line(&mut out, cells, &widths);
    }

    if rows.is_empty() {
        out.push_str("(no articles)\n");
    } else {
        let total: f64 = report.rows.iter().map(|r| r.total_preis).sum();
        let rabatt: f64 = report.rows.iter().filter_map(|r| r.rabatt).sum();
        out.push_str(&format!(
            "\n{} article(s), total {:.2}, discount {:.2}\n",
            rows.len(),
            total,
            rabatt
        ));
    }
    out
}

fn row_cells(row: &ReportRow) -> [String; 7] {
    [
        row.artikel.clone(),
        format_number(Some(row.menge)),
        format_amount(row.einzel_preis),
        format_amount(row.aktion_preis),
        format_amount(Some(row.total_preis)),
        format_amount(row.rabatt),
        row.assigned_to.clone().unwrap_or_default(),
    ]
}

fn format_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn format_amount(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

fn push_line(out: &mut String, cells: &[String; 7], widths: &[usize; 7]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, &width))| {
            // article and assignee are text, the rest are numbers
            if i == 0 || i == 6 {
                format!("{cell:<width$}")
            } else {
                format!("{cell:>width$}")
            }
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}
