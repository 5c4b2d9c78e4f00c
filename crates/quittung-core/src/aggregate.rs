use crate::model::{FormattedTable, ReportRow, ReportTable};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug)]
struct Group<'a> {
    artikel: &'a str,
    menge: f64,
    total: f64,
    /// Unit prices of the first row seen for this article.
    preis: Option<f64>,
    aktion: Option<f64>,
}

/// Collapse all rows of an article into one net row.
///
/// Returns and cancellations carry a negative quantity, so summing per article
/// nets them out. Articles whose net quantity is not positive are dropped.
/// Unit prices are not summed: the first row seen for an article supplies
/// them, even if a later row lists a different price.
pub fn aggregate(table: &FormattedTable) -> ReportTable {
    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for row in &table.rows {
        let Some(artikel) = row.artikel.as_deref() else {
            continue;
        };
        let i = *index.entry(artikel).or_insert_with(|| {
            groups.push(Group {
                artikel,
                menge: 0.0,
                total: 0.0,
                preis: row.preis,
                aktion: row.aktion,
            });
            groups.len() - 1
        });
        let group = &mut groups[i];
        group.menge += row.menge.unwrap_or(0.0);
        group.total += row.total.unwrap_or(0.0);
    }

    let rows = groups
        .into_iter()
        .filter(|g| {
            let keep = g.menge > 0.0;
            if !keep {
                debug!("dropping '{}' with net quantity {}", g.artikel, g.menge);
            }
            keep
        })
        .map(|g| ReportRow {
            artikel: g.artikel.to_string(),
            menge: g.menge,
            einzel_preis: g.preis,
            aktion_preis: g.aktion,
            total_preis: g.total,
            rabatt: g.preis.zip(g.aktion).map(|(p, a)| (p - a) * g.menge),
            assigned_to: None,
        })
        .collect();

    ReportTable { rows }
}
