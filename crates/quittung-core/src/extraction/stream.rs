//! Stream-mode table detection: rebuild a grid from positioned words.
//!
//! Rows come from words sharing a baseline, cells from words separated by
//! ordinary word spacing, and columns from the horizontal extents of cells
//! across all rows. No ruling lines are used.
//!
//! The table region is the longest run of adjacent lines whose cells line up
//! in at least `min_columns` columns. Shop headers, dates and totals rarely
//! do, so they stay out of the region.

use crate::extraction::{Area, Word};
use crate::model::RawTable;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::Range;

/// Tuning knobs for stream detection. Ratios are relative to glyph height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamOptions {
    /// Largest horizontal gap between two words of the same cell.
    pub cell_gap_ratio: f32,
    /// Largest vertical distance between word centres on the same line.
    pub line_tolerance_ratio: f32,
    /// Vertical gap (in median line heights) that starts a new table.
    pub block_gap_ratio: f32,
    /// Cells a line must line up with the table's columns to belong to it.
    pub min_columns: usize,
    /// Lines a table needs when the whole page is searched.
    pub min_rows: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        StreamOptions {
            cell_gap_ratio: 0.6,
            line_tolerance_ratio: 0.5,
            block_gap_ratio: 2.5,
            min_columns: 3,
            min_rows: 2,
        }
    }
}

#[derive(Debug, Clone)]
struct Cell {
    text: String,
    x_min: f32,
    x_max: f32,
}

impl Cell {
    fn center(&self) -> f32 {
        (self.x_min + self.x_max) / 2.0
    }

    fn overlaps(&self, span: &(f32, f32)) -> bool {
        self.x_min <= span.1 && span.0 <= self.x_max
    }
}

#[derive(Debug, Clone)]
struct Line {
    y_min: f32,
    y_max: f32,
    cells: Vec<Cell>,
}

impl Line {
    fn height(&self) -> f32 {
        (self.y_max - self.y_min).max(0.0)
    }

    fn spans(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.cells.iter().map(|c| (c.x_min, c.x_max))
    }
}

/// Find tables among `words`.
///
/// Without an `area` the result is the table region alone, and nothing at
/// all when the page has no region of at least `min_rows` lines. With an
/// `area` the table runs from the start of the region to the bottom of the
/// area, so anything printed below the line items inside the area is kept.
pub fn detect_tables(
    words: &[Word],
    area: Option<&Area>,
    single_table: bool,
    options: &StreamOptions,
) -> Vec<RawTable> {
    let selected: Vec<&Word> = words
        .iter()
        .filter(|w| area.map_or(true, |a| a.contains(w.center_x(), w.center_y())))
        .collect();

    let mut lines = group_lines(selected, options);
    let Some(region) = table_region(&lines, options) else {
        return Vec::new();
    };
    if area.is_none() {
        if region.len() < options.min_rows {
            return Vec::new();
        }
        lines.truncate(region.end);
    }
    lines.drain(..region.start);

    let blocks = if single_table {
        vec![lines]
    } else {
        split_blocks(lines, options)
    };

    blocks
        .iter()
        .map(|block| build_table(block))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Longest run of adjacent lines sharing at least `min_columns` aligned cells.
///
/// A run starts at a line with `min_columns` cells. A following line joins
/// when it sits close enough below and at least `min_columns` of its cells
/// overlap a cell already in the run. Ties go to the topmost run.
fn table_region(lines: &[Line], options: &StreamOptions) -> Option<Range<usize>> {
    let min_columns = options.min_columns.max(1);
    let max_gap = options.block_gap_ratio * median_height(lines);

    let mut best: Option<Range<usize>> = None;
    let mut current: Option<(usize, Vec<(f32, f32)>)> = None;

    for (i, line) in lines.iter().enumerate() {
        let joins = match current.as_ref() {
            Some((_, spans)) => {
                line.y_min - lines[i - 1].y_max <= max_gap
                    && aligned_cells(line, spans) >= min_columns
            }
            None => false,
        };

        if joins {
            if let Some((_, spans)) = current.as_mut() {
                spans.extend(line.spans());
            }
        } else if line.cells.len() >= min_columns {
            current = Some((i, line.spans().collect()));
        } else {
            current = None;
            continue;
        }

        if let Some((start, _)) = current.as_ref() {
            let run = *start..i + 1;
            if best.as_ref().map_or(true, |b| run.len() > b.len()) {
                best = Some(run);
            }
        }
    }

    best
}

fn aligned_cells(line: &Line, spans: &[(f32, f32)]) -> usize {
    line.cells
        .iter()
        .filter(|c| spans.iter().any(|s| c.overlaps(s)))
        .count()
}

fn median_height(lines: &[Line]) -> f32 {
    let mut heights: Vec<f32> = lines.iter().map(Line::height).collect();
    heights.sort_by(|a, b| a.total_cmp(b));
    heights.get(heights.len() / 2).copied().unwrap_or(0.0)
}

fn group_lines(mut words: Vec<&Word>, options: &StreamOptions) -> Vec<Line> {
    words.sort_by(|a, b| {
        a.center_y()
            .total_cmp(&b.center_y())
            .then(a.x_min.total_cmp(&b.x_min))
    });

    let mut grouped: Vec<(f32, f32, Vec<&Word>)> = Vec::new();
    for word in words {
        match grouped.last_mut() {
            Some((anchor, height, members))
                if (word.center_y() - *anchor).abs()
                    <= options.line_tolerance_ratio * height.max(word.height()) =>
            {
                *height = height.max(word.height());
                members.push(word);
            }
            _ => grouped.push((word.center_y(), word.height(), vec![word])),
        }
    }

    grouped
        .into_iter()
        .map(|(_, _, mut members)| {
            members.sort_by(|a, b| a.x_min.total_cmp(&b.x_min));
            let y_min = members.iter().map(|w| w.y_min).fold(f32::INFINITY, f32::min);
            let y_max = members.iter().map(|w| w.y_max).fold(f32::NEG_INFINITY, f32::max);
            Line {
                y_min,
                y_max,
                cells: merge_cells(&members, options),
            }
        })
        .collect()
}

/// Join neighbouring words into cells when the gap looks like a plain space.
fn merge_cells(words: &[&Word], options: &StreamOptions) -> Vec<Cell> {
    let mut cells: Vec<Cell> = Vec::new();
    let mut last_height = 0.0_f32;

    for word in words {
        let limit = options.cell_gap_ratio * last_height.max(word.height());
        match cells.last_mut() {
            Some(cell) if word.x_min - cell.x_max <= limit => {
                cell.text.push(' ');
                cell.text.push_str(word.text.trim());
                cell.x_max = cell.x_max.max(word.x_max);
            }
            _ => cells.push(Cell {
                text: word.text.trim().to_string(),
                x_min: word.x_min,
                x_max: word.x_max,
            }),
        }
        last_height = word.height();
    }

    cells
}

fn split_blocks(lines: Vec<Line>, options: &StreamOptions) -> Vec<Vec<Line>> {
    let max_gap = options.block_gap_ratio * median_height(&lines);

    let mut blocks: Vec<Vec<Line>> = Vec::new();
    let mut previous_bottom: Option<f32> = None;
    for line in lines {
        let starts_block = match previous_bottom {
            None => true,
            Some(bottom) => line.y_min - bottom > max_gap,
        };
        previous_bottom = Some(line.y_max);
        if starts_block {
            blocks.push(vec![line]);
        } else if let Some(block) = blocks.last_mut() {
            block.push(line);
        }
    }
    blocks
}

/// Merge overlapping horizontal extents into column intervals.
fn column_intervals(lines: &[Line]) -> Vec<(f32, f32)> {
    let multi: Vec<&Line> = lines.iter().filter(|l| l.cells.len() >= 2).collect();
    let source: Vec<&Line> = if multi.is_empty() {
        lines.iter().collect()
    } else {
        multi
    };

    let mut spans: Vec<(f32, f32)> = source.iter().flat_map(|l| l.spans()).collect();
    spans.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut merged: Vec<(f32, f32)> = Vec::new();
    for (start, end) in spans {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

fn column_for(x: f32, columns: &[(f32, f32)]) -> usize {
    let distance = |&(start, end): &(f32, f32)| {
        if x < start {
            start - x
        } else if x > end {
            x - end
        } else {
            0.0
        }
    };
    columns
        .iter()
        .enumerate()
        .min_by(|a, b| {
            distance(a.1)
                .partial_cmp(&distance(b.1))
                .unwrap_or(Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn build_table(lines: &[Line]) -> RawTable {
    let columns = column_intervals(lines);
    if columns.is_empty() {
        return RawTable::default();
    }

    let rows = lines
        .iter()
        .map(|line| {
            let mut row: Vec<Option<String>> = vec![None; columns.len()];
            for cell in &line.cells {
                let idx = column_for(cell.center(), &columns);
                match row[idx].as_mut() {
                    Some(existing) => {
                        existing.push(' ');
                        existing.push_str(&cell.text);
                    }
                    None => row[idx] = Some(cell.text.clone()),
                }
            }
            row
        })
        .collect();

    RawTable::new(rows)
}
