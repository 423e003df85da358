//! Plain-text rendering of a derived table for the command line.

use crate::column::ColumnDescriptor;
use crate::engine::TableEngine;
use crate::group::{GroupChildren, GroupNode, Grouped};
use crate::nesting::NestedTable;
use crate::value::Row;

const COLUMN_SEPARATOR: &str = " | ";
const ELLIPSIS: &str = "...";

/// Cut `text` to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: Option<usize>) -> String {
    let Some(max) = max else {
        return text.to_string();
    };
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= ELLIPSIS.len() {
        return text.chars().take(max).collect();
    }
    let kept: String = text.chars().take(max - ELLIPSIS.len()).collect();
    format!("{}{}", kept, ELLIPSIS)
}

/// Aligned grid of a header line plus body lines.
struct Grid {
    header: Vec<String>,
    lines: Vec<Line>,
}

enum Line {
    Title(String),
    Cells(Vec<String>),
}

impl Grid {
    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.header.iter().map(|h| h.chars().count()).collect();
        for line in &self.lines {
            if let Line::Cells(cells) = line {
                for (idx, cell) in cells.iter().enumerate() {
                    if let Some(w) = widths.get_mut(idx) {
                        *w = (*w).max(cell.chars().count());
                    }
                }
            }
        }
        widths
    }

    fn write(&self, out: &mut String) {
        let widths = self.widths();
        let pad = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<width$}", c, width = *w))
                .collect::<Vec<_>>()
                .join(COLUMN_SEPARATOR)
                .trim_end()
                .to_string()
        };
        out.push_str(&pad(&self.header));
        out.push('\n');
        let rule: usize =
            widths.iter().sum::<usize>() + COLUMN_SEPARATOR.len() * widths.len().saturating_sub(1);
        out.push_str(&"-".repeat(rule));
        out.push('\n');
        for line in &self.lines {
            match line {
                Line::Title(title) => out.push_str(title),
                Line::Cells(cells) => out.push_str(&pad(cells)),
            }
            out.push('\n');
        }
    }
}

fn cells(
    engine: &TableEngine,
    row: &Row,
    columns: &[&ColumnDescriptor],
    max_width: Option<usize>,
) -> Vec<String> {
    columns
        .iter()
        .map(|column| {
            let cell = engine.cell(row, column);
            let text = truncate(&cell.text, max_width);
            match cell.badge.or(cell.state) {
                Some(mark) => format!("{} [{}]", text, mark),
                None => text,
            }
        })
        .collect()
}

fn group_lines(
    engine: &TableEngine,
    groups: &[GroupNode],
    columns: &[&ColumnDescriptor],
    max_width: Option<usize>,
    depth: usize,
    lines: &mut Vec<Line>,
) {
    for group in groups {
        lines.push(Line::Title(format!(
            "{}{}: {} ({})",
            "  ".repeat(depth),
            group.field,
            group.value,
            group.leaf_count()
        )));
        match &group.children {
            GroupChildren::Rows(rows) => lines.extend(
                rows.iter()
                    .map(|row| Line::Cells(cells(engine, row, columns, max_width))),
            ),
            GroupChildren::Groups(nested) => {
                group_lines(engine, nested, columns, max_width, depth + 1, lines)
            }
        }
    }
}

/// Header label of a leaf, prefixed with its header group title when it has one.
fn header_labels(engine: &TableEngine) -> Vec<String> {
    engine
        .view()
        .columns
        .iter()
        .flat_map(|node| {
            let title = node.is_group().then(|| node.label().to_string());
            node.leaves().iter().map(move |leaf| match &title {
                Some(t) => format!("{}/{}", t, leaf.label),
                None => leaf.label.clone(),
            })
        })
        .collect()
}

/// Render the current view. Flat tables print one page; grouped tables print every group.
pub fn render_table(engine: &TableEngine, page: usize, max_width: Option<usize>) -> String {
    let view = engine.view();
    let mut out = String::new();
    if view.loading {
        out.push_str("Loading...\n");
        return out;
    }
    if !view.banner.is_empty() {
        out.push_str(&view.banner);
        out.push('\n');
    }
    if let Some(header) = &view.chrome.header {
        out.push_str(header);
        out.push('\n');
    }
    if view.show_back_button {
        out.push_str("(drill-down active)\n");
    }

    let columns: Vec<&ColumnDescriptor> = view.leaf_columns().collect();
    let mut lines = Vec::new();
    match &view.rows {
        Grouped::Flat(_) => lines.extend(
            view.page(page)
                .into_iter()
                .map(|row| Line::Cells(cells(engine, row, &columns, max_width))),
        ),
        Grouped::Tree(groups) => group_lines(engine, groups, &columns, max_width, 0, &mut lines),
    }
    Grid {
        header: header_labels(engine),
        lines,
    }
    .write(&mut out);

    if !view.rows.is_tree() {
        out.push_str(&format!(
            "Page {} of {} ({} rows)\n",
            page.max(1),
            view.page_count().max(1),
            view.rows.leaf_count()
        ));
    }
    if let Some(footer) = &view.chrome.footer {
        out.push_str(footer);
        out.push('\n');
    }
    out
}

/// Render a nested table, first page only.
pub fn render_nested(engine: &TableEngine, table: &NestedTable, max_width: Option<usize>) -> String {
    let columns: Vec<&ColumnDescriptor> = table.columns.iter().collect();
    let lines = table
        .rows
        .iter()
        .take(table.page_size.max(1))
        .map(|row| Line::Cells(cells(engine, row, &columns, max_width)))
        .collect();
    let mut out = String::new();
    Grid {
        header: table.columns.iter().map(|c| c.label.clone()).collect(),
        lines,
    }
    .write(&mut out);
    out.push_str(&format!("{} linked rows\n", table.rows.len()));
    out
}
