//! Multi-column row sorting and the header click state machine.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::column::ColumnNode;
use crate::format::parse_datetime;
use crate::types::FieldType;
use crate::value::{display_string, is_truthy, to_number, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascend,
    Descend,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascend => "ascend",
            SortDirection::Descend => "descend",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub key: String,
    pub direction: SortDirection,
}

/// Active sort columns. Earlier entries take priority; later ones break ties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    entries: Vec<SortKey>,
}

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[SortKey] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn direction_of(&self, key: &str) -> Option<SortDirection> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.direction)
    }

    /// Advance the sort state of `key` after a header click.
    ///
    /// An unsorted column becomes `Descend`, `Descend` becomes `Ascend`, and
    /// `Ascend` drops the column. Without `multi` every other column is dropped
    /// first; with it they are kept and a new column is appended.
    pub fn on_header_click(&mut self, key: &str, multi: bool) {
        match self.entries.iter().position(|e| e.key == key) {
            Some(mut idx) => {
                if !multi {
                    let entry = self.entries.swap_remove(idx);
                    self.entries = vec![entry];
                    idx = 0;
                }
                match self.entries[idx].direction {
                    SortDirection::Descend => self.entries[idx].direction = SortDirection::Ascend,
                    SortDirection::Ascend => {
                        self.entries.remove(idx);
                    }
                }
            }
            None => {
                if !multi {
                    self.entries.clear();
                }
                self.entries.push(SortKey {
                    key: key.to_string(),
                    direction: SortDirection::Descend,
                });
            }
        }
    }
}

/// Type-specific value ordering for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    Date,
    Number,
    Text,
}

impl Comparator {
    /// Booleans and objects have no ordering.
    pub fn for_type(field_type: FieldType) -> Option<Comparator> {
        match field_type {
            FieldType::Date => Some(Comparator::Date),
            FieldType::Number => Some(Comparator::Number),
            FieldType::String => Some(Comparator::Text),
            FieldType::Boolean | FieldType::Object => None,
        }
    }

    /// Compare two cell values. Values that cannot be ordered compare equal.
    pub fn compare(&self, a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match self {
            Comparator::Date => match (a.and_then(parse_datetime), b.and_then(parse_datetime)) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => Ordering::Equal,
            },
            Comparator::Number => match (a.and_then(to_number), b.and_then(to_number)) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            },
            Comparator::Text => {
                if !is_truthy(a) || !is_truthy(b) {
                    return Ordering::Equal;
                }
                match (a, b) {
                    (Some(x), Some(y)) => collate(&display_string(x), &display_string(y)),
                    _ => Ordering::Equal,
                }
            }
        }
    }
}

/// Case-insensitive ordering with lowercase sorting before uppercase on ties.
fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Sort rows by `spec`, resolving each key to a column comparator.
///
/// `Descend` keeps the comparator's natural order and `Ascend` swaps the
/// operands. Keys without a comparator (unknown columns, booleans) are ignored.
/// The sort is stable, so rows equal on every key keep their relative order.
pub fn sort_rows(rows: &mut [Row], columns: &[ColumnNode], spec: &SortSpec) {
    if spec.is_empty() {
        return;
    }

    let comparators: HashMap<&str, Comparator> = columns
        .iter()
        .flat_map(|node| node.leaves())
        .filter_map(|col| col.comparator.map(|c| (col.field.as_str(), c)))
        .collect();

    let active: Vec<(&str, Comparator, SortDirection)> = spec
        .entries()
        .iter()
        .filter_map(|entry| {
            comparators
                .get(entry.key.as_str())
                .map(|c| (entry.key.as_str(), *c, entry.direction))
        })
        .collect();
    if active.is_empty() {
        return;
    }

    rows.sort_by(|a, b| {
        active
            .iter()
            .map(|(field, comparator, direction)| match direction {
                SortDirection::Ascend => comparator.compare(b.get(field), a.get(field)),
                SortDirection::Descend => comparator.compare(a.get(field), b.get(field)),
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}
