//! Column descriptors built from field types and column configuration.

use serde::Serialize;
use serde_json::Value;

use crate::format::format_cell;
use crate::props::{AssociatedFilter, ColumnConfig, FixedSide};
use crate::sort::{Comparator, SortDirection, SortSpec};
use crate::types::FieldType;
use crate::value::{parse_int_prefix, Row};

/// Prefix of header-group keys, keeping them apart from field names.
pub const GROUP_KEY_PREFIX: &str = "group-";

/// Filter dropdown state of a filterable column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnFilter {
    /// Value currently applied by the host, if any.
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    pub field: String,
    pub field_type: FieldType,
    pub label: String,
    pub format: Option<String>,
    /// Leading integer of the configured width, kept as parsed (may be negative).
    pub width: Option<i64>,
    pub fixed: Option<FixedSide>,
    /// Position in the field list this column was built from.
    pub order: usize,
    pub comparator: Option<Comparator>,
    /// Current sort direction, shown next to the label.
    pub sort_direction: Option<SortDirection>,
    pub render: Option<String>,
    pub filter: Option<ColumnFilter>,
}

impl ColumnDescriptor {
    pub fn key(&self) -> &str {
        &self.field
    }

    /// Text of this column's cell in `row`.
    pub fn cell_text(&self, row: &Row) -> String {
        format_cell(
            self.field_type,
            self.format.as_deref(),
            self.render.as_deref(),
            row.get(&self.field),
        )
    }
}

/// Synthetic parent column spanning the leaf columns that share a group label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderGroup {
    pub key: String,
    pub title: String,
    pub order: usize,
    pub children: Vec<ColumnDescriptor>,
}

impl HeaderGroup {
    pub fn key_for(title: &str) -> String {
        format!("{}{}", GROUP_KEY_PREFIX, title)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ColumnNode {
    Leaf(ColumnDescriptor),
    Group(HeaderGroup),
}

impl ColumnNode {
    /// Stable identity: the field name of a leaf, `group-<title>` for a header.
    pub fn key(&self) -> &str {
        match self {
            ColumnNode::Leaf(col) => &col.field,
            ColumnNode::Group(group) => &group.key,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ColumnNode::Leaf(col) => &col.label,
            ColumnNode::Group(group) => &group.title,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, ColumnNode::Group(_))
    }

    /// Leaf columns under this node, in display order.
    pub fn leaves(&self) -> &[ColumnDescriptor] {
        match self {
            ColumnNode::Leaf(col) => std::slice::from_ref(col),
            ColumnNode::Group(group) => &group.children,
        }
    }
}

/// Leaf columns of a column tree in display order.
pub fn leaf_columns(nodes: &[ColumnNode]) -> impl Iterator<Item = &ColumnDescriptor> {
    nodes.iter().flat_map(|node| node.leaves())
}

/// Inputs that are not part of a field's own configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnContext<'a> {
    /// Attach comparators and sort indicators.
    pub sorting: bool,
    /// The host handles filter callbacks, so every column gets a filter dropdown.
    pub filterable: bool,
    pub associated_filters: &'a [AssociatedFilter],
    pub sort_spec: Option<&'a SortSpec>,
}

/// First non-empty value of a property among the entries configuring `field`.
fn lookup<'a, T>(
    config: &'a [ColumnConfig],
    field: &str,
    pick: impl Fn(&'a ColumnConfig) -> Option<T>,
) -> Option<T> {
    config
        .iter()
        .filter(|c| c.field_name == field)
        .find_map(pick)
}

fn non_empty(s: &Option<String>) -> Option<String> {
    s.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}

/// Build one descriptor per field, in field order.
pub fn build_columns(
    fields: &[(String, FieldType)],
    config: &[ColumnConfig],
    ctx: &ColumnContext<'_>,
) -> Vec<ColumnDescriptor> {
    fields
        .iter()
        .enumerate()
        .map(|(order, (field, field_type))| {
            let width = lookup(config, field, |c| c.width.as_deref()).and_then(parse_int_prefix);
            let label = lookup(config, field, |c| non_empty(&c.display_name))
                .unwrap_or_else(|| field.clone());
            let filter = ctx.filterable.then(|| ColumnFilter {
                value: ctx
                    .associated_filters
                    .iter()
                    .find(|f| f.field == *field)
                    .map(|f| f.value.clone()),
            });
            let sort_direction = if ctx.sorting {
                ctx.sort_spec.and_then(|spec| spec.direction_of(field))
            } else {
                None
            };

            ColumnDescriptor {
                field: field.clone(),
                field_type: *field_type,
                label,
                format: lookup(config, field, |c| non_empty(&c.format)),
                width,
                fixed: lookup(config, field, |c| c.fixed),
                order,
                comparator: if ctx.sorting {
                    Comparator::for_type(*field_type)
                } else {
                    None
                },
                sort_direction,
                render: lookup(config, field, |c| non_empty(&c.render)),
                filter,
            }
        })
        .collect()
}
