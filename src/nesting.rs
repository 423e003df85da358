//! Expandable rows: level-one and level-two nested tables.

use serde::Serialize;

use crate::column::{build_columns, ColumnContext, ColumnDescriptor};
use crate::props::{ColumnConfig, PointOfContact, TableProperties};
use crate::types::FieldType;
use crate::value::{strict_equals, Record, Row};

/// Description of one nested table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedTable {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Row>,
    pub page_size: usize,
    pub class_name: Option<String>,
    /// Rows of this table expand into the level-two table.
    pub expandable: bool,
}

/// Column sets of the nested tables, built alongside the main columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Nesting {
    pub level_one: Vec<ColumnDescriptor>,
    pub level_two: Option<Vec<ColumnDescriptor>>,
    pub points_of_contact: Vec<String>,
    pub page_size: usize,
    pub class_name: Option<String>,
}

/// Fields listed in `structure`, in structure order, that exist in `fields`.
fn structured_fields(
    structure: &[ColumnConfig],
    fields: &[(String, FieldType)],
) -> Vec<(String, FieldType)> {
    structure
        .iter()
        .flat_map(|entry| fields.iter().filter(move |(f, _)| *f == entry.field_name))
        .cloned()
        .collect()
}

/// Build nested columns, taking settings from the structure before the main configuration.
fn nested_columns(
    structure: &[ColumnConfig],
    fields: &[(String, FieldType)],
    props: &TableProperties,
    ctx: &ColumnContext<'_>,
) -> Vec<ColumnDescriptor> {
    let config: Vec<ColumnConfig> = structure
        .iter()
        .chain(props.fields_configuration.iter())
        .cloned()
        .collect();
    build_columns(&structured_fields(structure, fields), &config, ctx)
}

impl Nesting {
    /// `None` unless a level-one structure is configured.
    pub fn build(
        fields: &[(String, FieldType)],
        props: &TableProperties,
        ctx: &ColumnContext<'_>,
        page_size: usize,
    ) -> Option<Nesting> {
        let level_one = props.level_one_structure()?;
        Some(Nesting {
            level_one: nested_columns(level_one, fields, props, ctx),
            level_two: props
                .level_two_structure()
                .map(|structure| nested_columns(structure, fields, props, ctx)),
            points_of_contact: props
                .level_one_point_of_contact
                .iter()
                .map(|PointOfContact { data_name }| data_name.clone())
                .filter(|name| !name.is_empty())
                .collect(),
            page_size,
            class_name: props
                .level_one_table_root_class_name
                .clone()
                .filter(|c| !c.is_empty()),
        })
    }

    /// Rows of `dataset` linked to `record` through every point of contact.
    pub fn linked_rows(&self, record: &Row, dataset: &[Record]) -> Vec<Row> {
        if self.points_of_contact.is_empty() {
            return Vec::new();
        }
        let linked: Vec<Record> = dataset
            .iter()
            .filter(|candidate| {
                self.points_of_contact.iter().all(|field| {
                    match (record.get(field), candidate.get(field)) {
                        (Some(a), Some(b)) => strict_equals(a, b),
                        _ => false,
                    }
                })
            })
            .cloned()
            .collect();
        Row::keyed(linked)
    }

    pub fn level_one_table(&self, record: &Row, dataset: &[Record]) -> NestedTable {
        NestedTable {
            columns: self.level_one.clone(),
            rows: self.linked_rows(record, dataset),
            page_size: self.page_size,
            class_name: self.class_name.clone(),
            expandable: self.level_two.is_some(),
        }
    }

    /// Level-two table: the full dataset under the level-two columns.
    pub fn level_two_table(&self, dataset: &[Record]) -> Option<NestedTable> {
        let columns = self.level_two.clone()?;
        Some(NestedTable {
            columns,
            rows: Row::keyed(dataset.to_vec()),
            page_size: self.page_size,
            class_name: None,
            expandable: false,
        })
    }
}
