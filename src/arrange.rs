//! Turn the flat descriptor list into the displayed column tree.

use std::collections::HashMap;

use crate::column::{ColumnDescriptor, ColumnNode, HeaderGroup};
use crate::props::{ColumnConfig, UnwantedField};

/// Arrange columns: header grouping, then manual reordering, then unwanted removal.
///
/// Manual reordering only applies when no header group was formed and `config`
/// is non-empty. Configured fields come first in configuration order; the rest
/// follow in their original relative order.
pub fn arrange(
    descriptors: Vec<ColumnDescriptor>,
    config: &[ColumnConfig],
    unwanted: &[UnwantedField],
) -> Vec<ColumnNode> {
    let (mut nodes, grouped) = group_headers(descriptors, config);
    if !grouped && !config.is_empty() {
        nodes = reorder(nodes, config);
    }
    remove_unwanted(nodes, unwanted)
}

/// Collapse columns sharing a `group` label into one header node at the position
/// of the first member. Returns whether any header was formed.
fn group_headers(
    descriptors: Vec<ColumnDescriptor>,
    config: &[ColumnConfig],
) -> (Vec<ColumnNode>, bool) {
    let mut labels: HashMap<&str, &str> = HashMap::new();
    for entry in config {
        if let Some(label) = entry.group_label() {
            labels.entry(entry.field_name.as_str()).or_insert(label);
        }
    }
    if labels.is_empty() {
        return (descriptors.into_iter().map(ColumnNode::Leaf).collect(), false);
    }

    let mut nodes: Vec<ColumnNode> = Vec::with_capacity(descriptors.len());
    let mut header_positions: HashMap<String, usize> = HashMap::new();
    for col in descriptors {
        let Some(title) = labels.get(col.field.as_str()).copied() else {
            nodes.push(ColumnNode::Leaf(col));
            continue;
        };
        match header_positions.get(title) {
            Some(&idx) => {
                if let ColumnNode::Group(group) = &mut nodes[idx] {
                    group.children.push(col);
                }
            }
            None => {
                header_positions.insert(title.to_string(), nodes.len());
                nodes.push(ColumnNode::Group(HeaderGroup {
                    key: HeaderGroup::key_for(title),
                    title: title.to_string(),
                    order: col.order,
                    children: vec![col],
                }));
            }
        }
    }
    let grouped = !header_positions.is_empty();
    (nodes, grouped)
}

/// Stable reorder: configured fields in configuration order, then the rest.
fn reorder(nodes: Vec<ColumnNode>, config: &[ColumnConfig]) -> Vec<ColumnNode> {
    let mut remaining: Vec<Option<ColumnNode>> = nodes.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(remaining.len());
    for entry in config {
        let slot = remaining
            .iter_mut()
            .find(|n| matches!(n, Some(node) if node.key() == entry.field_name));
        if let Some(node) = slot.and_then(Option::take) {
            ordered.push(node);
        }
    }
    ordered.extend(remaining.into_iter().flatten());
    ordered
}

fn remove_unwanted(nodes: Vec<ColumnNode>, unwanted: &[UnwantedField]) -> Vec<ColumnNode> {
    if unwanted.is_empty() {
        return nodes;
    }
    retain_columns(nodes, |key| !unwanted.iter().any(|u| u.column_name == key))
}

/// Remove the column or header `key`, including header members with that key.
pub fn hide_column(nodes: Vec<ColumnNode>, key: &str) -> Vec<ColumnNode> {
    retain_columns(nodes, |k| k != key)
}

/// Keep nodes and header members whose key passes `keep`; drop emptied headers.
fn retain_columns(nodes: Vec<ColumnNode>, keep: impl Fn(&str) -> bool) -> Vec<ColumnNode> {
    nodes
        .into_iter()
        .filter(|node| keep(node.key()))
        .filter_map(|node| match node {
            ColumnNode::Group(mut group) => {
                group.children.retain(|c| keep(&c.field));
                (!group.children.is_empty()).then_some(ColumnNode::Group(group))
            }
            leaf => Some(leaf),
        })
        .collect()
}
