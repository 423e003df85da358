//! Multi-level row grouping.

use serde::Serialize;

use crate::props::MAX_GROUP_LEVELS;
use crate::value::{group_key, Row};

/// Key prefix of top-level group nodes.
pub const ROOT_GROUP_KEY: &str = "root";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "lowercase")]
pub enum GroupChildren {
    Rows(Vec<Row>),
    Groups(Vec<GroupNode>),
}

/// Title row of one group: every row sharing `value` in `field`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupNode {
    pub field: String,
    /// Stringified group value; `"undefined"` when rows lack the field.
    pub value: String,
    /// Dot path of ancestor values, e.g. `root.eu.fr`.
    pub key: String,
    pub children: GroupChildren,
}

impl GroupNode {
    pub fn leaf_count(&self) -> usize {
        match &self.children {
            GroupChildren::Rows(rows) => rows.len(),
            GroupChildren::Groups(groups) => groups.iter().map(GroupNode::leaf_count).sum(),
        }
    }

    pub fn depth(&self) -> usize {
        match &self.children {
            GroupChildren::Rows(_) => 1,
            GroupChildren::Groups(groups) => {
                1 + groups.iter().map(GroupNode::depth).max().unwrap_or(0)
            }
        }
    }
}

/// Display rows: either plain or grouped into a tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "lowercase")]
pub enum Grouped {
    Flat(Vec<Row>),
    Tree(Vec<GroupNode>),
}

impl Grouped {
    pub fn is_tree(&self) -> bool {
        matches!(self, Grouped::Tree(_))
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Grouped::Flat(rows) => rows.len(),
            Grouped::Tree(groups) => groups.iter().map(GroupNode::leaf_count).sum(),
        }
    }

    /// Number of grouping levels; 0 for flat rows.
    pub fn depth(&self) -> usize {
        match self {
            Grouped::Flat(_) => 0,
            Grouped::Tree(groups) => groups.iter().map(GroupNode::depth).max().unwrap_or(0),
        }
    }

    /// Leaf rows in display order.
    pub fn rows(&self) -> Vec<&Row> {
        fn collect<'a>(groups: &'a [GroupNode], out: &mut Vec<&'a Row>) {
            for group in groups {
                match &group.children {
                    GroupChildren::Rows(rows) => out.extend(rows.iter()),
                    GroupChildren::Groups(inner) => collect(inner, out),
                }
            }
        }
        match self {
            Grouped::Flat(rows) => rows.iter().collect(),
            Grouped::Tree(groups) => {
                let mut out = Vec::new();
                collect(groups, &mut out);
                out
            }
        }
    }
}

/// Partition `rows` by `fields`, one tree level per field (at most three).
///
/// Groups appear in first-occurrence order of their value. Leaf rows are
/// re-keyed `<group key>.<index>` so keys stay unique across groups.
pub fn group_rows(rows: Vec<Row>, fields: &[String]) -> Grouped {
    let fields = &fields[..fields.len().min(MAX_GROUP_LEVELS)];
    if fields.is_empty() || rows.is_empty() {
        return Grouped::Flat(rows);
    }
    Grouped::Tree(make_groups(rows, fields, ROOT_GROUP_KEY))
}

fn make_groups(rows: Vec<Row>, fields: &[String], parent: &str) -> Vec<GroupNode> {
    let Some((field, rest)) = fields.split_first() else {
        return Vec::new();
    };

    let mut partitions: Vec<(String, Vec<Row>)> = Vec::new();
    for row in rows {
        let value = group_key(row.get(field));
        match partitions.iter_mut().find(|(v, _)| *v == value) {
            Some((_, members)) => members.push(row),
            None => partitions.push((value, vec![row])),
        }
    }

    partitions
        .into_iter()
        .map(|(value, members)| {
            let key = format!("{}.{}", parent, value);
            let members: Vec<Row> = members
                .into_iter()
                .enumerate()
                .map(|(idx, row)| Row::new(format!("{}.{}", key, idx), row.fields))
                .collect();
            let children = if rest.is_empty() {
                GroupChildren::Rows(members)
            } else {
                GroupChildren::Groups(make_groups(members, rest, &key))
            };
            GroupNode {
                field: field.clone(),
                value,
                key,
                children,
            }
        })
        .collect()
}
