//! Component properties supplied by the host.
//!
//! Every option is optional and malformed values fall back to defaults, so a
//! half-filled configuration panel in the host never prevents the table from
//! rendering.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::alert::AlertRule;
use crate::value::{is_truthy, lenient_string, parse_int_prefix, Record};

/// Maximum number of grouping levels taken from `groupedByField`.
pub const MAX_GROUP_LEVELS: usize = 3;

/// Page size used when `pageSize` is missing or unparseable.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Page size of nested (expanded row) tables.
pub const NESTED_PAGE_SIZE: usize = 3;

/// Side a column is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FixedSide {
    Left,
    Right,
}

impl<'de> Deserialize<'de> for FixedSide {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match &value {
            Value::String(s) if s.eq_ignore_ascii_case("right") => Ok(FixedSide::Right),
            Value::String(s) if s.eq_ignore_ascii_case("left") => Ok(FixedSide::Left),
            Value::Bool(true) => Ok(FixedSide::Left),
            _ => Err(serde::de::Error::custom(format!(
                "unsupported fixed side: {}",
                value
            ))),
        }
    }
}

/// Deserialize `fixed`, treating anything unrecognized as not fixed.
fn lenient_fixed<'de, D>(deserializer: D) -> Result<Option<FixedSide>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| FixedSide::deserialize(v).ok()))
}

/// Deserialize a flag: `true` or `"true"` is set, anything else is not.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(flag)) => flag,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    })
}

/// Entries of a list property that parse; the others are skipped with a warning.
fn parse_entries<T: DeserializeOwned>(value: Value) -> Vec<T> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter_map(|(idx, item)| match serde_json::from_value(item) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping malformed list entry {}: {}", idx, e);
                    None
                }
            })
            .collect(),
        other => {
            log::warn!("Ignoring list property that is not an array: {}", other);
            Vec::new()
        }
    }
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(parse_entries(Value::deserialize(deserializer)?))
}

/// Like [`lenient_list`], keeping the difference between missing and empty.
fn lenient_optional_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        value => Some(parse_entries(value)),
    })
}

/// Per-field column configuration (`fieldsConfiguration[]` and the nesting structures).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnConfig {
    pub field_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub display_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub format: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub width: Option<String>,
    #[serde(deserialize_with = "lenient_fixed")]
    pub fixed: Option<FixedSide>,
    #[serde(deserialize_with = "lenient_string")]
    pub group: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub render: Option<String>,
}

impl ColumnConfig {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            ..Self::default()
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_width(mut self, width: impl Into<String>) -> Self {
        self.width = Some(width.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_render(mut self, render: impl Into<String>) -> Self {
        self.render = Some(render.into());
        self
    }

    /// Non-empty header group label.
    pub fn group_label(&self) -> Option<&str> {
        self.group.as_deref().filter(|g| !g.is_empty())
    }
}

/// Entry of `unwantedFields[]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UnwantedField {
    pub column_name: String,
}

/// Entry of `levelOnePointOfContact[]`: the field linking a row to its nested rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PointOfContact {
    pub data_name: String,
}

/// Filter value currently set by the host for a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociatedFilter {
    pub field: String,
    pub value: Value,
}

/// Full property bundle of one table component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableProperties {
    #[serde(deserialize_with = "lenient_list")]
    pub fields_configuration: Vec<ColumnConfig>,
    #[serde(deserialize_with = "lenient_bool")]
    pub sorting: bool,
    #[serde(deserialize_with = "lenient_string")]
    pub grouped_by_field: Option<String>,
    #[serde(deserialize_with = "lenient_optional_list")]
    pub level_one_nesting_structure: Option<Vec<ColumnConfig>>,
    #[serde(deserialize_with = "lenient_optional_list")]
    pub level_two_nesting_structure: Option<Vec<ColumnConfig>>,
    #[serde(alias = "levelOnePontOfContact", deserialize_with = "lenient_list")]
    pub level_one_point_of_contact: Vec<PointOfContact>,
    #[serde(deserialize_with = "lenient_list")]
    pub unwanted_fields: Vec<UnwantedField>,
    #[serde(deserialize_with = "lenient_list")]
    pub alerts: Vec<AlertRule>,
    #[serde(deserialize_with = "lenient_string")]
    pub header: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub footer: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub bordered: bool,
    #[serde(deserialize_with = "lenient_string")]
    pub page_size: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub show_size_changer: bool,
    #[serde(deserialize_with = "lenient_string")]
    pub position: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub max_height: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub min_width: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub main_table_root_class_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub level_one_table_root_class_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub template: Option<String>,
}

/// Pagination settings handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub show_size_changer: bool,
    pub position: String,
    pub page_size: usize,
}

/// Scroll extents; `None` when the property is missing or not a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scroll {
    pub x: Option<i64>,
    pub y: Option<i64>,
}

impl TableProperties {
    /// Parse properties from a JSON value.
    ///
    /// Malformed values are contained to their own property or list entry; only
    /// input that is not an object falls back to the defaults.
    pub fn from_json(value: Value) -> Self {
        match serde_json::from_value(value) {
            Ok(props) => props,
            Err(e) => {
                log::warn!("Ignoring malformed table properties: {}", e);
                Self::default()
            }
        }
    }

    /// Grouping fields from `groupedByField`.
    ///
    /// Whitespace is removed, at most [`MAX_GROUP_LEVELS`] names are taken, and
    /// names whose value in `first_row` is missing or falsy are dropped.
    pub fn grouping_fields(&self, first_row: Option<&Record>) -> Vec<String> {
        let Some(raw) = self.grouped_by_field.as_deref() else {
            return Vec::new();
        };
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Vec::new();
        }
        let Some(first_row) = first_row else {
            return Vec::new();
        };

        compact
            .splitn(MAX_GROUP_LEVELS + 1, ',')
            .take(MAX_GROUP_LEVELS)
            .filter(|name| is_truthy(first_row.get(*name)))
            .map(str::to_string)
            .collect()
    }

    pub fn is_unwanted(&self, key: &str) -> bool {
        self.unwanted_fields.iter().any(|u| u.column_name == key)
    }

    pub fn pagination(&self, default_page_size: usize) -> Pagination {
        let position = match self.position.as_deref() {
            Some(p) if !p.is_empty() && p != "null" => p.to_string(),
            _ => "bottom".to_string(),
        };
        let page_size = self
            .page_size
            .as_deref()
            .filter(|s| !s.is_empty())
            .and_then(parse_int_prefix)
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(default_page_size);

        Pagination {
            show_size_changer: self.show_size_changer,
            position,
            page_size,
        }
    }

    pub fn scroll(&self) -> Scroll {
        Scroll {
            x: self.min_width.as_deref().and_then(parse_int_prefix),
            y: self.max_height.as_deref().and_then(parse_int_prefix),
        }
    }

    pub fn header_text(&self) -> Option<&str> {
        self.header.as_deref().filter(|h| !h.is_empty())
    }

    pub fn footer_text(&self) -> Option<&str> {
        self.footer.as_deref().filter(|f| !f.is_empty())
    }

    /// Level-one nesting is enabled when its structure has at least one entry.
    pub fn level_one_structure(&self) -> Option<&[ColumnConfig]> {
        self.level_one_nesting_structure
            .as_deref()
            .filter(|s| !s.is_empty())
    }

    pub fn level_two_structure(&self) -> Option<&[ColumnConfig]> {
        self.level_two_nesting_structure
            .as_deref()
            .filter(|s| !s.is_empty())
    }
}
