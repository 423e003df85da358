//! Column and row derivation engine for configurable tables.
//!
//! A [`TableEngine`] takes row data, host properties and an optional declared
//! schema, and derives the column tree, the sorted or grouped rows, alert
//! statuses, nested tables and presentation settings a rendering layer needs.

pub mod alert;
pub mod arrange;
pub mod column;
pub mod config;
pub mod debug;
pub mod engine;
pub mod error_display;
pub mod format;
pub mod group;
pub mod nesting;
pub mod props;
pub mod registry;
pub mod render;
pub mod sort;
pub mod source;
pub mod types;
pub mod value;

pub use alert::{AlertOperator, AlertRule, AlertRules, AlertStatus};
pub use column::{ColumnDescriptor, ColumnNode, HeaderGroup};
pub use config::{AppConfig, ConfigManager};
pub use debug::DebugState;
pub use engine::{
    CellView, EngineOptions, FilterHandler, FilterMode, TableChrome, TableEngine, TableView,
};
pub use group::{GroupChildren, GroupNode, Grouped};
pub use nesting::{NestedTable, Nesting};
pub use props::{AssociatedFilter, ColumnConfig, TableProperties};
pub use registry::{ComponentRegistry, Registration, TableCommand};
pub use sort::{SortDirection, SortSpec};
pub use source::{DataSource, RowQuery, TableData};
pub use types::{FieldSchema, FieldType};
pub use value::{Record, Row};

/// Application name used for the config directory and other app-specific paths
pub const APP_NAME: &str = "tablecraft";
