//! Shared CLI definitions for tablecraft.
//!
//! Used by the main binary and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser, ValueEnum};
use std::path::PathBuf;

/// How the derived table is printed
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Aligned plain-text table with group titles and alert badges
    #[default]
    Text,
    /// The full derived view (columns, rows, annotations) as pretty JSON
    Json,
}

/// Command-line arguments for tablecraft
#[derive(Clone, Parser, Debug)]
#[command(
    name = "tablecraft",
    version,
    about = "Derive grouped, sorted and annotated tables from JSON rows"
)]
pub struct Args {
    /// JSON file with the row data: an array of row objects, or an array of datasets
    /// (arrays of row objects). Not required with --generate-config.
    #[arg(required_unless_present = "generate_config", value_name = "DATA")]
    pub data: Option<PathBuf>,

    /// JSON file with the table properties (fieldsConfiguration, groupedByField, alerts, ...)
    #[arg(long = "properties", short = 'p', value_name = "PATH")]
    pub properties: Option<PathBuf>,

    /// JSON file with the declared field schema: an array of {"name", "type"} objects
    #[arg(long = "schema", value_name = "PATH")]
    pub schema: Option<PathBuf>,

    /// Click a column header (repeatable). Each click cycles descend, ascend, unsorted.
    #[arg(long = "sort", value_name = "KEY")]
    pub sort: Vec<String>,

    /// Hold the multi-select modifier for every --sort click after the first
    #[arg(long = "multi-sort", action)]
    pub multi_sort: bool,

    /// Narrow the table to rows where KEY equals VALUE and hide that column
    #[arg(long = "drill-down", value_name = "KEY=VALUE")]
    pub drill_down: Option<String>,

    /// Print the nested level-one table of the row with this key
    #[arg(long = "expand", value_name = "ROW_KEY")]
    pub expand: Option<String>,

    /// Page to print (1-based). Page size comes from the properties or the config.
    #[arg(long = "page", value_name = "N")]
    pub page: Option<usize>,

    /// Output format
    #[arg(long = "output", short = 'o', value_enum)]
    pub output: Option<OutputFormat>,

    /// Enable debug mode to show operational information
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Generate default configuration file at ~/.config/tablecraft/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

impl Args {
    /// Split `--drill-down KEY=VALUE` on the first `=`.
    pub fn drill_down_pair(&self) -> Option<(String, String)> {
        let raw = self.drill_down.as_deref()?;
        let (key, value) = raw.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some((key.to_string(), value.to_string()))
    }
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Render command-line options as markdown.
///
/// Used by the gen_docs binary; output is written to stdout.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    let usage = cmd.render_usage();
    out.push_str(&usage.to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let placeholder: String = arg
            .get_value_names()
            .map(|names| {
                names
                    .iter()
                    .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();

        let option_str = if arg.is_positional() {
            if arg.is_required_set() {
                placeholder
            } else {
                format!("[{placeholder}]")
            }
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            let op = parts.join(", ");
            if !arg.get_action().takes_values() || placeholder.is_empty() {
                op
            } else {
                format!("{op} {placeholder}")
            }
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}
