//! The table engine.
//!
//! Holds the inputs of one table component (data, properties, schema, filter
//! handlers) and the interaction state (sort, drill-down), and derives the
//! displayed [`TableView`] from them. Every change recomputes the view from
//! scratch; observers only hear about it when the result actually differs.

use serde::Serialize;
use serde_json::Value;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

use crate::alert::{AlertRules, AlertStatus};
use crate::arrange::{arrange, hide_column};
use crate::column::{build_columns, leaf_columns, ColumnContext, ColumnDescriptor, ColumnNode};
use crate::config::AppConfig;
use crate::debug::DebugState;
use crate::format::render_banner;
use crate::group::{group_rows, Grouped};
use crate::nesting::{NestedTable, Nesting};
use crate::props::{
    AssociatedFilter, Pagination, Scroll, TableProperties, DEFAULT_PAGE_SIZE, MAX_GROUP_LEVELS,
    NESTED_PAGE_SIZE,
};
use crate::registry::{ComponentRegistry, Registration, TableCommand};
use crate::sort::{sort_rows, SortSpec};
use crate::source::TableData;
use crate::types::{infer_type, FieldSchema, FieldType};
use crate::value::{display_string, Row};

/// How a host filter compares values. Only equality is offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Equal,
}

impl FilterMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::Equal => "equal",
        }
    }
}

/// Host callbacks for column filters. Supplying them makes every column filterable.
pub trait FilterHandler {
    fn on_filter_set(&mut self, field: &str, mode: FilterMode, value: &Value);
    fn on_filter_remove(&mut self, field: &str, mode: FilterMode, value: &Value);
}

/// Called with the new view and revision after every change that altered the view.
pub type Observer = Box<dyn FnMut(&TableView, u64)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub default_page_size: usize,
    pub nested_page_size: usize,
    /// Sort on header clicks even when the properties leave `sorting` off.
    pub sorting_by_default: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            nested_page_size: NESTED_PAGE_SIZE,
            sorting_by_default: false,
        }
    }
}

impl From<&AppConfig> for EngineOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            default_page_size: config.display.default_page_size,
            nested_page_size: config.display.nested_page_size,
            sorting_by_default: config.sorting.enabled_by_default,
        }
    }
}

/// Presentation settings around the table body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableChrome {
    pub pagination: Pagination,
    pub scroll: Scroll,
    pub header: Option<String>,
    pub footer: Option<String>,
    pub bordered: bool,
    pub class_name: Option<String>,
}

/// Formatted text of one cell plus its alert status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellView {
    pub text: String,
    pub state: Option<String>,
    pub badge: Option<String>,
}

/// Everything the rendering layer needs to paint the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub loading: bool,
    pub columns: Vec<ColumnNode>,
    pub rows: Grouped,
    /// Fields the rows are grouped by, outermost first.
    pub grouping: Vec<String>,
    pub sort: SortSpec,
    pub show_back_button: bool,
    pub banner: String,
    pub chrome: TableChrome,
    pub nesting: Option<Nesting>,
}

impl TableView {
    pub fn leaf_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        leaf_columns(&self.columns)
    }

    pub fn page_count(&self) -> usize {
        let size = self.chrome.pagination.page_size.max(1);
        self.rows.leaf_count().div_ceil(size)
    }

    /// Rows of a 1-based page; page 0 is treated as the first.
    pub fn page(&self, page: usize) -> Vec<&Row> {
        let size = self.chrome.pagination.page_size.max(1);
        let start = page.saturating_sub(1) * size;
        self.rows.rows().into_iter().skip(start).take(size).collect()
    }
}

/// Active drill-down: rows narrowed to one value of one field.
#[derive(Debug, Clone, PartialEq)]
struct DrillDown {
    key: String,
    value: String,
}

impl DrillDown {
    fn matches(&self, row: &Row) -> bool {
        row.get(&self.key)
            .is_some_and(|v| display_string(v) == self.value)
    }
}

pub struct TableEngine {
    options: EngineOptions,
    props: TableProperties,
    alerts: AlertRules,
    data: TableData,
    schema: Vec<FieldSchema>,
    associated_filters: Vec<AssociatedFilter>,
    handlers: Option<Box<dyn FilterHandler>>,
    sort_spec: SortSpec,
    drill_down: Option<DrillDown>,
    view: TableView,
    revision: u64,
    observers: Vec<Observer>,
    commands_tx: Sender<TableCommand>,
    commands_rx: Receiver<TableCommand>,
    registration: Option<Registration>,
    debug: DebugState,
}

impl TableEngine {
    pub fn new(options: EngineOptions) -> Self {
        let (commands_tx, commands_rx) = channel();
        let mut engine = Self {
            options,
            props: TableProperties::default(),
            alerts: AlertRules::default(),
            data: TableData::default(),
            schema: Vec::new(),
            associated_filters: Vec::new(),
            handlers: None,
            sort_spec: SortSpec::new(),
            drill_down: None,
            view: TableView {
                loading: true,
                columns: Vec::new(),
                rows: Grouped::Flat(Vec::new()),
                grouping: Vec::new(),
                sort: SortSpec::new(),
                show_back_button: false,
                banner: String::new(),
                chrome: TableChrome {
                    pagination: TableProperties::default().pagination(options.default_page_size),
                    scroll: Scroll { x: None, y: None },
                    header: None,
                    footer: None,
                    bordered: false,
                    class_name: None,
                },
                nesting: None,
            },
            revision: 0,
            observers: Vec::new(),
            commands_tx,
            commands_rx,
            registration: None,
            debug: DebugState::default(),
        };
        engine.view = engine.derive();
        engine
    }

    pub fn with_config(config: &AppConfig) -> Self {
        let mut engine = Self::new(EngineOptions::from(config));
        if config.debug.enabled {
            engine.enable_debug();
        }
        engine
    }

    pub fn view(&self) -> &TableView {
        &self.view
    }

    /// Number of times the view changed.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn properties(&self) -> &TableProperties {
        &self.props
    }

    pub fn sort_spec(&self) -> &SortSpec {
        &self.sort_spec
    }

    pub fn is_loading(&self) -> bool {
        self.view.loading
    }

    pub fn show_back_button(&self) -> bool {
        self.view.show_back_button
    }

    pub fn sorting_enabled(&self) -> bool {
        self.props.sorting || self.options.sorting_by_default
    }

    pub fn debug(&self) -> &DebugState {
        &self.debug
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&TableView, u64) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn set_data(&mut self, data: TableData) -> bool {
        self.data = data;
        self.refresh("set_data")
    }

    pub fn set_properties(&mut self, props: TableProperties) -> bool {
        self.alerts = AlertRules::new(&props.alerts);
        self.props = props;
        self.refresh("set_properties")
    }

    pub fn set_schema(&mut self, schema: Vec<FieldSchema>) -> bool {
        self.schema = schema;
        self.refresh("set_schema")
    }

    pub fn set_associated_filters(&mut self, filters: Vec<AssociatedFilter>) -> bool {
        self.associated_filters = filters;
        self.refresh("set_associated_filters")
    }

    pub fn set_handlers(&mut self, handlers: Box<dyn FilterHandler>) -> bool {
        self.handlers = Some(handlers);
        self.refresh("set_handlers")
    }

    pub fn clear_handlers(&mut self) -> bool {
        self.handlers = None;
        self.refresh("clear_handlers")
    }

    /// Advance the sort state of column `key`. Ignored while sorting is off.
    pub fn on_header_click(&mut self, key: &str, multi: bool) -> bool {
        if !self.sorting_enabled() {
            log::debug!("Ignoring header click on '{}': sorting is off", key);
            return false;
        }
        self.debug.num_header_clicks += 1;
        self.sort_spec.on_header_click(key, multi);
        self.refresh("header_click")
    }

    /// Narrow the rows to those whose `key` equals `value` and hide that column.
    pub fn drill_down(&mut self, key: &str, value: &Value) -> bool {
        self.drill_down = Some(DrillDown {
            key: key.to_string(),
            value: display_string(value),
        });
        self.refresh("drill_down")
    }

    /// Undo a drill-down.
    pub fn reset(&mut self) -> bool {
        self.drill_down = None;
        self.refresh("reset")
    }

    /// Forward a filter value for `field` to the host. Returns false without handlers.
    pub fn apply_filter(&mut self, field: &str, value: &Value) -> bool {
        match self.handlers.as_mut() {
            Some(handlers) => {
                handlers.on_filter_set(field, FilterMode::Equal, value);
                true
            }
            None => false,
        }
    }

    pub fn remove_filter(&mut self, field: &str, value: &Value) -> bool {
        match self.handlers.as_mut() {
            Some(handlers) => {
                handlers.on_filter_remove(field, FilterMode::Equal, value);
                true
            }
            None => false,
        }
    }

    /// Register this table under `id` so other components can send it commands.
    pub fn mount(&mut self, registry: &ComponentRegistry, id: impl Into<String>) {
        self.registration = Some(registry.register(id, self.commands_tx.clone()));
    }

    pub fn unmount(&mut self) {
        self.registration = None;
    }

    pub fn component_id(&self) -> Option<&str> {
        self.registration.as_ref().map(Registration::id)
    }

    /// Sender for commands addressed to this table.
    pub fn command_sender(&self) -> Sender<TableCommand> {
        self.commands_tx.clone()
    }

    /// Apply every pending command. Returns how many were handled.
    pub fn process_commands(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.commands_rx.try_recv() {
                Ok(command) => {
                    self.handle_command(command);
                    handled += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        handled
    }

    pub fn handle_command(&mut self, command: TableCommand) -> bool {
        self.debug.num_commands += 1;
        log::debug!("Handling {}", command.name());
        match command {
            TableCommand::FilterData { key, value } => self.drill_down(&key, &value),
            TableCommand::ResetDataAndColumns => self.reset(),
        }
    }

    /// Row-level alert status.
    pub fn row_status(&self, row: &Row) -> AlertStatus {
        self.alerts.evaluate(row, None)
    }

    /// Class name of a row, `table-status-<state>` when an alert matched.
    pub fn row_class_name(&self, row: &Row) -> Option<String> {
        self.alerts.row_class_name(row)
    }

    pub fn cell(&self, row: &Row, column: &ColumnDescriptor) -> CellView {
        let AlertStatus { state, badge } = self.alerts.evaluate(row, Some(&column.field));
        CellView {
            text: column.cell_text(row),
            state,
            badge,
        }
    }

    pub fn find_row(&self, key: &str) -> Option<&Row> {
        self.view.rows.rows().into_iter().find(|r| r.key == key)
    }

    /// Level-one nested table of the displayed row `key`.
    pub fn expand_row(&self, key: &str) -> Option<NestedTable> {
        let nesting = self.view.nesting.as_ref()?;
        let row = self.find_row(key)?;
        Some(nesting.level_one_table(row, self.data.dataset(0)))
    }

    /// Level-two nested table, when configured.
    pub fn expand_level_two(&self) -> Option<NestedTable> {
        self.view
            .nesting
            .as_ref()?
            .level_two_table(self.data.dataset(0))
    }

    fn refresh(&mut self, action: &str) -> bool {
        let next = self.derive();
        if next == self.view {
            self.debug.num_skipped += 1;
            self.debug.record(action);
            log::debug!("{}: table unchanged", action);
            return false;
        }

        self.view = next;
        self.revision += 1;
        self.debug.num_derivations += 1;
        self.debug.record(action);
        log::debug!(
            "{}: revision {} with {} columns and {} rows",
            action,
            self.revision,
            self.view.columns.len(),
            self.view.rows.leaf_count()
        );
        for observer in &mut self.observers {
            observer(&self.view, self.revision);
        }
        true
    }

    fn chrome(&self) -> TableChrome {
        TableChrome {
            pagination: self.props.pagination(self.options.default_page_size),
            scroll: self.props.scroll(),
            header: self.props.header_text().map(str::to_string),
            footer: self.props.footer_text().map(str::to_string),
            bordered: self.props.bordered,
            class_name: self
                .props
                .main_table_root_class_name
                .clone()
                .filter(|c| !c.is_empty()),
        }
    }

    /// Field names and types from the merged first rows, grouping fields first.
    fn fields(&self, grouping: &[String]) -> Vec<(String, FieldType)> {
        let Some(first_row) = self.data.merged_first_row() else {
            return Vec::new();
        };
        let mut fields: Vec<(String, FieldType)> = first_row
            .iter()
            .map(|(field, value)| (field.clone(), infer_type(field, Some(value), &self.schema)))
            .collect();
        if !grouping.is_empty() {
            fields.sort_by_key(|(field, _)| {
                grouping
                    .iter()
                    .position(|g| g == field)
                    .unwrap_or(MAX_GROUP_LEVELS)
            });
        }
        fields
    }

    fn derive(&self) -> TableView {
        let banner = render_banner(self.props.template.as_deref().unwrap_or_default());
        let chrome = self.chrome();
        let show_back_button = self.drill_down.is_some();

        if self.data.is_loading() {
            return TableView {
                loading: true,
                columns: Vec::new(),
                rows: Grouped::Flat(Vec::new()),
                grouping: Vec::new(),
                sort: self.sort_spec.clone(),
                show_back_button,
                banner,
                chrome,
                nesting: None,
            };
        }

        let grouping = self.props.grouping_fields(self.data.dataset(0).first());
        let fields = self.fields(&grouping);
        let ctx = ColumnContext {
            sorting: self.sorting_enabled(),
            filterable: self.handlers.is_some(),
            associated_filters: &self.associated_filters,
            sort_spec: Some(&self.sort_spec),
        };
        let descriptors = build_columns(&fields, &self.props.fields_configuration, &ctx);
        let mut columns = arrange(
            descriptors,
            &self.props.fields_configuration,
            &self.props.unwanted_fields,
        );
        let nesting = Nesting::build(&fields, &self.props, &ctx, self.options.nested_page_size);

        let mut rows = Row::keyed(self.data.dataset(0).to_vec());
        if let Some(drill) = &self.drill_down {
            rows.retain(|row| drill.matches(row));
        }
        let rows = if grouping.is_empty() {
            sort_rows(&mut rows, &columns, &self.sort_spec);
            Grouped::Flat(rows)
        } else {
            group_rows(rows, &grouping)
        };
        if let Some(drill) = &self.drill_down {
            columns = hide_column(columns, &drill.key);
        }

        TableView {
            loading: false,
            columns,
            rows,
            grouping,
            sort: self.sort_spec.clone(),
            show_back_button,
            banner,
            chrome,
            nesting,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn data(value: Value) -> TableData {
        TableData::from_json(value).unwrap()
    }

    fn keys(view: &TableView) -> Vec<&str> {
        view.columns.iter().map(|c| c.key()).collect()
    }

    #[test]
    fn test_loading_until_data_arrives() {
        let mut engine = TableEngine::new(EngineOptions::default());
        assert!(engine.is_loading());
        assert!(engine.view().columns.is_empty());
        assert_eq!(engine.view().chrome.pagination.page_size, 10);

        assert!(engine.set_data(data(json!([{"a": 1}]))));
        assert!(!engine.is_loading());
        assert_eq!(engine.revision(), 1);
    }

    #[test]
    fn test_basic_columns_and_rows() {
        let mut engine = TableEngine::new(EngineOptions::default());
        engine.set_properties(TableProperties::from_json(json!({
            "fieldsConfiguration": [{"fieldName": "a", "displayName": "A"}]
        })));
        engine.set_data(data(json!([{"a": 1, "b": "x"}, {"a": 2, "b": "y"}])));

        let view = engine.view();
        assert_eq!(keys(view), vec!["a", "b"]);
        let labels: Vec<&str> = view.leaf_columns().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "b"]);
        let row_keys: Vec<&str> = view.rows.rows().iter().map(|r| r.key.as_str()).collect();
        assert_eq!(row_keys, vec!["0", "1"]);
        assert_eq!(engine.row_class_name(view.rows.rows()[0]), None);
    }

    #[test]
    fn test_unchanged_input_skips_revision() {
        let mut engine = TableEngine::new(EngineOptions::default());
        let notified = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&notified);
        engine.subscribe(move |_, revision| sink.borrow_mut().push(revision));

        assert!(engine.set_data(data(json!([{"a": 1}]))));
        assert!(!engine.set_data(data(json!([{"a": 1}]))));
        assert_eq!(engine.revision(), 1);
        assert_eq!(*notified.borrow(), vec![1]);
        assert_eq!(engine.debug().num_skipped, 1);
    }

    #[test]
    fn test_header_clicks_need_sorting() {
        let mut engine = TableEngine::new(EngineOptions::default());
        engine.set_data(data(json!([{"n": 2}, {"n": 1}])));
        assert!(!engine.on_header_click("n", false));
        assert!(engine.sort_spec().is_empty());

        engine.set_properties(TableProperties::from_json(json!({"sorting": true})));
        assert!(engine.on_header_click("n", false));
        let keys: Vec<&str> = engine.view().rows.rows().iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["1", "0"]);
    }

    #[test]
    fn test_grouping_moves_fields_first() {
        let mut engine = TableEngine::new(EngineOptions::default());
        engine.set_properties(TableProperties::from_json(json!({"groupedByField": "b"})));
        engine.set_data(data(json!([{"a": 1, "b": "x"}, {"a": 2, "b": "y"}])));
        let view = engine.view();
        assert_eq!(keys(view), vec!["b", "a"]);
        assert_eq!(view.grouping, vec!["b"]);
        assert_eq!(view.rows.depth(), 1);
        assert_eq!(view.rows.leaf_count(), 2);
    }

    #[test]
    fn test_drill_down_and_reset() {
        let mut engine = TableEngine::new(EngineOptions::default());
        engine.set_data(data(json!([
            {"site": "north", "n": 1},
            {"site": "south", "n": 2},
            {"site": "north", "n": 3}
        ])));

        assert!(engine.drill_down("site", &json!("north")));
        assert!(engine.show_back_button());
        assert_eq!(keys(engine.view()), vec!["n"]);
        assert_eq!(engine.view().rows.leaf_count(), 2);

        assert!(engine.reset());
        assert!(!engine.show_back_button());
        assert_eq!(keys(engine.view()), vec!["site", "n"]);
        assert_eq!(engine.view().rows.leaf_count(), 3);
    }

    #[test]
    fn test_commands_through_registry() {
        let registry = ComponentRegistry::new();
        let mut engine = TableEngine::new(EngineOptions::default());
        engine.set_data(data(json!([{"id": 1}, {"id": 2}])));
        engine.mount(&registry, "history");
        assert_eq!(engine.component_id(), Some("history"));

        registry.filter_data("history", "id", json!(2)).unwrap();
        assert_eq!(engine.process_commands(), 1);
        assert_eq!(engine.view().rows.leaf_count(), 1);

        registry.reset_data_and_columns("history").unwrap();
        engine.process_commands();
        assert_eq!(engine.view().rows.leaf_count(), 2);
        assert_eq!(engine.debug().num_commands, 2);

        engine.unmount();
        assert!(!registry.contains("history"));
    }

    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl FilterHandler for Recorder {
        fn on_filter_set(&mut self, field: &str, mode: FilterMode, value: &Value) {
            self.0
                .borrow_mut()
                .push(format!("set {} {} {}", field, mode.as_str(), value));
        }

        fn on_filter_remove(&mut self, field: &str, mode: FilterMode, value: &Value) {
            self.0
                .borrow_mut()
                .push(format!("remove {} {} {}", field, mode.as_str(), value));
        }
    }

    #[test]
    fn test_filter_handlers() {
        let mut engine = TableEngine::new(EngineOptions::default());
        engine.set_data(data(json!([{"a": 1}])));
        assert!(!engine.apply_filter("a", &json!(1)));
        assert!(engine.view().leaf_columns().all(|c| c.filter.is_none()));

        let calls = Rc::new(RefCell::new(Vec::new()));
        engine.set_handlers(Box::new(Recorder(Rc::clone(&calls))));
        assert!(engine.view().leaf_columns().all(|c| c.filter.is_some()));
        assert!(engine.apply_filter("a", &json!(1)));
        assert!(engine.remove_filter("a", &json!(1)));
        assert_eq!(*calls.borrow(), vec!["set a equal 1", "remove a equal 1"]);
    }

    #[test]
    fn test_cells_and_row_class() {
        let mut engine = TableEngine::new(EngineOptions::default());
        engine.set_properties(TableProperties::from_json(json!({
            "alerts": [{"fieldName": "a", "functionName": "gte", "value": 2, "state": "warn", "badge": "orange"}]
        })));
        engine.set_data(data(json!([{"a": 2, "b": "x"}, {"a": 1, "b": "y"}])));

        let view = engine.view().clone();
        let rows = view.rows.rows();
        let columns: Vec<&ColumnDescriptor> = view.leaf_columns().collect();
        let hit = engine.cell(rows[0], columns[0]);
        assert_eq!(hit.text, "2");
        assert_eq!(hit.state.as_deref(), Some("warn"));
        assert_eq!(hit.badge.as_deref(), Some("orange"));
        assert_eq!(engine.cell(rows[0], columns[1]).state, None);
        assert_eq!(engine.cell(rows[1], columns[0]).state, None);
        assert_eq!(
            engine.row_class_name(rows[0]).as_deref(),
            Some("table-status-warn")
        );
    }

    #[test]
    fn test_paging() {
        let mut engine = TableEngine::new(EngineOptions::default());
        engine.set_properties(TableProperties::from_json(json!({"pageSize": "2"})));
        engine.set_data(data(json!([{"a": 1}, {"a": 2}, {"a": 3}])));
        let view = engine.view();
        assert_eq!(view.page_count(), 2);
        assert_eq!(view.page(2).len(), 1);
        assert_eq!(view.page(0).len(), 2);
        assert!(view.page(3).is_empty());
    }
}
