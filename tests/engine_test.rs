mod common;

use common::{column_keys, engine_with, orders, row_field};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tablecraft::{
    ColumnNode, DataSource, EngineOptions, FieldSchema, FieldType, GroupChildren, Grouped,
    Record, SortDirection, TableData, TableEngine, TableProperties,
};

#[test]
fn test_labels_fall_back_to_field_names() {
    let engine = engine_with(
        json!({"fieldsConfiguration": [{"fieldName": "a", "displayName": "A"}]}),
        json!([{"a": 1, "b": "x"}, {"a": 2, "b": "y"}]),
    );
    let view = engine.view();
    let columns: Vec<(&str, &str, usize)> = view
        .leaf_columns()
        .map(|c| (c.field.as_str(), c.label.as_str(), c.order))
        .collect();
    assert_eq!(columns, vec![("a", "A", 0), ("b", "b", 1)]);
    assert_eq!(row_field(view, "a"), vec![json!(1), json!(2)]);
    for row in view.rows.rows() {
        assert_eq!(engine.row_class_name(row), None);
    }
}

#[test]
fn test_grouped_by_single_field() {
    let engine = engine_with(
        json!({"groupedByField": "b"}),
        json!([{"a": 1, "b": "x"}, {"a": 2, "b": "y"}]),
    );
    let Grouped::Tree(groups) = &engine.view().rows else {
        panic!("expected grouped rows");
    };
    let titles: Vec<(&str, &str)> = groups
        .iter()
        .map(|g| (g.value.as_str(), g.key.as_str()))
        .collect();
    assert_eq!(titles, vec![("x", "root.x"), ("y", "root.y")]);
    for group in groups {
        let GroupChildren::Rows(rows) = &group.children else {
            panic!("expected leaf rows");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, format!("{}.0", group.key));
    }
}

#[test]
fn test_two_level_grouping_keeps_first_occurrence_order() {
    let engine = engine_with(json!({"groupedByField": "region, site"}), orders());
    let view = engine.view();
    assert_eq!(view.grouping, vec!["region", "site"]);
    assert_eq!(&column_keys(view)[..2], &["region", "site"]);
    assert_eq!(view.rows.depth(), 2);
    assert_eq!(view.rows.leaf_count(), 4);

    let Grouped::Tree(groups) = &view.rows else {
        panic!("expected grouped rows");
    };
    assert_eq!(groups[0].value, "eu");
    let GroupChildren::Groups(eu) = &groups[0].children else {
        panic!("expected a second level");
    };
    let sites: Vec<&str> = eu.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(sites, vec!["root.eu.north", "root.eu.south"]);
}

#[test]
fn test_grouping_field_missing_from_first_row_is_ignored() {
    let engine = engine_with(json!({"groupedByField": "missing,site"}), orders());
    assert_eq!(engine.view().grouping, vec!["site"]);
    assert_eq!(engine.view().rows.depth(), 1);
}

#[test]
fn test_gte_alert_on_cells_and_rows() {
    let engine = engine_with(
        json!({"alerts": [
            {"fieldName": "a", "functionName": "gte", "value": 2, "state": "warn", "badge": "orange"}
        ]}),
        json!([{"a": 2}, {"a": 1}]),
    );
    let view = engine.view();
    let rows = view.rows.rows();
    let column = view.leaf_columns().next().unwrap();

    let hit = engine.row_status(rows[0]);
    assert_eq!(hit.state.as_deref(), Some("warn"));
    assert_eq!(hit.badge.as_deref(), Some("orange"));
    let miss = engine.row_status(rows[1]);
    assert_eq!(miss.state, None);
    assert_eq!(miss.badge, None);
    assert_eq!(engine.cell(rows[1], column).badge, None);
}

#[test]
fn test_first_matching_alert_wins() {
    let engine = engine_with(
        json!({"alerts": [
            {"fieldName": "site", "functionName": "regex", "value": "^NOR", "state": "north", "badge": "blue"},
            {"fieldName": "amount", "functionName": "gt", "value": 100, "state": "big", "badge": "red"}
        ]}),
        orders(),
    );
    let view = engine.view();
    let rows = view.rows.rows();
    assert_eq!(
        engine.row_class_name(rows[0]).as_deref(),
        Some("table-status-north")
    );
    assert_eq!(engine.row_class_name(rows[1]), None);
}

#[test]
fn test_unwanted_fields_removed_under_header_groups() {
    let engine = engine_with(
        json!({
            "fieldsConfiguration": [
                {"fieldName": "site", "group": "Where"},
                {"fieldName": "region", "group": "Where"}
            ],
            "unwantedFields": [{"columnName": "region"}, {"columnName": "placed"}]
        }),
        orders(),
    );
    let view = engine.view();
    assert_eq!(column_keys(view), vec!["id", "group-Where", "amount"]);
    let ColumnNode::Group(group) = &view.columns[1] else {
        panic!("expected a header group");
    };
    assert_eq!(group.title, "Where");
    let members: Vec<&str> = group.children.iter().map(|c| c.field.as_str()).collect();
    assert_eq!(members, vec!["site"]);
}

#[test]
fn test_manual_order_without_header_groups() {
    let engine = engine_with(
        json!({"fieldsConfiguration": [{"fieldName": "amount"}, {"fieldName": "site"}]}),
        orders(),
    );
    assert_eq!(
        column_keys(engine.view()),
        vec!["amount", "site", "id", "region", "placed"]
    );
}

#[test]
fn test_sort_cycle_and_multi_select() {
    let mut engine = engine_with(json!({"sorting": true}), orders());

    engine.on_header_click("amount", false);
    assert_eq!(
        engine.sort_spec().direction_of("amount"),
        Some(SortDirection::Descend)
    );
    assert_eq!(
        row_field(engine.view(), "amount"),
        vec![json!(45), json!(80), json!(120), json!(200)]
    );

    engine.on_header_click("amount", false);
    assert_eq!(
        row_field(engine.view(), "amount"),
        vec![json!(200), json!(120), json!(80), json!(45)]
    );
    let amount = engine
        .view()
        .leaf_columns()
        .find(|c| c.field == "amount")
        .unwrap();
    assert_eq!(amount.sort_direction, Some(SortDirection::Ascend));

    engine.on_header_click("amount", false);
    assert!(engine.sort_spec().is_empty());
    assert_eq!(
        row_field(engine.view(), "id"),
        vec![json!(1), json!(2), json!(3), json!(4)]
    );

    engine.on_header_click("site", false);
    engine.on_header_click("amount", true);
    assert_eq!(engine.sort_spec().entries().len(), 2);
    assert_eq!(
        row_field(engine.view(), "id"),
        vec![json!(4), json!(1), json!(3), json!(2)]
    );
}

#[test]
fn test_sorting_by_default_option() {
    let mut engine = TableEngine::new(EngineOptions {
        sorting_by_default: true,
        ..EngineOptions::default()
    });
    engine.set_data(TableData::from_json(orders()).unwrap());
    assert!(engine.sorting_enabled());
    assert!(engine.on_header_click("amount", false));
}

#[test]
fn test_declared_schema_sorts_dates() {
    let mut engine = engine_with(json!({"sorting": true}), orders());
    assert_eq!(
        engine.view().leaf_columns().find(|c| c.field == "placed").unwrap().field_type,
        FieldType::Number
    );
    engine.set_schema(vec![FieldSchema::new("placed", "date")]);
    engine.on_header_click("placed", false);
    assert_eq!(
        row_field(engine.view(), "id"),
        vec![json!(4), json!(2), json!(3), json!(1)]
    );
}

#[test]
fn test_drill_down_hides_column_and_reset_restores() {
    let mut engine = engine_with(json!({}), orders());
    let before = engine.view().clone();

    assert!(engine.drill_down("site", &json!("north")));
    let view = engine.view();
    assert!(engine.show_back_button());
    assert!(!column_keys(view).contains(&"site".to_string()));
    assert_eq!(row_field(view, "id"), vec![json!(1), json!(3)]);

    assert!(engine.reset());
    assert_eq!(engine.view(), &before);
}

#[test]
fn test_drill_down_compares_text() {
    let mut engine = engine_with(json!({}), orders());
    engine.drill_down("id", &json!("3"));
    assert_eq!(row_field(engine.view(), "amount"), vec![json!(200)]);
}

#[test]
fn test_level_one_nesting() {
    let mut engine = engine_with(
        json!({
            "levelOneNestingStructure": [{"fieldName": "id"}, {"fieldName": "amount", "displayName": "Total"}],
            "levelOnePointOfContact": [{"dataName": "site"}]
        }),
        orders(),
    );
    let nesting = engine.view().nesting.clone().unwrap();
    let labels: Vec<&str> = nesting.level_one.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["id", "Total"]);
    assert_eq!(nesting.page_size, 3);

    let nested = engine.expand_row("0").unwrap();
    let ids: Vec<Value> = nested.rows.iter().map(|r| r.get("id").cloned().unwrap()).collect();
    assert_eq!(ids, vec![json!(1), json!(3)]);
    assert!(!nested.expandable);
    assert!(engine.expand_level_two().is_none());
    assert!(engine.expand_row("missing").is_none());

    engine.set_properties(TableProperties::from_json(json!({
        "levelOneNestingStructure": [{"fieldName": "id"}],
        "levelTwoNestingStructure": [{"fieldName": "placed"}]
    })));
    let nested = engine.expand_row("0").unwrap();
    assert!(nested.rows.is_empty());
    assert!(nested.expandable);
    assert_eq!(engine.expand_level_two().unwrap().rows.len(), 4);
}

#[test]
fn test_columns_come_from_every_dataset() {
    let mut engine = TableEngine::new(EngineOptions::default());
    engine.set_data(
        TableData::from_json(json!([
            [{"id": 1, "site": "north"}],
            [{"id": 9, "owner": "kim"}]
        ]))
        .unwrap(),
    );
    let view = engine.view();
    assert_eq!(column_keys(view), vec!["id", "site", "owner"]);
    assert_eq!(view.rows.leaf_count(), 1);
}

#[test]
fn test_query_runs_once() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let query = move || -> color_eyre::Result<Vec<Record>> {
        counter.set(counter.get() + 1);
        let rows: Vec<Record> = serde_json::from_value(orders())?;
        Ok(rows)
    };

    let mut engine = TableEngine::new(EngineOptions::default());
    engine.set_data(TableData::new(vec![DataSource::query(query)]));
    engine.on_header_click("amount", false);
    engine.drill_down("site", &json!("north"));
    engine.reset();
    assert_eq!(engine.view().rows.leaf_count(), 4);
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_failed_query_shows_empty_table() {
    let mut engine = TableEngine::new(EngineOptions::default());
    engine.set_data(TableData::new(vec![DataSource::query(
        || -> color_eyre::Result<Vec<Record>> { Err(color_eyre::eyre::eyre!("offline")) },
    )]));
    assert!(!engine.is_loading());
    assert!(engine.view().columns.is_empty());
    assert_eq!(engine.view().rows.leaf_count(), 0);
}

#[test]
fn test_banner_header_and_chrome() {
    let engine = engine_with(
        json!({
            "template": "{% if true %}Quarterly{% endif %} report",
            "header": "Orders",
            "bordered": true,
            "pageSize": "2",
            "mainTableRootClassName": "orders"
        }),
        orders(),
    );
    let view = engine.view();
    assert_eq!(view.banner, "Quarterly report");
    assert_eq!(view.chrome.header.as_deref(), Some("Orders"));
    assert!(view.chrome.bordered);
    assert_eq!(view.chrome.class_name.as_deref(), Some("orders"));
    assert_eq!(view.page_count(), 2);
}

#[test]
fn test_observers_hear_only_changes() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let mut engine = TableEngine::new(EngineOptions::default());
    engine.subscribe(move |view, revision| sink.borrow_mut().push((revision, view.loading)));

    engine.set_data(TableData::from_json(orders()).unwrap());
    engine.set_properties(TableProperties::default());
    engine.on_header_click("amount", false);
    engine.set_properties(TableProperties::from_json(json!({"bordered": true})));

    assert_eq!(*seen.borrow(), vec![(1, false), (2, false)]);
    assert_eq!(engine.debug().num_derivations, 2);
    assert_eq!(engine.debug().num_skipped, 1);
}

#[test]
fn test_bad_alert_keeps_the_rest_of_the_properties() {
    let engine = engine_with(
        json!({
            "fieldsConfiguration": [{"fieldName": "a", "displayName": "A"}],
            "unwantedFields": [{"columnName": "b"}],
            "alerts": [{"functionName": "gte", "value": 1, "state": "warn", "badge": "orange"}]
        }),
        json!([{"a": 1, "b": "x"}]),
    );
    let labels: Vec<&str> = engine.view().leaf_columns().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["A"]);
    assert!(engine.properties().alerts.is_empty());
}

#[test]
fn test_string_flag_keeps_column_configuration() {
    let mut engine = engine_with(
        json!({
            "sorting": "true",
            "fieldsConfiguration": [{"fieldName": "amount", "displayName": "Total"}]
        }),
        orders(),
    );
    assert_eq!(engine.properties().fields_configuration.len(), 1);
    assert!(engine.sorting_enabled());
    assert!(engine.on_header_click("amount", false));
    let total = engine
        .view()
        .leaf_columns()
        .find(|c| c.field == "amount")
        .unwrap();
    assert_eq!(total.label, "Total");
}
