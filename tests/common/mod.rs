#![allow(dead_code)]

use serde_json::{json, Value};
use tablecraft::{EngineOptions, TableData, TableEngine, TableProperties, TableView};

/// Orders from three sites, shared by several tests.
pub fn orders() -> Value {
    json!([
        {"id": 1, "site": "north", "region": "eu", "amount": 120, "placed": "2024-03-01"},
        {"id": 2, "site": "south", "region": "eu", "amount": 80, "placed": "2024-01-15"},
        {"id": 3, "site": "north", "region": "us", "amount": 200, "placed": "2024-02-10"},
        {"id": 4, "site": "east", "region": "us", "amount": 45, "placed": "2023-12-24"}
    ])
}

pub fn engine_with(props: Value, data: Value) -> TableEngine {
    let mut engine = TableEngine::new(EngineOptions::default());
    engine.set_properties(TableProperties::from_json(props));
    engine.set_data(TableData::from_json(data).unwrap());
    engine
}

pub fn column_keys(view: &TableView) -> Vec<String> {
    view.columns.iter().map(|c| c.key().to_string()).collect()
}

pub fn row_field(view: &TableView, field: &str) -> Vec<Value> {
    view.rows
        .rows()
        .iter()
        .map(|r| r.get(field).cloned().unwrap_or(Value::Null))
        .collect()
}
