//! Table input data: one or more datasets, each materialized or produced by a query.

use color_eyre::eyre::{eyre, Result};
use serde_json::Value;
use std::cell::OnceCell;
use std::fmt;

use crate::value::Record;

/// Deferred producer of dataset rows.
pub trait RowQuery {
    fn execute(&self) -> Result<Vec<Record>>;
}

impl<F> RowQuery for F
where
    F: Fn() -> Result<Vec<Record>>,
{
    fn execute(&self) -> Result<Vec<Record>> {
        self()
    }
}

/// A query whose result is computed on first access and then reused.
pub struct CachedQuery {
    query: Box<dyn RowQuery>,
    rows: OnceCell<Vec<Record>>,
}

impl CachedQuery {
    pub fn new(query: impl RowQuery + 'static) -> Self {
        Self {
            query: Box::new(query),
            rows: OnceCell::new(),
        }
    }

    /// Rows of the query. A failed query yields no rows and is not retried.
    pub fn rows(&self) -> &[Record] {
        self.rows.get_or_init(|| match self.query.execute() {
            Ok(rows) => rows,
            Err(e) => {
                log::warn!("Dataset query failed: {}", e);
                Vec::new()
            }
        })
    }

    pub fn is_executed(&self) -> bool {
        self.rows.get().is_some()
    }
}

impl fmt::Debug for CachedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedQuery")
            .field("executed", &self.is_executed())
            .finish()
    }
}

#[derive(Debug)]
pub enum DataSource {
    Rows(Vec<Record>),
    Query(CachedQuery),
}

impl DataSource {
    pub fn query(query: impl RowQuery + 'static) -> Self {
        DataSource::Query(CachedQuery::new(query))
    }

    pub fn rows(&self) -> &[Record] {
        match self {
            DataSource::Rows(rows) => rows,
            DataSource::Query(query) => query.rows(),
        }
    }
}

/// All datasets handed to one table. The main table shows the first.
#[derive(Debug, Default)]
pub struct TableData {
    datasets: Vec<DataSource>,
}

impl TableData {
    pub fn new(datasets: Vec<DataSource>) -> Self {
        Self { datasets }
    }

    pub fn single(rows: Vec<Record>) -> Self {
        Self::new(vec![DataSource::Rows(rows)])
    }

    /// Parse either a list of datasets (`[[{..}], [{..}]]`) or one dataset (`[{..}]`).
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Array(items) = value else {
            return Err(eyre!("Table data must be a JSON array"));
        };
        if items.iter().all(Value::is_array) && !items.is_empty() {
            let datasets = items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| records(item).map_err(|e| eyre!("Dataset {}: {}", idx, e)))
                .map(|rows| rows.map(DataSource::Rows))
                .collect::<Result<Vec<_>>>()?;
            Ok(Self::new(datasets))
        } else {
            Ok(Self::single(records(Value::Array(items))?))
        }
    }

    /// No dataset has been supplied yet.
    pub fn is_loading(&self) -> bool {
        self.datasets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    pub fn dataset(&self, idx: usize) -> &[Record] {
        self.datasets.get(idx).map(DataSource::rows).unwrap_or_default()
    }

    /// First row of every dataset merged into one record; later datasets add
    /// their fields after the earlier ones and override their values.
    pub fn merged_first_row(&self) -> Option<Record> {
        let mut merged: Option<Record> = None;
        for first in self.datasets.iter().filter_map(|d| d.rows().first()) {
            let target = merged.get_or_insert_with(Record::new);
            for (field, value) in first {
                target.insert(field.clone(), value.clone());
            }
        }
        merged
    }
}

fn records(value: Value) -> Result<Vec<Record>> {
    let Value::Array(items) = value else {
        return Err(eyre!("dataset must be an array of objects"));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(record) => Ok(record),
            other => Err(eyre!("row {} is not an object: {}", idx, other)),
        })
        .collect()
}
