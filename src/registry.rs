//! Host-owned registry of mounted table components.
//!
//! Other components address a table by its component id and send it commands
//! through a channel. A table registers when it is mounted and the returned
//! [`Registration`] removes the entry again when dropped.

use color_eyre::eyre::{eyre, Result};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::mpsc::Sender;

/// Commands another component can send to a mounted table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableCommand {
    /// Narrow the table to rows whose `key` equals `value`, hiding that column.
    FilterData { key: String, value: Value },
    /// Undo a previous `FilterData`.
    ResetDataAndColumns,
}

impl TableCommand {
    pub fn name(&self) -> &'static str {
        match self {
            TableCommand::FilterData { .. } => "filterData",
            TableCommand::ResetDataAndColumns => "resetDataAndColumns",
        }
    }
}

struct Entry {
    generation: u64,
    sender: Sender<TableCommand>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    next_generation: u64,
}

#[derive(Clone, Default)]
pub struct ComponentRegistry {
    inner: Rc<RefCell<Inner>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id`, replacing any component previously registered under it.
    pub fn register(&self, id: impl Into<String>, sender: Sender<TableCommand>) -> Registration {
        let id = id.into();
        let mut inner = self.inner.borrow_mut();
        let generation = inner.next_generation;
        inner.next_generation += 1;
        if inner
            .entries
            .insert(id.clone(), Entry { generation, sender })
            .is_some()
        {
            log::debug!("Component '{}' re-registered", id);
        }
        Registration {
            id,
            generation,
            registry: Rc::downgrade(&self.inner),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.borrow().entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Component ids currently registered, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.borrow().entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn send(&self, id: &str, command: TableCommand) -> Result<()> {
        let inner = self.inner.borrow();
        let entry = inner
            .entries
            .get(id)
            .ok_or_else(|| eyre!("No table component registered as '{}'", id))?;
        let name = command.name();
        entry
            .sender
            .send(command)
            .map_err(|_| eyre!("Table component '{}' is no longer listening for {}", id, name))
    }

    pub fn filter_data(&self, id: &str, key: impl Into<String>, value: Value) -> Result<()> {
        self.send(
            id,
            TableCommand::FilterData {
                key: key.into(),
                value,
            },
        )
    }

    pub fn reset_data_and_columns(&self, id: &str) -> Result<()> {
        self.send(id, TableCommand::ResetDataAndColumns)
    }
}

/// Registration handle; dropping it removes the component from the registry.
pub struct Registration {
    id: String,
    generation: u64,
    registry: Weak<RefCell<Inner>>,
}

impl Registration {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        let Some(inner) = self.registry.upgrade() else {
            return;
        };
        let mut inner = inner.borrow_mut();
        // A newer registration under the same id stays.
        if inner
            .entries
            .get(&self.id)
            .is_some_and(|e| e.generation == self.generation)
        {
            inner.entries.remove(&self.id);
            log::debug!("Component '{}' deregistered", self.id);
        }
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("generation", &self.generation)
            .finish()
    }
}
