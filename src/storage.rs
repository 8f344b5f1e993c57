//! Typed collections over a string key-value substrate.
//!
//! Every collection is stored whole under its own key. Reads never fail:
//! missing or corrupt values fall back to an empty collection or a seed.
//! Writes replace the previous value entirely.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::collections::HashMap;
use thiserror::Error;

use crate::database::{Database, DatabaseError};
use crate::models::{
    self, PlannerTask, Project, TaskStatus, TaskView, Theme, WorkSession,
};

pub const PROJECTS_KEY: &str = "deepwork_projects";
pub const SESSIONS_KEY: &str = "deepwork_sessions";
pub const TASKS_KEY: &str = "deepwork_planner_tasks";
pub const STATUSES_KEY: &str = "deepwork_planner_statuses";
pub const VIEWS_KEY: &str = "deepwork_planner_views";
pub const TIMER_KEY: &str = "focus-flow-timer";
pub const THEME_KEY: &str = "deepwork_theme";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("Failed to encode value for '{key}': {source}")]
    EncodeError {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Persisted string mapping: the only capability the rest of the crate needs
/// from a storage technology.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Write several values as one unit. Stores with transactions override
    /// this so a failure leaves every key untouched.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get_value(key)?)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Ok(self.set_value(key, value)?)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        Ok(self.remove_value(key)?)
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        Ok(self.set_values(entries)?)
    }
}

/// Process-local store, used by tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

/// An entity kind persisted as one JSON array under a fixed key.
pub trait Collection: Serialize + DeserializeOwned {
    const KEY: &'static str;

    /// Contents assumed when nothing usable is stored.
    fn seed() -> Vec<Self> {
        Vec::new()
    }
}

impl Collection for Project {
    const KEY: &'static str = PROJECTS_KEY;

    fn seed() -> Vec<Self> {
        models::default_projects()
    }
}

impl Collection for WorkSession {
    const KEY: &'static str = SESSIONS_KEY;
}

impl Collection for PlannerTask {
    const KEY: &'static str = TASKS_KEY;
}

impl Collection for TaskStatus {
    const KEY: &'static str = STATUSES_KEY;

    fn seed() -> Vec<Self> {
        models::default_statuses()
    }
}

impl Collection for TaskView {
    const KEY: &'static str = VIEWS_KEY;

    fn seed() -> Vec<Self> {
        models::default_views()
    }
}

fn encode<T: Collection>(items: &[T]) -> Result<String, StorageError> {
    serde_json::to_string(items).map_err(|source| StorageError::EncodeError {
        key: T::KEY,
        source,
    })
}

/// Repository over a key-value store.
pub struct Storage<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> Storage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load a whole collection.
    ///
    /// A missing value is initialised with the collection's seed (written back
    /// when non-empty). A malformed or unreadable value yields the seed without
    /// touching what is stored.
    pub fn load<T: Collection>(&self) -> Vec<T> {
        match self.store.get(T::KEY) {
            Ok(Some(text)) => match serde_json::from_str(&text) {
                Ok(items) => items,
                Err(e) => {
                    log::warn!("discarding malformed data under '{}': {}", T::KEY, e);
                    T::seed()
                }
            },
            Ok(None) => {
                let seed = T::seed();
                if !seed.is_empty() {
                    if let Err(e) = self.save(&seed) {
                        log::warn!("failed to write default seed for '{}': {}", T::KEY, e);
                    }
                }
                seed
            }
            Err(e) => {
                log::warn!("failed to read '{}': {}", T::KEY, e);
                T::seed()
            }
        }
    }

    /// Replace a whole collection.
    pub fn save<T: Collection>(&self, items: &[T]) -> Result<(), StorageError> {
        let text = encode(items)?;
        self.store.set(T::KEY, &text)
    }

    /// Replace two collections in a single write.
    pub fn save_pair<A: Collection, B: Collection>(
        &self,
        first: &[A],
        second: &[B],
    ) -> Result<(), StorageError> {
        let first_text = encode(first)?;
        let second_text = encode(second)?;
        self.store
            .set_many(&[(A::KEY, first_text.as_str()), (B::KEY, second_text.as_str())])
    }

    /// Add one item to the end of a collection and return the new contents.
    pub fn append<T: Collection>(&self, item: T) -> Result<Vec<T>, StorageError> {
        let mut items = self.load::<T>();
        items.push(item);
        self.save(&items)?;
        Ok(items)
    }

    /// Drop every item matching `pred` and return the remaining contents.
    pub fn remove_where<T, F>(&self, pred: F) -> Result<Vec<T>, StorageError>
    where
        T: Collection,
        F: Fn(&T) -> bool,
    {
        let mut items = self.load::<T>();
        let before = items.len();
        items.retain(|item| !pred(item));
        if items.len() != before {
            self.save(&items)?;
        }
        Ok(items)
    }

    /// Read a single JSON value; `None` when missing or malformed.
    pub fn load_value<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store.get(key) {
            Ok(Some(text)) => match serde_json::from_str(&text) {
                Ok(value) => Some(value),
                Err(e) => {
                    log::warn!("discarding malformed data under '{}': {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                log::warn!("failed to read '{}': {}", key, e);
                None
            }
        }
    }

    pub fn save_value<T: Serialize>(&self, key: &'static str, value: &T) -> Result<(), StorageError> {
        let text = serde_json::to_string(value)
            .map_err(|source| StorageError::EncodeError { key, source })?;
        self.store.set(key, &text)
    }

    pub fn remove_value(&self, key: &str) -> Result<(), StorageError> {
        self.store.remove(key)
    }

    pub fn theme(&self) -> Theme {
        self.load_value(THEME_KEY).unwrap_or_default()
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), StorageError> {
        self.save_value(THEME_KEY, &theme)
    }
}
