use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
}

/// SQLite file holding every persisted collection as a string value under its key.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create a new database connection and initialize the schema
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;

        let db = Database { conn };
        db.initialize_schema()?;
        log::debug!("opened database at {}", db_path.display());

        Ok(db)
    }

    /// Open a private database that lives only as long as the handle
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let db = Database {
            conn: Connection::open_in_memory()?,
        };
        db.initialize_schema()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key             TEXT PRIMARY KEY,
                value           TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Read the value stored under `key`
    pub fn get_value(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                rusqlite::params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Replace the value stored under `key`
    pub fn set_value(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.set_values(&[(key, value)])
    }

    /// Replace several values in one transaction; on error none of them change
    pub fn set_values(&self, entries: &[(&str, &str)]) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let updated_at = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        for (key, value) in entries {
            tx.execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                rusqlite::params![key, value, updated_at],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Delete the value stored under `key`; missing keys are not an error
    pub fn remove_value(&self, key: &str) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM kv_store WHERE key = ?1", rusqlite::params![key])?;
        tx.commit()?;
        Ok(())
    }
}
