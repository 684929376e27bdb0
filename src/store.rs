use std::path::Path;

use rusqlite::{Connection, params};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::StoreConfig;
use crate::error::PipelineError;
use crate::util::now_utc_string;

/// Append-only document collections. Inserts never deduplicate.
pub trait DocumentStore {
    fn insert_one(&mut self, collection: &str, document: &Value) -> Result<i64, PipelineError>;

    fn count(&self, collection: &str) -> Result<u64, PipelineError>;
}

pub struct SqliteDocumentStore {
    connection: Connection,
    database: String,
}

impl SqliteDocumentStore {
    pub fn open(path: &Path, database: &str) -> Result<Self, PipelineError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| {
                PipelineError::persistence(format!("failed to create {}: {err}", parent.display()))
            })?;
        }

        let connection = Connection::open(path).map_err(|err| {
            PipelineError::persistence(format!("failed to open {}: {err}", path.display()))
        })?;
        Self::with_connection(connection, database)
    }

    #[cfg(test)]
    pub fn open_in_memory(database: &str) -> Result<Self, PipelineError> {
        let connection = Connection::open_in_memory().map_err(PipelineError::persistence)?;
        Self::with_connection(connection, database)
    }

    fn with_connection(connection: Connection, database: &str) -> Result<Self, PipelineError> {
        configure_connection(&connection)?;
        ensure_schema(&connection)?;

        Ok(Self {
            connection,
            database: database.to_string(),
        })
    }

    pub fn collection_counts(&self) -> Result<Vec<(String, u64)>, PipelineError> {
        let mut statement = self
            .connection
            .prepare(
                "
                SELECT collection, COUNT(*)
                FROM documents
                WHERE db_name = ?1
                GROUP BY collection
                ORDER BY collection ASC
                ",
            )
            .map_err(PipelineError::persistence)?;

        let rows = statement
            .query_map(params![self.database], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(PipelineError::persistence)?;

        let mut counts = Vec::new();
        for row in rows {
            let (collection, count) = row.map_err(PipelineError::persistence)?;
            counts.push((collection, count.max(0) as u64));
        }
        Ok(counts)
    }

    #[cfg(test)]
    pub fn documents(&self, collection: &str) -> Result<Vec<Value>, PipelineError> {
        let mut statement = self
            .connection
            .prepare(
                "SELECT body FROM documents WHERE db_name = ?1 AND collection = ?2 ORDER BY id ASC",
            )
            .map_err(PipelineError::persistence)?;
        let rows = statement
            .query_map(params![self.database, collection], |row| row.get::<_, String>(0))
            .map_err(PipelineError::persistence)?;

        let mut documents = Vec::new();
        for row in rows {
            let body = row.map_err(PipelineError::persistence)?;
            documents.push(serde_json::from_str(&body).map_err(PipelineError::persistence)?);
        }
        Ok(documents)
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn insert_one(&mut self, collection: &str, document: &Value) -> Result<i64, PipelineError> {
        let body = serde_json::to_string(document).map_err(PipelineError::persistence)?;

        self.connection
            .execute(
                "
                INSERT INTO documents(db_name, collection, inserted_at, body)
                VALUES(?1, ?2, ?3, ?4)
                ",
                params![self.database, collection, now_utc_string(), body],
            )
            .map_err(PipelineError::persistence)?;

        Ok(self.connection.last_insert_rowid())
    }

    fn count(&self, collection: &str) -> Result<u64, PipelineError> {
        let count: i64 = self
            .connection
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE db_name = ?1 AND collection = ?2",
                params![self.database, collection],
                |row| row.get(0),
            )
            .map_err(PipelineError::persistence)?;

        Ok(count.max(0) as u64)
    }
}

fn configure_connection(connection: &Connection) -> Result<(), PipelineError> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .map_err(|err| {
            PipelineError::persistence(format!("failed to set journal_mode=WAL: {err}"))
        })?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .map_err(|err| {
            PipelineError::persistence(format!("failed to set synchronous=NORMAL: {err}"))
        })?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<(), PipelineError> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS documents (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              db_name TEXT NOT NULL,
              collection TEXT NOT NULL,
              inserted_at TEXT NOT NULL,
              body TEXT NOT NULL
            );
            ",
        )
        .map_err(|err| PipelineError::persistence(format!("failed to create schema: {err}")))
}

/// Stand-in for a store that could not be opened; every write fails.
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl DocumentStore for UnavailableStore {
    fn insert_one(&mut self, _collection: &str, _document: &Value) -> Result<i64, PipelineError> {
        Err(PipelineError::persistence(format!(
            "store unavailable: {}",
            self.reason
        )))
    }

    fn count(&self, _collection: &str) -> Result<u64, PipelineError> {
        Err(PipelineError::persistence(format!(
            "store unavailable: {}",
            self.reason
        )))
    }
}

pub fn open_store(config: &StoreConfig) -> Box<dyn DocumentStore> {
    let opened = config
        .db_path()
        .and_then(|path| SqliteDocumentStore::open(&path, &config.database));
    match opened {
        Ok(store) => Box::new(store),
        Err(err) => {
            warn!(uri = %config.uri, error = %err, "document store unavailable");
            Box::new(UnavailableStore::new(err.to_string()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Persisted { id: i64 },
    Failed { reason: String },
}

impl PersistOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted { .. })
    }
}

/// Single best-effort insert; failures are logged and reported, never raised.
pub fn persist_snapshot<T: Serialize>(
    store: &mut dyn DocumentStore,
    collection: &str,
    snapshot: &T,
) -> PersistOutcome {
    let outcome = serde_json::to_value(snapshot)
        .map_err(PipelineError::persistence)
        .and_then(|document| store.insert_one(collection, &document));

    match outcome {
        Ok(id) => {
            let total = store.count(collection).ok();
            info!(collection, id, total = ?total, "stored snapshot");
            PersistOutcome::Persisted { id }
        }
        Err(err) => {
            warn!(collection, error = %err, "snapshot not stored");
            PersistOutcome::Failed {
                reason: err.to_string(),
            }
        }
    }
}
