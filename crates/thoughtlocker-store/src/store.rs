use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rusqlite::Connection;
use thoughtlocker::{PromptSpec, SearchQuery, UpsertOutcome, VersionRow};

use crate::transaction::in_transaction;
use crate::{LoadReport, StoreError, loader, repository, schema};

/// A SQLite-backed prompt spec store.
///
/// Owns a single connection for its whole lifetime. The connection is
/// released by [`Locker::close`] or when the locker is dropped, whichever
/// comes first. Every call after `close` fails with [`StoreError::Closed`].
pub struct Locker {
    conn: Mutex<Option<Connection>>,
}

impl Locker {
    /// Open a store backed by a file on disk.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        tracing::debug!(path = %path.display(), "opening prompt store");
        Self::bootstrap(Connection::open(path)?)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(mut conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(Duration::from_secs(5))?;
        schema::migrations()
            .to_latest(&mut conn)
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Release the connection. Safe to call more than once; a failure to
    /// close is logged and otherwise ignored.
    pub fn close(&self) {
        let Some(conn) = self.lock().take() else {
            return;
        };

        if let Err((_, e)) = conn.close() {
            tracing::warn!(error = %e, "error closing prompt store connection");
        }
    }

    /// Fetch by name or alias, failing with [`StoreError::NotFound`].
    pub fn get(&self, name_or_alias: &str) -> Result<PromptSpec, StoreError> {
        self.try_get(name_or_alias)?
            .ok_or_else(|| StoreError::NotFound(name_or_alias.to_owned()))
    }

    /// Fetch by name or alias, returning `None` when nothing matches.
    pub fn try_get(&self, name_or_alias: &str) -> Result<Option<PromptSpec>, StoreError> {
        self.with_conn(|conn| repository::get_by_name_or_alias(conn, name_or_alias))
    }

    pub fn get_system_instruction(&self, name_or_alias: &str) -> Result<String, StoreError> {
        Ok(self.get(name_or_alias)?.system_instruction)
    }

    pub fn list(&self, enabled: Option<bool>) -> Result<Vec<PromptSpec>, StoreError> {
        self.with_conn(|conn| repository::list(conn, enabled))
    }

    pub fn search(&self, query: &SearchQuery) -> Result<Vec<PromptSpec>, StoreError> {
        self.with_conn(|conn| repository::search(conn, query))
    }

    pub fn history(&self, name: &str) -> Result<Vec<VersionRow>, StoreError> {
        self.with_conn(|conn| repository::history(conn, name))
    }

    /// Insert or update a single spec in its own transaction.
    pub fn upsert(&self, spec: &PromptSpec) -> Result<UpsertOutcome, StoreError> {
        self.with_conn(|conn| in_transaction(conn, |tx| repository::upsert(tx, spec)))
    }

    /// Load a YAML file of specs, skipping unchanged ones.
    ///
    /// The file is fully parsed and validated before any write happens.
    pub fn seed_from_yaml(&self, path: &Path) -> Result<LoadReport, StoreError> {
        let specs = thoughtlocker::read_specs(path)?;
        self.apply(&specs)
    }

    /// Like [`Locker::seed_from_yaml`] for YAML already in memory.
    pub fn seed_from_str(&self, yaml: &str) -> Result<LoadReport, StoreError> {
        let specs = thoughtlocker::parse_specs(yaml)?;
        self.apply(&specs)
    }

    /// Apply already-built specs as one batch.
    pub fn apply(&self, specs: &[PromptSpec]) -> Result<LoadReport, StoreError> {
        let report = self.with_conn(|conn| loader::apply_specs(conn, specs))?;
        tracing::info!(
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            "load complete"
        );
        Ok(report)
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.lock();
        let conn = guard.as_mut().ok_or(StoreError::Closed)?;
        f(conn)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
