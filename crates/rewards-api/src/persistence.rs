use std::fmt;
use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use rewards_core::{KvStore, StoreError};

#[derive(Debug)]
pub enum PersistenceError {
    Sqlite(rusqlite::Error),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Key-value backend over a single SQLite table. Every engine key lives in
/// `kv`; the engine owns the key layout and this store never inspects values.
#[derive(Debug)]
pub struct SqliteKvStore {
    conn: Connection,
}

impl SqliteKvStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.configure()?;
        store.migrate()?;
        Ok(store)
    }

    #[cfg(test)]
    fn open_in_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory()?;
        let mut store = Self { conn };
        store.configure()?;
        store.migrate()?;
        Ok(store)
    }

    fn configure(&mut self) -> Result<(), PersistenceError> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    }

    fn migrate(&mut self) -> Result<(), PersistenceError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;

        self.conn.execute(
            "INSERT OR IGNORE INTO schema_migrations(version, name, applied_at)
             VALUES(1, 'initial_v1', ?1)",
            params![Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }
}

impl KvStore for SqliteKvStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|err| StoreError::Backend(err.to_string()))
    }

    fn put_raw(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .map(|_| ())
            .map_err(|err| StoreError::Backend(err.to_string()))
    }

    fn delete_raw(&mut self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map(|_| ())
            .map_err(|err| StoreError::Backend(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use contracts::{CreditReason, RewardConfig};
    use rewards_core::{KvStore, RewardEngine};

    use super::SqliteKvStore;

    #[test]
    fn put_get_delete_roundtrip() {
        let mut store = SqliteKvStore::open_in_memory().expect("open");

        assert_eq!(store.get_raw("balance:0xA").expect("get"), None);
        store
            .put_raw("balance:0xA", "42".to_string())
            .expect("put");
        assert_eq!(
            store.get_raw("balance:0xA").expect("get"),
            Some("42".to_string())
        );

        store.put_raw("balance:0xA", "50".to_string()).expect("overwrite");
        assert_eq!(
            store.get_raw("balance:0xA").expect("get"),
            Some("50".to_string())
        );

        store.delete_raw("balance:0xA").expect("delete");
        assert_eq!(store.get_raw("balance:0xA").expect("get"), None);
    }

    #[test]
    fn migrate_is_idempotent() {
        let mut store = SqliteKvStore::open_in_memory().expect("open");
        store.migrate().expect("second migrate");
        store.migrate().expect("third migrate");
    }

    #[test]
    fn engine_state_survives_through_the_sqlite_backend() {
        let store = SqliteKvStore::open_in_memory().expect("open");
        let mut engine = RewardEngine::new(store, RewardConfig::default());
        let now = Utc
            .with_ymd_and_hms(2026, 1, 5, 8, 0, 0)
            .single()
            .expect("timestamp");

        engine
            .credit("0xA", 25, CreditReason::Manual, now)
            .expect("credit");

        assert_eq!(engine.balance("0xA").expect("balance"), 25);
        assert_eq!(engine.rank("0xA").expect("rank"), 1);
    }
}
