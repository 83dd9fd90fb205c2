use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug)]
pub enum StoreError {
    Backend(String),
    Serde(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(message) => write!(f, "store backend error: {message}"),
            Self::Serde(err) => write!(f, "stored value is not valid json: {err}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// String-keyed persisted storage, the only state boundary of the engine.
/// Object-safe so the API layer can hand the engine a boxed SQLite backend.
pub trait KvStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn put_raw(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    fn delete_raw(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<T: KvStore + ?Sized> KvStore for Box<T> {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get_raw(key)
    }

    fn put_raw(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        (**self).put_raw(key, value)
    }

    fn delete_raw(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).delete_raw(key)
    }
}

pub fn get_json<S: KvStore, T: DeserializeOwned>(
    store: &S,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get_raw(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn put_json<S: KvStore, T: Serialize>(
    store: &mut S,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    store.put_raw(key, serde_json::to_string(value)?)
}

/// In-memory backend used by tests and the demo path.
#[derive(Debug, Default, Clone)]
pub struct MemoryKvStore {
    entries: BTreeMap<String, String>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryKvStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put_raw(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn delete_raw(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Storage key derivation; one namespace per concern.
pub mod keys {
    use contracts::GoalPeriod;

    pub const LEADERBOARD: &str = "leaderboard";
    pub const TRANSACTIONS: &str = "transactions";

    pub fn balance(address: &str) -> String {
        format!("balance:{address}")
    }

    pub fn tickets(address: &str) -> String {
        format!("tickets:{address}")
    }

    pub fn milestones(address: &str) -> String {
        format!("milestones:{address}")
    }

    pub fn goals(period: GoalPeriod, address: &str) -> String {
        format!("goals:{period}:{address}")
    }

    pub fn streak(address: &str) -> String {
        format!("streak:{address}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_key_reads_as_none() {
        let store = MemoryKvStore::new();
        let value: Option<u64> = get_json(&store, "missing").expect("read should succeed");
        assert!(value.is_none());
    }

    #[test]
    fn round_trips_json_values() {
        let mut store = MemoryKvStore::new();
        put_json(&mut store, "balance:0xA", &42_u64).expect("write");
        let value: Option<u64> = get_json(&store, "balance:0xA").expect("read");
        assert_eq!(value, Some(42));
    }

    #[test]
    fn malformed_stored_json_surfaces_as_serde_error() {
        let mut store = MemoryKvStore::new();
        store
            .put_raw("balance:0xA", "not-json".to_string())
            .expect("raw write");

        let result: Result<Option<u64>, StoreError> = get_json(&store, "balance:0xA");
        assert!(matches!(result, Err(StoreError::Serde(_))));
    }

    #[test]
    fn goal_keys_separate_periods() {
        use contracts::GoalPeriod;
        assert_ne!(
            keys::goals(GoalPeriod::Daily, "0xA"),
            keys::goals(GoalPeriod::Weekly, "0xA")
        );
    }
}
