//! Deterministic reward engine: token ledger, milestone evaluator, tip
//! payments, goal tracker, and streaks over an injected key-value store.
//!
//! The engine performs no I/O of its own and takes `now` as a parameter on
//! every mutating operation, so callers own both the clock and the storage
//! backend.

use std::fmt;

use chrono::{DateTime, Utc};
use contracts::{CreditReason, RewardConfig, RewardEvent, RewardEventType, SCHEMA_VERSION_V1};
use serde_json::Value;

pub mod goals;
pub mod ledger;
pub mod milestones;
pub mod payments;
pub mod store;
pub mod streaks;

pub use store::{KvStore, MemoryKvStore, StoreError};

#[derive(Debug)]
pub enum EngineError {
    Store(StoreError),
    InsufficientBalance {
        address: String,
        balance: u64,
        requested: u64,
    },
    InvalidAmount(u64),
    SelfTransfer(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(err) => write!(f, "store error: {err}"),
            Self::InsufficientBalance {
                address,
                balance,
                requested,
            } => write!(
                f,
                "insufficient balance for {address}: have {balance}, need {requested}"
            ),
            Self::InvalidAmount(amount) => write!(f, "invalid amount: {amount}"),
            Self::SelfTransfer(address) => {
                write!(f, "cannot transfer from {address} to itself")
            }
        }
    }
}

impl std::error::Error for EngineError {}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

#[derive(Debug)]
pub struct RewardEngine<S: KvStore> {
    store: S,
    config: RewardConfig,
    event_log: Vec<RewardEvent>,
    next_sequence: u64,
}

impl<S: KvStore> RewardEngine<S> {
    pub fn new(store: S, config: RewardConfig) -> Self {
        Self {
            store,
            config,
            event_log: Vec::new(),
            next_sequence: 0,
        }
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    pub fn events(&self) -> &[RewardEvent] {
        &self.event_log
    }

    pub(crate) fn push_event(
        &mut self,
        event_type: RewardEventType,
        address: &str,
        amount: Option<u64>,
        reason: Option<CreditReason>,
        details: Option<Value>,
        now: DateTime<Utc>,
    ) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.event_log.push(RewardEvent {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            event_id: format!("evt:{sequence}"),
            sequence,
            event_type,
            address: address.to_string(),
            amount,
            reason,
            created_at: now.to_rfc3339(),
            details,
        });
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, TimeZone, Utc};
    use contracts::RewardConfig;

    use crate::{MemoryKvStore, RewardEngine};

    pub fn engine() -> RewardEngine<MemoryKvStore> {
        RewardEngine::new(MemoryKvStore::new(), RewardConfig::default())
    }

    pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
            .single()
            .expect("valid test timestamp")
    }
}
