//! HTTP facade over the reward engine: SQLite-backed wallet state, tip and
//! goal surfaces, a fitness-provider OAuth proxy, and a WebSocket event feed.

mod persistence;
mod provider;
mod server;

use std::path::Path;

use chrono::Utc;
use contracts::{
    CreditReason, GoalKind, GoalPeriod, GoalProgressOutcome, GoalSetSnapshot, LeaderboardEntry,
    RewardConfig, RewardEvent, StepEvaluation, TipKind, TipTransaction, WalletSummary,
    SCHEMA_VERSION_V1,
};
use rewards_core::{EngineError, KvStore, MemoryKvStore, RewardEngine};

pub use persistence::{PersistenceError, SqliteKvStore};
pub use provider::{ProviderClient, ProviderConfig, ProviderError};
pub use server::{serve, ServerError};

pub type BoxedStore = Box<dyn KvStore + Send>;

/// Single-writer facade the server and CLI share. Owns the clock: every
/// mutating call stamps `Utc::now()` so the engine itself stays deterministic.
pub struct RewardsApi {
    engine: RewardEngine<BoxedStore>,
}

impl RewardsApi {
    pub fn in_memory(config: RewardConfig) -> Self {
        Self {
            engine: RewardEngine::new(Box::new(MemoryKvStore::new()), config),
        }
    }

    pub fn open_sqlite(
        path: impl AsRef<Path>,
        config: RewardConfig,
    ) -> Result<Self, PersistenceError> {
        let store = SqliteKvStore::open(path)?;
        Ok(Self {
            engine: RewardEngine::new(Box::new(store), config),
        })
    }

    pub fn config(&self) -> &RewardConfig {
        self.engine.config()
    }

    pub fn events(&self) -> &[RewardEvent] {
        self.engine.events()
    }

    pub fn wallet_summary(&self, address: &str) -> Result<WalletSummary, EngineError> {
        Ok(WalletSummary {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            address: address.to_string(),
            tokens: self.engine.balance(address)?,
            tickets: self.engine.tickets(address)?,
            rank: self.engine.rank(address)?,
            streak: self.engine.streak(address)?,
        })
    }

    pub fn credit(
        &mut self,
        address: &str,
        amount: u64,
        reason: CreditReason,
    ) -> Result<WalletSummary, EngineError> {
        self.engine.credit(address, amount, reason, Utc::now())?;
        self.wallet_summary(address)
    }

    pub fn record_steps(
        &mut self,
        address: &str,
        total_steps: u64,
    ) -> Result<StepEvaluation, EngineError> {
        self.engine.record_steps(address, total_steps, Utc::now())
    }

    pub fn send_tip(
        &mut self,
        from: &str,
        to: &str,
        amount: u64,
        kind: TipKind,
        note: Option<String>,
    ) -> Result<TipTransaction, EngineError> {
        self.engine.send_tip(from, to, amount, kind, note, Utc::now())
    }

    pub fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, EngineError> {
        self.engine.leaderboard()
    }

    pub fn goal_set(
        &mut self,
        address: &str,
        period: GoalPeriod,
    ) -> Result<GoalSetSnapshot, EngineError> {
        self.engine.goal_set(address, period, Utc::now())
    }

    pub fn record_goal_progress(
        &mut self,
        address: &str,
        period: GoalPeriod,
        kind: GoalKind,
        achieved: u64,
    ) -> Result<GoalProgressOutcome, EngineError> {
        self.engine
            .record_goal_progress(address, period, kind, achieved, Utc::now())
    }

    pub fn transactions(&self) -> Result<Vec<TipTransaction>, EngineError> {
        self.engine.transactions()
    }

    pub fn transaction_history(&self, address: &str) -> Result<Vec<TipTransaction>, EngineError> {
        self.engine.transaction_history(address)
    }

    pub fn trainer_earnings(&self, address: &str) -> Result<u64, EngineError> {
        self.engine.trainer_earnings(address)
    }
}
