//! v1 cross-boundary contracts shared by the reward engine, API, and CLI.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod serde_u64_string;

pub const SCHEMA_VERSION_V1: &str = "1.0";

/// Fixed step thresholds that grant a one-time milestone reward per day.
pub const FIXED_STEP_MILESTONES: [u64; 8] = [1000, 2500, 5000, 7500, 10000, 12500, 15000, 20000];

/// Percentages of the daily step goal that grant a one-time milestone reward per day.
pub const PERCENTAGE_MILESTONES: [u8; 4] = [25, 50, 75, 100];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoalTargets {
    pub steps: u64,
    pub active_minutes: u64,
    pub calories: u64,
    pub distance_meters: u64,
    pub heart_points: u64,
    pub workouts: u64,
}

impl GoalTargets {
    pub fn daily() -> Self {
        Self {
            steps: 10_000,
            active_minutes: 30,
            calories: 2_000,
            distance_meters: 8_000,
            heart_points: 30,
            workouts: 1,
        }
    }

    pub fn weekly() -> Self {
        Self {
            steps: 70_000,
            active_minutes: 150,
            calories: 14_000,
            distance_meters: 40_000,
            heart_points: 150,
            workouts: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RewardConfig {
    pub schema_version: String,
    pub daily_step_goal: u64,
    pub fixed_step_milestones: Vec<u64>,
    pub percentage_milestones: Vec<u8>,
    /// Tokens credited per newly reached milestone threshold.
    pub milestone_reward: u64,
    /// Cumulative step interval per ticket.
    pub ticket_step_interval: u64,
    /// Tokens credited per awarded ticket.
    pub ticket_reward: u64,
    pub goal_bonus_tokens: u64,
    pub goal_bonus_tickets: u64,
    /// Simulated network latency applied by the API layer before a tip commits.
    pub tip_latency_ms: u64,
    pub daily_goals: GoalTargets,
    pub weekly_goals: GoalTargets,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            daily_step_goal: 10_000,
            fixed_step_milestones: FIXED_STEP_MILESTONES.to_vec(),
            percentage_milestones: PERCENTAGE_MILESTONES.to_vec(),
            milestone_reward: 10,
            ticket_step_interval: 2_000,
            ticket_reward: 10,
            goal_bonus_tokens: 50,
            goal_bonus_tickets: 1,
            tip_latency_ms: 1_500,
            daily_goals: GoalTargets::daily(),
            weekly_goals: GoalTargets::weekly(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CreditReason {
    Milestone,
    Ticket,
    TipReceived,
    GoalBonus,
    Manual,
}

impl fmt::Display for CreditReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Milestone => "milestone",
            Self::Ticket => "ticket",
            Self::TipReceived => "tip_received",
            Self::GoalBonus => "goal_bonus",
            Self::Manual => "manual",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub address: String,
    #[serde(with = "serde_u64_string")]
    pub tokens: u64,
    #[serde(with = "serde_u64_string")]
    pub total_steps: u64,
    pub milestones_achieved: u32,
    pub last_active: String,
    /// 1-based; recomputed after every ledger write.
    pub rank: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TipKind {
    Tip,
    SessionPayment,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TipStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TipTransaction {
    pub id: String,
    pub from_address: String,
    pub to_address: String,
    #[serde(with = "serde_u64_string")]
    pub amount: u64,
    pub kind: TipKind,
    pub note: Option<String>,
    pub status: TipStatus,
    pub created_at: String,
    /// Present only on completed transfers.
    pub tx_hash: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    Steps,
    ActiveMinutes,
    Calories,
    Distance,
    HeartPoints,
    Workouts,
}

impl GoalKind {
    pub const ALL: [GoalKind; 6] = [
        GoalKind::Steps,
        GoalKind::ActiveMinutes,
        GoalKind::Calories,
        GoalKind::Distance,
        GoalKind::HeartPoints,
        GoalKind::Workouts,
    ];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoalPeriod {
    Daily,
    Weekly,
}

impl fmt::Display for GoalPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoalRecord {
    pub target: u64,
    pub achieved: u64,
    pub completed: bool,
}

/// Bonus lifecycle for a goal set. The only legal transitions are
/// `Incomplete -> CompletedUnclaimed` (all goals completed) and
/// `CompletedUnclaimed -> CompletedClaimed` (bonus dispatched).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BonusState {
    Incomplete,
    CompletedUnclaimed,
    CompletedClaimed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoalSetSnapshot {
    pub schema_version: String,
    pub period: GoalPeriod,
    /// Calendar day for daily sets, ISO-week Monday for weekly sets.
    pub period_key: String,
    pub goals: BTreeMap<GoalKind, GoalRecord>,
    pub bonus: BonusState,
}

impl GoalSetSnapshot {
    pub fn all_completed(&self) -> bool {
        !self.goals.is_empty() && self.goals.values().all(|goal| goal.completed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoalProgressOutcome {
    pub set: GoalSetSnapshot,
    pub all_completed: bool,
    pub bonus_awarded: bool,
    #[serde(with = "serde_u64_string")]
    pub tokens_credited: u64,
    pub tickets_awarded: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreakSnapshot {
    pub current: u32,
    pub longest: u32,
    pub last_active_day: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepEvaluation {
    pub schema_version: String,
    pub address: String,
    #[serde(with = "serde_u64_string")]
    pub total_steps: u64,
    /// Threshold keys newly achieved by this report, e.g. `steps_5000`, `percentage_75`.
    pub new_milestones: Vec<String>,
    pub new_tickets: u64,
    #[serde(with = "serde_u64_string")]
    pub tokens_credited: u64,
    #[serde(with = "serde_u64_string")]
    pub ticket_watermark: u64,
    pub streak: StreakSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletSummary {
    pub schema_version: String,
    pub address: String,
    #[serde(with = "serde_u64_string")]
    pub tokens: u64,
    pub tickets: u64,
    pub rank: u32,
    pub streak: Option<StreakSnapshot>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RewardEventType {
    TokensCredited,
    TokensDebited,
    MilestoneReached,
    TicketAwarded,
    TipCompleted,
    TipFailed,
    GoalBonusAwarded,
    GoalSetReset,
    StreakAdvanced,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RewardEvent {
    pub schema_version: String,
    pub event_id: String,
    pub sequence: u64,
    pub event_type: RewardEventType,
    pub address: String,
    pub amount: Option<u64>,
    pub reason: Option<CreditReason>,
    pub created_at: String,
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    InvalidAmount,
    WalletNotFound,
    InsufficientBalance,
    ProviderNotConfigured,
    ProviderUnavailable,
    InternalError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub schema_version: String,
    pub error_code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            error_code,
            message: message.into(),
            details,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Steps,
    Calories,
    DistanceMeters,
    ActiveMinutes,
    HeartPoints,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderStatus {
    pub schema_version: String,
    pub configured: bool,
    pub demo_mode: bool,
    pub authorize_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenExchangeRequest {
    pub code: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenExchangeResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AggregateTotal {
    pub metric: MetricKind,
    /// Floored sum of all integer and floating-point values in the window.
    #[serde(with = "serde_u64_string")]
    pub total: u64,
    pub bucket_count: usize,
    pub demo: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_config_default_matches_documented_thresholds() {
        let config = RewardConfig::default();
        assert_eq!(config.fixed_step_milestones, FIXED_STEP_MILESTONES.to_vec());
        assert_eq!(config.percentage_milestones, vec![25, 50, 75, 100]);
        assert_eq!(config.ticket_step_interval, 2_000);
        assert_eq!(config.milestone_reward, 10);
    }

    #[test]
    fn leaderboard_entry_serializes_amounts_as_strings() {
        let entry = LeaderboardEntry {
            address: "0xA".to_string(),
            tokens: 40,
            total_steps: 8_000,
            milestones_achieved: 2,
            last_active: "2026-01-05T08:00:00+00:00".to_string(),
            rank: 1,
        };

        let raw = serde_json::to_value(&entry).expect("serialize entry");
        assert_eq!(raw["tokens"], serde_json::json!("40"));
        assert_eq!(raw["total_steps"], serde_json::json!("8000"));

        let decoded: LeaderboardEntry = serde_json::from_value(raw).expect("deserialize entry");
        assert_eq!(decoded, entry);
    }

    #[test]
    fn credit_reason_uses_snake_case_wire_names() {
        let raw = serde_json::to_string(&CreditReason::TipReceived).expect("serialize reason");
        assert_eq!(raw, "\"tip_received\"");
    }

    #[test]
    fn empty_goal_set_is_not_all_completed() {
        let set = GoalSetSnapshot {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            period: GoalPeriod::Daily,
            period_key: "2026-01-05".to_string(),
            goals: BTreeMap::new(),
            bonus: BonusState::Incomplete,
        };
        assert!(!set.all_completed());
    }
}
