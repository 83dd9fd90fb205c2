use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use contracts::{CreditReason, RewardEventType, StepEvaluation, SCHEMA_VERSION_V1};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::store::{self, keys, KvStore};
use crate::{EngineError, RewardEngine};

/// Per-address, per-day threshold state. Rolls over whenever the stored day
/// no longer matches the reporting day.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DailyMilestoneState {
    day: String,
    achieved: BTreeSet<String>,
    ticket_watermark: u64,
}

impl DailyMilestoneState {
    fn fresh(day: String) -> Self {
        Self {
            day,
            achieved: BTreeSet::new(),
            ticket_watermark: 0,
        }
    }
}

impl<S: KvStore> RewardEngine<S> {
    /// Evaluates a cumulative daily step count against fixed, percentage, and
    /// ticket thresholds. Each threshold pays out at most once per day, and
    /// re-reporting an unchanged count awards nothing.
    pub fn record_steps(
        &mut self,
        address: &str,
        total_steps: u64,
        now: DateTime<Utc>,
    ) -> Result<StepEvaluation, EngineError> {
        let today = now.date_naive();
        let today_key = today.to_string();

        let key = keys::milestones(address);
        let mut state: DailyMilestoneState = store::get_json(&self.store, &key)?
            .filter(|stored: &DailyMilestoneState| stored.day == today_key)
            .unwrap_or_else(|| DailyMilestoneState::fresh(today_key.clone()));

        let mut new_milestones = Vec::new();
        let mut tokens_credited = 0_u64;

        // Fixed and percentage categories evaluate independently; one report
        // can cross several thresholds and each credits separately.
        let mut thresholds: Vec<(String, u64)> = self
            .config()
            .fixed_step_milestones
            .iter()
            .map(|steps| (format!("steps_{steps}"), *steps))
            .collect();
        for percent in &self.config().percentage_milestones {
            let value = self.config().daily_step_goal * u64::from(*percent) / 100;
            thresholds.push((format!("percentage_{percent}"), value));
        }

        for (threshold_key, value) in thresholds {
            if total_steps >= value && state.achieved.insert(threshold_key.clone()) {
                self.push_event(
                    RewardEventType::MilestoneReached,
                    address,
                    None,
                    None,
                    Some(json!({ "threshold": threshold_key, "steps": value })),
                    now,
                );
                let reward = self.config().milestone_reward;
                self.credit(address, reward, CreditReason::Milestone, now)?;
                tokens_credited += reward;
                new_milestones.push(threshold_key);
            }
        }

        let interval = self.config().ticket_step_interval.max(1);
        let aligned = total_steps / interval * interval;
        let mut new_tickets = 0_u64;
        if aligned > state.ticket_watermark {
            new_tickets = (aligned - state.ticket_watermark) / interval;
            let reward = self.config().ticket_reward * new_tickets;
            self.credit(address, reward, CreditReason::Ticket, now)?;
            self.award_tickets(address, new_tickets, now)?;
            tokens_credited += reward;
            state.ticket_watermark = aligned;
        }

        store::put_json(&mut self.store, &key, &state)?;

        let streak = self.update_streak(address, today, now)?;
        self.update_leaderboard(address, now, |entry| {
            entry.total_steps = total_steps;
        })?;

        Ok(StepEvaluation {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            address: address.to_string(),
            total_steps,
            new_milestones,
            new_tickets,
            tokens_credited,
            ticket_watermark: state.ticket_watermark,
            streak,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{at, engine};

    #[test]
    fn ticket_watermark_scenario() {
        let mut engine = engine();
        let now = at(2026, 1, 5, 8);

        let first = engine.record_steps("0xA", 2_000, now).expect("report 2000");
        assert_eq!(first.new_tickets, 1);
        assert_eq!(first.ticket_watermark, 2_000);

        let repeat = engine.record_steps("0xA", 2_000, now).expect("repeat");
        assert_eq!(repeat.new_tickets, 0);

        let second = engine.record_steps("0xA", 4_000, now).expect("report 4000");
        assert_eq!(second.new_tickets, 1);
        assert_eq!(second.ticket_watermark, 4_000);

        assert_eq!(engine.tickets("0xA").expect("tickets"), 2);
    }

    #[test]
    fn unchanged_count_is_idempotent_across_all_categories() {
        let mut engine = engine();
        let now = at(2026, 1, 5, 8);

        let first = engine.record_steps("0xA", 7_500, now).expect("report");
        assert!(first.tokens_credited > 0);

        let replay = engine.record_steps("0xA", 7_500, now).expect("replay");
        assert!(replay.new_milestones.is_empty());
        assert_eq!(replay.new_tickets, 0);
        assert_eq!(replay.tokens_credited, 0);
    }

    #[test]
    fn single_report_crosses_every_category() {
        let mut engine = engine();
        let now = at(2026, 1, 5, 8);

        let report = engine.record_steps("0xA", 7_500, now).expect("report");

        // Fixed: 1000/2500/5000/7500. Percentage of 10000: 25/50/75.
        assert_eq!(report.new_milestones.len(), 7);
        assert!(report
            .new_milestones
            .iter()
            .any(|key| key == "percentage_75"));
        assert_eq!(report.new_tickets, 3);
        assert_eq!(report.tokens_credited, 7 * 10 + 3 * 10);
    }

    #[test]
    fn thresholds_reset_on_a_new_day() {
        let mut engine = engine();

        let monday = at(2026, 1, 5, 8);
        let first = engine.record_steps("0xA", 5_000, monday).expect("monday");
        assert!(!first.new_milestones.is_empty());

        let tuesday = at(2026, 1, 6, 8);
        let second = engine.record_steps("0xA", 5_000, tuesday).expect("tuesday");
        assert_eq!(second.new_milestones, first.new_milestones);
        assert_eq!(second.new_tickets, first.new_tickets);
    }

    #[test]
    fn leaderboard_carries_cumulative_steps() {
        let mut engine = engine();
        let now = at(2026, 1, 5, 8);

        engine.record_steps("0xA", 3_200, now).expect("report");

        let entries = engine.leaderboard().expect("leaderboard");
        let entry = entries
            .iter()
            .find(|entry| entry.address == "0xA")
            .expect("entry present");
        assert_eq!(entry.total_steps, 3_200);
    }
}
