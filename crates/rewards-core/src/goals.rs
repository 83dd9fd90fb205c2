use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use contracts::{
    BonusState, CreditReason, GoalKind, GoalPeriod, GoalProgressOutcome, GoalRecord,
    GoalSetSnapshot, GoalTargets, RewardEventType, SCHEMA_VERSION_V1,
};
use serde_json::json;

use crate::store::{self, keys, KvStore};
use crate::{EngineError, RewardEngine};

fn period_key(period: GoalPeriod, day: NaiveDate) -> String {
    match period {
        GoalPeriod::Daily => day.to_string(),
        GoalPeriod::Weekly => day.week(Weekday::Mon).first_day().to_string(),
    }
}

fn target_for(targets: &GoalTargets, kind: GoalKind) -> u64 {
    match kind {
        GoalKind::Steps => targets.steps,
        GoalKind::ActiveMinutes => targets.active_minutes,
        GoalKind::Calories => targets.calories,
        GoalKind::Distance => targets.distance_meters,
        GoalKind::HeartPoints => targets.heart_points,
        GoalKind::Workouts => targets.workouts,
    }
}

fn fresh_set(period: GoalPeriod, key: String, targets: &GoalTargets) -> GoalSetSnapshot {
    let mut goals = BTreeMap::new();
    for kind in GoalKind::ALL {
        goals.insert(
            kind,
            GoalRecord {
                target: target_for(targets, kind),
                achieved: 0,
                completed: false,
            },
        );
    }

    GoalSetSnapshot {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        period,
        period_key: key,
        goals,
        bonus: BonusState::Incomplete,
    }
}

impl<S: KvStore> RewardEngine<S> {
    /// Current goal set for the address, rolling to a zeroed set whenever the
    /// stored period key no longer matches the calendar day / ISO week.
    pub fn goal_set(
        &mut self,
        address: &str,
        period: GoalPeriod,
        now: DateTime<Utc>,
    ) -> Result<GoalSetSnapshot, EngineError> {
        let key = keys::goals(period, address);
        let expected = period_key(period, now.date_naive());

        let stored: Option<GoalSetSnapshot> = store::get_json(&self.store, &key)?;
        match stored {
            Some(set) if set.period_key == expected => Ok(set),
            stale => {
                let targets = match period {
                    GoalPeriod::Daily => self.config().daily_goals.clone(),
                    GoalPeriod::Weekly => self.config().weekly_goals.clone(),
                };
                let fresh = fresh_set(period, expected.clone(), &targets);
                store::put_json(&mut self.store, &key, &fresh)?;

                if stale.is_some() {
                    self.push_event(
                        RewardEventType::GoalSetReset,
                        address,
                        None,
                        None,
                        Some(json!({ "period": period, "period_key": expected })),
                        now,
                    );
                }

                Ok(fresh)
            }
        }
    }

    /// Records an achieved value for one goal. `completed` flips true when the
    /// target is reached and never reverts within the period. Completing the
    /// last open goal dispatches the set bonus exactly once: the bonus state
    /// machine only moves Incomplete -> CompletedUnclaimed -> CompletedClaimed.
    pub fn record_goal_progress(
        &mut self,
        address: &str,
        period: GoalPeriod,
        kind: GoalKind,
        achieved: u64,
        now: DateTime<Utc>,
    ) -> Result<GoalProgressOutcome, EngineError> {
        let mut set = self.goal_set(address, period, now)?;

        if let Some(record) = set.goals.get_mut(&kind) {
            record.achieved = achieved;
            if !record.completed && achieved >= record.target {
                record.completed = true;
            }
        }

        let all_completed = set.all_completed();
        let mut tokens_credited = 0;
        let mut tickets_awarded = 0;
        let mut bonus_awarded = false;

        if all_completed && set.bonus == BonusState::Incomplete {
            set.bonus = BonusState::CompletedUnclaimed;

            let bonus_tokens = self.config().goal_bonus_tokens;
            let bonus_tickets = self.config().goal_bonus_tickets;
            self.credit(address, bonus_tokens, CreditReason::GoalBonus, now)?;
            if bonus_tickets > 0 {
                self.award_tickets(address, bonus_tickets, now)?;
            }

            set.bonus = BonusState::CompletedClaimed;
            tokens_credited = bonus_tokens;
            tickets_awarded = bonus_tickets;
            bonus_awarded = true;

            self.push_event(
                RewardEventType::GoalBonusAwarded,
                address,
                Some(bonus_tokens),
                Some(CreditReason::GoalBonus),
                Some(json!({ "period": period })),
                now,
            );
        }

        store::put_json(&mut self.store, &keys::goals(period, address), &set)?;

        Ok(GoalProgressOutcome {
            set,
            all_completed,
            bonus_awarded,
            tokens_credited,
            tickets_awarded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, engine};

    fn complete_all_but_calories(
        engine: &mut crate::RewardEngine<crate::MemoryKvStore>,
        now: DateTime<Utc>,
    ) {
        let updates = [
            (GoalKind::Steps, 10_000),
            (GoalKind::ActiveMinutes, 30),
            (GoalKind::Distance, 8_000),
            (GoalKind::HeartPoints, 30),
            (GoalKind::Workouts, 1),
            (GoalKind::Calories, 1_800),
        ];
        for (kind, achieved) in updates {
            engine
                .record_goal_progress("0xA", GoalPeriod::Daily, kind, achieved, now)
                .expect("progress");
        }
    }

    #[test]
    fn bonus_fires_exactly_once_when_last_goal_completes() {
        let mut engine = engine();
        let now = at(2026, 1, 5, 8);

        complete_all_but_calories(&mut engine, now);
        let partial = engine
            .record_goal_progress("0xA", GoalPeriod::Daily, GoalKind::Calories, 1_900, now)
            .expect("still short");
        assert!(!partial.all_completed);
        assert!(!partial.bonus_awarded);

        let done = engine
            .record_goal_progress("0xA", GoalPeriod::Daily, GoalKind::Calories, 2_000, now)
            .expect("calories complete");
        assert!(done.all_completed);
        assert!(done.bonus_awarded);
        assert_eq!(done.set.bonus, BonusState::CompletedClaimed);

        // Re-reporting while everything stays complete must not refire.
        let replay = engine
            .record_goal_progress("0xA", GoalPeriod::Daily, GoalKind::Calories, 2_100, now)
            .expect("replay");
        assert!(replay.all_completed);
        assert!(!replay.bonus_awarded);
        assert_eq!(replay.tokens_credited, 0);

        assert_eq!(engine.balance("0xA").expect("balance"), 50);
        assert_eq!(engine.tickets("0xA").expect("tickets"), 1);
    }

    #[test]
    fn completed_flag_never_reverts_within_the_period() {
        let mut engine = engine();
        let now = at(2026, 1, 5, 8);

        engine
            .record_goal_progress("0xA", GoalPeriod::Daily, GoalKind::Steps, 10_000, now)
            .expect("complete steps");
        let regressed = engine
            .record_goal_progress("0xA", GoalPeriod::Daily, GoalKind::Steps, 9_000, now)
            .expect("regressed report");

        let steps = &regressed.set.goals[&GoalKind::Steps];
        assert_eq!(steps.achieved, 9_000);
        assert!(steps.completed);
    }

    #[test]
    fn daily_set_rolls_to_a_zeroed_shape_on_date_change() {
        let mut engine = engine();

        engine
            .record_goal_progress(
                "0xA",
                GoalPeriod::Daily,
                GoalKind::Steps,
                10_000,
                at(2026, 1, 5, 8),
            )
            .expect("monday progress");

        let tuesday = engine
            .goal_set("0xA", GoalPeriod::Daily, at(2026, 1, 6, 8))
            .expect("tuesday set");
        assert_eq!(tuesday.period_key, "2026-01-06");
        assert_eq!(tuesday.goals[&GoalKind::Steps].achieved, 0);
        assert!(!tuesday.goals[&GoalKind::Steps].completed);
        assert_eq!(tuesday.bonus, BonusState::Incomplete);
    }

    #[test]
    fn weekly_set_is_keyed_by_iso_week_monday() {
        let mut engine = engine();

        // 2026-01-06 is a Tuesday; 2026-01-09 a Friday of the same ISO week.
        engine
            .record_goal_progress(
                "0xA",
                GoalPeriod::Weekly,
                GoalKind::Workouts,
                3,
                at(2026, 1, 6, 8),
            )
            .expect("tuesday progress");

        let same_week = engine
            .goal_set("0xA", GoalPeriod::Weekly, at(2026, 1, 9, 8))
            .expect("friday set");
        assert_eq!(same_week.period_key, "2026-01-05");
        assert_eq!(same_week.goals[&GoalKind::Workouts].achieved, 3);

        let next_week = engine
            .goal_set("0xA", GoalPeriod::Weekly, at(2026, 1, 12, 8))
            .expect("next monday set");
        assert_eq!(next_week.period_key, "2026-01-12");
        assert_eq!(next_week.goals[&GoalKind::Workouts].achieved, 0);
    }
}
