use chrono::{DateTime, Utc};
use contracts::{CreditReason, LeaderboardEntry, RewardEventType};
use serde_json::json;

use crate::store::{self, keys, KvStore};
use crate::{EngineError, RewardEngine};

impl<S: KvStore> RewardEngine<S> {
    /// Stored token balance, defaulting to zero for unseen addresses.
    pub fn balance(&self, address: &str) -> Result<u64, EngineError> {
        Ok(store::get_json(&self.store, &keys::balance(address))?.unwrap_or(0))
    }

    pub fn tickets(&self, address: &str) -> Result<u64, EngineError> {
        Ok(store::get_json(&self.store, &keys::tickets(address))?.unwrap_or(0))
    }

    /// Adds tokens and refreshes the leaderboard. `milestones_achieved` counts
    /// only credits with an explicit milestone reason; the amount carries no
    /// meaning beyond its value.
    pub fn credit(
        &mut self,
        address: &str,
        amount: u64,
        reason: CreditReason,
        now: DateTime<Utc>,
    ) -> Result<u64, EngineError> {
        let new_balance = self.balance(address)?.saturating_add(amount);
        store::put_json(&mut self.store, &keys::balance(address), &new_balance)?;

        self.update_leaderboard(address, now, |entry| {
            entry.tokens = entry.tokens.saturating_add(amount);
            if reason == CreditReason::Milestone {
                entry.milestones_achieved += 1;
            }
        })?;

        self.push_event(
            RewardEventType::TokensCredited,
            address,
            Some(amount),
            Some(reason),
            None,
            now,
        );

        Ok(new_balance)
    }

    /// Removes tokens, failing before any mutation when the balance is short.
    /// All debits go through here; nothing writes balances around the ledger.
    pub fn debit(
        &mut self,
        address: &str,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<u64, EngineError> {
        let balance = self.balance(address)?;
        if balance < amount {
            return Err(EngineError::InsufficientBalance {
                address: address.to_string(),
                balance,
                requested: amount,
            });
        }

        let new_balance = balance - amount;
        store::put_json(&mut self.store, &keys::balance(address), &new_balance)?;

        self.update_leaderboard(address, now, |entry| {
            entry.tokens = entry.tokens.saturating_sub(amount);
        })?;

        self.push_event(
            RewardEventType::TokensDebited,
            address,
            Some(amount),
            None,
            None,
            now,
        );

        Ok(new_balance)
    }

    /// Increments the redeemable ticket count. Token credit for tickets is the
    /// caller's responsibility; tickets themselves are consumed elsewhere.
    pub fn award_tickets(
        &mut self,
        address: &str,
        count: u64,
        now: DateTime<Utc>,
    ) -> Result<u64, EngineError> {
        let total = self.tickets(address)?.saturating_add(count);
        store::put_json(&mut self.store, &keys::tickets(address), &total)?;

        self.push_event(
            RewardEventType::TicketAwarded,
            address,
            None,
            None,
            Some(json!({ "count": count, "total": total })),
            now,
        );

        Ok(total)
    }

    pub fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, EngineError> {
        Ok(store::get_json(&self.store, keys::LEADERBOARD)?.unwrap_or_default())
    }

    /// 1-based rank; 0 means unranked (address has never touched the ledger).
    pub fn rank(&self, address: &str) -> Result<u32, EngineError> {
        let entries = self.leaderboard()?;
        Ok(entries
            .iter()
            .find(|entry| entry.address == address)
            .map(|entry| entry.rank)
            .unwrap_or(0))
    }

    /// Find-or-create the entry, apply the mutation, then re-sort descending
    /// by tokens (stable, so ties keep insertion order) and re-rank. A full
    /// re-sort per write is fine at leaderboard scale.
    pub(crate) fn update_leaderboard(
        &mut self,
        address: &str,
        now: DateTime<Utc>,
        mutate: impl FnOnce(&mut LeaderboardEntry),
    ) -> Result<(), EngineError> {
        let mut entries = self.leaderboard()?;

        let index = match entries.iter().position(|entry| entry.address == address) {
            Some(index) => index,
            None => {
                entries.push(LeaderboardEntry {
                    address: address.to_string(),
                    tokens: 0,
                    total_steps: 0,
                    milestones_achieved: 0,
                    last_active: now.to_rfc3339(),
                    rank: 0,
                });
                entries.len() - 1
            }
        };

        mutate(&mut entries[index]);
        entries[index].last_active = now.to_rfc3339();

        entries.sort_by(|a, b| b.tokens.cmp(&a.tokens));
        for (position, entry) in entries.iter_mut().enumerate() {
            entry.rank = (position + 1) as u32;
        }

        store::put_json(&mut self.store, keys::LEADERBOARD, &entries)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, engine};

    #[test]
    fn balance_equals_sum_of_credits() {
        let mut engine = engine();
        let now = at(2026, 1, 5, 8);

        for amount in [10, 0, 25, 5] {
            engine
                .credit("0xA", amount, CreditReason::Manual, now)
                .expect("credit");
        }

        assert_eq!(engine.balance("0xA").expect("balance"), 40);
    }

    #[test]
    fn debit_fails_fast_without_mutation() {
        let mut engine = engine();
        let now = at(2026, 1, 5, 8);
        engine
            .credit("0xA", 5, CreditReason::Manual, now)
            .expect("credit");

        let err = engine.debit("0xA", 10, now).expect_err("should fail");
        assert!(matches!(err, EngineError::InsufficientBalance { .. }));
        assert_eq!(engine.balance("0xA").expect("balance"), 5);
    }

    #[test]
    fn equal_balances_keep_insertion_order() {
        let mut engine = engine();
        let now = at(2026, 1, 5, 8);

        engine
            .credit("0xA", 10, CreditReason::Milestone, now)
            .expect("credit A");
        engine
            .credit("0xB", 10, CreditReason::Milestone, now)
            .expect("credit B");

        assert_eq!(engine.rank("0xA").expect("rank A"), 1);
        assert_eq!(engine.rank("0xB").expect("rank B"), 2);
    }

    #[test]
    fn milestone_count_follows_reason_not_amount() {
        let mut engine = engine();
        let now = at(2026, 1, 5, 8);

        // Same amount, different reasons; only the milestone credit counts.
        engine
            .credit("0xA", 10, CreditReason::Milestone, now)
            .expect("milestone credit");
        engine
            .credit("0xA", 10, CreditReason::Ticket, now)
            .expect("ticket credit");
        engine
            .credit("0xA", 10, CreditReason::TipReceived, now)
            .expect("tip credit");

        let entries = engine.leaderboard().expect("leaderboard");
        assert_eq!(entries[0].milestones_achieved, 1);
        assert_eq!(entries[0].tokens, 30);
    }

    #[test]
    fn rank_is_zero_for_unseen_address() {
        let engine = engine();
        assert_eq!(engine.rank("0xNobody").expect("rank"), 0);
    }

    #[test]
    fn higher_balance_outranks_earlier_entry() {
        let mut engine = engine();
        let now = at(2026, 1, 5, 8);

        engine
            .credit("0xA", 10, CreditReason::Manual, now)
            .expect("credit A");
        engine
            .credit("0xB", 30, CreditReason::Manual, now)
            .expect("credit B");

        assert_eq!(engine.rank("0xB").expect("rank B"), 1);
        assert_eq!(engine.rank("0xA").expect("rank A"), 2);
    }
}
