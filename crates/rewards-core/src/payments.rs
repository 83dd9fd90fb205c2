use chrono::{DateTime, Utc};
use contracts::{CreditReason, RewardEventType, TipKind, TipStatus, TipTransaction};
use serde_json::json;

use crate::store::{self, keys, KvStore};
use crate::{EngineError, RewardEngine};

impl<S: KvStore> RewardEngine<S> {
    /// Moves tokens from one wallet to another as a single engine call.
    /// Preconditions fail before any mutation and append no record; a store
    /// failure after the debit restores both wallets to their pre-transfer
    /// balances, so neither side keeps tokens from a failed transfer. Rollback
    /// writes that fail themselves are recorded on the failure event.
    pub fn send_tip(
        &mut self,
        from: &str,
        to: &str,
        amount: u64,
        kind: TipKind,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<TipTransaction, EngineError> {
        if amount == 0 {
            return Err(EngineError::InvalidAmount(0));
        }
        if from == to {
            return Err(EngineError::SelfTransfer(from.to_string()));
        }

        let balance = self.balance(from)?;
        if balance < amount {
            return Err(EngineError::InsufficientBalance {
                address: from.to_string(),
                balance,
                requested: amount,
            });
        }
        let recipient_balance = self.balance(to)?;

        let mut transactions = self.transactions()?;
        let mut transaction = TipTransaction {
            id: format!("tip:{}", transactions.len() + 1),
            from_address: from.to_string(),
            to_address: to.to_string(),
            amount,
            kind,
            note,
            status: TipStatus::Pending,
            created_at: now.to_rfc3339(),
            tx_hash: None,
        };

        self.debit(from, amount, now)?;

        if let Err(err) = self.credit(to, amount, CreditReason::TipReceived, now) {
            // The credit can fail between its balance and leaderboard writes,
            // so both wallets are restored to their snapshots.
            let mut rollback_errors =
                self.restore_balances(&[(from, balance), (to, recipient_balance)], now);

            transaction.status = TipStatus::Failed;
            transactions.push(transaction.clone());
            if let Err(append_err) =
                store::put_json(&mut self.store, keys::TRANSACTIONS, &transactions)
            {
                rollback_errors.push(format!("transactions: {append_err}"));
            }

            let mut details = json!({ "to": to, "id": transaction.id });
            if !rollback_errors.is_empty() {
                details["rollback_errors"] = json!(rollback_errors);
            }
            self.push_event(
                RewardEventType::TipFailed,
                from,
                Some(amount),
                None,
                Some(details),
                now,
            );
            return Err(err);
        }

        transaction.status = TipStatus::Completed;
        transaction.tx_hash = Some(fabricated_tx_hash(
            &transaction.id,
            from,
            to,
            amount,
            now.timestamp_millis(),
        ));

        transactions.push(transaction.clone());
        store::put_json(&mut self.store, keys::TRANSACTIONS, &transactions)?;

        self.push_event(
            RewardEventType::TipCompleted,
            from,
            Some(amount),
            None,
            Some(json!({
                "to": to,
                "id": transaction.id,
                "tx_hash": transaction.tx_hash,
            })),
            now,
        );

        Ok(transaction)
    }

    pub fn transactions(&self) -> Result<Vec<TipTransaction>, EngineError> {
        Ok(store::get_json(&self.store, keys::TRANSACTIONS)?.unwrap_or_default())
    }

    /// Transfers touching the address on either side, newest first.
    pub fn transaction_history(&self, address: &str) -> Result<Vec<TipTransaction>, EngineError> {
        let mut history: Vec<TipTransaction> = self
            .transactions()?
            .into_iter()
            .filter(|tx| tx.from_address == address || tx.to_address == address)
            .collect();
        history.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(history)
    }

    /// Sum of completed transfers received by the address.
    pub fn trainer_earnings(&self, address: &str) -> Result<u64, EngineError> {
        Ok(self
            .transactions()?
            .iter()
            .filter(|tx| tx.to_address == address && tx.status == TipStatus::Completed)
            .map(|tx| tx.amount)
            .sum())
    }

    /// Writes snapshot balances back after a failed transfer, raw balance and
    /// leaderboard both. Returns the rollback writes that failed themselves;
    /// the caller records them on the failure event so a stuck store is
    /// visible instead of silently losing the restore.
    fn restore_balances(
        &mut self,
        snapshots: &[(&str, u64)],
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let mut errors = Vec::new();
        for (address, snapshot) in snapshots {
            if let Err(err) = store::put_json(&mut self.store, &keys::balance(address), snapshot) {
                errors.push(format!("balance {address}: {err}"));
            }
            if let Err(err) = self.update_leaderboard(address, now, |entry| {
                entry.tokens = *snapshot;
            }) {
                errors.push(format!("leaderboard {address}: {err}"));
            }
        }
        errors
    }
}

fn mix_seed(seed: u64, salt: u64) -> u64 {
    let mut value = seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    value ^= value.rotate_left(29);
    value = value.wrapping_mul(0x517C_C1B7_2722_0A95);
    value ^ (value >> 31)
}

fn stable_text_hash(text: &str) -> u64 {
    let mut hash = 0_u64;
    for byte in text.as_bytes() {
        hash = hash.rotate_left(5) ^ u64::from(*byte);
        hash = hash.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    }
    hash
}

/// Fabricated 64-hex-digit transaction hash. There is no chain behind it; the
/// value only has to be stable for the transaction and unique in practice.
fn fabricated_tx_hash(id: &str, from: &str, to: &str, amount: u64, millis: i64) -> String {
    let base = stable_text_hash(id)
        ^ stable_text_hash(from).rotate_left(17)
        ^ stable_text_hash(to).rotate_left(33)
        ^ amount.wrapping_mul(0x517C_C1B7_2722_0A95)
        ^ (millis as u64);

    let mut hash = String::with_capacity(66);
    hash.push_str("0x");
    for salt in 0..4_u64 {
        hash.push_str(&format!("{:016x}", mix_seed(base, salt)));
    }
    hash
}
