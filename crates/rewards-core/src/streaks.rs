use chrono::{DateTime, NaiveDate, Utc};
use contracts::{RewardEventType, StreakSnapshot};
use serde_json::json;

use crate::store::{self, keys, KvStore};
use crate::{EngineError, RewardEngine};

impl<S: KvStore> RewardEngine<S> {
    pub fn streak(&self, address: &str) -> Result<Option<StreakSnapshot>, EngineError> {
        Ok(store::get_json(&self.store, &keys::streak(address))?)
    }

    /// Consecutive-day activity counter: same day is a no-op, the next day
    /// extends the run, any gap restarts it at 1.
    pub(crate) fn update_streak(
        &mut self,
        address: &str,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<StreakSnapshot, EngineError> {
        let key = keys::streak(address);
        let stored: Option<StreakSnapshot> = store::get_json(&self.store, &key)?;

        let (current, longest) = match &stored {
            Some(snapshot) => {
                let last_day = snapshot.last_active_day.parse::<NaiveDate>().ok();
                match last_day {
                    Some(last) if last == today => return Ok(snapshot.clone()),
                    Some(last) if last.succ_opt() == Some(today) => {
                        (snapshot.current + 1, snapshot.longest)
                    }
                    _ => (1, snapshot.longest),
                }
            }
            None => (1, 0),
        };

        let snapshot = StreakSnapshot {
            current,
            longest: longest.max(current),
            last_active_day: today.to_string(),
        };
        store::put_json(&mut self.store, &key, &snapshot)?;

        self.push_event(
            RewardEventType::StreakAdvanced,
            address,
            None,
            None,
            Some(json!({ "current": snapshot.current, "longest": snapshot.longest })),
            now,
        );

        Ok(snapshot)
    }
}
