// src/vesting.rs
//! Cliff + fixed-period linear unlock schedules.
//!
//! A wallet can hold several schedules at once, one per staking position.
//! Schedule identity is a known weak spot: the event format carries no
//! position id, so a `set_vesting` event is matched to an existing schedule
//! by exact equality of the locked amount. Two positions that lock the same
//! amount collapse into one schedule, and an update that changes the locked
//! amount is seen as a new schedule. `ScheduleKey::Position` exists so a
//! stronger key can be used once events carry one; nothing derives it today.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::events::VestingTerms;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Upper bound on boundaries enumerated for a single schedule
pub const MAX_UNLOCK_BOUNDARIES: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VestingSchedule {
    pub start_time: DateTime<Utc>,
    pub locked_amount: f64,
    pub cliff_hours: f64,
    pub unlock_period_hours: f64,
    pub unlock_rate_amount: f64,
    /// Stable position id, when the event schema provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

/// How a `set_vesting` event finds the schedule it updates
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleKey {
    LockedAmount(f64),
    Position(String),
}

impl ScheduleKey {
    /// The only key derivable from current event fields
    pub fn for_schedule(schedule: &VestingSchedule) -> Self {
        match &schedule.position {
            Some(id) => ScheduleKey::Position(id.clone()),
            None => ScheduleKey::LockedAmount(schedule.locked_amount),
        }
    }

    pub fn matches(&self, schedule: &VestingSchedule) -> bool {
        match self {
            ScheduleKey::LockedAmount(amount) => schedule.locked_amount == *amount,
            ScheduleKey::Position(id) => schedule.position.as_deref() == Some(id.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

// Whole milliseconds in `h` hours; boundaries and period counts share this rounding
fn hours_to_ms(h: f64) -> Option<i64> {
    let ms = (h * MS_PER_HOUR).round();
    (ms.is_finite() && ms.abs() < i64::MAX as f64).then_some(ms as i64)
}

// `None` when the offset doesn't fit in a timestamp
fn offset_ms(base: DateTime<Utc>, ms: i64) -> Option<DateTime<Utc>> {
    base.checked_add_signed(Duration::try_milliseconds(ms)?)
}

impl VestingSchedule {
    pub fn new(start_time: DateTime<Utc>, locked_amount: f64, terms: VestingTerms) -> Self {
        Self {
            start_time,
            locked_amount,
            cliff_hours: terms.cliff_hours,
            unlock_period_hours: terms.unlock_period_hours,
            unlock_rate_amount: terms.unlock_rate_amount,
            position: None,
        }
    }

    /// Only schedules with a positive amount, period and rate are tracked
    pub fn is_trackable(&self) -> bool {
        self.locked_amount > 0.0 && self.unlock_period_hours > 0.0 && self.unlock_rate_amount > 0.0
    }

    fn unlocks(&self) -> bool {
        self.unlock_period_hours > 0.0 && self.unlock_rate_amount > 0.0
    }

    pub fn cliff_end(&self) -> Option<DateTime<Utc>> {
        offset_ms(self.start_time, hours_to_ms(self.cliff_hours)?)
    }

    // Period length in whole milliseconds; `None` if it rounds to nothing
    fn period_ms(&self) -> Option<i64> {
        hours_to_ms(self.unlock_period_hours).filter(|ms| *ms > 0)
    }

    /// Amount still locked at `instant`. Never negative.
    pub fn locked_remaining(&self, instant: DateTime<Utc>) -> f64 {
        let locked = self.locked_amount.max(0.0);
        if !self.unlocks() {
            return locked;
        }
        let (Some(cliff_ms), Some(period_ms)) = (hours_to_ms(self.cliff_hours), self.period_ms()) else {
            return locked;
        };

        let elapsed_ms = (instant - self.start_time).num_milliseconds();
        if elapsed_ms < cliff_ms {
            return locked;
        }

        let periods = (elapsed_ms - cliff_ms) / period_ms;
        let unlocked = periods as f64 * self.unlock_rate_amount;
        (self.locked_amount - unlocked).max(0.0)
    }

    /// Number of periods after the cliff until everything is unlocked
    pub fn periods_to_unlock(&self) -> usize {
        if !self.unlocks() || self.locked_amount <= 0.0 {
            return 0;
        }
        (self.locked_amount / self.unlock_rate_amount).ceil() as usize
    }

    /// Cliff end followed by each period boundary up to full unlock, stopping after `until`
    pub fn unlock_boundaries(&self, until: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let mut out = Vec::new();
        let Some(cliff_end) = self.cliff_end() else {
            return out;
        };
        if cliff_end > until {
            return out;
        }
        out.push(cliff_end);

        let Some(period_ms) = self.period_ms() else {
            return out;
        };
        let total_periods = self.periods_to_unlock();
        if total_periods > MAX_UNLOCK_BOUNDARIES {
            log::warn!(
                "Vesting schedule of {} unlocks over {} periods; only the first {} are shown",
                self.locked_amount,
                total_periods,
                MAX_UNLOCK_BOUNDARIES
            );
        }
        let periods = total_periods.min(MAX_UNLOCK_BOUNDARIES);

        for k in 1..=periods {
            let Some(boundary) = period_ms
                .checked_mul(k as i64)
                .and_then(|ms| offset_ms(cliff_end, ms))
            else {
                break;
            };
            if boundary > until {
                break;
            }
            out.push(boundary);
        }
        out
    }
}

/// The active schedules of one wallet, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleSet {
    schedules: Vec<VestingSchedule>,
}

impl ScheduleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VestingSchedule> {
        self.schedules.iter()
    }

    /// Replace the schedule matching `key` in place, or append a new one
    pub fn upsert(&mut self, key: &ScheduleKey, schedule: VestingSchedule) -> Upsert {
        match self.schedules.iter_mut().find(|s| key.matches(s)) {
            Some(existing) => {
                *existing = schedule;
                Upsert::Replaced
            }
            None => {
                self.schedules.push(schedule);
                Upsert::Inserted
            }
        }
    }

    /// Sum of what every schedule still locks at `instant`
    pub fn total_locked(&self, instant: DateTime<Utc>) -> f64 {
        self.schedules.iter().map(|s| s.locked_remaining(instant)).sum()
    }

    pub fn into_vec(self) -> Vec<VestingSchedule> {
        self.schedules
    }
}
