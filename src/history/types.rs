// src/history/types.rs
//! Output types of the balance reconstruction

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::vesting::VestingSchedule;

/// Fixed precision of every balance we produce
pub const DECIMALS: i32 = 6;

/// Round to 6 decimal places. Applied when values are computed, not when displayed.
pub fn round6(value: f64) -> f64 {
    let factor = 10f64.powi(DECIMALS);
    let rounded = (value * factor).round() / factor;
    // Avoid emitting -0.0
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Clamp to zero and round; every timeline field goes through this
pub fn balance(value: f64) -> f64 {
    round6(value.max(0.0))
}

/// Balances of one wallet at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub date: DateTime<Utc>,
    pub staked: f64,
    pub unstaked: f64,
    pub locked: f64,
    pub realized_rewards: f64,
    /// Inserted for an unlock boundary or the coverage end, not a real event
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
}

impl TimelinePoint {
    /// Build a point, enforcing `0 <= locked <= staked` and the fixed precision
    pub fn new(date: DateTime<Utc>, staked: f64, unstaked: f64, locked: f64, realized_rewards: f64) -> Self {
        let staked = balance(staked);
        Self {
            date,
            staked,
            unstaked: balance(unstaked),
            locked: balance(locked).min(staked),
            realized_rewards: balance(realized_rewards),
            synthetic: false,
        }
    }

    /// Same balances at a later instant, with `locked` recomputed
    pub fn carried_to(&self, date: DateTime<Utc>, locked: f64) -> Self {
        Self {
            synthetic: true,
            ..Self::new(date, self.staked, self.unstaked, locked, self.realized_rewards)
        }
    }
}

/// User-facing record of one real event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub type_label: String,
    pub amount: f64,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Terminal snapshot of a wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletSummary {
    pub total_operations: usize,
    pub current_staked: f64,
    pub current_unstaked: f64,
    pub current_locked: f64,
    pub total_realized_rewards: f64,
    pub total_withdrawn: f64,
    pub total_compounded: f64,
    pub first_stake_date: Option<DateTime<Utc>>,
    pub last_activity_date: Option<DateTime<Utc>>,
    pub days_active: u64,
}

/// Everything reconstructed for one wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletHistory {
    pub address: String,
    pub date_range: DateRange,
    pub timeline: Vec<TimelinePoint>,
    pub operations: Vec<Operation>,
    pub summary: WalletSummary,
    pub vesting_schedules: Vec<VestingSchedule>,
    /// Own deltas add up to the published totals
    pub reconciled: bool,
}
