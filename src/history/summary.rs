// src/history/summary.rs

use super::reconcile::DeltaTotals;
use super::types::{balance, Operation, TimelinePoint, WalletSummary};
use crate::archive::CurrentTotals;

/// Derive the terminal snapshot of a finished timeline.
///
/// Published `current` totals win over replayed values when present.
/// `last_activity_date` is the last real operation, not the last (possibly
/// synthetic) timeline point.
pub fn summarize(
    timeline: &[TimelinePoint],
    operations: &[Operation],
    current: Option<&CurrentTotals>,
    derived: &DeltaTotals,
) -> WalletSummary {
    let last_point = timeline.last();
    let from_point = |f: fn(&TimelinePoint) -> f64| last_point.map(f).unwrap_or(0.0);

    let first_stake_date = timeline.first().map(|p| p.date);
    let last_activity_date = operations.last().map(|o| o.date);

    let days_active = match (first_stake_date, last_activity_date) {
        (Some(first), Some(last)) if last >= first => (last - first).num_days() as u64 + 1,
        _ => timeline.len() as u64,
    };

    WalletSummary {
        total_operations: operations.len(),
        current_staked: current
            .map(|c| balance(c.staked))
            .unwrap_or_else(|| from_point(|p| p.staked)),
        current_unstaked: current
            .map(|c| balance(c.unstaked))
            .unwrap_or_else(|| from_point(|p| p.unstaked)),
        current_locked: from_point(|p| p.locked),
        total_realized_rewards: current
            .map(|c| balance(c.total_rewards))
            .unwrap_or_else(|| from_point(|p| p.realized_rewards)),
        total_withdrawn: balance(current.map(|c| c.withdrawn).unwrap_or(derived.withdrawn)),
        total_compounded: balance(current.map(|c| c.compounded).unwrap_or(derived.compounded)),
        first_stake_date,
        last_activity_date,
        days_active,
    }
}
