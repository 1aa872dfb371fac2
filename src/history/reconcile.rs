// src/history/reconcile.rs
//! Cross-check a wallet's own deltas against the totals published in its address record

use serde::{Deserialize, Serialize};

use super::types::round6;
use crate::archive::CurrentTotals;
use crate::events::{EventType, StakeEvent};

// One unit in the sixth decimal, plus float slack
const TOLERANCE: f64 = 1.5e-6;

/// Sums of every delta column for one wallet
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaTotals {
    pub staked: f64,
    pub unstaked: f64,
    pub withdrawn: f64,
    pub compounded: f64,
    pub realized_rewards: f64,
}

impl DeltaTotals {
    pub fn from_events(events: &[StakeEvent]) -> Self {
        let mut totals = Self::default();
        for event in events {
            totals.staked = round6(totals.staked + event.d_stake);
            totals.unstaked = round6(totals.unstaked + event.d_pending);
            totals.withdrawn = round6(totals.withdrawn + event.d_withdrawn);
            totals.compounded = round6(totals.compounded + event.d_compounded);
            if matches!(event.event_type, EventType::Compound | EventType::Claim) {
                totals.realized_rewards = round6(totals.realized_rewards + event.reward_sol);
            }
        }
        totals
    }
}

fn close(a: f64, b: f64) -> bool {
    (round6(a) - round6(b)).abs() <= TOLERANCE
}

/// Names of the columns whose delta sums disagree with `current`
pub fn drifted_columns(derived: &DeltaTotals, current: &CurrentTotals) -> Vec<&'static str> {
    let checks = [
        ("staked", derived.staked, current.staked),
        ("unstaked", derived.unstaked, current.unstaked),
        ("withdrawn", derived.withdrawn, current.withdrawn),
        ("compounded", derived.compounded, current.compounded),
        ("total_rewards", derived.realized_rewards, current.total_rewards),
    ];
    checks
        .iter()
        .filter(|(_, d, c)| !close(*d, *c))
        .map(|(name, _, _)| *name)
        .collect()
}

/// True when the deltas reproduce `current`, or when there is nothing to compare against
pub fn reconcile(address: &str, derived: &DeltaTotals, current: Option<&CurrentTotals>) -> bool {
    let Some(current) = current else {
        return true;
    };
    let drifted = drifted_columns(derived, current);
    if drifted.is_empty() {
        return true;
    }
    log::warn!(
        "Event deltas for {} do not match published totals ({}); event log may be incomplete",
        address,
        drifted.join(", ")
    );
    false
}
