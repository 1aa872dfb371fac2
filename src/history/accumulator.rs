// src/history/accumulator.rs
//! Replays one wallet's events into running balances

use super::types::{balance, round6, Operation, TimelinePoint};
use crate::events::{EventType, StakeEvent};
use crate::vesting::{ScheduleKey, ScheduleSet, Upsert, VestingSchedule};

/// Per-event timeline, operations, and the schedules active after the last event
#[derive(Debug, Clone, Default)]
pub struct Accumulated {
    pub timeline: Vec<TimelinePoint>,
    pub operations: Vec<Operation>,
    pub schedules: ScheduleSet,
}

#[derive(Debug, Clone, Copy, Default)]
struct RunningTotals {
    staked: f64,
    unstaked: f64,
    realized_rewards: f64,
}

/// Amount shown on the operation record for this event
fn operation_amount(event: &StakeEvent) -> f64 {
    match event.event_type {
        EventType::Initialize | EventType::Stake | EventType::Unstake | EventType::SetVesting => {
            event.d_stake.abs()
        }
        EventType::Withdraw => event.d_pending.abs(),
        EventType::Compound | EventType::Claim => event.reward_sol,
        EventType::Unknown(_) => event.d_stake.abs(),
    }
}

/// Schedule declared by a `set_vesting` event, if it is worth tracking
fn declared_schedule(event: &StakeEvent) -> Option<VestingSchedule> {
    let terms = event.vesting?;
    let schedule = VestingSchedule::new(event.timestamp, round6(event.d_stake.abs()), terms);
    schedule.is_trackable().then_some(schedule)
}

/// Replay `events` (one wallet, log order) into a timeline.
///
/// `d_stake` and `d_pending` are applied for every event, whatever its type.
pub fn accumulate(events: &[StakeEvent]) -> Accumulated {
    let mut totals = RunningTotals::default();
    let mut out = Accumulated::default();

    for event in events {
        totals.staked = round6(totals.staked + event.d_stake);
        totals.unstaked = round6(totals.unstaked + event.d_pending);

        match event.event_type {
            EventType::Compound | EventType::Claim => {
                totals.realized_rewards = round6(totals.realized_rewards + event.reward_sol);
            }
            EventType::SetVesting => {
                if let Some(schedule) = declared_schedule(event) {
                    let key = ScheduleKey::for_schedule(&schedule);
                    if out.schedules.upsert(&key, schedule) == Upsert::Replaced {
                        log::debug!("set_vesting {} updated an existing schedule", event.signature);
                    }
                }
            }
            EventType::Unknown(ordinal) => {
                log::debug!("Event {} has unknown type {}", event.signature, ordinal);
            }
            _ => {}
        }

        let locked = out.schedules.total_locked(event.timestamp);
        out.timeline.push(TimelinePoint::new(
            event.timestamp,
            totals.staked,
            totals.unstaked,
            locked,
            totals.realized_rewards,
        ));
        out.operations.push(Operation {
            date: event.timestamp,
            kind: event.event_type.name().to_string(),
            type_label: event.event_type.label().to_string(),
            amount: balance(operation_amount(event)),
            signature: event.signature.clone(),
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::VestingTerms;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn event(hours: i64, event_type: EventType, d_stake: f64, d_pending: f64, reward: f64) -> StakeEvent {
        StakeEvent {
            signature: format!("sig-{}", hours),
            timestamp: t0() + Duration::hours(hours),
            slot: hours as u64,
            event_type,
            address: "W1".to_string(),
            d_stake,
            d_pending,
            d_withdrawn: 0.0,
            d_compounded: 0.0,
            fee_payer: None,
            reward_sol: reward,
            vesting: None,
        }
    }

    fn vesting(hours: i64, locked: f64, cliff: f64, period: f64, rate: f64) -> StakeEvent {
        StakeEvent {
            vesting: Some(VestingTerms {
                cliff_hours: cliff,
                unlock_period_hours: period,
                unlock_rate_amount: rate,
            }),
            ..event(hours, EventType::SetVesting, locked, 0.0, 0.0)
        }
    }

    #[test]
    fn test_stake_unstake_withdraw_claim() {
        let events = vec![
            event(0, EventType::Initialize, 0.0, 0.0, 0.0),
            event(1, EventType::Stake, 10.0, 0.0, 0.0),
            event(2, EventType::Unstake, -4.0, 4.0, 0.0),
            event(3, EventType::Withdraw, 0.0, -4.0, 0.0),
            event(4, EventType::Claim, 0.0, 0.0, 0.25),
            event(5, EventType::Compound, 0.3, 0.0, 0.3),
        ];
        let acc = accumulate(&events);
        assert_eq!(acc.timeline.len(), 6);
        assert_eq!(acc.operations.len(), 6);

        let last = acc.timeline.last().unwrap();
        assert_eq!(last.staked, 6.3);
        assert_eq!(last.unstaked, 0.0);
        assert_eq!(last.realized_rewards, 0.55);
        assert_eq!(last.locked, 0.0);

        let amounts: Vec<f64> = acc.operations.iter().map(|o| o.amount).collect();
        assert_eq!(amounts, vec![0.0, 10.0, 4.0, 4.0, 0.25, 0.3]);
        assert_eq!(acc.operations[2].kind, "unstake");
        assert_eq!(acc.timeline[2].unstaked, 4.0);
    }

    #[test]
    fn test_unknown_type_still_moves_balances() {
        let events = vec![
            event(0, EventType::Stake, 5.0, 0.0, 0.0),
            event(1, EventType::Unknown(99), 2.0, 1.0, 7.0),
        ];
        let acc = accumulate(&events);
        let last = acc.timeline.last().unwrap();
        assert_eq!(last.staked, 7.0);
        assert_eq!(last.unstaked, 1.0);
        assert_eq!(last.realized_rewards, 0.0);
        assert_eq!(acc.operations[1].kind, "unknown");
        assert_eq!(acc.operations[1].type_label, "Unknown");
    }

    #[test]
    fn test_set_vesting_locks_and_clamps() {
        let events = vec![
            event(0, EventType::Stake, 200.0, 0.0, 0.0),
            vesting(1, 250.0, 24.0, 24.0, 100.0),
        ];
        let acc = accumulate(&events);
        assert_eq!(acc.schedules.len(), 1);
        let point = &acc.timeline[1];
        assert_eq!(point.staked, 450.0);
        assert_eq!(point.locked, 250.0);
        assert_eq!(acc.operations[1].amount, 250.0);
        assert_eq!(acc.operations[1].kind, "set_vesting");

        // Unstaking below the locked amount clamps locked to staked
        let mut more = events.clone();
        more.push(event(2, EventType::Unstake, -300.0, 300.0, 0.0));
        let acc = accumulate(&more);
        let point = acc.timeline.last().unwrap();
        assert_eq!(point.staked, 150.0);
        assert_eq!(point.locked, 150.0);
    }

    #[test]
    fn test_set_vesting_updates_same_amount_in_place() {
        let events = vec![
            vesting(0, 100.0, 24.0, 24.0, 10.0),
            vesting(1, 100.0, 0.0, 1.0, 50.0),
            vesting(2, 30.0, 24.0, 24.0, 10.0),
        ];
        let acc = accumulate(&events);
        assert_eq!(acc.schedules.len(), 2);
        let first = acc.schedules.iter().next().unwrap();
        assert_eq!(first.unlock_rate_amount, 50.0);
        assert_eq!(first.start_time, t0() + Duration::hours(1));
    }

    #[test]
    fn test_untrackable_vesting_ignored() {
        let events = vec![
            event(0, EventType::Stake, 100.0, 0.0, 0.0),
            vesting(1, 100.0, 24.0, 0.0, 10.0),
            event(2, EventType::SetVesting, 50.0, 0.0, 0.0),
        ];
        let acc = accumulate(&events);
        assert!(acc.schedules.is_empty());
        assert!(acc.timeline.iter().all(|p| p.locked == 0.0));
    }

    #[test]
    fn test_replay_is_deterministic() {
        let events = vec![
            event(0, EventType::Stake, 1.1, 0.0, 0.0),
            event(1, EventType::Stake, 2.2, 0.0, 0.0),
            vesting(2, 3.3, 1.0, 1.0, 1.0),
            event(3, EventType::Unstake, -0.7, 0.7, 0.0),
        ];
        let first = accumulate(&events);
        let second = accumulate(&events);
        assert_eq!(first.timeline, second.timeline);
        assert_eq!(first.operations, second.operations);
    }

    #[test]
    fn test_invariants_hold_on_every_point() {
        let events = vec![
            event(0, EventType::Stake, 50.0, 0.0, 0.0),
            vesting(0, 80.0, 1.0, 1.0, 10.0),
            event(3, EventType::Unstake, -45.0, 45.0, 0.0),
            event(4, EventType::Withdraw, 0.0, -60.0, 0.0),
            event(5, EventType::Unstake, -20.0, 20.0, 0.0),
        ];
        for p in accumulate(&events).timeline {
            assert!(p.locked <= p.staked);
            assert!(p.staked >= 0.0 && p.unstaked >= 0.0 && p.locked >= 0.0 && p.realized_rewards >= 0.0);
        }
    }
}
