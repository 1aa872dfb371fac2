// src/events.rs
//! Staking events as they appear in the archive.
//!
//! Each event is a positional tuple:
//!
//! | idx | field |
//! |-----|-------|
//! | 0 | signature |
//! | 1 | timestamp (RFC 3339) |
//! | 2 | slot |
//! | 3 | type ordinal |
//! | 4 | wallet address |
//! | 5..=8 | `d_stake`, `d_pending`, `d_withdrawn`, `d_compounded` |
//! | 9 | fee payer (nullable) |
//! | 10 | realized SOL reward |
//! | 11..=13 | `set_vesting` only: cliff hours, unlock period hours, unlock rate |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::archive::RawEvent;

/// Anything shorter is malformed and skipped
pub const MIN_EVENT_FIELDS: usize = 11;

const IDX_SIGNATURE: usize = 0;
const IDX_TIMESTAMP: usize = 1;
const IDX_SLOT: usize = 2;
const IDX_TYPE: usize = 3;
const IDX_ADDRESS: usize = 4;
const IDX_D_STAKE: usize = 5;
const IDX_D_PENDING: usize = 6;
const IDX_D_WITHDRAWN: usize = 7;
const IDX_D_COMPOUNDED: usize = 8;
const IDX_FEE_PAYER: usize = 9;
const IDX_REWARD_SOL: usize = 10;
const IDX_CLIFF_HOURS: usize = 11;
const IDX_UNLOCK_PERIOD_HOURS: usize = 12;
const IDX_UNLOCK_RATE: usize = 13;

/// Event kind. Ordinals are part of the archive format and must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Initialize,
    Stake,
    Unstake,
    Withdraw,
    Compound,
    Claim,
    SetVesting,
    Unknown(i64),
}

impl EventType {
    pub fn from_ordinal(ordinal: i64) -> Self {
        match ordinal {
            0 => EventType::Initialize,
            1 => EventType::Stake,
            2 => EventType::Unstake,
            3 => EventType::Withdraw,
            4 => EventType::Compound,
            5 => EventType::Claim,
            6 => EventType::SetVesting,
            other => EventType::Unknown(other),
        }
    }

    /// Machine name used in operation records
    pub fn name(&self) -> &'static str {
        match self {
            EventType::Initialize => "initialize",
            EventType::Stake => "stake",
            EventType::Unstake => "unstake",
            EventType::Withdraw => "withdraw",
            EventType::Compound => "compound",
            EventType::Claim => "claim",
            EventType::SetVesting => "set_vesting",
            EventType::Unknown(_) => "unknown",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            EventType::Initialize => "Initialize",
            EventType::Stake => "Stake",
            EventType::Unstake => "Unstake",
            EventType::Withdraw => "Withdraw",
            EventType::Compound => "Compound",
            EventType::Claim => "Claim Rewards",
            EventType::SetVesting => "Set Vesting",
            EventType::Unknown(_) => "Unknown",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Unknown(n) => write!(f, "unknown({})", n),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Cliff and unlock parameters carried by `set_vesting` events
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VestingTerms {
    pub cliff_hours: f64,
    pub unlock_period_hours: f64,
    pub unlock_rate_amount: f64,
}

/// One decoded archive event
#[derive(Debug, Clone, PartialEq)]
pub struct StakeEvent {
    pub signature: String,
    pub timestamp: DateTime<Utc>,
    pub slot: u64,
    pub event_type: EventType,
    pub address: String,
    pub d_stake: f64,
    pub d_pending: f64,
    pub d_withdrawn: f64,
    pub d_compounded: f64,
    pub fee_payer: Option<String>,
    pub reward_sol: f64,
    pub vesting: Option<VestingTerms>,
}

// Numbers may arrive as JSON numbers, numeric strings or null
fn number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

impl StakeEvent {
    /// Decode a raw tuple. `None` means the event is malformed and should be skipped.
    pub fn from_raw(raw: &RawEvent) -> Option<Self> {
        if raw.len() < MIN_EVENT_FIELDS {
            return None;
        }

        let address = text(raw.get(IDX_ADDRESS))?;
        let timestamp = raw
            .get(IDX_TIMESTAMP)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())?
            .with_timezone(&Utc);

        let event_type = match raw.get(IDX_TYPE) {
            Some(Value::Number(n)) => EventType::from_ordinal(n.as_i64().unwrap_or(-1)),
            _ => EventType::Unknown(-1),
        };

        let vesting = if raw.len() > IDX_UNLOCK_RATE {
            Some(VestingTerms {
                cliff_hours: number(raw.get(IDX_CLIFF_HOURS)),
                unlock_period_hours: number(raw.get(IDX_UNLOCK_PERIOD_HOURS)),
                unlock_rate_amount: number(raw.get(IDX_UNLOCK_RATE)),
            })
        } else {
            None
        };

        Some(Self {
            signature: text(raw.get(IDX_SIGNATURE)).unwrap_or_default(),
            timestamp,
            slot: raw.get(IDX_SLOT).and_then(Value::as_u64).unwrap_or(0),
            event_type,
            address,
            d_stake: number(raw.get(IDX_D_STAKE)),
            d_pending: number(raw.get(IDX_D_PENDING)),
            d_withdrawn: number(raw.get(IDX_D_WITHDRAWN)),
            d_compounded: number(raw.get(IDX_D_COMPOUNDED)),
            fee_payer: text(raw.get(IDX_FEE_PAYER)),
            reward_sol: number(raw.get(IDX_REWARD_SOL)),
            vesting,
        })
    }
}

/// Cheap address check on a raw tuple, so unrelated wallets aren't fully decoded
pub fn raw_address(raw: &RawEvent) -> Option<&str> {
    raw.get(IDX_ADDRESS).and_then(Value::as_str)
}

/// Decode every well-formed event for `address` within `events`, in log order
pub fn events_for_address<'a, I>(events: I, address: &str) -> Vec<StakeEvent>
where
    I: IntoIterator<Item = &'a RawEvent>,
{
    let mut out = Vec::new();
    let mut skipped = 0usize;
    for raw in events {
        if raw_address(raw) != Some(address) {
            continue;
        }
        match StakeEvent::from_raw(raw) {
            Some(event) => out.push(event),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        log::debug!("Skipped {} malformed events for {}", skipped, address);
    }
    out
}
