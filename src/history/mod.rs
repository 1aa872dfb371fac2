// src/history/mod.rs
//! Per-wallet balance reconstruction from the staking event archive.
//!
//! archive events -> accumulate -> extend_timeline -> summarize

pub mod accumulator;
pub mod reconcile;
pub mod summary;
pub mod timeline;
pub mod types;

pub use accumulator::{accumulate, Accumulated};
pub use reconcile::{reconcile, DeltaTotals};
pub use summary::summarize;
pub use timeline::extend_timeline;
pub use types::*;

use crate::archive::{AddressRecord, EventArchive};
use crate::events::events_for_address;

/// Why a lookup produced no history. A normal outcome, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFound {
    /// Input isn't a wallet address at all
    InvalidAddress,
    /// Wallet is absent from `addresses`
    NeverStaked,
    /// Wallet has a record we can't read
    MalformedRecord,
    /// Record exists but points at no events
    NoEventsRecorded,
    /// Record points at events but none of them belong to the wallet
    NoMatchingEvents,
}

impl NotFound {
    pub fn message(&self) -> &'static str {
        match self {
            NotFound::InvalidAddress => "Invalid wallet address",
            NotFound::NeverStaked => "Address not found in staking records",
            NotFound::MalformedRecord => "Address data is malformed",
            NotFound::NoEventsRecorded => "Address has no recorded events",
            NotFound::NoMatchingEvents => "No events found for this address",
        }
    }
}

impl std::fmt::Display for NotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Rebuild the full history of `address` from scratch
pub fn build_wallet_history(archive: &EventArchive, address: &str) -> Result<WalletHistory, NotFound> {
    let raw_record = archive.record(address).ok_or(NotFound::NeverStaked)?;
    let record = AddressRecord::from_value(raw_record).ok_or(NotFound::MalformedRecord)?;
    let window = record
        .event_window(archive.events.len())
        .ok_or(NotFound::NoEventsRecorded)?;

    let mut events = events_for_address(&archive.events[window], address);
    if events.is_empty() {
        // Index hints can be stale; they only narrow the scan
        log::debug!("Index hints for {} matched nothing, scanning full log", address);
        events = events_for_address(&archive.events, address);
    }
    if events.is_empty() {
        return Err(NotFound::NoMatchingEvents);
    }

    let current = record.current.as_ref();
    let derived = DeltaTotals::from_events(&events);
    let reconciled = reconcile(address, &derived, current);

    let Accumulated {
        timeline,
        operations,
        schedules,
    } = accumulate(&events);
    let timeline = extend_timeline(timeline, &schedules, archive.coverage_end());
    let summary = summarize(&timeline, &operations, current, &derived);

    Ok(WalletHistory {
        address: address.to_string(),
        date_range: DateRange {
            start: archive.meta.start.clone(),
            end: archive.meta.end.clone(),
        },
        timeline,
        operations,
        summary,
        vesting_schedules: schedules.into_vec(),
        reconciled,
    })
}
