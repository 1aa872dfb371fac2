// src/lib.rs
//! Reconstructs per-wallet staking balance history from a compressed,
//! append-only archive of staking events: staked, unstaked, vesting-locked
//! and realized-reward balances over time, with unlock steps projected onto
//! days without on-chain activity.

pub mod archive;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod lookup;
pub mod vesting;

pub use archive::{ArchiveCache, ArchiveSource, EventArchive};
pub use config::ArchiveConfig;
pub use error::ArchiveError;
pub use history::{build_wallet_history, NotFound, WalletHistory};
pub use lookup::{LookupOutcome, LookupResponse, WalletLookupService};
