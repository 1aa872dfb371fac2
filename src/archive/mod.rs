// src/archive/mod.rs
//! Staking event archive: decoding, transport and the session cache

pub mod cache;
pub mod client;
pub mod codec;
pub mod types;

pub use cache::{ArchiveCache, CacheState};
pub use client::{source_from_config, ArchiveSource, FileArchiveSource, HttpArchiveSource};
pub use codec::decode_archive;
pub use types::*;
