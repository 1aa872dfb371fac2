// src/config/mod.rs
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_MAX_COMPRESSED_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_MAX_DECOMPRESSED_BYTES: usize = 50 * 1024 * 1024;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the event archive lives and how hard we are willing to work to get it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArchiveConfig {
    /// http(s) URL or local path of the gzip-compressed archive
    pub archive_url: String,
    /// Quiet period before a lookup actually starts
    pub debounce_ms: u64,
    /// Ceiling on the compressed payload
    pub max_compressed_bytes: usize,
    /// Ceiling on the decoded JSON document
    pub max_decompressed_bytes: usize,
    /// HTTP request timeout
    pub timeout_secs: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            archive_url: String::new(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            max_compressed_bytes: DEFAULT_MAX_COMPRESSED_BYTES,
            max_decompressed_bytes: DEFAULT_MAX_DECOMPRESSED_BYTES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ArchiveConfig {
    /// Load archive configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reads values through `get`, so tests don't touch process env
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            archive_url: get("STAKE_ARCHIVE_URL")
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
            debounce_ms: get("STAKE_LOOKUP_DEBOUNCE_MS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.debounce_ms),
            max_compressed_bytes: get("STAKE_ARCHIVE_MAX_COMPRESSED_BYTES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_compressed_bytes),
            max_decompressed_bytes: get("STAKE_ARCHIVE_MAX_DECOMPRESSED_BYTES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_decompressed_bytes),
            timeout_secs: get("STAKE_ARCHIVE_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }

    /// Check if the archive location and limits are usable
    pub fn is_valid(&self) -> bool {
        !self.archive_url.is_empty()
            && self.max_compressed_bytes > 0
            && self.max_decompressed_bytes > 0
    }

    pub fn is_remote(&self) -> bool {
        self.archive_url.starts_with("http://") || self.archive_url.starts_with("https://")
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
