// src/lookup.rs
//! Debounced wallet lookups against the cached archive.
//!
//! Every call to `lookup` takes a new request token. A lookup only commits
//! its result if its token is still the latest one when it finishes, so a
//! slow lookup that completes after a newer request is dropped instead of
//! overwriting the newer result. Work already in flight is never aborted.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::archive::{ArchiveCache, ArchiveSource};
use crate::history::{build_wallet_history, NotFound, WalletHistory};

/// Wire shape handed to the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct LookupResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub history: Option<WalletHistory>,
}

impl LookupResponse {
    pub fn found(history: WalletHistory) -> Self {
        Self {
            found: true,
            error: None,
            history: Some(history),
        }
    }

    pub fn not_found(reason: NotFound) -> Self {
        Self::failed(reason.message())
    }

    /// Archive could not be loaded or decoded
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            found: false,
            error: Some(error.into()),
            history: None,
        }
    }
}

impl From<Result<WalletHistory, NotFound>> for LookupResponse {
    fn from(result: Result<WalletHistory, NotFound>) -> Self {
        match result {
            Ok(history) => LookupResponse::found(history),
            Err(reason) => LookupResponse::not_found(reason),
        }
    }
}

#[derive(Debug, Clone)]
pub enum LookupOutcome {
    Completed(LookupResponse),
    /// A newer lookup was issued before this one could commit
    Superseded,
}

/// Trim user input and check it is a base58 encoded 32-byte address
pub fn normalize_address(input: &str) -> Result<String, NotFound> {
    let trimmed = input.trim();
    match bs58::decode(trimmed).into_vec() {
        Ok(bytes) if bytes.len() == 32 => Ok(trimmed.to_string()),
        _ => Err(NotFound::InvalidAddress),
    }
}

pub struct WalletLookupService {
    cache: Arc<ArchiveCache>,
    source: Arc<dyn ArchiveSource>,
    debounce: Duration,
    latest_request: AtomicU64,
}

impl WalletLookupService {
    pub fn new(cache: Arc<ArchiveCache>, source: Arc<dyn ArchiveSource>, debounce: Duration) -> Self {
        Self {
            cache,
            source,
            debounce,
            latest_request: AtomicU64::new(0),
        }
    }

    fn is_current(&self, token: u64) -> bool {
        self.latest_request.load(Ordering::SeqCst) == token
    }

    /// Look up one wallet. Returns `Superseded` if a newer lookup started meanwhile.
    pub async fn lookup(&self, input: &str) -> LookupOutcome {
        let token = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
        }
        if !self.is_current(token) {
            log::debug!("Lookup #{} superseded during debounce", token);
            return LookupOutcome::Superseded;
        }

        let response = match self.cache.get_or_load(self.source.as_ref()).await {
            Ok(archive) => match normalize_address(input) {
                Ok(address) => LookupResponse::from(build_wallet_history(&archive, &address)),
                Err(reason) => LookupResponse::not_found(reason),
            },
            Err(e) => LookupResponse::failed(e.to_string()),
        };

        if !self.is_current(token) {
            log::debug!("Lookup #{} finished after a newer request, dropping result", token);
            return LookupOutcome::Superseded;
        }
        LookupOutcome::Completed(response)
    }
}
