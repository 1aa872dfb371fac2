// src/archive/cache.rs
//! Session-wide archive cache.
//!
//! The archive is loaded at most once and then kept for the life of the
//! cache; there is no invalidation. Concurrent callers queue behind the
//! in-flight load instead of starting their own.

use std::sync::{Arc, Mutex};

use super::client::ArchiveSource;
use super::types::EventArchive;
use crate::error::ArchiveError;

/// Lifecycle of the cached archive
#[derive(Debug, Clone)]
pub enum CacheState {
    Empty,
    Loading,
    Ready(Arc<EventArchive>),
    Failed(ArchiveError),
}

impl CacheState {
    pub fn label(&self) -> &'static str {
        match self {
            CacheState::Empty => "empty",
            CacheState::Loading => "loading",
            CacheState::Ready(_) => "ready",
            CacheState::Failed(_) => "error",
        }
    }
}

pub struct ArchiveCache {
    state: Mutex<CacheState>,
    // Serializes loads; held across the await of the source
    load_lock: tokio::sync::Mutex<()>,
}

impl Default for ArchiveCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveCache {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CacheState::Empty),
            load_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Cache that starts out ready, for callers that already hold a decoded archive
    pub fn with_archive(archive: EventArchive) -> Self {
        Self {
            state: Mutex::new(CacheState::Ready(Arc::new(archive))),
            load_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Snapshot of the current lifecycle state
    pub fn state(&self) -> CacheState {
        match self.state.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_state(&self, next: CacheState) {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = next;
    }

    fn ready(&self) -> Option<Arc<EventArchive>> {
        match self.state() {
            CacheState::Ready(archive) => Some(archive),
            _ => None,
        }
    }

    /// Return the cached archive, loading it from `source` first if needed.
    ///
    /// A failed load is reported to this caller only; the next call starts a
    /// fresh attempt. Nothing retries inside a single call.
    pub async fn get_or_load(&self, source: &dyn ArchiveSource) -> Result<Arc<EventArchive>, ArchiveError> {
        if let Some(archive) = self.ready() {
            return Ok(archive);
        }

        let _guard = self.load_lock.lock().await;
        // Someone else may have finished while we waited
        if let Some(archive) = self.ready() {
            return Ok(archive);
        }

        self.set_state(CacheState::Loading);
        log::info!("Loading staking archive from {}", source.describe());

        match source.load().await {
            Ok(archive) => {
                let archive = Arc::new(archive);
                self.set_state(CacheState::Ready(archive.clone()));
                Ok(archive)
            }
            Err(e) => {
                log::error!("Failed to load staking archive: {}", e);
                self.set_state(CacheState::Failed(e.clone()));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        loads: AtomicUsize,
        fail_first: bool,
    }

    #[async_trait]
    impl ArchiveSource for CountingSource {
        async fn load(&self) -> Result<EventArchive, ArchiveError> {
            let n = self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.fail_first && n == 0 {
                return Err(ArchiveError::Status(503));
            }
            Ok(EventArchive::default())
        }

        fn describe(&self) -> String {
            "memory".to_string()
        }
    }

    #[tokio::test]
    async fn test_loads_once() {
        let cache = Arc::new(ArchiveCache::new());
        let source = Arc::new(CountingSource {
            loads: AtomicUsize::new(0),
            fail_first: false,
        });
        assert_eq!(cache.state().label(), "empty");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let source = source.clone();
            handles.push(tokio::spawn(async move {
                cache.get_or_load(source.as_ref()).await.map(|_| ())
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.state().label(), "ready");
    }

    #[tokio::test]
    async fn test_failure_is_reported_then_next_call_reloads() {
        let cache = ArchiveCache::new();
        let source = CountingSource {
            loads: AtomicUsize::new(0),
            fail_first: true,
        };

        let err = cache.get_or_load(&source).await.unwrap_err();
        assert_eq!(err, ArchiveError::Status(503));
        assert!(matches!(cache.state(), CacheState::Failed(ArchiveError::Status(503))));

        cache.get_or_load(&source).await.unwrap();
        assert_eq!(source.loads.load(Ordering::SeqCst), 2);
        assert_eq!(cache.state().label(), "ready");
    }

    #[tokio::test]
    async fn test_preloaded_cache_skips_source() {
        let cache = ArchiveCache::with_archive(EventArchive::default());
        let source = CountingSource {
            loads: AtomicUsize::new(0),
            fail_first: false,
        };
        cache.get_or_load(&source).await.unwrap();
        assert_eq!(source.loads.load(Ordering::SeqCst), 0);
    }
}
