//! Durable record of where each donation's leaf ended up.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, warn};

use crate::model::LeafPlacement;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("placement store unavailable: {0}")]
    Unavailable(String),
}

/// Keyed by donation id; `upsert` overwrites.
pub trait PlacementStore {
    fn upsert(&self, placement: &LeafPlacement) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get(&self, donation_id: &str) -> impl Future<Output = Result<Option<LeafPlacement>, StoreError>> + Send;
}

/// In-process store. Clones share the same map, so readers can look up placements while the
/// scheduler writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryPlacementStore {
    placements: Arc<RwLock<HashMap<String, LeafPlacement>>>,
}

impl MemoryPlacementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.placements.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.placements.read().await.is_empty()
    }
}

impl PlacementStore for MemoryPlacementStore {
    async fn upsert(&self, placement: &LeafPlacement) -> Result<(), StoreError> {
        self.placements
            .write()
            .await
            .insert(placement.donation_id.clone(), placement.clone());
        Ok(())
    }

    async fn get(&self, donation_id: &str) -> Result<Option<LeafPlacement>, StoreError> {
        Ok(self.placements.read().await.get(donation_id).cloned())
    }
}

/// Write `placement`, retrying up to `retries` more times with doubling delays.
///
/// Returns the last error once attempts are exhausted; the caller keeps the leaf on screen
/// either way.
pub async fn persist_with_retry<S: PlacementStore>(
    store: &S,
    placement: &LeafPlacement,
    retries: u32,
    backoff: Duration,
) -> Result<(), StoreError> {
    let mut attempt = 0;
    loop {
        match store.upsert(placement).await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < retries => {
                let delay = backoff.saturating_mul(1 << attempt.min(16));
                warn!(
                    donation = %placement.donation_id,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    reason = %e,
                    "placement write failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                error!(
                    donation = %placement.donation_id,
                    attempts = attempt + 1,
                    reason = %e,
                    "placement write abandoned"
                );
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    /// Store that fails the first `failures` writes, then delegates to memory.
    #[derive(Debug, Clone, Default)]
    pub struct FlakyStore {
        pub inner: MemoryPlacementStore,
        pub failures: Arc<AtomicU32>,
        pub attempts: Arc<AtomicU32>,
    }

    impl FlakyStore {
        pub fn failing(failures: u32) -> Self {
            let store = Self::default();
            store.failures.store(failures, Ordering::SeqCst);
            store
        }

        pub fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    impl PlacementStore for FlakyStore {
        async fn upsert(&self, placement: &LeafPlacement) -> Result<(), StoreError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(StoreError::Unavailable("connection reset".to_string()));
            }
            self.inner.upsert(placement).await
        }

        async fn get(&self, donation_id: &str) -> Result<Option<LeafPlacement>, StoreError> {
            self.inner.get(donation_id).await
        }
    }
}
