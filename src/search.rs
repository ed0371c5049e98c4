//! "Find my donation": look up placed leaves by donor name.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::model::{Donation, LeafPlacement};
use crate::store::{PlacementStore, StoreError};

#[derive(Debug, Default)]
struct Entries {
    donations: Vec<Donation>,
    by_username: HashMap<String, Vec<usize>>,
}

/// Every placed donation, in placement order, indexed by username.
///
/// Clones share the same entries so a search can run while the scheduler keeps placing.
#[derive(Debug, Clone, Default)]
pub struct DonationDirectory {
    entries: Arc<RwLock<Entries>>,
}

/// Usernames match ignoring case and surrounding whitespace.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

impl DonationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, donation: Donation) {
        let mut entries = self.entries.write().await;
        let index = entries.donations.len();
        entries
            .by_username
            .entry(normalize_username(&donation.username))
            .or_default()
            .push(index);
        entries.donations.push(donation);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.donations.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.donations.is_empty()
    }

    /// All donations in placement order.
    pub async fn donations(&self) -> Vec<Donation> {
        self.entries.read().await.donations.clone()
    }

    pub async fn find(&self, username: &str) -> Vec<Donation> {
        let entries = self.entries.read().await;
        entries
            .by_username
            .get(&normalize_username(username))
            .map(|indices| indices.iter().map(|&i| entries.donations[i].clone()).collect())
            .unwrap_or_default()
    }

    /// Donations by `username` together with their stored placement.
    ///
    /// Donations whose placement never reached the store are left out.
    pub async fn locate<S: PlacementStore>(
        &self,
        store: &S,
        username: &str,
    ) -> Result<Vec<(Donation, LeafPlacement)>, StoreError> {
        let mut found = Vec::new();
        for donation in self.find(username).await {
            if let Some(placement) = store.get(&donation.id).await? {
                found.push((donation, placement));
            }
        }
        Ok(found)
    }
}
