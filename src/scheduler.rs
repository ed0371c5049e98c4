//! Placement scheduler.
//!
//! Folds the ordered donation stream into the tree one donation at a time: place, hand new
//! scene nodes to the renderer, then persist the placement. The leaf stays on the tree even if
//! the store write is abandoned.

use std::time::Duration;

use rand::Rng;
use rand::rngs::StdRng;
use tokio_stream::{Stream, StreamExt};
use tracing::{error, info};

use crate::model::{Donation, LeafPlacement};
use crate::scene::{SceneLog, SceneSink};
use crate::search::DonationDirectory;
use crate::stats::DonationStats;
use crate::store::{PlacementStore, StoreError, persist_with_retry};
use crate::tree::Tree;

/// Outcome counters for a scheduler run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerReport {
    /// Donations that got a leaf.
    pub placed: usize,
    /// Placements whose store write was abandoned after retries.
    pub failed_writes: usize,
    /// Donations the tree refused (invariant violations).
    pub rejected: usize,
}

pub struct Scheduler<S, K = SceneLog, R = StdRng> {
    tree: Tree<R>,
    store: S,
    scene: K,
    directory: DonationDirectory,
    stats: DonationStats,
    report: SchedulerReport,
    write_retries: u32,
    write_backoff: Duration,
}

/// Public API
impl<S: PlacementStore, K: SceneSink, R: Rng> Scheduler<S, K, R> {
    /// Wrap `tree`; the trunk base goes to `scene` right away.
    pub fn new(tree: Tree<R>, store: S, mut scene: K) -> Self {
        scene.insert(tree.base_node());
        Self {
            write_retries: tree.config().write_retries,
            write_backoff: tree.config().write_backoff(),
            tree,
            store,
            scene,
            directory: DonationDirectory::new(),
            stats: DonationStats::default(),
            report: SchedulerReport::default(),
        }
    }

    /// Place every donation of `stream`, in order, until it ends.
    pub async fn run(&mut self, mut stream: impl Stream<Item = Donation> + Unpin) {
        while let Some(donation) = stream.next().await {
            // a failed donation must not stop the tree, the outcome is logged and counted
            let _ = self.place(donation).await;
        }
        info!(
            placed = self.report.placed,
            failed_writes = self.report.failed_writes,
            rejected = self.report.rejected,
            "donation stream ended"
        );
    }

    /// Place one donation and persist its leaf.
    ///
    /// Returns `None` only when the tree refused the donation.
    pub async fn place(&mut self, donation: Donation) -> Option<LeafPlacement> {
        let growth = match self.tree.place(&donation) {
            Ok(growth) => growth,
            Err(e) => {
                error!(donation = %donation.id, reason = %e, "donation skipped");
                self.report.rejected += 1;
                return None;
            }
        };

        for node in growth.nodes {
            self.scene.insert(node);
        }
        self.stats.record(&donation);
        self.directory.record(donation).await;
        self.report.placed += 1;

        let written = persist_with_retry(
            &self.store,
            &growth.placement,
            self.write_retries,
            self.write_backoff,
        )
        .await;
        if written.is_err() {
            self.report.failed_writes += 1;
        }

        Some(growth.placement)
    }

    /// Stored placements of every donation by `username`.
    pub async fn find_donations(
        &self,
        username: &str,
    ) -> Result<Vec<(Donation, LeafPlacement)>, StoreError> {
        self.directory.locate(&self.store, username).await
    }

    pub fn tree(&self) -> &Tree<R> {
        &self.tree
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn scene(&self) -> &K {
        &self.scene
    }

    /// Shared handle for searches running alongside the scheduler.
    pub fn directory(&self) -> DonationDirectory {
        self.directory.clone()
    }

    pub fn stats(&self) -> &DonationStats {
        &self.stats
    }

    pub fn report(&self) -> &SchedulerReport {
        &self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Amount;
    use crate::clock::FixedClock;
    use crate::config::TreeConfig;
    use crate::feed::{ChannelFeed, ordered_donations};
    use crate::model::fixtures::donation;
    use crate::store::MemoryPlacementStore;
    use crate::store::testing::FlakyStore;
    use chrono::{TimeZone, Utc};
    use rand::SeedableRng;

    // test utils

    fn config() -> TreeConfig {
        TreeConfig {
            write_backoff_ms: 0,
            ..TreeConfig::default()
        }
    }

    fn tree(config: TreeConfig) -> Tree {
        let clock = FixedClock(Utc.with_ymd_and_hms(2025, 8, 20, 9, 0, 0).unwrap());
        Tree::new(config, StdRng::seed_from_u64(5), clock)
    }

    fn scheduler<S: PlacementStore>(store: S) -> Scheduler<S> {
        Scheduler::new(tree(config()), store, SceneLog::default())
    }

    fn batch(count: usize) -> Vec<Donation> {
        (0..count).map(|i| donation(&format!("d{i}"), 10.0)).collect()
    }

    #[tokio::test]
    async fn new_scheduler_renders_trunk_base() {
        let scheduler = scheduler(MemoryPlacementStore::new());
        assert_eq!(scheduler.scene().nodes().len(), 1);
        assert_eq!(scheduler.scene().branch_count(), 0);
    }

    #[tokio::test]
    async fn backlog_replay_of_sixteen() {
        let store = FlakyStore::failing(0);
        let mut scheduler = scheduler(store.clone());
        scheduler.run(tokio_stream::iter(batch(16))).await;

        let branches = scheduler.tree().branches();
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0].filled_count(), 15);
        assert_eq!(branches[1].filled_count(), 1);
        assert_eq!(branches[1].slots()[0].leaf().unwrap().donation.id, "d15");

        // one write per donation, every id present
        assert_eq!(store.attempts(), 16);
        assert_eq!(store.inner.len().await, 16);
        for i in 0..16 {
            assert!(store.get(&format!("d{i}")).await.unwrap().is_some());
        }
        assert_eq!(scheduler.scene().branch_count(), 2);
    }

    #[tokio::test]
    async fn live_insert_after_empty_backlog() {
        let store = MemoryPlacementStore::new();
        let mut scheduler = scheduler(store.clone());
        let (mut feed, handle) = ChannelFeed::new(Vec::new());
        let stream = ordered_donations(&mut feed).await.unwrap();

        let producer = tokio::spawn(async move {
            handle.insert(donation("d0", 25.0)).await.unwrap();
        });
        scheduler.run(stream).await;
        producer.await.unwrap();

        assert_eq!(scheduler.tree().branches().len(), 1);
        assert_eq!(scheduler.tree().branches()[0].filled_count(), 1);
        assert!(store.get("d0").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn backlog_then_live_keeps_arrival_order() {
        let mut scheduler = scheduler(MemoryPlacementStore::new());
        let (mut feed, handle) = ChannelFeed::new(batch(3));
        handle.insert(donation("live", 1.0)).await.unwrap();
        drop(handle);

        scheduler.run(ordered_donations(&mut feed).await.unwrap()).await;

        let ids: Vec<String> = scheduler
            .tree()
            .branches()[0]
            .slots()
            .iter()
            .filter_map(|s| s.leaf().map(|l| l.donation.id.clone()))
            .collect();
        assert_eq!(ids, vec!["d0", "d1", "d2", "live"]);
    }

    #[tokio::test]
    async fn stored_placement_matches_returned_one() {
        let store = MemoryPlacementStore::new();
        let mut scheduler = scheduler(store.clone());
        let placement = scheduler.place(donation("d0", 60.0)).await.unwrap();

        assert_eq!(store.get("d0").await.unwrap(), Some(placement.clone()));
        assert_eq!(placement.brightness, 1.25);
    }

    #[tokio::test]
    async fn failed_write_keeps_leaf_on_tree() {
        let config = TreeConfig {
            write_retries: 1,
            write_backoff_ms: 0,
            ..TreeConfig::default()
        };
        let store = FlakyStore::failing(2);
        let mut scheduler = Scheduler::new(tree(config), store.clone(), SceneLog::default());

        let placement = scheduler.place(donation("d0", 5.0)).await;
        assert!(placement.is_some());
        assert_eq!(scheduler.tree().branches()[0].filled_count(), 1);
        assert_eq!(scheduler.report().failed_writes, 1);
        assert!(store.get("d0").await.unwrap().is_none());

        // the store recovered; later donations persist again
        scheduler.place(donation("d1", 5.0)).await;
        assert!(store.get("d1").await.unwrap().is_some());
        assert_eq!(scheduler.report().placed, 2);
    }

    #[tokio::test]
    async fn transient_write_failure_is_retried() {
        let store = FlakyStore::failing(2);
        let mut scheduler = scheduler(store.clone());
        scheduler.place(donation("d0", 5.0)).await;

        assert_eq!(store.attempts(), 3);
        assert!(store.get("d0").await.unwrap().is_some());
        assert_eq!(scheduler.report().failed_writes, 0);
    }

    #[tokio::test]
    async fn find_donations_by_username() {
        let mut scheduler = scheduler(MemoryPlacementStore::new());
        let mut mine = donation("mine", 42.0);
        mine.username = "Ceres Fan".to_string();
        scheduler.run(tokio_stream::iter(vec![donation("a", 1.0), mine, donation("b", 1.0)])).await;

        let found = scheduler.find_donations("ceres fan").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0.id, "mine");
        assert_eq!(found[0].1.donation_id, "mine");
        assert!(scheduler.find_donations("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn directory_handle_sees_later_placements() {
        let mut scheduler = scheduler(MemoryPlacementStore::new());
        let directory = scheduler.directory();
        scheduler.place(donation("d0", 1.0)).await;
        assert_eq!(directory.len().await, 1);
    }

    #[tokio::test]
    async fn stats_follow_placements() {
        let mut scheduler = scheduler(MemoryPlacementStore::new());
        scheduler.run(tokio_stream::iter(vec![donation("a", 5.0), donation("b", 100.0)])).await;

        let stats = scheduler.stats();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.total_raised, Amount::units(105));
        assert_eq!(stats.largest, Some(Amount::units(100)));
    }

    #[tokio::test]
    async fn extreme_negative_amount_gets_base_leaf() {
        let mut scheduler = scheduler(MemoryPlacementStore::new());
        let placement = scheduler.place(donation("neg", -1e20)).await.unwrap();

        assert_eq!(placement.brightness, 1.0);
        let leaf = scheduler.tree().branches()[0].slots()[0].leaf().unwrap();
        assert!(leaf.amount_label.starts_with("$-"));
    }

    #[tokio::test]
    async fn huge_donations_saturate_total_raised() {
        let mut scheduler = scheduler(MemoryPlacementStore::new());
        scheduler.place(donation("a", 1e15)).await;
        scheduler.place(donation("b", 1e15)).await;

        assert_eq!(scheduler.report().placed, 2);
        assert_eq!(scheduler.stats().total_raised, Amount::from_scaled(i64::MAX));
        assert_eq!(scheduler.stats().largest, Some(Amount::from_float(1e15)));
    }

    #[tokio::test]
    async fn trunk_segments_reach_scene() {
        let mut scheduler = scheduler(MemoryPlacementStore::new());
        scheduler.run(tokio_stream::iter(batch(15 * 6))).await;

        assert_eq!(
            scheduler.scene().trunk_segment_count(),
            scheduler.tree().trunk().segments().len()
        );
        assert_eq!(scheduler.scene().branch_count(), 6);
    }
}
