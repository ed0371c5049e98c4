//! Donation sources.
//!
//! A feed hands over a backlog once and then streams live inserts. [`ordered_donations`]
//! stitches both into the single ordered sequence the scheduler folds over.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use crate::Donation;
use crate::csv::{CsvError, read_donations};

/// Buffered live inserts before `InsertHandle::insert` waits.
const INSERT_BUFFER: usize = 64;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Csv(#[from] CsvError),

    #[error("donation feed closed")]
    Closed,
}

/// Live inserts; dropping the stream unsubscribes.
pub type InsertStream = ReceiverStream<Donation>;

/// Backlog then live inserts, as one stream.
pub type DonationStream = Pin<Box<dyn Stream<Item = Donation> + Send>>;

pub trait DonationFeed {
    /// Backlog in delivery order.
    fn fetch_initial_batch(&mut self) -> impl Future<Output = Result<Vec<Donation>, FeedError>> + Send;

    /// Donations inserted from now on. Each donation must appear exactly once across the
    /// backlog and this stream.
    fn subscribe_inserts(&mut self) -> InsertStream;
}

/// Backlog followed by live inserts.
///
/// Subscribes before fetching so nothing inserted during the fetch is lost.
pub async fn ordered_donations<F: DonationFeed>(
    feed: &mut F,
) -> Result<DonationStream, FeedError> {
    let live = feed.subscribe_inserts();
    let backlog = feed.fetch_initial_batch().await?;
    info!(count = backlog.len(), "donation backlog fetched");
    Ok(Box::pin(tokio_stream::iter(backlog).chain(live)))
}

/// Sender side of a [`ChannelFeed`].
#[derive(Debug, Clone)]
pub struct InsertHandle {
    sender: mpsc::Sender<Donation>,
}

impl InsertHandle {
    pub async fn insert(&self, donation: Donation) -> Result<(), FeedError> {
        self.sender.send(donation).await.map_err(|_| FeedError::Closed)
    }
}

/// In-memory feed: a fixed backlog plus whatever is sent through its [`InsertHandle`]s.
///
/// The live stream ends once every handle is dropped.
#[derive(Debug)]
pub struct ChannelFeed {
    backlog: Vec<Donation>,
    receiver: Option<mpsc::Receiver<Donation>>,
}

impl ChannelFeed {
    pub fn new(backlog: Vec<Donation>) -> (Self, InsertHandle) {
        let (sender, receiver) = mpsc::channel(INSERT_BUFFER);
        let feed = Self {
            backlog,
            receiver: Some(receiver),
        };
        (feed, InsertHandle { sender })
    }
}

impl DonationFeed for ChannelFeed {
    async fn fetch_initial_batch(&mut self) -> Result<Vec<Donation>, FeedError> {
        Ok(std::mem::take(&mut self.backlog))
    }

    fn subscribe_inserts(&mut self) -> InsertStream {
        match self.receiver.take() {
            Some(receiver) => ReceiverStream::new(receiver),
            None => closed_stream(),
        }
    }
}

/// Feed whose backlog is a csv export and which has no live inserts.
///
/// Malformed rows are logged and skipped.
#[derive(Debug, Clone)]
pub struct CsvFeed {
    path: PathBuf,
}

impl CsvFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DonationFeed for CsvFeed {
    async fn fetch_initial_batch(&mut self) -> Result<Vec<Donation>, FeedError> {
        let mut backlog = Vec::new();
        for result in read_donations(&self.path)? {
            match result {
                Ok(donation) => backlog.push(donation),
                Err(e) => warn!("{e}"),
            }
        }
        Ok(backlog)
    }

    fn subscribe_inserts(&mut self) -> InsertStream {
        closed_stream()
    }
}

fn closed_stream() -> InsertStream {
    let (_, receiver) = mpsc::channel(1);
    ReceiverStream::new(receiver)
}
