use std::env;
use std::io;
use std::process::ExitCode;

use donation_tree::config::TreeConfig;
use donation_tree::csv::write_placements;
use donation_tree::feed::{CsvFeed, ordered_donations};
use donation_tree::scene::SceneLog;
use donation_tree::store::{MemoryPlacementStore, PlacementStore};
use donation_tree::{Scheduler, Tree};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        error!("usage: donation-tree <donations.csv> [config.json]");
        return ExitCode::FAILURE;
    };

    if !path.ends_with(".csv") {
        warn!(path, "input file seems to not be a csv file");
    }

    let config = match args.next().map(TreeConfig::load).transpose() {
        Ok(config) => config.unwrap_or_default().with_env_seed(),
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let store = MemoryPlacementStore::new();
    let mut scheduler = Scheduler::new(Tree::from_config(config), store.clone(), SceneLog::default());

    let mut feed = CsvFeed::new(&path);
    let stream = match ordered_donations(&mut feed).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    scheduler.run(stream).await;

    let mut placements = Vec::new();
    for donation in scheduler.directory().donations().await {
        match store.get(&donation.id).await {
            Ok(Some(placement)) => placements.push(placement),
            Ok(None) => warn!(donation = %donation.id, "placement missing from store"),
            Err(e) => warn!(donation = %donation.id, "{e}"),
        }
    }

    if let Err(e) = write_placements(io::stdout().lock(), &placements) {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    let stats = scheduler.stats();
    info!(
        donations = stats.count,
        total_raised = %stats.total_raised,
        largest = ?stats.largest.map(|a| a.to_string()),
        branches = scheduler.tree().branches().len(),
        trunk_segments = scheduler.tree().trunk().segments().len(),
        "tree grown"
    );

    ExitCode::SUCCESS
}
