pub mod amount;
pub mod clock;
pub mod color;
pub mod config;
pub mod csv;
pub mod feed;
pub mod model;
pub mod popup;
pub mod scene;
pub mod scheduler;
pub mod search;
pub mod stats;
pub mod store;
pub mod tree;

pub use amount::Amount;
pub use config::TreeConfig;
pub use model::{Donation, DonationId, LeafPlacement, Side, Tint};
pub use scheduler::Scheduler;
pub use tree::Tree;
