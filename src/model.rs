//! Core domain types shared by the tree, the feed and the placement store.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::Amount;

/// Stable external donation identifier.
pub type DonationId = String;

/// One accepted contribution, as delivered by the donation feed.
///
/// Never mutated once received; arrival order is the only ordering the tree cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct Donation {
    pub id: DonationId,
    pub username: String,
    pub message: String,
    pub amount: Amount,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Which side of the trunk a branch grows on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Left,
    Right,
}

impl Side {
    pub fn flipped(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// 24-bit RGB leaf tint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tint(pub u32);

impl fmt::Display for Tint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06X}", self.0 & 0x00FF_FFFF)
    }
}

/// Persisted result of placing one donation: world-space anchor plus colour.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafPlacement {
    pub donation_id: DonationId,
    pub x: f64,
    pub y: f64,
    pub tint: Tint,
    pub brightness: f64,
}
