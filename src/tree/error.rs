//! Error types for leaf placement.

use thiserror::Error;

/// Invariant violations raised by [`LeafSlot`](super::LeafSlot) and [`Branch`](super::Branch).
///
/// The tree itself never triggers these; seeing one means a donation was delivered twice or a
/// caller bypassed the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("leaf slot {slot} already holds a donation")]
    AlreadyAssigned { slot: usize },

    #[error("branch is full ({capacity} leaves)")]
    BranchFull { capacity: usize },
}
