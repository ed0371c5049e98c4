use crate::Amount;
use crate::color::LeafColor;
use crate::model::{Donation, Side};
use crate::popup::DonationDetails;

use super::error::PlacementError;
use super::variant::SlotDescriptor;

/// Picks the colour of a leaf at assignment time.
pub trait LeafPalette {
    fn color_for(&mut self, amount: Amount) -> LeafColor;
}

impl<F: FnMut(Amount) -> LeafColor> LeafPalette for F {
    fn color_for(&mut self, amount: Amount) -> LeafColor {
        self(amount)
    }
}

/// Rendering attributes of a filled slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub donation: Donation,
    pub color: LeafColor,
    pub username_label: String,
    pub amount_label: String,
    pub text_flipped: bool,
}

/// Slot-space anchor of a freshly assigned leaf, before the branch transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalPlacement {
    pub x: f64,
    pub y: f64,
    pub color: LeafColor,
}

/// One of the fifteen fixed leaf positions of a branch.
#[derive(Debug, Clone)]
pub struct LeafSlot {
    index: usize,
    descriptor: SlotDescriptor,
    leaf: Option<Leaf>,
}

impl LeafSlot {
    pub fn new(index: usize, descriptor: SlotDescriptor) -> Self {
        Self {
            index,
            descriptor,
            leaf: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn descriptor(&self) -> &SlotDescriptor {
        &self.descriptor
    }

    pub fn has_donation(&self) -> bool {
        self.leaf.is_some()
    }

    pub fn leaf(&self) -> Option<&Leaf> {
        self.leaf.as_ref()
    }

    /// Popup payload for a filled slot.
    pub fn details(&self) -> Option<DonationDetails> {
        self.leaf
            .as_ref()
            .map(|leaf| DonationDetails::new(&leaf.donation, &leaf.color))
    }

    /// Fill the slot with `donation`.
    ///
    /// Shows the slot's prerequisite sub-branch in `sub_branches` (a no-op if already shown).
    /// A filled slot is left untouched and reports `AlreadyAssigned`.
    pub fn assign(
        &mut self,
        donation: &Donation,
        side: Side,
        palette: &mut impl LeafPalette,
        sub_branches: &mut [bool],
    ) -> Result<LocalPlacement, PlacementError> {
        if self.leaf.is_some() {
            return Err(PlacementError::AlreadyAssigned { slot: self.index });
        }

        if let Some(visible) = self
            .descriptor
            .prerequisite
            .and_then(|p| sub_branches.get_mut(p))
        {
            *visible = true;
        }

        let color = palette.color_for(donation.amount);
        self.leaf = Some(Leaf {
            donation: donation.clone(),
            color,
            username_label: donation.username.clone(),
            amount_label: donation.amount.label(),
            text_flipped: self.descriptor.flip.applies(side),
        });

        Ok(LocalPlacement {
            x: self.descriptor.x,
            y: self.descriptor.y,
            color,
        })
    }
}
