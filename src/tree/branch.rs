use kurbo::{Affine, Point};

use crate::model::{Donation, LeafPlacement, Side};

use super::error::PlacementError;
use super::leaf::{LeafPalette, LeafSlot};
use super::variant::{BranchVariant, CAPACITY};

/// Fixed-capacity group of leaf slots, filled strictly in slot order.
#[derive(Debug, Clone)]
pub struct Branch {
    index: usize,
    variant: &'static BranchVariant,
    side: Side,
    origin: Point,
    angle_deg: f64,
    scale: f64,
    slots: Vec<LeafSlot>,
    sub_branch_visible: Vec<bool>,
    filled: usize,
}

impl Branch {
    pub fn new(
        index: usize,
        variant: &'static BranchVariant,
        side: Side,
        origin: Point,
        angle_deg: f64,
        scale: f64,
    ) -> Self {
        Self {
            index,
            variant,
            side,
            origin,
            angle_deg,
            scale,
            slots: variant
                .slots
                .iter()
                .enumerate()
                .map(|(i, d)| LeafSlot::new(i, *d))
                .collect(),
            sub_branch_visible: variant
                .sub_branches
                .iter()
                .map(|s| s.initially_visible)
                .collect(),
            filled: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        CAPACITY
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn variant(&self) -> &'static BranchVariant {
        self.variant
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn angle_deg(&self) -> f64 {
        self.angle_deg
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn filled_count(&self) -> usize {
        self.filled
    }

    pub fn is_full(&self) -> bool {
        self.filled >= CAPACITY
    }

    pub fn slots(&self) -> &[LeafSlot] {
        &self.slots
    }

    pub fn sub_branch_visible(&self, index: usize) -> Option<bool> {
        self.sub_branch_visible.get(index).copied()
    }

    /// Branch-local to world transform: translate to the trunk anchor, rotate, then scale.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.origin.to_vec2())
            * Affine::rotate(self.angle_deg.to_radians())
            * Affine::scale(self.scale)
    }

    /// Put `donation` on the next empty slot and return its world-space placement.
    pub fn assign_next(
        &mut self,
        donation: &Donation,
        palette: &mut impl LeafPalette,
    ) -> Result<LeafPlacement, PlacementError> {
        if self.is_full() {
            return Err(PlacementError::BranchFull { capacity: CAPACITY });
        }

        let local = self.slots[self.filled].assign(
            donation,
            self.side,
            palette,
            &mut self.sub_branch_visible,
        )?;
        self.filled += 1;

        let world = self.transform() * Point::new(local.x, local.y);
        Ok(LeafPlacement {
            donation_id: donation.id.clone(),
            x: world.x,
            y: world.y,
            tint: local.color.tint,
            brightness: local.color.brightness,
        })
    }
}
