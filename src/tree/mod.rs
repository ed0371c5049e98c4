//! Tree growth engine.
//!
//! The tree turns an ordered sequence of donations into leaf placements. Donations fill the
//! current branch slot by slot; when it is full a new branch is grown on the opposite side of
//! the trunk, one step above the previous branch on that side, and the trunk is extended so it
//! always reaches past the highest branch. Already placed leaves never move.

use kurbo::Point;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::Amount;
use crate::clock::{Clock, SystemClock};
use crate::color::ColorResolver;
use crate::config::TreeConfig;
use crate::model::{Donation, LeafPlacement, Side};
use crate::scene::SceneNode;

mod branch;
pub use branch::Branch;

mod error;
pub use error::PlacementError;

mod leaf;
pub use leaf::{Leaf, LeafPalette, LeafSlot, LocalPlacement};

mod trunk;
pub use trunk::{TrunkSegment, TrunkStack, TrunkTexture};

pub mod variant;
use variant::{BranchVariant, VARIANTS};

/// Extent of a branch along the trunk, used to space branches on one side.
///
/// Branches are authored upright and rendered rotated close to 90 degrees, so their sprite
/// *width* is what ends up running along the trunk.
pub fn branch_footprint_along_trunk_axis(variant: &BranchVariant, scale: f64) -> f64 {
    variant.width * scale
}

/// Result of placing one donation.
#[derive(Debug, Clone, PartialEq)]
pub struct Growth {
    pub placement: LeafPlacement,
    /// Scene nodes created by this placement (new trunk pieces, then the new branch).
    pub nodes: Vec<SceneNode>,
}

/// Placement state machine: branches, trunk, and the per-side growth cursors.
pub struct Tree<R = StdRng> {
    config: TreeConfig,
    colors: ColorResolver,
    clock: Box<dyn Clock>,
    rng: R,
    branches: Vec<Branch>,
    /// Side of the next branch to be created.
    next_side: Side,
    left_elevation: f64,
    right_elevation: f64,
    trunk: TrunkStack,
}

impl Tree<StdRng> {
    /// Tree on the wall clock, seeded from `config.seed` or from OS entropy.
    pub fn from_config(config: TreeConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Tree::new(config, rng, SystemClock)
    }
}

/// Public API
impl<R: Rng> Tree<R> {
    pub fn new(config: TreeConfig, rng: R, clock: impl Clock + 'static) -> Self {
        let first_elevation = config.ground_y - config.first_branch_rise;
        Self {
            colors: ColorResolver::new(config.festive_day),
            clock: Box::new(clock),
            rng,
            branches: Vec::new(),
            next_side: config.initial_side,
            left_elevation: first_elevation,
            right_elevation: first_elevation,
            trunk: TrunkStack::new(config.trunk_base_top(), config.trunk_textures.clone()),
            config,
        }
    }

    /// Scene node for the fixed trunk base.
    pub fn base_node(&self) -> SceneNode {
        SceneNode::TrunkBase {
            x: self.config.trunk_center_x,
            bottom_y: self.config.ground_y,
            height: self.config.trunk_base_height,
        }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    /// The branch currently accepting leaves, if any.
    pub fn current_branch(&self) -> Option<&Branch> {
        self.branches.last().filter(|b| !b.is_full())
    }

    pub fn next_side(&self) -> Side {
        self.next_side
    }

    /// Running y where the next branch on `side` attaches.
    pub fn elevation(&self, side: Side) -> f64 {
        match side {
            Side::Left => self.left_elevation,
            Side::Right => self.right_elevation,
        }
    }

    pub fn trunk(&self) -> &TrunkStack {
        &self.trunk
    }

    /// Place one donation on the tree, growing a branch (and trunk) first if needed.
    pub fn place(&mut self, donation: &Donation) -> Result<Growth, PlacementError> {
        let mut nodes = Vec::new();
        let index = match self.branches.last() {
            Some(branch) if !branch.is_full() => self.branches.len() - 1,
            _ => self.grow_branch(&mut nodes),
        };

        let now = self.clock.now();
        let colors = &self.colors;
        let rng = &mut self.rng;
        let mut palette = |amount: Amount| colors.resolve(amount, now, rng);

        let branch = &mut self.branches[index];
        let placement = branch.assign_next(donation, &mut palette)?;

        info!(
            donation = %donation.id,
            branch = index,
            slot = branch.filled_count() - 1,
            x = placement.x,
            y = placement.y,
            tint = %placement.tint,
            "leaf placed"
        );

        Ok(Growth { placement, nodes })
    }
}

/// Private API
impl<R: Rng> Tree<R> {
    fn elevation_mut(&mut self, side: Side) -> &mut f64 {
        match side {
            Side::Left => &mut self.left_elevation,
            Side::Right => &mut self.right_elevation,
        }
    }

    /// Create the next branch:
    /// - Pick a variant at random
    /// - Extend the trunk past the branch footprint at the side's elevation
    /// - Anchor on the trunk with jittered height and angle
    /// - Advance the side's elevation, then switch sides for the next branch
    fn grow_branch(&mut self, nodes: &mut Vec<SceneNode>) -> usize {
        let variant = &VARIANTS[self.rng.gen_range(0..VARIANTS.len())];
        let side = self.next_side;
        let scale = self.config.branch_scale;
        let footprint = branch_footprint_along_trunk_axis(variant, scale);
        let elevation = self.elevation(side);
        let x = self.config.trunk_center_x;

        let grown = self
            .trunk
            .grow_if_needed(elevation - footprint - self.config.trunk_margin)
            .to_vec();
        for segment in grown {
            debug!(index = segment.index, top = segment.top, "trunk grown");
            nodes.push(SceneNode::TrunkSegment {
                index: segment.index,
                texture: self.trunk.texture(segment.texture).name.clone(),
                x,
                bottom_y: segment.bottom,
                height: segment.bottom - segment.top,
            });
        }

        let y = elevation + jitter(&mut self.rng, self.config.elevation_jitter);
        let angle_deg = self.config.base_angle(side) + jitter(&mut self.rng, self.config.angle_jitter_deg);
        let extra = jitter(&mut self.rng, self.config.extra_spacing_max / 2.0) + self.config.extra_spacing_max / 2.0;
        *self.elevation_mut(side) -= footprint + self.config.branch_spacing + extra;
        self.next_side = side.flipped();

        let index = self.branches.len();
        self.branches
            .push(Branch::new(index, variant, side, Point::new(x, y), angle_deg, scale));
        nodes.push(SceneNode::Branch {
            index,
            variant: variant.name,
            x,
            y,
            angle_deg,
            scale,
            side,
        });

        debug!(index, variant = variant.name, ?side, y, angle_deg, "branch grown");
        index
    }
}

/// Uniform draw in `[-amplitude, amplitude]`; no draw for a non-positive amplitude.
fn jitter<R: Rng>(rng: &mut R, amplitude: f64) -> f64 {
    if amplitude > 0.0 {
        rng.gen_range(-amplitude..=amplitude)
    } else {
        0.0
    }
}
