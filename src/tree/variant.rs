//! Hand-authored branch layouts.
//!
//! Every variant has the same capacity and assignment rules; they only differ in where the
//! fifteen leaves sit, how each leaf is angled, and which connecting sub-branch sprite must be
//! shown before a leaf makes sense visually. Coordinates are in the branch's unscaled local
//! space, with the branch growing towards negative y from its root at the origin.

use crate::model::Side;

/// Leaves per branch.
pub const CAPACITY: usize = 15;

/// When a leaf's username/amount labels are drawn flipped.
///
/// Keyed statically by slot and trunk side: a leaf whose final on-screen angle would render
/// its text upside down is flipped on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFlip {
    Never,
    OnLeft,
    OnRight,
    Always,
}

impl TextFlip {
    pub fn applies(self, side: Side) -> bool {
        match self {
            TextFlip::Never => false,
            TextFlip::Always => true,
            TextFlip::OnLeft => side == Side::Left,
            TextFlip::OnRight => side == Side::Right,
        }
    }
}

/// Fixed placement of one leaf slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotDescriptor {
    pub x: f64,
    pub y: f64,
    pub angle_deg: f64,
    pub flip: TextFlip,
    /// Index into [`BranchVariant::sub_branches`].
    pub prerequisite: Option<usize>,
}

/// Connecting sprite between the main branch and a group of leaves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubBranchDescriptor {
    pub texture: &'static str,
    pub x: f64,
    pub y: f64,
    pub angle_deg: f64,
    pub initially_visible: bool,
}

#[derive(Debug, PartialEq)]
pub struct BranchVariant {
    pub name: &'static str,
    /// Unscaled sprite width, used as the branch's extent along the trunk once rotated.
    pub width: f64,
    pub height: f64,
    pub slots: [SlotDescriptor; CAPACITY],
    pub sub_branches: &'static [SubBranchDescriptor],
}

const fn slot(x: f64, y: f64, angle_deg: f64, flip: TextFlip, prerequisite: Option<usize>) -> SlotDescriptor {
    SlotDescriptor {
        x,
        y,
        angle_deg,
        flip,
        prerequisite,
    }
}

const fn sub(texture: &'static str, x: f64, y: f64, angle_deg: f64, initially_visible: bool) -> SubBranchDescriptor {
    SubBranchDescriptor {
        texture,
        x,
        y,
        angle_deg,
        initially_visible,
    }
}

use TextFlip::{Always, Never, OnLeft, OnRight};

const BRANCH_01_SUBS: [SubBranchDescriptor; 4] = [
    sub("Branch_Right_Complete_Short", 30.0, -1500.0, 36.0, false),
    sub("Branch_Right_Complete_Long", 30.0, -3200.0, 20.0, true),
    sub("Branch_Left_Complete_Short", 0.0, -3600.0, -35.0, false),
    sub("Branch_Left_Complete_Short", 0.0, -2300.0, -25.0, true),
];

const BRANCH_02_SUBS: [SubBranchDescriptor; 3] = [
    sub("Branch_Left_Complete_Short", 30.0, -3990.0, 330.0, true),
    sub("Branch_Right_Complete_Short", 0.0, -2500.0, 30.0, false),
    sub("Branch_Left_Complete_Short", -50.0, -1500.0, -40.0, false),
];

pub static VARIANTS: [BranchVariant; 2] = [
    BranchVariant {
        name: "Branch01",
        width: 1900.0,
        height: 5800.0,
        slots: [
            slot(865.0, -2685.0, -10.0, Never, Some(0)),
            slot(840.0, -2810.0, -100.0, OnLeft, Some(0)),
            slot(940.0, -2835.0, -55.0, OnLeft, Some(0)),
            slot(320.0, -4450.0, -90.0, OnLeft, Some(1)),
            slot(630.0, -4450.0, -20.0, OnLeft, Some(1)),
            slot(850.0, -5400.0, -20.0, OnLeft, Some(1)),
            slot(770.0, -5500.0, -110.0, OnLeft, Some(1)),
            slot(850.0, -5520.0, -60.0, OnLeft, Some(1)),
            slot(-550.0, -4580.0, -85.0, OnLeft, Some(2)),
            // tip of the main branch
            slot(-200.0, -5500.0, -120.0, OnLeft, None),
            slot(-630.0, -4580.0, -135.0, OnLeft, Some(2)),
            slot(-560.0, -4450.0, -175.0, Always, Some(2)),
            slot(-530.0, -4410.0, 115.0, OnRight, Some(2)),
            slot(-430.0, -3250.0, 210.0, OnLeft, Some(3)),
            slot(-370.0, -3365.0, -95.0, OnLeft, Some(3)),
        ],
        sub_branches: &BRANCH_01_SUBS,
    },
    BranchVariant {
        name: "Branch02",
        width: 1800.0,
        height: 5300.0,
        slots: [
            slot(-535.0, -5055.0, -125.0, OnLeft, Some(0)),
            slot(-438.0, -5018.0, -68.0, OnLeft, Some(0)),
            slot(-475.0, -4900.0, -159.0, OnLeft, Some(0)),
            slot(20.0, -5030.0, -96.0, OnLeft, Some(0)),
            slot(20.0, -4850.0, -40.0, OnLeft, Some(0)),
            slot(770.0, -3930.0, -48.0, OnLeft, Some(1)),
            slot(670.0, -3875.0, -110.0, OnLeft, Some(1)),
            slot(690.0, -3760.0, -12.0, OnLeft, Some(1)),
            slot(585.0, -3620.0, -115.0, OnLeft, Some(1)),
            slot(582.0, -3572.0, 0.0, Never, Some(1)),
            slot(-790.0, -2440.0, -120.0, OnLeft, Some(2)),
            slot(-685.0, -2430.0, -80.0, OnLeft, Some(2)),
            slot(-710.0, -2310.0, 190.0, OnLeft, Some(2)),
            slot(-555.0, -2150.0, 175.0, Always, Some(2)),
            slot(-575.0, -2210.0, -70.0, OnLeft, Some(2)),
        ],
        sub_branches: &BRANCH_02_SUBS,
    },
];
