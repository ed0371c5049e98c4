//! Leaf colour tiers.
//!
//! A donation amount maps to a (tint, brightness) pair through a fixed table of half-open
//! amount intervals. On the festive day every leaf instead draws one of three blossom colours
//! at random, whatever the amount.

use chrono::{DateTime, Datelike, FixedOffset, Offset, Utc};
use rand::Rng;
use serde::Deserialize;

use crate::Amount;
use crate::model::Tint;

/// Which row of the colour table a leaf came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTier {
    /// Below 5, including zero and negative amounts.
    Base,
    Five,
    Ten,
    Twenty,
    Fifty,
    Hundred,
    Thousand,
    /// Index into the festive palette.
    Festive(usize),
}

/// Resolved leaf colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeafColor {
    pub tier: ColorTier,
    pub tint: Tint,
    pub brightness: f64,
    /// Label colour override; `None` keeps the default white text.
    pub text_color: Option<Tint>,
}

struct TierRow {
    from: Amount,
    tier: ColorTier,
    tint: Tint,
    brightness: f64,
}

const BASE_TIER: TierRow = TierRow {
    from: Amount::ZERO,
    tier: ColorTier::Base,
    tint: Tint(0x8EB332),
    brightness: 1.0,
};

/// Ascending lower bounds; a row covers `[from, next.from)`.
const AMOUNT_TIERS: [TierRow; 6] = [
    TierRow { from: Amount::units(5), tier: ColorTier::Five, tint: Tint(0x60B967), brightness: 1.0 },
    TierRow { from: Amount::units(10), tier: ColorTier::Ten, tint: Tint(0x7FF180), brightness: 1.0 },
    TierRow { from: Amount::units(20), tier: ColorTier::Twenty, tint: Tint(0x51FF08), brightness: 1.0 },
    TierRow { from: Amount::units(50), tier: ColorTier::Fifty, tint: Tint(0x5EFF01), brightness: 1.25 },
    TierRow { from: Amount::units(100), tier: ColorTier::Hundred, tint: Tint(0xFDD100), brightness: 1.5 },
    TierRow { from: Amount::units(1000), tier: ColorTier::Thousand, tint: Tint(0xFF8BD4), brightness: 1.5 },
];

pub const FESTIVE_PALETTE: [Tint; 3] = [Tint(0xFF8BD4), Tint(0xFEB5E3), Tint(0xFCBCDF)];
const FESTIVE_BRIGHTNESS: f64 = 1.75;
const FESTIVE_TEXT: Tint = Tint(0x000000);

/// Calendar day (any year) on which leaves blossom, evaluated at a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FestiveDay {
    pub month: u32,
    pub day: u32,
    pub utc_offset_hours: i32,
}

impl Default for FestiveDay {
    fn default() -> Self {
        Self {
            month: 1,
            day: 3,
            utc_offset_hours: 0,
        }
    }
}

impl FestiveDay {
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let offset = FixedOffset::east_opt(self.utc_offset_hours * 3600)
            .unwrap_or_else(|| Utc.fix());
        let local = now.with_timezone(&offset);
        local.month() == self.month && local.day() == self.day
    }
}

/// Maps donation amounts to leaf colours.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorResolver {
    festive: FestiveDay,
}

impl ColorResolver {
    pub fn new(festive: FestiveDay) -> Self {
        Self { festive }
    }

    /// Resolve the colour of a leaf for `amount` at instant `now`.
    ///
    /// `rng` is only consumed on the festive day.
    pub fn resolve<R: Rng>(&self, amount: Amount, now: DateTime<Utc>, rng: &mut R) -> LeafColor {
        if self.festive.contains(now) {
            let index = rng.gen_range(0..FESTIVE_PALETTE.len());
            return LeafColor {
                tier: ColorTier::Festive(index),
                tint: FESTIVE_PALETTE[index],
                brightness: FESTIVE_BRIGHTNESS,
                text_color: Some(FESTIVE_TEXT),
            };
        }

        let row = AMOUNT_TIERS
            .iter()
            .rev()
            .find(|row| amount >= row.from)
            .unwrap_or(&BASE_TIER);

        LeafColor {
            tier: row.tier,
            tint: row.tint,
            brightness: row.brightness,
            text_color: None,
        }
    }
}
