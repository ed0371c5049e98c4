use std::fmt;

/// Donation amount in currency units, stored as a scaled integer with 4 decimal places.
///
/// Tier boundaries (`4.99` vs `5`, `999.99` vs `1000`) must compare exactly, which a raw
/// `f64` does not guarantee once values have been through a CSV or JSON round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(i64);

impl Amount {
    const SCALE: i64 = 10_000;

    pub const ZERO: Amount = Amount(0);

    /// Whole currency units, e.g. `Amount::units(5)` is `5.0000`.
    pub const fn units(value: i64) -> Self {
        Amount(value * Self::SCALE)
    }

    /// Saturates at the representable range; see [`Amount::try_from_float`] for input.
    pub fn from_float(value: f64) -> Self {
        Amount((value * Self::SCALE as f64).round() as i64)
    }

    /// `None` for non-finite values and values beyond the scaled `i64` range.
    pub fn try_from_float(value: f64) -> Option<Self> {
        let scaled = (value * Self::SCALE as f64).round();
        // i64::MIN as f64 is exact; i64::MAX as f64 rounds up to 2^63
        (scaled.is_finite() && scaled >= i64::MIN as f64 && scaled < i64::MAX as f64)
            .then(|| Amount(scaled as i64))
    }

    pub fn from_scaled(value: i64) -> Self {
        Amount(value)
    }

    /// Leaf label text, e.g. `$12.5`.
    pub fn label(&self) -> String {
        format!("${self}")
    }
}

/// Formats without trailing zeros: `5`, `12.5`, `0.0001`.
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / Self::SCALE as u64;
        let frac = abs % Self::SCALE as u64;
        if frac == 0 {
            return write!(f, "{sign}{whole}");
        }
        let digits = format!("{frac:04}");
        write!(f, "{sign}{whole}.{}", digits.trim_end_matches('0'))
    }
}

/// Saturating: totals pin at the representable bounds instead of overflowing.
impl std::ops::Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}
