//! Payload handed to the donation popup when a leaf is clicked.

use crate::color::LeafColor;
use crate::model::{Donation, Tint};

const USERNAME_LIMIT: usize = 24;
const MESSAGE_LIMIT: usize = 321;

/// Everything the popup shows for one donation.
#[derive(Debug, Clone, PartialEq)]
pub struct DonationDetails {
    pub username: String,
    pub message: String,
    pub amount: String,
    pub tint: Tint,
    pub brightness: f64,
    pub text_color: Option<Tint>,
}

impl DonationDetails {
    pub fn new(donation: &Donation, color: &LeafColor) -> Self {
        Self {
            username: truncate_chars(&donation.username, USERNAME_LIMIT),
            message: truncate_chars(&donation.message, MESSAGE_LIMIT),
            amount: donation.amount.label(),
            tint: color.tint,
            brightness: color.brightness,
            text_color: color.text_color,
        }
    }
}

/// Keep at most `limit` characters (not bytes).
fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorTier;
    use crate::model::fixtures::donation;

    fn green() -> LeafColor {
        LeafColor {
            tier: ColorTier::Ten,
            tint: Tint(0x7FF180),
            brightness: 1.0,
            text_color: None,
        }
    }

    #[test]
    fn truncates_long_username_and_message() {
        let mut d = donation("d1", 12.5);
        d.username = "x".repeat(40);
        d.message = "m".repeat(500);

        let details = DonationDetails::new(&d, &green());
        assert_eq!(details.username.chars().count(), 24);
        assert_eq!(details.message.chars().count(), 321);
        assert_eq!(details.amount, "$12.5");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("さくらさくら", 3), "さくら");
        assert_eq!(truncate_chars("short", 24), "short");
    }

    #[test]
    fn carries_leaf_color() {
        let details = DonationDetails::new(&donation("d1", 10.0), &green());
        assert_eq!(details.tint, Tint(0x7FF180));
        assert_eq!(details.text_color, None);
    }
}
