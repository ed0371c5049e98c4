use crate::{Amount, Donation};

/// Running totals over placed donations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonationStats {
    pub count: usize,
    pub total_raised: Amount,
    pub largest: Option<Amount>,
}

impl DonationStats {
    pub fn record(&mut self, donation: &Donation) {
        self.count += 1;
        self.total_raised += donation.amount;
        self.largest = Some(self.largest.map_or(donation.amount, |l| l.max(donation.amount)));
    }
}
