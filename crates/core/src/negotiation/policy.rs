use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ROUNDS: u32 = 3;
pub const DEFAULT_BAND_PCT: u32 = 10;

/// Rate negotiation rules: an offer within `band_pct` percent of the
/// posted rate (inclusive) is accepted; otherwise the caller is countered
/// for at most `max_rounds` turns before the call is handed to a human.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationPolicy {
    pub max_rounds: u32,
    pub band_pct: u32,
}

impl Default for NegotiationPolicy {
    fn default() -> Self {
        Self { max_rounds: DEFAULT_MAX_ROUNDS, band_pct: DEFAULT_BAND_PCT }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcceptanceBand {
    pub floor: Decimal,
    pub ceiling: Decimal,
}

impl AcceptanceBand {
    pub fn contains(&self, offer: Decimal) -> bool {
        offer >= self.floor && offer <= self.ceiling
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OfferDecision {
    Accept,
    Counter,
    RoundLimitReached,
}

impl NegotiationPolicy {
    pub fn band(&self, rate: Decimal) -> AcceptanceBand {
        let hundred = Decimal::ONE_HUNDRED;
        let pct = Decimal::from(self.band_pct);
        AcceptanceBand {
            floor: rate * (hundred - pct) / hundred,
            ceiling: rate * (hundred + pct) / hundred,
        }
    }

    /// `round` is the 1-based count of offers made so far, this one included.
    pub fn evaluate(&self, rate: Decimal, offer: Decimal, round: u32) -> OfferDecision {
        if self.band(rate).contains(offer) {
            OfferDecision::Accept
        } else if round <= self.max_rounds {
            OfferDecision::Counter
        } else {
            OfferDecision::RoundLimitReached
        }
    }
}
