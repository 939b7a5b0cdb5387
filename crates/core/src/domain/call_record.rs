use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::carrier::McNumber;
use crate::domain::load::LoadId;
use crate::domain::session::CallId;

/// Durable row accumulating everything recorded about one call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: i64,
    pub call_id: CallId,
    pub mc_number: Option<McNumber>,
    pub carrier_name: Option<String>,
    pub final_offer: Option<Decimal>,
    pub outcome: Option<String>,
    pub sentiment: Option<String>,
    pub load_id: Option<LoadId>,
    pub created_at: DateTime<Utc>,
}

/// One independent write against a call record. Each variant owns a
/// disjoint set of columns; the record is the union of all writes.
#[derive(Clone, Debug, PartialEq)]
pub enum CallRecordUpdate {
    CarrierVerified { mc_number: McNumber, carrier_name: Option<String> },
    FinalOffer { final_offer: Decimal, mc_number: Option<McNumber>, load_id: Option<LoadId> },
    Outcome { outcome: String, mc_number: Option<McNumber> },
    Sentiment { sentiment: String, mc_number: Option<McNumber> },
}

impl CallRecordUpdate {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CarrierVerified { .. } => "carrier_verified",
            Self::FinalOffer { .. } => "final_offer",
            Self::Outcome { .. } => "outcome",
            Self::Sentiment { .. } => "sentiment",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PersistOutcome {
    Stored,
    PersistFailed(String),
}

impl PersistOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored)
    }
}
