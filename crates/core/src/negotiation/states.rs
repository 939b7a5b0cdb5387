use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::call_record::CallRecordUpdate;
use crate::domain::carrier::McNumber;
use crate::domain::load::LoadId;
use crate::domain::session::CallStage;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallEventKind {
    #[serde(rename = "call.initiated")]
    CallInitiated,
    #[serde(rename = "message.received")]
    MessageReceived,
    #[serde(rename = "call.ended")]
    CallEnded,
}

impl CallEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CallInitiated => "call.initiated",
            Self::MessageReceived => "message.received",
            Self::CallEnded => "call.ended",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "call.initiated" => Some(Self::CallInitiated),
            "message.received" => Some(Self::MessageReceived),
            "call.ended" => Some(Self::CallEnded),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallEvent {
    CallInitiated,
    Utterance { text: String },
    CallEnded,
}

impl CallEvent {
    pub fn utterance(text: impl Into<String>) -> Self {
        Self::Utterance { text: text.into() }
    }

    pub fn kind(&self) -> CallEventKind {
        match self {
            Self::CallInitiated => CallEventKind::CallInitiated,
            Self::Utterance { .. } => CallEventKind::MessageReceived,
            Self::CallEnded => CallEventKind::CallEnded,
        }
    }
}

/// Side effects a turn asks the transport to carry out after replying.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallAction {
    RecordCarrierVerification {
        mc_number: McNumber,
        carrier_name: Option<String>,
    },
    RecordFinalOffer {
        mc_number: Option<McNumber>,
        final_offer: Decimal,
        load_id: Option<LoadId>,
        agreement_reached: bool,
    },
}

impl CallAction {
    pub fn into_record_update(self) -> CallRecordUpdate {
        match self {
            Self::RecordCarrierVerification { mc_number, carrier_name } => {
                CallRecordUpdate::CarrierVerified { mc_number, carrier_name }
            }
            Self::RecordFinalOffer { mc_number, final_offer, load_id, .. } => {
                CallRecordUpdate::FinalOffer { final_offer, mc_number, load_id }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnOutcome {
    pub from: CallStage,
    pub to: CallStage,
    pub event: CallEventKind,
    pub reply: Option<String>,
    pub actions: Vec<CallAction>,
}

impl TurnOutcome {
    pub fn stayed(&self) -> bool {
        self.from == self.to
    }
}
