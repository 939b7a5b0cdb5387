use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::carrier::McNumber;
use crate::domain::load::Load;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallId(pub String);

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStage {
    #[default]
    AwaitingMc,
    AwaitingSearchCriteria,
    Negotiating,
    Transfer,
}

impl CallStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingMc => "awaiting_mc",
            Self::AwaitingSearchCriteria => "awaiting_search_criteria",
            Self::Negotiating => "negotiating",
            Self::Transfer => "transfer",
        }
    }

    /// Stages only move forward; staying put is always allowed.
    pub fn can_advance_to(&self, next: CallStage) -> bool {
        next >= *self
    }

    pub fn has_load(&self) -> bool {
        *self >= Self::Negotiating
    }
}

/// Per-call conversational state. Lives only in the session store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub stage: CallStage,
    pub mc_number: Option<McNumber>,
    pub carrier_name: Option<String>,
    pub load: Option<Load>,
    pub negotiation_rounds: u32,
    pub carrier_offer: Option<Decimal>,
    pub agreement_reached: bool,
}

/// Fields to overwrite on a session. `None` leaves the stored value alone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionPatch {
    pub stage: Option<CallStage>,
    pub mc_number: Option<McNumber>,
    pub carrier_name: Option<String>,
    pub load: Option<Load>,
    pub negotiation_rounds: Option<u32>,
    pub carrier_offer: Option<Decimal>,
    pub agreement_reached: Option<bool>,
}

impl SessionPatch {
    pub fn stage(stage: CallStage) -> Self {
        Self { stage: Some(stage), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl Session {
    /// Shallow merge. The verified carrier identity is write-once: once an
    /// MC number is on the session, later patches cannot replace it.
    pub fn merge(&mut self, patch: SessionPatch) {
        if let Some(stage) = patch.stage {
            self.stage = stage;
        }
        if self.mc_number.is_none() {
            if let Some(mc_number) = patch.mc_number {
                self.mc_number = Some(mc_number);
                self.carrier_name = patch.carrier_name;
            }
        }
        if let Some(load) = patch.load {
            self.load = Some(load);
        }
        if let Some(rounds) = patch.negotiation_rounds {
            self.negotiation_rounds = rounds;
        }
        if let Some(offer) = patch.carrier_offer {
            self.carrier_offer = Some(offer);
        }
        if let Some(agreement) = patch.agreement_reached {
            self.agreement_reached = agreement;
        }
    }

    pub fn check_advance(&self, next: CallStage) -> Result<(), DomainError> {
        if self.stage.can_advance_to(next) {
            return Ok(());
        }
        Err(DomainError::InvalidStageTransition { from: self.stage, to: next })
    }

    pub fn is_verified(&self) -> bool {
        self.mc_number.is_some()
    }
}
