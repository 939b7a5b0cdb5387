pub mod engine;
pub mod parse;
pub mod policy;
pub mod script;
pub mod spoken;
pub mod states;

pub use engine::{CallEngine, DEFAULT_LOOKUP_TIMEOUT};
pub use policy::{AcceptanceBand, NegotiationPolicy, OfferDecision};
pub use spoken::spoken_amount;
pub use states::{CallAction, CallEvent, CallEventKind, TurnOutcome};
