pub mod audit;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod negotiation;
pub mod sessions;
pub mod verification;

pub use audit::{AuditContext, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use catalog::{CatalogError, InMemoryLoadCatalog, LoadCatalog};
pub use domain::call_record::{CallRecord, CallRecordUpdate, PersistOutcome};
pub use domain::carrier::{CarrierVerification, McNumber};
pub use domain::load::{Load, LoadId};
pub use domain::session::{CallId, CallStage, Session, SessionPatch};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use negotiation::{
    CallAction, CallEngine, CallEvent, CallEventKind, NegotiationPolicy, OfferDecision,
    TurnOutcome,
};
pub use sessions::{InMemorySessionStore, SessionStore};
pub use verification::{CarrierVerifier, StaticCarrierVerifier};
