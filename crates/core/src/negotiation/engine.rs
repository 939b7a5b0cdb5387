use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::catalog::LoadCatalog;
use crate::domain::carrier::{CarrierVerification, McNumber};
use crate::domain::load::Load;
use crate::domain::session::{CallId, CallStage, Session, SessionPatch};
use crate::errors::DomainError;
use crate::negotiation::parse::{is_acceptance, parse_offer, parse_route};
use crate::negotiation::policy::{NegotiationPolicy, OfferDecision};
use crate::negotiation::script;
use crate::negotiation::states::{CallAction, CallEvent, TurnOutcome};
use crate::sessions::SessionStore;
use crate::verification::CarrierVerifier;

pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Drives one call from greeting to transfer.
///
/// Each `handle` call reads the session, decides the next stage and reply,
/// and writes the changed fields back. Verifier and catalog failures keep
/// the call in place; they never surface as errors.
pub struct CallEngine {
    sessions: Arc<dyn SessionStore>,
    verifier: Arc<dyn CarrierVerifier>,
    catalog: Arc<dyn LoadCatalog>,
    policy: NegotiationPolicy,
    lookup_timeout: Duration,
}

struct Turn {
    to: CallStage,
    reply: String,
    patch: SessionPatch,
    actions: Vec<CallAction>,
}

impl Turn {
    fn stay(stage: CallStage, reply: impl Into<String>) -> Self {
        Self { to: stage, reply: reply.into(), patch: SessionPatch::default(), actions: Vec::new() }
    }
}

impl CallEngine {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        verifier: Arc<dyn CarrierVerifier>,
        catalog: Arc<dyn LoadCatalog>,
    ) -> Self {
        Self {
            sessions,
            verifier,
            catalog,
            policy: NegotiationPolicy::default(),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_policy(mut self, policy: NegotiationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_lookup_timeout(mut self, lookup_timeout: Duration) -> Self {
        self.lookup_timeout = lookup_timeout;
        self
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn policy(&self) -> NegotiationPolicy {
        self.policy
    }

    pub async fn handle(
        &self,
        call_id: &CallId,
        event: CallEvent,
    ) -> Result<TurnOutcome, DomainError> {
        let kind = event.kind();
        match event {
            CallEvent::CallInitiated => {
                // Starts over, keeping only a carrier verified ahead of the call.
                let previous = self.sessions.get(call_id).await;
                self.sessions.clear(call_id).await;
                self.sessions
                    .merge(
                        call_id,
                        SessionPatch {
                            stage: Some(CallStage::AwaitingMc),
                            mc_number: previous.mc_number,
                            carrier_name: previous.carrier_name,
                            ..SessionPatch::default()
                        },
                    )
                    .await;
                Ok(TurnOutcome {
                    from: previous.stage,
                    to: CallStage::AwaitingMc,
                    event: kind,
                    reply: Some(script::GREETING.to_owned()),
                    actions: Vec::new(),
                })
            }
            CallEvent::CallEnded => {
                let stage = self.sessions.get(call_id).await.stage;
                self.sessions.clear(call_id).await;
                Ok(TurnOutcome {
                    from: stage,
                    to: stage,
                    event: kind,
                    reply: None,
                    actions: Vec::new(),
                })
            }
            CallEvent::Utterance { text } => {
                let session = self.sessions.get(call_id).await;
                let turn = self.respond(call_id, &session, &text).await?;
                session.check_advance(turn.to)?;

                let mut patch = turn.patch;
                if turn.to != session.stage {
                    patch.stage = Some(turn.to);
                }
                if !patch.is_empty() {
                    self.sessions.merge(call_id, patch).await;
                }

                Ok(TurnOutcome {
                    from: session.stage,
                    to: turn.to,
                    event: kind,
                    reply: Some(turn.reply),
                    actions: turn.actions,
                })
            }
        }
    }

    pub async fn handle_with_audit<S>(
        &self,
        call_id: &CallId,
        event: CallEvent,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TurnOutcome, DomainError>
    where
        S: AuditSink + ?Sized,
    {
        let kind = event.kind();
        let result = self.handle(call_id, event).await;
        match &result {
            Ok(outcome) => sink.emit(
                AuditEvent::new(
                    audit,
                    "call.transition_applied",
                    AuditCategory::Negotiation,
                    AuditOutcome::Success,
                )
                .with_metadata("from", outcome.from.as_str())
                .with_metadata("to", outcome.to.as_str())
                .with_metadata("event", kind.as_str())
                .with_metadata("actions", outcome.actions.len().to_string()),
            ),
            Err(error) => sink.emit(
                AuditEvent::new(
                    audit,
                    "call.transition_rejected",
                    AuditCategory::Negotiation,
                    AuditOutcome::Rejected,
                )
                .with_metadata("event", kind.as_str())
                .with_metadata("error", error.to_string()),
            ),
        }
        result
    }

    async fn respond(
        &self,
        call_id: &CallId,
        session: &Session,
        text: &str,
    ) -> Result<Turn, DomainError> {
        match session.stage {
            CallStage::AwaitingMc => Ok(self.respond_awaiting_mc(call_id, session, text).await),
            CallStage::AwaitingSearchCriteria => {
                Ok(self.respond_awaiting_route(call_id, text).await)
            }
            CallStage::Negotiating => self.respond_negotiating(call_id, session, text),
            CallStage::Transfer => Ok(Turn::stay(CallStage::Transfer, script::TRANSFERRING)),
        }
    }

    async fn respond_awaiting_mc(&self, call_id: &CallId, session: &Session, text: &str) -> Turn {
        if session.is_verified() {
            return Turn {
                to: CallStage::AwaitingSearchCriteria,
                reply: script::verified(session.carrier_name.as_deref()),
                patch: SessionPatch::default(),
                actions: Vec::new(),
            };
        }

        let Some(mc_number) = McNumber::from_utterance(text) else {
            return Turn::stay(CallStage::AwaitingMc, script::MC_NOT_HEARD);
        };

        let verification = self.verify(call_id, &mc_number).await;
        if !verification.valid {
            info!(
                event_name = "call.mc_rejected",
                call_id = %call_id,
                mc_number = %mc_number,
                error = verification.error.as_deref().unwrap_or(""),
                "carrier verification did not pass"
            );
            return Turn::stay(CallStage::AwaitingMc, script::MC_REJECTED);
        }

        let carrier_name = verification.carrier_name;
        Turn {
            to: CallStage::AwaitingSearchCriteria,
            reply: script::verified(carrier_name.as_deref()),
            patch: SessionPatch {
                mc_number: Some(mc_number.clone()),
                carrier_name: carrier_name.clone(),
                ..SessionPatch::default()
            },
            actions: vec![CallAction::RecordCarrierVerification { mc_number, carrier_name }],
        }
    }

    async fn respond_awaiting_route(&self, call_id: &CallId, text: &str) -> Turn {
        let Some(route) = parse_route(text) else {
            return Turn::stay(CallStage::AwaitingSearchCriteria, script::ROUTE_NOT_UNDERSTOOD);
        };

        let mut loads = self.search(call_id, &route.origin, &route.destination).await;
        if loads.is_empty() {
            return Turn::stay(
                CallStage::AwaitingSearchCriteria,
                script::no_loads(&route.origin, &route.destination),
            );
        }

        let load = loads.swap_remove(0);
        Turn {
            to: CallStage::Negotiating,
            reply: script::load_offer(&load),
            patch: SessionPatch {
                load: Some(load),
                negotiation_rounds: Some(0),
                ..SessionPatch::default()
            },
            actions: Vec::new(),
        }
    }

    fn respond_negotiating(
        &self,
        call_id: &CallId,
        session: &Session,
        text: &str,
    ) -> Result<Turn, DomainError> {
        let load = session.load.as_ref().ok_or_else(|| {
            DomainError::InvariantViolation(format!("call {call_id} is negotiating without a load"))
        })?;
        let round = session.negotiation_rounds.saturating_add(1);
        let rate = load.loadboard_rate;

        if is_acceptance(text) {
            let reply = script::ACCEPTED_POSTED_RATE;
            return Ok(self.transfer(session, load, round, rate, true, reply));
        }

        let Some(offer) = parse_offer(text) else {
            let mut turn = Turn::stay(CallStage::Negotiating, script::OFFER_NOT_UNDERSTOOD);
            turn.patch.negotiation_rounds = Some(round);
            return Ok(turn);
        };

        let turn = match self.policy.evaluate(rate, offer, round) {
            OfferDecision::Accept => {
                self.transfer(session, load, round, offer, true, script::agreed(offer))
            }
            OfferDecision::Counter => Turn {
                to: CallStage::Negotiating,
                reply: script::counter(offer, rate),
                patch: SessionPatch {
                    negotiation_rounds: Some(round),
                    carrier_offer: Some(offer),
                    ..SessionPatch::default()
                },
                actions: Vec::new(),
            },
            OfferDecision::RoundLimitReached => {
                let reply = script::round_limit_reached(offer);
                self.transfer(session, load, round, offer, false, reply)
            }
        };
        Ok(turn)
    }

    fn transfer(
        &self,
        session: &Session,
        load: &Load,
        round: u32,
        final_offer: Decimal,
        agreement_reached: bool,
        reply: impl Into<String>,
    ) -> Turn {
        Turn {
            to: CallStage::Transfer,
            reply: reply.into(),
            patch: SessionPatch {
                negotiation_rounds: Some(round),
                carrier_offer: Some(final_offer),
                agreement_reached: agreement_reached.then_some(true),
                ..SessionPatch::default()
            },
            actions: vec![CallAction::RecordFinalOffer {
                mc_number: session.mc_number.clone(),
                final_offer,
                load_id: Some(load.load_id.clone()),
                agreement_reached,
            }],
        }
    }

    async fn verify(&self, call_id: &CallId, mc_number: &McNumber) -> CarrierVerification {
        match tokio::time::timeout(self.lookup_timeout, self.verifier.verify(mc_number)).await {
            Ok(verification) => {
                if let Some(error) = verification.error.as_deref() {
                    warn!(
                        event_name = "call.verifier_unavailable",
                        call_id = %call_id,
                        mc_number = %mc_number,
                        error,
                        "carrier registry could not answer"
                    );
                }
                verification
            }
            Err(_) => {
                warn!(
                    event_name = "call.verifier_timeout",
                    call_id = %call_id,
                    mc_number = %mc_number,
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    "carrier verification timed out"
                );
                CarrierVerification::unavailable("verification timed out")
            }
        }
    }

    async fn search(&self, call_id: &CallId, origin: &str, destination: &str) -> Vec<Load> {
        match tokio::time::timeout(self.lookup_timeout, self.catalog.search(origin, destination))
            .await
        {
            Ok(Ok(loads)) => loads,
            Ok(Err(error)) => {
                warn!(
                    event_name = "call.catalog_failed",
                    call_id = %call_id,
                    origin,
                    destination,
                    error = %error,
                    "load search failed; treating as no results"
                );
                Vec::new()
            }
            Err(_) => {
                warn!(
                    event_name = "call.catalog_timeout",
                    call_id = %call_id,
                    origin,
                    destination,
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    "load search timed out; treating as no results"
                );
                Vec::new()
            }
        }
    }
}
