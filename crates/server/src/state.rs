use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use loadline_core::audit::{AuditSink, TracingAuditSink};
use loadline_core::catalog::LoadCatalog;
use loadline_core::config::NegotiationConfig;
use loadline_core::negotiation::CallEngine;
use loadline_core::sessions::SessionStore;
use loadline_core::verification::CarrierVerifier;
use loadline_db::{CallRecordPersister, CallRecordRepository};

/// Everything the router needs, wired once at startup.
pub struct Collaborators {
    pub sessions: Arc<dyn SessionStore>,
    pub verifier: Arc<dyn CarrierVerifier>,
    pub catalog: Arc<dyn LoadCatalog>,
    pub calls: Arc<dyn CallRecordRepository>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<CallEngine>,
    pub sessions: Arc<dyn SessionStore>,
    pub verifier: Arc<dyn CarrierVerifier>,
    pub catalog: Arc<dyn LoadCatalog>,
    pub persister: CallRecordPersister,
    pub audit: Arc<dyn AuditSink>,
    pub api_key: Arc<SecretString>,
    pub lookup_timeout: Duration,
}

impl AppState {
    pub fn new(
        collaborators: Collaborators,
        negotiation: &NegotiationConfig,
        api_key: SecretString,
    ) -> Self {
        let Collaborators { sessions, verifier, catalog, calls } = collaborators;
        let lookup_timeout = negotiation.lookup_timeout();
        let engine = CallEngine::new(sessions.clone(), verifier.clone(), catalog.clone())
            .with_policy(negotiation.policy())
            .with_lookup_timeout(lookup_timeout);

        Self {
            engine: Arc::new(engine),
            sessions,
            verifier,
            catalog,
            persister: CallRecordPersister::new(calls),
            audit: Arc::new(TracingAuditSink),
            api_key: Arc::new(api_key),
            lookup_timeout,
        }
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn calls(&self) -> &Arc<dyn CallRecordRepository> {
        self.persister.repository()
    }
}
