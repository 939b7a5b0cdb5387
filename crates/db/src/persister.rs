use std::sync::Arc;

use tracing::{error, info};

use loadline_core::domain::call_record::{CallRecordUpdate, PersistOutcome};
use loadline_core::domain::session::CallId;

use crate::repositories::CallRecordRepository;

/// Writes call record updates without ever failing the caller. Storage
/// errors are logged and reported back as `PersistFailed`.
#[derive(Clone)]
pub struct CallRecordPersister {
    repository: Arc<dyn CallRecordRepository>,
}

impl CallRecordPersister {
    pub fn new(repository: Arc<dyn CallRecordRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<dyn CallRecordRepository> {
        &self.repository
    }

    pub async fn persist(&self, call_id: &CallId, update: CallRecordUpdate) -> PersistOutcome {
        let kind = update.kind();

        match self.repository.apply(call_id, update).await {
            Ok(()) => {
                info!(
                    event_name = "call_record.persisted",
                    correlation_id = %call_id.0,
                    update_kind = kind,
                    "call record updated"
                );
                PersistOutcome::Stored
            }
            Err(persist_error) => {
                error!(
                    event_name = "call_record.persist_failed",
                    correlation_id = %call_id.0,
                    update_kind = kind,
                    error = %persist_error,
                    "call record update failed"
                );
                PersistOutcome::PersistFailed(persist_error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use loadline_core::domain::call_record::{CallRecord, CallRecordUpdate, PersistOutcome};
    use loadline_core::domain::carrier::McNumber;
    use loadline_core::domain::session::CallId;

    use super::CallRecordPersister;
    use crate::repositories::{
        CallRecordRepository, InMemoryCallRecordRepository, RepositoryError,
    };

    struct BrokenRepository;

    #[async_trait]
    impl CallRecordRepository for BrokenRepository {
        async fn apply(
            &self,
            _call_id: &CallId,
            _update: CallRecordUpdate,
        ) -> Result<(), RepositoryError> {
            Err(RepositoryError::Decode("disk full".to_string()))
        }

        async fn find_by_call_id(
            &self,
            _call_id: &CallId,
        ) -> Result<Option<CallRecord>, RepositoryError> {
            Ok(None)
        }

        async fn list_by_mc_number(
            &self,
            _mc_number: &McNumber,
        ) -> Result<Vec<CallRecord>, RepositoryError> {
            Ok(Vec::new())
        }

        async fn find_carrier(
            &self,
            _mc_number: &McNumber,
        ) -> Result<Option<CallRecord>, RepositoryError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn persist_reports_stored_on_success() {
        let repository = Arc::new(InMemoryCallRecordRepository::default());
        let persister = CallRecordPersister::new(repository.clone());
        let call_id = CallId("call-1".to_string());

        let outcome = persister
            .persist(
                &call_id,
                CallRecordUpdate::FinalOffer {
                    final_offer: Decimal::new(1500, 0),
                    mc_number: None,
                    load_id: None,
                },
            )
            .await;

        assert_eq!(outcome, PersistOutcome::Stored);
        assert!(repository.find_by_call_id(&call_id).await.expect("find").is_some());
    }

    #[tokio::test]
    async fn persist_failure_is_reported_not_raised() {
        let persister = CallRecordPersister::new(Arc::new(BrokenRepository));

        let outcome = persister
            .persist(
                &CallId("call-2".to_string()),
                CallRecordUpdate::Outcome { outcome: "booked".to_string(), mc_number: None },
            )
            .await;

        match outcome {
            PersistOutcome::PersistFailed(message) => assert!(message.contains("disk full")),
            PersistOutcome::Stored => panic!("broken repository must not report success"),
        }
    }
}
