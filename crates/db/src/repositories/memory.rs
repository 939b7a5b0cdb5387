use chrono::Utc;
use tokio::sync::RwLock;

use loadline_core::domain::call_record::{CallRecord, CallRecordUpdate};
use loadline_core::domain::carrier::McNumber;
use loadline_core::domain::session::CallId;

use super::{CallRecordRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryCallRecordRepository {
    records: RwLock<Vec<CallRecord>>,
}

impl InMemoryCallRecordRepository {
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait::async_trait]
impl CallRecordRepository for InMemoryCallRecordRepository {
    async fn apply(
        &self,
        call_id: &CallId,
        update: CallRecordUpdate,
    ) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;

        let index = match records.iter().position(|record| &record.call_id == call_id) {
            Some(index) => index,
            None => {
                let id = records.len() as i64 + 1;
                records.push(CallRecord {
                    id,
                    call_id: call_id.clone(),
                    mc_number: None,
                    carrier_name: None,
                    final_offer: None,
                    outcome: None,
                    sentiment: None,
                    load_id: None,
                    created_at: Utc::now(),
                });
                records.len() - 1
            }
        };
        let record = &mut records[index];

        match update {
            CallRecordUpdate::CarrierVerified { mc_number, carrier_name } => {
                record.mc_number = Some(mc_number);
                record.carrier_name = carrier_name;
            }
            CallRecordUpdate::FinalOffer { final_offer, mc_number, load_id } => {
                record.final_offer = Some(final_offer);
                record.mc_number = mc_number.or(record.mc_number.take());
                record.load_id = load_id.or(record.load_id.take());
            }
            CallRecordUpdate::Outcome { outcome, mc_number } => {
                record.outcome = Some(outcome);
                record.mc_number = mc_number.or(record.mc_number.take());
            }
            CallRecordUpdate::Sentiment { sentiment, mc_number } => {
                record.sentiment = Some(sentiment);
                record.mc_number = mc_number.or(record.mc_number.take());
            }
        }

        Ok(())
    }

    async fn find_by_call_id(
        &self,
        call_id: &CallId,
    ) -> Result<Option<CallRecord>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|record| &record.call_id == call_id).cloned())
    }

    async fn list_by_mc_number(
        &self,
        mc_number: &McNumber,
    ) -> Result<Vec<CallRecord>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|record| record.mc_number.as_ref() == Some(mc_number))
            .cloned()
            .collect())
    }

    async fn find_carrier(
        &self,
        mc_number: &McNumber,
    ) -> Result<Option<CallRecord>, RepositoryError> {
        let records = self.records.read().await;
        let mut matching =
            records.iter().filter(|record| record.mc_number.as_ref() == Some(mc_number));
        let named = matching.clone().find(|record| record.carrier_name.is_some());

        Ok(named.or_else(|| matching.next()).cloned())
    }
}
