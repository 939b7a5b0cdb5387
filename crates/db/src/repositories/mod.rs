use async_trait::async_trait;
use thiserror::Error;

use loadline_core::domain::call_record::{CallRecord, CallRecordUpdate};
use loadline_core::domain::carrier::McNumber;
use loadline_core::domain::session::CallId;

pub mod call_record;
pub mod load;
pub mod memory;

pub use call_record::SqlCallRecordRepository;
pub use load::SqlLoadRepository;
pub use memory::InMemoryCallRecordRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Durable call records, written one disjoint update at a time.
#[async_trait]
pub trait CallRecordRepository: Send + Sync {
    /// Creates the record on first write; later writes only touch the
    /// columns their update owns.
    async fn apply(&self, call_id: &CallId, update: CallRecordUpdate)
        -> Result<(), RepositoryError>;

    async fn find_by_call_id(&self, call_id: &CallId)
        -> Result<Option<CallRecord>, RepositoryError>;

    async fn list_by_mc_number(
        &self,
        mc_number: &McNumber,
    ) -> Result<Vec<CallRecord>, RepositoryError>;

    /// Earliest record for the carrier, preferring one that carries a name.
    async fn find_carrier(
        &self,
        mc_number: &McNumber,
    ) -> Result<Option<CallRecord>, RepositoryError>;
}
