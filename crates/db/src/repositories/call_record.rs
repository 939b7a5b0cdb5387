use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row};

use loadline_core::domain::call_record::{CallRecord, CallRecordUpdate};
use loadline_core::domain::carrier::McNumber;
use loadline_core::domain::load::LoadId;
use loadline_core::domain::session::CallId;

use super::{CallRecordRepository, RepositoryError};
use crate::DbPool;

const CALL_COLUMNS: &str = "id, call_id, mc_number, carrier_name, final_offer, outcome, \
                            sentiment, load_id, created_at";

pub struct SqlCallRecordRepository {
    pool: DbPool,
}

impl SqlCallRecordRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CallRecordRepository for SqlCallRecordRepository {
    async fn apply(
        &self,
        call_id: &CallId,
        update: CallRecordUpdate,
    ) -> Result<(), RepositoryError> {
        let created_at = Utc::now().to_rfc3339();

        match update {
            CallRecordUpdate::CarrierVerified { mc_number, carrier_name } => {
                sqlx::query(
                    "INSERT INTO calls (call_id, mc_number, carrier_name, created_at)
                     VALUES (?, ?, ?, ?)
                     ON CONFLICT(call_id) DO UPDATE SET
                        mc_number = excluded.mc_number,
                        carrier_name = excluded.carrier_name",
                )
                .bind(&call_id.0)
                .bind(&mc_number.0)
                .bind(carrier_name.as_deref())
                .bind(&created_at)
                .execute(&self.pool)
                .await?;
            }
            CallRecordUpdate::FinalOffer { final_offer, mc_number, load_id } => {
                sqlx::query(
                    "INSERT INTO calls (call_id, final_offer, mc_number, load_id, created_at)
                     VALUES (?, ?, ?, ?, ?)
                     ON CONFLICT(call_id) DO UPDATE SET
                        final_offer = excluded.final_offer,
                        mc_number = COALESCE(excluded.mc_number, calls.mc_number),
                        load_id = COALESCE(excluded.load_id, calls.load_id)",
                )
                .bind(&call_id.0)
                .bind(final_offer.to_string())
                .bind(mc_number.as_ref().map(|value| value.0.as_str()))
                .bind(load_id.as_ref().map(|value| value.0.as_str()))
                .bind(&created_at)
                .execute(&self.pool)
                .await?;
            }
            CallRecordUpdate::Outcome { outcome, mc_number } => {
                sqlx::query(
                    "INSERT INTO calls (call_id, outcome, mc_number, created_at)
                     VALUES (?, ?, ?, ?)
                     ON CONFLICT(call_id) DO UPDATE SET
                        outcome = excluded.outcome,
                        mc_number = COALESCE(excluded.mc_number, calls.mc_number)",
                )
                .bind(&call_id.0)
                .bind(&outcome)
                .bind(mc_number.as_ref().map(|value| value.0.as_str()))
                .bind(&created_at)
                .execute(&self.pool)
                .await?;
            }
            CallRecordUpdate::Sentiment { sentiment, mc_number } => {
                sqlx::query(
                    "INSERT INTO calls (call_id, sentiment, mc_number, created_at)
                     VALUES (?, ?, ?, ?)
                     ON CONFLICT(call_id) DO UPDATE SET
                        sentiment = excluded.sentiment,
                        mc_number = COALESCE(excluded.mc_number, calls.mc_number)",
                )
                .bind(&call_id.0)
                .bind(&sentiment)
                .bind(mc_number.as_ref().map(|value| value.0.as_str()))
                .bind(&created_at)
                .execute(&self.pool)
                .await?;
            }
        }

        Ok(())
    }

    async fn find_by_call_id(
        &self,
        call_id: &CallId,
    ) -> Result<Option<CallRecord>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {CALL_COLUMNS} FROM calls WHERE call_id = ?"))
            .bind(&call_id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(call_from_row).transpose()
    }

    async fn list_by_mc_number(
        &self,
        mc_number: &McNumber,
    ) -> Result<Vec<CallRecord>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {CALL_COLUMNS} FROM calls WHERE mc_number = ? ORDER BY id ASC"
        ))
        .bind(&mc_number.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(call_from_row).collect()
    }

    async fn find_carrier(
        &self,
        mc_number: &McNumber,
    ) -> Result<Option<CallRecord>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {CALL_COLUMNS} FROM calls
             WHERE mc_number = ?
             ORDER BY carrier_name IS NULL, id ASC
             LIMIT 1"
        ))
        .bind(&mc_number.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(call_from_row).transpose()
    }
}

fn call_from_row(row: SqliteRow) -> Result<CallRecord, RepositoryError> {
    Ok(CallRecord {
        id: row.try_get("id")?,
        call_id: CallId(row.try_get("call_id")?),
        mc_number: row.try_get::<Option<String>, _>("mc_number")?.map(McNumber),
        carrier_name: row.try_get("carrier_name")?,
        final_offer: parse_optional_decimal("final_offer", row.try_get("final_offer")?)?,
        outcome: row.try_get("outcome")?,
        sentiment: row.try_get("sentiment")?,
        load_id: row.try_get::<Option<String>, _>("load_id")?.map(LoadId),
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
    })
}

pub(crate) fn parse_decimal(column: &str, value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value).map_err(|error| {
        RepositoryError::Decode(format!("invalid decimal in `{column}`: `{value}` ({error})"))
    })
}

fn parse_optional_decimal(
    column: &str,
    value: Option<String>,
) -> Result<Option<Decimal>, RepositoryError> {
    value.map(|raw| parse_decimal(column, &raw)).transpose()
}

fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}
