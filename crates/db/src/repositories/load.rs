use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};
use tracing::warn;

use loadline_core::catalog::{filter_route, CatalogError, LoadCatalog};
use loadline_core::domain::load::{Load, LoadId};

use super::call_record::parse_decimal;
use super::RepositoryError;
use crate::DbPool;

const LOAD_COLUMNS: &str = "load_id, origin, destination, pickup_datetime, delivery_datetime, \
                            loadboard_rate, equipment_type, weight, notes, commodity_type, \
                            num_of_pieces, miles, dimensions";

/// Load board backed by the `loads` table. Rows come back in insertion order.
pub struct SqlLoadRepository {
    pool: DbPool,
}

impl SqlLoadRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, load: &Load) -> Result<(), RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        upsert_load(&mut conn, load).await
    }

    /// Writes every load in one transaction and returns how many were written.
    pub async fn upsert_all(&self, loads: &[Load]) -> Result<usize, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        for load in loads {
            upsert_load(&mut tx, load).await?;
        }
        tx.commit().await?;
        Ok(loads.len())
    }

    pub async fn list(&self) -> Result<Vec<Load>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {LOAD_COLUMNS} FROM loads ORDER BY rowid ASC"))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(load_from_row).collect()
    }

    pub async fn find_by_id(&self, id: &LoadId) -> Result<Option<Load>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {LOAD_COLUMNS} FROM loads WHERE load_id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(load_from_row).transpose()
    }

    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM loads").fetch_one(&self.pool).await?;
        Ok(total)
    }
}

#[async_trait]
impl LoadCatalog for SqlLoadRepository {
    async fn search(&self, origin: &str, destination: &str) -> Result<Vec<Load>, CatalogError> {
        let loads = self.list().await.map_err(|error| match error {
            RepositoryError::Database(error) => CatalogError::Backend(error.to_string()),
            RepositoryError::Decode(message) => CatalogError::Decode(message),
        })?;

        let routable = loads
            .iter()
            .filter(|load| {
                let complete =
                    !load.origin.trim().is_empty() && !load.destination.trim().is_empty();
                if !complete {
                    warn!(
                        event_name = "loads.skipped_incomplete",
                        load_id = %load.load_id,
                        "load without origin or destination skipped"
                    );
                }
                complete
            })
            .collect::<Vec<_>>();

        Ok(filter_route(routable, origin, destination))
    }
}

async fn upsert_load(
    conn: &mut sqlx::SqliteConnection,
    load: &Load,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO loads (
            load_id, origin, destination, pickup_datetime, delivery_datetime, loadboard_rate,
            equipment_type, weight, notes, commodity_type, num_of_pieces, miles, dimensions
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(load_id) DO UPDATE SET
            origin = excluded.origin,
            destination = excluded.destination,
            pickup_datetime = excluded.pickup_datetime,
            delivery_datetime = excluded.delivery_datetime,
            loadboard_rate = excluded.loadboard_rate,
            equipment_type = excluded.equipment_type,
            weight = excluded.weight,
            notes = excluded.notes,
            commodity_type = excluded.commodity_type,
            num_of_pieces = excluded.num_of_pieces,
            miles = excluded.miles,
            dimensions = excluded.dimensions",
    )
    .bind(&load.load_id.0)
    .bind(&load.origin)
    .bind(&load.destination)
    .bind(load.pickup_datetime.as_deref())
    .bind(load.delivery_datetime.as_deref())
    .bind(load.loadboard_rate.to_string())
    .bind(load.equipment_type.as_deref())
    .bind(load.weight.map(i64::from))
    .bind(load.notes.as_deref())
    .bind(load.commodity_type.as_deref())
    .bind(load.num_of_pieces.map(i64::from))
    .bind(load.miles.map(i64::from))
    .bind(load.dimensions.as_deref())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

fn load_from_row(row: SqliteRow) -> Result<Load, RepositoryError> {
    let rate: String = row.try_get("loadboard_rate")?;

    Ok(Load {
        load_id: LoadId(row.try_get("load_id")?),
        origin: row.try_get("origin")?,
        destination: row.try_get("destination")?,
        pickup_datetime: row.try_get("pickup_datetime")?,
        delivery_datetime: row.try_get("delivery_datetime")?,
        equipment_type: row.try_get("equipment_type")?,
        weight: parse_u32("weight", row.try_get("weight")?)?,
        loadboard_rate: parse_decimal("loadboard_rate", &rate)?,
        notes: row.try_get("notes")?,
        commodity_type: row.try_get("commodity_type")?,
        num_of_pieces: parse_u32("num_of_pieces", row.try_get("num_of_pieces")?)?,
        miles: parse_u32("miles", row.try_get("miles")?)?,
        dimensions: row.try_get("dimensions")?,
    })
}

fn parse_u32(column: &str, value: Option<i64>) -> Result<Option<u32>, RepositoryError> {
    value
        .map(|raw| {
            u32::try_from(raw).map_err(|_| {
                RepositoryError::Decode(format!("column `{column}` out of range for u32: {raw}"))
            })
        })
        .transpose()
}
