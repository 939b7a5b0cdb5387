use loadline_core::domain::load::Load;

use crate::connection::DbPool;
use crate::repositories::{RepositoryError, SqlLoadRepository};

/// Demo load board shipped with the repository, used by `seed` and tests.
pub struct DemoLoadDataset;

impl DemoLoadDataset {
    pub const JSON: &str = include_str!("../../../config/fixtures/demo_loads.json");

    pub fn loads() -> Result<Vec<Load>, RepositoryError> {
        parse_loads(Self::JSON)
    }

    /// Upserts the demo loads; running it twice leaves the same board.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        seed_loads(pool, &Self::loads()?).await
    }

    /// True when every demo load id is present in the table.
    pub async fn verify(pool: &DbPool) -> Result<bool, RepositoryError> {
        let repo = SqlLoadRepository::new(pool.clone());
        for load in Self::loads()? {
            if repo.find_by_id(&load.load_id).await?.is_none() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Parses a JSON array of loads in the shape of `config/fixtures/demo_loads.json`.
pub fn parse_loads(json: &str) -> Result<Vec<Load>, RepositoryError> {
    serde_json::from_str(json)
        .map_err(|error| RepositoryError::Decode(format!("invalid load fixture: {error}")))
}

pub async fn seed_loads(pool: &DbPool, loads: &[Load]) -> Result<SeedResult, RepositoryError> {
    let repo = SqlLoadRepository::new(pool.clone());
    let loads_seeded = repo.upsert_all(loads).await?;
    let total_loads = repo.count().await?;

    Ok(SeedResult { loads_seeded, total_loads })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub loads_seeded: usize,
    pub total_loads: i64,
}
