use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::load::Load;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog backend failure: {0}")]
    Backend(String),
    #[error("catalog record could not be decoded: {0}")]
    Decode(String),
}

/// Read side of the load board.
///
/// `search` returns every load whose origin and destination both contain
/// the given needles (case-insensitive, trimmed), in storage order.
#[async_trait]
pub trait LoadCatalog: Send + Sync {
    async fn search(&self, origin: &str, destination: &str) -> Result<Vec<Load>, CatalogError>;
}

/// Applies the route rule over an ordered slice of loads.
pub fn filter_route<'a>(
    loads: impl IntoIterator<Item = &'a Load>,
    origin: &str,
    destination: &str,
) -> Vec<Load> {
    loads.into_iter().filter(|load| load.matches_route(origin, destination)).cloned().collect()
}

#[derive(Default)]
pub struct InMemoryLoadCatalog {
    loads: RwLock<Vec<Load>>,
}

impl InMemoryLoadCatalog {
    pub fn new(loads: Vec<Load>) -> Self {
        Self { loads: RwLock::new(loads) }
    }

    pub async fn push(&self, load: Load) {
        self.loads.write().await.push(load);
    }
}

#[async_trait]
impl LoadCatalog for InMemoryLoadCatalog {
    async fn search(&self, origin: &str, destination: &str) -> Result<Vec<Load>, CatalogError> {
        let loads = self.loads.read().await;
        Ok(filter_route(loads.iter(), origin, destination))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{InMemoryLoadCatalog, LoadCatalog};
    use crate::domain::load::{Load, LoadId};

    fn load(id: &str, origin: &str, destination: &str) -> Load {
        Load {
            load_id: LoadId(id.to_string()),
            origin: origin.to_string(),
            destination: destination.to_string(),
            pickup_datetime: None,
            delivery_datetime: None,
            equipment_type: Some("Dry Van".to_string()),
            weight: None,
            loadboard_rate: Decimal::new(1500, 0),
            notes: None,
            commodity_type: None,
            num_of_pieces: None,
            miles: None,
            dimensions: None,
        }
    }

    #[tokio::test]
    async fn search_keeps_storage_order_and_filters_both_fields() {
        let catalog = InMemoryLoadCatalog::new(vec![
            load("L-3", "Dallas, TX", "Miami, FL"),
            load("L-1", "Houston, TX", "Miami, FL"),
            load("L-2", "Dallas, TX", "Orlando, FL"),
            load("L-4", "dallas, tx", "MIAMI BEACH, FL"),
        ]);

        let found = catalog.search("Dallas", "miami").await.expect("search");
        let ids = found.iter().map(|load| load.load_id.0.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["L-3", "L-4"]);
    }

    #[tokio::test]
    async fn search_with_no_match_is_empty_not_error() {
        let catalog = InMemoryLoadCatalog::default();
        catalog.push(load("L-1", "Los Angeles, CA", "Phoenix, AZ")).await;

        assert!(catalog.search("denver", "phoenix").await.expect("search").is_empty());
        assert_eq!(catalog.search("los angeles", "").await.expect("search").len(), 1);
    }
}
