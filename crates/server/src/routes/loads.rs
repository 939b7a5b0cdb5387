use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use loadline_core::domain::load::Load;
use loadline_core::negotiation::script::{text_or_default, NOT_SPECIFIED};

use super::{json_body, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoadDetailsRequest {
    pub origin: String,
    pub destination: String,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct LoadDetailsResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<LoadSummary>,
}

/// Load as read back to the caller; every missing field reads "Not specified".
#[derive(Debug, PartialEq, Serialize)]
pub struct LoadSummary {
    pub load_id: String,
    pub origin: String,
    pub destination: String,
    pub pickup: String,
    pub delivery: String,
    pub equipment: String,
    pub weight: Value,
    pub rate: Value,
    pub notes: String,
    pub commodity: String,
    pub pieces: Value,
    pub miles: Value,
    pub dimensions: String,
}

impl From<&Load> for LoadSummary {
    fn from(load: &Load) -> Self {
        let text = |value: Option<&str>| text_or_default(value).to_owned();

        Self {
            load_id: text(Some(load.load_id.0.as_str())),
            origin: text(Some(load.origin.as_str())),
            destination: text(Some(load.destination.as_str())),
            pickup: text(load.pickup_datetime.as_deref()),
            delivery: text(load.delivery_datetime.as_deref()),
            equipment: text(load.equipment_type.as_deref()),
            weight: count_value(load.weight),
            rate: rate_value(load.loadboard_rate),
            notes: text(load.notes.as_deref()),
            commodity: text(load.commodity_type.as_deref()),
            pieces: count_value(load.num_of_pieces),
            miles: count_value(load.miles),
            dimensions: text(load.dimensions.as_deref()),
        }
    }
}

fn count_value(value: Option<u32>) -> Value {
    match value {
        Some(value) if value > 0 => Value::from(value),
        _ => Value::from(NOT_SPECIFIED),
    }
}

/// Whole rates render as integers, fractional ones as floats.
fn rate_value(rate: Decimal) -> Value {
    if rate.is_zero() {
        return Value::from(NOT_SPECIFIED);
    }
    if rate.fract().is_zero() {
        if let Some(whole) = rate.to_i64() {
            return Value::from(whole);
        }
    }
    rate.to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::from(rate.to_string()))
}

pub async fn load_details(
    State(state): State<AppState>,
    body: Result<Json<LoadDetailsRequest>, JsonRejection>,
) -> Result<Json<LoadDetailsResponse>, ApiError> {
    let request = json_body(body)?;

    let search = state.catalog.search(&request.origin, &request.destination);
    let matches = match tokio::time::timeout(state.lookup_timeout, search).await {
        Ok(Ok(matches)) => matches,
        Ok(Err(error)) => {
            warn!(event_name = "load_details.catalog_failed", error = %error, "load search failed");
            Vec::new()
        }
        Err(_) => {
            warn!(event_name = "load_details.catalog_timeout", "load search timed out");
            Vec::new()
        }
    };

    info!(
        event_name = "load_details.searched",
        origin = %request.origin,
        destination = %request.destination,
        matches = matches.len(),
        "load search answered"
    );

    Ok(Json(match matches.first() {
        Some(load) => LoadDetailsResponse { found: true, load: Some(LoadSummary::from(load)) },
        None => LoadDetailsResponse { found: false, load: None },
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use serde_json::json;

    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use loadline_core::catalog::{CatalogError, LoadCatalog};
    use loadline_core::domain::load::Load;

    use super::rate_value;
    use crate::routes::router;
    use crate::routes::test_support::{post, test_app};

    struct BrokenCatalog;

    #[async_trait]
    impl LoadCatalog for BrokenCatalog {
        async fn search(
            &self,
            _origin: &str,
            _destination: &str,
        ) -> Result<Vec<Load>, CatalogError> {
            Err(CatalogError::Backend("database is locked".to_owned()))
        }
    }

    struct StalledCatalog;

    #[async_trait]
    impl LoadCatalog for StalledCatalog {
        async fn search(
            &self,
            _origin: &str,
            _destination: &str,
        ) -> Result<Vec<Load>, CatalogError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn first_match_is_returned_with_defaults() {
        let app = test_app();

        let (status, body) = post(
            &app.router,
            "/load-details",
            json!({"origin": "dallas", "destination": "houston"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["found"], true);
        assert_eq!(body["load"]["load_id"], "LL-1004");
        assert_eq!(body["load"]["rate"], 750);
        assert_eq!(body["load"]["dimensions"], "Not specified");
    }

    #[tokio::test]
    async fn no_match_reports_not_found() {
        let app = test_app();
        let (status, body) = post(
            &app.router,
            "/load-details",
            json!({"origin": "Anchorage", "destination": "Honolulu"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"found": false}));
    }

    #[tokio::test]
    async fn catalog_failure_or_timeout_reports_not_found() {
        let app = test_app();
        let catalogs: [Arc<dyn LoadCatalog>; 2] =
            [Arc::new(BrokenCatalog), Arc::new(StalledCatalog)];

        for catalog in catalogs {
            let mut state = app.state.clone();
            state.catalog = catalog;
            state.lookup_timeout = Duration::from_millis(20);

            let (status, body) = post(
                &router(state),
                "/load-details",
                json!({"origin": "Dallas", "destination": "Houston"}),
            )
            .await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"found": false}));
        }
    }

    #[tokio::test]
    async fn missing_destination_is_bad_request() {
        let app = test_app();
        let (status, body) = post(&app.router, "/load-details", json!({"origin": "Dallas"})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[test]
    fn fractional_rates_stay_fractional() {
        assert_eq!(rate_value(Decimal::new(215_050, 2)), json!(2150.5));
        assert_eq!(rate_value(Decimal::new(1500, 0)), json!(1500));
        assert_eq!(rate_value(Decimal::ZERO), json!("Not specified"));
    }
}
