//! Read API used by the reporting dashboard. Lookups go against stored call
//! history, never the live registry.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use loadline_core::domain::call_record::CallRecord;
use loadline_core::domain::carrier::McNumber;

use super::{bad_request, mc_text, ApiError, ErrorBody};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallsQuery {
    #[serde(default)]
    pub mc_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CallsResponse {
    pub entries: Vec<CallRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[serde(default)]
    pub mc_number: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerifyResponse {
    fn failure(status: StatusCode, error: &str) -> (StatusCode, Json<Self>) {
        (status, Json(Self { valid: false, carrier_name: None, error: Some(error.to_owned()) }))
    }
}

pub async fn list_calls(
    State(state): State<AppState>,
    Query(query): Query<CallsQuery>,
) -> Result<Json<CallsResponse>, ApiError> {
    let Some(mc_number) =
        query.mc_number.map(|raw| raw.trim().to_owned()).filter(|raw| !raw.is_empty())
    else {
        return Err(bad_request("MC number is required"));
    };

    let entries = state.calls().list_by_mc_number(&McNumber(mc_number)).await.map_err(|err| {
        error!(event_name = "dashboard.calls_failed", error = %err, "call history query failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::new("Database error")))
    })?;

    Ok(Json(CallsResponse { entries }))
}

pub async fn verify_carrier(
    State(state): State<AppState>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> (StatusCode, Json<VerifyResponse>) {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let Some(mc_number) = mc_text(request.mc_number.as_ref()) else {
        return VerifyResponse::failure(StatusCode::BAD_REQUEST, "MC number required");
    };

    match state.calls().find_carrier(&McNumber(mc_number)).await {
        Ok(Some(record)) => (
            StatusCode::OK,
            Json(VerifyResponse { valid: true, carrier_name: record.carrier_name, error: None }),
        ),
        Ok(None) => {
            (StatusCode::OK, Json(VerifyResponse { valid: false, carrier_name: None, error: None }))
        }
        Err(err) => {
            error!(event_name = "dashboard.verify_failed", error = %err, "carrier lookup failed");
            VerifyResponse::failure(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}
