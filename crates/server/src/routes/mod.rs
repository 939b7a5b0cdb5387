//! Call-platform routes, all behind the shared-secret header.
//!
//! - `POST /webhook`            drives the call engine
//! - `POST /mc-number`          verifies a carrier and pre-verifies the session
//! - `POST /load-details`       first catalog match for a lane
//! - `POST /final-offer`        records the agreed or last offer
//! - `POST /call-outcome`       records how the call ended
//! - `POST /carrier-sentiment`  records the assessed sentiment
//! - `GET  /api/calls`          call history for an MC number
//! - `POST /api/verify`         carrier lookup against call history

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::warn;

use loadline_core::errors::InterfaceError;

use crate::auth::require_api_key;
use crate::state::AppState;

pub mod carrier;
pub mod dashboard;
pub mod loads;
pub mod records;
pub mod webhook;

pub type ApiError = (StatusCode, Json<ErrorBody>);

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusBody {
    pub status: &'static str,
}

impl StatusBody {
    pub const OK: Self = Self { status: "ok" };
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook::handle).fallback(not_found))
        .route("/mc-number", post(carrier::verify_mc_number).fallback(not_found))
        .route("/load-details", post(loads::load_details).fallback(not_found))
        .route("/final-offer", post(records::final_offer).fallback(not_found))
        .route("/call-outcome", post(records::call_outcome).fallback(not_found))
        .route("/carrier-sentiment", post(records::carrier_sentiment).fallback(not_found))
        .route("/api/calls", get(dashboard::list_calls).fallback(not_found))
        .route("/api/verify", post(dashboard::verify_carrier).fallback(not_found))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> ApiError {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("Not found")))
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorBody::new(message)))
}

/// Unwraps a JSON body, turning every rejection (syntax, missing fields,
/// content type) into a 400.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        warn!(event_name = "http.malformed_body", error = %rejection.body_text());
        bad_request(rejection.body_text())
    })
}

pub fn interface_error(error: InterfaceError) -> ApiError {
    let status = match &error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorBody::new(error.user_message())))
}

/// MC numbers arrive as JSON strings or bare numbers.
pub fn mc_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(text) => text.trim().to_owned(),
        Value::Number(number) if number.is_u64() => number.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
