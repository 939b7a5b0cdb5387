use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use loadline_core::domain::call_record::CallRecordUpdate;
use loadline_core::domain::carrier::{CarrierVerification, McNumber};
use loadline_core::domain::session::{CallId, SessionPatch};

use super::mc_text;
use crate::state::AppState;

pub const INVALID_FORMAT: &str = "Invalid MC number format";

#[derive(Debug, Default, Deserialize)]
pub struct McNumberRequest {
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub mc_number: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct McNumberResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl McNumberResponse {
    fn invalid_format() -> (StatusCode, Json<Self>) {
        (
            StatusCode::BAD_REQUEST,
            Json(Self { valid: false, carrier_name: None, error: Some(INVALID_FORMAT.to_owned()) }),
        )
    }
}

/// Verifies an MC number against the registry. A valid answer is also
/// written into the call's session so the conversation skips the MC prompt.
pub async fn verify_mc_number(
    State(state): State<AppState>,
    body: Result<Json<McNumberRequest>, JsonRejection>,
) -> (StatusCode, Json<McNumberResponse>) {
    let Ok(Json(request)) = body else {
        return McNumberResponse::invalid_format();
    };
    let Some(mc_number) =
        mc_text(request.mc_number.as_ref()).and_then(|raw| McNumber::parse(&raw).ok())
    else {
        return McNumberResponse::invalid_format();
    };

    let verification =
        match tokio::time::timeout(state.lookup_timeout, state.verifier.verify(&mc_number)).await {
            Ok(verification) => verification,
            Err(_) => {
                warn!(
                    event_name = "mc_number.verifier_timeout",
                    mc_number = %mc_number,
                    timeout_ms = state.lookup_timeout.as_millis() as u64,
                    "carrier verification timed out"
                );
                CarrierVerification::unavailable("verification timed out")
            }
        };

    let call_id = request
        .call_id
        .map(|raw| raw.trim().to_owned())
        .filter(|raw| !raw.is_empty())
        .map(CallId);

    if verification.valid {
        match &call_id {
            Some(call_id) => {
                state
                    .sessions
                    .merge(
                        call_id,
                        SessionPatch {
                            mc_number: Some(mc_number.clone()),
                            carrier_name: verification.carrier_name.clone(),
                            ..SessionPatch::default()
                        },
                    )
                    .await;
                state
                    .persister
                    .persist(
                        call_id,
                        CallRecordUpdate::CarrierVerified {
                            mc_number: mc_number.clone(),
                            carrier_name: verification.carrier_name.clone(),
                        },
                    )
                    .await;
            }
            None => warn!(
                event_name = "mc_number.no_call_id",
                mc_number = %mc_number,
                "verified carrier not attached to any call"
            ),
        }
    }

    info!(
        event_name = "mc_number.verified",
        correlation_id = call_id.as_ref().map(|id| id.0.as_str()).unwrap_or("none"),
        mc_number = %mc_number,
        valid = verification.valid,
        error = verification.error.as_deref().unwrap_or("none"),
        "mc number verification answered"
    );

    (
        StatusCode::OK,
        Json(McNumberResponse {
            valid: verification.valid,
            carrier_name: verification.carrier_name.filter(|_| verification.valid),
            error: None,
        }),
    )
}
