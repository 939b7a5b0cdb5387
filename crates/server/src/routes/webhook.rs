use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use loadline_core::audit::AuditContext;
use loadline_core::domain::session::CallId;
use loadline_core::errors::ApplicationError;
use loadline_core::negotiation::{CallEvent, CallEventKind};

use super::{bad_request, interface_error, json_body, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    pub event_type: String,
    pub call_id: String,
    #[serde(default)]
    pub payload: Option<WebhookPayload>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum WebhookResponse {
    Reply { text: String },
    Received { status: &'static str },
}

impl WebhookResponse {
    fn received() -> Self {
        Self::Received { status: "received" }
    }
}

pub async fn handle(
    State(state): State<AppState>,
    body: Result<Json<WebhookRequest>, JsonRejection>,
) -> Result<Json<WebhookResponse>, ApiError> {
    let request = json_body(body)?;
    let call_id = request.call_id.trim();
    if call_id.is_empty() {
        return Err(bad_request("callId is required"));
    }
    let call_id = CallId(call_id.to_owned());

    let Some(kind) = CallEventKind::parse(&request.event_type) else {
        info!(
            event_name = "webhook.unhandled_event",
            correlation_id = %call_id,
            event_type = %request.event_type,
            "acknowledged event the engine does not handle"
        );
        return Ok(Json(WebhookResponse::received()));
    };

    let event = match kind {
        CallEventKind::CallInitiated => CallEvent::CallInitiated,
        CallEventKind::MessageReceived => {
            let text = request
                .payload
                .and_then(|payload| payload.text)
                .ok_or_else(|| bad_request("payload.text is required"))?;
            CallEvent::utterance(text)
        }
        CallEventKind::CallEnded => CallEvent::CallEnded,
    };

    let audit = AuditContext::new(Some(call_id.clone()), call_id.0.clone(), "call-platform");
    let outcome = state
        .engine
        .handle_with_audit(&call_id, event, state.audit.as_ref(), &audit)
        .await
        .map_err(|domain_error| {
            error!(
                event_name = "webhook.turn_failed",
                correlation_id = %call_id,
                event_type = kind.as_str(),
                error = %domain_error,
                "call engine rejected the event"
            );
            interface_error(ApplicationError::from(domain_error).into_interface(call_id.0.clone()))
        })?;

    info!(
        event_name = "webhook.turn_handled",
        correlation_id = %call_id,
        event_type = kind.as_str(),
        from = outcome.from.as_str(),
        to = outcome.to.as_str(),
        actions = outcome.actions.len(),
        "call turn handled"
    );

    for action in outcome.actions {
        state.persister.persist(&call_id, action.into_record_update()).await;
    }

    Ok(Json(match outcome.reply {
        Some(text) => WebhookResponse::Reply { text },
        None => WebhookResponse::received(),
    }))
}
