//! Side-channel writes keyed by call id. Storage failures are logged by the
//! persister and never change the response.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use loadline_core::domain::call_record::CallRecordUpdate;
use loadline_core::domain::carrier::McNumber;
use loadline_core::domain::load::LoadId;
use loadline_core::domain::session::CallId;

use super::carrier::INVALID_FORMAT;
use super::{bad_request, json_body, ApiError, StatusBody};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalOfferRequest {
    pub call_id: String,
    pub final_offer: Decimal,
    #[serde(default, rename = "mc_number")]
    pub mc_number: Option<String>,
    #[serde(default, rename = "load_id")]
    pub load_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallOutcomeRequest {
    pub call_id: String,
    pub outcome: String,
    #[serde(default, rename = "mc_number")]
    pub mc_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierSentimentRequest {
    pub call_id: String,
    pub sentiment: String,
    #[serde(default, rename = "mc_number")]
    pub mc_number: Option<String>,
}

pub async fn final_offer(
    State(state): State<AppState>,
    body: Result<Json<FinalOfferRequest>, JsonRejection>,
) -> Result<Json<StatusBody>, ApiError> {
    let request = json_body(body)?;
    let call_id = call_id(&request.call_id)?;
    let update = CallRecordUpdate::FinalOffer {
        final_offer: request.final_offer,
        mc_number: optional_mc(request.mc_number)?,
        load_id: non_blank(request.load_id).map(LoadId),
    };

    state.persister.persist(&call_id, update).await;
    Ok(Json(StatusBody::OK))
}

pub async fn call_outcome(
    State(state): State<AppState>,
    body: Result<Json<CallOutcomeRequest>, JsonRejection>,
) -> Result<Json<StatusBody>, ApiError> {
    let request = json_body(body)?;
    let call_id = call_id(&request.call_id)?;
    let update = CallRecordUpdate::Outcome {
        outcome: request.outcome,
        mc_number: optional_mc(request.mc_number)?,
    };

    state.persister.persist(&call_id, update).await;
    Ok(Json(StatusBody::OK))
}

pub async fn carrier_sentiment(
    State(state): State<AppState>,
    body: Result<Json<CarrierSentimentRequest>, JsonRejection>,
) -> Result<Json<StatusBody>, ApiError> {
    let request = json_body(body)?;
    let call_id = call_id(&request.call_id)?;
    let update = CallRecordUpdate::Sentiment {
        sentiment: request.sentiment,
        mc_number: optional_mc(request.mc_number)?,
    };

    state.persister.persist(&call_id, update).await;
    Ok(Json(StatusBody::OK))
}

fn call_id(raw: &str) -> Result<CallId, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(bad_request("callId is required"));
    }
    Ok(CallId(trimmed.to_owned()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
}

fn optional_mc(value: Option<String>) -> Result<Option<McNumber>, ApiError> {
    non_blank(value)
        .map(|raw| McNumber::parse(&raw).map_err(|_| bad_request(INVALID_FORMAT)))
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use secrecy::SecretString;
    use serde_json::json;

    use loadline_core::catalog::InMemoryLoadCatalog;
    use loadline_core::config::AppConfig;
    use loadline_core::domain::call_record::{CallRecord, CallRecordUpdate};
    use loadline_core::domain::carrier::McNumber;
    use loadline_core::domain::load::LoadId;
    use loadline_core::domain::session::CallId;
    use loadline_core::sessions::InMemorySessionStore;
    use loadline_core::verification::StaticCarrierVerifier;
    use loadline_db::{CallRecordRepository, RepositoryError};

    use crate::routes::router;
    use crate::routes::test_support::{post, test_app, API_KEY};
    use crate::state::{AppState, Collaborators};

    #[tokio::test]
    async fn side_channel_writes_merge_into_one_record() {
        let app = test_app();

        let (status, body) = post(
            &app.router,
            "/final-offer",
            json!({
                "callId": "c-1",
                "finalOffer": 1450.5,
                "mc_number": "123456",
                "load_id": "LL-1001"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));

        post(
            &app.router,
            "/call-outcome",
            json!({"callId": "c-1", "outcome": "booked", "mc_number": "123456"}),
        )
        .await;
        post(
            &app.router,
            "/carrier-sentiment",
            json!({"callId": "c-1", "sentiment": "positive", "mc_number": "123456"}),
        )
        .await;

        let record = app
            .calls
            .find_by_call_id(&CallId("c-1".to_string()))
            .await
            .expect("find")
            .expect("record");
        assert_eq!(record.final_offer, Some(Decimal::new(14_505, 1)));
        assert_eq!(record.load_id, Some(LoadId("LL-1001".to_string())));
        assert_eq!(record.outcome.as_deref(), Some("booked"));
        assert_eq!(record.sentiment.as_deref(), Some("positive"));
        assert_eq!(record.mc_number, Some(McNumber("123456".to_string())));
    }

    #[tokio::test]
    async fn missing_fields_are_bad_requests() {
        let app = test_app();

        let (status, _) = post(&app.router, "/final-offer", json!({"callId": "c-1"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            post(&app.router, "/call-outcome", json!({"callId": " ", "outcome": "booked"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = post(
            &app.router,
            "/carrier-sentiment",
            json!({"callId": "c-1", "sentiment": "neutral", "mc_number": "MC-12"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid MC number format");
        assert_eq!(app.calls.len().await, 0);
    }

    struct FailingRepository;

    #[async_trait]
    impl CallRecordRepository for FailingRepository {
        async fn apply(
            &self,
            _call_id: &CallId,
            _update: CallRecordUpdate,
        ) -> Result<(), RepositoryError> {
            Err(RepositoryError::Decode("store offline".to_string()))
        }

        async fn find_by_call_id(
            &self,
            _call_id: &CallId,
        ) -> Result<Option<CallRecord>, RepositoryError> {
            Ok(None)
        }

        async fn list_by_mc_number(
            &self,
            _mc_number: &McNumber,
        ) -> Result<Vec<CallRecord>, RepositoryError> {
            Ok(Vec::new())
        }

        async fn find_carrier(
            &self,
            _mc_number: &McNumber,
        ) -> Result<Option<CallRecord>, RepositoryError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn storage_failure_still_answers_ok() {
        let state = AppState::new(
            Collaborators {
                sessions: Arc::new(InMemorySessionStore::default()),
                verifier: Arc::new(StaticCarrierVerifier::default()),
                catalog: Arc::new(InMemoryLoadCatalog::default()),
                calls: Arc::new(FailingRepository),
            },
            &AppConfig::default().negotiation,
            SecretString::from(API_KEY.to_string()),
        );
        let router = router(state);

        let (status, body) =
            post(&router, "/call-outcome", json!({"callId": "c-9", "outcome": "hung_up"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }
}
