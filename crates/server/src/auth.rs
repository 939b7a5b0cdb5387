use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use secrecy::ExposeSecret;
use tracing::warn;

use crate::routes::ErrorBody;
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Rejects any request whose `x-api-key` header does not match the shared secret.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let provided = request.headers().get(API_KEY_HEADER).and_then(|value| value.to_str().ok());

    if provided != Some(state.api_key.expose_secret()) {
        warn!(
            event_name = "http.unauthorized",
            path = %request.uri().path(),
            header_present = provided.is_some(),
            "request rejected: shared secret mismatch"
        );
        return (StatusCode::UNAUTHORIZED, Json(ErrorBody::new("Unauthorized"))).into_response();
    }

    next.run(request).await
}
