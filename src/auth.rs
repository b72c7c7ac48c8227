use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::handler::AppState;

/// Rejects requests whose `Authorization: Bearer <token>` header doesn't match the configured
/// token. Installed only when a token is configured.
pub async fn require_bearer_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(expected) = state.api_token.as_deref() else {
        return next.run(request).await;
    };

    let supplied = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    if supplied != Some(expected) {
        tracing::error!(path = %request.uri().path(), "unauthorized request");
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized request" }))).into_response();
    }

    next.run(request).await
}
