use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::json;
use tracing::info;

use crate::errors::ServiceError;
use crate::AppState;

pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/webhook/{provider}", post(payment_webhook))
}

/// Consume a gateway callback and reconcile the payment state
#[utoipa::path(
    post,
    path = "/api/v1/payments/webhook/{provider}",
    params(
        ("provider" = String, Path, description = "Provider code the webhook was registered for")
    ),
    request_body = String,
    responses(
        (status = 200, description = "Processed, duplicate or dropped orphan"),
        (status = 400, description = "Malformed payload, invalid signature or unknown provider", body = crate::errors::ErrorResponse),
        (status = 500, description = "Transient storage failure; the gateway will retry", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ServiceError> {
    // Wompi carries the checksum inside the body; other providers may send
    // a detached header.
    let signature_header = headers
        .get("x-event-checksum")
        .or_else(|| headers.get("x-signature"))
        .and_then(|value| value.to_str().ok());

    let outcome = state
        .webhook_service
        .process_payment_event(&provider, &body, signature_header)
        .await?;

    info!(provider = %provider, outcome = ?outcome, "webhook handled");
    Ok((StatusCode::OK, Json(json!({ "status": "ok" }))))
}
