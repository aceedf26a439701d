use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payments API",
        description = "Payment orchestration: checkout pricing, gateway payment links, webhook reconciliation and double-entry ledger"
    ),
    paths(
        crate::handlers::checkout::create_checkout,
        crate::handlers::checkout::get_checkout,
        crate::handlers::webhooks::payment_webhook,
    ),
    components(schemas(
        crate::handlers::checkout::CreateCheckoutRequest,
        crate::services::checkout::CheckoutResponse,
        crate::services::checkout::CheckoutSummary,
        crate::services::checkout::ChargeSummary,
        crate::errors::ErrorResponse,
    )),
    tags(
        (name = "Payments", description = "Checkout and webhook endpoints")
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI document as JSON.
pub fn docs_routes() -> Router<AppState> {
    Router::new().route(
        "/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_includes_the_payment_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths
            .iter()
            .any(|p| p.as_str() == "/api/v1/payments/checkout"));
        assert!(paths
            .iter()
            .any(|p| p.as_str() == "/api/v1/payments/webhook/{provider}"));
    }
}
