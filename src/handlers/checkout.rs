use axum::{
    extract::{Json, Path, State},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::services::checkout::{CheckoutInput, CheckoutResponse, CheckoutSummary};
use crate::{ApiResponse, AppState};

const DEFAULT_PROVIDER_CODE: &str = "wompi";

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCheckoutRequest {
    /// Cart to materialize into a checkout
    pub cart_id: Option<Uuid>,
    /// Gateway to create the payment link with (defaults to wompi)
    #[serde(default)]
    #[validate(length(min = 1))]
    pub provider_code: Option<String>,
    /// Where the buyer lands after paying
    #[serde(default)]
    pub return_url: Option<String>,
    /// Overrides the cart's buyer when set
    #[serde(default)]
    pub buyer_user_id: Option<Uuid>,
}

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/checkout/{id}", get(get_checkout))
}

/// Price a cart and create a payment link for it
#[utoipa::path(
    post,
    path = "/api/v1/payments/checkout",
    request_body = CreateCheckoutRequest,
    responses(
        (status = 200, description = "Checkout created with a payment link"),
        (status = 400, description = "Missing cart_id, unpriceable cart or unknown provider", body = crate::errors::ErrorResponse),
        (status = 404, description = "Cart not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Gateway or storage failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<Json<ApiResponse<CheckoutResponse>>, ServiceError> {
    request.validate()?;

    let cart_id = request
        .cart_id
        .ok_or_else(|| ServiceError::ValidationError("cart_id is required".to_string()))?;

    let input = CheckoutInput {
        cart_id,
        buyer_user_id: request.buyer_user_id,
        provider_code: request
            .provider_code
            .unwrap_or_else(|| DEFAULT_PROVIDER_CODE.to_string()),
        return_url: request.return_url,
    };

    let response = state.checkout_service.process_checkout(input).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Fetch a stored checkout with its charges and latest intent
#[utoipa::path(
    get,
    path = "/api/v1/payments/checkout/{id}",
    params(
        ("id" = Uuid, Path, description = "Checkout ID")
    ),
    responses(
        (status = 200, description = "Checkout summary"),
        (status = 404, description = "Checkout not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn get_checkout(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CheckoutSummary>>, ServiceError> {
    let summary = state.checkout_service.get_checkout_summary(id).await?;
    Ok(Json(ApiResponse::success(summary)))
}
