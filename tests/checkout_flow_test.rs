mod common;

use axum::http::StatusCode;
use common::{create_checkout, MockGateway, TestApp};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;
use std::sync::atomic::Ordering;
use uuid::Uuid;

use payments_api::entities::{
    checkout::CheckoutStatus, payment_attempt, payment_intent::PaymentIntentStatus, Checkout,
    PaymentAttempt,
};

#[tokio::test]
async fn happy_path_prices_the_cart_and_creates_a_payment_link() {
    let app = TestApp::new().await;
    // 2 items at 5,000 minor, shipping 2,000, VAT floor(10,000 * 0.19) = 1,900
    let cart_id = app.seed_cart(5_000, 2, 2_000).await;

    let (status, body) = app
        .post_json(
            "/api/v1/payments/checkout",
            json!({ "cart_id": cart_id, "provider_code": "wompi" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    let data = &body["data"];
    assert_eq!(data["total_amount"], "139.00");
    assert_eq!(data["currency"], "COP");
    assert_eq!(data["status"], "awaiting_payment");
    assert!(data["checkout_url"]
        .as_str()
        .expect("checkout_url present")
        .starts_with("https://pay.test/l/"));

    let checkout_id = Uuid::parse_str(data["checkout_id"].as_str().unwrap()).unwrap();
    let stored = app
        .state
        .store
        .get_checkout_by_id(checkout_id)
        .await
        .unwrap()
        .expect("checkout persisted");
    assert_eq!(stored.subtotal_minor, 10_000);
    assert_eq!(stored.charges_total_minor, 3_900);
    assert_eq!(stored.total_minor, 13_900);
    assert_eq!(stored.status, CheckoutStatus::AwaitingPayment);
    assert_eq!(
        stored.total_minor,
        stored.subtotal_minor + stored.charges_total_minor
    );

    let charges = app
        .state
        .store
        .get_charges_for_checkout(checkout_id)
        .await
        .unwrap();
    let charge_sum: i64 = charges.iter().map(|c| c.amount_minor).sum();
    assert_eq!(charge_sum, stored.charges_total_minor);

    let intent = app
        .state
        .store
        .get_latest_intent_for_checkout(checkout_id)
        .await
        .unwrap()
        .expect("intent persisted");
    assert_eq!(intent.status, PaymentIntentStatus::RequiresAction);
    assert_eq!(intent.amount_minor, stored.total_minor);
    assert_eq!(intent.currency, stored.currency);
    assert!(intent.external_intent_id.is_some());

    let attempts = app
        .state
        .store
        .count_attempts_by_intent(intent.id)
        .await
        .unwrap();
    assert_eq!(attempts, 1);
}

#[tokio::test]
async fn checkout_summary_reflects_the_stored_state() {
    let app = TestApp::new().await;
    let cart_id = app.seed_cart(5_000, 2, 2_000).await;
    let (checkout_id, intent_id) = create_checkout(&app, cart_id).await;

    let (status, body) = app
        .get(&format!("/api/v1/payments/checkout/{}", checkout_id))
        .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["subtotal"], "100.00");
    assert_eq!(data["total_amount"], "139.00");
    assert_eq!(data["status"], "awaiting_payment");
    assert_eq!(data["payment_intent_id"], intent_id.to_string());
    assert_eq!(data["charges"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn missing_cart_id_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json("/api/v1/payments/checkout", json!({ "provider_code": "wompi" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
}

#[tokio::test]
async fn unknown_cart_is_not_found() {
    let app = TestApp::new().await;

    let (status, _) = app
        .post_json(
            "/api/v1/payments/checkout",
            json!({ "cart_id": Uuid::new_v4() }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cart_without_shipping_is_rejected() {
    let app = TestApp::new().await;
    let cart_id = app.seed_cart_without_shipping(5_000, 1).await;

    let (status, body) = app
        .post_json("/api/v1/payments/checkout", json!({ "cart_id": cart_id }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
}

#[tokio::test]
async fn unknown_provider_code_is_rejected() {
    let app = TestApp::new().await;
    let cart_id = app.seed_cart(5_000, 1, 1_000).await;

    let (status, body) = app
        .post_json(
            "/api/v1/payments/checkout",
            json!({ "cart_id": cart_id, "provider_code": "stripe" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
}

#[tokio::test]
async fn resubmitting_the_same_cart_returns_the_same_checkout() {
    let app = TestApp::new().await;
    let cart_id = app.seed_cart(5_000, 2, 2_000).await;

    let (first_checkout, first_intent) = create_checkout(&app, cart_id).await;
    let (second_checkout, second_intent) = create_checkout(&app, cart_id).await;

    assert_eq!(first_checkout, second_checkout);
    // A retry creates a fresh intent for the same checkout.
    assert_ne!(first_intent, second_intent);

    let checkouts = Checkout::find()
        .filter(payments_api::entities::checkout::Column::CartId.eq(cart_id))
        .count(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(checkouts, 1);
}

#[tokio::test]
async fn gateway_outage_persists_a_failed_attempt_and_keeps_the_checkout() {
    let (gateway, outage) = MockGateway::failing();
    let app = TestApp::with_gateway(gateway).await;
    let cart_id = app.seed_cart(5_000, 2, 2_000).await;

    let (status, body) = app
        .post_json("/api/v1/payments/checkout", json!({ "cart_id": cart_id }))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "body: {}", body);

    let checkout = app
        .state
        .store
        .get_checkout_by_idempotency_key(&format!("chk_{}", cart_id))
        .await
        .unwrap()
        .expect("checkout persisted despite gateway outage");

    let intent = app
        .state
        .store
        .get_latest_intent_for_checkout(checkout.id)
        .await
        .unwrap()
        .expect("failed intent persisted");
    assert_eq!(intent.status, PaymentIntentStatus::Failed);

    let failed_attempts = PaymentAttempt::find()
        .filter(payment_attempt::Column::PaymentIntentId.eq(intent.id))
        .filter(payment_attempt::Column::Status.eq(payment_attempt::PaymentAttemptStatus::Failed))
        .count(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(failed_attempts, 1);

    // Provider recovers; the retry reuses the checkout and succeeds.
    outage.store(false, Ordering::SeqCst);
    let (retry_checkout, retry_intent) = create_checkout(&app, cart_id).await;
    assert_eq!(retry_checkout, checkout.id);
    assert_ne!(retry_intent, intent.id);
}

#[tokio::test]
async fn health_endpoint_reports_database_state() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["checks"]["database"], "healthy");
}
