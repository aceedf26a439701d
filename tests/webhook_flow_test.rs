mod common;

use axum::http::StatusCode;
use common::{create_checkout, webhook_event, MockGateway, TestApp};
use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

use payments_api::entities::{
    checkout::CheckoutStatus, payment_intent::PaymentIntentStatus, LedgerTransaction,
    ProcessedEvent,
};

#[tokio::test]
async fn approved_webhook_settles_the_payment() {
    let app = TestApp::new().await;
    let cart_id = app.seed_cart(5_000, 2, 2_000).await;
    let (checkout_id, intent_id) = create_checkout(&app, cart_id).await;

    let event = webhook_event("evt-1", &intent_id.to_string(), "APPROVED", 13_900);
    let (status, body) = app.post_webhook("wompi", &event, None).await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);

    let intent = app
        .state
        .store
        .get_latest_intent_for_checkout(checkout_id)
        .await
        .unwrap()
        .expect("intent exists");
    assert_eq!(intent.status, PaymentIntentStatus::Succeeded);

    let checkout = app
        .state
        .store
        .get_checkout_by_id(checkout_id)
        .await
        .unwrap()
        .expect("checkout exists");
    assert_eq!(checkout.status, CheckoutStatus::Paid);

    let events = ProcessedEvent::find().count(&*app.state.db).await.unwrap();
    assert_eq!(events, 1);
}

#[tokio::test]
async fn duplicate_delivery_yields_exactly_one_transition_and_posting() {
    let app = TestApp::new().await;
    let cart_id = app.seed_cart(5_000, 2, 2_000).await;
    let (_, intent_id) = create_checkout(&app, cart_id).await;

    let event = webhook_event("evt-dup", &intent_id.to_string(), "APPROVED", 13_900);
    for _ in 0..3 {
        let (status, _) = app.post_webhook("wompi", &event, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(
        ProcessedEvent::find().count(&*app.state.db).await.unwrap(),
        1
    );
    assert_eq!(
        LedgerTransaction::find()
            .count(&*app.state.db)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn declined_webhook_fails_the_payment_without_ledger_rows() {
    let app = TestApp::new().await;
    let cart_id = app.seed_cart(5_000, 2, 2_000).await;
    let (checkout_id, intent_id) = create_checkout(&app, cart_id).await;

    let event = webhook_event("evt-decl", &intent_id.to_string(), "DECLINED", 13_900);
    let (status, _) = app.post_webhook("wompi", &event, None).await;
    assert_eq!(status, StatusCode::OK);

    let intent = app
        .state
        .store
        .get_latest_intent_for_checkout(checkout_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(intent.status, PaymentIntentStatus::Failed);

    let checkout = app
        .state
        .store
        .get_checkout_by_id(checkout_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(checkout.status, CheckoutStatus::Failed);

    assert_eq!(
        LedgerTransaction::find()
            .count(&*app.state.db)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn first_terminal_event_wins() {
    let app = TestApp::new().await;
    let cart_id = app.seed_cart(5_000, 2, 2_000).await;
    let (checkout_id, intent_id) = create_checkout(&app, cart_id).await;

    let approved = webhook_event("evt-a", &intent_id.to_string(), "APPROVED", 13_900);
    let (status, _) = app.post_webhook("wompi", &approved, None).await;
    assert_eq!(status, StatusCode::OK);

    // A later conflicting terminal event is acknowledged but ignored.
    let declined = webhook_event("evt-b", &intent_id.to_string(), "DECLINED", 13_900);
    let (status, _) = app.post_webhook("wompi", &declined, None).await;
    assert_eq!(status, StatusCode::OK);

    let intent = app
        .state
        .store
        .get_latest_intent_for_checkout(checkout_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(intent.status, PaymentIntentStatus::Succeeded);

    let checkout = app
        .state
        .store
        .get_checkout_by_id(checkout_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(checkout.status, CheckoutStatus::Paid);
}

#[tokio::test]
async fn orphan_event_is_acknowledged_and_leaves_no_trace() {
    let app = TestApp::new().await;

    let event = webhook_event("evt-orphan", &Uuid::new_v4().to_string(), "APPROVED", 1_000);
    let (status, _) = app.post_webhook("wompi", &event, None).await;

    assert_eq!(status, StatusCode::OK);
    // The event id is not recorded, so a redelivery after the intent lands
    // can still be processed.
    assert_eq!(
        ProcessedEvent::find().count(&*app.state.db).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn non_terminal_status_is_recorded_but_changes_nothing() {
    let app = TestApp::new().await;
    let cart_id = app.seed_cart(5_000, 2, 2_000).await;
    let (checkout_id, intent_id) = create_checkout(&app, cart_id).await;

    let event = webhook_event("evt-pending", &intent_id.to_string(), "PENDING", 13_900);
    let (status, _) = app.post_webhook("wompi", &event, None).await;
    assert_eq!(status, StatusCode::OK);

    let intent = app
        .state
        .store
        .get_latest_intent_for_checkout(checkout_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(intent.status, PaymentIntentStatus::RequiresAction);
    assert_eq!(
        ProcessedEvent::find().count(&*app.state.db).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn bad_signature_is_rejected_without_touching_state() {
    let app = TestApp::with_gateway(MockGateway::with_signature("t0ps3cret")).await;
    let cart_id = app.seed_cart(5_000, 2, 2_000).await;
    let (checkout_id, intent_id) = create_checkout(&app, cart_id).await;

    let event = webhook_event("evt-sig", &intent_id.to_string(), "APPROVED", 13_900);

    let (status, _) = app.post_webhook("wompi", &event, Some("wrong")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post_webhook("wompi", &event, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let intent = app
        .state
        .store
        .get_latest_intent_for_checkout(checkout_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(intent.status, PaymentIntentStatus::RequiresAction);
    assert_eq!(
        ProcessedEvent::find().count(&*app.state.db).await.unwrap(),
        0
    );

    // The correctly signed delivery still settles the payment.
    let (status, _) = app.post_webhook("wompi", &event, Some("t0ps3cret")).await;
    assert_eq!(status, StatusCode::OK);
    let intent = app
        .state
        .store
        .get_latest_intent_for_checkout(checkout_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(intent.status, PaymentIntentStatus::Succeeded);
}

#[tokio::test]
async fn unknown_provider_webhook_is_rejected() {
    let app = TestApp::new().await;

    let event = webhook_event("evt-x", &Uuid::new_v4().to_string(), "APPROVED", 1_000);
    let (status, _) = app.post_webhook("stripe", &event, None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_webhook_body_is_rejected() {
    let app = TestApp::new().await;

    let (status, _) = app
        .post_webhook("wompi", &serde_json::json!({ "unexpected": true }), None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
