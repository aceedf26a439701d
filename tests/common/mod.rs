#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use payments_api::{
    api_v1_routes,
    config::AppConfig,
    db,
    entities::{cart, cart_item, cart_shipping_info},
    errors::ServiceError,
    events::{self, EventSender},
    gateways::{
        GatewayEventStatus, GatewayRegistry, GatewayResponse, PaymentGateway, PaymentGatewayEvent,
    },
    health_check, AppState,
};

/// Gateway test double registered under the seeded `wompi` provider code.
/// The link call can be toggled to fail, and signature validation can be
/// armed with an expected header value.
pub struct MockGateway {
    fail_link: Arc<AtomicBool>,
    expected_signature: Option<String>,
}

impl MockGateway {
    pub fn passing() -> Self {
        Self {
            fail_link: Arc::new(AtomicBool::new(false)),
            expected_signature: None,
        }
    }

    pub fn failing() -> (Self, Arc<AtomicBool>) {
        let toggle = Arc::new(AtomicBool::new(true));
        (
            Self {
                fail_link: toggle.clone(),
                expected_signature: None,
            },
            toggle,
        )
    }

    pub fn with_signature(expected: &str) -> Self {
        Self {
            fail_link: Arc::new(AtomicBool::new(false)),
            expected_signature: Some(expected.to_string()),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    fn code(&self) -> &'static str {
        "wompi"
    }

    async fn generate_payment_link(
        &self,
        _amount: Decimal,
        _currency: &str,
        external_ref: Uuid,
    ) -> Result<GatewayResponse, ServiceError> {
        if self.fail_link.load(Ordering::SeqCst) {
            return Err(ServiceError::GatewayFailure(
                "connection reset by provider".to_string(),
            ));
        }
        Ok(GatewayResponse {
            url: format!("https://pay.test/l/{}", external_ref),
            external_id: format!("ext-{}", external_ref.simple()),
            expires_at: Utc::now() + ChronoDuration::hours(1),
        })
    }

    fn validate_signature(
        &self,
        _raw_body: &[u8],
        signature_header: Option<&str>,
    ) -> Result<(), ServiceError> {
        match &self.expected_signature {
            None => Ok(()),
            Some(expected) => match signature_header {
                Some(header) if header == expected => Ok(()),
                _ => Err(ServiceError::InvalidSignature(
                    "signature mismatch".to_string(),
                )),
            },
        }
    }

    fn parse_event(&self, raw_body: &[u8]) -> Result<PaymentGatewayEvent, ServiceError> {
        let value: Value = serde_json::from_slice(raw_body)
            .map_err(|e| ServiceError::ValidationError(format!("webhook is not JSON: {}", e)))?;
        let event_id = value["event_id"]
            .as_str()
            .ok_or_else(|| ServiceError::ValidationError("event_id is required".to_string()))?
            .to_string();
        let status = match value["status"].as_str().unwrap_or_default() {
            "APPROVED" => GatewayEventStatus::Approved,
            "DECLINED" => GatewayEventStatus::Declined,
            "ERROR" => GatewayEventStatus::Error,
            other => GatewayEventStatus::Other(other.to_string()),
        };

        Ok(PaymentGatewayEvent {
            event_id,
            external_tx_id: value["transaction_id"]
                .as_str()
                .unwrap_or("tx-unknown")
                .to_string(),
            payment_link_id: value["reference"]
                .as_str()
                .and_then(|r| Uuid::parse_str(r).ok()),
            status,
            amount_minor: value["amount_minor"].as_i64(),
            currency: value["currency"].as_str().map(String::from),
            raw_payload: value,
            created_at: Utc::now(),
        })
    }
}

/// Helper harness spinning up the application over an in-memory SQLite
/// database with a mock gateway in the registry.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_gateway(MockGateway::passing()).await
    }

    pub async fn with_gateway(gateway: MockGateway) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // A single pooled connection keeps the in-memory database alive and
        // shared across queries.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = tokio::sync::mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        tokio::spawn(events::process_events(event_rx));

        let mut registry = GatewayRegistry::new();
        registry.register(Arc::new(gateway));

        let state = AppState::new(db_arc, cfg, event_sender, registry);
        let router = Router::new()
            .route("/health", axum::routing::get(health_check))
            .nest("/api/v1", api_v1_routes())
            .with_state(state.clone());

        Self { router, state }
    }

    /// Insert a cart with one line item and shipping info; returns the cart id.
    pub async fn seed_cart(
        &self,
        unit_price_minor: i64,
        quantity: i32,
        shipping_cost_minor: i64,
    ) -> Uuid {
        let cart_id = self.seed_cart_without_shipping(unit_price_minor, quantity).await;

        cart_shipping_info::ActiveModel {
            id: Set(Uuid::new_v4()),
            cart_id: Set(cart_id),
            full_name: Set("Ana Gomez".to_string()),
            address: Set("Calle 1 # 2-3".to_string()),
            city: Set("Bogota".to_string()),
            shipping_cost_minor: Set(shipping_cost_minor),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed shipping info");

        cart_id
    }

    /// Insert a cart with one line item and no shipping info.
    pub async fn seed_cart_without_shipping(
        &self,
        unit_price_minor: i64,
        quantity: i32,
    ) -> Uuid {
        let cart_id = Uuid::new_v4();
        let now = Utc::now();

        cart::ActiveModel {
            id: Set(cart_id),
            buyer_user_id: Set(Uuid::new_v4()),
            context: Set(cart::SaleContext::Marketplace),
            context_shop_id: Set(None),
            currency: Set("COP".to_string()),
            status: Set(cart::CartStatus::Open),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed cart");

        cart_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            cart_id: Set(cart_id),
            product_id: Set(Uuid::new_v4()),
            seller_shop_id: Set(Uuid::new_v4()),
            quantity: Set(quantity),
            currency: Set("COP".to_string()),
            unit_price_minor: Set(unit_price_minor),
            created_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed cart item");

        cart_id
    }

    pub async fn post_json(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request(
            Request::post(path)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request should build"),
        )
        .await
    }

    pub async fn post_webhook(
        &self,
        provider: &str,
        body: &Value,
        signature: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::post(format!("/api/v1/payments/webhook/{}", provider))
            .header("content-type", "application/json");
        if let Some(signature) = signature {
            builder = builder.header("x-signature", signature);
        }
        self.request(
            builder
                .body(Body::from(body.to_string()))
                .expect("request should build"),
        )
        .await
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.request(
            Request::get(path)
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
    }

    async fn request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request should not fail at the transport level");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}

/// Webhook body understood by the mock gateway.
pub fn webhook_event(event_id: &str, reference: &str, status: &str, amount_minor: i64) -> Value {
    json!({
        "event_id": event_id,
        "transaction_id": format!("tx-{}", event_id),
        "reference": reference,
        "status": status,
        "amount_minor": amount_minor,
        "currency": "COP",
    })
}

/// Drive a cart through the forward path; returns (checkout_id, intent_id).
pub async fn create_checkout(app: &TestApp, cart_id: Uuid) -> (Uuid, Uuid) {
    let (status, body) = app
        .post_json(
            "/api/v1/payments/checkout",
            json!({ "cart_id": cart_id, "provider_code": "wompi" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "checkout failed: {}", body);

    let checkout_id = body["data"]["checkout_id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .expect("checkout_id in response");
    let intent_id = body["data"]["payment_intent_id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .expect("payment_intent_id in response");
    (checkout_id, intent_id)
}
