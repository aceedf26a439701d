//! Payments API Library
//!
//! Payment orchestration between the marketplace checkout experience and
//! external payment gateways: pricing, intent creation, webhook
//! reconciliation and double-entry ledger posting.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod gateways;
pub mod handlers;
pub mod metrics;
pub mod migrator;
pub mod money;
pub mod openapi;
pub mod services;
pub mod store;

use axum::{extract::State, response::Json, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::events::EventSender;
use crate::gateways::GatewayRegistry;
use crate::services::checkout::CheckoutService;
use crate::services::notifier::Notifier;
use crate::services::pricing::PricingService;
use crate::services::webhook::WebhookService;
use crate::store::PaymentStore;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: AppConfig,
    pub event_sender: EventSender,
    pub store: Arc<PaymentStore>,
    pub checkout_service: Arc<CheckoutService>,
    pub webhook_service: Arc<WebhookService>,
}

impl AppState {
    /// Wire the services over a connection pool and a gateway registry.
    /// Registries are immutable after this point.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: AppConfig,
        event_sender: EventSender,
        gateways: GatewayRegistry,
    ) -> Self {
        let store = Arc::new(PaymentStore::new(db.clone()));
        let gateways = Arc::new(gateways);
        let pricing = PricingService::new(store.clone(), config.vat_rate_bps);
        let notifier = Arc::new(Notifier::new(config.central_app_url.clone()));

        let checkout_service = Arc::new(CheckoutService::new(
            store.clone(),
            pricing,
            gateways.clone(),
            event_sender.clone(),
        ));
        let webhook_service = Arc::new(WebhookService::new(
            store.clone(),
            gateways,
            notifier,
            event_sender.clone(),
            config.platform_fee_bps,
        ));

        Self {
            db,
            config,
            event_sender,
            store,
            checkout_service,
            webhook_service,
        }
    }
}

// Common response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

// API v1 routes
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .nest(
            "/payments",
            handlers::checkout::payment_routes().merge(handlers::webhooks::webhook_routes()),
        )
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let version = env!("CARGO_PKG_VERSION");
    let status_data = json!({
        "status": "ok",
        "service": "payments-api",
        "version": version,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn success_response_wraps_data() {
        let response = ApiResponse::success("ok");
        assert!(response.success);
        assert_eq!(response.data, Some("ok"));
        assert!(response.message.is_none());
    }

    #[test]
    fn error_response_carries_message() {
        let response = ApiResponse::<()>::error("oops".into());
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.message.as_deref(), Some("oops"));
    }
}
