//! Pluggable payment gateway adapters.
//!
//! Each adapter translates between the internal payment flow and one
//! provider's API: it builds the provider request for a payment link,
//! verifies webhook signatures against the shared secret, and parses the
//! provider's webhook body into the uniform [`PaymentGatewayEvent`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::ServiceError;

pub mod cobre;
pub mod wompi;

pub use cobre::CobreGateway;
pub use wompi::WompiGateway;

/// Result of a successful payment-link creation.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    /// Public URL the buyer is redirected to.
    pub url: String,
    /// Provider-side identifier of the link/checkout.
    pub external_id: String,
    /// When the link stops being payable, per the adapter's policy.
    pub expires_at: DateTime<Utc>,
}

/// Terminal-or-not status reported by a provider webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEventStatus {
    Approved,
    Declined,
    Error,
    /// Any non-terminal provider status; processed as a no-op.
    Other(String),
}

/// Provider-agnostic webhook event, produced by an adapter's `parse_event`.
#[derive(Debug, Clone)]
pub struct PaymentGatewayEvent {
    /// Deduplication key. Providers without a stable event id get one
    /// synthesized by the adapter.
    pub event_id: String,
    /// Provider-side transaction identifier.
    pub external_tx_id: String,
    /// Our payment intent id, echoed back by the provider. `None` when the
    /// reference is absent or not a UUID; such events are orphans.
    pub payment_link_id: Option<Uuid>,
    pub status: GatewayEventStatus,
    pub amount_minor: Option<i64>,
    pub currency: Option<String>,
    pub raw_payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Capability set every provider adapter implements.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Registry key; matches `payment_providers.code`.
    fn code(&self) -> &'static str;

    /// Create a payment link for `amount` (decimal major units) referencing
    /// our intent id. The intent id is the reconciliation anchor when the
    /// webhook returns.
    async fn generate_payment_link(
        &self,
        amount: Decimal,
        currency: &str,
        external_ref: Uuid,
    ) -> Result<GatewayResponse, ServiceError>;

    /// Verify the webhook payload against the shared secret. Adapters whose
    /// provider publishes no signature scheme document a pass-through here
    /// and rely on network-layer protection.
    fn validate_signature(
        &self,
        raw_body: &[u8],
        signature_header: Option<&str>,
    ) -> Result<(), ServiceError>;

    /// Parse the provider webhook body into the uniform event.
    fn parse_event(&self, raw_body: &[u8]) -> Result<PaymentGatewayEvent, ServiceError>;
}

/// Read-only registry of gateway adapters, keyed by provider code.
/// Populated once at boot; unknown codes are a typed error.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    adapters: HashMap<String, Arc<dyn PaymentGateway>>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Arc<dyn PaymentGateway>) {
        self.adapters.insert(adapter.code().to_string(), adapter);
    }

    pub fn get(&self, code: &str) -> Result<Arc<dyn PaymentGateway>, ServiceError> {
        self.adapters
            .get(code)
            .cloned()
            .ok_or_else(|| ServiceError::UnsupportedProvider(code.to_string()))
    }

    pub fn codes(&self) -> Vec<&str> {
        self.adapters.keys().map(String::as_str).collect()
    }

    /// Build the registry from configuration; adapters with missing
    /// credentials are left out.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut registry = Self::new();
        if config.wompi.is_configured() {
            registry.register(Arc::new(WompiGateway::new(config.wompi.clone())));
        }
        if config.cobre.is_configured() {
            registry.register(Arc::new(CobreGateway::new(config.cobre.clone())));
        }
        registry
    }
}

/// Compare two hex digests without leaking the mismatch position.
pub(crate) fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}
