use async_trait::async_trait;
use chrono::{Duration, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration as StdDuration;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{GatewayEventStatus, GatewayResponse, PaymentGateway, PaymentGatewayEvent};
use crate::config::CobreConfig;
use crate::errors::ServiceError;
use crate::money;

const GATEWAY_TIMEOUT: StdDuration = StdDuration::from_secs(30);
/// Bank-rail aggregator links expire quickly.
const LINK_VALIDITY_MINUTES: i64 = 15;
/// The only Cobre event key that settles a payment.
const EVENT_KEY_BALANCE_CREDIT: &str = "accounts.balance.credit";

/// Cobre checkout adapter: authenticates per call, then creates a checkout
/// over the bank rails. Cobre publishes no webhook signature scheme, so
/// `validate_signature` is a pass-through and the endpoint relies on
/// network-layer protection (IP allowlist or URL token).
pub struct CobreGateway {
    client: reqwest::Client,
    config: CobreConfig,
}

impl CobreGateway {
    pub fn new(config: CobreConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(GATEWAY_TIMEOUT)
                .build()
                .unwrap_or_default(),
            config,
        }
    }

    async fn authenticate(&self) -> Result<String, ServiceError> {
        let url = format!("{}/v1/auth", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&AuthRequest {
                user_id: self.config.api_key.clone(),
                secret: self.config.api_secret.clone(),
            })
            .send()
            .await
            .map_err(|e| ServiceError::GatewayFailure(format!("cobre auth failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::GatewayFailure(format!(
                "cobre auth returned {}: {}",
                status, body
            )));
        }

        let parsed: AuthResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::GatewayFailure(format!("cobre auth unreadable: {}", e)))?;
        Ok(parsed.access_token)
    }
}

#[derive(Debug, Serialize)]
struct AuthRequest {
    user_id: String,
    secret: String,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct CheckoutRequest {
    alias: String,
    amount: i64,
    external_id: String,
    destination_id: String,
    checkout_rails: Vec<&'static str>,
    checkout_header: String,
    checkout_item: String,
    description_to_payee: String,
    valid_until: String,
    money_movement_intent_limit: u32,
    redirect_url: String,
}

#[derive(Debug, Deserialize)]
struct CheckoutResponse {
    checkout_url: String,
    id: String,
}

#[derive(Debug, Deserialize)]
struct WebhookBody {
    id: String,
    event_key: String,
    content: WebhookContent,
}

#[derive(Debug, Deserialize)]
struct WebhookContent {
    id: String,
    #[serde(default)]
    amount: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    metadata: WebhookMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookMetadata {
    #[serde(default)]
    mm_external_id: Option<String>,
}

#[async_trait]
impl PaymentGateway for CobreGateway {
    fn code(&self) -> &'static str {
        "cobre"
    }

    #[instrument(skip(self))]
    async fn generate_payment_link(
        &self,
        amount: Decimal,
        currency: &str,
        external_ref: Uuid,
    ) -> Result<GatewayResponse, ServiceError> {
        let token = self.authenticate().await?;
        let expires_at = Utc::now() + Duration::minutes(LINK_VALIDITY_MINUTES);

        let request = CheckoutRequest {
            alias: "Marketplace payments".to_string(),
            amount: money::decimal_to_minor(amount)?,
            external_id: external_ref.to_string(),
            destination_id: self.config.balance_id.clone(),
            checkout_rails: vec!["pse", "bancolombia", "nequi", "breb"],
            checkout_header: format!("Payment {}", currency),
            checkout_item: "Marketplace cart payment".to_string(),
            description_to_payee: format!(
                "Payment - {}",
                Utc::now().format("%d/%m/%Y %H:%M")
            ),
            valid_until: expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            money_movement_intent_limit: 1,
            redirect_url: "https://www.telar.co".to_string(),
        };

        let url = format!("{}/v1/checkouts", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::GatewayFailure(format!("cobre request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::GatewayFailure(format!(
                "cobre returned {}: {}",
                status, body
            )));
        }

        let parsed: CheckoutResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::GatewayFailure(format!("cobre response unreadable: {}", e)))?;

        Ok(GatewayResponse {
            url: parsed.checkout_url,
            external_id: parsed.id,
            expires_at,
        })
    }

    fn validate_signature(
        &self,
        _raw_body: &[u8],
        _signature_header: Option<&str>,
    ) -> Result<(), ServiceError> {
        // Cobre publishes no signature scheme. The webhook endpoint must be
        // protected at the network layer.
        Ok(())
    }

    fn parse_event(&self, raw_body: &[u8]) -> Result<PaymentGatewayEvent, ServiceError> {
        let raw_payload: serde_json::Value = serde_json::from_slice(raw_body)
            .map_err(|e| ServiceError::ValidationError(format!("webhook is not JSON: {}", e)))?;
        let body: WebhookBody = serde_json::from_value(raw_payload.clone())
            .map_err(|e| ServiceError::ValidationError(format!("unexpected webhook shape: {}", e)))?;

        let payment_link_id = body
            .content
            .metadata
            .mm_external_id
            .as_deref()
            .and_then(|r| Uuid::parse_str(r).ok());
        if payment_link_id.is_none() {
            warn!(
                metadata = ?body.content.metadata.mm_external_id,
                "cobre webhook carries no usable mm_external_id"
            );
        }

        let status = if body.event_key == EVENT_KEY_BALANCE_CREDIT {
            GatewayEventStatus::Approved
        } else {
            GatewayEventStatus::Other(body.event_key.clone())
        };

        Ok(PaymentGatewayEvent {
            event_id: body.id,
            external_tx_id: body.content.id,
            payment_link_id,
            status,
            amount_minor: body.content.amount,
            currency: body.content.currency,
            raw_payload,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gateway() -> CobreGateway {
        CobreGateway::new(CobreConfig {
            base_url: "https://api.cobre.co".to_string(),
            api_key: "cli_test".to_string(),
            api_secret: "secret".to_string(),
            balance_id: "bal_test".to_string(),
        })
    }

    fn webhook_body(event_key: &str, external_id: &str) -> Vec<u8> {
        json!({
            "id": "ev_7f3a",
            "event_key": event_key,
            "content": {
                "id": "mm_12345",
                "amount": 13900,
                "currency": "COP",
                "metadata": { "mm_external_id": external_id }
            }
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn balance_credit_maps_to_approved() {
        let intent_id = Uuid::new_v4();
        let body = webhook_body("accounts.balance.credit", &intent_id.to_string());
        let event = gateway().parse_event(&body).expect("event should parse");

        assert_eq!(event.event_id, "ev_7f3a");
        assert_eq!(event.external_tx_id, "mm_12345");
        assert_eq!(event.payment_link_id, Some(intent_id));
        assert_eq!(event.status, GatewayEventStatus::Approved);
        assert_eq!(event.amount_minor, Some(13900));
    }

    #[test]
    fn other_event_keys_are_ignored() {
        let body = webhook_body("accounts.balance.debit", &Uuid::new_v4().to_string());
        let event = gateway().parse_event(&body).expect("event should parse");
        assert_eq!(
            event.status,
            GatewayEventStatus::Other("accounts.balance.debit".to_string())
        );
    }

    #[test]
    fn signature_validation_is_a_pass_through() {
        assert!(gateway().validate_signature(b"anything", None).is_ok());
    }

    #[test]
    fn missing_metadata_yields_no_link_id() {
        let body = json!({
            "id": "ev_1",
            "event_key": "accounts.balance.credit",
            "content": { "id": "mm_1" }
        })
        .to_string()
        .into_bytes();
        let event = gateway().parse_event(&body).expect("event should parse");
        assert!(event.payment_link_id.is_none());
    }
}
