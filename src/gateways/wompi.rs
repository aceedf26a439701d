use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration as StdDuration;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    constant_time_eq, GatewayEventStatus, GatewayResponse, PaymentGateway, PaymentGatewayEvent,
};
use crate::config::WompiConfig;
use crate::errors::ServiceError;
use crate::money;

const GATEWAY_TIMEOUT: StdDuration = StdDuration::from_secs(30);
/// Card-gateway links stay payable for an hour.
const LINK_VALIDITY_HOURS: i64 = 1;
const CHECKOUT_URL_BASE: &str = "https://checkout.wompi.co/l/";

/// Wompi payment link adapter. Amounts cross this boundary as decimals and
/// are converted to `amount_in_cents` before hitting the provider.
pub struct WompiGateway {
    client: reqwest::Client,
    config: WompiConfig,
}

impl WompiGateway {
    pub fn new(config: WompiConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(GATEWAY_TIMEOUT)
                .build()
                .unwrap_or_default(),
            config,
        }
    }
}

#[derive(Debug, Serialize)]
struct PaymentLinkRequest {
    name: String,
    description: String,
    single_use: bool,
    collect_shipping: bool,
    currency: String,
    amount_in_cents: i64,
    expires_at: String,
    sku: String,
}

#[derive(Debug, Deserialize)]
struct PaymentLinkResponse {
    data: PaymentLinkData,
}

#[derive(Debug, Deserialize)]
struct PaymentLinkData {
    id: String,
}

#[derive(Debug, Deserialize)]
struct WebhookBody {
    event: String,
    data: WebhookData,
    timestamp: i64,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    transaction: WebhookTransaction,
}

#[derive(Debug, Deserialize)]
struct WebhookTransaction {
    id: String,
    #[serde(default)]
    reference: Option<String>,
    status: String,
    #[serde(default)]
    amount_in_cents: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
}

/// Render a JSON value the way the checksum concatenation expects it:
/// numbers without decimals, strings verbatim.
fn stringify_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                (n.as_f64().unwrap_or(0.0).trunc() as i64).to_string()
            }
        }
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl PaymentGateway for WompiGateway {
    fn code(&self) -> &'static str {
        "wompi"
    }

    #[instrument(skip(self))]
    async fn generate_payment_link(
        &self,
        amount: Decimal,
        currency: &str,
        external_ref: Uuid,
    ) -> Result<GatewayResponse, ServiceError> {
        let expires_at = Utc::now() + Duration::hours(LINK_VALIDITY_HOURS);
        let request = PaymentLinkRequest {
            name: format!("Payment {}", external_ref),
            description: format!("Marketplace payment {}", external_ref),
            single_use: true,
            collect_shipping: false,
            currency: currency.to_string(),
            amount_in_cents: money::decimal_to_minor(amount)?,
            expires_at: expires_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            sku: external_ref.to_string(),
        };

        let url = format!("{}/payment_links", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.private_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::GatewayFailure(format!("wompi request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::GatewayFailure(format!(
                "wompi returned {}: {}",
                status, body
            )));
        }

        let parsed: PaymentLinkResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::GatewayFailure(format!("wompi response unreadable: {}", e)))?;

        Ok(GatewayResponse {
            url: format!("{}{}", CHECKOUT_URL_BASE, parsed.data.id),
            external_id: parsed.data.id,
            expires_at,
        })
    }

    fn validate_signature(
        &self,
        raw_body: &[u8],
        _signature_header: Option<&str>,
    ) -> Result<(), ServiceError> {
        let body: serde_json::Value = serde_json::from_slice(raw_body)
            .map_err(|e| ServiceError::InvalidSignature(format!("payload is not JSON: {}", e)))?;

        let transaction = body
            .pointer("/data/transaction")
            .and_then(|v| v.as_object())
            .ok_or_else(|| {
                ServiceError::InvalidSignature("payload has no data.transaction".to_string())
            })?;
        let properties = body
            .pointer("/signature/properties")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                ServiceError::InvalidSignature("payload has no signature.properties".to_string())
            })?;
        let checksum = body
            .pointer("/signature/checksum")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ServiceError::InvalidSignature("payload has no signature.checksum".to_string())
            })?;
        let timestamp = body
            .get("timestamp")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| ServiceError::InvalidSignature("payload has no timestamp".to_string()))?;

        let mut concatenated = String::new();
        for property in properties {
            let name = property.as_str().ok_or_else(|| {
                ServiceError::InvalidSignature("signature property is not a string".to_string())
            })?;
            let key = name.strip_prefix("transaction.").unwrap_or(name);
            let value = transaction.get(key).ok_or_else(|| {
                ServiceError::InvalidSignature(format!("transaction has no property {}", name))
            })?;
            concatenated.push_str(&stringify_value(value));
        }
        concatenated.push_str(&timestamp.to_string());
        concatenated.push_str(&self.config.events_secret);

        let digest = hex::encode(Sha256::digest(concatenated.as_bytes()));
        if constant_time_eq(&digest, checksum.to_lowercase().as_str()) {
            Ok(())
        } else {
            Err(ServiceError::InvalidSignature(
                "checksum mismatch".to_string(),
            ))
        }
    }

    fn parse_event(&self, raw_body: &[u8]) -> Result<PaymentGatewayEvent, ServiceError> {
        let raw_payload: serde_json::Value = serde_json::from_slice(raw_body)
            .map_err(|e| ServiceError::ValidationError(format!("webhook is not JSON: {}", e)))?;
        let body: WebhookBody = serde_json::from_value(raw_payload.clone())
            .map_err(|e| ServiceError::ValidationError(format!("unexpected webhook shape: {}", e)))?;

        let transaction = body.data.transaction;
        let payment_link_id = transaction
            .reference
            .as_deref()
            .and_then(|r| Uuid::parse_str(r).ok());
        if payment_link_id.is_none() {
            warn!(
                reference = ?transaction.reference,
                "wompi webhook reference is not an intent id"
            );
        }

        let status = match transaction.status.as_str() {
            "APPROVED" => GatewayEventStatus::Approved,
            "DECLINED" => GatewayEventStatus::Declined,
            "ERROR" => GatewayEventStatus::Error,
            other => GatewayEventStatus::Other(other.to_string()),
        };

        Ok(PaymentGatewayEvent {
            // Wompi does not ship a unique event id; the event name plus the
            // signing timestamp is the closest stable identity available.
            event_id: format!("{}_{}", body.event, body.timestamp),
            external_tx_id: transaction.id,
            payment_link_id,
            status,
            amount_minor: transaction.amount_in_cents,
            currency: transaction.currency,
            raw_payload,
            created_at: DateTime::from_timestamp(body.timestamp, 0).unwrap_or_else(Utc::now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const EVENTS_SECRET: &str = "test_events_secret";
    // sha256("1234-1609" + "APPROVED" + "13900" + "1530291411" + secret)
    const VALID_CHECKSUM: &str =
        "ef857c1021ddc9e1c211fc9a166e103d5ef0c713959de69f60c97092f77ab161";

    fn gateway() -> WompiGateway {
        WompiGateway::new(WompiConfig {
            base_url: "https://sandbox.wompi.co/v1".to_string(),
            private_key: "prv_test_key".to_string(),
            events_secret: EVENTS_SECRET.to_string(),
        })
    }

    fn webhook_body(transaction_id: &str, checksum: &str) -> Vec<u8> {
        json!({
            "event": "transaction.updated",
            "data": {
                "transaction": {
                    "id": transaction_id,
                    "reference": "0c8a2a5a-7d3c-4f53-9a3c-0f6bb77f0f3e",
                    "status": "APPROVED",
                    "amount_in_cents": 13900,
                    "currency": "COP"
                }
            },
            "signature": {
                "properties": [
                    "transaction.id",
                    "transaction.status",
                    "transaction.amount_in_cents"
                ],
                "checksum": checksum
            },
            "timestamp": 1530291411i64,
            "environment": "test"
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn accepts_a_valid_checksum() {
        let body = webhook_body("1234-1609", VALID_CHECKSUM);
        assert!(gateway().validate_signature(&body, None).is_ok());
    }

    #[test]
    fn rejects_a_tampered_transaction() {
        // One byte of the transaction id flipped, checksum unchanged.
        let body = webhook_body("1234-1608", VALID_CHECKSUM);
        match gateway().validate_signature(&body, None) {
            Err(ServiceError::InvalidSignature(_)) => {}
            other => panic!("expected InvalidSignature, got {:?}", other),
        }
    }

    #[test]
    fn rejects_a_missing_signature_block() {
        let body = json!({
            "event": "transaction.updated",
            "data": { "transaction": { "id": "x", "status": "APPROVED" } },
            "timestamp": 1530291411i64
        })
        .to_string()
        .into_bytes();
        assert!(matches!(
            gateway().validate_signature(&body, None),
            Err(ServiceError::InvalidSignature(_))
        ));
    }

    #[test]
    fn stringifies_numbers_without_decimals() {
        assert_eq!(stringify_value(&json!(13900)), "13900");
        assert_eq!(stringify_value(&json!(13900.0)), "13900");
        assert_eq!(stringify_value(&json!("abc")), "abc");
        assert_eq!(stringify_value(&json!(true)), "true");
    }

    #[test]
    fn parses_an_approved_event() {
        let body = webhook_body("1234-1609", VALID_CHECKSUM);
        let event = gateway().parse_event(&body).expect("event should parse");

        assert_eq!(event.event_id, "transaction.updated_1530291411");
        assert_eq!(event.external_tx_id, "1234-1609");
        assert_eq!(
            event.payment_link_id,
            Some(Uuid::parse_str("0c8a2a5a-7d3c-4f53-9a3c-0f6bb77f0f3e").unwrap())
        );
        assert_eq!(event.status, GatewayEventStatus::Approved);
        assert_eq!(event.amount_minor, Some(13900));
        assert_eq!(event.currency.as_deref(), Some("COP"));
    }

    #[test]
    fn non_terminal_statuses_map_to_other() {
        let mut value: serde_json::Value =
            serde_json::from_slice(&webhook_body("1234-1609", VALID_CHECKSUM)).unwrap();
        value["data"]["transaction"]["status"] = json!("PENDING");
        let event = gateway()
            .parse_event(value.to_string().as_bytes())
            .expect("event should parse");
        assert_eq!(event.status, GatewayEventStatus::Other("PENDING".to_string()));
    }

    #[test]
    fn non_uuid_reference_parses_as_orphan() {
        let mut value: serde_json::Value =
            serde_json::from_slice(&webhook_body("1234-1609", VALID_CHECKSUM)).unwrap();
        value["data"]["transaction"]["reference"] = json!("legacy-ref-42");
        let event = gateway()
            .parse_event(value.to_string().as_bytes())
            .expect("event should parse");
        assert!(event.payment_link_id.is_none());
    }
}
