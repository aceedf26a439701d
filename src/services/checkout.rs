use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::checkout::{self, CheckoutStatus};
use crate::entities::checkout_charge;
use crate::entities::payment_attempt::{self, PaymentAttemptStatus};
use crate::entities::payment_intent::{self, PaymentIntentStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::gateways::GatewayRegistry;
use crate::metrics;
use crate::money;
use crate::services::pricing::PricingService;
use crate::store::PaymentStore;

/// Input for the forward path.
#[derive(Debug, Clone)]
pub struct CheckoutInput {
    pub cart_id: Uuid,
    pub buyer_user_id: Option<Uuid>,
    pub provider_code: String,
    pub return_url: Option<String>,
}

/// Response returned to the client after the forward path completes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    pub checkout_id: Uuid,
    pub payment_intent_id: Option<Uuid>,
    pub checkout_url: Option<String>,
    pub status: String,
    pub total_amount: Decimal,
    pub currency: String,
}

/// Charge line inside a checkout summary.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChargeSummary {
    pub charge_type_code: String,
    pub amount: Decimal,
}

/// Read model for `GET /checkout/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutSummary {
    pub checkout_id: Uuid,
    pub cart_id: Uuid,
    pub status: String,
    pub currency: String,
    pub subtotal: Decimal,
    pub charges: Vec<ChargeSummary>,
    pub total_amount: Decimal,
    pub payment_intent_id: Option<Uuid>,
    pub payment_intent_status: Option<String>,
}

/// Checkout orchestrator: price, persist the immutable snapshot, create the
/// intent, call the gateway and persist the resulting link.
#[derive(Clone)]
pub struct CheckoutService {
    store: Arc<PaymentStore>,
    pricing: PricingService,
    gateways: Arc<GatewayRegistry>,
    event_sender: EventSender,
}

impl CheckoutService {
    pub fn new(
        store: Arc<PaymentStore>,
        pricing: PricingService,
        gateways: Arc<GatewayRegistry>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            store,
            pricing,
            gateways,
            event_sender,
        }
    }

    #[instrument(skip(self, input), fields(cart_id = %input.cart_id, provider = %input.provider_code))]
    pub async fn process_checkout(
        &self,
        input: CheckoutInput,
    ) -> Result<CheckoutResponse, ServiceError> {
        let priced = self.pricing.price(input.cart_id).await?;
        let now = Utc::now();

        // Deterministic per cart: a resubmission collides on the unique key
        // and is answered with the already-created checkout.
        let idempotency_key = format!("chk_{}", input.cart_id);

        let candidate = checkout::Model {
            id: Uuid::new_v4(),
            cart_id: priced.cart_id,
            buyer_user_id: input.buyer_user_id.unwrap_or(priced.buyer_user_id),
            context: priced.context,
            context_shop_id: priced.context_shop_id,
            currency: priced.currency.clone(),
            status: CheckoutStatus::Created,
            subtotal_minor: priced.subtotal_minor,
            charges_total_minor: priced.charges_total_minor,
            total_minor: priced.total_minor,
            idempotency_key: idempotency_key.clone(),
            created_at: now,
            updated_at: now,
        };
        let charges: Vec<checkout_charge::Model> = priced
            .charges
            .iter()
            .map(|charge| checkout_charge::Model {
                id: Uuid::new_v4(),
                checkout_id: candidate.id,
                charge_type_code: charge.charge_type_code.clone(),
                scope: charge.scope,
                amount_minor: charge.amount_minor,
                currency: priced.currency.clone(),
                created_at: now,
            })
            .collect();

        let checkout = match self.store.save_checkout_full(&candidate, &charges).await {
            Ok(()) => {
                metrics::CHECKOUTS_CREATED.inc();
                self.event_sender
                    .send_or_log(Event::CheckoutCreated {
                        checkout_id: candidate.id,
                        cart_id: candidate.cart_id,
                    })
                    .await;
                candidate
            }
            Err(err) if err.is_unique_violation() => {
                let existing = self
                    .store
                    .get_checkout_by_idempotency_key(&idempotency_key)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::InternalError(format!(
                            "checkout with idempotency key {} vanished",
                            idempotency_key
                        ))
                    })?;
                info!(
                    checkout_id = %existing.id,
                    "duplicate checkout submission, reusing existing checkout"
                );

                if existing.status.is_terminal() {
                    // Nothing left to pay; answer with the stored state.
                    let latest = self
                        .store
                        .get_latest_intent_for_checkout(existing.id)
                        .await?;
                    return Ok(CheckoutResponse {
                        checkout_id: existing.id,
                        payment_intent_id: latest.map(|intent| intent.id),
                        checkout_url: None,
                        status: existing.status.as_str().to_string(),
                        total_amount: money::minor_to_decimal(existing.total_minor),
                        currency: existing.currency.clone(),
                    });
                }
                existing
            }
            Err(err) => return Err(err),
        };

        let provider_id = self
            .store
            .get_provider_id_by_code(&input.provider_code)
            .await
            .map_err(|err| match err {
                ServiceError::NotFound(_) => {
                    ServiceError::UnsupportedProvider(input.provider_code.clone())
                }
                other => other,
            })?;
        let gateway = self.gateways.get(&input.provider_code)?;

        let intent = payment_intent::Model {
            id: Uuid::new_v4(),
            checkout_id: checkout.id,
            provider_id,
            provider_code: input.provider_code.clone(),
            currency: checkout.currency.clone(),
            amount_minor: checkout.total_minor,
            status: PaymentIntentStatus::RequiresAction,
            external_intent_id: None,
            created_at: now,
            updated_at: now,
        };

        let amount = money::minor_to_decimal(checkout.total_minor);
        let request_payload = serde_json::json!({
            "amount": amount,
            "currency": checkout.currency,
            "external_ref": intent.id,
            "return_url": input.return_url,
        });

        match gateway
            .generate_payment_link(amount, &checkout.currency, intent.id)
            .await
        {
            Err(err) => {
                warn!(error = %err, "payment link creation failed");
                metrics::GATEWAY_FAILURES
                    .with_label_values(&[input.provider_code.as_str()])
                    .inc();

                let mut failed = intent.clone();
                failed.status = PaymentIntentStatus::Failed;
                failed.updated_at = Utc::now();
                self.store.save_intent(&failed).await?;
                self.save_attempt(
                    &failed,
                    PaymentAttemptStatus::Failed,
                    Some(request_payload),
                    None,
                    Some(err.to_string()),
                )
                .await?;

                Err(err)
            }
            Ok(link) => {
                let mut live = intent.clone();
                live.external_intent_id = Some(link.external_id.clone());
                live.updated_at = Utc::now();
                self.store.save_intent(&live).await?;
                self.save_attempt(
                    &live,
                    PaymentAttemptStatus::Redirected,
                    Some(request_payload),
                    Some(serde_json::json!({
                        "url": link.url,
                        "external_id": link.external_id,
                        "expires_at": link.expires_at,
                    })),
                    None,
                )
                .await?;

                let updated = self
                    .store
                    .update_checkout_status(checkout.id, CheckoutStatus::AwaitingPayment)
                    .await?;

                metrics::PAYMENT_LINKS_CREATED
                    .with_label_values(&[input.provider_code.as_str()])
                    .inc();
                self.event_sender
                    .send_or_log(Event::PaymentIntentCreated {
                        payment_intent_id: live.id,
                        checkout_id: checkout.id,
                        provider_code: input.provider_code.clone(),
                    })
                    .await;
                info!(
                    checkout_id = %checkout.id,
                    payment_intent_id = %live.id,
                    "payment link created"
                );

                Ok(CheckoutResponse {
                    checkout_id: checkout.id,
                    payment_intent_id: Some(live.id),
                    checkout_url: Some(link.url),
                    status: updated.status.as_str().to_string(),
                    total_amount: amount,
                    currency: checkout.currency.clone(),
                })
            }
        }
    }

    /// Read model for a stored checkout.
    #[instrument(skip(self))]
    pub async fn get_checkout_summary(
        &self,
        checkout_id: Uuid,
    ) -> Result<CheckoutSummary, ServiceError> {
        let checkout = self
            .store
            .get_checkout_by_id(checkout_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Checkout {} not found", checkout_id))
            })?;
        let charges = self.store.get_charges_for_checkout(checkout_id).await?;
        let latest_intent = self.store.get_latest_intent_for_checkout(checkout_id).await?;

        Ok(CheckoutSummary {
            checkout_id: checkout.id,
            cart_id: checkout.cart_id,
            status: checkout.status.as_str().to_string(),
            currency: checkout.currency,
            subtotal: money::minor_to_decimal(checkout.subtotal_minor),
            charges: charges
                .into_iter()
                .map(|charge| ChargeSummary {
                    charge_type_code: charge.charge_type_code,
                    amount: money::minor_to_decimal(charge.amount_minor),
                })
                .collect(),
            total_amount: money::minor_to_decimal(checkout.total_minor),
            payment_intent_id: latest_intent.as_ref().map(|intent| intent.id),
            payment_intent_status: latest_intent
                .map(|intent| intent.status.as_str().to_string()),
        })
    }

    async fn save_attempt(
        &self,
        intent: &payment_intent::Model,
        status: PaymentAttemptStatus,
        request_payload: Option<serde_json::Value>,
        response_payload: Option<serde_json::Value>,
        error_message: Option<String>,
    ) -> Result<(), ServiceError> {
        let attempt_no = self.store.count_attempts_by_intent(intent.id).await? as i32 + 1;
        self.store
            .save_attempt(&payment_attempt::Model {
                id: Uuid::new_v4(),
                payment_intent_id: intent.id,
                attempt_no,
                status,
                request_payload,
                response_payload,
                error_message,
                created_at: Utc::now(),
            })
            .await
    }
}
