use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::entities::checkout::{self, CheckoutStatus};
use crate::entities::ledger_account::{AccountType, OwnerType};
use crate::entities::ledger_transaction::REFERENCE_TYPE_PAYMENT_INTENT;
use crate::entities::payment_intent::{self, PaymentIntentStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::gateways::{GatewayEventStatus, GatewayRegistry, PaymentGatewayEvent};
use crate::metrics;
use crate::services::ledger::{self, PaymentPostingAccounts};
use crate::services::notifier::{Notifier, PaymentNotification};
use crate::store::{PaymentStore, TxStore};

/// How a webhook delivery was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// A terminal transition was applied (and, on success, a ledger posting
    /// written) in this delivery.
    Processed,
    /// The event id or ledger posting was already recorded; no-op.
    Duplicate,
    /// The referenced intent is unknown; dropped so the provider stops
    /// retrying this delivery.
    Orphan,
    /// The intent was already terminal; late redelivery.
    AlreadyTerminal,
    /// Non-terminal provider status; recorded and otherwise ignored.
    Ignored,
}

/// Outcome of the transactional section, before post-commit side effects.
enum TxOutcome {
    Transitioned {
        intent: payment_intent::Model,
        checkout: checkout::Model,
    },
    AlreadyTerminal,
    Ignored,
}

/// Webhook orchestrator: verify, dedupe, lock, transition, post the ledger,
/// then notify. Everything between the idempotency gate and the ledger
/// write happens in one database transaction.
#[derive(Clone)]
pub struct WebhookService {
    store: Arc<PaymentStore>,
    gateways: Arc<GatewayRegistry>,
    notifier: Arc<Notifier>,
    event_sender: EventSender,
    platform_fee_bps: i64,
}

impl WebhookService {
    pub fn new(
        store: Arc<PaymentStore>,
        gateways: Arc<GatewayRegistry>,
        notifier: Arc<Notifier>,
        event_sender: EventSender,
        platform_fee_bps: i64,
    ) -> Self {
        Self {
            store,
            gateways,
            notifier,
            event_sender,
            platform_fee_bps,
        }
    }

    #[instrument(skip(self, raw_body, signature_header))]
    pub async fn process_payment_event(
        &self,
        provider_code: &str,
        raw_body: &[u8],
        signature_header: Option<&str>,
    ) -> Result<WebhookOutcome, ServiceError> {
        let gateway = self.gateways.get(provider_code)?;
        gateway.validate_signature(raw_body, signature_header)?;
        let event = gateway.parse_event(raw_body)?;

        metrics::WEBHOOKS_RECEIVED
            .with_label_values(&[provider_code])
            .inc();

        let Some(intent_id) = event.payment_link_id else {
            warn!(
                event_id = %event.event_id,
                external_tx_id = %event.external_tx_id,
                "webhook carries no resolvable intent reference, dropping"
            );
            return Ok(WebhookOutcome::Orphan);
        };

        let fee_bps = self.platform_fee_bps;
        let provider = provider_code.to_string();
        let tx_event = event.clone();
        let result = self
            .store
            .with_transaction(move |tx| {
                Box::pin(async move {
                    apply_event(tx, &tx_event, intent_id, &provider, fee_bps).await
                })
            })
            .await;

        match result {
            Ok(TxOutcome::Transitioned { intent, checkout }) => {
                self.after_commit(provider_code, &intent, &checkout).await;
                Ok(WebhookOutcome::Processed)
            }
            Ok(TxOutcome::AlreadyTerminal) => {
                info!(
                    intent_id = %intent_id,
                    event_id = %event.event_id,
                    "intent already terminal, late redelivery dropped"
                );
                Ok(WebhookOutcome::AlreadyTerminal)
            }
            Ok(TxOutcome::Ignored) => Ok(WebhookOutcome::Ignored),
            Err(ServiceError::DuplicateEvent(event_id)) => {
                metrics::WEBHOOKS_DUPLICATE.inc();
                info!(event_id = %event_id, "duplicate webhook delivery dropped");
                Ok(WebhookOutcome::Duplicate)
            }
            Err(ServiceError::DuplicateLedgerPosting(key)) => {
                // A concurrent processor already transitioned and posted.
                info!(idempotency_key = %key, "ledger posting raced, treating as processed");
                Ok(WebhookOutcome::Duplicate)
            }
            Err(ServiceError::OrphanEvent(reference)) => {
                // Rolled back: the event id stays unrecorded so a redelivery
                // after the intent lands can still be processed.
                warn!(
                    reference = %reference,
                    event_id = %event.event_id,
                    "webhook for unknown intent dropped"
                );
                Ok(WebhookOutcome::Orphan)
            }
            Err(other) => Err(other),
        }
    }

    async fn after_commit(
        &self,
        provider_code: &str,
        intent: &payment_intent::Model,
        checkout: &checkout::Model,
    ) {
        match intent.status {
            PaymentIntentStatus::Succeeded => {
                metrics::PAYMENTS_SUCCEEDED.inc();
                metrics::LEDGER_POSTINGS.inc();
                self.event_sender
                    .send_or_log(Event::PaymentSucceeded {
                        payment_intent_id: intent.id,
                        checkout_id: checkout.id,
                    })
                    .await;
            }
            PaymentIntentStatus::Failed => {
                metrics::PAYMENTS_FAILED.inc();
                self.event_sender
                    .send_or_log(Event::PaymentFailed {
                        payment_intent_id: intent.id,
                        checkout_id: checkout.id,
                    })
                    .await;
            }
            _ => {}
        }

        self.notifier.notify_detached(PaymentNotification {
            gateway_code: provider_code.to_string(),
            transaction_id: intent.id,
            cart_id: checkout.cart_id,
            status: checkout.status.as_str().to_string(),
        });
    }
}

/// Transactional section of the state machine: idempotency gate, row lock,
/// terminal check, transition and ledger posting.
async fn apply_event(
    tx: &TxStore<'_>,
    event: &PaymentGatewayEvent,
    intent_id: uuid::Uuid,
    provider_code: &str,
    platform_fee_bps: i64,
) -> Result<TxOutcome, ServiceError> {
    tx.save_processed_event(&event.event_id).await?;

    let Some(intent) = tx.get_intent_for_update(intent_id).await? else {
        return Err(ServiceError::OrphanEvent(intent_id.to_string()));
    };

    if intent.status.is_terminal() {
        return Ok(TxOutcome::AlreadyTerminal);
    }

    let checkout = tx.get_checkout(intent.checkout_id).await?;

    match &event.status {
        GatewayEventStatus::Approved => {
            if let Some(amount) = event.amount_minor {
                if amount != intent.amount_minor {
                    warn!(
                        intent_id = %intent.id,
                        event_amount = amount,
                        intent_amount = intent.amount_minor,
                        "webhook amount differs from intent amount"
                    );
                }
            }

            let intent = tx
                .update_intent_status(intent, PaymentIntentStatus::Succeeded)
                .await?;
            let checkout = tx
                .update_checkout_status(checkout, CheckoutStatus::Paid)
                .await?;

            let accounts = PaymentPostingAccounts {
                clearing: tx
                    .get_or_create_account(
                        OwnerType::Platform,
                        None,
                        AccountType::Clearing,
                        &intent.currency,
                    )
                    .await?,
                pending: tx
                    .get_or_create_account(
                        OwnerType::Shop,
                        checkout.context_shop_id,
                        AccountType::Pending,
                        &intent.currency,
                    )
                    .await?,
                revenue: tx
                    .get_or_create_account(
                        OwnerType::Platform,
                        None,
                        AccountType::Revenue,
                        &intent.currency,
                    )
                    .await?,
            };
            let entries = ledger::build_payment_entries(
                intent.amount_minor,
                platform_fee_bps,
                &accounts,
            );
            tx.save_ledger_transaction(
                REFERENCE_TYPE_PAYMENT_INTENT,
                intent.id,
                &intent.currency,
                &ledger::ledger_idempotency_key(provider_code, &event.event_id),
                &entries,
            )
            .await?;

            Ok(TxOutcome::Transitioned { intent, checkout })
        }
        GatewayEventStatus::Declined | GatewayEventStatus::Error => {
            let intent = tx
                .update_intent_status(intent, PaymentIntentStatus::Failed)
                .await?;
            let checkout = tx
                .update_checkout_status(checkout, CheckoutStatus::Failed)
                .await?;
            Ok(TxOutcome::Transitioned { intent, checkout })
        }
        GatewayEventStatus::Other(status) => {
            debug!(
                intent_id = %intent.id,
                provider_status = %status,
                "non-terminal provider status, no transition"
            );
            Ok(TxOutcome::Ignored)
        }
    }
}
