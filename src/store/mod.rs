//! Transactional persistence for checkouts, intents, attempts, processed
//! events and the double-entry ledger.
//!
//! Pool-level reads and per-entity writes live on [`PaymentStore`]. Work
//! that must be atomic with a state transition goes through
//! [`PaymentStore::with_transaction`], which hands the caller a scoped
//! [`TxStore`]; callers never touch the raw transaction handle and
//! commit/rollback is decided solely by the closure's return value.

use chrono::Utc;
use futures::future::BoxFuture;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::entities::{
    cart, cart_item, cart_shipping_info, checkout, checkout_charge, ledger_account, ledger_entry,
    ledger_transaction, payment_attempt, payment_intent, payment_provider, processed_event, Cart,
    CartItem, CartShippingInfo, Checkout, CheckoutCharge, LedgerAccount, PaymentAttempt,
    PaymentIntent, PaymentProvider,
};
use crate::errors::ServiceError;

/// Cart header plus the rows needed to price it.
#[derive(Debug, Clone)]
pub struct CartContext {
    pub cart: cart::Model,
    pub items: Vec<cart_item::Model>,
    pub shipping_info: Option<cart_shipping_info::Model>,
}

/// One movement inside a ledger transaction. Positive is a debit, negative
/// a credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerEntryLine {
    pub account_id: Uuid,
    pub amount_minor: i64,
}

/// Store facade over the shared connection pool.
#[derive(Clone)]
pub struct PaymentStore {
    db: Arc<DatabaseConnection>,
}

impl PaymentStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn get_cart_context(&self, cart_id: Uuid) -> Result<CartContext, ServiceError> {
        let cart = Cart::find_by_id(cart_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;

        let items = cart
            .find_related(CartItem)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db)?;

        let shipping_info = cart
            .find_related(CartShippingInfo)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db)?;

        Ok(CartContext {
            cart,
            items,
            shipping_info,
        })
    }

    pub async fn get_provider_id_by_code(&self, code: &str) -> Result<Uuid, ServiceError> {
        PaymentProvider::find()
            .filter(payment_provider::Column::Code.eq(code))
            .filter(payment_provider::Column::IsActive.eq(true))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db)?
            .map(|provider| provider.id)
            .ok_or_else(|| ServiceError::NotFound(format!("Payment provider {} not found", code)))
    }

    pub async fn get_checkout_by_id(
        &self,
        checkout_id: Uuid,
    ) -> Result<Option<checkout::Model>, ServiceError> {
        Checkout::find_by_id(checkout_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db)
    }

    pub async fn get_checkout_by_idempotency_key(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<checkout::Model>, ServiceError> {
        Checkout::find()
            .filter(checkout::Column::IdempotencyKey.eq(idempotency_key))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db)
    }

    pub async fn get_charges_for_checkout(
        &self,
        checkout_id: Uuid,
    ) -> Result<Vec<checkout_charge::Model>, ServiceError> {
        CheckoutCharge::find()
            .filter(checkout_charge::Column::CheckoutId.eq(checkout_id))
            .all(&*self.db)
            .await
            .map_err(ServiceError::db)
    }

    pub async fn get_intent_by_external_id(
        &self,
        external_intent_id: &str,
    ) -> Result<Option<payment_intent::Model>, ServiceError> {
        PaymentIntent::find()
            .filter(payment_intent::Column::ExternalIntentId.eq(external_intent_id))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db)
    }

    pub async fn get_latest_intent_for_checkout(
        &self,
        checkout_id: Uuid,
    ) -> Result<Option<payment_intent::Model>, ServiceError> {
        PaymentIntent::find()
            .filter(payment_intent::Column::CheckoutId.eq(checkout_id))
            .order_by_desc(payment_intent::Column::CreatedAt)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db)
    }

    /// Write the checkout row and all of its charges atomically. A unique
    /// collision on the idempotency key surfaces as `IntegrityViolation`;
    /// the orchestrator turns that into a duplicate-submission reply.
    #[instrument(skip(self, checkout, charges))]
    pub async fn save_checkout_full(
        &self,
        checkout: &checkout::Model,
        charges: &[checkout_charge::Model],
    ) -> Result<(), ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::db)?;

        checkout::ActiveModel {
            id: Set(checkout.id),
            cart_id: Set(checkout.cart_id),
            buyer_user_id: Set(checkout.buyer_user_id),
            context: Set(checkout.context),
            context_shop_id: Set(checkout.context_shop_id),
            currency: Set(checkout.currency.clone()),
            status: Set(checkout.status),
            subtotal_minor: Set(checkout.subtotal_minor),
            charges_total_minor: Set(checkout.charges_total_minor),
            total_minor: Set(checkout.total_minor),
            idempotency_key: Set(checkout.idempotency_key.clone()),
            created_at: Set(checkout.created_at),
            updated_at: Set(checkout.updated_at),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db)?;

        for charge in charges {
            checkout_charge::ActiveModel {
                id: Set(charge.id),
                checkout_id: Set(charge.checkout_id),
                charge_type_code: Set(charge.charge_type_code.clone()),
                scope: Set(charge.scope),
                amount_minor: Set(charge.amount_minor),
                currency: Set(charge.currency.clone()),
                created_at: Set(charge.created_at),
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::db)?;
        }

        txn.commit().await.map_err(ServiceError::db)
    }

    /// Upsert an intent on its id. Used both to create the intent and to
    /// attach the external id after the gateway call.
    pub async fn save_intent(&self, intent: &payment_intent::Model) -> Result<(), ServiceError> {
        let active = payment_intent::ActiveModel {
            id: Set(intent.id),
            checkout_id: Set(intent.checkout_id),
            provider_id: Set(intent.provider_id),
            provider_code: Set(intent.provider_code.clone()),
            currency: Set(intent.currency.clone()),
            amount_minor: Set(intent.amount_minor),
            status: Set(intent.status),
            external_intent_id: Set(intent.external_intent_id.clone()),
            created_at: Set(intent.created_at),
            updated_at: Set(intent.updated_at),
        };

        PaymentIntent::insert(active)
            .on_conflict(
                OnConflict::column(payment_intent::Column::Id)
                    .update_columns([
                        payment_intent::Column::Status,
                        payment_intent::Column::ExternalIntentId,
                        payment_intent::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&*self.db)
            .await
            .map_err(ServiceError::db)?;
        Ok(())
    }

    /// Append an attempt row. Attempts are audit records and never updated.
    pub async fn save_attempt(
        &self,
        attempt: &payment_attempt::Model,
    ) -> Result<(), ServiceError> {
        payment_attempt::ActiveModel {
            id: Set(attempt.id),
            payment_intent_id: Set(attempt.payment_intent_id),
            attempt_no: Set(attempt.attempt_no),
            status: Set(attempt.status),
            request_payload: Set(attempt.request_payload.clone()),
            response_payload: Set(attempt.response_payload.clone()),
            error_message: Set(attempt.error_message.clone()),
            created_at: Set(attempt.created_at),
        }
        .insert(&*self.db)
        .await
        .map_err(ServiceError::db)?;
        Ok(())
    }

    pub async fn count_attempts_by_intent(&self, intent_id: Uuid) -> Result<u64, ServiceError> {
        PaymentAttempt::find()
            .filter(payment_attempt::Column::PaymentIntentId.eq(intent_id))
            .count(&*self.db)
            .await
            .map_err(ServiceError::db)
    }

    /// Forward-path checkout status update (no row lock; webhook-side
    /// transitions go through `TxStore`).
    pub async fn update_checkout_status(
        &self,
        checkout_id: Uuid,
        status: checkout::CheckoutStatus,
    ) -> Result<checkout::Model, ServiceError> {
        let model = Checkout::find_by_id(checkout_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Checkout {} not found", checkout_id))
            })?;

        let mut active: checkout::ActiveModel = model.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await.map_err(ServiceError::db)
    }

    /// Run `f` inside a database transaction. The closure receives scoped
    /// repositories; commit happens iff it returns `Ok`, rollback otherwise.
    pub async fn with_transaction<F, T>(&self, f: F) -> Result<T, ServiceError>
    where
        F: for<'c> FnOnce(&'c TxStore<'c>) -> BoxFuture<'c, Result<T, ServiceError>> + Send,
        T: Send,
    {
        debug!("starting store transaction");
        let txn = self.db.begin().await.map_err(ServiceError::db)?;

        let result = {
            let tx_store = TxStore { tx: &txn };
            f(&tx_store).await
        };

        match result {
            Ok(value) => {
                txn.commit().await.map_err(ServiceError::db)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(error = %rollback_err, "transaction rollback failed");
                }
                Err(err)
            }
        }
    }
}

/// Scoped repositories bound to one open transaction.
pub struct TxStore<'c> {
    tx: &'c DatabaseTransaction,
}

impl<'c> TxStore<'c> {
    /// Pessimistically lock the intent row, serializing concurrent webhook
    /// processors for the same intent. SQLite has a single writer and no
    /// `FOR UPDATE` syntax, so the clause is skipped there.
    pub async fn get_intent_for_update(
        &self,
        intent_id: Uuid,
    ) -> Result<Option<payment_intent::Model>, ServiceError> {
        let mut query = PaymentIntent::find_by_id(intent_id);
        if self.tx.get_database_backend() != DbBackend::Sqlite {
            query = query.lock_exclusive();
        }
        query.one(self.tx).await.map_err(ServiceError::db)
    }

    pub async fn get_checkout(&self, checkout_id: Uuid) -> Result<checkout::Model, ServiceError> {
        Checkout::find_by_id(checkout_id)
            .one(self.tx)
            .await
            .map_err(ServiceError::db)?
            .ok_or_else(|| {
                ServiceError::IntegrityViolation(format!(
                    "intent references missing checkout {}",
                    checkout_id
                ))
            })
    }

    pub async fn update_intent_status(
        &self,
        intent: payment_intent::Model,
        status: payment_intent::PaymentIntentStatus,
    ) -> Result<payment_intent::Model, ServiceError> {
        let mut active: payment_intent::ActiveModel = intent.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        active.update(self.tx).await.map_err(ServiceError::db)
    }

    pub async fn update_checkout_status(
        &self,
        checkout: checkout::Model,
        status: checkout::CheckoutStatus,
    ) -> Result<checkout::Model, ServiceError> {
        let mut active: checkout::ActiveModel = checkout.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        active.update(self.tx).await.map_err(ServiceError::db)
    }

    /// At-most-once gate: inserting an already-seen event id yields
    /// `DuplicateEvent`, which rolls the transaction back and is mapped to
    /// an acknowledged no-op by the caller.
    pub async fn save_processed_event(&self, event_id: &str) -> Result<(), ServiceError> {
        let result = processed_event::ActiveModel {
            event_id: Set(event_id.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(self.tx)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                let err = ServiceError::db(e);
                if err.is_unique_violation() {
                    Err(ServiceError::DuplicateEvent(event_id.to_string()))
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Find or create the ledger account for the unique owner/type/currency
    /// combination.
    pub async fn get_or_create_account(
        &self,
        owner_type: ledger_account::OwnerType,
        owner_id: Option<Uuid>,
        account_type: ledger_account::AccountType,
        currency: &str,
    ) -> Result<Uuid, ServiceError> {
        let mut query = LedgerAccount::find()
            .filter(ledger_account::Column::OwnerType.eq(owner_type))
            .filter(ledger_account::Column::AccountType.eq(account_type))
            .filter(ledger_account::Column::Currency.eq(currency));
        query = match owner_id {
            Some(id) => query.filter(ledger_account::Column::OwnerId.eq(id)),
            None => query.filter(ledger_account::Column::OwnerId.is_null()),
        };

        if let Some(existing) = query.one(self.tx).await.map_err(ServiceError::db)? {
            return Ok(existing.id);
        }

        let created = ledger_account::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_type: Set(owner_type),
            owner_id: Set(owner_id),
            account_type: Set(account_type),
            currency: Set(currency.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(self.tx)
        .await
        .map_err(ServiceError::db)?;

        Ok(created.id)
    }

    /// Persist a balanced ledger transaction with its entries. The zero-sum
    /// invariant is enforced here, not only in the caller. A unique
    /// collision on the idempotency key means another processor already
    /// posted this transaction.
    pub async fn save_ledger_transaction(
        &self,
        reference_type: &str,
        reference_id: Uuid,
        currency: &str,
        idempotency_key: &str,
        entries: &[LedgerEntryLine],
    ) -> Result<Uuid, ServiceError> {
        if entries.is_empty() {
            return Err(ServiceError::InvariantViolation(
                "ledger transaction has no entries".to_string(),
            ));
        }
        if entries.iter().any(|entry| entry.amount_minor == 0) {
            return Err(ServiceError::InvariantViolation(
                "ledger entry amount must be non-zero".to_string(),
            ));
        }
        let sum: i64 = entries.iter().map(|entry| entry.amount_minor).sum();
        if sum != 0 {
            return Err(ServiceError::InvariantViolation(format!(
                "ledger entries for {} sum to {} instead of 0",
                idempotency_key, sum
            )));
        }

        let transaction_id = Uuid::new_v4();
        let result = ledger_transaction::ActiveModel {
            id: Set(transaction_id),
            reference_type: Set(reference_type.to_string()),
            reference_id: Set(reference_id),
            currency: Set(currency.to_string()),
            idempotency_key: Set(idempotency_key.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(self.tx)
        .await;

        if let Err(e) = result {
            let err = ServiceError::db(e);
            if err.is_unique_violation() {
                warn!(
                    idempotency_key = %idempotency_key,
                    "ledger transaction already posted"
                );
                return Err(ServiceError::DuplicateLedgerPosting(
                    idempotency_key.to_string(),
                ));
            }
            return Err(err);
        }

        for entry in entries {
            ledger_entry::ActiveModel {
                id: Set(Uuid::new_v4()),
                transaction_id: Set(transaction_id),
                account_id: Set(entry.account_id),
                amount_minor: Set(entry.amount_minor),
                created_at: Set(Utc::now()),
            }
            .insert(self.tx)
            .await
            .map_err(ServiceError::db)?;
        }

        Ok(transaction_id)
    }
}
