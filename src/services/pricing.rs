use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::entities::cart::SaleContext;
use crate::entities::checkout_charge::{ChargeScope, CHARGE_TYPE_SHIPPING, CHARGE_TYPE_VAT};
use crate::errors::ServiceError;
use crate::store::{CartContext, PaymentStore};

/// Charge line computed by the pricing engine, not yet persisted.
#[derive(Debug, Clone)]
pub struct PricedCharge {
    pub charge_type_code: String,
    pub scope: ChargeScope,
    pub amount_minor: i64,
}

/// Priced but not-yet-persisted checkout. The orchestrator assigns the id,
/// status and idempotency key before writing.
#[derive(Debug, Clone)]
pub struct PricedCheckout {
    pub cart_id: Uuid,
    pub buyer_user_id: Uuid,
    pub context: SaleContext,
    pub context_shop_id: Option<Uuid>,
    pub currency: String,
    pub subtotal_minor: i64,
    pub charges_total_minor: i64,
    pub total_minor: i64,
    pub charges: Vec<PricedCharge>,
}

/// Pricing engine: reads the cart context and computes subtotal, shipping
/// and taxes. Pure reads, no writes, so the forward path stays restartable
/// before persistence.
#[derive(Clone)]
pub struct PricingService {
    store: Arc<PaymentStore>,
    vat_rate_bps: i64,
}

impl PricingService {
    pub fn new(store: Arc<PaymentStore>, vat_rate_bps: i64) -> Self {
        Self {
            store,
            vat_rate_bps,
        }
    }

    #[instrument(skip(self))]
    pub async fn price(&self, cart_id: Uuid) -> Result<PricedCheckout, ServiceError> {
        let context = self.store.get_cart_context(cart_id).await?;
        compute(&context, self.vat_rate_bps)
    }
}

/// Pure pricing computation over an already-loaded cart context.
fn compute(context: &CartContext, vat_rate_bps: i64) -> Result<PricedCheckout, ServiceError> {
    let cart = &context.cart;

    if context.items.is_empty() {
        return Err(ServiceError::PreconditionFailed(format!(
            "Cart {} has no items",
            cart.id
        )));
    }

    let shipping_info = context.shipping_info.as_ref().ok_or_else(|| {
        ServiceError::PreconditionFailed(format!("Cart {} has no shipping info", cart.id))
    })?;

    let subtotal: i64 = context
        .items
        .iter()
        .map(|item| item.line_total_minor())
        .sum();
    let shipping = shipping_info.shipping_cost_minor;
    let vat = subtotal * vat_rate_bps / 10_000;
    let charges_total = shipping + vat;
    let total = subtotal + charges_total;

    Ok(PricedCheckout {
        cart_id: cart.id,
        buyer_user_id: cart.buyer_user_id,
        context: cart.context,
        context_shop_id: cart.context_shop_id,
        currency: cart.currency.clone(),
        subtotal_minor: subtotal,
        charges_total_minor: charges_total,
        total_minor: total,
        charges: vec![
            PricedCharge {
                charge_type_code: CHARGE_TYPE_SHIPPING.to_string(),
                scope: ChargeScope::Checkout,
                amount_minor: shipping,
            },
            PricedCharge {
                charge_type_code: CHARGE_TYPE_VAT.to_string(),
                scope: ChargeScope::Checkout,
                amount_minor: vat,
            },
        ],
    })
}
