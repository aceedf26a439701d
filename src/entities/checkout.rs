use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::cart::SaleContext;

/// Immutable pricing snapshot of a cart at the moment payment was
/// initiated. Financial fields are frozen once the status leaves `created`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "checkouts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub cart_id: Uuid,
    pub buyer_user_id: Uuid,
    pub context: SaleContext,
    #[sea_orm(nullable)]
    pub context_shop_id: Option<Uuid>,
    pub currency: String,
    pub status: CheckoutStatus,
    pub subtotal_minor: i64,
    pub charges_total_minor: i64,
    pub total_minor: i64,
    #[sea_orm(unique)]
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cart::Entity",
        from = "Column::CartId",
        to = "super::cart::Column::Id"
    )]
    Cart,
    #[sea_orm(has_many = "super::checkout_charge::Entity")]
    Charges,
    #[sea_orm(has_many = "super::payment_intent::Entity")]
    PaymentIntents,
}

impl Related<super::cart::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cart.def()
    }
}

impl Related<super::checkout_charge::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Charges.def()
    }
}

impl Related<super::payment_intent::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentIntents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Checkout lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum CheckoutStatus {
    #[sea_orm(string_value = "created")]
    Created,
    #[sea_orm(string_value = "awaiting_payment")]
    AwaitingPayment,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "expired")]
    Expired,
}

impl CheckoutStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CheckoutStatus::Paid | CheckoutStatus::Failed | CheckoutStatus::Expired
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStatus::Created => "created",
            CheckoutStatus::AwaitingPayment => "awaiting_payment",
            CheckoutStatus::Paid => "paid",
            CheckoutStatus::Failed => "failed",
            CheckoutStatus::Expired => "expired",
        }
    }
}
