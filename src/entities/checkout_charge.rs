use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Typed charge line on a checkout (shipping, VAT, platform fee). The sum
/// of a checkout's charges equals its `charges_total_minor`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "checkout_charges")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub checkout_id: Uuid,
    pub charge_type_code: String,
    pub scope: ChargeScope,
    pub amount_minor: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::checkout::Entity",
        from = "Column::CheckoutId",
        to = "super::checkout::Column::Id"
    )]
    Checkout,
}

impl Related<super::checkout::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Checkout.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Whether the charge applies to the whole checkout or a single order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ChargeScope {
    #[sea_orm(string_value = "checkout")]
    Checkout,
    #[sea_orm(string_value = "order")]
    Order,
}

/// Charge type codes emitted by the pricing engine.
pub const CHARGE_TYPE_SHIPPING: &str = "SHIPPING";
pub const CHARGE_TYPE_VAT: &str = "VAT";
