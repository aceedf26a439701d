use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One attempt to pay a checkout via one provider. `amount_minor` and
/// `currency` always equal the parent checkout's. `Succeeded` and `Failed`
/// are terminal; once reached the row is never mutated again.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_intents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub checkout_id: Uuid,
    pub provider_id: Uuid,
    pub provider_code: String,
    pub currency: String,
    pub amount_minor: i64,
    pub status: PaymentIntentStatus,
    #[sea_orm(nullable)]
    pub external_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::checkout::Entity",
        from = "Column::CheckoutId",
        to = "super::checkout::Column::Id"
    )]
    Checkout,
    #[sea_orm(
        belongs_to = "super::payment_provider::Entity",
        from = "Column::ProviderId",
        to = "super::payment_provider::Column::Id"
    )]
    Provider,
    #[sea_orm(has_many = "super::payment_attempt::Entity")]
    Attempts,
}

impl Related<super::checkout::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Checkout.def()
    }
}

impl Related<super::payment_provider::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Provider.def()
    }
}

impl Related<super::payment_attempt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attempts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Payment intent lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PaymentIntentStatus {
    #[sea_orm(string_value = "requires_action")]
    RequiresAction,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "succeeded")]
    Succeeded,
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl PaymentIntentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentIntentStatus::Succeeded | PaymentIntentStatus::Failed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentIntentStatus::RequiresAction => "requires_action",
            PaymentIntentStatus::Processing => "processing",
            PaymentIntentStatus::Succeeded => "succeeded",
            PaymentIntentStatus::Failed => "failed",
        }
    }
}
