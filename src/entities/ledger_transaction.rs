use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger transaction header grouping a balanced set of entries. The unique
/// idempotency key guards against double-posting from webhook replays.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub reference_type: String,
    pub reference_id: Uuid,
    pub currency: String,
    #[sea_orm(unique)]
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ledger_entry::Entity")]
    Entries,
}

impl Related<super::ledger_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Reference type used for postings that settle a payment intent.
pub const REFERENCE_TYPE_PAYMENT_INTENT: &str = "payment_intent";
