use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Registered payment gateway provider. Seeded by migration; rows are
/// looked up by `code` when an intent is created.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_providers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub display_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payment_intent::Entity")]
    PaymentIntents,
}

impl Related<super::payment_intent::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentIntents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
