use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Audit record of one HTTP interaction with a gateway. Write-only; rows
/// are never mutated after insertion.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_attempts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub payment_intent_id: Uuid,
    pub attempt_no: i32,
    pub status: PaymentAttemptStatus,
    #[sea_orm(column_type = "Json", nullable)]
    pub request_payload: Option<Json>,
    #[sea_orm(column_type = "Json", nullable)]
    pub response_payload: Option<Json>,
    #[sea_orm(nullable)]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::payment_intent::Entity",
        from = "Column::PaymentIntentId",
        to = "super::payment_intent::Column::Id"
    )]
    PaymentIntent,
}

impl Related<super::payment_intent::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentIntent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Outcome of a single gateway interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PaymentAttemptStatus {
    #[sea_orm(string_value = "created")]
    Created,
    #[sea_orm(string_value = "redirected")]
    Redirected,
    #[sea_orm(string_value = "failed")]
    Failed,
}
