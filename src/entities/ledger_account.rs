use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Double-entry ledger account, unique per
/// `(owner_type, owner_id, account_type, currency)`. Platform accounts have
/// no owner id.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_type: OwnerType,
    #[sea_orm(nullable)]
    pub owner_id: Option<Uuid>,
    pub account_type: AccountType,
    pub currency: String,
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

/// Who owns the account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum OwnerType {
    #[sea_orm(string_value = "platform")]
    Platform,
    #[sea_orm(string_value = "shop")]
    Shop,
    #[sea_orm(string_value = "buyer")]
    Buyer,
}

/// Accounting role of the account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum AccountType {
    #[sea_orm(string_value = "clearing")]
    Clearing,
    #[sea_orm(string_value = "revenue")]
    Revenue,
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "receivable")]
    Receivable,
    #[sea_orm(string_value = "liability")]
    Liability,
}
