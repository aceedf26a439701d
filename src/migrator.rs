use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260110_000001_create_cart_tables::Migration),
            Box::new(m20260110_000002_create_checkout_tables::Migration),
            Box::new(m20260110_000003_create_payment_tables::Migration),
            Box::new(m20260110_000004_create_ledger_tables::Migration),
            Box::new(m20260110_000005_seed_payment_providers::Migration),
        ]
    }
}

// Migration implementations

mod m20260110_000001_create_cart_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260110_000001_create_cart_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Carts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Carts::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Carts::BuyerUserId).uuid().not_null())
                        .col(ColumnDef::new(Carts::Context).string().not_null())
                        .col(ColumnDef::new(Carts::ContextShopId).uuid().null())
                        .col(ColumnDef::new(Carts::Currency).string().not_null())
                        .col(ColumnDef::new(Carts::Status).string().not_null())
                        .col(ColumnDef::new(Carts::CreatedAt).timestamp_with_time_zone().not_null())
                        .col(ColumnDef::new(Carts::UpdatedAt).timestamp_with_time_zone().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CartItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CartItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CartItems::CartId).uuid().not_null())
                        .col(ColumnDef::new(CartItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(CartItems::SellerShopId).uuid().not_null())
                        .col(ColumnDef::new(CartItems::Quantity).integer().not_null())
                        .col(ColumnDef::new(CartItems::Currency).string().not_null())
                        .col(
                            ColumnDef::new(CartItems::UnitPriceMinor)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CartItems::CreatedAt).timestamp_with_time_zone().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_cart_items_cart")
                                .from(CartItems::Table, CartItems::CartId)
                                .to(Carts::Table, Carts::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_cart_items_cart_id")
                        .table(CartItems::Table)
                        .col(CartItems::CartId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CartShippingInfo::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CartShippingInfo::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CartShippingInfo::CartId).uuid().not_null())
                        .col(
                            ColumnDef::new(CartShippingInfo::FullName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CartShippingInfo::Address)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CartShippingInfo::City).string().not_null())
                        .col(
                            ColumnDef::new(CartShippingInfo::ShippingCostMinor)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(CartShippingInfo::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_cart_shipping_info_cart")
                                .from(CartShippingInfo::Table, CartShippingInfo::CartId)
                                .to(Carts::Table, Carts::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_cart_shipping_info_cart_id")
                        .table(CartShippingInfo::Table)
                        .col(CartShippingInfo::CartId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CartShippingInfo::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(CartItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Carts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Carts {
        Table,
        Id,
        BuyerUserId,
        Context,
        ContextShopId,
        Currency,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum CartItems {
        Table,
        Id,
        CartId,
        ProductId,
        SellerShopId,
        Quantity,
        Currency,
        UnitPriceMinor,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum CartShippingInfo {
        Table,
        Id,
        CartId,
        FullName,
        Address,
        City,
        ShippingCostMinor,
        CreatedAt,
    }
}

mod m20260110_000002_create_checkout_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260110_000002_create_checkout_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Checkouts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Checkouts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Checkouts::CartId).uuid().not_null())
                        .col(ColumnDef::new(Checkouts::BuyerUserId).uuid().not_null())
                        .col(ColumnDef::new(Checkouts::Context).string().not_null())
                        .col(ColumnDef::new(Checkouts::ContextShopId).uuid().null())
                        .col(ColumnDef::new(Checkouts::Currency).string().not_null())
                        .col(ColumnDef::new(Checkouts::Status).string().not_null())
                        .col(
                            ColumnDef::new(Checkouts::SubtotalMinor)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Checkouts::ChargesTotalMinor)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Checkouts::TotalMinor)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Checkouts::IdempotencyKey)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Checkouts::CreatedAt).timestamp_with_time_zone().not_null())
                        .col(ColumnDef::new(Checkouts::UpdatedAt).timestamp_with_time_zone().not_null())
                        .to_owned(),
                )
                .await?;

            // The idempotency key is the duplicate-submission guard.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_checkouts_idempotency_key")
                        .table(Checkouts::Table)
                        .col(Checkouts::IdempotencyKey)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_checkouts_cart_id")
                        .table(Checkouts::Table)
                        .col(Checkouts::CartId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CheckoutCharges::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CheckoutCharges::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CheckoutCharges::CheckoutId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CheckoutCharges::ChargeTypeCode)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CheckoutCharges::Scope).string().not_null())
                        .col(
                            ColumnDef::new(CheckoutCharges::AmountMinor)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CheckoutCharges::Currency)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CheckoutCharges::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_checkout_charges_checkout")
                                .from(CheckoutCharges::Table, CheckoutCharges::CheckoutId)
                                .to(Checkouts::Table, Checkouts::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_checkout_charges_checkout_id")
                        .table(CheckoutCharges::Table)
                        .col(CheckoutCharges::CheckoutId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CheckoutCharges::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Checkouts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Checkouts {
        Table,
        Id,
        CartId,
        BuyerUserId,
        Context,
        ContextShopId,
        Currency,
        Status,
        SubtotalMinor,
        ChargesTotalMinor,
        TotalMinor,
        IdempotencyKey,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum CheckoutCharges {
        Table,
        Id,
        CheckoutId,
        ChargeTypeCode,
        Scope,
        AmountMinor,
        Currency,
        CreatedAt,
    }
}

mod m20260110_000003_create_payment_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260110_000003_create_payment_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PaymentProviders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PaymentProviders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PaymentProviders::Code).string().not_null())
                        .col(
                            ColumnDef::new(PaymentProviders::DisplayName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentProviders::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(PaymentProviders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_payment_providers_code")
                        .table(PaymentProviders::Table)
                        .col(PaymentProviders::Code)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PaymentIntents::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PaymentIntents::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PaymentIntents::CheckoutId).uuid().not_null())
                        .col(ColumnDef::new(PaymentIntents::ProviderId).uuid().not_null())
                        .col(
                            ColumnDef::new(PaymentIntents::ProviderCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentIntents::Currency)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentIntents::AmountMinor)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PaymentIntents::Status).string().not_null())
                        .col(
                            ColumnDef::new(PaymentIntents::ExternalIntentId)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PaymentIntents::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentIntents::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payment_intents_checkout")
                                .from(PaymentIntents::Table, PaymentIntents::CheckoutId)
                                .to(Checkouts::Table, Checkouts::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payment_intents_provider")
                                .from(PaymentIntents::Table, PaymentIntents::ProviderId)
                                .to(PaymentProviders::Table, PaymentProviders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payment_intents_checkout_id")
                        .table(PaymentIntents::Table)
                        .col(PaymentIntents::CheckoutId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payment_intents_external_id")
                        .table(PaymentIntents::Table)
                        .col(PaymentIntents::ExternalIntentId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PaymentAttempts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PaymentAttempts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentAttempts::PaymentIntentId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentAttempts::AttemptNo)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PaymentAttempts::Status).string().not_null())
                        .col(
                            ColumnDef::new(PaymentAttempts::RequestPayload)
                                .json()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PaymentAttempts::ResponsePayload)
                                .json()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PaymentAttempts::ErrorMessage)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PaymentAttempts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payment_attempts_intent")
                                .from(PaymentAttempts::Table, PaymentAttempts::PaymentIntentId)
                                .to(PaymentIntents::Table, PaymentIntents::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_payment_attempts_intent_attempt_no")
                        .table(PaymentAttempts::Table)
                        .col(PaymentAttempts::PaymentIntentId)
                        .col(PaymentAttempts::AttemptNo)
                        .unique()
                        .to_owned(),
                )
                .await?;

            // The event id is the at-most-once gate for webhook deliveries.
            manager
                .create_table(
                    Table::create()
                        .table(ProcessedEvents::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProcessedEvents::EventId)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProcessedEvents::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProcessedEvents::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PaymentAttempts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PaymentIntents::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PaymentProviders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PaymentProviders {
        Table,
        Id,
        Code,
        DisplayName,
        IsActive,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Checkouts {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum PaymentIntents {
        Table,
        Id,
        CheckoutId,
        ProviderId,
        ProviderCode,
        Currency,
        AmountMinor,
        Status,
        ExternalIntentId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum PaymentAttempts {
        Table,
        Id,
        PaymentIntentId,
        AttemptNo,
        Status,
        RequestPayload,
        ResponsePayload,
        ErrorMessage,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum ProcessedEvents {
        Table,
        EventId,
        CreatedAt,
    }
}

mod m20260110_000004_create_ledger_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260110_000004_create_ledger_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(LedgerAccounts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(LedgerAccounts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LedgerAccounts::OwnerType)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(LedgerAccounts::OwnerId).uuid().null())
                        .col(
                            ColumnDef::new(LedgerAccounts::AccountType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LedgerAccounts::Currency)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LedgerAccounts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_ledger_accounts_owner")
                        .table(LedgerAccounts::Table)
                        .col(LedgerAccounts::OwnerType)
                        .col(LedgerAccounts::OwnerId)
                        .col(LedgerAccounts::AccountType)
                        .col(LedgerAccounts::Currency)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(LedgerTransactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(LedgerTransactions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LedgerTransactions::ReferenceType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LedgerTransactions::ReferenceId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LedgerTransactions::Currency)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LedgerTransactions::IdempotencyKey)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LedgerTransactions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_ledger_transactions_idempotency_key")
                        .table(LedgerTransactions::Table)
                        .col(LedgerTransactions::IdempotencyKey)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_ledger_transactions_reference")
                        .table(LedgerTransactions::Table)
                        .col(LedgerTransactions::ReferenceType)
                        .col(LedgerTransactions::ReferenceId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(LedgerEntries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(LedgerEntries::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LedgerEntries::TransactionId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(LedgerEntries::AccountId).uuid().not_null())
                        .col(
                            ColumnDef::new(LedgerEntries::AmountMinor)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LedgerEntries::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_ledger_entries_transaction")
                                .from(LedgerEntries::Table, LedgerEntries::TransactionId)
                                .to(LedgerTransactions::Table, LedgerTransactions::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_ledger_entries_account")
                                .from(LedgerEntries::Table, LedgerEntries::AccountId)
                                .to(LedgerAccounts::Table, LedgerAccounts::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_ledger_entries_transaction_id")
                        .table(LedgerEntries::Table)
                        .col(LedgerEntries::TransactionId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(LedgerEntries::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(LedgerTransactions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(LedgerAccounts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum LedgerAccounts {
        Table,
        Id,
        OwnerType,
        OwnerId,
        AccountType,
        Currency,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum LedgerTransactions {
        Table,
        Id,
        ReferenceType,
        ReferenceId,
        Currency,
        IdempotencyKey,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum LedgerEntries {
        Table,
        Id,
        TransactionId,
        AccountId,
        AmountMinor,
        CreatedAt,
    }
}

mod m20260110_000005_seed_payment_providers {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260110_000005_seed_payment_providers"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let now = chrono::Utc::now();
            for (code, display_name) in [("wompi", "Wompi"), ("cobre", "Cobre")] {
                let insert = Query::insert()
                    .into_table(PaymentProviders::Table)
                    .columns([
                        PaymentProviders::Id,
                        PaymentProviders::Code,
                        PaymentProviders::DisplayName,
                        PaymentProviders::IsActive,
                        PaymentProviders::CreatedAt,
                    ])
                    .values_panic([
                        uuid::Uuid::new_v4().into(),
                        code.into(),
                        display_name.into(),
                        true.into(),
                        now.into(),
                    ])
                    .to_owned();
                manager.exec_stmt(insert).await?;
            }
            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let delete = Query::delete()
                .from_table(PaymentProviders::Table)
                .and_where(
                    Expr::col(PaymentProviders::Code).is_in(["wompi".to_string(), "cobre".to_string()]),
                )
                .to_owned();
            manager.exec_stmt(delete).await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum PaymentProviders {
        Table,
        Id,
        Code,
        DisplayName,
        IsActive,
        CreatedAt,
    }
}
