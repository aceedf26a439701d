mod common;

use axum::http::StatusCode;
use common::{create_checkout, webhook_event, TestApp};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use payments_api::entities::{
    ledger_account::{self, AccountType},
    ledger_entry, ledger_transaction, LedgerAccount, LedgerEntry, LedgerTransaction,
};

async fn settle_payment(app: &TestApp) -> (uuid::Uuid, uuid::Uuid) {
    let cart_id = app.seed_cart(5_000, 2, 2_000).await;
    let (checkout_id, intent_id) = create_checkout(app, cart_id).await;

    let event = webhook_event("evt-ledger", &intent_id.to_string(), "APPROVED", 13_900);
    let (status, _) = app.post_webhook("wompi", &event, None).await;
    assert_eq!(status, StatusCode::OK);
    (checkout_id, intent_id)
}

#[tokio::test]
async fn settled_payment_posts_a_balanced_split() {
    let app = TestApp::new().await;
    let (_, intent_id) = settle_payment(&app).await;

    let transaction = LedgerTransaction::find()
        .filter(ledger_transaction::Column::ReferenceId.eq(intent_id))
        .one(&*app.state.db)
        .await
        .unwrap()
        .expect("ledger transaction posted");
    assert_eq!(transaction.reference_type, "payment_intent");
    assert_eq!(transaction.currency, "COP");
    assert_eq!(transaction.idempotency_key, "wompi_webhook_evt-ledger");

    let entries = LedgerEntry::find()
        .filter(ledger_entry::Column::TransactionId.eq(transaction.id))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(entries.len(), 3);

    let sum: i64 = entries.iter().map(|e| e.amount_minor).sum();
    assert_eq!(sum, 0);

    // Total 13,900: clearing +13,900; revenue -floor(13,900 * 0.05) = -695;
    // pending -13,205.
    assert_eq!(
        entry_amount(&app, &entries, AccountType::Clearing).await,
        13_900
    );
    assert_eq!(
        entry_amount(&app, &entries, AccountType::Pending).await,
        -13_205
    );
    assert_eq!(
        entry_amount(&app, &entries, AccountType::Revenue).await,
        -695
    );
}

async fn entry_amount(
    app: &TestApp,
    entries: &[ledger_entry::Model],
    account_type: AccountType,
) -> i64 {
    let account = LedgerAccount::find()
        .filter(ledger_account::Column::AccountType.eq(account_type))
        .one(&*app.state.db)
        .await
        .unwrap()
        .expect("account exists");
    entries
        .iter()
        .find(|e| e.account_id == account.id)
        .expect("entry for account")
        .amount_minor
}

#[tokio::test]
async fn accounts_are_created_once_per_owner_type_and_currency() {
    let app = TestApp::new().await;
    settle_payment(&app).await;

    let accounts = LedgerAccount::find().all(&*app.state.db).await.unwrap();
    assert_eq!(accounts.len(), 3);

    // A second settled payment reuses the same accounts.
    // 1,000 + shipping 500 + VAT floor(1,000 * 0.19) = 1,690.
    let cart_id = app.seed_cart(1_000, 1, 500).await;
    let (_, intent_id) = create_checkout(&app, cart_id).await;
    let event = webhook_event("evt-ledger-2", &intent_id.to_string(), "APPROVED", 1_690);
    let (status, _) = app.post_webhook("wompi", &event, None).await;
    assert_eq!(status, StatusCode::OK);

    let accounts = LedgerAccount::find().all(&*app.state.db).await.unwrap();
    assert_eq!(accounts.len(), 3);
}

#[tokio::test]
async fn one_posting_per_intent_and_event() {
    let app = TestApp::new().await;
    let (_, intent_id) = settle_payment(&app).await;

    // Replays keep a single transaction for the intent/event pair.
    let event = webhook_event("evt-ledger", &intent_id.to_string(), "APPROVED", 13_900);
    let (status, _) = app.post_webhook("wompi", &event, None).await;
    assert_eq!(status, StatusCode::OK);

    let transactions = LedgerTransaction::find()
        .filter(ledger_transaction::Column::ReferenceId.eq(intent_id))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(transactions.len(), 1);
}
