//! Ledger posting policy for settled payments.
//!
//! A successful payment splits the gross amount between the platform
//! clearing account (debit), the seller's pending balance (credit) and the
//! platform revenue account (credit for the fee). Entries always sum to
//! zero; the store re-checks the invariant before writing.

use uuid::Uuid;

use crate::store::LedgerEntryLine;

/// Resolved account ids for one payment posting.
#[derive(Debug, Clone, Copy)]
pub struct PaymentPostingAccounts {
    pub clearing: Uuid,
    pub pending: Uuid,
    pub revenue: Uuid,
}

/// Build the balanced entry set for a settled payment.
///
/// `platform_fee = floor(total * fee_bps / 10_000)`; the remainder is owed
/// to the seller. Zero-amount lines are dropped (the ledger rejects them).
pub fn build_payment_entries(
    total_minor: i64,
    platform_fee_bps: i64,
    accounts: &PaymentPostingAccounts,
) -> Vec<LedgerEntryLine> {
    let platform_fee = total_minor * platform_fee_bps / 10_000;
    let seller_due = total_minor - platform_fee;

    [
        LedgerEntryLine {
            account_id: accounts.clearing,
            amount_minor: total_minor,
        },
        LedgerEntryLine {
            account_id: accounts.pending,
            amount_minor: -seller_due,
        },
        LedgerEntryLine {
            account_id: accounts.revenue,
            amount_minor: -platform_fee,
        },
    ]
    .into_iter()
    .filter(|entry| entry.amount_minor != 0)
    .collect()
}

/// Idempotency key tying one ledger posting to one webhook delivery.
pub fn ledger_idempotency_key(provider_code: &str, event_id: &str) -> String {
    format!("{}_webhook_{}", provider_code, event_id)
}
