//! sea-orm entities for the payments and ledger schemas.

pub mod cart;
pub mod cart_item;
pub mod cart_shipping_info;
pub mod checkout;
pub mod checkout_charge;
pub mod ledger_account;
pub mod ledger_entry;
pub mod ledger_transaction;
pub mod payment_attempt;
pub mod payment_intent;
pub mod payment_provider;
pub mod processed_event;

pub use cart::Entity as Cart;
pub use cart_item::Entity as CartItem;
pub use cart_shipping_info::Entity as CartShippingInfo;
pub use checkout::Entity as Checkout;
pub use checkout_charge::Entity as CheckoutCharge;
pub use ledger_account::Entity as LedgerAccount;
pub use ledger_entry::Entity as LedgerEntry;
pub use ledger_transaction::Entity as LedgerTransaction;
pub use payment_attempt::Entity as PaymentAttempt;
pub use payment_intent::Entity as PaymentIntent;
pub use payment_provider::Entity as PaymentProvider;
pub use processed_event::Entity as ProcessedEvent;
