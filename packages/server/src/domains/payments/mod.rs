//! Payments domain - lifetime-access purchases
//!
//! Responsibilities:
//! - Payment record lifecycle (pending -> completed | failed | cancelled)
//! - Hosted checkout session creation via the payment gateway
//! - Webhook ingestion with event-id deduplication (at-least-once delivery)
//! - The `has_lifetime_access` check consumed by the access decision

pub mod checkout;
pub mod gateway;
pub mod models;
pub mod store;
pub mod webhook;

pub use checkout::{initiate_checkout, CheckoutStarted};
pub use gateway::{CheckoutSession, HostedCheckoutClient, PaymentGateway};
pub use models::{PaymentRecord, PaymentStatus, WebhookEvent};
pub use store::{
    MemoryPaymentStore, MemoryWebhookStore, PaymentStore, PostgresPaymentStore,
    PostgresWebhookStore, WebhookStore,
};
