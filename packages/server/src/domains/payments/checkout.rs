//! Checkout initiation: one gateway session plus one pending record.

use anyhow::Result;
use serde::Serialize;

use crate::domains::identity::User;

use super::gateway::PaymentGateway;
use super::store::PaymentStore;

/// What the client needs to continue: where to pay, and which payment to
/// watch for.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutStarted {
    pub payment_id: String,
    pub hosted_payment_url: String,
}

/// Start a lifetime-access purchase.
///
/// Creates the hosted session first, then the pending record linked by the
/// gateway's payment id. If the record insert fails the session is simply
/// abandoned; the gateway expires unused sessions on its own.
pub async fn initiate_checkout(
    user: &User,
    gateway: &dyn PaymentGateway,
    payments: &dyn PaymentStore,
    amount_cents: i64,
    currency: &str,
    redirect_url: &str,
) -> Result<CheckoutStarted> {
    let session = gateway
        .create_checkout(user, amount_cents, currency, redirect_url)
        .await?;

    payments
        .create_pending(user.id, &session.payment_id, amount_cents, currency)
        .await?;

    tracing::info!(
        user_id = %user.id,
        payment_id = %session.payment_id,
        amount_cents,
        "Checkout session created"
    );

    Ok(CheckoutStarted {
        payment_id: session.payment_id,
        hosted_payment_url: session.hosted_payment_url,
    })
}
