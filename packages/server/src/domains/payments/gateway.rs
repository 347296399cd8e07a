//! Payment gateway adapter.
//!
//! Wraps the external processor's REST API: one call that creates a hosted
//! checkout session for the fixed lifetime-access SKU. Webhook delivery is
//! handled separately in `webhook.rs`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domains::identity::User;

/// Hosted checkout session returned by the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSession {
    pub payment_id: String,
    pub hosted_payment_url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted checkout session for a fixed amount.
    async fn create_checkout(
        &self,
        user: &User,
        amount_cents: i64,
        currency: &str,
        redirect_url: &str,
    ) -> Result<CheckoutSession>;
}

/// Checkout creation request.
#[derive(Debug, Serialize)]
struct CheckoutRequest<'a> {
    product_id: &'a str,
    amount: i64,
    currency: &'a str,
    customer: CheckoutCustomer<'a>,
    redirect_url: &'a str,
}

#[derive(Debug, Serialize)]
struct CheckoutCustomer<'a> {
    external_id: String,
    email: &'a str,
}

/// Checkout creation response.
#[derive(Debug, Deserialize)]
struct CheckoutResponse {
    payment_id: String,
    payment_url: String,
}

/// REST client for the hosted checkout API
pub struct HostedCheckoutClient {
    api_key: String,
    base_url: String,
    product_id: String,
    client: reqwest::Client,
}

impl HostedCheckoutClient {
    /// Create a new checkout client
    pub fn new(api_key: String, base_url: String, product_id: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key,
            base_url,
            product_id,
            client,
        })
    }
}

#[async_trait]
impl PaymentGateway for HostedCheckoutClient {
    async fn create_checkout(
        &self,
        user: &User,
        amount_cents: i64,
        currency: &str,
        redirect_url: &str,
    ) -> Result<CheckoutSession> {
        let request = CheckoutRequest {
            product_id: &self.product_id,
            amount: amount_cents,
            currency,
            customer: CheckoutCustomer {
                external_id: user.id.to_string(),
                email: &user.email,
            },
            redirect_url,
        };

        let response = self
            .client
            .post(format!("{}/checkouts", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send checkout request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Payment gateway error {}: {}", status, body);
        }

        let checkout: CheckoutResponse = response
            .json()
            .await
            .context("Failed to parse checkout response")?;

        Ok(CheckoutSession {
            payment_id: checkout.payment_id,
            hosted_payment_url: checkout.payment_url,
        })
    }
}
