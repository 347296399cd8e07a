use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Public base URL of this service, used to build login/checkout links
    /// and the post-payment redirect target.
    pub public_base_url: String,
    pub payment_api_key: String,
    pub payment_api_base: String,
    /// Fixed product id for the single lifetime-access SKU.
    pub payment_product_id: String,
    /// Fixed one-time price for lifetime access, in minor units.
    pub lifetime_price_cents: i64,
    pub currency: String,
    /// Emails granted the admin flag at sign-in.
    pub admin_emails: Vec<String>,
    pub rate_limit_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            payment_api_key: env::var("PAYMENT_API_KEY")
                .context("PAYMENT_API_KEY must be set")?,
            payment_api_base: env::var("PAYMENT_API_BASE")
                .unwrap_or_else(|_| "https://api.payments.example.com".to_string()),
            payment_product_id: env::var("PAYMENT_PRODUCT_ID")
                .context("PAYMENT_PRODUCT_ID must be set")?,
            lifetime_price_cents: env::var("LIFETIME_PRICE_CENTS")
                .unwrap_or_else(|_| "4900".to_string())
                .parse()
                .context("LIFETIME_PRICE_CENTS must be a valid number")?,
            currency: env::var("CURRENCY").unwrap_or_else(|_| "usd".to_string()),
            admin_emails: env::var("ADMIN_EMAILS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            rate_limit_enabled: env::var("RATE_LIMIT_ENABLED")
                .map(|v| v != "false")
                .unwrap_or(true),
        })
    }
}
