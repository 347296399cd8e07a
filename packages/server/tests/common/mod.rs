//! Shared fixtures for integration tests.
//!
//! Tests run the full axum router against the in-memory stores, so no
//! external services are needed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use founderswall_core::domains::identity::{SessionIdentityProvider, User};
use founderswall_core::domains::mugshots::MemoryMugshotStore;
use founderswall_core::domains::payments::{
    CheckoutSession, MemoryPaymentStore, MemoryWebhookStore, PaymentGateway,
};
use founderswall_core::server::{build_app, AppState};
use founderswall_core::Config;

pub const ADMIN_EMAIL: &str = "warden@founderswall.dev";

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        port: 0,
        public_base_url: "http://localhost:8080".to_string(),
        payment_api_key: "test_key".to_string(),
        payment_api_base: "https://gateway.invalid".to_string(),
        payment_product_id: "prod_lifetime".to_string(),
        lifetime_price_cents: 4900,
        currency: "usd".to_string(),
        admin_emails: vec![ADMIN_EMAIL.to_string()],
        rate_limit_enabled: false,
    }
}

/// Deterministic gateway stand-in: no network, sequential payment ids.
pub struct FakeGateway {
    calls: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout(
        &self,
        _user: &User,
        _amount_cents: i64,
        _currency: &str,
        _redirect_url: &str,
    ) -> Result<CheckoutSession> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CheckoutSession {
            payment_id: format!("pay_test_{n}"),
            hosted_payment_url: format!("https://gateway.invalid/session/{n}"),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub identity: Arc<SessionIdentityProvider>,
    pub mugshots: Arc<MemoryMugshotStore>,
    pub payments: Arc<MemoryPaymentStore>,
    pub webhooks: Arc<MemoryWebhookStore>,
}

pub fn spawn_app() -> TestApp {
    let identity = Arc::new(SessionIdentityProvider::new());
    let mugshots = Arc::new(MemoryMugshotStore::new());
    let payments = Arc::new(MemoryPaymentStore::new());
    let webhooks = Arc::new(MemoryWebhookStore::new());

    let state = AppState::new(
        None,
        test_config(),
        identity.clone(),
        mugshots.clone(),
        payments.clone(),
        webhooks.clone(),
        Arc::new(FakeGateway::new()),
    );

    TestApp {
        router: build_app(state),
        identity,
        mugshots,
        payments,
        webhooks,
    }
}

pub fn request(
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send a request through the router and decode the JSON response body.
pub async fn send(
    router: &Router,
    req: Request<Body>,
) -> (StatusCode, serde_json::Value) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

/// Sign in a user and return the session token.
pub async fn sign_in(app: &TestApp, email: &str) -> String {
    let (status, body) = send(
        &app.router,
        request(
            "POST",
            "/auth/session",
            None,
            Some(serde_json::json!({ "email": email })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "sign-in failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

/// Sign in and create a mugshot, returning the session token.
pub async fn sign_in_with_mugshot(app: &TestApp, email: &str, name: &str) -> String {
    let token = sign_in(app, email).await;
    let (status, body) = send(
        &app.router,
        request(
            "POST",
            "/mugshots",
            Some(&token),
            Some(serde_json::json!({
                "name": name,
                "crime": "Shipped an MVP in a weekend",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "mugshot creation failed: {body}");
    token
}

/// Deliver a gateway webhook event.
pub async fn deliver_webhook(
    app: &TestApp,
    event_id: &str,
    event_type: &str,
    payment_id: &str,
) -> (StatusCode, serde_json::Value) {
    send(
        &app.router,
        request(
            "POST",
            "/webhooks/payments",
            None,
            Some(serde_json::json!({
                "event_id": event_id,
                "event_type": event_type,
                "payment_id": payment_id,
                "status": null,
                "customer": null,
                "metadata": { "payment_method": "card" },
            })),
        ),
    )
    .await
}
