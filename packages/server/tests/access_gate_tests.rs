//! End-to-end tests for the access decision engine and the gated routes:
//! verdict ordering, remediation responses, and fail-closed behavior.

mod common;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::http::StatusCode;
use tokio::sync::broadcast;
use uuid::Uuid;

use common::{
    deliver_webhook, request, send, sign_in, sign_in_with_mugshot, spawn_app, test_config,
    FakeGateway, ADMIN_EMAIL,
};
use founderswall_core::domains::identity::{
    IdentityProvider, SessionChange, SessionIdentityProvider, User,
};
use founderswall_core::domains::mugshots::{
    CreateMugshot, MemoryMugshotStore, Mugshot, MugshotStore, UpdateMugshot,
};
use founderswall_core::domains::payments::{MemoryPaymentStore, MemoryWebhookStore, PaymentStore};
use founderswall_core::server::{build_app, AppState};

#[tokio::test]
async fn anonymous_visitor_is_told_to_log_in() {
    // Scenario A: a paid route denies an anonymous visitor with login, not
    // payment - identity is checked first.
    let app = spawn_app();

    let (status, body) = send(&app.router, request("GET", "/wall", None, None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["verdict"], "require_login");
    assert_eq!(body["next_action"], "login");
    assert!(
        body["action_url"]
            .as_str()
            .unwrap()
            .contains("redirect_to=%2Fwall"),
        "login URL should preserve the requested destination: {body}"
    );
}

#[tokio::test]
async fn missing_profile_outranks_missing_payment() {
    // Scenario B: a signed-in user without a mugshot is told to create one,
    // even if they somehow already paid.
    let app = spawn_app();
    let token = sign_in(&app, "alice@founderswall.dev").await;

    let (_, me) = send(&app.router, request("GET", "/auth/me", Some(&token), None)).await;
    let user_id: Uuid = me["user_id"].as_str().unwrap().parse().unwrap();

    app.payments
        .create_pending(user_id, "pay_presold", 4900, "usd")
        .await
        .unwrap();
    app.payments.mark_completed("pay_presold", None).await.unwrap();

    let (status, body) = send(&app.router, request("GET", "/wall", Some(&token), None)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["verdict"], "require_profile");
    assert_eq!(body["next_action"], "create_profile");
}

#[tokio::test]
async fn unpaid_member_is_sent_to_checkout() {
    // Scenario C: profile exists, no payment record.
    let app = spawn_app();
    let token = sign_in_with_mugshot(&app, "alice@founderswall.dev", "Alice").await;

    let (status, body) = send(&app.router, request("GET", "/wall", Some(&token), None)).await;

    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["verdict"], "require_payment");
    assert_eq!(body["next_action"], "checkout");
    assert!(body["action_url"]
        .as_str()
        .unwrap()
        .ends_with("/payments/checkout"));
}

#[tokio::test]
async fn completed_payment_unlocks_the_wall() {
    // Scenarios C + D: checkout creates a pending record; the completion
    // webhook flips it and the verdict becomes allow.
    let app = spawn_app();
    let token = sign_in_with_mugshot(&app, "alice@founderswall.dev", "Alice").await;

    let (status, checkout) = send(
        &app.router,
        request("POST", "/payments/checkout", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "checkout failed: {checkout}");
    let payment_id = checkout["payment_id"].as_str().unwrap().to_string();
    assert!(checkout["hosted_payment_url"]
        .as_str()
        .unwrap()
        .starts_with("https://"));

    let record = app
        .payments
        .find_by_external_id(&payment_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, "pending");

    let (status, _) = deliver_webhook(&app, "evt_1", "payment.completed", &payment_id).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app.router, request("GET", "/wall", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["members"].as_array().unwrap().len() == 1);
}

#[tokio::test]
async fn redelivered_webhook_changes_nothing() {
    // Scenario E: at-least-once delivery of the same event id is a no-op.
    let app = spawn_app();
    let token = sign_in_with_mugshot(&app, "alice@founderswall.dev", "Alice").await;

    let (_, checkout) = send(
        &app.router,
        request("POST", "/payments/checkout", Some(&token), None),
    )
    .await;
    let payment_id = checkout["payment_id"].as_str().unwrap().to_string();

    deliver_webhook(&app, "evt_1", "payment.completed", &payment_id).await;
    let (status, body) = deliver_webhook(&app, "evt_1", "payment.completed", &payment_id).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "duplicate");
    assert_eq!(app.webhooks.event_count(), 1);

    let record = app
        .payments
        .find_by_external_id(&payment_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, "completed");

    let (status, _) = send(&app.router, request("GET", "/wall", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn lifetime_access_survives_re_sign_in() {
    // Lifetime access is permanent: a completed payment must keep
    // unlocking the wall across sign-out/sign-in cycles.
    let app = spawn_app();
    let token = sign_in_with_mugshot(&app, "alice@founderswall.dev", "Alice").await;

    let (_, checkout) = send(
        &app.router,
        request("POST", "/payments/checkout", Some(&token), None),
    )
    .await;
    let payment_id = checkout["payment_id"].as_str().unwrap().to_string();
    deliver_webhook(&app, "evt_1", "payment.completed", &payment_id).await;

    let (status, _) = send(&app.router, request("GET", "/wall", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);

    send(
        &app.router,
        request("DELETE", "/auth/session", Some(&token), None),
    )
    .await;
    let token = sign_in(&app, "alice@founderswall.dev").await;

    let (status, body) = send(&app.router, request("GET", "/wall", Some(&token), None)).await;
    assert_eq!(
        status,
        StatusCode::OK,
        "lifetime access must survive re-authentication: {body}"
    );
}

#[tokio::test]
async fn sign_out_locks_the_wall_again() {
    let app = spawn_app();
    let token = sign_in_with_mugshot(&app, "alice@founderswall.dev", "Alice").await;

    let (status, _) = send(
        &app.router,
        request("DELETE", "/auth/session", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app.router, request("GET", "/wall", Some(&token), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["verdict"], "require_login");
}

#[tokio::test]
async fn session_changes_reach_subscribers() {
    // Gated clients re-run their one-shot decision on these notifications
    // instead of polling.
    let app = spawn_app();
    let mut changes = app.identity.subscribe();

    let token = sign_in(&app, "alice@founderswall.dev").await;
    send(
        &app.router,
        request("DELETE", "/auth/session", Some(&token), None),
    )
    .await;

    assert!(matches!(
        changes.recv().await.unwrap(),
        SessionChange::SignedIn { .. }
    ));
    assert!(matches!(
        changes.recv().await.unwrap(),
        SessionChange::SignedOut { .. }
    ));
}

struct FailingIdentityProvider;

#[async_trait]
impl IdentityProvider for FailingIdentityProvider {
    async fn current_user(&self, _token: &str) -> Result<Option<User>> {
        anyhow::bail!("session store unavailable")
    }

    async fn resolve_principal(&self, _email: &str, _is_admin: bool) -> Result<User> {
        anyhow::bail!("session store unavailable")
    }

    async fn sign_in(&self, _user: User) -> Result<String> {
        anyhow::bail!("session store unavailable")
    }

    async fn sign_out(&self, _token: &str) -> Result<()> {
        anyhow::bail!("session store unavailable")
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        let (tx, _) = broadcast::channel(1);
        tx.subscribe()
    }
}

#[tokio::test]
async fn identity_failure_fails_closed_to_login() {
    // A broken session backend must never grant access; it degrades to the
    // safe default of requiring login.
    let state = AppState::new(
        None,
        test_config(),
        Arc::new(FailingIdentityProvider),
        Arc::new(MemoryMugshotStore::new()),
        Arc::new(MemoryPaymentStore::new()),
        Arc::new(MemoryWebhookStore::new()),
        Arc::new(FakeGateway::new()),
    );
    let router = build_app(state);

    let (status, body) = send(&router, request("GET", "/wall", Some("some-token"), None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["verdict"], "require_login");
}

struct FailingMugshotStore;

#[async_trait]
impl MugshotStore for FailingMugshotStore {
    async fn find_by_user_id(&self, _user_id: Uuid) -> Result<Option<Mugshot>> {
        anyhow::bail!("database unavailable")
    }

    async fn insert(&self, _user_id: Uuid, _payload: &CreateMugshot) -> Result<Mugshot> {
        anyhow::bail!("database unavailable")
    }

    async fn update_by_owner(
        &self,
        _user_id: Uuid,
        _payload: &UpdateMugshot,
    ) -> Result<Option<Mugshot>> {
        anyhow::bail!("database unavailable")
    }

    async fn delete(&self, _id: Uuid) -> Result<bool> {
        anyhow::bail!("database unavailable")
    }

    async fn list_visible(&self) -> Result<Vec<Mugshot>> {
        anyhow::bail!("database unavailable")
    }
}

#[tokio::test]
async fn profile_lookup_failure_is_a_retry_not_a_missing_profile() {
    // A dead database is not the same as "no profile": the user gets an
    // explicit retry, never a misleading create-profile prompt.
    let identity = Arc::new(SessionIdentityProvider::new());
    let state = AppState::new(
        None,
        test_config(),
        identity.clone(),
        Arc::new(FailingMugshotStore),
        Arc::new(MemoryPaymentStore::new()),
        Arc::new(MemoryWebhookStore::new()),
        Arc::new(FakeGateway::new()),
    );
    let router = build_app(state);

    let token = identity
        .sign_in(User::new("alice@founderswall.dev", false))
        .await
        .unwrap();

    let (status, body) = send(&router, request("GET", "/wall", Some(&token), None)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["next_action"], "retry");
}

#[tokio::test]
async fn checkout_requires_a_mugshot_first() {
    let app = spawn_app();
    let token = sign_in(&app, "alice@founderswall.dev").await;

    let (status, body) = send(
        &app.router,
        request("POST", "/payments/checkout", Some(&token), None),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["verdict"], "require_profile");
}

#[tokio::test]
async fn invalid_mugshot_payload_is_rejected_at_the_boundary() {
    let app = spawn_app();
    let token = sign_in(&app, "alice@founderswall.dev").await;

    let (status, body) = send(
        &app.router,
        request(
            "POST",
            "/mugshots",
            Some(&token),
            Some(serde_json::json!({ "name": "Alice", "crime": "  " })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("crime"));
    assert!(!app
        .mugshots
        .list_visible()
        .await
        .unwrap()
        .iter()
        .any(|m| m.name == "Alice"));
}

#[tokio::test]
async fn second_mugshot_for_same_user_conflicts() {
    let app = spawn_app();
    let token = sign_in_with_mugshot(&app, "alice@founderswall.dev", "Alice").await;

    let (status, _) = send(
        &app.router,
        request(
            "POST",
            "/mugshots",
            Some(&token),
            Some(serde_json::json!({ "name": "Alice 2", "crime": "Double posting" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn only_admins_can_delete_mugshots() {
    let app = spawn_app();
    let alice = sign_in_with_mugshot(&app, "alice@founderswall.dev", "Alice").await;

    let (_, body) = send(&app.router, request("GET", "/mugshots/me", Some(&alice), None)).await;
    let mugshot_id = body["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app.router,
        request("DELETE", &format!("/mugshots/{mugshot_id}"), Some(&alice), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let warden = sign_in(&app, ADMIN_EMAIL).await;
    let (status, _) = send(
        &app.router,
        request("DELETE", &format!("/mugshots/{mugshot_id}"), Some(&warden), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app.router, request("GET", "/mugshots/me", Some(&alice), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn owner_updates_flow_through_to_the_listing() {
    let app = spawn_app();
    let token = sign_in_with_mugshot(&app, "alice@founderswall.dev", "Alice").await;

    // Prime the listing cache.
    let (_, before) = send(&app.router, request("GET", "/mugshots", None, None)).await;
    assert_eq!(before["mugshots"][0]["name"], "Alice");

    let (status, updated) = send(
        &app.router,
        request(
            "PUT",
            "/mugshots/me",
            Some(&token),
            Some(serde_json::json!({ "name": "Alice the Shipper" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Alice the Shipper");
    assert_eq!(updated["crime"], "Shipped an MVP in a weekend");

    // The write invalidated the cache, so the listing reflects it.
    let (_, after) = send(&app.router, request("GET", "/mugshots", None, None)).await;
    assert_eq!(after["mugshots"][0]["name"], "Alice the Shipper");
}
