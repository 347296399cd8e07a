//! Identity provider adapter.
//!
//! The external auth provider is treated as an opaque collaborator that
//! resolves a session token to `{id, email} | None`. The adapter also
//! exposes a session-change subscription so gated surfaces can re-run
//! their one-shot access decision when the session changes, instead of
//! polling.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use super::models::User;
use super::session::{SessionStore, SessionToken};

/// Notification emitted when a session is created or destroyed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    SignedIn { user_id: Uuid },
    SignedOut { user_id: Uuid },
}

/// Adapter over the external auth service.
///
/// `current_user` failures mean the session backend itself was
/// unreachable. Implementations must surface that as an error rather
/// than returning `Ok(None)` - callers fail closed on it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the current user for a session token.
    async fn current_user(&self, token: &str) -> Result<Option<User>>;

    /// Resolve the stable principal for a verified email. The first
    /// sign-in creates the user; later sign-ins return the same id, so
    /// profiles and payment records survive re-authentication.
    async fn resolve_principal(&self, email: &str, is_admin: bool) -> Result<User>;

    /// Create a session for a verified principal, returning the token.
    async fn sign_in(&self, user: User) -> Result<SessionToken>;

    /// Destroy the session for a token.
    async fn sign_out(&self, token: &str) -> Result<()>;

    /// Subscribe to session-change notifications.
    fn subscribe(&self) -> broadcast::Receiver<SessionChange>;
}

/// Session-backed identity provider.
pub struct SessionIdentityProvider {
    store: SessionStore,
    // Stable principal ids keyed by email. Sessions come and go; the id
    // issued for an email never changes.
    principal_ids: RwLock<HashMap<String, Uuid>>,
    changes: broadcast::Sender<SessionChange>,
}

impl SessionIdentityProvider {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            store: SessionStore::new(),
            principal_ids: RwLock::new(HashMap::new()),
            changes,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    fn notify(&self, change: SessionChange) {
        // Send only fails when nobody is subscribed, which is fine.
        let _ = self.changes.send(change);
    }
}

impl Default for SessionIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for SessionIdentityProvider {
    async fn current_user(&self, token: &str) -> Result<Option<User>> {
        Ok(self.store.get_session(token).await.map(|s| s.user))
    }

    async fn resolve_principal(&self, email: &str, is_admin: bool) -> Result<User> {
        let mut ids = self.principal_ids.write().await;
        let id = *ids.entry(email.to_string()).or_insert_with(Uuid::new_v4);
        Ok(User {
            id,
            email: email.to_string(),
            is_admin,
        })
    }

    async fn sign_in(&self, user: User) -> Result<SessionToken> {
        let user_id = user.id;
        let token = self.store.create_session(user).await;
        self.notify(SessionChange::SignedIn { user_id });
        Ok(token)
    }

    async fn sign_out(&self, token: &str) -> Result<()> {
        if let Some(session) = self.store.delete_session(token).await {
            self.notify(SessionChange::SignedOut {
                user_id: session.user.id,
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }
}
