use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::User;

/// Session token (random UUID)
pub type SessionToken = String;

/// Session data stored after a successful identity-provider sign-in
#[derive(Clone, Debug)]
pub struct Session {
    pub user: User,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// In-memory session store
///
/// Sessions expire after 24 hours
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionToken, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a new session and return the token
    pub async fn create_session(&self, user: User) -> SessionToken {
        let token = Uuid::new_v4().to_string();
        let session = Session {
            user,
            created_at: chrono::Utc::now(),
        };
        let mut sessions = self.sessions.write().await;
        sessions.insert(token.clone(), session);
        token
    }

    /// Get session by token
    pub async fn get_session(&self, token: &str) -> Option<Session> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(token)?;

        // Check if session is expired (24 hours)
        let now = chrono::Utc::now();
        let elapsed = now.signed_duration_since(session.created_at);
        if elapsed.num_hours() >= 24 {
            // Session expired
            return None;
        }

        Some(session.clone())
    }

    /// Delete session (sign-out). Returns the session that was removed.
    pub async fn delete_session(&self, token: &str) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(token)
    }

    /// Clean up expired sessions (run periodically)
    pub async fn cleanup_expired(&self) {
        let mut sessions = self.sessions.write().await;
        let now = chrono::Utc::now();

        sessions.retain(|_, session| {
            let elapsed = now.signed_duration_since(session.created_at);
            elapsed.num_hours() < 24
        });
    }

    /// Insert a session with an explicit creation time (tests only).
    #[cfg(test)]
    pub async fn insert_with_created_at(
        &self,
        user: User,
        created_at: chrono::DateTime<chrono::Utc>,
    ) -> SessionToken {
        let token = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        sessions.insert(token.clone(), Session { user, created_at });
        token
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
