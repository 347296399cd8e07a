use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity-provider principal.
///
/// Issued by the external auth provider at sign-in and carried in the
/// session. Never persisted or mutated by this system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
}

impl User {
    pub fn new(email: impl Into<String>, is_admin: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            is_admin,
        }
    }
}
