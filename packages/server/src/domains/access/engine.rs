//! Access decision engine.
//!
//! `decide` is the pure contract over already-fetched state; `AccessEngine`
//! is the orchestrator that fetches that state sequentially, short-circuiting
//! later lookups when an earlier check already denies. The order is fixed:
//! identity, then profile, then payment. Each later check presupposes the
//! former - there is nothing meaningful to say about payment for an
//! anonymous visitor.

use std::sync::Arc;
use uuid::Uuid;

use crate::domains::identity::IdentityProvider;
use crate::domains::mugshots::MugshotStore;
use crate::domains::payments::PaymentStore;

use super::errors::AccessError;
use super::verdict::Verdict;

/// Per-route gate configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct GateRequirements {
    pub requires_profile: bool,
    pub requires_payment: bool,
}

impl GateRequirements {
    pub const LOGIN_ONLY: Self = Self {
        requires_profile: false,
        requires_payment: false,
    };

    pub const PROFILE: Self = Self {
        requires_profile: true,
        requires_payment: false,
    };

    pub const MEMBER: Self = Self {
        requires_profile: true,
        requires_payment: true,
    };
}

/// Pure decision over already-fetched state. No side effects.
pub fn decide(
    signed_in: bool,
    requirements: GateRequirements,
    has_profile: bool,
    has_lifetime_access: bool,
) -> Verdict {
    if !signed_in {
        return Verdict::RequireLogin;
    }
    if requirements.requires_profile && !has_profile {
        return Verdict::RequireProfile;
    }
    if requirements.requires_payment && !has_lifetime_access {
        return Verdict::RequirePayment;
    }
    Verdict::Allow
}

/// Fetches decision inputs and applies `decide`'s ordering.
pub struct AccessEngine {
    identity: Arc<dyn IdentityProvider>,
    mugshots: Arc<dyn MugshotStore>,
    payments: Arc<dyn PaymentStore>,
}

impl AccessEngine {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        mugshots: Arc<dyn MugshotStore>,
        payments: Arc<dyn PaymentStore>,
    ) -> Self {
        Self {
            identity,
            mugshots,
            payments,
        }
    }

    /// Resolve the verdict for a request carrying an optional session token.
    ///
    /// Lookups run strictly in order and stop at the first denial, so a
    /// profile or payment read never happens for an anonymous visitor.
    /// Any lookup failure propagates as an error; it is never rewritten
    /// into `Allow`.
    pub async fn check(
        &self,
        token: Option<&str>,
        requirements: GateRequirements,
    ) -> Result<Verdict, AccessError> {
        let Some(token) = token else {
            return Ok(Verdict::RequireLogin);
        };
        let user = self
            .identity
            .current_user(token)
            .await
            .map_err(AccessError::Identity)?;
        let Some(user) = user else {
            return Ok(Verdict::RequireLogin);
        };

        let has_profile = if requirements.requires_profile {
            self.has_profile(user.id).await?
        } else {
            true
        };
        if requirements.requires_profile && !has_profile {
            return Ok(Verdict::RequireProfile);
        }

        let has_access = if requirements.requires_payment {
            self.has_lifetime_access(user.id).await?
        } else {
            true
        };

        Ok(decide(true, requirements, has_profile, has_access))
    }

    async fn has_profile(&self, user_id: Uuid) -> Result<bool, AccessError> {
        self.mugshots
            .exists_for_user(user_id)
            .await
            .map_err(AccessError::Backend)
    }

    async fn has_lifetime_access(&self, user_id: Uuid) -> Result<bool, AccessError> {
        self.payments
            .has_lifetime_access(user_id)
            .await
            .map_err(AccessError::Backend)
    }
}
