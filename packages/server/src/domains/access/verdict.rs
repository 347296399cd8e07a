use serde::Serialize;

/// Outcome of an access decision for a gated feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Render the protected content.
    Allow,
    /// No session; remediation is signing in.
    RequireLogin,
    /// Signed in but no mugshot; remediation is creating one.
    RequireProfile,
    /// Signed in, profile present, no completed payment; remediation is
    /// checkout.
    RequirePayment,
}
