use thiserror::Error;

/// Failures while gathering the state an access decision needs.
///
/// These never become `Allow`. Identity failures are mapped by callers to
/// the safe default of requiring login; backend failures surface as an
/// explicit retry so a dead database is never misreported as "you have no
/// profile".
#[derive(Error, Debug)]
pub enum AccessError {
    #[error("identity lookup failed: {0}")]
    Identity(#[source] anyhow::Error),

    #[error("backend lookup failed: {0}")]
    Backend(#[source] anyhow::Error),
}
