use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Idempotency/audit record for an inbound gateway notification.
///
/// Each external event id is recorded at most once; `processed` flips
/// false -> true exactly once, after the event's effect has been applied.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct WebhookEvent {
    pub id: Uuid,
    pub event_id: String,
    pub event_type: String,
    pub external_payment_id: String,
    pub payload: serde_json::Value,
    pub processed: bool,
    pub received_at: DateTime<Utc>,
}
