use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Payment lifecycle status.
///
/// `pending` moves to exactly one terminal status via webhook processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "completed" => Some(PaymentStatus::Completed),
            "failed" => Some(PaymentStatus::Failed),
            "cancelled" => Some(PaymentStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

/// One attempt to purchase lifetime access - SQL persistence layer.
///
/// A user has lifetime access iff at least one of their records has
/// status `completed`. Records are never deleted.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Id issued by the payment gateway; links webhook events to this record.
    pub external_payment_id: String,
    pub status: String,
    pub amount_cents: i64,
    pub currency: String,
    pub payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn status(&self) -> Option<PaymentStatus> {
        PaymentStatus::parse(&self.status)
    }

    pub fn is_completed(&self) -> bool {
        self.status == PaymentStatus::Completed.as_str()
    }
}
