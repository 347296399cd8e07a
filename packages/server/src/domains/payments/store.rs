//! Payment and webhook-event storage.
//!
//! Same split as the mugshot store: a trait with a Postgres implementation
//! for production and an in-memory one for tests. Webhook idempotency
//! rests on the unique event_id constraint - `insert_if_new` reports
//! whether this delivery was the first one recorded.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use super::models::{PaymentRecord, PaymentStatus, WebhookEvent};

#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Record a checkout attempt as `pending`. Rejects a nil user id.
    async fn create_pending(
        &self,
        user_id: Uuid,
        external_payment_id: &str,
        amount_cents: i64,
        currency: &str,
    ) -> Result<PaymentRecord>;

    /// Move a record to a terminal status, overwriting whatever status it
    /// had. Errors when no record exists for the external id (the webhook
    /// may arrive before checkout persisted - the caller retries).
    async fn mark_terminal(
        &self,
        external_payment_id: &str,
        status: PaymentStatus,
        payment_method: Option<&str>,
    ) -> Result<PaymentRecord>;

    async fn mark_completed(
        &self,
        external_payment_id: &str,
        payment_method: Option<&str>,
    ) -> Result<PaymentRecord> {
        self.mark_terminal(external_payment_id, PaymentStatus::Completed, payment_method)
            .await
    }

    /// True iff any record for the user has status exactly `completed`.
    /// A pure existence check: no amount or currency validation, since
    /// there is exactly one product tier.
    async fn has_lifetime_access(&self, user_id: Uuid) -> Result<bool>;

    async fn find_by_external_id(
        &self,
        external_payment_id: &str,
    ) -> Result<Option<PaymentRecord>>;
}

#[async_trait]
pub trait WebhookStore: Send + Sync {
    /// Record an event if its external id has not been seen before.
    /// Returns true when this call recorded it, false on a duplicate id.
    async fn insert_if_new(
        &self,
        event_id: &str,
        event_type: &str,
        external_payment_id: &str,
        payload: &serde_json::Value,
    ) -> Result<bool>;

    async fn find_by_event_id(&self, event_id: &str) -> Result<Option<WebhookEvent>>;

    /// Flip processed false -> true after the event's effect is applied.
    /// Errors when no event was recorded for the id; the ledger must
    /// already hold the event by the time it is marked.
    async fn mark_processed(&self, event_id: &str) -> Result<()>;
}

fn reject_nil_user(user_id: Uuid) -> Result<()> {
    if user_id.is_nil() {
        anyhow::bail!("payment requires a valid user id");
    }
    Ok(())
}

/// Postgres-backed payment store.
pub struct PostgresPaymentStore {
    pool: sqlx::PgPool,
}

impl PostgresPaymentStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentStore for PostgresPaymentStore {
    async fn create_pending(
        &self,
        user_id: Uuid,
        external_payment_id: &str,
        amount_cents: i64,
        currency: &str,
    ) -> Result<PaymentRecord> {
        reject_nil_user(user_id)?;
        sqlx::query_as::<_, PaymentRecord>(
            "INSERT INTO payment_records (
                user_id,
                external_payment_id,
                status,
                amount_cents,
                currency
             )
             VALUES ($1, $2, 'pending', $3, $4)
             RETURNING *",
        )
        .bind(user_id)
        .bind(external_payment_id)
        .bind(amount_cents)
        .bind(currency)
        .fetch_one(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn mark_terminal(
        &self,
        external_payment_id: &str,
        status: PaymentStatus,
        payment_method: Option<&str>,
    ) -> Result<PaymentRecord> {
        sqlx::query_as::<_, PaymentRecord>(
            "UPDATE payment_records
             SET status = $2,
                 payment_method = COALESCE($3, payment_method),
                 updated_at = now()
             WHERE external_payment_id = $1
             RETURNING *",
        )
        .bind(external_payment_id)
        .bind(status.as_str())
        .bind(payment_method)
        .fetch_one(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn has_lifetime_access(&self, user_id: Uuid) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                SELECT 1 FROM payment_records
                WHERE user_id = $1 AND status = 'completed'
             )",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn find_by_external_id(
        &self,
        external_payment_id: &str,
    ) -> Result<Option<PaymentRecord>> {
        sqlx::query_as::<_, PaymentRecord>(
            "SELECT * FROM payment_records WHERE external_payment_id = $1",
        )
        .bind(external_payment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }
}

/// Postgres-backed webhook event store.
pub struct PostgresWebhookStore {
    pool: sqlx::PgPool,
}

impl PostgresWebhookStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebhookStore for PostgresWebhookStore {
    async fn insert_if_new(
        &self,
        event_id: &str,
        event_type: &str,
        external_payment_id: &str,
        payload: &serde_json::Value,
    ) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO webhook_events (event_id, event_type, external_payment_id, payload)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (event_id) DO NOTHING",
        )
        .bind(event_id)
        .bind(event_type)
        .bind(external_payment_id)
        .bind(payload)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_event_id(&self, event_id: &str) -> Result<Option<WebhookEvent>> {
        sqlx::query_as::<_, WebhookEvent>(
            "SELECT * FROM webhook_events WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn mark_processed(&self, event_id: &str) -> Result<()> {
        let result =
            sqlx::query("UPDATE webhook_events SET processed = true WHERE event_id = $1")
                .bind(event_id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            anyhow::bail!("no webhook event recorded for {event_id}");
        }
        Ok(())
    }
}

/// In-memory payment store for tests and local development.
pub struct MemoryPaymentStore {
    records: RwLock<HashMap<String, PaymentRecord>>,
}

impl MemoryPaymentStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryPaymentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentStore for MemoryPaymentStore {
    async fn create_pending(
        &self,
        user_id: Uuid,
        external_payment_id: &str,
        amount_cents: i64,
        currency: &str,
    ) -> Result<PaymentRecord> {
        reject_nil_user(user_id)?;
        let mut records = self.records.write().unwrap();
        if records.contains_key(external_payment_id) {
            anyhow::bail!("payment record already exists for {external_payment_id}");
        }
        let now = chrono::Utc::now();
        let record = PaymentRecord {
            id: Uuid::new_v4(),
            user_id,
            external_payment_id: external_payment_id.to_string(),
            status: PaymentStatus::Pending.as_str().to_string(),
            amount_cents,
            currency: currency.to_string(),
            payment_method: None,
            created_at: now,
            updated_at: now,
        };
        records.insert(external_payment_id.to_string(), record.clone());
        Ok(record)
    }

    async fn mark_terminal(
        &self,
        external_payment_id: &str,
        status: PaymentStatus,
        payment_method: Option<&str>,
    ) -> Result<PaymentRecord> {
        let mut records = self.records.write().unwrap();
        let Some(record) = records.get_mut(external_payment_id) else {
            anyhow::bail!("no payment record for {external_payment_id}");
        };
        record.status = status.as_str().to_string();
        if let Some(method) = payment_method {
            record.payment_method = Some(method.to_string());
        }
        record.updated_at = chrono::Utc::now();
        Ok(record.clone())
    }

    async fn has_lifetime_access(&self, user_id: Uuid) -> Result<bool> {
        Ok(self
            .records
            .read()
            .unwrap()
            .values()
            .any(|r| r.user_id == user_id && r.is_completed()))
    }

    async fn find_by_external_id(
        &self,
        external_payment_id: &str,
    ) -> Result<Option<PaymentRecord>> {
        Ok(self
            .records
            .read()
            .unwrap()
            .get(external_payment_id)
            .cloned())
    }
}

/// In-memory webhook event store.
pub struct MemoryWebhookStore {
    events: RwLock<HashMap<String, WebhookEvent>>,
}

impl MemoryWebhookStore {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
        }
    }

    pub fn event_count(&self) -> usize {
        self.events.read().unwrap().len()
    }
}

impl Default for MemoryWebhookStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookStore for MemoryWebhookStore {
    async fn insert_if_new(
        &self,
        event_id: &str,
        event_type: &str,
        external_payment_id: &str,
        payload: &serde_json::Value,
    ) -> Result<bool> {
        let mut events = self.events.write().unwrap();
        if events.contains_key(event_id) {
            return Ok(false);
        }
        events.insert(
            event_id.to_string(),
            WebhookEvent {
                id: Uuid::new_v4(),
                event_id: event_id.to_string(),
                event_type: event_type.to_string(),
                external_payment_id: external_payment_id.to_string(),
                payload: payload.clone(),
                processed: false,
                received_at: chrono::Utc::now(),
            },
        );
        Ok(true)
    }

    async fn find_by_event_id(&self, event_id: &str) -> Result<Option<WebhookEvent>> {
        Ok(self.events.read().unwrap().get(event_id).cloned())
    }

    async fn mark_processed(&self, event_id: &str) -> Result<()> {
        let mut events = self.events.write().unwrap();
        let Some(event) = events.get_mut(event_id) else {
            anyhow::bail!("no webhook event recorded for {event_id}");
        };
        event.processed = true;
        Ok(())
    }
}
