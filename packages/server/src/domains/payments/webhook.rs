//! Payment-gateway webhook handler.
//!
//! The gateway delivers events at least once, so ingestion runs a small
//! state machine keyed on the external event id:
//! received -> recorded -> processed, or received -> duplicate-discarded.
//!
//! 2xx is returned only after the event is durably recorded and applied,
//! or confirmed as an already-processed duplicate. Anything else returns
//! 500 so the gateway redelivers. A recorded-but-unprocessed event (a
//! previous apply failed) is re-applied on redelivery; the terminal-status
//! overwrite in the payment store tolerates the rare double apply.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::models::PaymentStatus;
use super::store::{PaymentStore, WebhookStore};

/// State shared with the webhook handler.
#[derive(Clone)]
pub struct WebhookState {
    pub payments: Arc<dyn PaymentStore>,
    pub webhooks: Arc<dyn WebhookStore>,
}

/// Gateway event payload.
///
/// Parsed out of the raw JSON body; the raw body is what gets stored for
/// audit.
#[derive(Debug, Deserialize)]
pub struct GatewayEventPayload {
    pub event_id: String,
    pub event_type: String,
    pub payment_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub customer: Option<GatewayCustomer>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct GatewayCustomer {
    pub external_id: Option<String>,
    pub email: Option<String>,
}

impl GatewayEventPayload {
    fn validate(&self) -> Result<(), &'static str> {
        if self.event_id.trim().is_empty() {
            return Err("event_id is required");
        }
        if self.event_type.trim().is_empty() {
            return Err("event_type is required");
        }
        if self.payment_id.trim().is_empty() {
            return Err("payment_id is required");
        }
        Ok(())
    }

    /// Terminal status this event maps to, if any. The event type wins;
    /// the status field is a fallback for generic update events.
    fn terminal_status(&self) -> Option<PaymentStatus> {
        match self.event_type.as_str() {
            "payment.completed" => Some(PaymentStatus::Completed),
            "payment.failed" => Some(PaymentStatus::Failed),
            "payment.cancelled" => Some(PaymentStatus::Cancelled),
            _ => self
                .status
                .as_deref()
                .and_then(PaymentStatus::parse)
                .filter(PaymentStatus::is_terminal),
        }
    }

    fn payment_method(&self) -> Option<&str> {
        self.metadata
            .as_ref()?
            .get("payment_method")?
            .as_str()
    }
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

/// Build the axum router for webhook endpoints.
pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhooks/payments", post(handle_payment_event))
        .with_state(state)
}

/// Handle an inbound payment event from the gateway.
async fn handle_payment_event(
    State(state): State<WebhookState>,
    Json(raw): Json<serde_json::Value>,
) -> (StatusCode, Json<WebhookAck>) {
    let payload: GatewayEventPayload = match serde_json::from_value(raw.clone()) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected malformed webhook payload");
            return (StatusCode::BAD_REQUEST, Json(WebhookAck { status: "invalid" }));
        }
    };
    if let Err(reason) = payload.validate() {
        tracing::warn!(reason, "Rejected incomplete webhook payload");
        return (StatusCode::BAD_REQUEST, Json(WebhookAck { status: "invalid" }));
    }

    match ingest_event(&state, &payload, &raw).await {
        Ok(Ingestion::Processed) => (StatusCode::OK, Json(WebhookAck { status: "processed" })),
        Ok(Ingestion::Duplicate) => (StatusCode::OK, Json(WebhookAck { status: "duplicate" })),
        Err(e) => {
            // Retryable: the event is either unrecorded or still
            // unprocessed, and redelivery will pick it back up.
            tracing::error!(
                event_id = %payload.event_id,
                payment_id = %payload.payment_id,
                error = %e,
                "Webhook ingestion failed, requesting redelivery"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WebhookAck { status: "retry" }),
            )
        }
    }
}

enum Ingestion {
    Processed,
    Duplicate,
}

/// Run the ingestion state machine for one delivery.
///
/// A failing duplicate-check is an error, never "not a duplicate":
/// re-processing is preferred over a silent drop.
async fn ingest_event(
    state: &WebhookState,
    payload: &GatewayEventPayload,
    raw: &serde_json::Value,
) -> anyhow::Result<Ingestion> {
    match state.webhooks.find_by_event_id(&payload.event_id).await? {
        Some(existing) if existing.processed => {
            tracing::debug!(
                event_id = %payload.event_id,
                "Duplicate webhook delivery, discarding"
            );
            return Ok(Ingestion::Duplicate);
        }
        Some(_) => {
            // Recorded but a previous apply failed; re-apply below.
            tracing::info!(
                event_id = %payload.event_id,
                "Re-applying previously recorded webhook event"
            );
        }
        None => {
            let recorded = state
                .webhooks
                .insert_if_new(
                    &payload.event_id,
                    &payload.event_type,
                    &payload.payment_id,
                    raw,
                )
                .await?;
            if !recorded {
                // Lost a race with a concurrent delivery of the same id.
                // Fall through and apply anyway; the status overwrite is
                // tolerant of the duplicate.
                tracing::debug!(
                    event_id = %payload.event_id,
                    "Concurrent delivery recorded this event first"
                );
            }
        }
    }

    apply_event(state, payload).await?;
    state.webhooks.mark_processed(&payload.event_id).await?;
    Ok(Ingestion::Processed)
}

/// Apply the event's effect to the payment record.
async fn apply_event(state: &WebhookState, payload: &GatewayEventPayload) -> anyhow::Result<()> {
    let Some(status) = payload.terminal_status() else {
        // Unknown event type with no terminal status: record it, apply
        // nothing, and ack so the gateway stops redelivering.
        tracing::warn!(
            event_id = %payload.event_id,
            event_type = %payload.event_type,
            "Webhook event has no payment effect"
        );
        return Ok(());
    };

    let record = state
        .payments
        .mark_terminal(&payload.payment_id, status, payload.payment_method())
        .await?;

    tracing::info!(
        event_id = %payload.event_id,
        payment_id = %payload.payment_id,
        user_id = %record.user_id,
        status = %record.status,
        "Payment record updated from webhook"
    );

    Ok(())
}
