use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use siphon_types::{EventBatch, WebhookPayload};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{error::AppError, AppState};

pub struct WebhookApiModule;

impl WebhookApiModule {
    pub fn register() -> OpenApiRouter<AppState> {
        OpenApiRouter::new().routes(routes!(receive_webhook_handler))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub receiver: String,
    pub events: usize,
    /// Whether the broker acknowledged the batch. Informational only.
    pub enqueued: bool,
}

/// Accept a batch of enhanced transactions posted by the webhook provider and forward it
/// to the queue unchanged.
#[utoipa::path(
    post,
    path = "/{receiver}",
    params(("receiver" = String, Path, description = "Receiver name the webhook was registered under")),
    request_body = Vec<WebhookPayload>,
    tag = "Webhook",
    responses(
        (status = OK, body = WebhookAck),
        (status = BAD_REQUEST, description = "Body is not a JSON array of events")
    )
)]
pub async fn receive_webhook_handler(
    Path(receiver): Path<String>,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    let events: EventBatch = serde_json::from_slice(&body)?;

    let enqueued = match state.publisher.publish(&receiver, &events).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(receiver = %receiver, events = events.len(), error = %e, "Failed to publish batch");
            false
        }
    };

    tracing::info!(receiver = %receiver, events = events.len(), enqueued, "Webhook batch received");
    Ok(Json(WebhookAck { receiver, events: events.len(), enqueued }))
}
