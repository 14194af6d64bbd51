//! Tenant-scoped event broadcasting.
//!
//! [`Broadcaster`] is the seam between the processor and whatever
//! transport carries sanitized events to subscribers. Two transports
//! are provided:
//!
//! - [`ChannelBroadcaster`] — an in-process hub of per-tenant
//!   `tokio::sync::broadcast` channels. Subscribers attach to exactly
//!   one tenant's channel and can never observe another tenant's
//!   events.
//! - [`WebhookBroadcaster`] — HTTP POST of the sanitized payload to an
//!   external fan-out endpoint. One attempt per event; redelivery is
//!   the outbox's job, so the transport does not retry on its own.

use std::collections::HashMap;

use async_trait::async_trait;
use relay_core::types::OrgId;
use tokio::sync::{broadcast, RwLock};

use crate::error::BroadcastError;
use crate::sanitize::PublicEvent;

/// Per-tenant channel buffer capacity.
const CHANNEL_CAPACITY: usize = 256;

/// HTTP request timeout for a single webhook delivery attempt.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Delivery-channel name for a tenant, e.g.
/// `notifications:5a1e...`. Wire transports use it as the routing key.
pub fn channel_name(organization_id: OrgId) -> String {
    format!("notifications:{organization_id}")
}

/// Publishes a sanitized event to a tenant-scoped delivery channel.
///
/// A failed publish is a per-event delivery failure: the processor
/// records it and retries on a later invocation.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn broadcast(
        &self,
        organization_id: OrgId,
        event: &PublicEvent,
    ) -> Result<(), BroadcastError>;
}

// ---------------------------------------------------------------------------
// ChannelBroadcaster
// ---------------------------------------------------------------------------

/// In-process hub of per-tenant broadcast channels.
///
/// Publishing to a tenant with no subscribers is a successful no-op,
/// matching at-least-once semantics: the durable outbox row is the
/// record of truth, the hub is only the wake-up path for attached
/// consumers.
pub struct ChannelBroadcaster {
    channels: RwLock<HashMap<OrgId, broadcast::Sender<PublicEvent>>>,
}

impl ChannelBroadcaster {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribe to one tenant's delivery channel.
    pub async fn subscribe(&self, organization_id: OrgId) -> broadcast::Receiver<PublicEvent> {
        self.sender_for(organization_id).await.subscribe()
    }

    async fn sender_for(&self, organization_id: OrgId) -> broadcast::Sender<PublicEvent> {
        if let Some(sender) = self.channels.read().await.get(&organization_id) {
            return sender.clone();
        }
        let mut channels = self.channels.write().await;
        channels
            .entry(organization_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

impl Default for ChannelBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broadcaster for ChannelBroadcaster {
    async fn broadcast(
        &self,
        organization_id: OrgId,
        event: &PublicEvent,
    ) -> Result<(), BroadcastError> {
        let sender = self.sender_for(organization_id).await;
        // A SendError only means there are zero receivers right now.
        let _ = sender.send(event.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// WebhookBroadcaster
// ---------------------------------------------------------------------------

/// Delivers sanitized events to an external fan-out endpoint over HTTP.
pub struct WebhookBroadcaster {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookBroadcaster {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Broadcaster for WebhookBroadcaster {
    async fn broadcast(
        &self,
        organization_id: OrgId,
        event: &PublicEvent,
    ) -> Result<(), BroadcastError> {
        let payload = serde_json::json!({
            "channel": channel_name(organization_id),
            "event": event,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BroadcastError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
