//! Outbound push seam.
//!
//! The domain layer defines the interface it needs for pushing messages to
//! connected clients; the infrastructure layer provides the WebSocket-backed
//! implementation.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::MessagePushError;
use super::value_object::ConnectionId;

/// Per-connection outbound channel. The WebSocket pusher loop drains this
/// into the client's socket.
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Message push interface.
///
/// Use cases depend on this trait, not on the WebSocket machinery. Delivery
/// is at-most-once: a missing or gone target is not an error the caller can
/// retry on, and `broadcast` tolerates partial failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// Register a client's outbound channel.
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// Remove a client's outbound channel.
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// Push to a single client.
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// Push to every target, skipping the ones that are gone.
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), MessagePushError>;
}
