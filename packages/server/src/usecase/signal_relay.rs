//! UseCase: stateless relay.
//!
//! Forwards pre-serialized events (WebRTC handshake payloads, screen-track
//! requests) to a named target connection. At-most-once: a gone target drops
//! the message and the sender gets no delivery failure notice.

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher};

/// Stateless relay use case.
pub struct SignalRelayUseCase {
    message_pusher: Arc<dyn MessagePusher>,
}

impl SignalRelayUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// Forward to the target, dropping silently if it is gone.
    pub async fn relay(&self, target: &ConnectionId, message: &str) {
        if let Err(e) = self.message_pusher.push_to(target, message).await {
            tracing::debug!("Dropped relay to '{}': {}", target, e);
        }
    }
}
