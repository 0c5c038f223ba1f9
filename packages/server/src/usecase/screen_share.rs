//! UseCase: screen-share status.
//!
//! Tracks the per-connection sharing flag and rebroadcasts every change to
//! the whole room, sender included, so all clients converge on the same
//! view of who is sharing.

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, RoomId, RoomRepository};

/// Screen-share status use case.
pub struct ScreenShareUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl ScreenShareUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// Record the caller's sharing flag and return the broadcast targets
    /// (the whole room, sender included).
    pub async fn set_status(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
        is_sharing: bool,
    ) -> Vec<ConnectionId> {
        if let Err(e) = self.repository.set_sharing(connection_id, is_sharing).await {
            tracing::warn!(
                "Ignoring screen-share status from unknown connection '{}': {}",
                connection_id,
                e
            );
            return Vec::new();
        }

        self.repository
            .members_of(room_id)
            .await
            .into_iter()
            .map(|p| p.id)
            .collect()
    }

    /// Broadcast the status change to the room.
    pub async fn broadcast_to(&self, targets: Vec<ConnectionId>, message: &str) {
        if let Err(e) = self.message_pusher.broadcast(targets, message).await {
            tracing::warn!("Failed to broadcast screen-share status: {}", e);
        }
    }
}
