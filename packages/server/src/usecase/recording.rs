//! UseCase: recording exclusivity.
//!
//! One recorder per room, enforced by an atomic check-and-set. The lock is
//! non-reentrant and non-queued: a blocked caller is rejected outright and
//! told only that someone is recording, never who. Release is restricted to
//! the holder; anyone else's stop request is silently ignored.

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, RoomId, RoomRepository};

/// The ack text for a blocked start request. Deliberately does not name the
/// current holder.
pub const ALREADY_RECORDING_MESSAGE: &str = "Someone is already recording.";

/// Result of a start request.
#[derive(Debug)]
pub struct RecordStartOutcome {
    pub granted: bool,
    /// Broadcast targets for `recordStarted`; empty when not granted.
    pub members: Vec<ConnectionId>,
}

/// Recording exclusivity use case.
pub struct RecordingUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl RecordingUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// Try to take the room's recorder lock.
    pub async fn start(&self, connection_id: &ConnectionId, room_id: &RoomId) -> RecordStartOutcome {
        let granted = self
            .repository
            .try_start_record(room_id, connection_id)
            .await;
        let members = if granted {
            self.member_ids(room_id).await
        } else {
            Vec::new()
        };
        RecordStartOutcome { granted, members }
    }

    /// Release the lock. Returns the broadcast targets for `recordStopped`,
    /// or `None` when the caller is not the holder (silent no-op).
    pub async fn stop(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Option<Vec<ConnectionId>> {
        if self.repository.stop_record(room_id, connection_id).await {
            Some(self.member_ids(room_id).await)
        } else {
            None
        }
    }

    async fn member_ids(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.repository
            .members_of(room_id)
            .await
            .into_iter()
            .map(|p| p.id)
            .collect()
    }

    /// Push the start ack to the requester.
    pub async fn push_to_peer(&self, connection_id: &ConnectionId, message: &str) {
        if let Err(e) = self.message_pusher.push_to(connection_id, message).await {
            tracing::warn!("Failed to push to client '{}': {}", connection_id, e);
        }
    }

    /// Broadcast a recording event to the room.
    pub async fn broadcast_to(&self, targets: Vec<ConnectionId>, message: &str) {
        if let Err(e) = self.message_pusher.broadcast(targets, message).await {
            tracing::warn!("Failed to broadcast recording event: {}", e);
        }
    }
}
