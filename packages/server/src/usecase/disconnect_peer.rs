//! UseCase: disconnect cascade.
//!
//! A closed socket triggers cleanup across every table: room departure
//! (delegated to [`LeaveRoomUseCase`]), pending waiting-room entries in any
//! room, recorder locks held anywhere, and finally the registry row and the
//! outbound channel.

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, RoomId, RoomRepository, WaitingGuest};

use super::leave_room::{DepartureNotice, LeaveRoomUseCase};

/// A swept waiting-room entry plus the host to notify, when one is
/// registered for that room.
#[derive(Debug)]
pub struct WaitingCleanup {
    pub room_id: RoomId,
    pub host: Option<ConnectionId>,
    pub guest: WaitingGuest,
}

/// A recorder lock released by the cascade, with the members to notify.
#[derive(Debug)]
pub struct RecorderRelease {
    pub room_id: RoomId,
    pub members: Vec<ConnectionId>,
}

/// Everything the transport layer must announce after a disconnect.
#[derive(Debug)]
pub struct DisconnectOutcome {
    pub departure: Option<DepartureNotice>,
    pub waiting_cleanups: Vec<WaitingCleanup>,
    pub recorder_releases: Vec<RecorderRelease>,
}

/// Disconnect cascade use case.
pub struct DisconnectPeerUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    leave_room: Arc<LeaveRoomUseCase>,
}

impl DisconnectPeerUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        leave_room: Arc<LeaveRoomUseCase>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            leave_room,
        }
    }

    /// Run the full cleanup cascade for a closed connection.
    pub async fn execute(&self, connection_id: &ConnectionId) -> DisconnectOutcome {
        // Room departure first: it settles membership so the emptiness check
        // below sees the post-disconnect state.
        let departure = self.leave_room.execute(connection_id).await;

        let mut waiting_cleanups = Vec::new();
        for (room_id, guest) in self.repository.sweep_waiting_entries(connection_id).await {
            let host = self.repository.host_of(&room_id).await;
            waiting_cleanups.push(WaitingCleanup {
                room_id,
                host,
                guest,
            });
        }

        let mut recorder_releases = Vec::new();
        for room_id in self.repository.sweep_recorder_locks(connection_id).await {
            let members = self
                .repository
                .members_of(&room_id)
                .await
                .into_iter()
                .map(|p| p.id)
                .collect();
            recorder_releases.push(RecorderRelease { room_id, members });
        }

        let _ = self.repository.remove_peer(connection_id).await;
        self.message_pusher.unregister_client(connection_id).await;

        tracing::info!("Client '{}' disconnected and cleaned up", connection_id);

        DisconnectOutcome {
            departure,
            waiting_cleanups,
            recorder_releases,
        }
    }

    /// Push a single event to one peer, tolerating a gone target.
    pub async fn push_to_peer(&self, connection_id: &ConnectionId, message: &str) {
        if let Err(e) = self.message_pusher.push_to(connection_id, message).await {
            tracing::warn!("Failed to push to client '{}': {}", connection_id, e);
        }
    }

    /// Broadcast an event to the given targets.
    pub async fn broadcast_to(&self, targets: Vec<ConnectionId>, message: &str) {
        if let Err(e) = self.message_pusher.broadcast(targets, message).await {
            tracing::warn!("Failed to broadcast disconnect notice: {}", e);
        }
    }
}
