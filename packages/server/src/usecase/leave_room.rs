//! UseCase: room departure.
//!
//! Shared by the explicit `leaveRoom` event and the disconnect cascade.
//! A departing host closes the room for everyone: the remaining members get
//! a `room-closed` notification and the host/metadata entries are torn down,
//! but the members themselves are not kicked server-side; they are expected
//! to leave client-side on receipt.

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, RoomId, RoomRepository};

/// Result of a departure, precomputed before the tables were mutated.
#[derive(Debug)]
pub struct DepartureNotice {
    pub room_id: RoomId,
    /// Members still in the room, in no particular order.
    pub remaining: Vec<ConnectionId>,
    /// True when the departing connection was the registered host.
    pub closed_room: bool,
}

/// Room departure use case.
pub struct LeaveRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl LeaveRoomUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// Remove the connection from its current room, if it is in one.
    pub async fn execute(&self, connection_id: &ConnectionId) -> Option<DepartureNotice> {
        let peer = self.repository.get_peer(connection_id).await?;
        let room_id = peer.room?;

        let remaining: Vec<ConnectionId> = self
            .repository
            .members_of(&room_id)
            .await
            .into_iter()
            .filter(|p| &p.id != connection_id)
            .map(|p| p.id)
            .collect();
        let closed_room = self.repository.host_of(&room_id).await.as_ref() == Some(connection_id);

        self.repository.clear_room(connection_id).await;
        if closed_room {
            self.repository.clear_host_and_meta(&room_id).await;
        }
        self.repository.collect_if_empty(&room_id).await;

        Some(DepartureNotice {
            room_id,
            remaining,
            closed_room,
        })
    }

    /// Notify the remaining members about the departure.
    pub async fn broadcast_departure(&self, targets: Vec<ConnectionId>, message: &str) {
        if let Err(e) = self.message_pusher.broadcast(targets, message).await {
            tracing::warn!("Failed to broadcast departure: {}", e);
        }
    }
}
