//! UseCase: room join.
//!
//! Joining implicitly creates the room: there is no registration step and no
//! validation of the room id. A join with the host flag set registers the
//! caller as the room's host and stores the metadata; a later host claim
//! from another connection silently overwrites the previous one
//! (last-writer-wins).

use std::sync::Arc;

use crate::domain::{
    ConnectionId, MessagePusher, Peer, RepositoryError, RoomId, RoomMeta, RoomRepository,
    Timestamp,
};

/// What a fresh joiner needs to know about the room.
#[derive(Debug)]
pub struct JoinSnapshot {
    /// The joiner's display name after defaulting.
    pub display_name: String,
    /// Current members other than the joiner, sharing flags included.
    pub others: Vec<Peer>,
}

/// Room join use case.
pub struct JoinRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl JoinRoomUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// Add the connection to the room and return the snapshot for it.
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        name: Option<String>,
        is_host: bool,
        team_id: Option<i64>,
    ) -> Result<JoinSnapshot, RepositoryError> {
        let name = name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Anonymous".to_string());

        self.repository
            .assign_room(connection_id, room_id.clone(), name.clone())
            .await?;

        if is_host {
            let meta = RoomMeta {
                team_id,
                host: connection_id.clone(),
                created_at: Timestamp::now(),
            };
            self.repository.set_host(&room_id, meta).await;
        }

        let others = self
            .repository
            .members_of(&room_id)
            .await
            .into_iter()
            .filter(|p| &p.id != connection_id)
            .collect();

        Ok(JoinSnapshot {
            display_name: name,
            others,
        })
    }

    /// Push the room snapshot to the joiner.
    pub async fn push_snapshot(&self, connection_id: &ConnectionId, message: &str) {
        if let Err(e) = self.message_pusher.push_to(connection_id, message).await {
            tracing::warn!("Failed to push snapshot to client '{}': {}", connection_id, e);
        }
    }

    /// Announce the joiner to the existing members.
    pub async fn broadcast_user_joined(&self, targets: Vec<ConnectionId>, message: &str) {
        if let Err(e) = self.message_pusher.broadcast(targets, message).await {
            tracing::warn!("Failed to broadcast user-joined: {}", e);
        }
    }
}
