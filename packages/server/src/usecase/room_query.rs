//! UseCase: room metadata and existence queries.
//!
//! All three queries are request/response pairs answered to the requester
//! only. `room_exists` opportunistically evicts a stale host entry while
//! answering, the same lazy self-healing the admission flow applies.

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, RoomId, RoomMeta, RoomRepository};

/// Why a team-access check answered the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamAccessReason {
    NoMetadata,
    SameTeam,
    DifferentTeam,
}

/// Answer to `check-team-access`.
#[derive(Debug, PartialEq)]
pub struct TeamAccess {
    pub has_direct_access: bool,
    pub room_team_id: Option<i64>,
    pub reason: TeamAccessReason,
}

/// Answer to `check-room-exists`.
#[derive(Debug, PartialEq)]
pub struct RoomPresence {
    pub exists: bool,
    pub has_host: bool,
    pub user_count: usize,
}

/// Room query use case.
pub struct RoomQueryUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl RoomQueryUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// Compare the caller's team id against the room metadata. A room
    /// without metadata answers open (backward-compatible allow), not
    /// denied.
    pub async fn check_team_access(
        &self,
        room_id: &RoomId,
        user_team_id: Option<i64>,
    ) -> TeamAccess {
        match self.repository.meta_of(room_id).await {
            None => TeamAccess {
                has_direct_access: true,
                room_team_id: None,
                reason: TeamAccessReason::NoMetadata,
            },
            Some(meta) => {
                let same = matches!(
                    (meta.team_id, user_team_id),
                    (Some(room_team), Some(user_team)) if room_team == user_team
                );
                TeamAccess {
                    has_direct_access: same,
                    room_team_id: meta.team_id,
                    reason: if same {
                        TeamAccessReason::SameTeam
                    } else {
                        TeamAccessReason::DifferentTeam
                    },
                }
            }
        }
    }

    /// The stored metadata, verbatim.
    pub async fn metadata(&self, room_id: &RoomId) -> Option<RoomMeta> {
        self.repository.meta_of(room_id).await
    }

    /// Membership-based existence plus host liveness. A registered host
    /// whose connection is gone is evicted here as a side effect.
    pub async fn room_presence(&self, room_id: &RoomId) -> RoomPresence {
        let user_count = self.repository.member_count(room_id).await;
        let has_host = match self.repository.host_of(room_id).await {
            Some(host) if self.repository.is_connected(&host).await => true,
            Some(stale) => {
                tracing::debug!(
                    "Evicting stale host '{}' of room '{}' during existence check",
                    stale,
                    room_id
                );
                self.repository.clear_host(room_id).await;
                false
            }
            None => false,
        };
        RoomPresence {
            exists: user_count > 0,
            has_host,
            user_count,
        }
    }

    /// Push a query answer to the requester.
    pub async fn push_to_peer(&self, connection_id: &ConnectionId, message: &str) {
        if let Err(e) = self.message_pusher.push_to(connection_id, message).await {
            tracing::warn!("Failed to push to client '{}': {}", connection_id, e);
        }
    }
}
