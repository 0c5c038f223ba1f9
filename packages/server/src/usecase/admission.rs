//! UseCase: host-gated admission (waiting room).
//!
//! Per-(room, guest) state machine: none → pending → approved | rejected |
//! cancelled, where every terminal state deletes the entry. Join requests
//! route to the registered host when its connection is still live; a stale
//! host reference is evicted on the spot and the request degrades to a
//! room-wide broadcast, as does a request to a room that never had a host.
//!
//! By default any connection's approve/reject is honored without checking it
//! against the host registry. With `strict` set, approve/reject from a
//! non-host is ignored while a live host is registered; the host-absent
//! fallback stays open to any member either way.

use std::sync::Arc;

use crate::domain::{
    ConnectionId, MessagePusher, RoomId, RoomRepository, Timestamp, WaitingGuest,
};

/// Who should see an admission notification.
#[derive(Debug, Clone, PartialEq)]
pub enum AdmissionRouting {
    ToHost(ConnectionId),
    ToRoom(Vec<ConnectionId>),
}

/// A freshly queued request and where to announce it.
#[derive(Debug)]
pub struct AdmissionRequest {
    pub guest: WaitingGuest,
    pub routing: AdmissionRouting,
}

/// Waiting-room use case.
pub struct AdmissionUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    strict: bool,
}

impl AdmissionUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        strict: bool,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            strict,
        }
    }

    /// Queue an admission request. Returns `None` for a duplicate request
    /// from the same connection (one pending entry per guest per room).
    pub async fn request_to_join(
        &self,
        guest_connection: &ConnectionId,
        room_id: &RoomId,
        guest_id: String,
        guest_name: String,
    ) -> Option<AdmissionRequest> {
        let guest = WaitingGuest {
            connection: guest_connection.clone(),
            guest_id,
            name: guest_name,
            requested_at: Timestamp::now(),
        };

        if !self.repository.enqueue_guest(room_id, guest.clone()).await {
            tracing::debug!(
                "Duplicate join request from '{}' for room '{}'",
                guest_connection,
                room_id
            );
            return None;
        }

        let routing = match self.repository.host_of(room_id).await {
            Some(host) if self.repository.is_connected(&host).await => {
                AdmissionRouting::ToHost(host)
            }
            Some(stale) => {
                // Self-heal the stale reference, then degrade to a room-wide
                // broadcast so any member can handle the request.
                tracing::warn!(
                    "Evicting stale host '{}' of room '{}'; broadcasting join request",
                    stale,
                    room_id
                );
                self.repository.clear_host(room_id).await;
                AdmissionRouting::ToRoom(self.member_ids(room_id).await)
            }
            None => AdmissionRouting::ToRoom(self.member_ids(room_id).await),
        };

        Some(AdmissionRequest { guest, routing })
    }

    /// Remove the pending entry and report whether the guest should be told.
    /// The entry removal is unconditional; only strict mode can refuse.
    pub async fn approve(
        &self,
        caller: &ConnectionId,
        room_id: &RoomId,
        guest_connection: &ConnectionId,
    ) -> bool {
        if self.blocked_by_strict_mode(caller, room_id).await {
            return false;
        }
        self.repository.remove_guest(room_id, guest_connection).await;
        true
    }

    /// Symmetric to [`Self::approve`].
    pub async fn reject(
        &self,
        caller: &ConnectionId,
        room_id: &RoomId,
        guest_connection: &ConnectionId,
    ) -> bool {
        if self.blocked_by_strict_mode(caller, room_id).await {
            return false;
        }
        self.repository.remove_guest(room_id, guest_connection).await;
        true
    }

    /// Withdraw the guest's own request and say who should hear about it.
    pub async fn cancel(
        &self,
        guest_connection: &ConnectionId,
        room_id: &RoomId,
    ) -> AdmissionRouting {
        self.repository.remove_guest(room_id, guest_connection).await;
        match self.repository.host_of(room_id).await {
            Some(host) => AdmissionRouting::ToHost(host),
            None => AdmissionRouting::ToRoom(self.member_ids(room_id).await),
        }
    }

    async fn blocked_by_strict_mode(&self, caller: &ConnectionId, room_id: &RoomId) -> bool {
        if !self.strict {
            return false;
        }
        match self.repository.host_of(room_id).await {
            Some(host) if self.repository.is_connected(&host).await && &host != caller => {
                tracing::warn!(
                    "Ignoring admission decision from non-host '{}' for room '{}'",
                    caller,
                    room_id
                );
                true
            }
            _ => false,
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

    /// Push a single event to one peer, tolerating a gone target.
    pub async fn push_to_peer(&self, connection_id: &ConnectionId, message: &str) {
        if let Err(e) = self.message_pusher.push_to(connection_id, message).await {
            tracing::warn!("Failed to push to client '{}': {}", connection_id, e);
        }
    }

    /// Broadcast an event to the given targets.
    pub async fn broadcast_to(&self, targets: Vec<ConnectionId>, message: &str) {
        if let Err(e) = self.message_pusher.broadcast(targets, message).await {
            tracing::warn!("Failed to broadcast admission event: {}", e);
        }
    }
}
