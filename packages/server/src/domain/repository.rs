//! Data-access seam for the coordinator tables.
//!
//! The domain layer defines the interface it needs over the connection
//! registry and the room arena; the infrastructure layer provides the
//! in-memory implementation. Use cases depend on this trait only.

use async_trait::async_trait;

use super::entity::{ChatEntry, Peer, RoomMeta, WaitingGuest};
use super::error::RepositoryError;
use super::value_object::{ConnectionId, RoomId};

/// Room coordinator data store.
///
/// Each method is atomic with respect to the shared tables, which is what
/// keeps single-call invariants (recorder exclusivity, waiting-room dedup,
/// last-writer-wins host) race-free without any caller-side locking.
#[async_trait]
pub trait RoomRepository: Send + Sync {
    // connection registry

    async fn insert_peer(&self, peer: Peer);

    async fn remove_peer(&self, connection_id: &ConnectionId) -> Option<Peer>;

    async fn get_peer(&self, connection_id: &ConnectionId) -> Option<Peer>;

    /// Whether the connection is currently live.
    async fn is_connected(&self, connection_id: &ConnectionId) -> bool;

    /// Record the peer's room membership and display name.
    async fn assign_room(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        name: String,
    ) -> Result<(), RepositoryError>;

    /// Drop the peer's room membership and reset its sharing flag.
    async fn clear_room(&self, connection_id: &ConnectionId);

    async fn set_sharing(
        &self,
        connection_id: &ConnectionId,
        sharing: bool,
    ) -> Result<(), RepositoryError>;

    // membership, derived from the registry

    async fn members_of(&self, room_id: &RoomId) -> Vec<Peer>;

    async fn member_count(&self, room_id: &RoomId) -> usize;

    // host registry and metadata

    /// Register `meta.host` as the room's host and store the metadata.
    /// Last writer wins; a previous host entry is silently overwritten.
    async fn set_host(&self, room_id: &RoomId, meta: RoomMeta);

    async fn host_of(&self, room_id: &RoomId) -> Option<ConnectionId>;

    async fn meta_of(&self, room_id: &RoomId) -> Option<RoomMeta>;

    /// Evict the host entry only (stale-reference self-healing).
    async fn clear_host(&self, room_id: &RoomId);

    /// Tear down both host and metadata (host departure).
    async fn clear_host_and_meta(&self, room_id: &RoomId);

    // waiting-room queue

    /// Queue an admission request; returns `false` on a duplicate.
    async fn enqueue_guest(&self, room_id: &RoomId, guest: WaitingGuest) -> bool;

    async fn remove_guest(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Option<WaitingGuest>;

    /// Remove every pending entry of a disconnecting guest, across rooms.
    async fn sweep_waiting_entries(
        &self,
        connection_id: &ConnectionId,
    ) -> Vec<(RoomId, WaitingGuest)>;

    // chat history

    async fn append_chat(&self, room_id: &RoomId, entry: ChatEntry);

    async fn chat_history(&self, room_id: &RoomId) -> Vec<ChatEntry>;

    // recorder lock

    /// Atomic check-and-set of the per-room lock.
    async fn try_start_record(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool;

    /// Release by the holder only; anyone else is a no-op returning `false`.
    async fn stop_record(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool;

    /// Release every lock held by a disconnecting connection, across rooms;
    /// returns the rooms whose lock was released.
    async fn sweep_recorder_locks(&self, connection_id: &ConnectionId) -> Vec<RoomId>;

    // arena GC

    /// Drop the room record if its membership is empty. Returns `true` when
    /// the record was collected.
    async fn collect_if_empty(&self, room_id: &RoomId) -> bool;
}
