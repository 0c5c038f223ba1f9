//! In-memory signaling repository.
//!
//! The connection registry and the room arena live in two `HashMap`s behind
//! a single mutex, so every trait method is one atomic transition over the
//! shared tables. Room records are created lazily on first touch and dropped
//! again as soon as they go idle; membership is never stored, it is derived
//! from `Peer::room`.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ChatEntry, ConnectionId, Peer, RepositoryError, Room, RoomId, RoomMeta, RoomRepository,
    WaitingGuest,
};

#[derive(Default)]
struct State {
    peers: HashMap<ConnectionId, Peer>,
    rooms: HashMap<RoomId, Room>,
}

impl State {
    fn room_mut(&mut self, room_id: &RoomId) -> &mut Room {
        self.rooms.entry(room_id.clone()).or_default()
    }

    fn drop_if_idle(&mut self, room_id: &RoomId) {
        if self.rooms.get(room_id).is_some_and(Room::is_idle) {
            self.rooms.remove(room_id);
        }
    }

    fn member_count(&self, room_id: &RoomId) -> usize {
        self.peers
            .values()
            .filter(|p| p.room.as_ref() == Some(room_id))
            .count()
    }
}

/// In-memory implementation of [`RoomRepository`].
#[derive(Default)]
pub struct InMemorySignalingRepository {
    state: Mutex<State>,
}

impl InMemorySignalingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomRepository for InMemorySignalingRepository {
    async fn insert_peer(&self, peer: Peer) {
        let mut state = self.state.lock().await;
        state.peers.insert(peer.id.clone(), peer);
    }

    async fn remove_peer(&self, connection_id: &ConnectionId) -> Option<Peer> {
        let mut state = self.state.lock().await;
        state.peers.remove(connection_id)
    }

    async fn get_peer(&self, connection_id: &ConnectionId) -> Option<Peer> {
        let state = self.state.lock().await;
        state.peers.get(connection_id).cloned()
    }

    async fn is_connected(&self, connection_id: &ConnectionId) -> bool {
        let state = self.state.lock().await;
        state.peers.contains_key(connection_id)
    }

    async fn assign_room(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        name: String,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let peer = state
            .peers
            .get_mut(connection_id)
            .ok_or_else(|| RepositoryError::PeerNotFound(connection_id.as_str().to_string()))?;
        peer.room = Some(room_id);
        peer.name = name;
        Ok(())
    }

    async fn clear_room(&self, connection_id: &ConnectionId) {
        let mut state = self.state.lock().await;
        if let Some(peer) = state.peers.get_mut(connection_id) {
            peer.room = None;
            peer.sharing_screen = false;
        }
    }

    async fn set_sharing(
        &self,
        connection_id: &ConnectionId,
        sharing: bool,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let peer = state
            .peers
            .get_mut(connection_id)
            .ok_or_else(|| RepositoryError::PeerNotFound(connection_id.as_str().to_string()))?;
        peer.sharing_screen = sharing;
        Ok(())
    }

    async fn members_of(&self, room_id: &RoomId) -> Vec<Peer> {
        let state = self.state.lock().await;
        state
            .peers
            .values()
            .filter(|p| p.room.as_ref() == Some(room_id))
            .cloned()
            .collect()
    }

    async fn member_count(&self, room_id: &RoomId) -> usize {
        let state = self.state.lock().await;
        state.member_count(room_id)
    }

    async fn set_host(&self, room_id: &RoomId, meta: RoomMeta) {
        let mut state = self.state.lock().await;
        let room = state.room_mut(room_id);
        room.host = Some(meta.host.clone());
        room.meta = Some(meta);
    }

    async fn host_of(&self, room_id: &RoomId) -> Option<ConnectionId> {
        let state = self.state.lock().await;
        state.rooms.get(room_id).and_then(|r| r.host.clone())
    }

    async fn meta_of(&self, room_id: &RoomId) -> Option<RoomMeta> {
        let state = self.state.lock().await;
        state.rooms.get(room_id).and_then(|r| r.meta.clone())
    }

    async fn clear_host(&self, room_id: &RoomId) {
        let mut state = self.state.lock().await;
        if let Some(room) = state.rooms.get_mut(room_id) {
            room.host = None;
        }
        state.drop_if_idle(room_id);
    }

    async fn clear_host_and_meta(&self, room_id: &RoomId) {
        let mut state = self.state.lock().await;
        if let Some(room) = state.rooms.get_mut(room_id) {
            room.host = None;
            room.meta = None;
        }
        state.drop_if_idle(room_id);
    }

    async fn enqueue_guest(&self, room_id: &RoomId, guest: WaitingGuest) -> bool {
        let mut state = self.state.lock().await;
        state.room_mut(room_id).enqueue_guest(guest)
    }

    async fn remove_guest(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Option<WaitingGuest> {
        let mut state = self.state.lock().await;
        let removed = state
            .rooms
            .get_mut(room_id)
            .and_then(|r| r.remove_guest(connection_id));
        state.drop_if_idle(room_id);
        removed
    }

    async fn sweep_waiting_entries(
        &self,
        connection_id: &ConnectionId,
    ) -> Vec<(RoomId, WaitingGuest)> {
        let mut state = self.state.lock().await;
        let mut removed = Vec::new();
        for (room_id, room) in state.rooms.iter_mut() {
            if let Some(guest) = room.remove_guest(connection_id) {
                removed.push((room_id.clone(), guest));
            }
        }
        for (room_id, _) in &removed {
            state.drop_if_idle(room_id);
        }
        removed
    }

    async fn append_chat(&self, room_id: &RoomId, entry: ChatEntry) {
        let mut state = self.state.lock().await;
        state.room_mut(room_id).push_chat(entry);
    }

    async fn chat_history(&self, room_id: &RoomId) -> Vec<ChatEntry> {
        let state = self.state.lock().await;
        state
            .rooms
            .get(room_id)
            .map(|r| r.chat_log().cloned().collect())
            .unwrap_or_default()
    }

    async fn try_start_record(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool {
        let mut state = self.state.lock().await;
        state.room_mut(room_id).try_start_record(connection_id)
    }

    async fn stop_record(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool {
        let mut state = self.state.lock().await;
        let stopped = state
            .rooms
            .get_mut(room_id)
            .is_some_and(|r| r.stop_record(connection_id));
        state.drop_if_idle(room_id);
        stopped
    }

    async fn sweep_recorder_locks(&self, connection_id: &ConnectionId) -> Vec<RoomId> {
        let mut state = self.state.lock().await;
        let mut released = Vec::new();
        for (room_id, room) in state.rooms.iter_mut() {
            if room.stop_record(connection_id) {
                released.push(room_id.clone());
            }
        }
        for room_id in &released {
            state.drop_if_idle(room_id);
        }
        released
    }

    async fn collect_if_empty(&self, room_id: &RoomId) -> bool {
        let mut state = self.state.lock().await;
        if state.member_count(room_id) == 0 {
            state.rooms.remove(room_id).is_some()
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timestamp;

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string())
    }

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string())
    }

    fn meta(host: &str, team_id: Option<i64>) -> RoomMeta {
        RoomMeta {
            team_id,
            host: conn(host),
            created_at: Timestamp::new(1000),
        }
    }

    fn guest(id: &str) -> WaitingGuest {
        WaitingGuest {
            connection: conn(id),
            guest_id: format!("user-{id}"),
            name: id.to_string(),
            requested_at: Timestamp::new(1000),
        }
    }

    async fn join(repo: &InMemorySignalingRepository, id: &str, room_id: &str) {
        repo.insert_peer(Peer::new(conn(id))).await;
        repo.assign_room(&conn(id), room(room_id), id.to_string())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_membership_is_derived_from_peers() {
        // given:
        let repo = InMemorySignalingRepository::new();
        join(&repo, "alice", "r1").await;
        join(&repo, "bob", "r1").await;
        join(&repo, "carol", "r2").await;

        // when:
        let members = repo.members_of(&room("r1")).await;

        // then:
        assert_eq!(members.len(), 2);
        assert_eq!(repo.member_count(&room("r1")).await, 2);
        assert_eq!(repo.member_count(&room("r2")).await, 1);
    }

    #[tokio::test]
    async fn test_assign_room_for_unknown_peer_fails() {
        // given:
        let repo = InMemorySignalingRepository::new();

        // when:
        let result = repo
            .assign_room(&conn("ghost"), room("r1"), "Ghost".to_string())
            .await;

        // then:
        assert_eq!(
            result,
            Err(RepositoryError::PeerNotFound("ghost".to_string()))
        );
    }

    #[tokio::test]
    async fn test_clear_room_resets_sharing_flag() {
        // given:
        let repo = InMemorySignalingRepository::new();
        join(&repo, "alice", "r1").await;
        repo.set_sharing(&conn("alice"), true).await.unwrap();

        // when:
        repo.clear_room(&conn("alice")).await;

        // then:
        let peer = repo.get_peer(&conn("alice")).await.unwrap();
        assert_eq!(peer.room, None);
        assert!(!peer.sharing_screen);
    }

    #[tokio::test]
    async fn test_set_host_is_last_writer_wins() {
        // given:
        let repo = InMemorySignalingRepository::new();
        repo.set_host(&room("r1"), meta("alice", Some(7))).await;

        // when: a second claimant registers
        repo.set_host(&room("r1"), meta("bob", Some(9))).await;

        // then: no rejection, the previous entry is overwritten
        assert_eq!(repo.host_of(&room("r1")).await, Some(conn("bob")));
        assert_eq!(repo.meta_of(&room("r1")).await.unwrap().team_id, Some(9));
    }

    #[tokio::test]
    async fn test_clear_host_keeps_metadata() {
        // given: stale-host eviction must not destroy the room metadata
        let repo = InMemorySignalingRepository::new();
        repo.set_host(&room("r1"), meta("alice", Some(7))).await;

        // when:
        repo.clear_host(&room("r1")).await;

        // then:
        assert_eq!(repo.host_of(&room("r1")).await, None);
        assert!(repo.meta_of(&room("r1")).await.is_some());
    }

    #[tokio::test]
    async fn test_clear_host_and_meta_drops_idle_record() {
        // given: a room whose only content is the host entry
        let repo = InMemorySignalingRepository::new();
        repo.set_host(&room("r1"), meta("alice", None)).await;

        // when:
        repo.clear_host_and_meta(&room("r1")).await;

        // then: the arena record is gone entirely
        assert_eq!(repo.host_of(&room("r1")).await, None);
        assert_eq!(repo.meta_of(&room("r1")).await, None);
        assert!(repo.chat_history(&room("r1")).await.is_empty());
    }

    #[tokio::test]
    async fn test_waiting_queue_dedup_and_sweep() {
        // given:
        let repo = InMemorySignalingRepository::new();
        assert!(repo.enqueue_guest(&room("r1"), guest("g1")).await);
        assert!(!repo.enqueue_guest(&room("r1"), guest("g1")).await);
        assert!(repo.enqueue_guest(&room("r2"), guest("g1")).await);

        // when: the guest disconnects
        let swept = repo.sweep_waiting_entries(&conn("g1")).await;

        // then: entries in both rooms are gone
        assert_eq!(swept.len(), 2);
        assert!(repo.remove_guest(&room("r1"), &conn("g1")).await.is_none());
        assert!(repo.remove_guest(&room("r2"), &conn("g1")).await.is_none());
    }

    #[tokio::test]
    async fn test_chat_history_of_unknown_room_is_empty() {
        // given:
        let repo = InMemorySignalingRepository::new();

        // when:
        let history = repo.chat_history(&room("never-touched")).await;

        // then:
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_recorder_lock_check_and_set() {
        // given:
        let repo = InMemorySignalingRepository::new();

        // when: two connections race
        let first = repo.try_start_record(&room("r1"), &conn("a")).await;
        let second = repo.try_start_record(&room("r1"), &conn("b")).await;

        // then: exactly one succeeds
        assert!(first);
        assert!(!second);

        // and only the holder can release
        assert!(!repo.stop_record(&room("r1"), &conn("b")).await);
        assert!(repo.stop_record(&room("r1"), &conn("a")).await);
        assert!(repo.try_start_record(&room("r1"), &conn("b")).await);
    }

    #[tokio::test]
    async fn test_sweep_recorder_locks_releases_across_rooms() {
        // given:
        let repo = InMemorySignalingRepository::new();
        repo.try_start_record(&room("r1"), &conn("a")).await;
        repo.try_start_record(&room("r2"), &conn("a")).await;
        repo.try_start_record(&room("r3"), &conn("b")).await;

        // when:
        let released = repo.sweep_recorder_locks(&conn("a")).await;

        // then:
        assert_eq!(released.len(), 2);
        assert!(released.contains(&room("r1")));
        assert!(released.contains(&room("r2")));
        assert!(!repo.stop_record(&room("r1"), &conn("a")).await);
        assert!(repo.stop_record(&room("r3"), &conn("b")).await);
    }

    #[tokio::test]
    async fn test_collect_if_empty_requires_zero_members() {
        // given:
        let repo = InMemorySignalingRepository::new();
        join(&repo, "alice", "r1").await;
        repo.append_chat(
            &room("r1"),
            ChatEntry {
                author: conn("alice"),
                sender: "alice".to_string(),
                text: "hello".to_string(),
                sent_at: Timestamp::new(1000),
            },
        )
        .await;

        // when: a member is still present
        let collected = repo.collect_if_empty(&room("r1")).await;

        // then: the record survives
        assert!(!collected);
        assert_eq!(repo.chat_history(&room("r1")).await.len(), 1);

        // when: the last member leaves
        repo.clear_room(&conn("alice")).await;
        let collected = repo.collect_if_empty(&room("r1")).await;

        // then: chat, waiting, host and metadata all go with the record
        assert!(collected);
        assert!(repo.chat_history(&room("r1")).await.is_empty());
    }
}
