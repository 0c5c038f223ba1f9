//! UseCase: room chat.
//!
//! Entries carry a server-assigned timestamp; the client-supplied one, if
//! any, is ignored. The broadcast goes to every member including the sender,
//! which doubles as the sender's local echo. History replies are
//! point-in-time snapshots to the requester only.

use std::sync::Arc;

use crate::domain::{ChatEntry, ConnectionId, MessagePusher, RoomId, RoomRepository, Timestamp};

/// Room chat use case.
pub struct ChatUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl ChatUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// Append a message to the room log and return the stamped entry plus
    /// the broadcast targets (the whole room, sender included).
    pub async fn append(
        &self,
        author: &ConnectionId,
        room_id: &RoomId,
        sender: String,
        message: String,
    ) -> (ChatEntry, Vec<ConnectionId>) {
        let entry = ChatEntry {
            author: author.clone(),
            sender,
            text: message,
            sent_at: Timestamp::now(),
        };
        self.repository.append_chat(room_id, entry.clone()).await;

        let members = self
            .repository
            .members_of(room_id)
            .await
            .into_iter()
            .map(|p| p.id)
            .collect();

        (entry, members)
    }

    /// The room's current log, oldest first. Empty for an untouched room.
    pub async fn history(&self, room_id: &RoomId) -> Vec<ChatEntry> {
        self.repository.chat_history(room_id).await
    }

    /// Push the history snapshot to the requester.
    pub async fn push_to_peer(&self, connection_id: &ConnectionId, message: &str) {
        if let Err(e) = self.message_pusher.push_to(connection_id, message).await {
            tracing::warn!("Failed to push to client '{}': {}", connection_id, e);
        }
    }

    /// Broadcast a chat message to the room.
    pub async fn broadcast_to(&self, targets: Vec<ConnectionId>, message: &str) {
        if let Err(e) = self.message_pusher.broadcast(targets, message).await {
            tracing::warn!("Failed to broadcast chat message: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Peer, CHAT_LOG_CAP};
    use crate::infrastructure::{
        message_pusher::WebSocketMessagePusher, repository::InMemorySignalingRepository,
    };

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string())
    }

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string())
    }

    fn usecase() -> (Arc<InMemorySignalingRepository>, ChatUseCase) {
        let repository = Arc::new(InMemorySignalingRepository::new());
        let message_pusher = Arc::new(WebSocketMessagePusher::new());
        (
            repository.clone(),
            ChatUseCase::new(repository, message_pusher),
        )
    }

    async fn join(repository: &InMemorySignalingRepository, id: &str, room_id: &str) {
        repository.insert_peer(Peer::new(conn(id))).await;
        repository
            .assign_room(&conn(id), room(room_id), id.to_string())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_append_targets_include_the_sender() {
        // given:
        let (repository, usecase) = usecase();
        join(&repository, "alice", "r1").await;
        join(&repository, "bob", "r1").await;

        // when:
        let (entry, targets) = usecase
            .append(&conn("alice"), &room("r1"), "Alice".to_string(), "hi".to_string())
            .await;

        // then: no separate local echo; the sender relies on the broadcast
        assert_eq!(targets.len(), 2);
        assert!(targets.contains(&conn("alice")));
        assert!(targets.contains(&conn("bob")));
        assert_eq!(entry.author, conn("alice"));
        assert_eq!(entry.text, "hi");
    }

    #[tokio::test]
    async fn test_history_returns_appended_entries_in_order() {
        // given:
        let (repository, usecase) = usecase();
        join(&repository, "alice", "r1").await;
        usecase
            .append(&conn("alice"), &room("r1"), "Alice".to_string(), "first".to_string())
            .await;
        usecase
            .append(&conn("alice"), &room("r1"), "Alice".to_string(), "second".to_string())
            .await;

        // when:
        let history = usecase.history(&room("r1")).await;

        // then:
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].text, "first");
        assert_eq!(history[1].text, "second");
    }

    #[tokio::test]
    async fn test_history_is_capped_at_one_hundred_entries() {
        // given:
        let (repository, usecase) = usecase();
        join(&repository, "alice", "r1").await;

        // when: one message more than the cap
        for i in 0..=CHAT_LOG_CAP {
            usecase
                .append(
                    &conn("alice"),
                    &room("r1"),
                    "Alice".to_string(),
                    format!("message {i}"),
                )
                .await;
        }

        // then: the first message is no longer returned
        let history = usecase.history(&room("r1")).await;
        assert_eq!(history.len(), CHAT_LOG_CAP);
        assert_eq!(history[0].text, "message 1");
    }

    #[tokio::test]
    async fn test_history_of_untouched_room_is_empty() {
        // given:
        let (_repository, usecase) = usecase();

        // when:
        let history = usecase.history(&room("nowhere")).await;

        // then:
        assert!(history.is_empty());
    }
}
