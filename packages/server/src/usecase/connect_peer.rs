//! UseCase: connection establishment.
//!
//! Mints the connection id, registers the peer and its outbound channel.
//! The transport layer follows up with the `me` self-identification event,
//! since a client has no other way to learn its own id.

use std::sync::Arc;

use crate::domain::{
    ConnectionId, ConnectionIdFactory, MessagePusher, Peer, PusherChannel, RoomRepository,
};

/// Connection establishment use case.
pub struct ConnectPeerUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectPeerUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// Register a fresh connection and return its minted id.
    pub async fn execute(&self, sender: PusherChannel) -> ConnectionId {
        let connection_id = ConnectionIdFactory::generate();
        self.repository
            .insert_peer(Peer::new(connection_id.clone()))
            .await;
        self.message_pusher
            .register_client(connection_id.clone(), sender)
            .await;
        connection_id
    }

    /// Push a single event to one peer, tolerating a gone target.
    pub async fn push_to_peer(&self, connection_id: &ConnectionId, message: &str) {
        if let Err(e) = self.message_pusher.push_to(connection_id, message).await {
            tracing::warn!("Failed to push to client '{}': {}", connection_id, e);
        }
    }
}
