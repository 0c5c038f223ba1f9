//! Conversion logic between domain entities and wire DTOs.

use crate::domain::{ChatEntry, Peer, WaitingGuest};
use crate::infrastructure::dto::websocket::{ChatMessageDto, RoomUser, ServerEvent};

impl From<&Peer> for RoomUser {
    fn from(peer: &Peer) -> Self {
        Self {
            id: peer.id.as_str().to_string(),
            name: peer.name.clone(),
        }
    }
}

impl From<&ChatEntry> for ChatMessageDto {
    fn from(entry: &ChatEntry) -> Self {
        Self {
            sender: entry.sender.clone(),
            message: entry.text.clone(),
            timestamp: entry.sent_at.to_rfc3339(),
            sender_id: entry.author.as_str().to_string(),
        }
    }
}

/// Builds the `join-request` notification for a queued guest.
pub fn join_request_event(room_id: &str, guest: &WaitingGuest) -> ServerEvent {
    ServerEvent::JoinRequest {
        room_id: room_id.to_string(),
        guest_socket_id: guest.connection.as_str().to_string(),
        guest_id: guest.guest_id.clone(),
        guest_name: guest.name.clone(),
    }
}
