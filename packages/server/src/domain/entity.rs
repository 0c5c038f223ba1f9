//! Entities: the per-connection registry row and the per-room arena record.

use std::collections::VecDeque;

use super::value_object::{ConnectionId, RoomId, Timestamp};

/// Maximum number of chat entries retained per room. Oldest entries are
/// evicted first (FIFO, not LRU).
pub const CHAT_LOG_CAP: usize = 100;

/// One connected client.
///
/// Owned by the connection registry; mutated only in response to events from
/// this same connection, or by the cleanup cascade when it disconnects.
#[derive(Debug, Clone, PartialEq)]
pub struct Peer {
    pub id: ConnectionId,
    pub name: String,
    pub room: Option<RoomId>,
    pub sharing_screen: bool,
}

impl Peer {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            name: "Anonymous".to_string(),
            room: None,
            sharing_screen: false,
        }
    }
}

/// A chat log entry. Immutable once appended; the timestamp is
/// server-assigned, never client-supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub author: ConnectionId,
    pub sender: String,
    pub text: String,
    pub sent_at: Timestamp,
}

/// A pending admission request, keyed by the requesting connection.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitingGuest {
    pub connection: ConnectionId,
    pub guest_id: String,
    pub name: String,
    pub requested_at: Timestamp,
}

/// Host-supplied room metadata recorded when a host joins.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomMeta {
    pub team_id: Option<i64>,
    pub host: ConnectionId,
    pub created_at: Timestamp,
}

/// Per-room coordinator state.
///
/// Membership is not stored here: it is derived from the peer registry
/// (`Peer::room`), so a record only exists while one of the tables below
/// holds something. An idle record is dropped from the arena.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Room {
    pub host: Option<ConnectionId>,
    pub meta: Option<RoomMeta>,
    chat: VecDeque<ChatEntry>,
    waiting: Vec<WaitingGuest>,
    pub recorder: Option<ConnectionId>,
}

impl Room {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the chat log, evicting the oldest entries past the cap.
    pub fn push_chat(&mut self, entry: ChatEntry) {
        self.chat.push_back(entry);
        while self.chat.len() > CHAT_LOG_CAP {
            self.chat.pop_front();
        }
    }

    pub fn chat_log(&self) -> impl Iterator<Item = &ChatEntry> {
        self.chat.iter()
    }

    /// Queues an admission request. A second request from the same
    /// connection collapses into the existing entry and returns `false`.
    pub fn enqueue_guest(&mut self, guest: WaitingGuest) -> bool {
        if self
            .waiting
            .iter()
            .any(|g| g.connection == guest.connection)
        {
            return false;
        }
        self.waiting.push(guest);
        true
    }

    /// Removes the pending entry for `connection`, if any.
    pub fn remove_guest(&mut self, connection: &ConnectionId) -> Option<WaitingGuest> {
        let idx = self
            .waiting
            .iter()
            .position(|g| &g.connection == connection)?;
        Some(self.waiting.remove(idx))
    }

    pub fn waiting_guests(&self) -> &[WaitingGuest] {
        &self.waiting
    }

    /// Check-and-set for the recorder lock. The lock is non-reentrant and
    /// non-queued: any second request is refused, including one from the
    /// current holder.
    pub fn try_start_record(&mut self, connection: &ConnectionId) -> bool {
        if self.recorder.is_some() {
            return false;
        }
        self.recorder = Some(connection.clone());
        true
    }

    /// Releases the lock if `connection` holds it; anyone else is a no-op.
    pub fn stop_record(&mut self, connection: &ConnectionId) -> bool {
        if self.recorder.as_ref() == Some(connection) {
            self.recorder = None;
            true
        } else {
            false
        }
    }

    /// True when no table holds anything worth keeping the record for.
    pub fn is_idle(&self) -> bool {
        self.host.is_none()
            && self.meta.is_none()
            && self.chat.is_empty()
            && self.waiting.is_empty()
            && self.recorder.is_none()
    }
}
