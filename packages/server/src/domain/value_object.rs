//! Value objects for the signaling domain.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-assigned connection identifier.
///
/// Opaque to clients, unique for the lifetime of the connection and never
/// reused. Clients learn their own id through the `me` event sent right
/// after the WebSocket upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mints fresh connection ids (uuid v4).
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    pub fn generate() -> ConnectionId {
        ConnectionId(Uuid::new_v4().to_string())
    }
}

/// Caller-supplied room identifier.
///
/// Deliberately unvalidated: rooms are created implicitly on first touch and
/// the server imposes no format or uniqueness rules on their names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unix timestamp in UTC milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        Self(huddle_shared::time::now_utc_millis())
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// RFC 3339 rendering for the wire format.
    pub fn to_rfc3339(&self) -> String {
        huddle_shared::time::millis_to_rfc3339(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_factory_generates_unique_ids() {
        // given:

        // when:
        let first = ConnectionIdFactory::generate();
        let second = ConnectionIdFactory::generate();

        // then:
        assert_ne!(first, second);
        assert_eq!(first.as_str().len(), 36);
    }

    #[test]
    fn test_room_id_accepts_any_string() {
        // given: room ids are caller-supplied and unvalidated
        let odd = RoomId::new("  weird room / 名前 ".to_string());

        // when:

        // then:
        assert_eq!(odd.as_str(), "  weird room / 名前 ");
    }

    #[test]
    fn test_timestamp_renders_rfc3339() {
        // given:
        let ts = Timestamp::new(1672531200000);

        // when:
        let rendered = ts.to_rfc3339();

        // then:
        assert!(rendered.starts_with("2023-01-01T00:00:00"));
    }
}
