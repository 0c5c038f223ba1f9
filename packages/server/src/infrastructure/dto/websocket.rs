//! Wire-format events for the signaling WebSocket protocol.
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`.
//! Payloads are validated here, at the transport boundary, before any use
//! case sees them; the event names (a mix of camelCase and kebab-case) are
//! part of the protocol and preserved verbatim.

use serde::{Deserialize, Serialize};

/// Client → server events.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    #[serde(rename = "joinRoom")]
    JoinRoom {
        room_id: String,
        name: Option<String>,
        #[serde(default)]
        is_host: bool,
        #[serde(default, deserialize_with = "coerce::opt_i64")]
        team_id: Option<i64>,
    },
    #[serde(rename = "leaveRoom")]
    LeaveRoom,
    #[serde(rename = "chatMessage")]
    ChatMessage {
        room_id: String,
        sender: String,
        message: String,
    },
    /// Payload is the bare room id.
    #[serde(rename = "requestChatHistory")]
    RequestChatHistory(String),
    #[serde(rename = "request-to-join")]
    RequestToJoin {
        room_id: String,
        guest_id: String,
        guest_name: String,
    },
    #[serde(rename = "approve-guest")]
    ApproveGuest {
        room_id: String,
        guest_socket_id: String,
    },
    #[serde(rename = "reject-guest")]
    RejectGuest {
        room_id: String,
        guest_socket_id: String,
    },
    #[serde(rename = "cancel-join-request")]
    CancelJoinRequest { room_id: String },
    /// Opaque WebRTC handshake payload; never interpreted server-side.
    #[serde(rename = "signal")]
    Signal {
        target_id: String,
        signal: serde_json::Value,
    },
    #[serde(rename = "requestScreenTrack")]
    RequestScreenTrack { target_id: String },
    #[serde(rename = "screenShareStatus")]
    ScreenShareStatus { room_id: String, is_sharing: bool },
    /// Payload is the bare room id.
    #[serde(rename = "requestStartRecord")]
    RequestStartRecord(String),
    /// Payload is the bare room id.
    #[serde(rename = "requestStopRecord")]
    RequestStopRecord(String),
    #[serde(rename = "check-team-access")]
    CheckTeamAccess {
        room_id: String,
        #[serde(default, deserialize_with = "coerce::opt_i64")]
        user_team_id: Option<i64>,
    },
    #[serde(rename = "get-room-metadata")]
    GetRoomMetadata { room_id: String },
    #[serde(rename = "check-room-exists")]
    CheckRoomExists { room_id: String },
}

/// Server → client events.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Self-identification handshake: the connection's own id, pushed right
    /// after the upgrade (the client cannot know its id otherwise).
    #[serde(rename = "me")]
    Me(String),
    /// Room snapshot for a fresh joiner: the other members and the subset
    /// currently sharing their screen.
    #[serde(rename = "allUsers")]
    AllUsers {
        users: Vec<RoomUser>,
        sharing: Vec<String>,
    },
    #[serde(rename = "userJoined")]
    UserJoined { id: String, name: String },
    /// Payload is the departing connection id.
    #[serde(rename = "userLeft")]
    UserLeft(String),
    #[serde(rename = "room-closed")]
    RoomClosed { reason: String },
    #[serde(rename = "waiting-guest-disconnected")]
    WaitingGuestDisconnected { guest_socket_id: String },
    #[serde(rename = "join-request")]
    JoinRequest {
        room_id: String,
        guest_socket_id: String,
        guest_id: String,
        guest_name: String,
    },
    #[serde(rename = "join-approved")]
    JoinApproved { room_id: String, approved_by: String },
    #[serde(rename = "join-rejected")]
    JoinRejected { room_id: String, rejected_by: String },
    #[serde(rename = "request-cancelled")]
    RequestCancelled {
        room_id: String,
        guest_socket_id: String,
    },
    #[serde(rename = "chatMessage")]
    ChatMessage(ChatMessageDto),
    #[serde(rename = "chatHistory")]
    ChatHistory(Vec<ChatMessageDto>),
    #[serde(rename = "signal")]
    Signal {
        from: String,
        signal: serde_json::Value,
    },
    #[serde(rename = "requestScreenTrack")]
    RequestScreenTrack { from: String },
    #[serde(rename = "peerScreenShareStatus")]
    PeerScreenShareStatus { id: String, is_sharing: bool },
    #[serde(rename = "recordStarted")]
    RecordStarted { by: String },
    #[serde(rename = "recordStopped")]
    RecordStopped { by: String },
    /// Ack for `requestStartRecord`.
    #[serde(rename = "recordStartResult")]
    RecordStartResult {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Ack for `check-team-access`.
    #[serde(rename = "team-access-result")]
    TeamAccessResult {
        has_direct_access: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        room_team_id: Option<i64>,
        reason: TeamAccessReason,
    },
    /// Ack for `get-room-metadata`.
    #[serde(rename = "room-metadata-result")]
    RoomMetadataResult {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        team_id: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        host_socket_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        created_at: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Ack for `check-room-exists`.
    #[serde(rename = "room-exists-result")]
    RoomExistsResult {
        exists: bool,
        has_host: bool,
        user_count: usize,
    },
}

impl ServerEvent {
    /// Serialize for the wire. The event union contains nothing that can
    /// fail to serialize.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("server event is serializable")
    }
}

/// One member in the `allUsers` snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomUser {
    pub id: String,
    pub name: String,
}

/// A chat message as broadcast and as returned by `chatHistory`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageDto {
    pub sender: String,
    pub message: String,
    /// RFC 3339, server-assigned.
    pub timestamp: String,
    pub sender_id: String,
}

/// Why `check-team-access` answered the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamAccessReason {
    NoMetadata,
    SameTeam,
    DifferentTeam,
}

mod coerce {
    use serde::{Deserialize, Deserializer};

    /// Team ids arrive as numbers or numeric strings depending on the
    /// client; compare numerically either way.
    pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Float(f64),
            Str(String),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            None => None,
            Some(Raw::Int(n)) => Some(n),
            Some(Raw::Float(f)) => Some(f as i64),
            Some(Raw::Str(s)) => s.trim().parse().ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_join_room_with_defaults() {
        // given: only the room id is supplied
        let json = r#"{"event":"joinRoom","data":{"roomId":"r1"}}"#;

        // when:
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then: name/isHost/teamId fall back to their defaults
        assert_eq!(
            event,
            ClientEvent::JoinRoom {
                room_id: "r1".to_string(),
                name: None,
                is_host: false,
                team_id: None,
            }
        );
    }

    #[test]
    fn test_deserialize_kebab_case_event_name() {
        // given:
        let json = r#"{"event":"request-to-join","data":{"roomId":"r1","guestId":"u42","guestName":"Dana"}}"#;

        // when:
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then:
        assert_eq!(
            event,
            ClientEvent::RequestToJoin {
                room_id: "r1".to_string(),
                guest_id: "u42".to_string(),
                guest_name: "Dana".to_string(),
            }
        );
    }

    #[test]
    fn test_deserialize_bare_string_payload() {
        // given: requestChatHistory carries the room id directly
        let json = r#"{"event":"requestChatHistory","data":"r1"}"#;

        // when:
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then:
        assert_eq!(event, ClientEvent::RequestChatHistory("r1".to_string()));
    }

    #[test]
    fn test_deserialize_event_without_payload() {
        // given:
        let json = r#"{"event":"leaveRoom"}"#;

        // when:
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then:
        assert_eq!(event, ClientEvent::LeaveRoom);
    }

    #[test]
    fn test_unknown_payload_fields_are_ignored() {
        // given: clients send redundant fields the server does not use
        let json = r#"{"event":"approve-guest","data":{"roomId":"r1","guestSocketId":"g1","guestId":"u42","guestName":"Dana"}}"#;

        // when:
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then:
        assert_eq!(
            event,
            ClientEvent::ApproveGuest {
                room_id: "r1".to_string(),
                guest_socket_id: "g1".to_string(),
            }
        );
    }

    #[test]
    fn test_team_id_coercion_accepts_number_and_string() {
        // given:
        let as_number = r#"{"event":"check-team-access","data":{"roomId":"r1","userTeamId":7}}"#;
        let as_string = r#"{"event":"check-team-access","data":{"roomId":"r1","userTeamId":"7"}}"#;
        let garbage = r#"{"event":"check-team-access","data":{"roomId":"r1","userTeamId":"seven"}}"#;

        // when:
        let from_number: ClientEvent = serde_json::from_str(as_number).unwrap();
        let from_string: ClientEvent = serde_json::from_str(as_string).unwrap();
        let from_garbage: ClientEvent = serde_json::from_str(garbage).unwrap();

        // then: both numeric spellings coerce, garbage degrades to absent
        let team = |e: &ClientEvent| match e {
            ClientEvent::CheckTeamAccess { user_team_id, .. } => *user_team_id,
            _ => panic!("wrong variant"),
        };
        assert_eq!(team(&from_number), Some(7));
        assert_eq!(team(&from_string), Some(7));
        assert_eq!(team(&from_garbage), None);
    }

    #[test]
    fn test_signal_payload_stays_opaque() {
        // given: an SDP-ish blob the server must not interpret
        let json = r#"{"event":"signal","data":{"targetId":"t1","signal":{"type":"offer","sdp":"v=0..."}}}"#;

        // when:
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then:
        match event {
            ClientEvent::Signal { target_id, signal } => {
                assert_eq!(target_id, "t1");
                assert_eq!(signal["type"], "offer");
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_serialize_me_event() {
        // given:
        let event = ServerEvent::Me("abc-123".to_string());

        // when:
        let json = event.to_json();

        // then:
        assert_eq!(json, r#"{"event":"me","data":"abc-123"}"#);
    }

    #[test]
    fn test_serialize_record_ack_skips_absent_message() {
        // given:
        let ok = ServerEvent::RecordStartResult {
            success: true,
            message: None,
        };
        let blocked = ServerEvent::RecordStartResult {
            success: false,
            message: Some("Someone is already recording.".to_string()),
        };

        // when/then:
        assert_eq!(ok.to_json(), r#"{"event":"recordStartResult","data":{"success":true}}"#);
        assert_eq!(
            blocked.to_json(),
            r#"{"event":"recordStartResult","data":{"success":false,"message":"Someone is already recording."}}"#
        );
    }

    #[test]
    fn test_serialize_uses_camel_case_field_names() {
        // given:
        let event = ServerEvent::JoinRequest {
            room_id: "r1".to_string(),
            guest_socket_id: "g1".to_string(),
            guest_id: "u42".to_string(),
            guest_name: "Dana".to_string(),
        };

        // when:
        let value: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();

        // then:
        assert_eq!(value["event"], "join-request");
        assert_eq!(value["data"]["guestSocketId"], "g1");
        assert_eq!(value["data"]["guestName"], "Dana");
    }

    #[test]
    fn test_serialize_team_access_reason_snake_case() {
        // given:
        let event = ServerEvent::TeamAccessResult {
            has_direct_access: true,
            room_team_id: None,
            reason: TeamAccessReason::NoMetadata,
        };

        // when:
        let value: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();

        // then:
        assert_eq!(value["data"]["reason"], "no_metadata");
        assert_eq!(value["data"]["hasDirectAccess"], true);
        assert!(value["data"].get("roomTeamId").is_none());
    }
}
