//! Domain layer: value objects, entities, seam traits and domain errors.

pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod repository;
pub mod value_object;

pub use entity::{ChatEntry, Peer, Room, RoomMeta, WaitingGuest, CHAT_LOG_CAP};
pub use error::{MessagePushError, RepositoryError};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use repository::RoomRepository;
pub use value_object::{ConnectionId, ConnectionIdFactory, RoomId, Timestamp};
