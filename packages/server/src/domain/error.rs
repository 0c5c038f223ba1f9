//! Domain-level errors for the repository and pusher seams.

use thiserror::Error;

/// Errors surfaced by [`crate::domain::RoomRepository`] implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("peer '{0}' is not connected")]
    PeerNotFound(String),
}

/// Errors surfaced by [`crate::domain::MessagePusher`] implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),
    #[error("failed to push message: {0}")]
    PushFailed(String),
}
