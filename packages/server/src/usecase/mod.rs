//! UseCase layer: one struct per coordinator concern.
//!
//! Every use case owns the repository and pusher seams behind `Arc<dyn ...>`
//! and exposes state transitions plus the push helpers the transport layer
//! needs to emit the resulting events.

pub mod admission;
pub mod chat;
pub mod connect_peer;
pub mod disconnect_peer;
pub mod join_room;
pub mod leave_room;
pub mod recording;
pub mod room_query;
pub mod screen_share;
pub mod signal_relay;

pub use admission::{AdmissionRequest, AdmissionRouting, AdmissionUseCase};
pub use chat::ChatUseCase;
pub use connect_peer::ConnectPeerUseCase;
pub use disconnect_peer::{DisconnectOutcome, DisconnectPeerUseCase};
pub use join_room::{JoinRoomUseCase, JoinSnapshot};
pub use leave_room::{DepartureNotice, LeaveRoomUseCase};
pub use recording::{RecordingUseCase, ALREADY_RECORDING_MESSAGE};
pub use room_query::{RoomPresence, RoomQueryUseCase, TeamAccess, TeamAccessReason};
pub use screen_share::ScreenShareUseCase;
pub use signal_relay::SignalRelayUseCase;
