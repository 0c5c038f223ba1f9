//! Server state and dependency wiring.

use std::sync::Arc;

use crate::infrastructure::{
    message_pusher::WebSocketMessagePusher, repository::InMemorySignalingRepository,
};
use crate::usecase::{
    AdmissionUseCase, ChatUseCase, ConnectPeerUseCase, DisconnectPeerUseCase, JoinRoomUseCase,
    LeaveRoomUseCase, RecordingUseCase, RoomQueryUseCase, ScreenShareUseCase, SignalRelayUseCase,
};

/// Shared application state: one use case per coordinator concern.
pub struct AppState {
    pub connect_peer: Arc<ConnectPeerUseCase>,
    pub join_room: Arc<JoinRoomUseCase>,
    pub leave_room: Arc<LeaveRoomUseCase>,
    pub disconnect_peer: Arc<DisconnectPeerUseCase>,
    pub admission: Arc<AdmissionUseCase>,
    pub chat: Arc<ChatUseCase>,
    pub screen_share: Arc<ScreenShareUseCase>,
    pub signal_relay: Arc<SignalRelayUseCase>,
    pub recording: Arc<RecordingUseCase>,
    pub room_query: Arc<RoomQueryUseCase>,
}

/// Wire the full dependency graph over fresh in-memory state.
///
/// `strict_admission` gates approve/reject against the host registry; the
/// default (`false`) keeps the historical trust-the-client behavior.
pub fn build_state(strict_admission: bool) -> AppState {
    // 1. Repository (in-memory tables)
    let repository = Arc::new(InMemorySignalingRepository::new());

    // 2. MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    // 3. UseCases
    let leave_room = Arc::new(LeaveRoomUseCase::new(
        repository.clone(),
        message_pusher.clone(),
    ));

    AppState {
        connect_peer: Arc::new(ConnectPeerUseCase::new(
            repository.clone(),
            message_pusher.clone(),
        )),
        join_room: Arc::new(JoinRoomUseCase::new(
            repository.clone(),
            message_pusher.clone(),
        )),
        leave_room: leave_room.clone(),
        disconnect_peer: Arc::new(DisconnectPeerUseCase::new(
            repository.clone(),
            message_pusher.clone(),
            leave_room,
        )),
        admission: Arc::new(AdmissionUseCase::new(
            repository.clone(),
            message_pusher.clone(),
            strict_admission,
        )),
        chat: Arc::new(ChatUseCase::new(repository.clone(), message_pusher.clone())),
        screen_share: Arc::new(ScreenShareUseCase::new(
            repository.clone(),
            message_pusher.clone(),
        )),
        signal_relay: Arc::new(SignalRelayUseCase::new(message_pusher.clone())),
        recording: Arc::new(RecordingUseCase::new(
            repository.clone(),
            message_pusher.clone(),
        )),
        room_query: Arc::new(RoomQueryUseCase::new(repository, message_pusher)),
    }
}
