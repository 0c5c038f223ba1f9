//! WebSocket connection handler and event dispatch.
//!
//! One socket per client: the upgrade mints the connection id, pushes the
//! `me` handshake, then splits the socket into a receive loop (parse the
//! tagged event union, dispatch to the use cases) and a pusher loop (drain
//! the connection's outbound channel into the sink). Whichever loop ends
//! first aborts the other and triggers the disconnect cascade.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, RoomId},
    infrastructure::dto::{
        conversion::join_request_event,
        websocket::{ChatMessageDto, ClientEvent, RoomUser, ServerEvent, TeamAccessReason},
    },
    ui::state::AppState,
    usecase::{self, AdmissionRouting, DisconnectOutcome, ALREADY_RECORDING_MESSAGE},
};

/// Reason string for the `room-closed` broadcast when the host departs.
const HOST_LEFT_REASON: &str = "The host has left the meeting.";

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that drains the connection's outbound channel into the
/// WebSocket sink.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();

    // Register the connection and its outbound channel.
    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = state.connect_peer.execute(tx).await;
    tracing::info!("Client '{}' connected and registered", connection_id);

    // Self-identification handshake: without this the client never learns
    // the id the relays address it by.
    state
        .connect_peer
        .push_to_peer(
            &connection_id,
            &ServerEvent::Me(connection_id.as_str().to_string()).to_json(),
        )
        .await;

    let mut send_task = pusher_loop(rx, sender);

    let recv_state = state.clone();
    let recv_connection_id = connection_id.clone();

    // Receive loop: one event at a time, each handled to completion.
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => dispatch(&recv_state, &recv_connection_id, event).await,
                    Err(e) => {
                        tracing::warn!(
                            "Discarding malformed event from '{}': {}",
                            recv_connection_id,
                            e
                        );
                    }
                },
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", recv_connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Cascading cleanup across every table, then the announcements.
    let outcome = state.disconnect_peer.execute(&connection_id).await;
    announce_disconnect(&state, &connection_id, outcome).await;
}

async fn dispatch(state: &Arc<AppState>, connection_id: &ConnectionId, event: ClientEvent) {
    match event {
        ClientEvent::JoinRoom {
            room_id,
            name,
            is_host,
            team_id,
        } => on_join_room(state, connection_id, room_id, name, is_host, team_id).await,
        ClientEvent::LeaveRoom => on_leave_room(state, connection_id).await,
        ClientEvent::ChatMessage {
            room_id,
            sender,
            message,
        } => on_chat_message(state, connection_id, room_id, sender, message).await,
        ClientEvent::RequestChatHistory(room_id) => {
            on_request_chat_history(state, connection_id, room_id).await
        }
        ClientEvent::RequestToJoin {
            room_id,
            guest_id,
            guest_name,
        } => on_request_to_join(state, connection_id, room_id, guest_id, guest_name).await,
        ClientEvent::ApproveGuest {
            room_id,
            guest_socket_id,
        } => on_approve_guest(state, connection_id, room_id, guest_socket_id).await,
        ClientEvent::RejectGuest {
            room_id,
            guest_socket_id,
        } => on_reject_guest(state, connection_id, room_id, guest_socket_id).await,
        ClientEvent::CancelJoinRequest { room_id } => {
            on_cancel_join_request(state, connection_id, room_id).await
        }
        ClientEvent::Signal { target_id, signal } => {
            let event = ServerEvent::Signal {
                from: connection_id.as_str().to_string(),
                signal,
            };
            state
                .signal_relay
                .relay(&ConnectionId::new(target_id), &event.to_json())
                .await;
        }
        ClientEvent::RequestScreenTrack { target_id } => {
            let event = ServerEvent::RequestScreenTrack {
                from: connection_id.as_str().to_string(),
            };
            state
                .signal_relay
                .relay(&ConnectionId::new(target_id), &event.to_json())
                .await;
        }
        ClientEvent::ScreenShareStatus {
            room_id,
            is_sharing,
        } => on_screen_share_status(state, connection_id, room_id, is_sharing).await,
        ClientEvent::RequestStartRecord(room_id) => {
            on_request_start_record(state, connection_id, room_id).await
        }
        ClientEvent::RequestStopRecord(room_id) => {
            on_request_stop_record(state, connection_id, room_id).await
        }
        ClientEvent::CheckTeamAccess {
            room_id,
            user_team_id,
        } => on_check_team_access(state, connection_id, room_id, user_team_id).await,
        ClientEvent::GetRoomMetadata { room_id } => {
            on_get_room_metadata(state, connection_id, room_id).await
        }
        ClientEvent::CheckRoomExists { room_id } => {
            on_check_room_exists(state, connection_id, room_id).await
        }
    }
}

async fn on_join_room(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    room_id: String,
    name: Option<String>,
    is_host: bool,
    team_id: Option<i64>,
) {
    let room_id = RoomId::new(room_id);
    let snapshot = match state
        .join_room
        .execute(connection_id, room_id.clone(), name, is_host, team_id)
        .await
    {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!("Join of '{}' to '{}' failed: {}", connection_id, room_id, e);
            return;
        }
    };

    // Snapshot to the joiner first, then the announcement to the others.
    let users: Vec<RoomUser> = snapshot.others.iter().map(RoomUser::from).collect();
    let sharing: Vec<String> = snapshot
        .others
        .iter()
        .filter(|p| p.sharing_screen)
        .map(|p| p.id.as_str().to_string())
        .collect();
    state
        .join_room
        .push_snapshot(
            connection_id,
            &ServerEvent::AllUsers { users, sharing }.to_json(),
        )
        .await;

    let targets: Vec<ConnectionId> = snapshot.others.iter().map(|p| p.id.clone()).collect();
    let joined = ServerEvent::UserJoined {
        id: connection_id.as_str().to_string(),
        name: snapshot.display_name,
    };
    state
        .join_room
        .broadcast_user_joined(targets, &joined.to_json())
        .await;
}

async fn on_leave_room(state: &Arc<AppState>, connection_id: &ConnectionId) {
    let Some(notice) = state.leave_room.execute(connection_id).await else {
        return;
    };

    let left = ServerEvent::UserLeft(connection_id.as_str().to_string()).to_json();
    state
        .leave_room
        .broadcast_departure(notice.remaining.clone(), &left)
        .await;

    if notice.closed_room {
        let closed = ServerEvent::RoomClosed {
            reason: HOST_LEFT_REASON.to_string(),
        }
        .to_json();
        state
            .leave_room
            .broadcast_departure(notice.remaining, &closed)
            .await;
    }
}

async fn on_chat_message(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    room_id: String,
    sender: String,
    message: String,
) {
    let room_id = RoomId::new(room_id);
    let (entry, targets) = state
        .chat
        .append(connection_id, &room_id, sender, message)
        .await;

    let event = ServerEvent::ChatMessage(ChatMessageDto::from(&entry));
    state.chat.broadcast_to(targets, &event.to_json()).await;
}

async fn on_request_chat_history(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    room_id: String,
) {
    let room_id = RoomId::new(room_id);
    let history = state.chat.history(&room_id).await;
    let entries: Vec<ChatMessageDto> = history.iter().map(ChatMessageDto::from).collect();
    state
        .chat
        .push_to_peer(connection_id, &ServerEvent::ChatHistory(entries).to_json())
        .await;
}

async fn on_request_to_join(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    room_id: String,
    guest_id: String,
    guest_name: String,
) {
    let room_id = RoomId::new(room_id);
    let Some(request) = state
        .admission
        .request_to_join(connection_id, &room_id, guest_id, guest_name)
        .await
    else {
        return;
    };

    let event = join_request_event(room_id.as_str(), &request.guest).to_json();
    match request.routing {
        AdmissionRouting::ToHost(host) => state.admission.push_to_peer(&host, &event).await,
        AdmissionRouting::ToRoom(members) => state.admission.broadcast_to(members, &event).await,
    }
}

async fn on_approve_guest(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    room_id: String,
    guest_socket_id: String,
) {
    let room_id = RoomId::new(room_id);
    let guest = ConnectionId::new(guest_socket_id);
    if state.admission.approve(connection_id, &room_id, &guest).await {
        let event = ServerEvent::JoinApproved {
            room_id: room_id.into_string(),
            approved_by: connection_id.as_str().to_string(),
        };
        state.admission.push_to_peer(&guest, &event.to_json()).await;
    }
}

async fn on_reject_guest(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    room_id: String,
    guest_socket_id: String,
) {
    let room_id = RoomId::new(room_id);
    let guest = ConnectionId::new(guest_socket_id);
    if state.admission.reject(connection_id, &room_id, &guest).await {
        let event = ServerEvent::JoinRejected {
            room_id: room_id.into_string(),
            rejected_by: connection_id.as_str().to_string(),
        };
        state.admission.push_to_peer(&guest, &event.to_json()).await;
    }
}

async fn on_cancel_join_request(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    room_id: String,
) {
    let room_id = RoomId::new(room_id);
    let routing = state.admission.cancel(connection_id, &room_id).await;

    let event = ServerEvent::RequestCancelled {
        room_id: room_id.into_string(),
        guest_socket_id: connection_id.as_str().to_string(),
    }
    .to_json();
    match routing {
        AdmissionRouting::ToHost(host) => state.admission.push_to_peer(&host, &event).await,
        AdmissionRouting::ToRoom(members) => state.admission.broadcast_to(members, &event).await,
    }
}

async fn on_screen_share_status(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    room_id: String,
    is_sharing: bool,
) {
    let room_id = RoomId::new(room_id);
    let targets = state
        .screen_share
        .set_status(connection_id, &room_id, is_sharing)
        .await;

    let event = ServerEvent::PeerScreenShareStatus {
        id: connection_id.as_str().to_string(),
        is_sharing,
    };
    state
        .screen_share
        .broadcast_to(targets, &event.to_json())
        .await;
}

async fn on_request_start_record(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    room_id: String,
) {
    let room_id = RoomId::new(room_id);
    let outcome = state.recording.start(connection_id, &room_id).await;

    let ack = if outcome.granted {
        ServerEvent::RecordStartResult {
            success: true,
            message: None,
        }
    } else {
        ServerEvent::RecordStartResult {
            success: false,
            message: Some(ALREADY_RECORDING_MESSAGE.to_string()),
        }
    };
    state
        .recording
        .push_to_peer(connection_id, &ack.to_json())
        .await;

    if outcome.granted {
        let started = ServerEvent::RecordStarted {
            by: connection_id.as_str().to_string(),
        };
        state
            .recording
            .broadcast_to(outcome.members, &started.to_json())
            .await;
    }
}

async fn on_request_stop_record(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    room_id: String,
) {
    let room_id = RoomId::new(room_id);
    if let Some(members) = state.recording.stop(connection_id, &room_id).await {
        let stopped = ServerEvent::RecordStopped {
            by: connection_id.as_str().to_string(),
        };
        state
            .recording
            .broadcast_to(members, &stopped.to_json())
            .await;
    }
}

async fn on_check_team_access(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    room_id: String,
    user_team_id: Option<i64>,
) {
    let room_id = RoomId::new(room_id);
    let access = state
        .room_query
        .check_team_access(&room_id, user_team_id)
        .await;

    let reason = match access.reason {
        usecase::TeamAccessReason::NoMetadata => TeamAccessReason::NoMetadata,
        usecase::TeamAccessReason::SameTeam => TeamAccessReason::SameTeam,
        usecase::TeamAccessReason::DifferentTeam => TeamAccessReason::DifferentTeam,
    };
    let event = ServerEvent::TeamAccessResult {
        has_direct_access: access.has_direct_access,
        room_team_id: access.room_team_id,
        reason,
    };
    state
        .room_query
        .push_to_peer(connection_id, &event.to_json())
        .await;
}

async fn on_get_room_metadata(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    room_id: String,
) {
    let room_id = RoomId::new(room_id);
    let event = match state.room_query.metadata(&room_id).await {
        Some(meta) => ServerEvent::RoomMetadataResult {
            success: true,
            team_id: meta.team_id,
            host_socket_id: Some(meta.host.into_string()),
            created_at: Some(meta.created_at.to_rfc3339()),
            error: None,
        },
        None => ServerEvent::RoomMetadataResult {
            success: false,
            team_id: None,
            host_socket_id: None,
            created_at: None,
            error: Some("Room metadata not found.".to_string()),
        },
    };
    state
        .room_query
        .push_to_peer(connection_id, &event.to_json())
        .await;
}

async fn on_check_room_exists(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    room_id: String,
) {
    let room_id = RoomId::new(room_id);
    let presence = state.room_query.room_presence(&room_id).await;

    let event = ServerEvent::RoomExistsResult {
        exists: presence.exists,
        has_host: presence.has_host,
        user_count: presence.user_count,
    };
    state
        .room_query
        .push_to_peer(connection_id, &event.to_json())
        .await;
}

async fn announce_disconnect(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    outcome: DisconnectOutcome,
) {
    if let Some(notice) = outcome.departure {
        let left = ServerEvent::UserLeft(connection_id.as_str().to_string()).to_json();
        state
            .disconnect_peer
            .broadcast_to(notice.remaining.clone(), &left)
            .await;

        if notice.closed_room {
            let closed = ServerEvent::RoomClosed {
                reason: HOST_LEFT_REASON.to_string(),
            }
            .to_json();
            state
                .disconnect_peer
                .broadcast_to(notice.remaining, &closed)
                .await;
        }
    }

    for cleanup in outcome.waiting_cleanups {
        if let Some(host) = cleanup.host {
            let event = ServerEvent::WaitingGuestDisconnected {
                guest_socket_id: cleanup.guest.connection.into_string(),
            };
            state
                .disconnect_peer
                .push_to_peer(&host, &event.to_json())
                .await;
        }
    }

    for release in outcome.recorder_releases {
        let stopped = ServerEvent::RecordStopped {
            by: connection_id.as_str().to_string(),
        };
        state
            .disconnect_peer
            .broadcast_to(release.members, &stopped.to_json())
            .await;
    }
}
