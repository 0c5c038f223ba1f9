//! Meeting-room signaling server library.
//!
//! In-memory room coordinator for WebRTC peer discovery: host-gated
//! admission, chat history, screen-share status and recording exclusivity,
//! relayed over per-connection WebSocket channels. The server never inspects
//! media; SDP/ICE payloads pass through opaque.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
