//! Infrastructure layer: in-memory storage, WebSocket pusher, wire DTOs.

pub mod dto;
pub mod message_pusher;
pub mod repository;
