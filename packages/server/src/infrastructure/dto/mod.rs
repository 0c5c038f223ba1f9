//! Data Transfer Objects for the signaling protocol.
//!
//! - `websocket`: tagged client→server and server→client event unions
//! - `conversion`: domain entity → DTO mapping

pub mod conversion;
pub mod websocket;
