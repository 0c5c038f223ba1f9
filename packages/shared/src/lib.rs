//! Shared utilities for the Huddle signaling workspace.
//!
//! Cross-cutting concerns used by every binary: wall-clock helpers and
//! logging setup.

pub mod logger;
pub mod time;
