//! UI layer: the axum transport boundary.

pub mod handler;
pub mod server;
pub mod signal;
pub mod state;

pub use server::Server;
pub use state::{build_state, AppState};
