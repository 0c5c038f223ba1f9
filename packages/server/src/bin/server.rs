//! Huddle meeting-room signaling server.
//!
//! In-memory coordinator for WebRTC peer discovery: host-gated admission,
//! chat history, screen-share status and recording exclusivity.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin huddle-server
//! cargo run --bin huddle-server -- --host 0.0.0.0 --port 3000
//! ```

use clap::Parser;
use huddle_server::ui::{build_state, Server};
use huddle_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "huddle-server")]
#[command(about = "Meeting-room signaling server for WebRTC peer discovery", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Verify approve/reject callers against the host registry instead of
    /// trusting any connection's claim of host authority
    #[arg(long)]
    strict_admission: bool,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    let state = build_state(args.strict_admission);
    let server = Server::new(state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
