//! Loopback relay for the Switchboard console.
//!
//! Issues session tokens, tracks rooms and recordings, and pushes
//! active-speaker signals over the `/rtc` WebSocket.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin switchboard-relay
//! cargo run --bin switchboard-relay -- --host 0.0.0.0 --port 4000
//! ```

use clap::Parser;
use switchboard_relay::ui::Server;
use switchboard_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "switchboard-relay")]
#[command(about = "Loopback relay: tokens, recording egress and active-speaker signalling", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "4000")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    let server = Server::in_memory();
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
