//! Operator console for Switchboard voice rooms.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin switchboard -- rooms
//! cargo run --bin switchboard -- broadcast --room Lobby
//! cargo run --bin switchboard -- monitor --poll-secs 5
//! ```

use clap::Parser;

use switchboard_console::cli::{Args, run};
use switchboard_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
