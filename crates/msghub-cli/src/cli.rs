//! Clap CLI definitions for msghub.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const AFTER_HELP: &str = "\
Examples:
  msghub daemon                       Serve on the configured address (default 0.0.0.0:9817)
  msghub daemon --listen 127.0.0.1:4000
  msghub client                       Connect to ws://localhost:9817

In the client, each stdin line is `<to> <field> <field> ...`; spaces become
field separators. Inbound messages print as `<from> [fields]`.";

/// msghub: Relay hub for addressed text messages.
#[derive(Parser)]
#[command(name = "msghub", version, about, after_help = AFTER_HELP)]
pub struct Cli {
    /// Path to config file (default: ~/.msghub/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the hub: WebSocket server with presence and the @echo/@whoami services.
    Daemon {
        /// Override the listen address.
        #[arg(long, short = 'l')]
        listen: Option<SocketAddr>,
    },
    /// Connect to a hub and relay stdin lines as messages.
    Client {
        /// Override the hub URL.
        #[arg(long, short = 'u')]
        url: Option<String>,
    },
}
