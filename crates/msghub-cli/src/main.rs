//! msghub CLI: Run a relay hub or connect to one.

mod cli;
mod client;
mod daemon;

use crate::cli::{Cli, Commands};
use clap::Parser;
use msghub_types::config::load_config;

fn init_tracing_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing_stderr();

    let mut config = load_config(cli.config.as_deref());

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create Tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Daemon { listen } => {
            if let Some(addr) = listen {
                config.hub.listen_addr = addr;
            }
            if let Err(e) = rt.block_on(daemon::run(config.hub)) {
                eprintln!("msghub daemon: {e}");
                std::process::exit(1);
            }
        }
        Commands::Client { url } => {
            if let Some(url) = url {
                config.client.url = url;
            }
            rt.block_on(client::run(config.client));
        }
    }
}
