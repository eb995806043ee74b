//! CLI for the PopSub inspector broker.
//!
//! Subcommands:
//! - `server` (default): run the WebSocket server with the inspector plugin

use clap::{Parser, Subcommand};
use popsub_inspector::broker::Broker;
use popsub_inspector::config::load_config_from;
use popsub_inspector::plugin::InspectorPlugin;
use popsub_inspector::transport::websocket::start_websocket_server;
use popsub_inspector::utils::logging;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "popsub-inspector")]
#[command(version)]
#[command(about = "Pub/sub broker that screens publishes with an inspector service")]
struct Cli {
    /// Configuration file (defaults to config/default.* when present)
    #[arg(short, long, env = "POPSUB_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Start the WebSocket server
    Server,
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Command::Server) {
        Command::Server => run_server(cli.config.as_deref()).await,
    };
    if let Err(e) = result {
        // logging may not be up yet if the config itself failed to load
        eprintln!("popsub-inspector: {e}");
        std::process::exit(1);
    }
}

async fn run_server(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_from(config_path)?;
    logging::init(&config.log.level);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let broker = Arc::new(Mutex::new(Broker::new()));

    let plugin = {
        let mut broker = broker.lock().unwrap_or_else(PoisonError::into_inner);
        InspectorPlugin::init(&mut broker, &config.inspector)?
    };

    let served = tokio::select! {
        res = start_websocket_server(&addr, broker.clone()) => {
            if let Err(e) = &res {
                error!("WebSocket server failed: {}", e);
            } else {
                error!("WebSocket server exited unexpectedly.");
            }
            res
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
            Ok(())
        }
    };

    let mut broker = broker.lock().unwrap_or_else(PoisonError::into_inner);
    plugin.cleanup(&mut broker);

    Ok(served?)
}
