#![cfg_attr(not(test), deny(clippy::panic))]

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use starboard_server::config;
use starboard_server::events::NullEventSink;
use starboard_server::lobby::LobbyFlag;
use starboard_server::logging;
use starboard_server::state::ServerState;
use starboard_server::version::ALL_VERSIONS_MASK;

/// Starboard -- lobby and game-session core for a classic ARPG server
/// emulator
#[derive(Parser, Debug)]
#[command(name = "starboard-server")]
#[command(about = "Lobby and game-session core for a classic ARPG server emulator")]
#[command(version)]
struct Cli {
    /// Path to the configuration file (defaults to ./config.json).
    #[arg(long, env = "STARBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load(cli.config.as_deref())?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }

    logging::init_with_config(&cfg.logging);

    let state = ServerState::new(cfg.lobby.clone(), Arc::new(NullEventSink));

    // Built-in block lobbies: persistent, never expiring, open to every
    // version.
    for block in 1..=cfg.lobby.block_count {
        let lobby = state.create_lobby(false);
        let mut lobby = lobby.write();
        lobby.name = format!("BLOCK{block:02}");
        lobby.block = block;
        lobby.allowed_versions = ALL_VERSIONS_MASK;
        lobby.idle_timeout = Duration::from_secs(cfg.lobby.persistent_idle_timeout_secs);
        lobby.set_flag(LobbyFlag::Persistent);
        lobby.set_flag(LobbyFlag::Default);
    }
    tracing::info!(
        block_lobbies = cfg.lobby.block_count,
        "lobby core ready; waiting for shutdown signal"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    Ok(())
}
