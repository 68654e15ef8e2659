//! Lurk player records tool
//!
//! Offline inspection of the player data directory the server writes:
//! list stored characters, show one as the server would load it, or check
//! every record for problems.

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use lurk_server::config::ServerConfig;
use lurk_server::game::player::{record_within_limits, Player};
use lurk_server::game::record::RecordStore;
use lurk_server::VERSION;

const USAGE: &str = "usage: lurk-players <list | show <name> | check>";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args: Vec<String> = env::args().skip(1).collect();

    let config = ServerConfig::load().await?;
    init_logging(&config);

    if !config.config_path.exists() {
        warn!(
            "Config file not found at {}, using defaults",
            config.config_path.display()
        );
    }
    info!(
        version = VERSION,
        server = %config.server_name,
        data_dir = %config.player_data_dir().display(),
        "Configuration loaded"
    );

    let store = RecordStore::open(config.player_data_dir()).with_context(|| {
        format!(
            "Failed to open player data directory: {}",
            config.player_data_dir().display()
        )
    })?;

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["list"] => {
            for name in store.list_names()? {
                println!("{}", name);
            }
            Ok(ExitCode::SUCCESS)
        }
        ["show", name] => {
            if !store.exists(name) {
                eprintln!("No record for {}", name);
                return Ok(ExitCode::FAILURE);
            }
            let player = Player::load(*name, &store, config.starting_room.clone());
            println!("{}", player.snapshot());
            Ok(ExitCode::SUCCESS)
        }
        ["check"] => check(&store),
        _ => {
            eprintln!("{}", USAGE);
            Ok(ExitCode::from(2))
        }
    }
}

/// Decode every record and report the ones the server would refuse
fn check(store: &RecordStore) -> Result<ExitCode> {
    let names = store.list_names()?;
    let mut bad = 0;

    for name in &names {
        match store.load(name) {
            Ok(Some(record)) => {
                if !record_within_limits(&record) {
                    warn!(player = %name, "Record exceeds stat limits");
                    bad += 1;
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(player = %name, error = %e, "Record unreadable");
                bad += 1;
            }
        }
    }

    println!("{} records, {} with problems", names.len(), bad);
    Ok(if bad == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Initialize the logging/tracing system
fn init_logging(config: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_directive()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_level(true)
        .init();
}
