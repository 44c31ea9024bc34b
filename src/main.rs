//! Region data layer - command line entry point.
//!
//! Initializes the database pool and the cache, runs one data layer action,
//! and tears both down again.

use region_data::config::{Command, Config};
use region_data::models::{self, MAPPED_TABLES};
use region_data::state::AppState;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .init();
    }
}

async fn run(state: &AppState, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Regions => {
            let regions = models::get_regions_dict(state).await?;
            println!("{}", serde_json::to_string_pretty(&regions)?);
        }
        Command::Invalidate => {
            let removed = models::invalidate_regions_dict(state).await?;
            println!("{}", if removed { "invalidated" } else { "not cached" });
        }
        Command::InitSchema => {
            state.db.create_all(MAPPED_TABLES).await?;
            println!("schema ready");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse_args();

    // Initialize logging
    init_tracing(&config);

    let command = config.command.unwrap_or(Command::Regions);
    info!(
        command = ?command,
        "Starting region-data v{}",
        env!("CARGO_PKG_VERSION")
    );

    let state = AppState::init(&config).await.inspect_err(|e| {
        error!(error = %e, suggestion = ?e.suggestion(), "Startup failed");
    })?;

    let result = run(&state, command).await;
    state.shutdown().await;

    if let Err(e) = result {
        error!(error = %e, "Command failed");
        return Err(e);
    }

    info!("Shutdown complete");
    Ok(())
}
