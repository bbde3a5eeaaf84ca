//! db-agent - main entry point.
//!
//! Loads `.env`, parses the command line, connects to SQL Server, the language
//! model API and the training store, then runs the requested subcommand.

use clap::Parser;
use db_agent::app::App;
use db_agent::config::Config;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; variables may come from the real environment
    let _ = dotenvy::dotenv();

    let config = Config::parse();
    init_tracing(&config);

    info!(
        command = ?config.command,
        "Starting db-agent v{}",
        env!("CARGO_PKG_VERSION")
    );

    let app = App::connect(&config).await.inspect_err(|e| {
        error!(error = %e, "Startup failed");
    })?;

    app.execute(&config).await.inspect_err(|e| {
        error!(error = %e, "Command failed");
    })?;

    Ok(())
}
