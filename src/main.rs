//! Isolation header server.
//!
//! Serves a small Axum app whose every response carries the COOP/COEP and
//! CORS headers a cross-origin-isolated front end needs.
//!
//! ```text
//! isolation-headers                       # serve with built-in defaults
//! isolation-headers -c server.toml serve  # serve with a config file
//! isolation-headers headers               # print the emitted header block
//! isolation-headers check-config -c server.toml
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use isolation_headers::config::{self, ConfigError, ServerConfig};
use isolation_headers::lifecycle::Shutdown;
use isolation_headers::observability::logging;
use isolation_headers::{HeaderSet, HttpServer};

#[derive(Parser)]
#[command(name = "isolation-headers")]
#[command(version, about = "Serve responses stamped with cross-origin isolation and CORS headers", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override `observability.log_level`.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Print the response headers the server would emit
    Headers,
    /// Validate the configuration and exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = effective_config(&cli)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await?,
        Commands::Headers => print!("{}", HeaderSet::try_from(&config.isolation)?),
        Commands::CheckConfig => {
            HeaderSet::try_from(&config.isolation)?;
            println!("configuration OK");
        }
    }

    Ok(())
}

/// File (or defaults), then CLI overrides, then validation.
fn effective_config(cli: &Cli) -> Result<ServerConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => ServerConfig::default(),
    };

    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }

    config::validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    logging::init(&config.observability)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        allow_origin = %config.isolation.allow_origin,
        handle_preflight = config.http.handle_preflight,
        static_dir = ?config.http.static_dir,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let server = HttpServer::new(config)?;
    let listener = TcpListener::bind(&server.config().listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_signal();

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
