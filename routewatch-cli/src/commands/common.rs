//! Common types and utilities shared across CLI commands.

use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::info;

use routewatch::config::ConfigFile;
use routewatch::coord::{Coordinate, Destination};

use crate::error::CliError;

/// Destination override shared by `track` and `route`.
#[derive(Debug, Clone, Args)]
pub struct DestinationArgs {
    /// Destination as LAT,LON (default: [destination] in config.ini)
    #[arg(long, value_name = "LAT,LON", allow_hyphen_values = true)]
    pub to: Option<Coordinate>,

    /// Display name for --to
    #[arg(long, requires = "to")]
    pub name: Option<String>,
}

/// Resolve the destination: CLI takes precedence, then config.
pub fn resolve_destination(args: &DestinationArgs, config: &ConfigFile) -> Destination {
    match args.to {
        Some(coordinate) => {
            let name = args.name.clone().unwrap_or_else(|| coordinate.to_string());
            Destination::new(name, coordinate)
        }
        None => config.destination.clone(),
    }
}

/// Cancels `token` on Ctrl+C.
pub fn install_interrupt_handler(token: CancellationToken) -> Result<(), CliError> {
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        token.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))
}
