//! CLI runner for common setup.
//!
//! Loads the config file, initializes logging and builds the pieces every
//! networked command needs.

use tracing::info;

use routewatch::config::ConfigFile;
use routewatch::logging::{init_logging, LoggingGuard};
use routewatch::route::{AsyncReqwestClient, OsrmRouteClient};

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Keeps logging active while the runner exists
    _logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Load config and initialize logging.
    ///
    /// `verbose` also mirrors log output to stderr.
    pub fn new(verbose: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;
        let log_file = config.log_file();

        let logging_guard = init_logging(&log_file, verbose)
            .map_err(|e| CliError::LoggingInit(format!("{}: {}", log_file.display(), e)))?;

        Ok(Self {
            _logging_guard: logging_guard,
            config,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("RouteWatch v{}", routewatch::VERSION);
        info!(command, "RouteWatch CLI starting");
    }

    /// OSRM client configured from `[routing]`.
    pub fn route_client(&self) -> Result<OsrmRouteClient<AsyncReqwestClient>, CliError> {
        let routing = &self.config.routing;
        let http = AsyncReqwestClient::with_timeout(routing.timeout).map_err(CliError::HttpClient)?;
        info!(base_url = %routing.base_url, profile = %routing.profile, "Routing via OSRM");
        Ok(OsrmRouteClient::with_config(http, routing.osrm_config()))
    }

    /// Multi-threaded Tokio runtime for the async commands.
    pub fn build_runtime(&self) -> Result<tokio::runtime::Runtime, CliError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("routewatch")
            .build()
            .map_err(CliError::Runtime)
    }
}
