//! Settings structs for each `[section]` of the config file.

use std::path::PathBuf;
use std::time::Duration;

use crate::coord::{default_destination, Destination};
use crate::geo::{WatchOptions, DEFAULT_FIX_TIMEOUT, DEFAULT_RETRY_DELAY};
use crate::route::{OsrmConfig, DEFAULT_HTTP_TIMEOUT, DEFAULT_OSRM_BASE_URL, DEFAULT_OSRM_PROFILE};

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Route target
    pub destination: Destination,
    /// Routing service settings
    pub routing: RoutingSettings,
    /// Position sampling settings
    pub geolocation: GeolocationSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// `[routing]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingSettings {
    /// OSRM server root, without the `/route/v1` suffix
    pub base_url: String,
    /// OSRM profile (driving, walking, cycling)
    pub profile: String,
    /// Request timeout
    pub timeout: Duration,
}

/// `[geolocation]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct GeolocationSettings {
    pub high_accuracy: bool,
    pub maximum_age: Duration,
    pub timeout: Duration,
    pub retry_delay: Duration,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file; `None` uses the default location
    pub file: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            destination: default_destination(),
            routing: RoutingSettings::default(),
            geolocation: GeolocationSettings::default(),
            logging: LoggingSettings { file: None },
        }
    }
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OSRM_BASE_URL.to_string(),
            profile: DEFAULT_OSRM_PROFILE.to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl Default for GeolocationSettings {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age: Duration::ZERO,
            timeout: DEFAULT_FIX_TIMEOUT,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RoutingSettings {
    pub fn osrm_config(&self) -> OsrmConfig {
        OsrmConfig {
            base_url: self.base_url.clone(),
            profile: self.profile.clone(),
        }
    }
}

impl GeolocationSettings {
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions::default()
            .with_high_accuracy(self.high_accuracy)
            .with_maximum_age(self.maximum_age)
            .with_timeout(self.timeout)
            .with_retry_delay(self.retry_delay)
    }
}
