//! User configuration stored in `~/.routewatch/config.ini`.
//!
//! ```ini
//! [destination]
//! name = KPU Surrey Library
//! latitude = 49.13204
//! longitude = -122.87139
//!
//! [routing]
//! base_url = https://router.project-osrm.org
//! profile = driving
//! timeout = 10
//! ```
//!
//! Missing keys fall back to defaults; a missing file is all defaults.

mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, GeolocationSettings, LoggingSettings, RoutingSettings};
