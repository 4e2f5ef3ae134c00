//! INI serialization: `ConfigFile` → commented INI text.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let coordinate = config.destination.coordinate();
    let log_file = config
        .logging
        .file
        .as_deref()
        .map(path_to_string)
        .unwrap_or_default();

    format!(
        r#"[destination]
; Place every route is computed towards
name = {}
latitude = {}
longitude = {}

[routing]
; OSRM server root (the /route/v1 path is appended)
base_url = {}
; OSRM profile: driving, walking or cycling (server dependent)
profile = {}
; Request timeout in seconds
timeout = {}

[geolocation]
; Request GPS-grade fixes where the platform distinguishes them
high_accuracy = {}
; Oldest cached fix that may be delivered, in milliseconds (0 = fresh fixes only)
maximum_age_ms = {}
; Give up on a single fix attempt after this many milliseconds
timeout_ms = {}
; Pause after a location error before trying again, in milliseconds
retry_delay_ms = {}

[logging]
; Log file (default: ~/.routewatch/routewatch.log)
file = {}
"#,
        config.destination.name(),
        coordinate.latitude(),
        coordinate.longitude(),
        config.routing.base_url,
        config.routing.profile,
        config.routing.timeout.as_secs(),
        config.geolocation.high_accuracy,
        config.geolocation.maximum_age.as_millis(),
        config.geolocation.timeout.as_millis(),
        config.geolocation.retry_delay.as_millis(),
        log_file,
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
