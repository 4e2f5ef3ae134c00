//! INI parsing: `Ini` → `ConfigFile`.
//!
//! The single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coord::{Coordinate, Destination};

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [destination] section
    if let Some(section) = ini.section(Some("destination")) {
        let default = config.destination.coordinate();
        let name = match section.get("name").map(str::trim) {
            Some(v) if !v.is_empty() => v.to_string(),
            Some(v) => {
                return Err(invalid("destination", "name", v, "must not be empty"));
            }
            None => config.destination.name().to_string(),
        };
        let latitude = parse_value(section, "destination", "latitude", "expected a number")?
            .unwrap_or(default.latitude());
        let longitude = parse_value(section, "destination", "longitude", "expected a number")?
            .unwrap_or(default.longitude());

        let coordinate = Coordinate::new(latitude, longitude).map_err(|e| {
            invalid(
                "destination",
                "latitude/longitude",
                &format!("{}, {}", latitude, longitude),
                &e.to_string(),
            )
        })?;
        config.destination = Destination::new(name, coordinate);
    }

    // [routing] section
    if let Some(section) = ini.section(Some("routing")) {
        if let Some(v) = section.get("base_url") {
            let v = v.trim();
            if !(v.starts_with("http://") || v.starts_with("https://")) {
                return Err(invalid(
                    "routing",
                    "base_url",
                    v,
                    "must start with http:// or https://",
                ));
            }
            config.routing.base_url = v.to_string();
        }
        if let Some(v) = section.get("profile") {
            let v = v.trim();
            if v.is_empty() || v.contains('/') {
                return Err(invalid(
                    "routing",
                    "profile",
                    v,
                    "expected a profile name like 'driving'",
                ));
            }
            config.routing.profile = v.to_string();
        }
        if let Some(secs) =
            parse_value::<u64>(section, "routing", "timeout", "expected seconds as a whole number")?
        {
            if secs == 0 {
                return Err(invalid("routing", "timeout", "0", "must be at least 1 second"));
            }
            config.routing.timeout = Duration::from_secs(secs);
        }
    }

    // [geolocation] section
    if let Some(section) = ini.section(Some("geolocation")) {
        if let Some(v) = section.get("high_accuracy") {
            config.geolocation.high_accuracy = parse_bool(v).ok_or_else(|| {
                invalid("geolocation", "high_accuracy", v, "expected true or false")
            })?;
        }
        if let Some(ms) = parse_millis(section, "maximum_age_ms")? {
            config.geolocation.maximum_age = ms;
        }
        if let Some(ms) = parse_millis(section, "timeout_ms")? {
            if ms.is_zero() {
                return Err(invalid(
                    "geolocation",
                    "timeout_ms",
                    "0",
                    "must be greater than zero",
                ));
            }
            config.geolocation.timeout = ms;
        }
        if let Some(ms) = parse_millis(section, "retry_delay_ms")? {
            config.geolocation.retry_delay = ms;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = Some(expand_tilde(v));
            }
        }
    }

    Ok(config)
}

fn parse_value<T: FromStr>(
    section: &Properties,
    section_name: &str,
    key: &str,
    reason: &str,
) -> Result<Option<T>, ConfigFileError> {
    section
        .get(key)
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| invalid(section_name, key, v, reason))
        })
        .transpose()
}

fn parse_millis(section: &Properties, key: &str) -> Result<Option<Duration>, ConfigFileError> {
    Ok(parse_value::<u64>(
        section,
        "geolocation",
        key,
        "expected milliseconds as a whole number",
    )?
    .map(Duration::from_millis))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
