//! Core types for position sampling.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::coord::Coordinate;

/// Default bound on a single fix attempt.
pub const DEFAULT_FIX_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default pause after a platform error before sampling again.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Errors reported by the platform location service.
///
/// None of these end a watch; the watcher keeps sampling until stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeoError {
    /// The user or OS refused access to location.
    #[error("Location permission denied")]
    PermissionDenied,

    /// The platform could not determine a position.
    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),

    /// No fix arrived within the configured timeout.
    #[error("Timed out after {}ms waiting for a position fix", .0.as_millis())]
    Timeout(Duration),
}

/// Sampling options passed to the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchOptions {
    /// Request high-precision sampling (GPS rather than network location).
    pub high_accuracy: bool,

    /// Maximum age of a cached reading that may be delivered.
    ///
    /// Zero means only fresh fixes are ever delivered.
    pub maximum_age: Duration,

    /// Upper bound on how long a single fix attempt may take.
    pub timeout: Duration,

    /// Pause after a platform error before the next attempt.
    pub retry_delay: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age: Duration::ZERO,
            timeout: DEFAULT_FIX_TIMEOUT,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl WatchOptions {
    pub fn with_high_accuracy(mut self, high_accuracy: bool) -> Self {
        self.high_accuracy = high_accuracy;
        self
    }

    pub fn with_maximum_age(mut self, maximum_age: Duration) -> Self {
        self.maximum_age = maximum_age;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }
}

/// A single reported device position.
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    /// Reported position.
    pub coordinate: Coordinate,
    /// Horizontal accuracy radius in meters, when the platform reports one.
    pub accuracy_m: Option<f64>,
    /// When the platform measured this position.
    pub timestamp: DateTime<Utc>,
}

impl Fix {
    /// Creates a fix measured now.
    pub fn new(coordinate: Coordinate) -> Self {
        Self::with_timestamp(coordinate, Utc::now())
    }

    /// Creates a fix with an explicit measurement time.
    pub fn with_timestamp(coordinate: Coordinate, timestamp: DateTime<Utc>) -> Self {
        Self {
            coordinate,
            accuracy_m: None,
            timestamp,
        }
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }

    /// Age of this reading at `now`. Readings stamped in the future have zero age.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.timestamp)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// Event delivered by a running watch.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoEvent {
    Fix(Fix),
    Error(GeoError),
}
