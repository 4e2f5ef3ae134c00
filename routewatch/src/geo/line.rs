//! Line-oriented location feed.
//!
//! Reads one position per line from any async reader:
//!
//! ```text
//! # lat,lon[,accuracy_m]
//! 49.10,-122.80
//! 49.1012,-122.8031,8.5
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. Each reading is
//! stamped when it is read, and stamps are strictly increasing so no line
//! is mistaken for a cached repeat. Recorded feeds have fixed precision, so the
//! `high_accuracy` option has no effect here.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::Instant;

use super::types::{Fix, GeoError, WatchOptions};
use super::watcher::LocationProvider;
use crate::coord::Coordinate;

/// Location provider reading `lat,lon[,accuracy]` lines.
pub struct LineLocationProvider<R> {
    lines: Lines<R>,
    line_number: u64,
    pacing: Option<Duration>,
    next_due: Option<Instant>,
    last_stamp: Option<DateTime<Utc>>,
    name: String,
}

impl LineLocationProvider<BufReader<Stdin>> {
    /// Reads positions from standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin())).with_name("stdin")
    }
}

impl LineLocationProvider<BufReader<File>> {
    /// Reads positions from a file.
    pub async fn open(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path).await?;
        Ok(Self::new(BufReader::new(file)).with_name(path.display().to_string()))
    }
}

impl<R> LineLocationProvider<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
            pacing: None,
            next_due: None,
            last_stamp: None,
            name: "lines".to_string(),
        }
    }

    /// Spaces readings at least `interval` apart, for replaying recorded tracks.
    pub fn with_pacing(mut self, interval: Duration) -> Self {
        self.pacing = Some(interval).filter(|d| !d.is_zero());
        self
    }

    fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<R> LocationProvider for LineLocationProvider<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn next_fix(&mut self, _options: &WatchOptions) -> Result<Option<Fix>, GeoError> {
        // Already elapsed when driven by the watcher, which waits on `ready_at`.
        if let Some(due) = self.next_due {
            tokio::time::sleep_until(due).await;
        }

        loop {
            let line = self
                .lines
                .next_line()
                .await
                .map_err(|e| GeoError::PositionUnavailable(e.to_string()))?;

            let Some(line) = line else {
                return Ok(None);
            };
            self.line_number += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            self.next_due = self.pacing.map(|interval| Instant::now() + interval);

            let mut fix = parse_fix_line(trimmed).map_err(|reason| {
                GeoError::PositionUnavailable(format!("line {}: {}", self.line_number, reason))
            })?;
            if let Some(last) = self.last_stamp {
                if fix.timestamp <= last {
                    fix.timestamp = last + chrono::Duration::microseconds(1);
                }
            }
            self.last_stamp = Some(fix.timestamp);

            return Ok(Some(fix));
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn ready_at(&self) -> Option<Instant> {
        self.next_due
    }
}

/// Parses `lat,lon[,accuracy_m]`.
fn parse_fix_line(line: &str) -> Result<Fix, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();

    let (lat, lon, accuracy) = match fields.as_slice() {
        [lat, lon] => (*lat, *lon, None),
        [lat, lon, accuracy] => (*lat, *lon, Some(*accuracy)),
        _ => return Err(format!("expected 'lat,lon[,accuracy]', got '{}'", line)),
    };

    let lat: f64 = lat
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat))?;
    let lon: f64 = lon
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lon))?;
    let coordinate = Coordinate::new(lat, lon).map_err(|e| e.to_string())?;

    let fix = Fix::new(coordinate);
    match accuracy {
        Some(a) => {
            let a: f64 = a
                .parse()
                .ok()
                .filter(|a: &f64| a.is_finite() && *a >= 0.0)
                .ok_or_else(|| format!("invalid accuracy '{}'", a))?;
            Ok(fix.with_accuracy(a))
        }
        None => Ok(fix),
    }
}
