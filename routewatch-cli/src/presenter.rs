//! Text rendering of sync snapshots.
//!
//! Prints `Loading...` until the first distance is known, then
//! `Distance to <name>: <km> km` whenever the shown value changes, plus
//! location status changes and route errors.

use std::fmt;

use console::style;
use routewatch::sync::{SyncError, SyncSnapshot, SyncStatus};

/// One line of presenter output.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Loading,
    Distance(String),
    LocationError(String),
    LocationRestored,
    RouteError(String),
}

impl Notice {
    /// Styled form for the terminal.
    pub fn styled(&self) -> String {
        match self {
            Notice::Loading => style(self).dim().to_string(),
            Notice::Distance(_) => style(self).bold().to_string(),
            Notice::LocationError(_) => style(self).red().to_string(),
            Notice::LocationRestored => style(self).green().to_string(),
            Notice::RouteError(_) => style(self).yellow().to_string(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Loading => write!(f, "Loading..."),
            Notice::Distance(text) => write!(f, "{}", text),
            Notice::LocationError(reason) => write!(f, "Location error: {}", reason),
            Notice::LocationRestored => write!(f, "Location restored"),
            Notice::RouteError(reason) => write!(f, "Route update failed: {}", reason),
        }
    }
}

/// `Distance to <name>: <km with 2 decimals> km`, once a route is known.
pub fn distance_text(snapshot: &SyncSnapshot) -> Option<String> {
    snapshot.distance_km.map(|km| {
        format!(
            "Distance to {}: {:.2} km",
            snapshot.destination.name(),
            km
        )
    })
}

/// Turns successive snapshots into the lines worth printing.
#[derive(Debug, Default)]
pub struct TextPresenter {
    last_status: Option<SyncStatus>,
    last_distance: Option<String>,
    loading_shown: bool,
}

impl TextPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines to print for `snapshot`, given what was printed before.
    pub fn update(&mut self, snapshot: &SyncSnapshot) -> Vec<Notice> {
        let mut notices = Vec::new();

        if self.last_status.as_ref() != Some(&snapshot.status) {
            match &snapshot.status {
                SyncStatus::Error(reason) => {
                    notices.push(Notice::LocationError(reason.to_string()));
                }
                SyncStatus::Tracking if matches!(self.last_status, Some(SyncStatus::Error(_))) => {
                    notices.push(Notice::LocationRestored);
                }
                _ => {}
            }
            self.last_status = Some(snapshot.status.clone());
        }

        match distance_text(snapshot) {
            Some(text) if self.last_distance.as_ref() != Some(&text) => {
                self.last_distance = Some(text.clone());
                notices.push(Notice::Distance(text));
            }
            Some(_) => {}
            None if !self.loading_shown => {
                self.loading_shown = true;
                notices.push(Notice::Loading);
            }
            None => {}
        }

        notices
    }

    pub fn error(&self, error: &SyncError) -> Option<Notice> {
        match error {
            // Shown through the status change instead.
            SyncError::Position(_) => None,
            SyncError::Route { error, .. } => Some(Notice::RouteError(error.to_string())),
        }
    }
}
