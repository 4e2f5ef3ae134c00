//! Published synchronization state.

use std::fmt;

use crate::coord::{Coordinate, Destination};
use crate::geo::GeoError;
use crate::route::RouteResult;

/// Lifecycle of the synchronization loop.
///
/// `Initializing` until the first position arrives, `Tracking` while
/// positions flow, `Error` after the location service reports a failure.
/// The next successful fix returns to `Tracking`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SyncStatus {
    #[default]
    Initializing,
    Tracking,
    Error(GeoError),
}

impl SyncStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, SyncStatus::Error(_))
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Initializing => write!(f, "initializing"),
            SyncStatus::Tracking => write!(f, "tracking"),
            SyncStatus::Error(reason) => write!(f, "error: {}", reason),
        }
    }
}

/// Mutable state owned by the controller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncState {
    /// Most recent position reported by the watcher.
    pub user_position: Option<Coordinate>,
    /// Route from the most recently applied response.
    pub route: Option<RouteResult>,
    pub status: SyncStatus,
}

/// Immutable copy of the state handed to presenters.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSnapshot {
    pub destination: Destination,
    pub user_position: Option<Coordinate>,
    pub route: Option<RouteResult>,
    /// Route distance in kilometers, present whenever `route` is.
    pub distance_km: Option<f64>,
    pub status: SyncStatus,
    /// Incremented on every state change; the initial snapshot is 0.
    pub revision: u64,
}

impl SyncSnapshot {
    pub(crate) fn from_state(destination: &Destination, state: &SyncState, revision: u64) -> Self {
        Self {
            destination: destination.clone(),
            user_position: state.user_position,
            route: state.route.clone(),
            distance_km: state.route.as_ref().map(RouteResult::distance_km),
            status: state.status.clone(),
            revision,
        }
    }
}
