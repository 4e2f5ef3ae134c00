//! Synchronous state machine behind the controller.
//!
//! [`SyncCore`] holds the state and the request sequence counters. It has no
//! I/O; the controller actor feeds it events and acts on what it returns.
//!
//! Route responses may complete in any order. A response is applied only if
//! its sequence number is higher than every response already seen, so an
//! older request finishing late can never overwrite a newer route.

use tracing::{debug, info, warn};

use super::state::{SyncSnapshot, SyncState, SyncStatus};
use crate::coord::{Coordinate, Destination};
use crate::geo::GeoError;
use crate::route::{RouteError, RouteResult};

/// A route fetch the caller must start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
    pub sequence: u64,
    pub origin: Coordinate,
    pub destination: Coordinate,
}

/// What happened to a completed route fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// The route replaced the published one.
    Applied,
    /// The newest fetch so far failed; state is unchanged.
    Failed(RouteError),
    /// A newer response was already seen; the result was dropped.
    Superseded,
    /// The core is stopped or the sequence was never issued.
    Ignored,
}

/// State machine for position updates and route responses.
#[derive(Debug)]
pub struct SyncCore {
    destination: Destination,
    state: SyncState,
    /// Sequence number of the last issued request.
    issued: u64,
    /// Highest sequence number of any completed response.
    latest_seen: u64,
    revision: u64,
    stopped: bool,
}

impl SyncCore {
    pub fn new(destination: Destination) -> Self {
        Self {
            destination,
            state: SyncState::default(),
            issued: 0,
            latest_seen: 0,
            revision: 0,
            stopped: false,
        }
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Number of state changes so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot::from_state(&self.destination, &self.state, self.revision)
    }

    /// Records a new position and returns the route fetch to start.
    ///
    /// Returns `None` once stopped.
    pub fn on_position(&mut self, position: Coordinate) -> Option<RouteRequest> {
        if self.stopped {
            return None;
        }

        self.state.user_position = Some(position);
        if self.state.status != SyncStatus::Tracking {
            info!(previous = %self.state.status, "Position acquired, tracking");
            self.state.status = SyncStatus::Tracking;
        }
        self.revision += 1;
        self.issued += 1;

        Some(RouteRequest {
            sequence: self.issued,
            origin: position,
            destination: self.destination.coordinate(),
        })
    }

    /// Moves to the error state, keeping the last position and route.
    ///
    /// Returns true if the state changed.
    pub fn on_position_error(&mut self, error: GeoError) -> bool {
        if self.stopped {
            return false;
        }

        let status = SyncStatus::Error(error);
        if self.state.status == status {
            return false;
        }

        warn!(status = %status, "Location service error");
        self.state.status = status;
        self.revision += 1;
        true
    }

    /// Applies or discards a completed route fetch.
    pub fn on_route_response(
        &mut self,
        sequence: u64,
        result: Result<RouteResult, RouteError>,
    ) -> RouteOutcome {
        if self.stopped {
            return RouteOutcome::Ignored;
        }
        if sequence == 0 || sequence > self.issued {
            warn!(sequence, issued = self.issued, "Response for unknown request");
            return RouteOutcome::Ignored;
        }
        if sequence <= self.latest_seen {
            debug!(
                sequence,
                latest_seen = self.latest_seen,
                "Discarding superseded route response"
            );
            return RouteOutcome::Superseded;
        }

        self.latest_seen = sequence;
        match result {
            Ok(route) => {
                debug!(
                    sequence,
                    distance_m = route.distance_meters(),
                    points = route.geometry().len(),
                    "Applying route"
                );
                self.state.route = Some(route);
                self.revision += 1;
                RouteOutcome::Applied
            }
            Err(error) => RouteOutcome::Failed(error),
        }
    }

    /// Freezes the state. Later events are ignored.
    pub fn stop(&mut self) {
        self.stopped = true;
    }
}
