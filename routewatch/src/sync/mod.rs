//! Live position to route synchronization.
//!
//! [`SyncController`] subscribes to a position feed, requests a route to the
//! configured destination for every new position and publishes the latest
//! [`SyncSnapshot`]. Stale route responses are discarded by sequence number.
//! The state machine itself lives in [`SyncCore`] and has no I/O.

mod controller;
mod machine;
mod state;

pub use controller::{
    SyncController, SyncControllerConfig, SyncError, DEFAULT_ERROR_CHANNEL_CAPACITY,
};
pub use machine::{RouteOutcome, RouteRequest, SyncCore};
pub use state::{SyncSnapshot, SyncState, SyncStatus};
