//! Actor that keeps the published route in step with the live position.
//!
//! ```text
//!  GeoWatcher ──GeoEvent──► event queue ──► SyncActor ──► watch<SyncSnapshot>
//!                                             │   ▲
//!                                  spawn fetch│   │(sequence, result)
//!                                             ▼   │
//!                                          JoinSet<RouteClient>
//!                                             │
//!                                             └──────► broadcast<SyncError>
//! ```
//!
//! The actor is the only owner of [`SyncCore`]. Fetches run concurrently in a
//! `JoinSet` and never block position handling; their completions come back
//! through the same `select!` loop, so every mutation is serialized.
//!
//! # Example
//!
//! ```ignore
//! use routewatch::sync::{SyncController, SyncControllerConfig};
//!
//! let controller = SyncController::start(config, provider, options, client);
//! let mut snapshots = controller.subscribe();
//! while snapshots.changed().await.is_ok() {
//!     render(&snapshots.borrow_and_update());
//! }
//! controller.shutdown().await;
//! ```

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::machine::{RouteOutcome, RouteRequest, SyncCore};
use super::state::SyncSnapshot;
use crate::coord::{default_destination, Destination};
use crate::geo::{GeoError, GeoEvent, GeoWatcher, LocationProvider, WatchHandle, WatchOptions};
use crate::route::{RouteClient, RouteError, RouteResult};

// =============================================================================
// Configuration
// =============================================================================

/// Default number of errors buffered per error subscriber.
pub const DEFAULT_ERROR_CHANNEL_CAPACITY: usize = 64;

/// Configuration for the sync controller.
#[derive(Debug, Clone)]
pub struct SyncControllerConfig {
    /// Fixed route target for the lifetime of the controller.
    pub destination: Destination,

    /// Errors buffered per subscriber before the slowest one lags.
    pub error_channel_capacity: usize,
}

impl Default for SyncControllerConfig {
    fn default() -> Self {
        Self {
            destination: default_destination(),
            error_channel_capacity: DEFAULT_ERROR_CHANNEL_CAPACITY,
        }
    }
}

impl SyncControllerConfig {
    pub fn new(destination: Destination) -> Self {
        Self {
            destination,
            ..Self::default()
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Failures reported to presenters alongside the snapshot stream.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// The location service reported a failure.
    #[error("{0}")]
    Position(GeoError),

    /// The newest route fetch failed; the previous route is still shown.
    #[error("Route request #{sequence} failed: {error}")]
    Route { sequence: u64, error: RouteError },
}

// =============================================================================
// Controller handle
// =============================================================================

/// Handle to a running synchronization loop.
///
/// Dropping the handle cancels the loop without waiting for it; call
/// [`shutdown`](Self::shutdown) to stop it deterministically.
pub struct SyncController {
    snapshot_rx: watch::Receiver<SyncSnapshot>,
    error_tx: broadcast::Sender<SyncError>,
    shutdown: CancellationToken,
    watch: Option<WatchHandle>,
    actor: Option<JoinHandle<()>>,
}

impl SyncController {
    /// Starts watching `provider` and routing each position to the destination.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<P, R>(
        config: SyncControllerConfig,
        provider: P,
        options: WatchOptions,
        route_client: R,
    ) -> Self
    where
        P: LocationProvider,
        R: RouteClient,
    {
        let core = SyncCore::new(config.destination);
        let (snapshot_tx, snapshot_rx) = watch::channel(core.snapshot());
        let (error_tx, _) = broadcast::channel(config.error_channel_capacity.max(1));
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        info!(
            destination = %core.destination(),
            provider = provider.name(),
            route_client = route_client.name(),
            "Starting sync controller"
        );

        let actor = SyncActor {
            core,
            client: Arc::new(route_client),
            fetches: JoinSet::new(),
            event_rx,
            snapshot_tx,
            error_tx: error_tx.clone(),
        };
        let actor = tokio::spawn(actor.run(shutdown.clone()));

        // The queue is unbounded so the watcher callback never drops a fix.
        let watch = GeoWatcher::start(provider, options, move |event| {
            let _ = event_tx.send(event);
        });

        Self {
            snapshot_rx,
            error_tx,
            shutdown,
            watch: Some(watch),
            actor: Some(actor),
        }
    }

    /// Receiver that observes every published snapshot.
    ///
    /// Once the loop ends, `changed()` returns an error and the receiver
    /// keeps the final snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Receiver for errors raised after this call.
    pub fn subscribe_errors(&self) -> broadcast::Receiver<SyncError> {
        self.error_tx.subscribe()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SyncSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// True once the loop has ended, either through shutdown or because the
    /// position feed ended and every pending fetch completed.
    pub fn is_finished(&self) -> bool {
        self.actor.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stops the loop.
    ///
    /// The state is frozen as of this call: in-flight fetches are aborted
    /// and their results discarded. Returns after the watcher and actor
    /// tasks have exited.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(actor) = self.actor.take() {
            if let Err(e) = actor.await {
                warn!(error = %e, "Sync actor ended abnormally");
            }
        }
        if let Some(watch) = self.watch.take() {
            watch.stop().await;
        }
        info!("Sync controller stopped");
    }
}

impl Drop for SyncController {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

// =============================================================================
// Actor
// =============================================================================

type FetchOutput = (u64, Result<RouteResult, RouteError>);

struct SyncActor<R: RouteClient> {
    core: SyncCore,
    client: Arc<R>,
    fetches: JoinSet<FetchOutput>,
    event_rx: mpsc::UnboundedReceiver<GeoEvent>,
    snapshot_tx: watch::Sender<SyncSnapshot>,
    error_tx: broadcast::Sender<SyncError>,
}

impl<R: RouteClient> SyncActor<R> {
    async fn run(mut self, shutdown: CancellationToken) {
        let mut feed_open = true;

        loop {
            if !feed_open && self.fetches.is_empty() {
                info!("Position feed ended and no fetches pending");
                break;
            }

            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    debug!(pending = self.fetches.len(), "Sync actor cancelled");
                    break;
                }

                Some(joined) = self.fetches.join_next(), if !self.fetches.is_empty() => {
                    // Completion and cancellation can become ready together.
                    if shutdown.is_cancelled() {
                        break;
                    }
                    self.handle_fetch(joined);
                }

                event = self.event_rx.recv(), if feed_open => match event {
                    Some(event) => self.handle_geo_event(event),
                    None => feed_open = false,
                },
            }
        }

        self.core.stop();
        self.fetches.abort_all();
    }

    fn handle_geo_event(&mut self, event: GeoEvent) {
        match event {
            GeoEvent::Fix(fix) => {
                debug!(
                    position = %fix.coordinate,
                    accuracy_m = ?fix.accuracy_m,
                    "Position update"
                );
                if let Some(request) = self.core.on_position(fix.coordinate) {
                    self.publish();
                    self.spawn_fetch(request);
                }
            }
            GeoEvent::Error(error) => {
                if self.core.on_position_error(error.clone()) {
                    self.publish();
                }
                self.report(SyncError::Position(error));
            }
        }
    }

    fn spawn_fetch(&mut self, request: RouteRequest) {
        let client = Arc::clone(&self.client);
        debug!(
            sequence = request.sequence,
            origin = %request.origin,
            in_flight = self.fetches.len(),
            "Requesting route"
        );
        self.fetches.spawn(async move {
            let result = client
                .fetch_route(request.origin, request.destination)
                .await;
            (request.sequence, result)
        });
    }

    fn handle_fetch(&mut self, joined: Result<FetchOutput, JoinError>) {
        let (sequence, result) = match joined {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, "Route fetch task failed");
                return;
            }
        };

        match self.core.on_route_response(sequence, result) {
            RouteOutcome::Applied => self.publish(),
            RouteOutcome::Failed(error) => {
                warn!(sequence, error = %error, "Route fetch failed, keeping previous route");
                self.report(SyncError::Route { sequence, error });
            }
            RouteOutcome::Superseded | RouteOutcome::Ignored => {}
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.core.snapshot());
    }

    fn report(&self, error: SyncError) {
        // No subscribers is fine.
        let _ = self.error_tx.send(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinate;
    use crate::geo::{ChannelLocationProvider, Fix};
    use crate::sync::SyncStatus;
    use std::time::Duration;

    /// Route client answering immediately with a fixed distance.
    struct FixedRouteClient {
        distance_meters: f64,
    }

    impl RouteClient for FixedRouteClient {
        async fn fetch_route(
            &self,
            origin: Coordinate,
            destination: Coordinate,
        ) -> Result<RouteResult, RouteError> {
            RouteResult::new(vec![origin, destination], self.distance_meters, 60.0)
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    async fn wait_for(
        rx: &mut watch::Receiver<SyncSnapshot>,
        predicate: impl FnMut(&SyncSnapshot) -> bool,
    ) -> SyncSnapshot {
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
            .await
            .expect("timed out waiting for snapshot")
            .expect("controller stopped")
            .clone()
    }

    #[tokio::test]
    async fn test_initial_snapshot() {
        let (provider, _sender) = ChannelLocationProvider::new();
        let controller = SyncController::start(
            SyncControllerConfig::default(),
            provider,
            WatchOptions::default(),
            FixedRouteClient {
                distance_meters: 1000.0,
            },
        );

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.status, SyncStatus::Initializing);
        assert_eq!(snapshot.revision, 0);
        assert!(!controller.is_finished());

        controller.shutdown().await;
    }

    #[tokio::test]
    async fn test_fix_publishes_route() {
        let (provider, sender) = ChannelLocationProvider::new();
        let controller = SyncController::start(
            SyncControllerConfig::default(),
            provider,
            WatchOptions::default(),
            FixedRouteClient {
                distance_meters: 3500.0,
            },
        );
        let mut rx = controller.subscribe();

        sender.send_fix(Fix::new(Coordinate::new(49.10, -122.80).unwrap()));
        let snapshot = wait_for(&mut rx, |s| s.route.is_some()).await;

        assert_eq!(snapshot.status, SyncStatus::Tracking);
        assert_eq!(snapshot.distance_km, Some(3.5));
        controller.shutdown().await;
    }

    #[tokio::test]
    async fn test_geo_error_is_reported() {
        let (provider, sender) = ChannelLocationProvider::new();
        let controller = SyncController::start(
            SyncControllerConfig::default(),
            provider,
            WatchOptions::default().with_retry_delay(Duration::ZERO),
            FixedRouteClient {
                distance_meters: 1000.0,
            },
        );
        let mut errors = controller.subscribe_errors();
        let mut rx = controller.subscribe();

        sender.send_error(GeoError::PermissionDenied);

        let error = tokio::time::timeout(Duration::from_secs(5), errors.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(error, SyncError::Position(GeoError::PermissionDenied));
        let snapshot = wait_for(&mut rx, |s| s.status.is_error()).await;
        assert_eq!(snapshot.user_position, None);

        controller.shutdown().await;
    }

    #[tokio::test]
    async fn test_loop_ends_with_feed() {
        let (provider, sender) = ChannelLocationProvider::new();
        let controller = SyncController::start(
            SyncControllerConfig::default(),
            provider,
            WatchOptions::default(),
            FixedRouteClient {
                distance_meters: 2000.0,
            },
        );
        let mut rx = controller.subscribe();

        sender.send_fix(Fix::new(Coordinate::new(49.10, -122.80).unwrap()));
        drop(sender);

        // The pending fetch still lands before the loop ends.
        while rx.changed().await.is_ok() {}
        assert_eq!(rx.borrow().distance_km, Some(2.0));
        assert!(controller.snapshot().route.is_some());

        controller.shutdown().await;
    }

    #[test]
    fn test_sync_error_display() {
        let error = SyncError::Route {
            sequence: 3,
            error: RouteError::EmptyRoute,
        };
        assert_eq!(
            error.to_string(),
            "Route request #3 failed: Routing provider returned no route"
        );
        assert_eq!(
            SyncError::Position(GeoError::PermissionDenied).to_string(),
            "Location permission denied"
        );
    }
}
