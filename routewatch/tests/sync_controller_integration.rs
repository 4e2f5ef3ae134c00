//! Integration tests for the sync controller.
//!
//! Route fetches go through a gated client: every request is handed to the
//! test, which decides when and in which order to answer. This makes
//! out-of-order completion and shutdown during a fetch deterministic.
//!
//! Run with: `cargo test --test sync_controller_integration`

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use routewatch::coord::{default_destination, Coordinate};
use routewatch::geo::{
    ChannelLocationProvider, Fix, FixSender, GeoError, LineLocationProvider, WatchOptions,
};
use routewatch::route::{
    AsyncHttpClient, HttpError, HttpResponse, OsrmRouteClient, RouteClient, RouteError,
    RouteResult,
};
use routewatch::sync::{SyncController, SyncControllerConfig, SyncError, SyncSnapshot, SyncStatus};

const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// Test doubles
// ============================================================================

/// A route request waiting for the test to answer it.
struct PendingRoute {
    origin: Coordinate,
    destination: Coordinate,
    reply: oneshot::Sender<Result<RouteResult, RouteError>>,
}

impl PendingRoute {
    /// Answers with a straight two-point route of the given length.
    fn respond(self, distance_meters: f64) -> bool {
        let route =
            RouteResult::new(vec![self.origin, self.destination], distance_meters, 60.0).unwrap();
        self.reply.send(Ok(route)).is_ok()
    }

    fn fail(self, error: RouteError) -> bool {
        self.reply.send(Err(error)).is_ok()
    }
}

/// Route client that parks every request until the test answers it.
struct GatedRouteClient {
    requests: mpsc::UnboundedSender<PendingRoute>,
}

impl RouteClient for GatedRouteClient {
    async fn fetch_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RouteResult, RouteError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.requests.send(PendingRoute {
            origin,
            destination,
            reply,
        });
        rx.await
            .unwrap_or_else(|_| Err(RouteError::Network("gate closed".to_string())))
    }

    fn name(&self) -> &str {
        "gated"
    }
}

/// HTTP client answering every request with the same OSRM body.
struct StaticHttpClient {
    body: &'static str,
}

impl AsyncHttpClient for StaticHttpClient {
    async fn get(&self, _url: &str) -> Result<HttpResponse, HttpError> {
        Ok(HttpResponse::new(200, self.body.as_bytes()))
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    controller: SyncController,
    fixes: FixSender,
    requests: mpsc::UnboundedReceiver<PendingRoute>,
    snapshots: watch::Receiver<SyncSnapshot>,
    errors: broadcast::Receiver<SyncError>,
    clock: DateTime<Utc>,
}

impl Harness {
    fn start() -> Self {
        let (provider, fixes) = ChannelLocationProvider::new();
        let (requests_tx, requests) = mpsc::unbounded_channel();
        let options = WatchOptions::default().with_retry_delay(Duration::ZERO);

        let controller = SyncController::start(
            SyncControllerConfig::default(),
            provider,
            options,
            GatedRouteClient {
                requests: requests_tx,
            },
        );
        let snapshots = controller.subscribe();
        let errors = controller.subscribe_errors();

        Self {
            controller,
            fixes,
            requests,
            snapshots,
            errors,
            clock: Utc::now(),
        }
    }

    /// Sends a fix stamped one second after the previous one.
    fn send_fix(&mut self, position: Coordinate) {
        self.clock += chrono::Duration::seconds(1);
        assert!(self
            .fixes
            .send_fix(Fix::with_timestamp(position, self.clock)));
    }

    async fn next_request(&mut self) -> PendingRoute {
        tokio::time::timeout(WAIT, self.requests.recv())
            .await
            .expect("timed out waiting for a route request")
            .expect("route client dropped")
    }

    async fn wait_for(&mut self, predicate: impl FnMut(&SyncSnapshot) -> bool) -> SyncSnapshot {
        tokio::time::timeout(WAIT, self.snapshots.wait_for(predicate))
            .await
            .expect("timed out waiting for snapshot")
            .expect("controller stopped")
            .clone()
    }

    async fn next_error(&mut self) -> SyncError {
        tokio::time::timeout(WAIT, self.errors.recv())
            .await
            .expect("timed out waiting for an error")
            .expect("error channel closed")
    }

    /// Ends the position feed and waits for the loop to drain pending fetches.
    async fn finish(self) -> SyncSnapshot {
        let Harness {
            controller,
            fixes,
            mut snapshots,
            ..
        } = self;
        drop(fixes);

        tokio::time::timeout(WAIT, async {
            while snapshots.changed().await.is_ok() {}
        })
        .await
        .expect("controller did not finish");

        assert!(controller.is_finished());
        let last = snapshots.borrow().clone();
        controller.shutdown().await;
        last
    }
}

fn c(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon).unwrap()
}

// ============================================================================
// Integration Tests
// ============================================================================

/// First fix: position is published immediately, the route follows.
#[tokio::test]
async fn test_first_fix_publishes_position_then_route() {
    let mut harness = Harness::start();
    assert_eq!(harness.controller.snapshot().status, SyncStatus::Initializing);

    let origin = c(49.10, -122.80);
    harness.send_fix(origin);

    let request = harness.next_request().await;
    assert_eq!(request.origin, origin);
    assert_eq!(request.destination, default_destination().coordinate());

    let snapshot = harness
        .wait_for(|s| s.user_position == Some(origin))
        .await;
    assert_eq!(snapshot.status, SyncStatus::Tracking);
    assert!(snapshot.route.is_none());
    assert!(snapshot.distance_km.is_none());

    assert!(request.respond(3500.0));
    let snapshot = harness.wait_for(|s| s.route.is_some()).await;

    assert_eq!(snapshot.status, SyncStatus::Tracking);
    assert_eq!(snapshot.distance_km, Some(3.5));
    assert_eq!(snapshot.route.unwrap().geometry().len(), 2);
    assert_eq!(snapshot.destination.name(), "KPU Surrey Library");

    harness.controller.shutdown().await;
}

/// A slow fetch does not hold back newer positions.
#[tokio::test]
async fn test_pending_fetch_does_not_block_positions() {
    let mut harness = Harness::start();
    let p1 = c(49.10, -122.80);
    let p2 = c(49.11, -122.81);

    harness.send_fix(p1);
    let _first = harness.next_request().await;
    harness.send_fix(p2);
    let _second = harness.next_request().await;

    let snapshot = harness.wait_for(|s| s.user_position == Some(p2)).await;
    assert!(snapshot.route.is_none());

    harness.controller.shutdown().await;
}

/// Response for position 2 arrives before the response for position 1.
#[tokio::test]
async fn test_out_of_order_response_is_discarded() {
    let mut harness = Harness::start();
    let p1 = c(49.10, -122.80);
    let p2 = c(49.11, -122.81);

    harness.send_fix(p1);
    let first = harness.next_request().await;
    harness.send_fix(p2);
    let second = harness.next_request().await;
    assert_eq!(first.origin, p1);
    assert_eq!(second.origin, p2);

    assert!(second.respond(2000.0));
    let applied = harness.wait_for(|s| s.route.is_some()).await;
    assert_eq!(applied.distance_km, Some(2.0));

    assert!(first.respond(1000.0));
    let last = harness.finish().await;

    assert_eq!(last.distance_km, Some(2.0));
    assert_eq!(last.route.unwrap().origin(), p2);
    assert_eq!(last.user_position, Some(p2));
    assert_eq!(last.revision, applied.revision);
}

/// Responses arriving in request order are each applied.
#[tokio::test]
async fn test_in_order_responses_apply_latest() {
    let mut harness = Harness::start();
    let p1 = c(49.10, -122.80);
    let p2 = c(49.11, -122.81);

    harness.send_fix(p1);
    let first = harness.next_request().await;
    assert!(first.respond(1000.0));
    harness.wait_for(|s| s.distance_km == Some(1.0)).await;

    harness.send_fix(p2);
    let second = harness.next_request().await;
    assert!(second.respond(2000.0));
    let snapshot = harness.wait_for(|s| s.distance_km == Some(2.0)).await;
    assert_eq!(snapshot.route.unwrap().origin(), p2);

    harness.controller.shutdown().await;
}

/// Shutdown while a fetch is in flight freezes the state.
#[tokio::test]
async fn test_shutdown_discards_in_flight_fetch() {
    let mut harness = Harness::start();
    let origin = c(49.10, -122.80);

    harness.send_fix(origin);
    let request = harness.next_request().await;
    let before = harness.wait_for(|s| s.user_position == Some(origin)).await;

    let Harness {
        controller,
        snapshots,
        ..
    } = harness;
    controller.shutdown().await;

    // The fetch task was aborted, so nobody is listening for the answer.
    assert!(!request.respond(3500.0));
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(*snapshots.borrow(), before);
}

/// EmptyRoute keeps the previous route and is reported as an error.
#[tokio::test]
async fn test_empty_route_keeps_previous_route() {
    let mut harness = Harness::start();
    let p1 = c(49.10, -122.80);
    let p2 = c(49.11, -122.81);

    harness.send_fix(p1);
    assert!(harness.next_request().await.respond(1500.0));
    harness.wait_for(|s| s.route.is_some()).await;

    harness.send_fix(p2);
    assert!(harness.next_request().await.fail(RouteError::EmptyRoute));

    let error = harness.next_error().await;
    assert_eq!(
        error,
        SyncError::Route {
            sequence: 2,
            error: RouteError::EmptyRoute,
        }
    );

    let snapshot = harness.controller.snapshot();
    assert_eq!(snapshot.status, SyncStatus::Tracking);
    assert_eq!(snapshot.user_position, Some(p2));
    assert_eq!(snapshot.distance_km, Some(1.5));
    assert_eq!(snapshot.route.unwrap().origin(), p1);

    harness.controller.shutdown().await;
}

/// Network failure before any route leaves the route empty but tracking.
#[tokio::test]
async fn test_network_error_before_first_route() {
    let mut harness = Harness::start();

    harness.send_fix(c(49.10, -122.80));
    let request = harness.next_request().await;
    assert!(request.fail(RouteError::Network("connection reset".to_string())));

    let error = harness.next_error().await;
    assert!(matches!(
        error,
        SyncError::Route {
            sequence: 1,
            error: RouteError::Network(_)
        }
    ));

    let snapshot = harness.controller.snapshot();
    assert_eq!(snapshot.status, SyncStatus::Tracking);
    assert!(snapshot.route.is_none());

    harness.controller.shutdown().await;
}

/// Permission denied after a route: error status, position and route kept.
#[tokio::test]
async fn test_permission_denied_keeps_last_known_state() {
    let mut harness = Harness::start();
    let origin = c(49.10, -122.80);

    harness.send_fix(origin);
    assert!(harness.next_request().await.respond(3500.0));
    harness.wait_for(|s| s.route.is_some()).await;

    assert!(harness.fixes.send_error(GeoError::PermissionDenied));

    let snapshot = harness.wait_for(|s| s.status.is_error()).await;
    assert_eq!(snapshot.status, SyncStatus::Error(GeoError::PermissionDenied));
    assert_eq!(snapshot.user_position, Some(origin));
    assert_eq!(snapshot.distance_km, Some(3.5));

    assert_eq!(
        harness.next_error().await,
        SyncError::Position(GeoError::PermissionDenied)
    );

    // A new fix resumes tracking.
    let next = c(49.12, -122.82);
    harness.send_fix(next);
    let snapshot = harness.wait_for(|s| s.user_position == Some(next)).await;
    assert_eq!(snapshot.status, SyncStatus::Tracking);

    harness.controller.shutdown().await;
}

/// The same coordinate twice triggers two fetches; the second result wins.
#[tokio::test]
async fn test_same_position_twice() {
    let mut harness = Harness::start();
    let origin = c(49.10, -122.80);

    harness.send_fix(origin);
    let first = harness.next_request().await;
    harness.send_fix(origin);
    let second = harness.next_request().await;

    assert!(first.respond(1000.0));
    assert!(second.respond(1001.0));

    let last = harness.finish().await;
    assert_eq!(last.route.unwrap().distance_meters(), 1001.0);
    assert_eq!(last.user_position, Some(origin));
}

/// Line feed through the OSRM client, end to end.
#[tokio::test]
async fn test_line_feed_with_osrm_client() {
    let feed: &'static [u8] = b"# recorded track\n49.10,-122.80\n\n49.11,-122.81,5.0\n";
    let provider = LineLocationProvider::new(tokio::io::BufReader::new(feed));
    let client = OsrmRouteClient::new(StaticHttpClient {
        body: r#"{"code":"Ok","routes":[{"distance":4210.5,"duration":420.0,
            "geometry":{"type":"LineString","coordinates":[[-122.81,49.11],[-122.84,49.12],[-122.87139,49.13204]]}}]}"#,
    });

    let controller = SyncController::start(
        SyncControllerConfig::default(),
        provider,
        WatchOptions::default(),
        client,
    );
    let mut snapshots = controller.subscribe();

    tokio::time::timeout(WAIT, async {
        while snapshots.changed().await.is_ok() {}
    })
    .await
    .expect("controller did not finish");

    let last = snapshots.borrow().clone();
    assert_eq!(last.user_position, Some(c(49.11, -122.81)));
    assert_eq!(last.status, SyncStatus::Tracking);
    let route = last.route.unwrap();
    assert_eq!(route.geometry().len(), 3);
    assert_eq!(route.origin(), c(49.11, -122.81));
    assert!((last.distance_km.unwrap() - 4.2105).abs() < 1e-9);

    controller.shutdown().await;
}
