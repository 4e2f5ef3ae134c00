//! Continuous position watch.
//!
//! [`GeoWatcher::start`] spawns one task per watch that samples a
//! [`LocationProvider`] and hands every fix or error to a callback. The
//! returned [`WatchHandle`] owns the subscription:
//!
//! - `stop().await` cancels the task and waits for it, so the callback is never
//!   invoked after `stop` returns
//! - dropping the handle cancels the task as well

use std::future::Future;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::types::{Fix, GeoError, GeoEvent, WatchOptions};

/// Platform location service.
///
/// Implementations produce one reading per call. `Ok(None)` signals that the
/// underlying feed has ended and no further readings will arrive.
///
/// Implementations must be cancel safe: the watcher drops an in-progress call
/// when the fix timeout elapses or the watch is stopped.
pub trait LocationProvider: Send + 'static {
    /// Waits for the next reading.
    fn next_fix(
        &mut self,
        options: &WatchOptions,
    ) -> impl Future<Output = Result<Option<Fix>, GeoError>> + Send;

    /// Returns the provider's name for logging.
    fn name(&self) -> &str;

    /// Earliest instant the next reading may be requested.
    ///
    /// The watcher waits for it before the fix timeout starts.
    fn ready_at(&self) -> Option<Instant> {
        None
    }
}

/// Starts position watches.
pub struct GeoWatcher;

impl GeoWatcher {
    /// Starts watching `provider` and delivers events to `on_event`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<P, F>(provider: P, options: WatchOptions, on_event: F) -> WatchHandle
    where
        P: LocationProvider,
        F: FnMut(GeoEvent) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_watch(provider, options, on_event, cancel.clone()));

        WatchHandle {
            cancel,
            task: Some(task),
        }
    }
}

/// Handle to a running watch.
#[derive(Debug)]
pub struct WatchHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl WatchHandle {
    /// Stops the watch and waits for the sampling task to exit.
    ///
    /// No callback runs after this returns.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if e.is_panic() {
                    warn!(error = %e, "Geolocation watch task panicked");
                }
            }
        }
    }

    /// Returns true while the sampling task is alive.
    ///
    /// A watch ends on its own when the provider's feed is exhausted.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Decides whether a reading is fresh enough to deliver.
#[derive(Debug)]
struct FreshnessFilter {
    maximum_age: std::time::Duration,
    last_delivered: Option<DateTime<Utc>>,
}

impl FreshnessFilter {
    fn new(maximum_age: std::time::Duration) -> Self {
        Self {
            maximum_age,
            last_delivered: None,
        }
    }

    /// A reading newer than the last delivered one is always accepted. Anything
    /// else is a cached repeat, accepted only within a non-zero maximum age.
    fn accept(&mut self, fix: &Fix, now: DateTime<Utc>) -> bool {
        let fresh = self.last_delivered.map_or(true, |last| fix.timestamp > last);
        let accepted =
            fresh || (!self.maximum_age.is_zero() && fix.age(now) <= self.maximum_age);

        if accepted {
            self.last_delivered = Some(match self.last_delivered {
                Some(last) => last.max(fix.timestamp),
                None => fix.timestamp,
            });
        }
        accepted
    }
}

async fn run_watch<P, F>(
    mut provider: P,
    options: WatchOptions,
    mut on_event: F,
    cancel: CancellationToken,
) where
    P: LocationProvider,
    F: FnMut(GeoEvent) + Send + 'static,
{
    info!(
        provider = provider.name(),
        high_accuracy = options.high_accuracy,
        maximum_age_ms = options.maximum_age.as_millis() as u64,
        timeout_ms = options.timeout.as_millis() as u64,
        "Geolocation watch started"
    );

    let mut freshness = FreshnessFilter::new(options.maximum_age);

    loop {
        if let Some(due) = provider.ready_at() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep_until(due) => {}
            }
        }

        let attempt = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            attempt = tokio::time::timeout(options.timeout, provider.next_fix(&options)) => attempt,
        };

        if cancel.is_cancelled() {
            break;
        }

        match attempt {
            Ok(Ok(Some(fix))) => {
                if freshness.accept(&fix, Utc::now()) {
                    trace!(position = %fix.coordinate, "Position fix");
                    on_event(GeoEvent::Fix(fix));
                } else {
                    debug!(
                        position = %fix.coordinate,
                        timestamp = %fix.timestamp,
                        "Dropping cached fix older than maximum age"
                    );
                }
            }
            Ok(Ok(None)) => {
                info!(provider = provider.name(), "Location feed ended");
                break;
            }
            Ok(Err(error)) => {
                warn!(error = %error, "Geolocation error");
                on_event(GeoEvent::Error(error));

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(options.retry_delay) => {}
                }
            }
            Err(_) => {
                debug!(
                    timeout_ms = options.timeout.as_millis() as u64,
                    "Position fix attempt timed out"
                );
                on_event(GeoEvent::Error(GeoError::Timeout(options.timeout)));
            }
        }
    }

    info!("Geolocation watch stopped");
}
