//! Push-based location feed.
//!
//! Platforms that report positions through callbacks push readings into a
//! [`FixSender`]; the paired [`ChannelLocationProvider`] hands them to the
//! watcher. Dropping every sender ends the feed.

use tokio::sync::mpsc;

use super::types::{Fix, GeoError, WatchOptions};
use super::watcher::LocationProvider;

/// Sending half of a push-based feed.
#[derive(Debug, Clone)]
pub struct FixSender {
    tx: mpsc::UnboundedSender<Result<Fix, GeoError>>,
}

impl FixSender {
    /// Reports a new reading. Returns false once the watch has gone away.
    pub fn send_fix(&self, fix: Fix) -> bool {
        self.tx.send(Ok(fix)).is_ok()
    }

    /// Reports a platform error. Returns false once the watch has gone away.
    pub fn send_error(&self, error: GeoError) -> bool {
        self.tx.send(Err(error)).is_ok()
    }
}

/// Location provider fed by a [`FixSender`].
#[derive(Debug)]
pub struct ChannelLocationProvider {
    rx: mpsc::UnboundedReceiver<Result<Fix, GeoError>>,
}

impl ChannelLocationProvider {
    pub fn new() -> (Self, FixSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, FixSender { tx })
    }
}

impl LocationProvider for ChannelLocationProvider {
    async fn next_fix(&mut self, _options: &WatchOptions) -> Result<Option<Fix>, GeoError> {
        match self.rx.recv().await {
            Some(Ok(fix)) => Ok(Some(fix)),
            Some(Err(error)) => Err(error),
            None => Ok(None),
        }
    }

    fn name(&self) -> &str {
        "channel"
    }
}
