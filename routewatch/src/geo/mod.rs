//! Geolocation watch
//!
//! Wraps a platform location service behind [`LocationProvider`] and turns it
//! into a stream of [`GeoEvent`]s via [`GeoWatcher`]. Sampling honours
//! [`WatchOptions`]: high-accuracy requests, a maximum age for cached readings,
//! and a per-fix timeout.
//!
//! ```ignore
//! use routewatch::geo::{GeoWatcher, LineLocationProvider, WatchOptions};
//!
//! let handle = GeoWatcher::start(
//!     LineLocationProvider::stdin(),
//!     WatchOptions::default(),
//!     |event| println!("{:?}", event),
//! );
//! // ...
//! handle.stop().await;
//! ```

mod channel;
mod line;
mod types;
mod watcher;

pub use channel::{ChannelLocationProvider, FixSender};
pub use line::LineLocationProvider;
pub use types::{
    Fix, GeoError, GeoEvent, WatchOptions, DEFAULT_FIX_TIMEOUT, DEFAULT_RETRY_DELAY,
};
pub use watcher::{GeoWatcher, LocationProvider, WatchHandle};
