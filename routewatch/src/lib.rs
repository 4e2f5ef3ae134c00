//! RouteWatch - live position to driving route synchronization
//!
//! Watches a position feed, asks a routing service (OSRM) for the driving
//! route from each new position to a fixed destination, and publishes the
//! latest position, route and distance for presenters to render.
//!
//! - [`geo`] samples positions from a [`geo::LocationProvider`]
//! - [`route`] fetches routes through a [`route::RouteClient`]
//! - [`sync`] ties both together and discards stale route responses
//! - [`config`] and [`logging`] provide the ambient setup

pub mod config;
pub mod coord;
pub mod geo;
pub mod logging;
pub mod route;
pub mod sync;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
