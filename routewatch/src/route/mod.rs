//! Routing service abstraction
//!
//! [`RouteClient`] fetches a driving route between two coordinates. The
//! [`OsrmRouteClient`] implementation talks to an OSRM server over an
//! [`AsyncHttpClient`], which keeps the HTTP transport swappable in tests.
//!
//! ```ignore
//! use routewatch::route::{AsyncReqwestClient, OsrmRouteClient, RouteClient};
//!
//! let client = OsrmRouteClient::new(AsyncReqwestClient::new()?);
//! let route = client.fetch_route(origin, destination).await?;
//! println!("{:.2} km", route.distance_km());
//! ```

mod http;
mod osrm;
mod types;

pub use http::{AsyncHttpClient, AsyncReqwestClient, HttpError, HttpResponse, DEFAULT_HTTP_TIMEOUT};
pub use osrm::{OsrmConfig, OsrmRouteClient, DEFAULT_OSRM_BASE_URL, DEFAULT_OSRM_PROFILE};
pub use types::{RouteClient, RouteError, RouteResult};
