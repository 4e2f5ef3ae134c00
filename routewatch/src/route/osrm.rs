//! OSRM route client.
//!
//! Talks to the OSRM HTTP API (`/route/v1/{profile}/{coordinates}`), asking for
//! the full route overview as GeoJSON. OSRM orders coordinates as
//! `[longitude, latitude]`; everything leaving this module is in canonical
//! [`Coordinate`] order.

use serde::Deserialize;
use tracing::{debug, warn};

use super::http::{AsyncHttpClient, HttpError, HttpResponse};
use super::types::{RouteClient, RouteError, RouteResult};
use crate::coord::Coordinate;

/// Public OSRM demo server.
pub const DEFAULT_OSRM_BASE_URL: &str = "https://router.project-osrm.org";

/// Default routing profile.
pub const DEFAULT_OSRM_PROFILE: &str = "driving";

/// OSRM response code for a successful request.
const OSRM_CODE_OK: &str = "Ok";

/// Connection settings for an OSRM server.
#[derive(Debug, Clone, PartialEq)]
pub struct OsrmConfig {
    /// Server base URL without trailing slash (e.g. `https://router.project-osrm.org`).
    pub base_url: String,
    /// Routing profile (`driving`, `walking`, `cycling`, ...).
    pub profile: String,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OSRM_BASE_URL.to_string(),
            profile: DEFAULT_OSRM_PROFILE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    #[serde(default)]
    duration: f64,
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<Vec<f64>>,
}

/// Route client backed by an OSRM server.
pub struct OsrmRouteClient<H: AsyncHttpClient> {
    http: H,
    config: OsrmConfig,
}

impl<H: AsyncHttpClient> OsrmRouteClient<H> {
    /// Creates a client for the public OSRM server.
    pub fn new(http: H) -> Self {
        Self::with_config(http, OsrmConfig::default())
    }

    /// Creates a client with explicit server settings.
    pub fn with_config(http: H, config: OsrmConfig) -> Self {
        Self { http, config }
    }

    /// Builds the request URL for a route from `origin` to `destination`.
    pub fn route_url(&self, origin: Coordinate, destination: Coordinate) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}?overview=full&geometries=geojson",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            origin.longitude(),
            origin.latitude(),
            destination.longitude(),
            destination.latitude()
        )
    }
}

impl<H: AsyncHttpClient + 'static> RouteClient for OsrmRouteClient<H> {
    async fn fetch_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RouteResult, RouteError> {
        let url = self.route_url(origin, destination);

        let response = self.http.get(&url).await.map_err(|e| match e {
            HttpError::Client(msg) => RouteError::Provider(msg),
            HttpError::Transport(msg) | HttpError::Body(msg) => RouteError::Network(msg),
        })?;

        let route = parse_route_response(&response)?;

        debug!(
            origin = %origin,
            destination = %destination,
            distance_m = route.distance_meters(),
            points = route.geometry().len(),
            "OSRM route received"
        );

        Ok(route)
    }

    fn name(&self) -> &str {
        "osrm"
    }
}

/// Interprets an OSRM `/route` response.
///
/// Only the first alternative is used.
fn parse_route_response(response: &HttpResponse) -> Result<RouteResult, RouteError> {
    if !response.is_success() {
        let detail = serde_json::from_slice::<OsrmResponse>(&response.body)
            .ok()
            .map(|r| match r.message {
                Some(message) => format!("{} ({})", r.code, message),
                None => r.code,
            })
            .unwrap_or_else(|| "no details".to_string());
        warn!(status = response.status, detail = %detail, "OSRM error status");
        return Err(RouteError::Provider(format!(
            "HTTP {}: {}",
            response.status, detail
        )));
    }

    let parsed: OsrmResponse = serde_json::from_slice(&response.body)
        .map_err(|e| RouteError::Provider(format!("malformed response body: {}", e)))?;

    if parsed.code != OSRM_CODE_OK {
        return Err(RouteError::Provider(match parsed.message {
            Some(message) => format!("{}: {}", parsed.code, message),
            None => parsed.code,
        }));
    }

    let first = parsed
        .routes
        .into_iter()
        .next()
        .ok_or(RouteError::EmptyRoute)?;

    let geometry = first
        .geometry
        .coordinates
        .iter()
        .map(|pair| match pair.as_slice() {
            [lon, lat, ..] => Coordinate::from_lon_lat(*lon, *lat)
                .map_err(|e| RouteError::Provider(format!("invalid geometry point: {}", e))),
            _ => Err(RouteError::Provider(format!(
                "geometry point has {} value(s), expected [lon, lat]",
                pair.len()
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    RouteResult::new(geometry, first.distance, first.duration)
}
