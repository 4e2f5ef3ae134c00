//! Route types and the route client trait

use std::future::Future;

use thiserror::Error;

use crate::coord::Coordinate;

/// Errors that can occur while fetching a route.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    /// Connectivity, DNS or timeout failure, or the body could not be read.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success status or a body that does not describe a usable route.
    #[error("Routing provider error: {0}")]
    Provider(String),

    /// The provider answered but offered zero route alternatives.
    #[error("Routing provider returned no route")]
    EmptyRoute,
}

/// A route between two coordinates.
///
/// Geometry runs from origin to destination and holds at least two points.
/// Distance is in meters as reported by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    geometry: Vec<Coordinate>,
    distance_meters: f64,
    duration_seconds: f64,
}

impl RouteResult {
    /// Minimum number of points in a route polyline.
    pub const MIN_POINTS: usize = 2;

    /// Builds a route, rejecting geometry shorter than two points and
    /// negative or non-finite distance/duration values.
    pub fn new(
        geometry: Vec<Coordinate>,
        distance_meters: f64,
        duration_seconds: f64,
    ) -> Result<Self, RouteError> {
        if geometry.len() < Self::MIN_POINTS {
            return Err(RouteError::Provider(format!(
                "route geometry has {} point(s), expected at least {}",
                geometry.len(),
                Self::MIN_POINTS
            )));
        }
        if !distance_meters.is_finite() || distance_meters < 0.0 {
            return Err(RouteError::Provider(format!(
                "invalid route distance: {}",
                distance_meters
            )));
        }
        if !duration_seconds.is_finite() || duration_seconds < 0.0 {
            return Err(RouteError::Provider(format!(
                "invalid route duration: {}",
                duration_seconds
            )));
        }
        Ok(Self {
            geometry,
            distance_meters,
            duration_seconds,
        })
    }

    pub fn geometry(&self) -> &[Coordinate] {
        &self.geometry
    }

    pub fn distance_meters(&self) -> f64 {
        self.distance_meters
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    /// Distance converted to kilometers.
    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }

    /// First point of the polyline.
    pub fn origin(&self) -> Coordinate {
        self.geometry[0]
    }

    /// Last point of the polyline.
    pub fn end(&self) -> Coordinate {
        self.geometry[self.geometry.len() - 1]
    }
}

/// Trait for routing services.
///
/// Implementors compute a single path between two coordinates. Failures are
/// returned as-is; retry policy belongs to the caller.
pub trait RouteClient: Send + Sync + 'static {
    /// Fetches a route from `origin` to `destination`.
    fn fetch_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> impl Future<Output = Result<RouteResult, RouteError>> + Send;

    /// Returns the client's name for logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_route_result_accessors() {
        let route = RouteResult::new(vec![c(49.1, -122.8), c(49.13, -122.87)], 3500.0, 420.0)
            .unwrap();
        assert_eq!(route.geometry().len(), 2);
        assert_eq!(route.distance_meters(), 3500.0);
        assert_eq!(route.distance_km(), 3.5);
        assert_eq!(route.duration_seconds(), 420.0);
        assert_eq!(route.origin(), c(49.1, -122.8));
        assert_eq!(route.end(), c(49.13, -122.87));
    }

    #[test]
    fn test_single_point_geometry_rejected() {
        let result = RouteResult::new(vec![c(49.1, -122.8)], 10.0, 1.0);
        assert!(matches!(result, Err(RouteError::Provider(_))));
    }

    #[test]
    fn test_negative_distance_rejected() {
        let result = RouteResult::new(vec![c(0.0, 0.0), c(0.0, 0.1)], -1.0, 1.0);
        assert!(matches!(result, Err(RouteError::Provider(_))));
    }

    #[test]
    fn test_zero_distance_allowed() {
        let result = RouteResult::new(vec![c(0.0, 0.0), c(0.0, 0.0)], 0.0, 0.0);
        assert!(result.is_ok());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            RouteError::EmptyRoute.to_string(),
            "Routing provider returned no route"
        );
        assert!(RouteError::Network("timed out".into())
            .to_string()
            .contains("timed out"));
    }
}
