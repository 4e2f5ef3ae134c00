//! Coordinate module
//!
//! Provides the validated [`Coordinate`] value used everywhere in the crate and
//! the fixed [`Destination`] that routes are computed towards.

mod types;

pub use types::{CoordError, Coordinate, Destination, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// Default destination name.
pub const DEFAULT_DESTINATION_NAME: &str = "KPU Surrey Library";

/// Default destination latitude in degrees.
pub const DEFAULT_DESTINATION_LAT: f64 = 49.13204;

/// Default destination longitude in degrees.
pub const DEFAULT_DESTINATION_LON: f64 = -122.87139;

/// Returns the built-in destination (KPU Surrey Library).
pub fn default_destination() -> Destination {
    Destination::new(
        DEFAULT_DESTINATION_NAME,
        Coordinate::new_unchecked(DEFAULT_DESTINATION_LAT, DEFAULT_DESTINATION_LON),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coordinate() {
        let c = Coordinate::new(49.10, -122.80).unwrap();
        assert_eq!(c.latitude(), 49.10);
        assert_eq!(c.longitude(), -122.80);
        assert_eq!(c.lat_lon(), (49.10, -122.80));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_invalid_latitude() {
        let result = Coordinate::new(90.5, 0.0);
        assert!(matches!(result, Err(CoordError::InvalidLatitude(_))));
    }

    #[test]
    fn test_invalid_longitude() {
        let result = Coordinate::new(0.0, -180.01);
        assert!(matches!(result, Err(CoordError::InvalidLongitude(_))));
    }

    #[test]
    fn test_nan_rejected() {
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_from_lon_lat_swaps_axis_order() {
        let c = Coordinate::from_lon_lat(-122.87139, 49.13204).unwrap();
        assert_eq!(c.latitude(), 49.13204);
        assert_eq!(c.longitude(), -122.87139);
    }

    #[test]
    fn test_parse_lat_lon() {
        let c: Coordinate = " 49.10 , -122.80 ".parse().unwrap();
        assert_eq!(c.lat_lon(), (49.10, -122.80));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            "49.10".parse::<Coordinate>(),
            Err(CoordError::Malformed(_))
        ));
        assert!(matches!(
            "north,west".parse::<Coordinate>(),
            Err(CoordError::Malformed(_))
        ));
        assert!(matches!(
            "95,10".parse::<Coordinate>(),
            Err(CoordError::InvalidLatitude(_))
        ));
    }

    #[test]
    fn test_default_destination() {
        let dest = default_destination();
        assert_eq!(dest.name(), "KPU Surrey Library");
        assert_eq!(dest.coordinate().lat_lon(), (49.13204, -122.87139));
    }
}
