use geo::{Coord, Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

use crate::Meters;

/// WGS84 position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Great-circle distance in meters
    pub fn haversine_distance(&self, other: &GeoPoint) -> Meters {
        Haversine.distance(Point::from(*self), Point::from(*other))
    }
}

impl From<GeoPoint> for Point<f64> {
    fn from(point: GeoPoint) -> Self {
        Point::new(point.lon, point.lat)
    }
}

impl From<GeoPoint> for Coord<f64> {
    fn from(point: GeoPoint) -> Self {
        Coord {
            x: point.lon,
            y: point.lat,
        }
    }
}

impl From<Point<f64>> for GeoPoint {
    fn from(point: Point<f64>) -> Self {
        Self::new(point.y(), point.x())
    }
}

impl From<Coord<f64>> for GeoPoint {
    fn from(coord: Coord<f64>) -> Self {
        Self::new(coord.y, coord.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_conversion_swaps_axis_order() {
        let point: Point<f64> = GeoPoint::new(40.7128, -74.0060).into();
        assert_eq!(point.x(), -74.0060);
        assert_eq!(point.y(), 40.7128);
    }

    #[test]
    fn one_thousandth_degree_of_latitude_is_about_111_meters() {
        let a = GeoPoint::new(40.7128, -74.0060);
        let b = GeoPoint::new(40.7138, -74.0060);
        let distance = a.haversine_distance(&b);
        assert!((distance - 111.2).abs() < 0.5, "distance={distance}");
    }

    #[test]
    fn out_of_range_latitude_is_invalid() {
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
        assert!(GeoPoint::new(-33.9, 151.2).is_valid());
    }
}
