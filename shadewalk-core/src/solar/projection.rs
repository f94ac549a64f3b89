use geo::{BoundingRect, Coord, MultiPoint};

use crate::GeoPoint;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Equirectangular projection to a local plane in meters
///
/// Accurate to well under a percent across a city, which is all the shade
/// model needs. `x` grows east, `y` grows north.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalProjection {
    origin: GeoPoint,
    cos_lat: f64,
}

impl LocalProjection {
    pub fn new(origin: GeoPoint) -> Self {
        Self {
            origin,
            cos_lat: origin.lat.to_radians().cos(),
        }
    }

    /// Projection centered on the bounding box of `coords`
    pub fn centered_on(coords: impl IntoIterator<Item = Coord<f64>>) -> Option<Self> {
        let points: MultiPoint<f64> = coords.into_iter().map(geo::Point::from).collect();
        let rect = points.bounding_rect()?;
        Some(Self::new(rect.center().into()))
    }

    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    /// Longitude/latitude to local meters
    pub fn project(&self, coord: Coord<f64>) -> Coord<f64> {
        Coord {
            x: (coord.x - self.origin.lon).to_radians() * EARTH_RADIUS_M * self.cos_lat,
            y: (coord.y - self.origin.lat).to_radians() * EARTH_RADIUS_M,
        }
    }

    /// Local meters back to longitude/latitude
    pub fn unproject(&self, coord: Coord<f64>) -> Coord<f64> {
        Coord {
            x: self.origin.lon + (coord.x / (EARTH_RADIUS_M * self.cos_lat)).to_degrees(),
            y: self.origin.lat + (coord.y / EARTH_RADIUS_M).to_degrees(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projected_distances_match_haversine_locally() {
        let projection = LocalProjection::new(GeoPoint::new(40.7128, -74.0060));
        let a = GeoPoint::new(40.7128, -74.0060);
        let b = GeoPoint::new(40.7158, -74.0020);

        let pa = projection.project(a.into());
        let pb = projection.project(b.into());
        let planar = (pb.x - pa.x).hypot(pb.y - pa.y);
        let spherical = a.haversine_distance(&b);

        assert!((planar - spherical).abs() / spherical < 0.005);
    }

    #[test]
    fn unproject_inverts_project() {
        let projection = LocalProjection::new(GeoPoint::new(51.5, -0.12));
        let coord = Coord { x: -0.1, y: 51.51 };
        let back = projection.unproject(projection.project(coord));

        assert!((back.x - coord.x).abs() < 1e-9);
        assert!((back.y - coord.y).abs() < 1e-9);
    }

    #[test]
    fn centered_on_uses_bounding_box_center() {
        let projection = LocalProjection::centered_on([
            Coord { x: -74.0, y: 40.0 },
            Coord { x: -73.0, y: 41.0 },
        ])
        .unwrap();
        assert_eq!(projection.origin(), GeoPoint::new(40.5, -73.5));
        assert!(LocalProjection::centered_on(Vec::<Coord<f64>>::new()).is_none());
    }
}
