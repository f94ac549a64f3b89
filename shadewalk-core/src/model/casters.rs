//! Objects that cast shadows on streets
//!
//! Buildings and trees collapse into the same shape for shadow purposes: a
//! ground footprint and a height. Everything downstream only talks to the
//! [`ShadowCaster`] capability.

use std::borrow::Cow;
use std::f64::consts::TAU;

use geo::{
    BoundingRect, Coord, Intersects, LineString, MapCoords, MultiPolygon, Point, Polygon, Rect,
};

use crate::solar::{LocalProjection, SunPosition, project_shadow};
use crate::{Error, Meters};

/// Tree height as a multiple of its canopy diameter
pub const TREE_HEIGHT_FACTOR: f64 = 20.0;
/// Vertex count of the polygon approximating a tree canopy
pub const CANOPY_SEGMENTS: usize = 32;

pub trait ShadowCaster {
    /// Ground footprint the shadow is swept from
    fn footprint(&self) -> Cow<'_, Polygon<f64>>;

    /// Height in meters, `None` when the object cannot cast a shadow
    fn height(&self) -> Option<Meters>;

    /// Whether the object takes part in shading `area`
    fn touches(&self, area: &MultiPolygon<f64>) -> bool;

    fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.footprint().bounding_rect()
    }

    fn cast_shadow(&self, sun: &SunPosition) -> Result<MultiPolygon<f64>, Error> {
        let height = self
            .height()
            .ok_or_else(|| Error::GeometryError("shadow source has no usable height".into()))?;
        project_shadow(&self.footprint(), height, sun)
    }
}

/// Building footprint with its roof height
#[derive(Debug, Clone)]
pub struct Building {
    pub footprint: Polygon<f64>,
    /// Roof height in meters as reported by the data provider
    pub height_m: Option<f64>,
}

impl Building {
    pub fn new(footprint: Polygon<f64>, height_m: f64) -> Self {
        Self {
            footprint,
            height_m: Some(height_m),
        }
    }

    pub fn without_height(footprint: Polygon<f64>) -> Self {
        Self {
            footprint,
            height_m: None,
        }
    }

    #[must_use]
    pub fn project(&self, projection: &LocalProjection) -> Self {
        Self {
            footprint: self.footprint.map_coords(|c| projection.project(c)),
            height_m: self.height_m,
        }
    }
}

impl ShadowCaster for Building {
    fn footprint(&self) -> Cow<'_, Polygon<f64>> {
        Cow::Borrowed(&self.footprint)
    }

    fn height(&self) -> Option<Meters> {
        self.height_m.filter(|h| h.is_finite() && *h > 0.0)
    }

    fn touches(&self, area: &MultiPolygon<f64>) -> bool {
        self.footprint.intersects(area)
    }
}

/// Street tree, its height is derived from the canopy size
#[derive(Debug, Clone)]
pub struct Tree {
    pub location: Point<f64>,
    pub canopy_diameter_m: f64,
    pub height_factor: f64,
}

impl Tree {
    pub fn new(location: Point<f64>, canopy_diameter_m: f64) -> Self {
        Self {
            location,
            canopy_diameter_m,
            height_factor: TREE_HEIGHT_FACTOR,
        }
    }

    #[must_use]
    pub fn with_height_factor(mut self, height_factor: f64) -> Self {
        self.height_factor = height_factor;
        self
    }

    #[must_use]
    pub fn project(&self, projection: &LocalProjection) -> Self {
        Self {
            location: projection.project(self.location.into()).into(),
            ..self.clone()
        }
    }

    fn has_canopy(&self) -> bool {
        self.canopy_diameter_m.is_finite() && self.canopy_diameter_m > 0.0
    }
}

impl ShadowCaster for Tree {
    /// Canopy disk of radius `diameter / 2` centered on the trunk
    fn footprint(&self) -> Cow<'_, Polygon<f64>> {
        Cow::Owned(canopy_disk(self.location, self.canopy_diameter_m / 2.0))
    }

    fn height(&self) -> Option<Meters> {
        if !self.has_canopy() {
            return None;
        }
        Some(self.canopy_diameter_m * self.height_factor).filter(|h| h.is_finite() && *h > 0.0)
    }

    fn touches(&self, area: &MultiPolygon<f64>) -> bool {
        area.intersects(&self.location)
    }

    fn bounding_rect(&self) -> Option<Rect<f64>> {
        Some(Rect::new(self.location.0, self.location.0))
    }
}

fn canopy_disk(center: Point<f64>, radius: f64) -> Polygon<f64> {
    let ring: Vec<Coord<f64>> = (0..=CANOPY_SEGMENTS)
        .map(|i| {
            let theta = TAU * (i % CANOPY_SEGMENTS) as f64 / CANOPY_SEGMENTS as f64;
            Coord {
                x: center.x() + radius * theta.cos(),
                y: center.y() + radius * theta.sin(),
            }
        })
        .collect();
    Polygon::new(LineString::from(ring), vec![])
}

#[cfg(test)]
mod tests {
    use geo::{Area, polygon};

    use super::*;

    #[test]
    fn tree_height_is_twenty_canopy_diameters() {
        let tree = Tree::new(Point::new(0.0, 0.0), 3.0);
        assert_eq!(tree.height(), Some(60.0));
    }

    #[test]
    fn tree_footprint_approximates_canopy_disk() {
        let tree = Tree::new(Point::new(5.0, 5.0), 4.0);
        let area = tree.footprint().unsigned_area();
        let disk = std::f64::consts::PI * 4.0;
        assert!((area - disk).abs() / disk < 0.01, "area={area}");
    }

    #[test]
    fn invalid_heights_exclude_building_from_shading() {
        let footprint = polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
        ];

        assert_eq!(Building::new(footprint.clone(), 12.0).height(), Some(12.0));
        assert_eq!(Building::new(footprint.clone(), 0.0).height(), None);
        assert_eq!(Building::new(footprint.clone(), f64::NAN).height(), None);
        assert_eq!(Building::without_height(footprint).height(), None);
    }

    #[test]
    fn building_without_height_fails_to_cast() {
        let building = Building::without_height(polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
        ]);
        let sun = SunPosition {
            elevation: 45.0,
            azimuth: 180.0,
            declination: 0.0,
            hour_angle: 0.0,
        };
        assert!(matches!(
            building.cast_shadow(&sun),
            Err(Error::GeometryError(_))
        ));
    }

    #[test]
    fn tree_touches_area_only_through_its_trunk() {
        let area = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
        ]]);

        // canopy overlaps the area but the trunk is outside
        let outside = Tree::new(Point::new(11.0, 5.0), 4.0);
        let inside = Tree::new(Point::new(9.0, 5.0), 4.0);

        assert!(!outside.touches(&area));
        assert!(inside.touches(&area));
    }
}
