use geo::{Coord, Distance, Haversine, LineString, Validation};

use crate::Meters;

/// Street segment polyline with its walking length
#[derive(Debug, Clone)]
pub struct StreetSegment {
    /// Longitude/latitude polyline
    pub geometry: LineString<f64>,
    /// Supplied length, replaced by the polyline length when absent or invalid
    pub length_m: Option<Meters>,
    pub name: Option<String>,
    pub class: Option<String>,
}

impl StreetSegment {
    pub fn new(geometry: LineString<f64>, length_m: Meters) -> Self {
        Self {
            geometry,
            length_m: Some(length_m),
            name: None,
            class: None,
        }
    }

    pub fn from_geometry(geometry: LineString<f64>) -> Self {
        Self {
            geometry,
            length_m: None,
            name: None,
            class: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Segment has at least two distinct, finite coordinates
    pub fn is_routable(&self) -> bool {
        self.geometry.0.len() >= 2 && self.geometry.is_valid()
    }

    /// First and last coordinate of the polyline
    pub fn endpoints(&self) -> Option<(Coord<f64>, Coord<f64>)> {
        let first = *self.geometry.0.first()?;
        let last = *self.geometry.0.last()?;
        Some((first, last))
    }

    pub fn length(&self) -> Meters {
        match self.length_m {
            Some(length) if length.is_finite() && length >= 0.0 => length,
            _ => haversine_length(&self.geometry),
        }
    }
}

/// Sum of great-circle distances between consecutive polyline vertices
pub(crate) fn haversine_length(line: &LineString<f64>) -> Meters {
    line.lines()
        .map(|segment| Haversine.distance(segment.start_point(), segment.end_point()))
        .sum()
}
