use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use geo::LineString;
use geojson::{Feature, FeatureCollection, Geometry};
use serde_json::json;

use crate::graph::{EdgeWeights, RoutingGraph};
use crate::solar::{parse_date, parse_time};
use crate::{Error, GeoPoint, Meters, ShadeScore, SunPosition, WeightBlend};

use super::dijkstra::TracedPath;

/// Routing request: endpoints, local date and time, optional distance budget
#[derive(Debug, Clone, PartialEq)]
pub struct RouteQuery {
    pub start: GeoPoint,
    pub end: GeoPoint,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub max_distance_km: Option<f64>,
}

impl RouteQuery {
    pub fn new(start: GeoPoint, end: GeoPoint, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            start,
            end,
            date,
            time,
            max_distance_km: None,
        }
    }

    /// Builds a query from `YYYY-MM-DD` and `HH:MM` strings
    ///
    /// A missing date means today, a missing time means noon.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for malformed strings or endpoints
    /// outside the WGS84 range
    pub fn parse(
        start: GeoPoint,
        end: GeoPoint,
        date: Option<&str>,
        time: Option<&str>,
    ) -> Result<Self, Error> {
        let date = match date {
            Some(date) => parse_date(date)?,
            None => chrono::Local::now().date_naive(),
        };
        let time = match time {
            Some(time) => parse_time(time)?,
            None => NaiveTime::from_hms_opt(12, 0, 0)
                .ok_or_else(|| Error::InvalidInput("invalid default time".into()))?,
        };

        let query = Self::new(start, end, date, time);
        query.validate()?;
        Ok(query)
    }

    #[must_use]
    pub fn with_max_distance_km(mut self, max_distance_km: f64) -> Self {
        self.max_distance_km = Some(max_distance_km);
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        for point in [self.start, self.end] {
            if !point.is_valid() {
                return Err(Error::InvalidInput(format!(
                    "coordinates out of range: {point:?}"
                )));
            }
        }
        Ok(())
    }
}

/// Non-fatal conditions attached to a successful route
#[derive(Debug, Clone, PartialEq)]
pub enum RouteWarning {
    DistanceBudgetExceeded {
        distance_km: f64,
        max_distance_km: f64,
    },
    /// Combined weights were unusable and the route minimizes length only
    LengthFallback,
}

impl fmt::Display for RouteWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteWarning::DistanceBudgetExceeded {
                distance_km,
                max_distance_km,
            } => write!(
                f,
                "Route distance {distance_km:.1}km exceeds maximum {max_distance_km}km"
            ),
            RouteWarning::LengthFallback => {
                f.write_str("No path under combined weights, routed by length")
            }
        }
    }
}

/// One traversed street segment, oriented in travel direction
#[derive(Debug, Clone)]
pub struct RouteEdge {
    pub start: GeoPoint,
    pub end: GeoPoint,
    pub distance_m: Meters,
    pub shade_score: ShadeScore,
    pub geometry: LineString<f64>,
    pub name: Option<String>,
    pub class: Option<String>,
}

impl RouteEdge {
    fn to_feature(&self, index: usize) -> Result<Feature, Error> {
        let value = json!({
            "type": "Feature",
            "geometry": Geometry::new((&self.geometry).into()),
            "properties": {
                "segment_index": index,
                "distance_m": self.distance_m,
                "shade_score": self.shade_score,
                "name": self.name,
                "class": self.class,
            }
        });

        serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJsonError(e.to_string()))
    }
}

/// Walking route with shade statistics and request metadata
#[derive(Debug, Clone)]
pub struct Route {
    pub start_point: GeoPoint,
    pub end_point: GeoPoint,
    /// Graph nodes visited, in order
    pub path: Vec<GeoPoint>,
    pub edges: Vec<RouteEdge>,
    pub total_distance_m: Meters,
    /// Sum of shade scores of traversed edges
    pub total_shade_score: f64,
    /// Mean shade score of traversed edges, `0.0` for an empty route
    pub average_shade_score: ShadeScore,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub sun_position: SunPosition,
    pub blend: WeightBlend,
    /// Minimum edge shade score counted as shady in the summary
    pub shade_threshold: ShadeScore,
    pub warnings: Vec<RouteWarning>,
}

impl Route {
    pub(crate) fn assemble(
        graph: &RoutingGraph,
        weights: &EdgeWeights,
        traced: &TracedPath,
        query: &RouteQuery,
        sun_position: SunPosition,
        max_distance_km: Option<f64>,
        shade_threshold: ShadeScore,
    ) -> Result<Self, Error> {
        let mut edges = Vec::with_capacity(traced.edges.len());

        for (step, &edge_idx) in traced.edges.iter().enumerate() {
            let from = traced.nodes[step];
            let to = traced.nodes[step + 1];
            let edge = graph.edge(edge_idx).ok_or(Error::NoPathFound)?;
            let (source, _) = graph.edge_endpoints(edge_idx).ok_or(Error::NoPathFound)?;

            let geometry = if source == from {
                edge.geometry().clone()
            } else {
                edge.geometry().0.iter().rev().copied().collect()
            };

            edges.push(RouteEdge {
                start: graph.node_point(from).ok_or(Error::NoPathFound)?,
                end: graph.node_point(to).ok_or(Error::NoPathFound)?,
                distance_m: edge.length,
                shade_score: weights.shade_score(edge_idx),
                geometry,
                name: edge.segment.name.clone(),
                class: edge.segment.class.clone(),
            });
        }

        let path = traced
            .nodes
            .iter()
            .filter_map(|&node| graph.node_point(node))
            .collect();

        let total_distance_m: Meters = edges.iter().map(|edge| edge.distance_m).sum();
        let total_shade_score: f64 = edges.iter().map(|edge| edge.shade_score).sum();
        #[allow(clippy::cast_precision_loss)]
        let average_shade_score = if edges.is_empty() {
            0.0
        } else {
            total_shade_score / edges.len() as f64
        };

        let mut warnings = Vec::new();
        if let Some(max_distance_km) = max_distance_km {
            let distance_km = total_distance_m / 1000.0;
            if distance_km > max_distance_km {
                warnings.push(RouteWarning::DistanceBudgetExceeded {
                    distance_km,
                    max_distance_km,
                });
            }
        }

        Ok(Self {
            start_point: query.start,
            end_point: query.end,
            path,
            edges,
            total_distance_m,
            total_shade_score,
            average_shade_score,
            date: query.date,
            time: query.time,
            sun_position,
            blend: weights.blend(),
            shade_threshold,
            warnings,
        })
    }

    pub fn num_segments(&self) -> usize {
        self.edges.len()
    }

    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_m / 1000.0
    }

    /// Share of the route distance on edges with at least `threshold` shade
    pub fn shaded_distance_share(&self, threshold: ShadeScore) -> f64 {
        if self.total_distance_m <= 0.0 {
            return 0.0;
        }
        let shaded: Meters = self
            .edges
            .iter()
            .filter(|edge| edge.shade_score >= threshold)
            .map(|edge| edge.distance_m)
            .sum();
        shaded / self.total_distance_m
    }

    /// [`shaded_distance_share`](Self::shaded_distance_share) at the
    /// threshold the route was built with
    pub fn shady_distance_share(&self) -> f64 {
        self.shaded_distance_share(self.shade_threshold)
    }

    pub fn exceeds_distance_budget(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, RouteWarning::DistanceBudgetExceeded { .. }))
    }

    pub fn used_length_fallback(&self) -> bool {
        self.warnings.contains(&RouteWarning::LengthFallback)
    }

    /// Blend tag such as `shade:0.6, time:0.4`
    pub fn weight_combination(&self) -> String {
        self.blend.label()
    }

    /// Converts the route to a `GeoJSON` `FeatureCollection`, one feature
    /// per traversed edge and the summary as foreign members
    pub fn to_geojson(&self) -> Result<FeatureCollection, Error> {
        let features = self
            .edges
            .iter()
            .enumerate()
            .map(|(idx, edge)| edge.to_feature(idx))
            .collect::<Result<Vec<_>, _>>()?;

        let summary = json!({
            "start_point": [self.start_point.lat, self.start_point.lon],
            "end_point": [self.end_point.lat, self.end_point.lon],
            "date": self.date.format("%Y-%m-%d").to_string(),
            "time_of_day": self.time.format("%H:%M").to_string(),
            "sun_position": self.sun_position,
            "weight_combination": self.weight_combination(),
            "total_distance": self.total_distance_m,
            "total_distance_km": self.total_distance_km(),
            "total_shade_score": self.total_shade_score,
            "average_shade_score": self.average_shade_score,
            "num_segments": self.num_segments(),
            "shade_threshold": self.shade_threshold,
            "shady_distance_share": self.shady_distance_share(),
            "warnings": self.warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
        });

        Ok(FeatureCollection {
            features,
            bbox: None,
            foreign_members: summary.as_object().cloned(),
        })
    }

    pub fn to_geojson_string(&self) -> Result<String, Error> {
        serde_json::to_string(&self.to_geojson()?).map_err(|e| Error::GeoJsonError(e.to_string()))
    }
}
