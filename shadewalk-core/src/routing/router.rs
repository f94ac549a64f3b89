use chrono::{NaiveDate, NaiveTime};
use geo::{LineString, MapCoords};
use log::{info, warn};
use petgraph::graph::{EdgeIndex, NodeIndex};
use rayon::prelude::*;

use crate::graph::EdgeWeights;
use crate::solar::{CasterIndex, LocalProjection};
use crate::{
    Building, Error, GeoPoint, Meters, RouterConfig, RoutingGraph, ShadeScore, StreetSegment,
    StreetShadeScorer, SunCalculator, SunPosition, Tree, WeightBlend,
};

use super::dijkstra::{self, TracedPath};
use super::{Route, RouteQuery, RouteWarning};

/// Shade-aware walking router over a fixed street network and set of casters
///
/// Street and caster data are loaded once, every query computes fresh shade
/// scores for its own date and time. Query methods take `&self` and keep all
/// per-query state local, so one router can serve concurrent queries.
pub struct ShadeRouter {
    config: RouterConfig,
    graph: RoutingGraph,
    casters: CasterIndex,
    /// Edge geometries in the local metric plane, indexed like graph edges
    planar_edges: Vec<LineString<f64>>,
    projection: LocalProjection,
    sun: SunCalculator,
    scorer: StreetShadeScorer,
}

impl ShadeRouter {
    /// Builds the street graph and the caster index
    ///
    /// Inputs are in WGS84 longitude/latitude. Geometry is projected around
    /// the center of the street network for all area computations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` fails validation
    pub fn new(
        streets: impl IntoIterator<Item = StreetSegment>,
        buildings: impl IntoIterator<Item = Building>,
        trees: impl IntoIterator<Item = Tree>,
        config: RouterConfig,
    ) -> Result<Self, Error> {
        config.validate()?;
        let sun = SunCalculator::from_config(&config)?;
        let graph = RoutingGraph::new(streets, config.node_precision);

        let projection =
            LocalProjection::centered_on(graph.graph.node_weights().map(|node| node.geometry.0))
                .unwrap_or_else(|| LocalProjection::new(config.observer));

        let planar_edges: Vec<LineString<f64>> = graph
            .graph
            .edge_weights()
            .map(|edge| edge.geometry().map_coords(|coord| projection.project(coord)))
            .collect();

        let buildings: Vec<Building> = buildings
            .into_iter()
            .map(|building| building.project(&projection))
            .collect();
        let trees: Vec<Tree> = trees
            .into_iter()
            .map(|tree| {
                tree.project(&projection)
                    .with_height_factor(config.tree_height_factor)
            })
            .collect();
        let casters = CasterIndex::new(buildings, trees);

        info!(
            "Prepared {} buildings and {} trees for shade analysis",
            casters.buildings().len(),
            casters.trees().len()
        );

        Ok(Self {
            scorer: StreetShadeScorer::new(config.analysis_buffer_m),
            config,
            graph,
            casters,
            planar_edges,
            projection,
            sun,
        })
    }

    pub fn graph(&self) -> &RoutingGraph {
        &self.graph
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn sun_calculator(&self) -> &SunCalculator {
        &self.sun
    }

    pub fn casters(&self) -> &CasterIndex {
        &self.casters
    }

    pub fn projection(&self) -> &LocalProjection {
        &self.projection
    }

    pub fn sun_position(&self, date: NaiveDate, time: NaiveTime) -> SunPosition {
        self.sun.position(date, time)
    }

    /// Shade score of every edge for one sun position, indexed like graph edges
    pub fn shade_scores(&self, sun: &SunPosition) -> Vec<ShadeScore> {
        self.planar_edges
            .par_iter()
            .map(|street| self.scorer.score_indexed(street, &self.casters, sun))
            .collect()
    }

    /// Shade scores and combined weights of every edge under `blend`
    pub fn edge_weights(&self, sun: &SunPosition, blend: WeightBlend) -> Result<EdgeWeights, Error> {
        self.graph.weigh(&self.shade_scores(sun), blend)
    }

    /// Nearest graph node and its distance, if strictly inside the snap radius
    pub fn nearest_node(&self, point: GeoPoint) -> Option<(NodeIndex, Meters)> {
        self.graph
            .nearest_node(point)
            .filter(|&(_, distance)| distance < self.config.max_snap_distance_m)
    }

    /// Snaps both endpoints before any search, reporting every failure at once
    fn snap_endpoints(&self, query: &RouteQuery) -> Result<(NodeIndex, NodeIndex), Error> {
        let start = self.nearest_node(query.start);
        let end = self.nearest_node(query.end);

        match (start, end) {
            (Some((start, _)), Some((end, _))) => Ok((start, end)),
            (start, end) => {
                let points: Vec<GeoPoint> = [(query.start, start), (query.end, end)]
                    .into_iter()
                    .filter(|(_, snapped)| snapped.is_none())
                    .map(|(point, _)| point)
                    .collect();
                warn!(
                    "No street node within {}m of {:?}",
                    self.config.max_snap_distance_m, points
                );
                Err(Error::NoNearbyNode {
                    points,
                    max_distance_m: self.config.max_snap_distance_m,
                })
            }
        }
    }

    /// Route between the query endpoints under an explicit blend
    ///
    /// # Errors
    ///
    /// [`Error::NoNearbyNode`] when an endpoint cannot be snapped,
    /// [`Error::NoPathFound`] when the endpoints are not connected
    pub fn find_route(&self, query: &RouteQuery, blend: WeightBlend) -> Result<Route, Error> {
        query.validate()?;
        blend.validate()?;
        let endpoints = self.snap_endpoints(query)?;

        let sun = self.sun_position(query.date, query.time);
        log_sun(&sun);
        let scores = self.shade_scores(&sun);

        self.solve(query, endpoints, sun, &scores, blend)
    }

    /// Route under the configured primary blend
    pub fn find_shadiest_route(&self, query: &RouteQuery) -> Result<Route, Error> {
        self.find_route(query, self.config.blend)
    }

    /// Primary route followed by routes under the configured alternative
    /// blends, `num_alternatives` routes in total at most
    ///
    /// Shade scores are computed once and shared by all blends. The result
    /// is sorted by average shade score, shadiest first, keeping generation
    /// order among equal scores.
    pub fn route_alternatives(
        &self,
        query: &RouteQuery,
        num_alternatives: usize,
    ) -> Result<Vec<Route>, Error> {
        query.validate()?;
        let blends: Vec<WeightBlend> = std::iter::once(self.config.blend)
            .chain(
                self.config
                    .alternative_blends
                    .iter()
                    .copied()
                    .take(num_alternatives.saturating_sub(1)),
            )
            .collect();
        for blend in &blends {
            blend.validate()?;
        }

        let sun = self.sun_position(query.date, query.time);
        log_sun(&sun);
        let scores = self.shade_scores(&sun);

        let mut routes = Vec::with_capacity(blends.len());
        for blend in blends {
            let endpoints = self.snap_endpoints(query)?;
            routes.push(self.solve(query, endpoints, sun, &scores, blend)?);
        }

        routes.sort_by(|a, b| b.average_shade_score.total_cmp(&a.average_shade_score));
        info!("Generated {} route alternatives", routes.len());
        Ok(routes)
    }

    fn solve(
        &self,
        query: &RouteQuery,
        (start, end): (NodeIndex, NodeIndex),
        sun: SunPosition,
        scores: &[ShadeScore],
        blend: WeightBlend,
    ) -> Result<Route, Error> {
        let weights = self.graph.weigh(scores, blend)?;

        let (traced, fallback) =
            trace_with_fallback(&self.graph, start, end, |edge| weights.combined_weight(edge))?;
        if fallback {
            warn!("No path under combined weights ({blend}), routed by length");
        }

        let max_distance_km = query.max_distance_km.or(self.config.max_distance_km);
        let mut route = Route::assemble(
            &self.graph,
            &weights,
            &traced,
            query,
            sun,
            max_distance_km,
            self.config.shade_threshold,
        )?;
        if fallback {
            route.warnings.push(RouteWarning::LengthFallback);
        }

        for warning in &route.warnings {
            if let RouteWarning::DistanceBudgetExceeded { .. } = warning {
                warn!("{warning}");
            }
        }
        info!(
            "Found route ({blend}): {:.2}km over {} segments, average shade {:.3}",
            route.total_distance_km(),
            route.num_segments(),
            route.average_shade_score
        );
        Ok(route)
    }
}

/// Shortest path under `cost`, or under plain length if `cost` leaves the
/// endpoints disconnected. The flag tells whether length was used.
///
/// Validated blends always give finite non-negative weights, so the length
/// search only runs when `cost` rejects edges.
fn trace_with_fallback<F>(
    graph: &RoutingGraph,
    start: NodeIndex,
    end: NodeIndex,
    cost: F,
) -> Result<(TracedPath, bool), Error>
where
    F: Fn(EdgeIndex) -> Option<f64>,
{
    if let Some(traced) = dijkstra::shortest_path(graph, start, end, |edge, _| cost(edge)) {
        return Ok((traced, false));
    }
    dijkstra::shortest_path(graph, start, end, |_, edge| Some(edge.length))
        .map(|traced| (traced, true))
        .ok_or(Error::NoPathFound)
}

fn log_sun(sun: &SunPosition) {
    info!(
        "Sun position: elevation={:.1}°, azimuth={:.1}°",
        sun.elevation, sun.azimuth
    );
}
