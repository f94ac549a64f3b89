use std::sync::Arc;

use geo::{Coord, LineString, Point};
use hashbrown::HashMap;
use log::{debug, info};
use petgraph::graph::{EdgeIndex, Edges, NodeIndex, UnGraph};
use petgraph::Undirected;

use crate::{Error, GeoPoint, Meters, ShadeScore, StreetSegment, WeightBlend};

use super::EdgeWeights;

/// Node identity: endpoint coordinates rounded to a fixed number of decimals
///
/// At 7 decimals two endpoints within roughly a centimeter share a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey {
    x: i64,
    y: i64,
}

impl NodeKey {
    #[allow(clippy::cast_possible_truncation)]
    pub fn quantize(coord: Coord<f64>, precision: u32) -> Self {
        let scale = 10f64.powi(precision as i32);
        Self {
            x: (coord.x * scale).round() as i64,
            y: (coord.y * scale).round() as i64,
        }
    }
}

/// Street graph node, a segment endpoint
#[derive(Debug, Clone)]
pub struct StreetNode {
    pub key: NodeKey,
    /// Coordinates of the first endpoint that created the node
    pub geometry: Point<f64>,
}

/// Street graph edge, one routable street segment
#[derive(Debug, Clone)]
pub struct StreetEdge {
    pub length: Meters,
    pub segment: Arc<StreetSegment>,
}

impl StreetEdge {
    pub fn geometry(&self) -> &LineString<f64> {
        &self.segment.geometry
    }
}

/// Undirected street graph keyed by segment endpoints
#[derive(Debug, Clone)]
pub struct RoutingGraph {
    pub graph: UnGraph<StreetNode, StreetEdge>,
    node_lookup: HashMap<NodeKey, NodeIndex>,
    precision: u32,
}

impl RoutingGraph {
    /// Builds the graph, dropping segments with fewer than two distinct
    /// finite coordinates
    pub fn new(segments: impl IntoIterator<Item = StreetSegment>, precision: u32) -> Self {
        let mut graph = Self {
            graph: UnGraph::default(),
            node_lookup: HashMap::new(),
            precision,
        };

        let mut skipped = 0usize;
        for segment in segments {
            if graph.add_segment(segment).is_none() {
                skipped += 1;
            }
        }

        if skipped > 0 {
            debug!("Excluded {skipped} street segments with invalid geometry");
        }
        info!(
            "Created routing graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        graph
    }

    /// Adds a segment between its endpoints, `None` if it is not routable
    pub fn add_segment(&mut self, segment: StreetSegment) -> Option<EdgeIndex> {
        if !segment.is_routable() {
            return None;
        }
        let (first, last) = segment.endpoints()?;

        let source = self.node_for(first);
        let target = self.node_for(last);
        let edge = StreetEdge {
            length: segment.length(),
            segment: Arc::new(segment),
        };
        Some(self.graph.add_edge(source, target, edge))
    }

    fn node_for(&mut self, coord: Coord<f64>) -> NodeIndex {
        let key = NodeKey::quantize(coord, self.precision);
        *self.node_lookup.entry(key).or_insert_with(|| {
            self.graph.add_node(StreetNode {
                key,
                geometry: coord.into(),
            })
        })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Node whose key matches `point` exactly after quantization
    pub fn node_at(&self, point: GeoPoint) -> Option<NodeIndex> {
        let key = NodeKey::quantize(point.into(), self.precision);
        self.node_lookup.get(&key).copied()
    }

    pub fn node_point(&self, node: NodeIndex) -> Option<GeoPoint> {
        self.graph
            .node_weight(node)
            .map(|node| GeoPoint::from(node.geometry))
    }

    /// Closest node by great-circle distance, scanning all nodes
    pub fn nearest_node(&self, point: GeoPoint) -> Option<(NodeIndex, Meters)> {
        self.graph
            .node_indices()
            .map(|idx| {
                let node = GeoPoint::from(self.graph[idx].geometry);
                (idx, point.haversine_distance(&node))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn edge(&self, edge: EdgeIndex) -> Option<&StreetEdge> {
        self.graph.edge_weight(edge)
    }

    pub fn edges(&self, node: NodeIndex) -> Edges<'_, StreetEdge, Undirected> {
        self.graph.edges(node)
    }

    pub fn edge_endpoints(&self, edge: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(edge)
    }

    /// Fresh per-query shade scores and combined weights for every edge
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `shade_scores` does not hold one
    /// score per edge
    pub fn weigh(
        &self,
        shade_scores: &[ShadeScore],
        blend: WeightBlend,
    ) -> Result<EdgeWeights, Error> {
        EdgeWeights::compute(self, shade_scores, blend)
    }
}
