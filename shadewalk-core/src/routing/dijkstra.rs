use std::{cmp::Ordering, collections::BinaryHeap};

use hashbrown::HashMap;
use petgraph::{
    graph::{EdgeIndex, NodeIndex},
    visit::EdgeRef,
};

use crate::graph::{RoutingGraph, StreetEdge};

#[derive(Copy, Clone, PartialEq)]
struct State {
    cost: f64,
    node: NodeIndex,
}

impl Eq for State {}

// Implement Ord for State to use in BinaryHeap
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by cost, lower node index first on ties
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Node sequence and traversed edges of a shortest path
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TracedPath {
    pub(crate) cost: f64,
    pub(crate) nodes: Vec<NodeIndex>,
    pub(crate) edges: Vec<EdgeIndex>,
}

/// Dijkstra's algorithm between two nodes of the street graph
///
/// `edge_cost` returns `None` for edges that must not be used. Costs that
/// are negative or not finite are treated the same way.
pub(crate) fn shortest_path<F>(
    graph: &RoutingGraph,
    start: NodeIndex,
    target: NodeIndex,
    edge_cost: F,
) -> Option<TracedPath>
where
    F: Fn(EdgeIndex, &StreetEdge) -> Option<f64>,
{
    let estimated_nodes = graph.node_count().min(1000);
    let mut distances: HashMap<NodeIndex, f64> = HashMap::with_capacity(estimated_nodes);
    let mut predecessors: HashMap<NodeIndex, (NodeIndex, EdgeIndex)> =
        HashMap::with_capacity(estimated_nodes);
    let mut heap = BinaryHeap::with_capacity(estimated_nodes / 4);

    heap.push(State {
        cost: 0.0,
        node: start,
    });
    distances.insert(start, 0.0);

    while let Some(State { cost, node }) = heap.pop() {
        if node == target {
            break;
        }

        // Skip if we've found a better path
        if let Some(&best) = distances.get(&node) {
            if cost > best {
                continue;
            }
        }

        for edge in graph.edges(node) {
            let Some(step) =
                edge_cost(edge.id(), edge.weight()).filter(|w| w.is_finite() && *w >= 0.0)
            else {
                continue;
            };
            // orientation follows how the segment was digitized
            let next = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            let next_cost = cost + step;

            match distances.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    predecessors.insert(next, (node, edge.id()));
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        predecessors.insert(next, (node, edge.id()));
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                    }
                }
            }
        }
    }

    let cost = *distances.get(&target)?;

    // Follow predecessors backward from target to start
    let mut nodes = vec![target];
    let mut edges = Vec::new();
    let mut current = target;
    while current != start {
        let &(prev, edge) = predecessors.get(&current)?;
        nodes.push(prev);
        edges.push(edge);
        current = prev;
    }
    nodes.reverse();
    edges.reverse();

    Some(TracedPath { cost, nodes, edges })
}

#[cfg(test)]
mod tests {
    use geo::line_string;

    use super::*;
    use crate::{GeoPoint, StreetSegment};

    fn segment(from: (f64, f64), to: (f64, f64), length: f64) -> StreetSegment {
        StreetSegment::new(
            line_string![(x: from.0, y: from.1), (x: to.0, y: to.1)],
            length,
        )
    }

    fn node(graph: &RoutingGraph, lon: f64, lat: f64) -> NodeIndex {
        graph.node_at(GeoPoint::new(lat, lon)).unwrap()
    }

    // a --10-- b --10-- d
    //  \               /
    //   ------30------
    fn triangle() -> RoutingGraph {
        RoutingGraph::new(
            vec![
                segment((0.0, 0.0), (0.001, 0.0), 10.0),
                segment((0.001, 0.0), (0.002, 0.0), 10.0),
                segment((0.0, 0.0), (0.002, 0.0), 30.0),
            ],
            7,
        )
    }

    #[test]
    fn finds_cheapest_path_by_length() {
        let graph = triangle();
        let path = shortest_path(&graph, node(&graph, 0.0, 0.0), node(&graph, 0.002, 0.0), |_, e| {
            Some(e.length)
        })
        .unwrap();

        assert_eq!(path.cost, 20.0);
        assert_eq!(path.nodes.len(), 3);
        assert_eq!(path.edges, vec![EdgeIndex::new(0), EdgeIndex::new(1)]);
    }

    #[test]
    fn traverses_edges_against_their_digitized_direction() {
        let graph = triangle();
        let path = shortest_path(&graph, node(&graph, 0.002, 0.0), node(&graph, 0.0, 0.0), |_, e| {
            Some(e.length)
        })
        .unwrap();

        assert_eq!(path.cost, 20.0);
        assert_eq!(path.edges, vec![EdgeIndex::new(1), EdgeIndex::new(0)]);
    }

    #[test]
    fn unusable_edges_are_avoided() {
        let graph = triangle();
        let path = shortest_path(&graph, node(&graph, 0.0, 0.0), node(&graph, 0.002, 0.0), |id, e| {
            if id == EdgeIndex::new(1) { Some(f64::NAN) } else { Some(e.length) }
        })
        .unwrap();

        assert_eq!(path.cost, 30.0);
        assert_eq!(path.edges, vec![EdgeIndex::new(2)]);
    }

    #[test]
    fn start_equals_target_is_an_empty_path() {
        let graph = triangle();
        let a = node(&graph, 0.0, 0.0);
        let path = shortest_path(&graph, a, a, |_, e| Some(e.length)).unwrap();

        assert_eq!(path.cost, 0.0);
        assert_eq!(path.nodes, vec![a]);
        assert!(path.edges.is_empty());
    }

    #[test]
    fn disconnected_target_has_no_path() {
        let graph = RoutingGraph::new(
            vec![
                segment((0.0, 0.0), (0.001, 0.0), 10.0),
                segment((1.0, 1.0), (1.001, 1.0), 10.0),
            ],
            7,
        );
        let path = shortest_path(&graph, node(&graph, 0.0, 0.0), node(&graph, 1.0, 1.0), |_, e| {
            Some(e.length)
        });
        assert!(path.is_none());
    }
}
