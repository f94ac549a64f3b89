use petgraph::graph::EdgeIndex;

use crate::{Error, ShadeScore, WeightBlend};

use super::RoutingGraph;

/// Per-query state of one edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeState {
    pub shade_score: ShadeScore,
    pub combined_weight: f64,
}

/// Shade scores and routing weights of every edge for a single query
///
/// Built from scratch for each sun position and blend, indexed by
/// [`EdgeIndex`]. Nothing is written back into the graph.
#[derive(Debug, Clone)]
pub struct EdgeWeights {
    states: Vec<EdgeState>,
    blend: WeightBlend,
}

impl EdgeWeights {
    pub(crate) fn compute(
        graph: &RoutingGraph,
        shade_scores: &[ShadeScore],
        blend: WeightBlend,
    ) -> Result<Self, Error> {
        if shade_scores.len() != graph.edge_count() {
            return Err(Error::InvalidInput(format!(
                "expected {} shade scores, got {}",
                graph.edge_count(),
                shade_scores.len()
            )));
        }

        let states = graph
            .graph
            .edge_weights()
            .zip(shade_scores)
            .map(|(edge, &score)| {
                let shade_score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
                EdgeState {
                    shade_score,
                    combined_weight: blend.combined_weight(edge.length, shade_score),
                }
            })
            .collect();

        Ok(Self { states, blend })
    }

    pub fn blend(&self) -> WeightBlend {
        self.blend
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, edge: EdgeIndex) -> Option<&EdgeState> {
        self.states.get(edge.index())
    }

    pub fn shade_score(&self, edge: EdgeIndex) -> ShadeScore {
        self.get(edge).map_or(0.0, |state| state.shade_score)
    }

    /// Routing cost of `edge`, `None` if the edge is unknown
    pub fn combined_weight(&self, edge: EdgeIndex) -> Option<f64> {
        self.get(edge).map(|state| state.combined_weight)
    }
}

#[cfg(test)]
mod tests {
    use geo::line_string;

    use super::*;
    use crate::StreetSegment;

    fn two_edge_graph() -> RoutingGraph {
        RoutingGraph::new(
            vec![
                StreetSegment::new(line_string![(x: 0.0, y: 0.0), (x: 0.001, y: 0.0)], 100.0),
                StreetSegment::new(line_string![(x: 0.001, y: 0.0), (x: 0.002, y: 0.0)], 50.0),
            ],
            7,
        )
    }

    #[test]
    fn weights_follow_the_blend() {
        let graph = two_edge_graph();
        let weights = graph.weigh(&[1.0, 0.0], WeightBlend::new(0.6, 0.4)).unwrap();

        assert_eq!(weights.len(), 2);
        assert!((weights.combined_weight(EdgeIndex::new(0)).unwrap() - 40.0).abs() < 1e-9);
        assert!((weights.combined_weight(EdgeIndex::new(1)).unwrap() - 50.0).abs() < 1e-9);
        assert_eq!(weights.shade_score(EdgeIndex::new(0)), 1.0);
    }

    #[test]
    fn reweighing_does_not_carry_previous_state() {
        let graph = two_edge_graph();
        let shaded = graph.weigh(&[1.0, 1.0], WeightBlend::new(1.0, 0.0)).unwrap();
        let sunny = graph.weigh(&[0.0, 0.0], WeightBlend::new(1.0, 0.0)).unwrap();

        assert_eq!(shaded.combined_weight(EdgeIndex::new(0)), Some(0.0));
        assert_eq!(sunny.combined_weight(EdgeIndex::new(0)), Some(100.0));
        assert_eq!(sunny.shade_score(EdgeIndex::new(1)), 0.0);
    }

    #[test]
    fn score_count_must_match_edges() {
        let graph = two_edge_graph();
        assert!(matches!(
            graph.weigh(&[0.5], WeightBlend::default()),
            Err(Error::InvalidInput(_))
        ));
    }
}
