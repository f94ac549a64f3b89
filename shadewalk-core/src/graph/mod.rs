//! Street routing graph
//!
//! Topology and segment lengths are fixed at construction. Shade scores and
//! combined weights depend on the query and live in [`EdgeWeights`].

mod network;
mod weights;

pub use network::{NodeKey, RoutingGraph, StreetEdge, StreetNode};
pub use weights::{EdgeState, EdgeWeights};
