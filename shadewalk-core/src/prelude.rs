// Re-export key components
pub use crate::config::{RouterConfig, WeightBlend};
pub use crate::graph::{EdgeState, EdgeWeights, NodeKey, RoutingGraph, StreetEdge, StreetNode};
pub use crate::model::{Building, GeoPoint, ShadowCaster, StreetSegment, Tree};
pub use crate::routing::{Route, RouteEdge, RouteQuery, RouteWarning, ShadeRouter};
pub use crate::solar::{
    CasterIndex, LocalProjection, SeasonalFactors, StreetShadeScorer, SunCalculator, SunPosition,
    parse_date, parse_time, project_shadow,
};

pub use crate::Error;
pub use crate::Meters;
pub use crate::ShadeScore;
