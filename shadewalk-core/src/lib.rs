//! Shade-aware pedestrian routing.
//!
//! Builds a walkable street graph, estimates how much of every street is
//! covered by building and tree shadows for a given date and time, and
//! searches for routes that trade travel distance against shade.

pub mod config;
mod error;
pub mod graph;
pub mod model;
pub mod prelude;
pub mod routing;
pub mod solar;

pub use config::{RouterConfig, WeightBlend};
pub use error::Error;
pub use graph::{EdgeWeights, RoutingGraph};
pub use model::{Building, GeoPoint, ShadowCaster, StreetSegment, Tree};
pub use routing::{Route, RouteEdge, RouteQuery, RouteWarning, ShadeRouter};
pub use solar::{StreetShadeScorer, SunCalculator, SunPosition, project_shadow};

/// Distance in meters
pub type Meters = f64;
/// Fraction of a street's analysis area covered by shadow, in `[0, 1]`
pub type ShadeScore = f64;
