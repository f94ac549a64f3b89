//! Input data model
//!
//! Street segments, buildings and trees as handed over by the data
//! providers. Coordinates are WGS84 longitude/latitude unless a type is
//! explicitly projected to a local metric plane.

mod casters;
mod point;
mod street;

pub use casters::{Building, CANOPY_SEGMENTS, ShadowCaster, TREE_HEIGHT_FACTOR, Tree};
pub use point::GeoPoint;
pub use street::StreetSegment;
