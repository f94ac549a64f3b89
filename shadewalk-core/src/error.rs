use thiserror::Error;

use crate::GeoPoint;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("No street node within {max_distance_m} m of {points:?}")]
    NoNearbyNode {
        points: Vec<GeoPoint>,
        max_distance_m: f64,
    },
    #[error("No path found between the requested points")]
    NoPathFound,
    #[error("Geometry error: {0}")]
    GeometryError(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
}
