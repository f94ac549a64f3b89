//! Sun geometry, shadow projection and street shade scoring

mod index;
mod projection;
mod shade;
mod shadow;
mod sun;

pub use index::CasterIndex;
pub use projection::LocalProjection;
pub use shade::{DEFAULT_ANALYSIS_BUFFER_M, StreetShadeScorer};
pub use shadow::project_shadow;
pub use sun::{SeasonalFactors, SunCalculator, SunPosition, parse_date, parse_time};
