use geo::{Area, BooleanOps, BoundingRect, Buffer, LineString, MultiPolygon};
use log::{debug, warn};

use crate::{Building, Error, Meters, ShadeScore, ShadowCaster, SunPosition, Tree};

use super::CasterIndex;

/// Radius of the analysis area around a street
pub const DEFAULT_ANALYSIS_BUFFER_M: Meters = 10.0;

/// Estimates the share of a street that lies in shadow
///
/// Street and caster geometries must share one metric coordinate system.
/// Shadow areas of all casters are summed without merging overlaps first,
/// so heavily overlapping shadows saturate at `1.0` instead of being
/// measured exactly.
#[derive(Debug, Clone, Copy)]
pub struct StreetShadeScorer {
    analysis_buffer_m: Meters,
}

impl Default for StreetShadeScorer {
    fn default() -> Self {
        Self::new(DEFAULT_ANALYSIS_BUFFER_M)
    }
}

impl StreetShadeScorer {
    pub fn new(analysis_buffer_m: Meters) -> Self {
        Self { analysis_buffer_m }
    }

    pub fn analysis_buffer_m(&self) -> Meters {
        self.analysis_buffer_m
    }

    /// Street polyline buffered by the analysis radius
    pub fn analysis_area(&self, street: &LineString<f64>) -> MultiPolygon<f64> {
        street.buffer(self.analysis_buffer_m)
    }

    /// Shade score of `street` against every given building and tree
    ///
    /// Returns `1.0` at night and `0.0` when the street itself cannot be
    /// analysed. Casters with broken geometry are skipped.
    pub fn score<'a, B, T>(
        &self,
        street: &LineString<f64>,
        buildings: B,
        trees: T,
        sun: &SunPosition,
    ) -> ShadeScore
    where
        B: IntoIterator<Item = &'a Building>,
        T: IntoIterator<Item = &'a Tree>,
    {
        if !sun.is_above_horizon() {
            return 1.0;
        }
        let area = self.analysis_area(street);
        self.score_area(&area, buildings, trees, sun)
    }

    /// Same as [`score`](Self::score) with candidates taken from `index`
    pub fn score_indexed(
        &self,
        street: &LineString<f64>,
        index: &CasterIndex,
        sun: &SunPosition,
    ) -> ShadeScore {
        if !sun.is_above_horizon() {
            return 1.0;
        }
        let area = self.analysis_area(street);
        let (buildings, trees) = match area.bounding_rect() {
            Some(envelope) => (index.buildings_in(envelope), index.trees_in(envelope)),
            None => (Vec::new(), Vec::new()),
        };
        self.score_area(&area, buildings, trees, sun)
    }

    fn score_area<'a, B, T>(
        &self,
        area: &MultiPolygon<f64>,
        buildings: B,
        trees: T,
        sun: &SunPosition,
    ) -> ShadeScore
    where
        B: IntoIterator<Item = &'a Building>,
        T: IntoIterator<Item = &'a Tree>,
    {
        match try_score_area(area, buildings, trees, sun) {
            Ok(score) => score,
            Err(err) => {
                warn!("Shade scoring failed, treating street as unshaded: {err}");
                0.0
            }
        }
    }
}

fn try_score_area<'a, B, T>(
    area: &MultiPolygon<f64>,
    buildings: B,
    trees: T,
    sun: &SunPosition,
) -> Result<ShadeScore, Error>
where
    B: IntoIterator<Item = &'a Building>,
    T: IntoIterator<Item = &'a Tree>,
{
    let total_area = area.unsigned_area();
    if !total_area.is_finite() || total_area <= 0.0 {
        return Err(Error::GeometryError(
            "street analysis area is empty".into(),
        ));
    }

    let building_shade: f64 = buildings
        .into_iter()
        .map(|building| shaded_area(building, area, sun))
        .sum();
    let tree_shade: f64 = trees
        .into_iter()
        .map(|tree| shaded_area(tree, area, sun))
        .sum();

    let score = (building_shade + tree_shade) / total_area;
    if score.is_nan() {
        return Err(Error::GeometryError("shaded area is not a number".into()));
    }
    Ok(score.clamp(0.0, 1.0))
}

/// Area of `area` covered by the caster's shadow, zero if it does not take part
fn shaded_area<C: ShadowCaster>(caster: &C, area: &MultiPolygon<f64>, sun: &SunPosition) -> f64 {
    if caster.height().is_none() || !caster.touches(area) {
        return 0.0;
    }

    match caster.cast_shadow(sun) {
        Ok(shadow) if shadow.0.is_empty() => 0.0,
        Ok(shadow) => {
            let covered = shadow.intersection(area).unsigned_area();
            if covered.is_finite() { covered } else { 0.0 }
        }
        Err(err) => {
            debug!("Skipping shadow source: {err}");
            0.0
        }
    }
}
