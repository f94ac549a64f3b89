use geo::{Area, BooleanOps, MultiPolygon, Polygon, Translate, Validation};

use crate::{Error, Meters, SunPosition};

/// Ground shadow of an object with `footprint` and `height_m`
///
/// The shadow is the union of the footprint and the footprint translated by
/// [`SunPosition::shadow_offset`]. This is a single-translation stand-in for
/// a 3-D shadow on flat ground: terrain, roof shape and occlusion by other
/// objects are ignored. With the sun below the horizon the result is empty.
///
/// # Errors
///
/// Returns [`Error::GeometryError`] for a non-positive height or an invalid
/// footprint.
pub fn project_shadow(
    footprint: &Polygon<f64>,
    height_m: Meters,
    sun: &SunPosition,
) -> Result<MultiPolygon<f64>, Error> {
    let Some((dx, dy)) = sun.shadow_offset(height_m) else {
        return Ok(MultiPolygon::new(vec![]));
    };

    if !height_m.is_finite() || height_m <= 0.0 {
        return Err(Error::GeometryError(format!(
            "shadow height must be positive, got {height_m}"
        )));
    }
    if !dx.is_finite() || !dy.is_finite() {
        return Err(Error::GeometryError(format!(
            "non-finite shadow offset for elevation {}",
            sun.elevation
        )));
    }
    if !footprint.is_valid() || footprint.unsigned_area() <= 0.0 {
        return Err(Error::GeometryError("invalid or empty footprint".into()));
    }

    let translated = footprint.translate(dx, dy);
    Ok(footprint.union(&translated))
}
