//! Simplified solar geometry
//!
//! Declination follows Cooper's approximation and the hour angle is taken
//! from clock time on the configured standard-time meridian. Neither the
//! equation of time nor the observer's longitude within the time zone is
//! accounted for, so the result is invariant to longitude. Daylight saving
//! is not applied.

use std::f64::consts::PI;

use chrono::{Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::{Error, GeoPoint, Meters, RouterConfig};

/// Sun position in the sky, all angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SunPosition {
    /// Angle above the horizon, negative at night
    pub elevation: f64,
    /// Clockwise from north, only meaningful when the sun is above the horizon
    pub azimuth: f64,
    pub declination: f64,
    /// Negative before solar noon, positive after
    pub hour_angle: f64,
}

impl SunPosition {
    pub fn is_above_horizon(&self) -> bool {
        self.elevation > 0.0
    }

    /// Ground offset `(dx, dy)` in meters of the shadow cast by an object
    /// `height` meters tall. `None` when the sun is below the horizon.
    ///
    /// The offset has length `height / tan(elevation)` along
    /// `(sin(azimuth), cos(azimuth))`.
    pub fn shadow_offset(&self, height: Meters) -> Option<(f64, f64)> {
        if !self.is_above_horizon() {
            return None;
        }
        let length = height / self.elevation.to_radians().tan();
        let azimuth = self.azimuth.to_radians();
        Some((length * azimuth.sin(), length * azimuth.cos()))
    }
}

/// Seasonal weighting, 1.0 summer factor at the June solstice
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonalFactors {
    pub summer_factor: f64,
    pub winter_factor: f64,
    pub day_of_year: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct SunCalculator {
    latitude: f64,
    longitude: f64,
    utc_offset: FixedOffset,
}

impl SunCalculator {
    /// # Errors
    ///
    /// Returns an error if the observer is not a valid WGS84 position or
    /// the offset is outside ±14 hours
    pub fn new(observer: GeoPoint, utc_offset_hours: f64) -> Result<Self, Error> {
        if !observer.is_valid() {
            return Err(Error::InvalidInput(format!(
                "observer location out of range: {observer:?}"
            )));
        }
        #[allow(clippy::cast_possible_truncation)]
        let offset_seconds = (utc_offset_hours * 3600.0).round() as i32;
        let utc_offset = FixedOffset::east_opt(offset_seconds).ok_or_else(|| {
            Error::InvalidInput(format!("invalid UTC offset: {utc_offset_hours} h"))
        })?;

        Ok(Self {
            latitude: observer.lat,
            longitude: observer.lon,
            utc_offset,
        })
    }

    pub fn from_config(config: &RouterConfig) -> Result<Self, Error> {
        Self::new(config.observer, config.utc_offset_hours)
    }

    pub fn observer(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Sun position for a local standard date and time
    pub fn position(&self, date: NaiveDate, time: NaiveTime) -> SunPosition {
        let offset_seconds = self.utc_offset.local_minus_utc();
        let utc = NaiveDateTime::new(date, time) - chrono::TimeDelta::seconds(offset_seconds.into());

        let declination = declination(utc.ordinal());

        // clock hour on the standard meridian of the configured zone
        let utc_hour = f64::from(utc.hour())
            + f64::from(utc.minute()) / 60.0
            + f64::from(utc.second()) / 3600.0;
        let zone_hour = utc_hour + f64::from(offset_seconds) / 3600.0;
        let hour_angle = normalize_hour_angle(15.0 * (zone_hour - 12.0));

        let elevation = elevation(self.latitude, declination, hour_angle);
        let azimuth = azimuth(self.latitude, declination, hour_angle, elevation);

        SunPosition {
            elevation,
            azimuth,
            declination,
            hour_angle,
        }
    }

    /// Sun position for `YYYY-MM-DD` and `HH:MM` strings
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if either string is malformed
    pub fn position_at(&self, date: &str, time: &str) -> Result<SunPosition, Error> {
        Ok(self.position(parse_date(date)?, parse_time(time)?))
    }

    pub fn seasonal_factors(date: NaiveDate) -> SeasonalFactors {
        let day_of_year = date.ordinal();
        let summer_factor =
            0.5 * (1.0 + (2.0 * PI * (f64::from(day_of_year) - 172.0) / 365.0).cos());
        SeasonalFactors {
            summer_factor,
            winter_factor: 1.0 - summer_factor,
            day_of_year,
        }
    }
}

pub fn parse_date(date: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|e| Error::InvalidInput(format!("invalid date {date:?}, expected YYYY-MM-DD: {e}")))
}

pub fn parse_time(time: &str) -> Result<NaiveTime, Error> {
    NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .map_err(|e| Error::InvalidInput(format!("invalid time {time:?}, expected HH:MM: {e}")))
}

fn declination(day_of_year: u32) -> f64 {
    23.45 * (360.0 * (284.0 + f64::from(day_of_year)) / 365.0).to_radians().sin()
}

fn normalize_hour_angle(hour_angle: f64) -> f64 {
    (hour_angle + 180.0).rem_euclid(360.0) - 180.0
}

fn elevation(latitude: f64, declination: f64, hour_angle: f64) -> f64 {
    let lat = latitude.to_radians();
    let decl = declination.to_radians();
    let ha = hour_angle.to_radians();

    let sin_elevation = lat.sin() * decl.sin() + lat.cos() * decl.cos() * ha.cos();
    sin_elevation.clamp(-1.0, 1.0).asin().to_degrees()
}

fn azimuth(latitude: f64, declination: f64, hour_angle: f64, elevation: f64) -> f64 {
    if elevation <= 0.0 {
        return 0.0;
    }

    let lat = latitude.to_radians();
    let decl = declination.to_radians();
    let ha = hour_angle.to_radians();
    let cos_elevation = elevation.to_radians().cos();
    // sun at the zenith has no direction
    if cos_elevation <= f64::EPSILON {
        return 0.0;
    }

    let cos_azimuth = (decl.sin() * lat.cos() - decl.cos() * lat.sin() * ha.cos()) / cos_elevation;
    let mut azimuth = cos_azimuth.clamp(-1.0, 1.0).acos().to_degrees();

    // afternoon sun is west of the meridian
    if hour_angle > 0.0 {
        azimuth = 360.0 - azimuth;
    }
    azimuth.rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_york() -> SunCalculator {
        SunCalculator::new(GeoPoint::new(40.7128, -74.0060), -5.0).unwrap()
    }

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn summer_solstice_noon_is_high() {
        let sun = new_york().position(NaiveDate::from_ymd_opt(2024, 6, 21).unwrap(), noon());

        assert!(sun.elevation > 70.0, "elevation={:.2}", sun.elevation);
        assert!(sun.elevation < 90.0);
        assert!((sun.azimuth - 180.0).abs() < 1.0, "azimuth={:.2}", sun.azimuth);
    }

    #[test]
    fn winter_solstice_noon_is_low() {
        let sun = new_york().position(NaiveDate::from_ymd_opt(2024, 12, 21).unwrap(), noon());

        assert!(sun.elevation < 30.0, "elevation={:.2}", sun.elevation);
        assert!(sun.elevation > 20.0);
        assert!(sun.declination < -23.0);
    }

    #[test]
    fn position_does_not_depend_on_longitude() {
        let date = NaiveDate::from_ymd_opt(2024, 4, 3).unwrap();
        let time = NaiveTime::from_hms_opt(15, 30, 0).unwrap();

        let west = SunCalculator::new(GeoPoint::new(40.7128, -74.0060), -5.0).unwrap();
        let east = SunCalculator::new(GeoPoint::new(40.7128, 120.0), -5.0).unwrap();

        assert_eq!(west.position(date, time), east.position(date, time));
    }

    #[test]
    fn afternoon_sun_is_in_the_west() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
        let morning = new_york().position(date, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        let afternoon = new_york().position(date, NaiveTime::from_hms_opt(15, 0, 0).unwrap());

        assert!(morning.hour_angle < 0.0);
        assert!(morning.azimuth > 0.0 && morning.azimuth < 180.0);
        assert!(afternoon.hour_angle > 0.0);
        assert!(afternoon.azimuth > 180.0 && afternoon.azimuth < 360.0);
    }

    #[test]
    fn night_has_negative_elevation_and_zero_azimuth() {
        let sun = new_york().position(
            NaiveDate::from_ymd_opt(2024, 6, 21).unwrap(),
            NaiveTime::from_hms_opt(1, 0, 0).unwrap(),
        );

        assert!(sun.elevation < 0.0);
        assert_eq!(sun.azimuth, 0.0);
        assert!(!sun.is_above_horizon());
        assert!(sun.shadow_offset(10.0).is_none());
    }

    #[test]
    fn malformed_strings_are_invalid_input() {
        let calculator = new_york();

        assert!(matches!(
            calculator.position_at("2024-13-40", "12:00"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            calculator.position_at("2024-06-21", "noon"),
            Err(Error::InvalidInput(_))
        ));
        assert!(calculator.position_at("2024-06-21", "12:00").is_ok());
    }

    #[test]
    fn shadow_offset_vanishes_with_overhead_sun() {
        let sun = SunPosition {
            elevation: 89.999,
            azimuth: 135.0,
            declination: 0.0,
            hour_angle: 0.0,
        };
        let (dx, dy) = sun.shadow_offset(100.0).unwrap();
        assert!(dx.hypot(dy) < 0.01);
    }

    #[test]
    fn shadow_offset_length_at_45_degrees_equals_height() {
        let sun = SunPosition {
            elevation: 45.0,
            azimuth: 90.0,
            declination: 0.0,
            hour_angle: 0.0,
        };
        let (dx, dy) = sun.shadow_offset(30.0).unwrap();
        assert!((dx - 30.0).abs() < 1e-9);
        assert!(dy.abs() < 1e-9);
    }

    #[test]
    fn seasonal_factors_peak_at_june_solstice() {
        let june = SunCalculator::seasonal_factors(NaiveDate::from_ymd_opt(2023, 6, 21).unwrap());
        let december =
            SunCalculator::seasonal_factors(NaiveDate::from_ymd_opt(2023, 12, 21).unwrap());

        assert_eq!(june.day_of_year, 172);
        assert!((june.summer_factor - 1.0).abs() < 1e-9);
        assert!(december.summer_factor < 0.01);
        assert!((december.winter_factor + december.summer_factor - 1.0).abs() < 1e-12);
    }
}
