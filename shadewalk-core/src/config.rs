//! Router configuration and routing weight blends

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, GeoPoint, Meters, ShadeScore};

/// Relative importance of shade and distance in the edge cost
///
/// The two weights are independent non-negative factors, they do not have
/// to sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightBlend {
    pub shade_weight: f64,
    pub time_weight: f64,
}

impl WeightBlend {
    pub const fn new(shade_weight: f64, time_weight: f64) -> Self {
        Self {
            shade_weight,
            time_weight,
        }
    }

    /// Cost of traversing an edge: `time·length + shade·(1 − shade_score)·length`
    pub fn combined_weight(&self, length: Meters, shade_score: ShadeScore) -> f64 {
        let sun_exposure = 1.0 - shade_score;
        self.time_weight * length + self.shade_weight * sun_exposure * length
    }

    /// Human readable tag, e.g. `shade:0.8, time:0.2`
    pub fn label(&self) -> String {
        format!(
            "shade:{:.1}, time:{:.1}",
            self.shade_weight, self.time_weight
        )
    }

    pub fn validate(&self) -> Result<(), Error> {
        for (name, value) in [
            ("shade_weight", self.shade_weight),
            ("time_weight", self.time_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for WeightBlend {
    fn default() -> Self {
        Self::new(0.6, 0.4)
    }
}

impl fmt::Display for WeightBlend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Settings shared by every query of a [`ShadeRouter`](crate::ShadeRouter)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Location the sun position is computed for
    pub observer: GeoPoint,
    /// Fixed standard-time offset from UTC, daylight saving is not applied
    pub utc_offset_hours: f64,
    /// Blend used for the primary route
    pub blend: WeightBlend,
    /// Ordered blends tried when generating alternatives
    pub alternative_blends: Vec<WeightBlend>,
    /// Radius of the area around a street that is checked for shadows
    pub analysis_buffer_m: Meters,
    /// Tree height as a multiple of canopy diameter
    pub tree_height_factor: f64,
    /// Query points farther than this from every street node are rejected
    pub max_snap_distance_m: Meters,
    /// Routes longer than this are reported with a warning
    pub max_distance_km: Option<f64>,
    /// Minimum shade score for an edge to count as shady
    pub shade_threshold: ShadeScore,
    /// Decimal places kept when matching street endpoints into nodes
    pub node_precision: u32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            observer: GeoPoint::new(40.7128, -74.0060),
            utc_offset_hours: -5.0,
            blend: WeightBlend::default(),
            alternative_blends: vec![
                WeightBlend::new(0.8, 0.2),
                WeightBlend::new(0.2, 0.8),
                WeightBlend::new(0.5, 0.5),
            ],
            analysis_buffer_m: 10.0,
            tree_height_factor: crate::model::TREE_HEIGHT_FACTOR,
            max_snap_distance_m: 1000.0,
            max_distance_km: Some(50.0),
            shade_threshold: 0.3,
            node_precision: 7,
        }
    }
}

impl RouterConfig {
    /// Parses a TOML document, missing keys take their default values
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or fails validation
    pub fn from_toml_str(content: &str) -> Result<Self, Error> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its content is invalid
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !self.observer.is_valid() {
            return Err(Error::InvalidConfig(format!(
                "observer location out of range: {:?}",
                self.observer
            )));
        }
        if !self.utc_offset_hours.is_finite() || self.utc_offset_hours.abs() > 14.0 {
            return Err(Error::InvalidConfig(format!(
                "utc_offset_hours must be within ±14, got {}",
                self.utc_offset_hours
            )));
        }

        self.blend.validate()?;
        for blend in &self.alternative_blends {
            blend.validate()?;
        }

        for (name, value) in [
            ("analysis_buffer_m", self.analysis_buffer_m),
            ("tree_height_factor", self.tree_height_factor),
            ("max_snap_distance_m", self.max_snap_distance_m),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        if let Some(max) = self.max_distance_km {
            if !max.is_finite() || max <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "max_distance_km must be positive, got {max}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.shade_threshold) {
            return Err(Error::InvalidConfig(format!(
                "shade_threshold must be within [0, 1], got {}",
                self.shade_threshold
            )));
        }
        if self.node_precision > 12 {
            return Err(Error::InvalidConfig(format!(
                "node_precision above 12 decimals is not supported, got {}",
                self.node_precision
            )));
        }

        Ok(())
    }
}
