use std::path::Path;

use mapedit_protocol::{Coordinate, MapSettings};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::model::LaneStyle;
use crate::validate::{WEIGHT_RANGE, is_hex_color};

/// Erbil city center.
pub const FALLBACK_CENTER: Coordinate = Coordinate::new(36.1911, 44.0092);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Editor tuning. Every field has a default, so `{}` is a valid config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    pub default_center: Coordinate,
    /// Snapshots kept per history.
    pub history_limit: usize,
    /// Style given to lanes started on the map.
    pub default_lane_style: LaneStyle,
    /// How close (in degrees) a pick must be to grab a lane vertex.
    pub point_pick_tolerance_deg: f64,
    /// Degrees of longitude visible at startup.
    pub initial_lng_span: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_center: FALLBACK_CENTER,
            history_limit: DEFAULT_HISTORY_LIMIT,
            default_lane_style: LaneStyle::default(),
            point_pick_tolerance_deg: 0.002,
            initial_lng_span: 0.12,
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.history_limit == 0 {
            return Err(ConfigError::Invalid("historyLimit must be at least 1".into()));
        }
        if !self.default_center.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "defaultCenter {:?} is outside valid coordinates",
                self.default_center
            )));
        }
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.point_pick_tolerance_deg) || !positive(self.initial_lng_span) {
            return Err(ConfigError::Invalid(
                "pointPickToleranceDeg and initialLngSpan must be positive".into(),
            ));
        }
        let style = &self.default_lane_style;
        if !is_hex_color(&style.color) {
            return Err(ConfigError::Invalid(format!(
                "defaultLaneStyle.color {:?} is not a #RRGGBB value",
                style.color
            )));
        }
        if !WEIGHT_RANGE.contains(&style.weight) {
            return Err(ConfigError::Invalid(format!(
                "defaultLaneStyle.weight {} is outside 1-20",
                style.weight
            )));
        }
        if !(0.0..=1.0).contains(&style.opacity) {
            return Err(ConfigError::Invalid(format!(
                "defaultLaneStyle.opacity {} is outside 0.0-1.0",
                style.opacity
            )));
        }
        Ok(())
    }

    /// Where the map opens: the settings center when it is usable, else the
    /// configured default.
    pub fn initial_center(&self, settings: &MapSettings) -> Coordinate {
        settings
            .map_center
            .filter(Coordinate::is_valid)
            .unwrap_or(self.default_center)
    }
}
