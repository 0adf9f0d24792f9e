use mapedit_protocol::{Coordinate, LaneCreate, StopCreate};
use thiserror::Error;

pub const MIN_LANE_POINTS: usize = 2;
pub const WEIGHT_RANGE: std::ops::RangeInclusive<u8> = 1..=20;

/// A draft that cannot be submitted. Positions are 1-based, in draft-array
/// order, so they match what the operator sees in the sidebar.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("lane {position}: a name in the default language is required")]
    MissingName { position: usize },
    #[error("lane {position}: path needs at least 2 points, has {len}")]
    PathTooShort { position: usize, len: usize },
    #[error("lane {position}: point {point} ({lat}, {lng}) is outside valid coordinates")]
    LanePointOutOfRange {
        position: usize,
        point: usize,
        lat: f64,
        lng: f64,
    },
    #[error("lane {position}: color {color:?} is not a #RRGGBB value")]
    InvalidColor { position: usize, color: String },
    #[error("lane {position}: weight {weight} is outside 1-20")]
    InvalidWeight { position: usize, weight: u8 },
    #[error("lane {position}: opacity {opacity} is outside 0.0-1.0")]
    InvalidOpacity { position: usize, opacity: f64 },
    #[error("lane {position}: edits lane {id:?}, which no longer exists")]
    UnknownLane { position: usize, id: String },
    #[error("stop {position}: ({lat}, {lng}) is outside valid coordinates")]
    StopOutOfRange { position: usize, lat: f64, lng: f64 },
    #[error("position ({lat}, {lng}) is outside valid coordinates")]
    PositionOutOfRange { lat: f64, lng: f64 },
    #[error("there are no drafts to submit")]
    NothingToSubmit,
}

impl ValidationError {
    /// 1-based position of the offending draft, when there is one.
    pub fn position(&self) -> Option<usize> {
        match self {
            ValidationError::MissingName { position }
            | ValidationError::PathTooShort { position, .. }
            | ValidationError::LanePointOutOfRange { position, .. }
            | ValidationError::InvalidColor { position, .. }
            | ValidationError::InvalidWeight { position, .. }
            | ValidationError::InvalidOpacity { position, .. }
            | ValidationError::UnknownLane { position, .. }
            | ValidationError::StopOutOfRange { position, .. } => Some(*position),
            ValidationError::PositionOutOfRange { .. } | ValidationError::NothingToSubmit => None,
        }
    }
}

pub fn is_hex_color(s: &str) -> bool {
    s.len() == 7
        && s.starts_with('#')
        && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Check a fully resolved lane payload.
pub fn validate_lane(position: usize, lane: &LaneCreate) -> Result<(), ValidationError> {
    if lane.name.default_text().is_none() {
        return Err(ValidationError::MissingName { position });
    }
    if lane.path.len() < MIN_LANE_POINTS {
        return Err(ValidationError::PathTooShort {
            position,
            len: lane.path.len(),
        });
    }
    if let Some((point, c)) = lane.path.iter().enumerate().find(|(_, c)| !c.is_valid()) {
        return Err(ValidationError::LanePointOutOfRange {
            position,
            point: point + 1,
            lat: c.lat,
            lng: c.lng,
        });
    }
    if !is_hex_color(&lane.color) {
        return Err(ValidationError::InvalidColor {
            position,
            color: lane.color.clone(),
        });
    }
    if !WEIGHT_RANGE.contains(&lane.weight) {
        return Err(ValidationError::InvalidWeight {
            position,
            weight: lane.weight,
        });
    }
    if !(0.0..=1.0).contains(&lane.opacity) {
        return Err(ValidationError::InvalidOpacity {
            position,
            opacity: lane.opacity,
        });
    }
    Ok(())
}

pub fn validate_stop(position: usize, stop: &StopCreate) -> Result<(), ValidationError> {
    if !Coordinate::new(stop.latitude, stop.longitude).is_valid() {
        return Err(ValidationError::StopOutOfRange {
            position,
            lat: stop.latitude,
            lng: stop.longitude,
        });
    }
    Ok(())
}

pub fn validate_position(coord: Coordinate) -> Result<(), ValidationError> {
    if !coord.is_valid() {
        return Err(ValidationError::PositionOutOfRange {
            lat: coord.lat,
            lng: coord.lng,
        });
    }
    Ok(())
}
