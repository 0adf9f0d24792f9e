use std::collections::BTreeSet;

use mapedit_protocol::{Coordinate, LocalizedText, PersistedLane};
use serde::{Deserialize, Serialize};

/// Stroke style for a lane polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneStyle {
    /// `#RRGGBB`.
    pub color: String,
    /// Stroke width, 1–20.
    pub weight: u8,
    /// 0.0–1.0.
    pub opacity: f64,
}

impl Default for LaneStyle {
    fn default() -> Self {
        Self {
            color: "#0066CC".to_string(),
            weight: 5,
            opacity: 0.8,
        }
    }
}

/// A lane held only in editor memory.
///
/// `id` is set only when the draft was loaded from a persisted lane; a draft
/// without one becomes a new lane on submission. Style fields left as `None`
/// fall back to the persisted lane (edits) or the default style (creates).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DraftLane {
    pub id: Option<String>,
    pub path: Vec<Coordinate>,
    pub color: Option<String>,
    pub weight: Option<u8>,
    pub opacity: Option<f64>,
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub service_id: Option<String>,
    pub route_ids: BTreeSet<String>,
    pub is_active: bool,
}

impl DraftLane {
    /// A new, unnamed lane with the given style and path.
    pub fn new(style: &LaneStyle, path: Vec<Coordinate>) -> Self {
        Self {
            id: None,
            path,
            color: Some(style.color.clone()),
            weight: Some(style.weight),
            opacity: Some(style.opacity),
            is_active: true,
            ..Self::default()
        }
    }

    /// Copy every persisted field into a draft so it can be edited.
    pub fn from_persisted(lane: &PersistedLane) -> Self {
        Self {
            id: Some(lane.id.clone()),
            path: lane.path.clone(),
            color: Some(lane.color.clone()),
            weight: Some(lane.weight),
            opacity: Some(lane.opacity),
            name: lane.name.clone(),
            description: lane.description.clone(),
            service_id: lane.service_id.clone(),
            route_ids: lane.route_ids.clone(),
            is_active: lane.is_active,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn start(&self) -> Option<Coordinate> {
        self.path.first().copied()
    }

    pub fn end(&self) -> Option<Coordinate> {
        self.path.last().copied()
    }

    /// Effective style, filling gaps from `fallback`.
    pub fn style_or(&self, fallback: &LaneStyle) -> LaneStyle {
        LaneStyle {
            color: self.color.clone().unwrap_or_else(|| fallback.color.clone()),
            weight: self.weight.unwrap_or(fallback.weight),
            opacity: self.opacity.unwrap_or(fallback.opacity),
        }
    }
}

/// A partial update from the lane properties form. `None` leaves the field
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LanePatch {
    pub name: Option<LocalizedText>,
    pub description: Option<LocalizedText>,
    pub color: Option<String>,
    pub weight: Option<u8>,
    pub opacity: Option<f64>,
    pub service_id: Option<Option<String>>,
    pub route_ids: Option<BTreeSet<String>>,
    pub is_active: Option<bool>,
}

impl LanePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, lane: &mut DraftLane) {
        if let Some(name) = &self.name {
            lane.name = name.clone();
        }
        if let Some(description) = &self.description {
            lane.description = description.clone();
        }
        if let Some(color) = &self.color {
            lane.color = Some(color.clone());
        }
        if let Some(weight) = self.weight {
            lane.weight = Some(weight);
        }
        if let Some(opacity) = self.opacity {
            lane.opacity = Some(opacity);
        }
        if let Some(service_id) = &self.service_id {
            lane.service_id = service_id.clone();
        }
        if let Some(route_ids) = &self.route_ids {
            lane.route_ids = route_ids.clone();
        }
        if let Some(is_active) = self.is_active {
            lane.is_active = is_active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_lane_uses_default_style() {
        let lane = DraftLane::new(&LaneStyle::default(), vec![Coordinate::new(36.19, 44.01)]);
        assert!(lane.is_new());
        assert_eq!(lane.color.as_deref(), Some("#0066CC"));
        assert_eq!(lane.weight, Some(5));
        assert_eq!(lane.opacity, Some(0.8));
        assert!(lane.is_active);
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut lane = DraftLane::new(&LaneStyle::default(), Vec::new());
        let patch = LanePatch {
            name: Some(LocalizedText::en("Line 3")),
            weight: Some(9),
            ..LanePatch::default()
        };
        patch.apply(&mut lane);
        assert_eq!(lane.name.default_text(), Some("Line 3"));
        assert_eq!(lane.weight, Some(9));
        assert_eq!(lane.color.as_deref(), Some("#0066CC"));
    }

    #[test]
    fn style_falls_back_per_field() {
        let lane = DraftLane {
            weight: Some(12),
            ..DraftLane::default()
        };
        let style = lane.style_or(&LaneStyle::default());
        assert_eq!(style.weight, 12);
        assert_eq!(style.color, "#0066CC");
    }
}
