use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::Coordinate;

/// A user-facing string with one variant per supported language.
/// `en` is the default language and the one validation looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalizedText {
    pub en: Option<String>,
    pub ar: Option<String>,
    pub ckb: Option<String>,
}

impl LocalizedText {
    pub fn en(text: impl Into<String>) -> Self {
        Self {
            en: Some(text.into()),
            ..Self::default()
        }
    }

    /// The default-language variant, trimmed, if non-empty.
    pub fn default_text(&self) -> Option<&str> {
        self.en.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        [&self.en, &self.ar, &self.ckb]
            .iter()
            .all(|v| v.as_deref().is_none_or(|s| s.trim().is_empty()))
    }
}

/// A bus lane as stored by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedLane {
    pub id: String,
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    pub path: Vec<Coordinate>,
    pub color: String,
    pub weight: u8,
    pub opacity: f64,
    #[serde(default)]
    pub service_id: Option<String>,
    /// Marker icon of the owning transport service, drawn at lane endpoints.
    #[serde(default)]
    pub service_icon: Option<String>,
    #[serde(default)]
    pub route_ids: BTreeSet<String>,
    pub is_active: bool,
}

/// A bus stop as stored by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedStop {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl PersistedStop {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// The persisted snapshot rendered underneath the drafts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapDataPayload {
    pub lanes: Vec<PersistedLane>,
    pub stops: Vec<PersistedStop>,
    pub route_ids: Vec<String>,
}

impl MapDataPayload {
    pub fn lane(&self, id: &str) -> Option<&PersistedLane> {
        self.lanes.iter().find(|l| l.id == id)
    }

    pub fn stop(&self, id: &str) -> Option<&PersistedStop> {
        self.stops.iter().find(|s| s.id == id)
    }
}

/// Application settings relevant to the map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapSettings {
    pub map_center: Option<Coordinate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_text_ignores_blank() {
        assert_eq!(LocalizedText::en("  ").default_text(), None);
        assert_eq!(LocalizedText::en(" Line 1 ").default_text(), Some("Line 1"));
        let only_ar = LocalizedText {
            ar: Some("خط".into()),
            ..LocalizedText::default()
        };
        assert_eq!(only_ar.default_text(), None);
        assert!(!only_ar.is_empty());
    }

    #[test]
    fn persisted_lane_parses_camel_case() {
        let json = r##"{
            "id": "lane-1",
            "name": { "en": "Ring road" },
            "path": [[36.19, 44.01], [36.2, 44.02]],
            "color": "#FF0000",
            "weight": 4,
            "opacity": 0.5,
            "serviceId": "svc-1",
            "routeIds": ["r1"],
            "isActive": true
        }"##;
        let lane: PersistedLane = serde_json::from_str(json).unwrap();
        assert_eq!(lane.path.len(), 2);
        assert_eq!(lane.service_id.as_deref(), Some("svc-1"));
        assert!(lane.route_ids.contains("r1"));
        assert!(lane.description.is_empty());
    }
}
