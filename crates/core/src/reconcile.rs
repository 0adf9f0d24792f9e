//! Turning drafts into create/update payloads.
//!
//! A draft lane that carries an `id` edits the persisted lane with that id;
//! every other draft is a new lane. Validation runs on the resolved payload,
//! so an edit is valid when the persisted fields it falls back on are.

use mapedit_protocol::{LaneCreate, LaneUpdate, MapDataPayload, PersistedLane, StopCreate};
use serde::{Deserialize, Serialize};

use crate::model::{DraftLane, DraftStop, LaneStyle};
use crate::validate::{ValidationError, validate_lane, validate_stop};

/// Everything one lane submission sends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaneSubmission {
    pub creates: Vec<LaneCreate>,
    pub updates: Vec<LaneUpdate>,
}

impl LaneSubmission {
    pub fn len(&self) -> usize {
        self.creates.len() + self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty()
    }
}

fn resolve_create(draft: &DraftLane, defaults: &LaneStyle) -> LaneCreate {
    let style = draft.style_or(defaults);
    LaneCreate {
        name: draft.name.clone(),
        description: draft.description.clone(),
        path: draft.path.clone(),
        color: style.color,
        weight: style.weight,
        opacity: style.opacity,
        service_id: draft.service_id.clone(),
        route_ids: draft.route_ids.clone(),
        is_active: draft.is_active,
    }
}

fn resolve_update(id: &str, draft: &DraftLane, persisted: &PersistedLane) -> LaneUpdate {
    let fallback = LaneStyle {
        color: persisted.color.clone(),
        weight: persisted.weight,
        opacity: persisted.opacity,
    };
    let style = draft.style_or(&fallback);
    let path = if draft.path.is_empty() {
        persisted.path.clone()
    } else {
        draft.path.clone()
    };
    let name = if draft.name.default_text().is_some() {
        draft.name.clone()
    } else {
        persisted.name.clone()
    };
    let description = if draft.description.is_empty() {
        persisted.description.clone()
    } else {
        draft.description.clone()
    };
    LaneUpdate {
        id: id.to_string(),
        fields: LaneCreate {
            name,
            description,
            path,
            color: style.color,
            weight: style.weight,
            opacity: style.opacity,
            service_id: draft
                .service_id
                .clone()
                .or_else(|| persisted.service_id.clone()),
            route_ids: draft.route_ids.clone(),
            is_active: draft.is_active,
        },
    }
}

/// Build and validate the lane submission. The first invalid draft aborts
/// the whole batch.
pub fn reconcile_lanes(
    drafts: &[DraftLane],
    persisted: &MapDataPayload,
    defaults: &LaneStyle,
) -> Result<LaneSubmission, ValidationError> {
    if drafts.is_empty() {
        return Err(ValidationError::NothingToSubmit);
    }

    let mut submission = LaneSubmission::default();
    for (i, draft) in drafts.iter().enumerate() {
        let position = i + 1;
        match &draft.id {
            Some(id) => {
                let Some(existing) = persisted.lane(id) else {
                    return Err(ValidationError::UnknownLane {
                        position,
                        id: id.clone(),
                    });
                };
                let update = resolve_update(id, draft, existing);
                validate_lane(position, &update.fields)?;
                submission.updates.push(update);
            }
            None => {
                let create = resolve_create(draft, defaults);
                validate_lane(position, &create)?;
                submission.creates.push(create);
            }
        }
    }
    Ok(submission)
}

pub fn reconcile_stops(drafts: &[DraftStop]) -> Result<Vec<StopCreate>, ValidationError> {
    if drafts.is_empty() {
        return Err(ValidationError::NothingToSubmit);
    }
    drafts
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let stop = StopCreate {
                name: d.name.clone(),
                latitude: d.latitude,
                longitude: d.longitude,
            };
            validate_stop(i + 1, &stop).map(|()| stop)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use mapedit_protocol::{Coordinate, LocalizedText};

    use super::*;

    fn persisted() -> MapDataPayload {
        MapDataPayload {
            lanes: vec![PersistedLane {
                id: "lane-1".into(),
                name: LocalizedText::en("Ring road"),
                description: LocalizedText::en("Outer ring"),
                path: vec![Coordinate::new(36.1, 44.0), Coordinate::new(36.2, 44.1)],
                color: "#FF0000".into(),
                weight: 3,
                opacity: 0.4,
                service_id: Some("svc-1".into()),
                service_icon: None,
                route_ids: BTreeSet::new(),
                is_active: true,
            }],
            ..MapDataPayload::default()
        }
    }

    fn named(name: &str, points: usize) -> DraftLane {
        DraftLane {
            name: LocalizedText::en(name),
            path: (0..points)
                .map(|i| Coordinate::new(36.0 + i as f64 * 0.01, 44.0))
                .collect(),
            is_active: true,
            ..DraftLane::default()
        }
    }

    #[test]
    fn routes_id_bearing_drafts_to_updates() {
        let mut edit = named("Ring road v2", 3);
        edit.id = Some("lane-1".into());
        let drafts = vec![named("New", 2), edit];
        let sub = reconcile_lanes(&drafts, &persisted(), &LaneStyle::default()).unwrap();
        assert_eq!(sub.creates.len(), 1);
        assert_eq!(sub.updates.len(), 1);
        assert_eq!(sub.updates[0].id, "lane-1");
        assert_eq!(sub.creates[0].color, "#0066CC");
    }

    #[test]
    fn update_falls_back_to_persisted_fields() {
        let edit = DraftLane {
            id: Some("lane-1".into()),
            is_active: false,
            ..DraftLane::default()
        };
        let sub = reconcile_lanes(&[edit], &persisted(), &LaneStyle::default()).unwrap();
        let fields = &sub.updates[0].fields;
        assert_eq!(fields.path.len(), 2);
        assert_eq!(fields.color, "#FF0000");
        assert_eq!(fields.weight, 3);
        assert_eq!(fields.opacity, 0.4);
        assert_eq!(fields.service_id.as_deref(), Some("svc-1"));
        assert_eq!(fields.name.default_text(), Some("Ring road"));
        assert_eq!(fields.description.default_text(), Some("Outer ring"));
        assert!(!fields.is_active);
    }

    #[test]
    fn unknown_lane_is_rejected() {
        let mut edit = named("x", 2);
        edit.id = Some("gone".into());
        let err = reconcile_lanes(&[edit], &persisted(), &LaneStyle::default()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownLane {
                position: 1,
                id: "gone".into()
            }
        );
    }

    #[test]
    fn first_invalid_lane_is_reported_by_position() {
        let drafts = vec![named("ok", 2), named("short", 1), named("", 2)];
        let err = reconcile_lanes(&drafts, &persisted(), &LaneStyle::default()).unwrap_err();
        assert_eq!(err, ValidationError::PathTooShort { position: 2, len: 1 });
    }

    #[test]
    fn empty_drafts_are_rejected() {
        assert_eq!(
            reconcile_lanes(&[], &persisted(), &LaneStyle::default()),
            Err(ValidationError::NothingToSubmit)
        );
        assert_eq!(reconcile_stops(&[]), Err(ValidationError::NothingToSubmit));
    }

    #[test]
    fn stops_are_range_checked() {
        let stops = vec![
            DraftStop {
                id: "t1".into(),
                latitude: 36.19,
                longitude: 44.01,
                name: Some("Citadel".into()),
            },
            DraftStop {
                id: "t2".into(),
                latitude: 36.19,
                longitude: 200.0,
                name: None,
            },
        ];
        assert!(matches!(
            reconcile_stops(&stops),
            Err(ValidationError::StopOutOfRange { position: 2, .. })
        ));
        let created = reconcile_stops(&stops[..1]).unwrap();
        assert_eq!(created[0].name.as_deref(), Some("Citadel"));
    }
}
