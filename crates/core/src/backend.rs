//! The persistence boundary.
//!
//! The editor never talks to storage directly; frontends hand it a
//! [`MapBackend`]. [`MemoryBackend`] keeps everything in process and is what
//! the terminal frontend and the tests run against.

use mapedit_protocol::{
    LaneCreate, LaneUpdate, MapDataPayload, PersistedLane, PersistedStop, StopCreate,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// The operations the editor needs from the persistence layer. Each call
/// may fail; the editor turns failures into notices and keeps its drafts.
pub trait MapBackend {
    /// The current persisted lanes, stops and routes.
    fn fetch_map_data(&mut self) -> Result<MapDataPayload, BackendError>;

    fn bulk_create_lanes(&mut self, lanes: &[LaneCreate]) -> Result<Vec<PersistedLane>, BackendError>;

    fn bulk_update_lanes(&mut self, lanes: &[LaneUpdate]) -> Result<Vec<PersistedLane>, BackendError>;

    fn bulk_create_stops(&mut self, stops: &[StopCreate]) -> Result<Vec<PersistedStop>, BackendError>;

    fn update_stop_position(
        &mut self,
        id: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<PersistedStop, BackendError>;

    fn delete_stop(&mut self, id: &str) -> Result<(), BackendError>;
}

/// In-process backend. Ids are assigned as `lane-{n}` / `stop-{n}`.
///
/// `fail_next` makes the next mutating call fail with `Unavailable`, for
/// exercising error paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    data: MapDataPayload,
    next_id: u64,
    fail_next: Option<String>,
    calls: usize,
}

impl MemoryBackend {
    pub fn new(data: MapDataPayload) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    pub fn data(&self) -> &MapDataPayload {
        &self.data
    }

    pub fn into_data(self) -> MapDataPayload {
        self.data
    }

    /// Number of mutating calls received, including failed ones.
    pub fn mutation_calls(&self) -> usize {
        self.calls
    }

    pub fn fail_next(&mut self, reason: impl Into<String>) {
        self.fail_next = Some(reason.into());
    }

    fn begin_mutation(&mut self) -> Result<(), BackendError> {
        self.calls += 1;
        match self.fail_next.take() {
            Some(reason) => Err(BackendError::Unavailable(reason)),
            None => Ok(()),
        }
    }

    fn allocate(&mut self, kind: &str) -> String {
        loop {
            self.next_id += 1;
            let id = format!("{kind}-{}", self.next_id);
            let taken = self.data.lanes.iter().any(|l| l.id == id)
                || self.data.stops.iter().any(|s| s.id == id);
            if !taken {
                return id;
            }
        }
    }
}

fn persisted_lane(id: String, lane: &LaneCreate, service_icon: Option<String>) -> PersistedLane {
    PersistedLane {
        id,
        name: lane.name.clone(),
        description: lane.description.clone(),
        path: lane.path.clone(),
        color: lane.color.clone(),
        weight: lane.weight,
        opacity: lane.opacity,
        service_id: lane.service_id.clone(),
        service_icon,
        route_ids: lane.route_ids.clone(),
        is_active: lane.is_active,
    }
}

impl MapBackend for MemoryBackend {
    fn fetch_map_data(&mut self) -> Result<MapDataPayload, BackendError> {
        Ok(self.data.clone())
    }

    fn bulk_create_lanes(&mut self, lanes: &[LaneCreate]) -> Result<Vec<PersistedLane>, BackendError> {
        self.begin_mutation()?;
        let mut created = Vec::with_capacity(lanes.len());
        for lane in lanes {
            let id = self.allocate("lane");
            created.push(persisted_lane(id, lane, None));
        }
        self.data.lanes.extend(created.iter().cloned());
        Ok(created)
    }

    fn bulk_update_lanes(&mut self, lanes: &[LaneUpdate]) -> Result<Vec<PersistedLane>, BackendError> {
        self.begin_mutation()?;
        // All or nothing: check every id before touching anything.
        if let Some(missing) = lanes.iter().find(|u| self.data.lane(&u.id).is_none()) {
            return Err(BackendError::NotFound {
                kind: "lane",
                id: missing.id.clone(),
            });
        }
        let mut updated = Vec::with_capacity(lanes.len());
        for update in lanes {
            if let Some(slot) = self.data.lanes.iter_mut().find(|l| l.id == update.id) {
                *slot = persisted_lane(update.id.clone(), &update.fields, slot.service_icon.clone());
                updated.push(slot.clone());
            }
        }
        Ok(updated)
    }

    fn bulk_create_stops(&mut self, stops: &[StopCreate]) -> Result<Vec<PersistedStop>, BackendError> {
        self.begin_mutation()?;
        let mut created = Vec::with_capacity(stops.len());
        for stop in stops {
            created.push(PersistedStop {
                id: self.allocate("stop"),
                name: stop.name.clone(),
                latitude: stop.latitude,
                longitude: stop.longitude,
            });
        }
        self.data.stops.extend(created.iter().cloned());
        Ok(created)
    }

    fn update_stop_position(
        &mut self,
        id: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<PersistedStop, BackendError> {
        self.begin_mutation()?;
        let stop = self
            .data
            .stops
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| BackendError::NotFound {
                kind: "stop",
                id: id.to_string(),
            })?;
        stop.latitude = latitude;
        stop.longitude = longitude;
        Ok(stop.clone())
    }

    fn delete_stop(&mut self, id: &str) -> Result<(), BackendError> {
        self.begin_mutation()?;
        let before = self.data.stops.len();
        self.data.stops.retain(|s| s.id != id);
        if self.data.stops.len() == before {
            return Err(BackendError::NotFound {
                kind: "stop",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use mapedit_protocol::{Coordinate, LocalizedText};

    use super::*;

    fn lane(name: &str) -> LaneCreate {
        LaneCreate {
            name: LocalizedText::en(name),
            description: LocalizedText::default(),
            path: vec![Coordinate::new(36.19, 44.01), Coordinate::new(36.2, 44.02)],
            color: "#0066CC".into(),
            weight: 5,
            opacity: 0.8,
            service_id: None,
            route_ids: BTreeSet::new(),
            is_active: true,
        }
    }

    #[test]
    fn creates_assign_fresh_ids() {
        let mut backend = MemoryBackend::default();
        let created = backend.bulk_create_lanes(&[lane("a"), lane("b")]).unwrap();
        assert_eq!(created[0].id, "lane-1");
        assert_eq!(created[1].id, "lane-2");
        assert_eq!(backend.fetch_map_data().unwrap().lanes.len(), 2);
    }

    #[test]
    fn update_with_unknown_id_changes_nothing() {
        let mut backend = MemoryBackend::default();
        backend.bulk_create_lanes(&[lane("a")]).unwrap();
        let updates = vec![
            LaneUpdate {
                id: "lane-1".into(),
                fields: lane("renamed"),
            },
            LaneUpdate {
                id: "lane-9".into(),
                fields: lane("ghost"),
            },
        ];
        let err = backend.bulk_update_lanes(&updates).unwrap_err();
        assert!(matches!(err, BackendError::NotFound { .. }));
        assert_eq!(backend.data().lanes[0].name.default_text(), Some("a"));
    }

    #[test]
    fn injected_failure_is_one_shot() {
        let mut backend = MemoryBackend::default();
        backend.fail_next("offline");
        assert!(backend.bulk_create_lanes(&[lane("a")]).is_err());
        assert!(backend.bulk_create_lanes(&[lane("a")]).is_ok());
        assert_eq!(backend.mutation_calls(), 2);
    }

    #[test]
    fn stop_lifecycle() {
        let mut backend = MemoryBackend::default();
        let stops = backend
            .bulk_create_stops(&[StopCreate {
                name: None,
                latitude: 36.19,
                longitude: 44.01,
            }])
            .unwrap();
        let id = stops[0].id.clone();
        let moved = backend.update_stop_position(&id, 36.2, 44.0).unwrap();
        assert_eq!(moved.latitude, 36.2);
        backend.delete_stop(&id).unwrap();
        assert!(matches!(
            backend.delete_stop(&id),
            Err(BackendError::NotFound { .. })
        ));
    }
}
