//! A [`MapBackend`] that persists to a JSON file after every successful
//! mutation.

use std::path::{Path, PathBuf};

use mapedit_core::{BackendError, MapBackend, MemoryBackend};
use mapedit_protocol::{
    LaneCreate, LaneUpdate, MapDataPayload, PersistedLane, PersistedStop, StopCreate,
};
use tracing::debug;

pub struct JsonFileBackend {
    path: PathBuf,
    inner: MemoryBackend,
}

impl JsonFileBackend {
    /// Load `path`, or start empty when it does not exist yet.
    pub fn open(path: &Path) -> Result<Self, BackendError> {
        let data = if path.exists() {
            let text = std::fs::read_to_string(path)?;
            serde_json::from_str(&text)?
        } else {
            MapDataPayload::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            inner: MemoryBackend::new(data),
        })
    }

    pub fn snapshot(&self) -> MapDataPayload {
        self.inner.data().clone()
    }

    /// Apply `op` to a copy of the store and swap the copy in only once it
    /// is on disk. A failed write leaves memory and file as they were.
    fn commit<T>(
        &mut self,
        op: impl FnOnce(&mut MemoryBackend) -> Result<T, BackendError>,
    ) -> Result<T, BackendError> {
        let mut next = self.inner.clone();
        let out = op(&mut next)?;
        let json = serde_json::to_string_pretty(next.data())?;
        std::fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), "map data written");
        self.inner = next;
        Ok(out)
    }
}

impl MapBackend for JsonFileBackend {
    fn fetch_map_data(&mut self) -> Result<MapDataPayload, BackendError> {
        self.inner.fetch_map_data()
    }

    fn bulk_create_lanes(&mut self, lanes: &[LaneCreate]) -> Result<Vec<PersistedLane>, BackendError> {
        self.commit(|store| store.bulk_create_lanes(lanes))
    }

    fn bulk_update_lanes(&mut self, lanes: &[LaneUpdate]) -> Result<Vec<PersistedLane>, BackendError> {
        self.commit(|store| store.bulk_update_lanes(lanes))
    }

    fn bulk_create_stops(&mut self, stops: &[StopCreate]) -> Result<Vec<PersistedStop>, BackendError> {
        self.commit(|store| store.bulk_create_stops(stops))
    }

    fn update_stop_position(
        &mut self,
        id: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<PersistedStop, BackendError> {
        self.commit(|store| store.update_stop_position(id, latitude, longitude))
    }

    fn delete_stop(&mut self, id: &str) -> Result<(), BackendError> {
        self.commit(|store| store.delete_stop(id))
    }
}
