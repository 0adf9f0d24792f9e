use std::time::{SystemTime, UNIX_EPOCH};

use mapedit_protocol::Coordinate;
use serde::{Deserialize, Serialize};

/// A stop held only in editor memory. `id` is a client-side temporary
/// identifier; the server assigns the real one on creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftStop {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub name: Option<String>,
}

impl DraftStop {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub fn set_coordinate(&mut self, coord: Coordinate) {
        self.latitude = coord.lat;
        self.longitude = coord.lng;
    }
}

/// Hands out time-based temporary stop ids. The sequence number keeps ids
/// unique when several stops are placed within the same millisecond.
#[derive(Debug, Default)]
pub struct StopIdGenerator {
    seq: u64,
}

impl StopIdGenerator {
    pub fn next_id(&mut self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        self.seq += 1;
        format!("draft-stop-{millis}-{}", self.seq)
    }
}
