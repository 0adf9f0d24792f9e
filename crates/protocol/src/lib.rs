pub mod commands;
pub mod entities;
pub mod payloads;
pub mod theme;
pub mod types;

pub use commands::{MapCommand, MarkerKind};
pub use entities::{LocalizedText, MapDataPayload, MapSettings, PersistedLane, PersistedStop};
pub use payloads::{LaneCreate, LaneUpdate, StopCreate};
pub use theme::ThemeToken;
pub use types::{Coordinate, MapViewport, Point};
