use serde::{Deserialize, Serialize};

use crate::theme::ThemeToken;
use crate::types::Point;

/// What a marker represents. Renderers pick glyphs/icons from this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerKind {
    LaneStart,
    LaneEnd,
    LanePoint,
    Stop,
    DraftStop,
    RepositionStop,
}

/// A single, stateless map render instruction, in screen space.
///
/// The core emits a `Vec<MapCommand>` for the overlay. Renderers consume the
/// list sequentially; each command carries all the data it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapCommand {
    /// A lane polyline. `lane_key` is the selection key of the lane
    /// (`"draft-lane-{i}"` for drafts, the persisted id otherwise).
    DrawPolyline {
        points: Vec<Point>,
        /// `#RRGGBB` as stored on the lane.
        color: String,
        token: ThemeToken,
        weight: f64,
        opacity: f64,
        lane_key: String,
    },

    /// A point marker. `lane_point` is `(lane_index, point_index)` for
    /// draft-lane vertices, for hit-testing; `stop_id` is set for stops.
    DrawMarker {
        position: Point,
        kind: MarkerKind,
        token: ThemeToken,
        radius: f64,
        icon: Option<String>,
        lane_point: Option<(usize, usize)>,
        stop_id: Option<String>,
    },

    /// A text label anchored at a position.
    DrawLabel {
        position: Point,
        text: String,
        token: ThemeToken,
    },

    /// Begin a logical layer (persisted, drafts, stops).
    BeginGroup { id: String },

    /// End the current layer.
    EndGroup,
}
