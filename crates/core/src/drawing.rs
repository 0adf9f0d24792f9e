//! Drawing primitives for draft lanes.
//!
//! Each primitive takes the current draft array and returns the next one;
//! nothing here records history. The owning [`crate::MapEditor`] applies the
//! result and records it, so every observable change is recorded exactly
//! once, by the owner.

use mapedit_protocol::Coordinate;

use crate::model::{DraftLane, LaneStyle};
use crate::selection::PointRef;

/// Which interaction a map click performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    #[default]
    Lane,
    Stop,
}

impl EditorMode {
    pub fn toggled(self) -> Self {
        match self {
            EditorMode::Lane => EditorMode::Stop,
            EditorMode::Stop => EditorMode::Lane,
        }
    }
}

/// What a map click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickEffect {
    StopPlaced { stop_id: String },
    LaneStarted { lane_index: usize },
    PointAppended(PointRef),
    Ignored,
}

/// Result of a vertex edit.
#[derive(Debug, Clone, PartialEq)]
pub enum PointEdit {
    Applied(Vec<DraftLane>),
    /// The reference does not point into the array. Ignored silently.
    OutOfRange,
    /// Removing the vertex would leave the lane without a path.
    LastPoint,
}

/// Append a clicked coordinate: the first click creates a lane, later
/// clicks extend the most recently added lane.
pub fn append_click_point(
    lanes: &[DraftLane],
    coord: Coordinate,
    style: &LaneStyle,
) -> (Vec<DraftLane>, ClickEffect) {
    let mut next = lanes.to_vec();
    match next.last_mut() {
        None => {
            next.push(DraftLane::new(style, vec![coord]));
            (next, ClickEffect::LaneStarted { lane_index: 0 })
        }
        Some(lane) => {
            lane.path.push(coord);
            let point = PointRef {
                lane_index: lanes.len() - 1,
                point_index: lane.path.len() - 1,
            };
            (next, ClickEffect::PointAppended(point))
        }
    }
}

/// Move one vertex.
pub fn move_point(lanes: &[DraftLane], at: PointRef, coord: Coordinate) -> PointEdit {
    let in_range = lanes
        .get(at.lane_index)
        .is_some_and(|l| at.point_index < l.path.len());
    if !in_range {
        return PointEdit::OutOfRange;
    }
    let mut next = lanes.to_vec();
    next[at.lane_index].path[at.point_index] = coord;
    PointEdit::Applied(next)
}

/// Remove one vertex. A lane always keeps at least one point.
pub fn delete_point(lanes: &[DraftLane], at: PointRef) -> PointEdit {
    let Some(lane) = lanes.get(at.lane_index) else {
        return PointEdit::OutOfRange;
    };
    if at.point_index >= lane.path.len() {
        return PointEdit::OutOfRange;
    }
    if lane.path.len() == 1 {
        return PointEdit::LastPoint;
    }
    let mut next = lanes.to_vec();
    next[at.lane_index].path.remove(at.point_index);
    PointEdit::Applied(next)
}

/// Insert a vertex before `at.point_index`; an index equal to the path
/// length appends.
pub fn insert_point(lanes: &[DraftLane], at: PointRef, coord: Coordinate) -> PointEdit {
    let in_range = lanes
        .get(at.lane_index)
        .is_some_and(|l| at.point_index <= l.path.len());
    if !in_range {
        return PointEdit::OutOfRange;
    }
    let mut next = lanes.to_vec();
    next[at.lane_index].path.insert(at.point_index, coord);
    PointEdit::Applied(next)
}

/// The draft vertex closest to `coord`, if any lies within `tolerance`
/// degrees. Later lanes win ties since they are drawn on top.
pub fn nearest_draft_point(lanes: &[DraftLane], coord: Coordinate, tolerance: f64) -> Option<PointRef> {
    let mut best: Option<(f64, PointRef)> = None;
    for (lane_index, lane) in lanes.iter().enumerate() {
        for (point_index, p) in lane.path.iter().enumerate() {
            let d = p.degree_distance(&coord);
            if d > tolerance {
                continue;
            }
            if best.is_none_or(|(bd, _)| d <= bd) {
                best = Some((
                    d,
                    PointRef {
                        lane_index,
                        point_index,
                    },
                ));
            }
        }
    }
    best.map(|(_, p)| p)
}
