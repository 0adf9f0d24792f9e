use std::fmt;

use mapedit_protocol::Coordinate;

/// Identifies a lane for selection: persisted lanes by id, draft lanes by
/// their position in the draft array.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LaneKey {
    Persisted(String),
    Draft(usize),
}

impl fmt::Display for LaneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaneKey::Persisted(id) => f.write_str(id),
            LaneKey::Draft(index) => write!(f, "draft-lane-{index}"),
        }
    }
}

/// A vertex of a draft lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointRef {
    pub lane_index: usize,
    pub point_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaneSelection {
    Lane(LaneKey),
    Point(PointRef),
}

/// A persisted stop being repositioned, with the not-yet-saved position.
#[derive(Debug, Clone, PartialEq)]
pub struct EditingStop {
    pub stop_id: String,
    pub pending: Option<Coordinate>,
}

/// What the operator is pointing at.
///
/// The lane facet and the stop facet are independent; the editor mode
/// decides which one is meaningful.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    lane: Option<LaneSelection>,
    editing_stop: Option<EditingStop>,
}

impl Selection {
    pub fn lane(&self) -> Option<&LaneSelection> {
        self.lane.as_ref()
    }

    pub fn selected_point(&self) -> Option<PointRef> {
        match self.lane {
            Some(LaneSelection::Point(p)) => Some(p),
            _ => None,
        }
    }

    /// The lane key of whatever lane is selected, including the lane that
    /// owns a selected point.
    pub fn selected_lane_key(&self) -> Option<LaneKey> {
        match &self.lane {
            Some(LaneSelection::Lane(key)) => Some(key.clone()),
            Some(LaneSelection::Point(p)) => Some(LaneKey::Draft(p.lane_index)),
            None => None,
        }
    }

    pub fn editing_stop(&self) -> Option<&EditingStop> {
        self.editing_stop.as_ref()
    }

    pub fn select_lane(&mut self, key: LaneKey) {
        self.lane = Some(LaneSelection::Lane(key));
    }

    pub fn select_point(&mut self, lane_index: usize, point_index: usize) {
        self.lane = Some(LaneSelection::Point(PointRef {
            lane_index,
            point_index,
        }));
    }

    pub fn clear_lane(&mut self) {
        self.lane = None;
    }

    /// Drop a point selection; a whole-lane selection survives.
    pub fn clear_point(&mut self) {
        if matches!(self.lane, Some(LaneSelection::Point(_))) {
            self.lane = None;
        }
    }

    pub fn begin_stop_edit(&mut self, stop_id: impl Into<String>) {
        self.editing_stop = Some(EditingStop {
            stop_id: stop_id.into(),
            pending: None,
        });
    }

    /// Set the pending position of the stop being edited. Returns `false`
    /// when no stop with that id is in reposition mode.
    pub fn set_pending_stop_position(&mut self, stop_id: &str, coord: Coordinate) -> bool {
        match &mut self.editing_stop {
            Some(edit) if edit.stop_id == stop_id => {
                edit.pending = Some(coord);
                true
            }
            _ => false,
        }
    }

    pub fn clear_stop_edit(&mut self) {
        self.editing_stop = None;
    }

    pub fn clear(&mut self) {
        self.lane = None;
        self.editing_stop = None;
    }

    /// Fix up references after the draft lane at `index` was removed:
    /// references to it are dropped, references to later lanes shift down.
    pub fn on_draft_lane_removed(&mut self, index: usize) {
        let removed = match &mut self.lane {
            Some(LaneSelection::Lane(LaneKey::Draft(i)))
            | Some(LaneSelection::Point(PointRef { lane_index: i, .. })) => {
                let hit = *i == index;
                if *i > index {
                    *i -= 1;
                }
                hit
            }
            _ => false,
        };
        if removed {
            self.lane = None;
        }
    }

    /// Drop the reference if it no longer points into `lanes`, given each
    /// lane's path length.
    pub fn retain_valid(&mut self, path_lens: &[usize]) {
        let valid = match &self.lane {
            Some(LaneSelection::Point(p)) => path_lens
                .get(p.lane_index)
                .is_some_and(|len| p.point_index < *len),
            Some(LaneSelection::Lane(LaneKey::Draft(i))) => *i < path_lens.len(),
            _ => true,
        };
        if !valid {
            self.lane = None;
        }
    }

    /// Drop the stop edit if it targets `stop_id`.
    pub fn on_stop_removed(&mut self, stop_id: &str) {
        if self
            .editing_stop
            .as_ref()
            .is_some_and(|e| e.stop_id == stop_id)
        {
            self.editing_stop = None;
        }
    }
}
