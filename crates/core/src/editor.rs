//! The map editor state owner.
//!
//! [`MapEditor`] is the single writer for draft lanes, draft stops, their
//! histories and the selection. Frontends forward pointer events and button
//! presses to it and render from its accessors; they never mutate drafts
//! themselves.

use mapedit_protocol::{Coordinate, MapDataPayload, MapSettings};
use thiserror::Error;
use tracing::{debug, warn};

use crate::backend::BackendError;
use crate::config::EditorConfig;
use crate::drawing::{self, ClickEffect, EditorMode, PointEdit};
use crate::history::{ChangeOrigin, History};
use crate::model::{DraftKind, DraftLane, DraftStop, LanePatch, StopIdGenerator};
use crate::selection::{LaneKey, PointRef, Selection};
use crate::submit::{PendingOp, SubmissionPhase};
use crate::validate::ValidationError;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("lane {} needs at least one point; remove the lane instead", .lane_index + 1)]
    LastPoint { lane_index: usize },
    #[error("no point is selected")]
    NoPointSelected,
    #[error("{0} is already in progress")]
    Busy(PendingOp),
    #[error("nothing is being submitted")]
    NotSubmitting,
    #[error("lane {0} not found")]
    UnknownLane(String),
    #[error("stop {0} not found")]
    UnknownStop(String),
    #[error("no stop is being repositioned")]
    NotEditingStop,
    #[error("stop {0} has not been moved")]
    NoPendingPosition(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A transient, user-facing message (a toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

pub struct MapEditor {
    pub(crate) config: EditorConfig,
    mode: EditorMode,
    drawing_enabled: bool,
    pub(crate) lanes: Vec<DraftLane>,
    pub(crate) stops: Vec<DraftStop>,
    pub(crate) lane_history: History<Vec<DraftLane>>,
    pub(crate) stop_history: History<Vec<DraftStop>>,
    pub(crate) selection: Selection,
    pub(crate) persisted: MapDataPayload,
    stop_ids: StopIdGenerator,
    notices: Vec<Notice>,
    pub(crate) phase: SubmissionPhase,
    pub(crate) submit_dialog_open: bool,
    pub(crate) needs_refetch: bool,
    center: Coordinate,
}

impl MapEditor {
    pub fn new(config: EditorConfig, persisted: MapDataPayload, settings: &MapSettings) -> Self {
        let center = config.initial_center(settings);
        Self {
            lane_history: History::new(config.history_limit),
            stop_history: History::new(config.history_limit),
            config,
            mode: EditorMode::Lane,
            drawing_enabled: true,
            lanes: Vec::new(),
            stops: Vec::new(),
            selection: Selection::default(),
            persisted,
            stop_ids: StopIdGenerator::default(),
            notices: Vec::new(),
            phase: SubmissionPhase::Idle,
            submit_dialog_open: false,
            needs_refetch: false,
            center,
        }
    }

    // --- Accessors ---

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn drawing_enabled(&self) -> bool {
        self.drawing_enabled
    }

    pub fn draft_lanes(&self) -> &[DraftLane] {
        &self.lanes
    }

    pub fn draft_stops(&self) -> &[DraftStop] {
        &self.stops
    }

    pub fn lane_history(&self) -> &History<Vec<DraftLane>> {
        &self.lane_history
    }

    pub fn stop_history(&self) -> &History<Vec<DraftStop>> {
        &self.stop_history
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn persisted(&self) -> &MapDataPayload {
        &self.persisted
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn has_drafts(&self) -> bool {
        !self.lanes.is_empty() || !self.stops.is_empty()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Hand pending notices to the frontend for display.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub(crate) fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
    }

    /// Log, surface as a notice, and hand the error back to the caller.
    pub(crate) fn reject(&mut self, err: EditorError) -> EditorError {
        warn!(error = %err, "editor action rejected");
        self.notify(NoticeLevel::Error, err.to_string());
        err
    }

    /// Refuse to touch drafts of `kind` while a save of that kind is in
    /// flight.
    fn ensure_unlocked(&mut self, kind: DraftKind) -> Result<(), EditorError> {
        match self.phase {
            SubmissionPhase::Submitting(op) if op.locks(kind) => {
                Err(self.reject(EditorError::Busy(op)))
            }
            _ => Ok(()),
        }
    }

    // --- Mode ---

    /// Switching mode clears the whole selection, so no lane point or stop
    /// reference leaks into the other mode.
    pub fn set_mode(&mut self, mode: EditorMode) {
        if self.mode != mode {
            debug!(?mode, "editor mode changed");
            self.mode = mode;
            self.selection.clear();
        }
    }

    pub fn toggle_mode(&mut self) {
        self.set_mode(self.mode.toggled());
    }

    pub fn set_drawing_enabled(&mut self, enabled: bool) {
        self.drawing_enabled = enabled;
    }

    // --- Draft store ---

    /// Replace the draft lanes. Every lane change goes through here, so
    /// history order matches the order of changes.
    pub fn set_draft_lanes(&mut self, lanes: Vec<DraftLane>, origin: ChangeOrigin) {
        self.lanes = lanes;
        self.lane_history.record(&self.lanes, origin);
        let lens: Vec<usize> = self.lanes.iter().map(|l| l.path.len()).collect();
        self.selection.retain_valid(&lens);
    }

    pub fn set_draft_stops(&mut self, stops: Vec<DraftStop>, origin: ChangeOrigin) {
        self.stops = stops;
        self.stop_history.record(&self.stops, origin);
    }

    /// Route a map click according to the current mode.
    pub fn handle_map_click(&mut self, coord: Coordinate) -> ClickEffect {
        match self.mode {
            EditorMode::Stop => match self.place_stop(coord) {
                Ok(stop_id) => ClickEffect::StopPlaced { stop_id },
                Err(_) => ClickEffect::Ignored,
            },
            EditorMode::Lane if self.drawing_enabled => {
                if self.ensure_unlocked(DraftKind::Lanes).is_err() {
                    return ClickEffect::Ignored;
                }
                let (next, effect) =
                    drawing::append_click_point(&self.lanes, coord, &self.config.default_lane_style);
                self.set_draft_lanes(next, ChangeOrigin::User);
                effect
            }
            EditorMode::Lane => ClickEffect::Ignored,
        }
    }

    /// Append a new draft stop at `coord` and return its temporary id.
    pub fn place_stop(&mut self, coord: Coordinate) -> Result<String, EditorError> {
        self.ensure_unlocked(DraftKind::Stops)?;
        let id = self.stop_ids.next_id();
        let mut next = self.stops.clone();
        next.push(DraftStop {
            id: id.clone(),
            latitude: coord.lat,
            longitude: coord.lng,
            name: None,
        });
        self.set_draft_stops(next, ChangeOrigin::User);
        Ok(id)
    }

    /// Add an empty lane at the end of the drafts; the next lane-mode click
    /// draws into it.
    pub fn start_new_lane(&mut self) -> Result<usize, EditorError> {
        self.ensure_unlocked(DraftKind::Lanes)?;
        let mut next = self.lanes.clone();
        next.push(DraftLane::new(&self.config.default_lane_style, Vec::new()));
        let index = next.len() - 1;
        self.set_draft_lanes(next, ChangeOrigin::User);
        self.selection.select_lane(LaneKey::Draft(index));
        Ok(index)
    }

    /// Move a draft-lane vertex. Stale references are ignored.
    pub fn drag_lane_point(&mut self, lane_index: usize, point_index: usize, coord: Coordinate) -> bool {
        if self.ensure_unlocked(DraftKind::Lanes).is_err() {
            return false;
        }
        let at = PointRef {
            lane_index,
            point_index,
        };
        match drawing::move_point(&self.lanes, at, coord) {
            PointEdit::Applied(next) => {
                self.set_draft_lanes(next, ChangeOrigin::User);
                true
            }
            PointEdit::OutOfRange | PointEdit::LastPoint => false,
        }
    }

    /// Insert a vertex before `point_index` of the given lane.
    pub fn insert_point(&mut self, lane_index: usize, point_index: usize, coord: Coordinate) -> bool {
        if self.ensure_unlocked(DraftKind::Lanes).is_err() {
            return false;
        }
        let at = PointRef {
            lane_index,
            point_index,
        };
        match drawing::insert_point(&self.lanes, at, coord) {
            PointEdit::Applied(next) => {
                self.set_draft_lanes(next, ChangeOrigin::User);
                self.selection.select_point(lane_index, point_index);
                true
            }
            PointEdit::OutOfRange | PointEdit::LastPoint => false,
        }
    }

    /// Remove a vertex. Refuses to empty a lane. A stale reference is a
    /// no-op.
    pub fn delete_point(&mut self, lane_index: usize, point_index: usize) -> Result<(), EditorError> {
        self.ensure_unlocked(DraftKind::Lanes)?;
        let at = PointRef {
            lane_index,
            point_index,
        };
        match drawing::delete_point(&self.lanes, at) {
            PointEdit::Applied(next) => {
                self.set_draft_lanes(next, ChangeOrigin::User);
                self.selection.clear_point();
                Ok(())
            }
            PointEdit::OutOfRange => Ok(()),
            PointEdit::LastPoint => Err(self.reject(EditorError::LastPoint { lane_index })),
        }
    }

    pub fn delete_selected_point(&mut self) -> Result<(), EditorError> {
        let Some(p) = self.selection.selected_point() else {
            return Err(self.reject(EditorError::NoPointSelected));
        };
        self.delete_point(p.lane_index, p.point_index)
    }

    pub fn remove_draft_lane(&mut self, index: usize) -> bool {
        if index >= self.lanes.len() || self.ensure_unlocked(DraftKind::Lanes).is_err() {
            return false;
        }
        let mut next = self.lanes.clone();
        next.remove(index);
        self.selection.on_draft_lane_removed(index);
        self.set_draft_lanes(next, ChangeOrigin::User);
        true
    }

    /// Apply a properties-form edit to one draft lane.
    pub fn update_lane(&mut self, index: usize, patch: &LanePatch) -> bool {
        if index >= self.lanes.len()
            || patch.is_empty()
            || self.ensure_unlocked(DraftKind::Lanes).is_err()
        {
            return false;
        }
        let mut next = self.lanes.clone();
        patch.apply(&mut next[index]);
        self.set_draft_lanes(next, ChangeOrigin::User);
        true
    }

    /// Copy a persisted lane into the drafts for editing and select it. A
    /// lane that is already being edited is just selected.
    pub fn load_lane_for_edit(&mut self, id: &str) -> Result<usize, EditorError> {
        self.ensure_unlocked(DraftKind::Lanes)?;
        if let Some(index) = self.lanes.iter().position(|l| l.id.as_deref() == Some(id)) {
            self.selection.select_lane(LaneKey::Draft(index));
            return Ok(index);
        }
        let Some(lane) = self.persisted.lane(id) else {
            return Err(self.reject(EditorError::UnknownLane(id.to_string())));
        };
        let mut next = self.lanes.clone();
        next.push(DraftLane::from_persisted(lane));
        let index = next.len() - 1;
        self.set_draft_lanes(next, ChangeOrigin::User);
        self.selection.select_lane(LaneKey::Draft(index));
        Ok(index)
    }

    pub fn drag_draft_stop(&mut self, stop_id: &str, coord: Coordinate) -> bool {
        let Some(index) = self.stops.iter().position(|s| s.id == stop_id) else {
            return false;
        };
        if self.ensure_unlocked(DraftKind::Stops).is_err() {
            return false;
        }
        let mut next = self.stops.clone();
        next[index].set_coordinate(coord);
        self.set_draft_stops(next, ChangeOrigin::User);
        true
    }

    pub fn rename_draft_stop(&mut self, stop_id: &str, name: Option<String>) -> bool {
        let Some(index) = self.stops.iter().position(|s| s.id == stop_id) else {
            return false;
        };
        if self.ensure_unlocked(DraftKind::Stops).is_err() {
            return false;
        }
        let mut next = self.stops.clone();
        next[index].name = name.filter(|n| !n.trim().is_empty());
        self.set_draft_stops(next, ChangeOrigin::User);
        true
    }

    pub fn remove_draft_stop(&mut self, stop_id: &str) -> bool {
        if !self.stops.iter().any(|s| s.id == stop_id)
            || self.ensure_unlocked(DraftKind::Stops).is_err()
        {
            return false;
        }
        let next = self.stops.iter().filter(|s| s.id != stop_id).cloned().collect();
        self.set_draft_stops(next, ChangeOrigin::User);
        true
    }

    /// A stop marker was dragged: draft stops move directly, a persisted stop
    /// in reposition mode gets a pending position.
    pub fn drag_stop(&mut self, stop_id: &str, coord: Coordinate) -> bool {
        if self.drag_draft_stop(stop_id, coord) {
            return true;
        }
        self.selection.set_pending_stop_position(stop_id, coord)
    }

    /// Drop all drafts. Recorded, so it can be undone. Drafts out for
    /// submission are kept.
    pub fn clear_drafts(&mut self) {
        if !self.lanes.is_empty() && self.ensure_unlocked(DraftKind::Lanes).is_ok() {
            self.set_draft_lanes(Vec::new(), ChangeOrigin::User);
        }
        if !self.stops.is_empty() && self.ensure_unlocked(DraftKind::Stops).is_ok() {
            self.set_draft_stops(Vec::new(), ChangeOrigin::User);
        }
        self.selection.clear_lane();
    }

    // --- Selection ---

    pub fn select_point(&mut self, lane_index: usize, point_index: usize) -> bool {
        let exists = self
            .lanes
            .get(lane_index)
            .is_some_and(|l| point_index < l.path.len());
        if exists {
            self.selection.select_point(lane_index, point_index);
        }
        exists
    }

    pub fn select_lane(&mut self, key: LaneKey) {
        self.selection.select_lane(key);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear_lane();
    }

    /// Select the draft vertex nearest to `coord`, within the configured
    /// pick tolerance.
    pub fn pick_point(&mut self, coord: Coordinate) -> Option<PointRef> {
        let hit = drawing::nearest_draft_point(&self.lanes, coord, self.config.point_pick_tolerance_deg)?;
        self.selection.select_point(hit.lane_index, hit.point_index);
        Some(hit)
    }

    /// Put a persisted stop into reposition mode.
    pub fn begin_stop_reposition(&mut self, stop_id: &str) -> Result<(), EditorError> {
        if self.persisted.stop(stop_id).is_none() {
            return Err(self.reject(EditorError::UnknownStop(stop_id.to_string())));
        }
        self.selection.begin_stop_edit(stop_id);
        Ok(())
    }

    pub fn cancel_stop_reposition(&mut self) {
        self.selection.clear_stop_edit();
    }

    // --- History ---

    pub fn undo(&mut self, kind: DraftKind) -> bool {
        if self.ensure_unlocked(kind).is_err() {
            return false;
        }
        match kind {
            DraftKind::Lanes => match self.lane_history.undo() {
                Some(state) => self.restore_lanes(state),
                None => false,
            },
            DraftKind::Stops => match self.stop_history.undo() {
                Some(state) => self.restore_stops(state),
                None => false,
            },
        }
    }

    pub fn redo(&mut self, kind: DraftKind) -> bool {
        if self.ensure_unlocked(kind).is_err() {
            return false;
        }
        match kind {
            DraftKind::Lanes => match self.lane_history.redo() {
                Some(state) => self.restore_lanes(state),
                None => false,
            },
            DraftKind::Stops => match self.stop_history.redo() {
                Some(state) => self.restore_stops(state),
                None => false,
            },
        }
    }

    /// The draft kind the current mode edits.
    pub fn active_kind(&self) -> DraftKind {
        match self.mode {
            EditorMode::Lane => DraftKind::Lanes,
            EditorMode::Stop => DraftKind::Stops,
        }
    }

    fn restore_lanes(&mut self, state: Vec<DraftLane>) -> bool {
        // Indices may now point at different data.
        self.selection.clear_point();
        self.set_draft_lanes(state, ChangeOrigin::Replay);
        true
    }

    fn restore_stops(&mut self, state: Vec<DraftStop>) -> bool {
        self.set_draft_stops(state, ChangeOrigin::Replay);
        true
    }

    // --- Persisted data ---

    /// Swap in a fresh persisted snapshot, dropping references to entities
    /// that no longer exist.
    pub fn replace_persisted(&mut self, data: MapDataPayload) {
        if let Some(edit) = self.selection.editing_stop()
            && data.stop(&edit.stop_id).is_none()
        {
            self.selection.clear_stop_edit();
        }
        if let Some(LaneKey::Persisted(id)) = self.selection.selected_lane_key()
            && data.lane(&id).is_none()
        {
            self.selection.clear_lane();
        }
        self.persisted = data;
        self.needs_refetch = false;
    }

    /// Whether a successful submission left the persisted snapshot stale.
    pub fn needs_refetch(&self) -> bool {
        self.needs_refetch
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase != SubmissionPhase::Idle
    }

    pub fn submit_dialog_open(&self) -> bool {
        self.submit_dialog_open
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use mapedit_protocol::{LocalizedText, PersistedLane, PersistedStop};

    use super::*;

    fn editor() -> MapEditor {
        MapEditor::new(
            EditorConfig::default(),
            MapDataPayload {
                lanes: vec![PersistedLane {
                    id: "lane-1".into(),
                    name: LocalizedText::en("Ring road"),
                    description: LocalizedText::default(),
                    path: vec![Coordinate::new(36.1, 44.0), Coordinate::new(36.2, 44.1)],
                    color: "#FF0000".into(),
                    weight: 3,
                    opacity: 0.4,
                    service_id: None,
                    service_icon: None,
                    route_ids: BTreeSet::new(),
                    is_active: true,
                }],
                stops: vec![PersistedStop {
                    id: "stop-1".into(),
                    name: Some("Citadel".into()),
                    latitude: 36.19,
                    longitude: 44.01,
                }],
                route_ids: Vec::new(),
            },
            &MapSettings::default(),
        )
    }

    #[test]
    fn click_scenario_with_undo_redo() {
        let mut ed = editor();
        assert_eq!(ed.lane_history().len(), 1);
        assert_eq!(ed.lane_history().index(), 0);

        ed.handle_map_click(Coordinate::new(36.19, 44.01));
        assert_eq!(ed.draft_lanes().len(), 1);
        assert_eq!(ed.draft_lanes()[0].path, vec![Coordinate::new(36.19, 44.01)]);
        assert_eq!(ed.draft_lanes()[0].color.as_deref(), Some("#0066CC"));
        assert_eq!(ed.draft_lanes()[0].weight, Some(5));
        assert_eq!(ed.draft_lanes()[0].opacity, Some(0.8));
        assert!(ed.draft_lanes()[0].is_active);
        assert_eq!((ed.lane_history().len(), ed.lane_history().index()), (2, 1));

        ed.handle_map_click(Coordinate::new(36.20, 44.02));
        assert_eq!(ed.draft_lanes()[0].path.len(), 2);
        assert_eq!((ed.lane_history().len(), ed.lane_history().index()), (3, 2));

        assert!(ed.undo(DraftKind::Lanes));
        assert_eq!(ed.draft_lanes()[0].path.len(), 1);
        assert_eq!((ed.lane_history().len(), ed.lane_history().index()), (3, 1));

        assert!(ed.redo(DraftKind::Lanes));
        assert_eq!(ed.draft_lanes()[0].path.len(), 2);
        assert_eq!(ed.lane_history().index(), 2);
    }

    #[test]
    fn stop_mode_places_stops() {
        let mut ed = editor();
        ed.set_mode(EditorMode::Stop);
        let effect = ed.handle_map_click(Coordinate::new(36.19, 44.01));
        assert!(matches!(effect, ClickEffect::StopPlaced { .. }));
        assert_eq!(ed.draft_stops().len(), 1);
        assert!(ed.draft_lanes().is_empty());
        assert_eq!(ed.stop_history().len(), 2);
        assert_eq!(ed.lane_history().len(), 1);
    }

    #[test]
    fn disabled_drawing_ignores_clicks() {
        let mut ed = editor();
        ed.set_drawing_enabled(false);
        assert_eq!(
            ed.handle_map_click(Coordinate::new(36.19, 44.01)),
            ClickEffect::Ignored
        );
        assert_eq!(ed.lane_history().len(), 1);
    }

    #[test]
    fn deleting_only_point_is_refused() {
        let mut ed = editor();
        ed.handle_map_click(Coordinate::new(36.19, 44.01));
        ed.select_point(0, 0);
        let before = ed.draft_lanes().to_vec();
        let err = ed.delete_selected_point().unwrap_err();
        assert!(matches!(err, EditorError::LastPoint { lane_index: 0 }));
        assert_eq!(ed.draft_lanes(), before.as_slice());
        assert_eq!(ed.lane_history().len(), 2);
        assert_eq!(ed.take_notices().len(), 1);
    }

    #[test]
    fn deleting_point_clears_selection() {
        let mut ed = editor();
        ed.handle_map_click(Coordinate::new(36.19, 44.01));
        ed.handle_map_click(Coordinate::new(36.20, 44.02));
        ed.select_point(0, 1);
        ed.delete_selected_point().unwrap();
        assert_eq!(ed.draft_lanes()[0].path.len(), 1);
        assert!(ed.selection().selected_point().is_none());
    }

    #[test]
    fn drag_records_and_ignores_stale_refs() {
        let mut ed = editor();
        ed.handle_map_click(Coordinate::new(36.19, 44.01));
        assert!(ed.drag_lane_point(0, 0, Coordinate::new(36.3, 44.3)));
        assert_eq!(ed.lane_history().len(), 3);
        assert!(!ed.drag_lane_point(0, 5, Coordinate::new(36.3, 44.3)));
        assert!(!ed.drag_lane_point(3, 0, Coordinate::new(36.3, 44.3)));
        assert_eq!(ed.lane_history().len(), 3);
    }

    #[test]
    fn undo_clears_point_selection() {
        let mut ed = editor();
        ed.handle_map_click(Coordinate::new(36.19, 44.01));
        ed.handle_map_click(Coordinate::new(36.20, 44.02));
        ed.select_point(0, 0);
        ed.undo(DraftKind::Lanes);
        assert!(ed.selection().selected_point().is_none());
    }

    #[test]
    fn mode_switch_clears_selection() {
        let mut ed = editor();
        ed.handle_map_click(Coordinate::new(36.19, 44.01));
        ed.select_point(0, 0);
        ed.begin_stop_reposition("stop-1").unwrap();
        ed.toggle_mode();
        assert_eq!(ed.mode(), EditorMode::Stop);
        assert!(ed.selection().selected_point().is_none());
        assert!(ed.selection().editing_stop().is_none());
    }

    #[test]
    fn second_lane_starts_after_start_new_lane() {
        let mut ed = editor();
        ed.handle_map_click(Coordinate::new(36.19, 44.01));
        ed.handle_map_click(Coordinate::new(36.20, 44.02));
        let index = ed.start_new_lane().unwrap();
        assert_eq!(index, 1);
        ed.handle_map_click(Coordinate::new(36.30, 44.10));
        assert_eq!(ed.draft_lanes()[0].path.len(), 2);
        assert_eq!(ed.draft_lanes()[1].path, vec![Coordinate::new(36.30, 44.10)]);
    }

    #[test]
    fn load_lane_for_edit_copies_fields() {
        let mut ed = editor();
        let index = ed.load_lane_for_edit("lane-1").unwrap();
        let draft = &ed.draft_lanes()[index];
        assert_eq!(draft.id.as_deref(), Some("lane-1"));
        assert_eq!(draft.color.as_deref(), Some("#FF0000"));
        assert_eq!(
            ed.selection().selected_lane_key(),
            Some(LaneKey::Draft(index))
        );
        // Loading again does not duplicate.
        assert_eq!(ed.load_lane_for_edit("lane-1").unwrap(), index);
        assert_eq!(ed.draft_lanes().len(), 1);
        assert!(matches!(
            ed.load_lane_for_edit("nope"),
            Err(EditorError::UnknownLane(_))
        ));
    }

    #[test]
    fn clear_drafts_is_undoable() {
        let mut ed = editor();
        ed.handle_map_click(Coordinate::new(36.19, 44.01));
        ed.set_mode(EditorMode::Stop);
        ed.handle_map_click(Coordinate::new(36.19, 44.01));
        ed.clear_drafts();
        assert!(!ed.has_drafts());
        ed.undo(DraftKind::Lanes);
        ed.undo(DraftKind::Stops);
        assert_eq!(ed.draft_lanes().len(), 1);
        assert_eq!(ed.draft_stops().len(), 1);
    }

    #[test]
    fn removing_lane_shifts_selection() {
        let mut ed = editor();
        ed.handle_map_click(Coordinate::new(36.19, 44.01));
        ed.start_new_lane().unwrap();
        ed.handle_map_click(Coordinate::new(36.30, 44.10));
        ed.select_point(1, 0);
        assert!(ed.remove_draft_lane(0));
        assert_eq!(ed.selection().selected_point().map(|p| p.lane_index), Some(0));
        assert!(!ed.remove_draft_lane(4));
    }

    #[test]
    fn drag_stop_routes_by_kind() {
        let mut ed = editor();
        let id = ed.place_stop(Coordinate::new(36.19, 44.01)).unwrap();
        assert!(ed.drag_stop(&id, Coordinate::new(36.2, 44.0)));
        assert_eq!(ed.draft_stops()[0].latitude, 36.2);

        // Persisted stop outside reposition mode: ignored.
        assert!(!ed.drag_stop("stop-1", Coordinate::new(36.0, 44.0)));
        ed.begin_stop_reposition("stop-1").unwrap();
        assert!(ed.drag_stop("stop-1", Coordinate::new(36.0, 44.0)));
        assert_eq!(
            ed.selection().editing_stop().and_then(|e| e.pending),
            Some(Coordinate::new(36.0, 44.0))
        );
    }

    #[test]
    fn pick_point_selects_nearest() {
        let mut ed = editor();
        ed.handle_map_click(Coordinate::new(36.19, 44.01));
        ed.handle_map_click(Coordinate::new(36.20, 44.02));
        let hit = ed.pick_point(Coordinate::new(36.2001, 44.0199));
        assert_eq!(
            hit,
            Some(PointRef {
                lane_index: 0,
                point_index: 1
            })
        );
        assert_eq!(ed.selection().selected_point(), hit);
    }

    #[test]
    fn replace_persisted_drops_missing_stop_edit() {
        let mut ed = editor();
        ed.begin_stop_reposition("stop-1").unwrap();
        ed.replace_persisted(MapDataPayload::default());
        assert!(ed.selection().editing_stop().is_none());
    }
}
