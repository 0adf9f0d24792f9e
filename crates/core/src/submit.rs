//! Submitting drafts to the persistence layer.
//!
//! Each network operation runs in two phases so hosts with an asynchronous
//! transport (the browser bridge) can drive it: `prepare_*` validates and
//! marks the editor busy, `complete_*` takes the transport's result and
//! always returns the editor to idle. The `submit_*` methods run both
//! phases against a blocking [`MapBackend`].
//!
//! Only one operation may be in flight; starting another fails with
//! [`EditorError::Busy`] before anything is sent.

use std::fmt;

use mapedit_protocol::{Coordinate, PersistedLane, PersistedStop, StopCreate};
use tracing::{info, warn};

use crate::backend::{BackendError, MapBackend};
use crate::editor::{EditorError, MapEditor, NoticeLevel};
use crate::model::DraftKind;
use crate::reconcile::{LaneSubmission, reconcile_lanes, reconcile_stops};
use crate::validate::validate_position;

/// The network operation in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOp {
    SaveLanes,
    SaveStops,
    MoveStop,
    DeleteStop,
}

impl PendingOp {
    /// Drafts of `kind` are frozen while this operation is in flight, so the
    /// result applies to exactly what was sent.
    pub fn locks(self, kind: DraftKind) -> bool {
        matches!(
            (self, kind),
            (PendingOp::SaveLanes, DraftKind::Lanes) | (PendingOp::SaveStops, DraftKind::Stops)
        )
    }
}

impl fmt::Display for PendingOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PendingOp::SaveLanes => "saving lanes",
            PendingOp::SaveStops => "saving stops",
            PendingOp::MoveStop => "moving a stop",
            PendingOp::DeleteStop => "deleting a stop",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Submitting(PendingOp),
}

/// What the transport reports back for a lane submission. A group that
/// was not sent (because it was empty, or an earlier call failed) is
/// reported as `Ok` with no lanes.
#[derive(Debug)]
pub struct LaneSubmitResult {
    pub created: Result<Vec<PersistedLane>, BackendError>,
    pub updated: Result<Vec<PersistedLane>, BackendError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneSaveSummary {
    pub created: usize,
    pub updated: usize,
}

/// A committed stop reposition, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct StopMove {
    pub stop_id: String,
    pub position: Coordinate,
}

impl MapEditor {
    fn ensure_idle(&mut self) -> Result<(), EditorError> {
        match self.phase {
            SubmissionPhase::Submitting(current) => Err(self.reject(EditorError::Busy(current))),
            SubmissionPhase::Idle => Ok(()),
        }
    }

    fn begin(&mut self, op: PendingOp) {
        self.phase = SubmissionPhase::Submitting(op);
    }

    fn expect_pending(&self, op: PendingOp) -> Result<(), EditorError> {
        if self.phase == SubmissionPhase::Submitting(op) {
            Ok(())
        } else {
            Err(EditorError::NotSubmitting)
        }
    }

    fn finish(&mut self) {
        self.phase = SubmissionPhase::Idle;
    }

    pub fn open_submit_dialog(&mut self) {
        self.submit_dialog_open = true;
    }

    pub fn close_submit_dialog(&mut self) {
        self.submit_dialog_open = false;
    }

    // --- Lanes ---

    /// Validate and partition the draft lanes. On success the editor is
    /// busy until [`MapEditor::complete_lane_submission`] is called.
    pub fn prepare_lane_submission(&mut self) -> Result<LaneSubmission, EditorError> {
        self.ensure_idle()?;
        let submission = match reconcile_lanes(
            &self.lanes,
            &self.persisted,
            &self.config.default_lane_style,
        ) {
            Ok(s) => s,
            Err(e) => return Err(self.reject(e.into())),
        };
        self.begin(PendingOp::SaveLanes);
        info!(
            creates = submission.creates.len(),
            updates = submission.updates.len(),
            "submitting lanes"
        );
        Ok(submission)
    }

    /// Finish a lane submission.
    ///
    /// On success drafts are cleared, the lane history starts over and the
    /// dialog closes. On failure drafts stay for a retry, except new lanes
    /// the server already created, which are dropped so a retry does not
    /// create them twice.
    pub fn complete_lane_submission(
        &mut self,
        result: LaneSubmitResult,
    ) -> Result<LaneSaveSummary, EditorError> {
        self.expect_pending(PendingOp::SaveLanes)?;
        self.finish();

        match (result.created, result.updated) {
            (Ok(created), Ok(updated)) => {
                let summary = LaneSaveSummary {
                    created: created.len(),
                    updated: updated.len(),
                };
                self.lanes.clear();
                self.lane_history.reset();
                self.selection.clear_lane();
                self.submit_dialog_open = false;
                self.needs_refetch = true;
                info!(created = summary.created, updated = summary.updated, "lanes saved");
                self.notify(
                    NoticeLevel::Success,
                    format!(
                        "Saved lanes: {} created, {} updated",
                        summary.created, summary.updated
                    ),
                );
                Ok(summary)
            }
            (Ok(created), Err(err)) => {
                if !created.is_empty() {
                    let sent: Vec<usize> = self
                        .lanes
                        .iter()
                        .enumerate()
                        .filter(|(_, l)| l.is_new())
                        .map(|(i, _)| i)
                        .collect();
                    for &i in sent.iter().rev() {
                        self.selection.on_draft_lane_removed(i);
                    }
                    self.lanes.retain(|l| !l.is_new());
                    // The server owns the created lanes now; undo must not
                    // bring them back.
                    self.lane_history.reset_to(self.lanes.clone());
                    self.needs_refetch = true;
                }
                warn!(created = created.len(), error = %err, "lane update failed");
                Err(self.reject(err.into()))
            }
            (Err(err), _) => {
                warn!(error = %err, "lane creation failed");
                Err(self.reject(err.into()))
            }
        }
    }

    /// Validate, send creates then updates, and refetch on success.
    pub fn submit_lanes(&mut self, backend: &mut dyn MapBackend) -> Result<LaneSaveSummary, EditorError> {
        let submission = self.prepare_lane_submission()?;
        let created = if submission.creates.is_empty() {
            Ok(Vec::new())
        } else {
            backend.bulk_create_lanes(&submission.creates)
        };
        let updated = match &created {
            Ok(_) if !submission.updates.is_empty() => backend.bulk_update_lanes(&submission.updates),
            _ => Ok(Vec::new()),
        };
        let outcome = self.complete_lane_submission(LaneSubmitResult { created, updated });
        if self.needs_refetch {
            self.refresh(backend);
        }
        outcome
    }

    // --- Stops ---

    pub fn prepare_stop_submission(&mut self) -> Result<Vec<StopCreate>, EditorError> {
        self.ensure_idle()?;
        let stops = match reconcile_stops(&self.stops) {
            Ok(s) => s,
            Err(e) => return Err(self.reject(e.into())),
        };
        self.begin(PendingOp::SaveStops);
        info!(creates = stops.len(), "submitting stops");
        Ok(stops)
    }

    pub fn complete_stop_submission(
        &mut self,
        result: Result<Vec<PersistedStop>, BackendError>,
    ) -> Result<usize, EditorError> {
        self.expect_pending(PendingOp::SaveStops)?;
        self.finish();
        match result {
            Ok(created) => {
                self.stops.clear();
                self.stop_history.reset();
                self.submit_dialog_open = false;
                self.needs_refetch = true;
                info!(created = created.len(), "stops saved");
                self.notify(
                    NoticeLevel::Success,
                    format!("Saved {} stops", created.len()),
                );
                Ok(created.len())
            }
            Err(err) => {
                warn!(error = %err, "stop creation failed");
                Err(self.reject(err.into()))
            }
        }
    }

    pub fn submit_stops(&mut self, backend: &mut dyn MapBackend) -> Result<usize, EditorError> {
        let stops = self.prepare_stop_submission()?;
        let result = backend.bulk_create_stops(&stops);
        let outcome = self.complete_stop_submission(result);
        if self.needs_refetch {
            self.refresh(backend);
        }
        outcome
    }

    // --- Stop reposition ---

    /// Take the pending position of the stop in reposition mode.
    pub fn prepare_stop_move(&mut self) -> Result<StopMove, EditorError> {
        self.ensure_idle()?;
        let Some(edit) = self.selection.editing_stop().cloned() else {
            return Err(self.reject(EditorError::NotEditingStop));
        };
        let Some(position) = edit.pending else {
            return Err(self.reject(EditorError::NoPendingPosition(edit.stop_id)));
        };
        if let Err(e) = validate_position(position) {
            return Err(self.reject(e.into()));
        }
        self.begin(PendingOp::MoveStop);
        Ok(StopMove {
            stop_id: edit.stop_id,
            position,
        })
    }

    /// On success the stop leaves reposition mode and the local snapshot is
    /// updated; on failure the pending position is kept.
    pub fn complete_stop_move(
        &mut self,
        result: Result<PersistedStop, BackendError>,
    ) -> Result<PersistedStop, EditorError> {
        self.expect_pending(PendingOp::MoveStop)?;
        self.finish();
        match result {
            Ok(stop) => {
                if let Some(slot) = self.persisted.stops.iter_mut().find(|s| s.id == stop.id) {
                    *slot = stop.clone();
                }
                self.selection.on_stop_removed(&stop.id);
                self.needs_refetch = true;
                info!(stop = %stop.id, "stop moved");
                self.notify(NoticeLevel::Success, "Stop position updated");
                Ok(stop)
            }
            Err(err) => {
                warn!(error = %err, "stop move failed");
                Err(self.reject(err.into()))
            }
        }
    }

    pub fn commit_stop_position(
        &mut self,
        backend: &mut dyn MapBackend,
    ) -> Result<PersistedStop, EditorError> {
        let mv = self.prepare_stop_move()?;
        let result = backend.update_stop_position(&mv.stop_id, mv.position.lat, mv.position.lng);
        let outcome = self.complete_stop_move(result);
        if self.needs_refetch {
            self.refresh(backend);
        }
        outcome
    }

    // --- Stop deletion ---

    pub fn prepare_stop_delete(&mut self, stop_id: &str) -> Result<(), EditorError> {
        self.ensure_idle()?;
        if self.persisted.stop(stop_id).is_none() {
            return Err(self.reject(EditorError::UnknownStop(stop_id.to_string())));
        }
        self.begin(PendingOp::DeleteStop);
        Ok(())
    }

    pub fn complete_stop_delete(
        &mut self,
        stop_id: &str,
        result: Result<(), BackendError>,
    ) -> Result<(), EditorError> {
        self.expect_pending(PendingOp::DeleteStop)?;
        self.finish();
        match result {
            Ok(()) => {
                self.persisted.stops.retain(|s| s.id != stop_id);
                self.selection.on_stop_removed(stop_id);
                self.needs_refetch = true;
                info!(stop = stop_id, "stop deleted");
                self.notify(NoticeLevel::Success, "Stop deleted");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "stop delete failed");
                Err(self.reject(err.into()))
            }
        }
    }

    /// Delete a stop. Draft stops are dropped locally; persisted stops go
    /// through the backend.
    pub fn delete_stop(&mut self, backend: &mut dyn MapBackend, stop_id: &str) -> Result<(), EditorError> {
        if self.remove_draft_stop(stop_id) {
            return Ok(());
        }
        self.prepare_stop_delete(stop_id)?;
        let result = backend.delete_stop(stop_id);
        let outcome = self.complete_stop_delete(stop_id, result);
        if self.needs_refetch {
            self.refresh(backend);
        }
        outcome
    }

    /// Refetch the persisted snapshot. A failed refetch keeps the old
    /// snapshot and leaves `needs_refetch` set.
    pub fn refresh(&mut self, backend: &mut dyn MapBackend) -> bool {
        match backend.fetch_map_data() {
            Ok(data) => {
                self.replace_persisted(data);
                true
            }
            Err(err) => {
                warn!(error = %err, "refetch failed");
                self.notify(NoticeLevel::Error, format!("Could not reload map data: {err}"));
                false
            }
        }
    }
}
