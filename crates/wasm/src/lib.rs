//! Browser bridge. Everything crosses the boundary as JSON strings.
//!
//! Network calls belong to the host page: it asks for a prepared payload,
//! sends it, and hands the response back through the matching `complete_*`
//! method. The editor stays busy in between.

use mapedit_core::drawing::EditorMode;
use mapedit_core::model::{DraftKind, LanePatch};
use mapedit_core::submit::LaneSubmitResult;
use mapedit_core::views::overlay::render_overlay;
use mapedit_core::{BackendError, EditorConfig, MapEditor, NoticeLevel};
use mapedit_protocol::{Coordinate, MapDataPayload, MapSettings, MapViewport};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// What the host's transport returned: `{"ok": ...}` or `{"error": "..."}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Transport<T> {
    Ok(T),
    Error(String),
}

impl<T> Transport<T> {
    fn into_result(self) -> Result<T, BackendError> {
        match self {
            Transport::Ok(v) => Ok(v),
            Transport::Error(msg) => Err(BackendError::Unavailable(msg)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LaneTransport {
    #[serde(default = "empty_ok")]
    created: Transport<Vec<mapedit_protocol::PersistedLane>>,
    #[serde(default = "empty_ok")]
    updated: Transport<Vec<mapedit_protocol::PersistedLane>>,
}

fn empty_ok<T>() -> Transport<Vec<T>> {
    Transport::Ok(Vec::new())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NoticeOut<'a> {
    level: &'static str,
    message: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StopMoveOut<'a> {
    stop_id: &'a str,
    latitude: f64,
    longitude: f64,
}

fn parse_kind(kind: &str) -> Result<DraftKind, JsError> {
    match kind {
        "lanes" => Ok(DraftKind::Lanes),
        "stops" => Ok(DraftKind::Stops),
        _ => Err(JsError::new(&format!("unknown draft kind: {kind}"))),
    }
}

/// One editor session, owned by the page.
#[wasm_bindgen]
pub struct MapEditorHandle {
    editor: MapEditor,
}

#[wasm_bindgen]
impl MapEditorHandle {
    /// `data` is the persisted map snapshot; `settings` and `config` are
    /// optional JSON objects.
    #[wasm_bindgen(constructor)]
    pub fn new(
        data: &str,
        settings: Option<String>,
        config: Option<String>,
    ) -> Result<MapEditorHandle, JsError> {
        let data: MapDataPayload = serde_json::from_str(data)?;
        let settings: MapSettings = match settings {
            Some(s) => serde_json::from_str(&s)?,
            None => MapSettings::default(),
        };
        let config = match config {
            Some(c) => EditorConfig::from_json_str(&c)?,
            None => EditorConfig::default(),
        };
        Ok(Self {
            editor: MapEditor::new(config, data, &settings),
        })
    }

    /// Initial map center as `[lat, lng]`.
    pub fn center(&self) -> Vec<f64> {
        let c = self.editor.center();
        vec![c.lat, c.lng]
    }

    /// Overlay render commands as JSON.
    pub fn render(
        &self,
        center_lat: f64,
        center_lng: f64,
        lng_span: f64,
        width: f64,
        height: f64,
    ) -> Result<String, JsError> {
        let viewport = MapViewport {
            center: Coordinate::new(center_lat, center_lng),
            lng_span,
            width,
            height,
        };
        let commands = render_overlay(&self.editor, &viewport);
        Ok(serde_json::to_string(&commands)?)
    }

    // --- Mode and drawing ---

    pub fn mode(&self) -> String {
        match self.editor.mode() {
            EditorMode::Lane => "lane".into(),
            EditorMode::Stop => "stop".into(),
        }
    }

    pub fn set_mode(&mut self, mode: &str) -> Result<(), JsError> {
        let mode = match mode {
            "lane" => EditorMode::Lane,
            "stop" => EditorMode::Stop,
            _ => return Err(JsError::new(&format!("unknown mode: {mode}"))),
        };
        self.editor.set_mode(mode);
        Ok(())
    }

    pub fn set_drawing_enabled(&mut self, enabled: bool) {
        self.editor.set_drawing_enabled(enabled);
    }

    /// Returns false when the click was ignored.
    pub fn map_click(&mut self, lat: f64, lng: f64) -> bool {
        !matches!(
            self.editor.handle_map_click(Coordinate::new(lat, lng)),
            mapedit_core::drawing::ClickEffect::Ignored
        )
    }

    pub fn start_new_lane(&mut self) -> Result<usize, JsError> {
        Ok(self.editor.start_new_lane()?)
    }

    pub fn drag_lane_point(&mut self, lane: usize, point: usize, lat: f64, lng: f64) -> bool {
        self.editor.drag_lane_point(lane, point, Coordinate::new(lat, lng))
    }

    pub fn insert_point(&mut self, lane: usize, point: usize, lat: f64, lng: f64) -> bool {
        self.editor.insert_point(lane, point, Coordinate::new(lat, lng))
    }

    pub fn delete_point(&mut self, lane: usize, point: usize) -> Result<(), JsError> {
        Ok(self.editor.delete_point(lane, point)?)
    }

    pub fn delete_selected_point(&mut self) -> Result<(), JsError> {
        Ok(self.editor.delete_selected_point()?)
    }

    pub fn remove_draft_lane(&mut self, index: usize) -> bool {
        self.editor.remove_draft_lane(index)
    }

    /// Apply a lane properties form edit (`LanePatch` JSON).
    pub fn update_lane(&mut self, index: usize, patch: &str) -> Result<bool, JsError> {
        let patch: LanePatch = serde_json::from_str(patch)?;
        Ok(self.editor.update_lane(index, &patch))
    }

    pub fn load_lane_for_edit(&mut self, id: &str) -> Result<usize, JsError> {
        Ok(self.editor.load_lane_for_edit(id)?)
    }

    pub fn drag_stop(&mut self, stop_id: &str, lat: f64, lng: f64) -> bool {
        self.editor.drag_stop(stop_id, Coordinate::new(lat, lng))
    }

    pub fn rename_draft_stop(&mut self, stop_id: &str, name: Option<String>) -> bool {
        self.editor.rename_draft_stop(stop_id, name)
    }

    pub fn remove_draft_stop(&mut self, stop_id: &str) -> bool {
        self.editor.remove_draft_stop(stop_id)
    }

    pub fn clear_drafts(&mut self) {
        self.editor.clear_drafts();
    }

    pub fn draft_lanes(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(self.editor.draft_lanes())?)
    }

    pub fn draft_stops(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(self.editor.draft_stops())?)
    }

    // --- Selection ---

    pub fn select_point(&mut self, lane: usize, point: usize) -> bool {
        self.editor.select_point(lane, point)
    }

    pub fn pick_point(&mut self, lat: f64, lng: f64) -> bool {
        self.editor.pick_point(Coordinate::new(lat, lng)).is_some()
    }

    pub fn clear_selection(&mut self) {
        self.editor.clear_selection();
    }

    pub fn begin_stop_reposition(&mut self, stop_id: &str) -> Result<(), JsError> {
        Ok(self.editor.begin_stop_reposition(stop_id)?)
    }

    pub fn cancel_stop_reposition(&mut self) {
        self.editor.cancel_stop_reposition();
    }

    // --- History ---

    pub fn undo(&mut self, kind: &str) -> Result<bool, JsError> {
        Ok(self.editor.undo(parse_kind(kind)?))
    }

    pub fn redo(&mut self, kind: &str) -> Result<bool, JsError> {
        Ok(self.editor.redo(parse_kind(kind)?))
    }

    pub fn can_undo(&self, kind: &str) -> Result<bool, JsError> {
        Ok(match parse_kind(kind)? {
            DraftKind::Lanes => self.editor.lane_history().can_undo(),
            DraftKind::Stops => self.editor.stop_history().can_undo(),
        })
    }

    pub fn can_redo(&self, kind: &str) -> Result<bool, JsError> {
        Ok(match parse_kind(kind)? {
            DraftKind::Lanes => self.editor.lane_history().can_redo(),
            DraftKind::Stops => self.editor.stop_history().can_redo(),
        })
    }

    // --- Notices and status ---

    /// Pending toasts as `[{ level, message }]`, oldest first.
    pub fn take_notices(&mut self) -> Result<String, JsError> {
        let notices = self.editor.take_notices();
        let out: Vec<NoticeOut<'_>> = notices
            .iter()
            .map(|n| NoticeOut {
                level: match n.level {
                    NoticeLevel::Success => "success",
                    NoticeLevel::Error => "error",
                },
                message: &n.message,
            })
            .collect();
        Ok(serde_json::to_string(&out)?)
    }

    pub fn is_busy(&self) -> bool {
        self.editor.is_busy()
    }

    pub fn needs_refetch(&self) -> bool {
        self.editor.needs_refetch()
    }

    pub fn replace_persisted(&mut self, data: &str) -> Result<(), JsError> {
        let data: MapDataPayload = serde_json::from_str(data)?;
        self.editor.replace_persisted(data);
        Ok(())
    }

    pub fn open_submit_dialog(&mut self) {
        self.editor.open_submit_dialog();
    }

    pub fn close_submit_dialog(&mut self) {
        self.editor.close_submit_dialog();
    }

    pub fn submit_dialog_open(&self) -> bool {
        self.editor.submit_dialog_open()
    }

    // --- Submission ---

    /// `{ creates, updates }` to send to the bulk lane endpoints.
    pub fn prepare_lane_submission(&mut self) -> Result<String, JsError> {
        let submission = self.editor.prepare_lane_submission()?;
        Ok(serde_json::to_string(&submission)?)
    }

    /// `result` is `{ "created": {"ok": [...]}, "updated": {"error": "..."} }`;
    /// a missing group counts as an empty success.
    pub fn complete_lane_submission(&mut self, result: &str) -> Result<usize, JsError> {
        let transport: LaneTransport = serde_json::from_str(result)?;
        let summary = self.editor.complete_lane_submission(LaneSubmitResult {
            created: transport.created.into_result(),
            updated: transport.updated.into_result(),
        })?;
        Ok(summary.created + summary.updated)
    }

    pub fn prepare_stop_submission(&mut self) -> Result<String, JsError> {
        let stops = self.editor.prepare_stop_submission()?;
        Ok(serde_json::to_string(&stops)?)
    }

    pub fn complete_stop_submission(&mut self, result: &str) -> Result<usize, JsError> {
        let transport: Transport<Vec<mapedit_protocol::PersistedStop>> =
            serde_json::from_str(result)?;
        Ok(self.editor.complete_stop_submission(transport.into_result())?)
    }

    /// `{ stopId, latitude, longitude }` for the stop being repositioned.
    pub fn prepare_stop_move(&mut self) -> Result<String, JsError> {
        let mv = self.editor.prepare_stop_move()?;
        Ok(serde_json::to_string(&StopMoveOut {
            stop_id: &mv.stop_id,
            latitude: mv.position.lat,
            longitude: mv.position.lng,
        })?)
    }

    pub fn complete_stop_move(&mut self, result: &str) -> Result<(), JsError> {
        let transport: Transport<mapedit_protocol::PersistedStop> = serde_json::from_str(result)?;
        self.editor.complete_stop_move(transport.into_result())?;
        Ok(())
    }

    pub fn prepare_stop_delete(&mut self, stop_id: &str) -> Result<(), JsError> {
        Ok(self.editor.prepare_stop_delete(stop_id)?)
    }

    /// `result` is `{"ok": null}` or `{"error": "..."}`.
    pub fn complete_stop_delete(&mut self, stop_id: &str, result: &str) -> Result<(), JsError> {
        let transport: Transport<()> = serde_json::from_str(result)?;
        Ok(self
            .editor
            .complete_stop_delete(stop_id, transport.into_result())?)
    }
}
