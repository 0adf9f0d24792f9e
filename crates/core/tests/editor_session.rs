//! Integration test: drive a full editing session against the Erbil network
//! fixture, from loading persisted lanes through drawing, undo, submission
//! and refetch.

use mapedit_core::backend::{MapBackend, MemoryBackend};
use mapedit_core::config::EditorConfig;
use mapedit_core::drawing::EditorMode;
use mapedit_core::editor::{EditorError, MapEditor, NoticeLevel};
use mapedit_core::model::{DraftKind, LanePatch};
use mapedit_core::validate::ValidationError;
use mapedit_core::views::overlay::render_overlay;
use mapedit_protocol::{
    Coordinate, LocalizedText, MapCommand, MapDataPayload, MapSettings, MapViewport, MarkerKind,
};

fn fixture() -> MapDataPayload {
    let data = include_str!("fixtures/erbil_network.json");
    serde_json::from_str(data).expect("fixture should parse")
}

fn session(config: EditorConfig) -> (MapEditor, MemoryBackend) {
    let mut backend = MemoryBackend::new(fixture());
    let data = backend.fetch_map_data().expect("fetch");
    let editor = MapEditor::new(config, data, &MapSettings::default());
    (editor, backend)
}

fn viewport(editor: &MapEditor) -> MapViewport {
    MapViewport {
        center: editor.center(),
        lng_span: 0.12,
        width: 1200.0,
        height: 800.0,
    }
}

#[test]
fn fixture_loads_with_defaults() {
    let data = fixture();
    assert_eq!(data.lanes.len(), 2);
    assert_eq!(data.stops.len(), 3);
    let ring = data.lane("lane-100").expect("ring lane");
    assert_eq!(ring.name.default_text(), Some("100m Ring Road"));
    assert_eq!(ring.path[0], Coordinate::new(36.1702, 43.9861));
    let shuttle = data.lane("lane-101").expect("shuttle lane");
    assert!(shuttle.description.is_empty());
    assert!(shuttle.route_ids.is_empty());
    assert!(!shuttle.is_active);
    assert_eq!(data.stop("stop-3").and_then(|s| s.name.clone()), None);
}

#[test]
fn edit_existing_and_draw_new_then_submit() {
    let (mut editor, mut backend) = session(EditorConfig::default());

    // Edit the ring road: drag its second vertex.
    let index = editor.load_lane_for_edit("lane-100").expect("load");
    assert!(editor.drag_lane_point(index, 1, Coordinate::new(36.1850, 43.9690)));

    // Draw a new lane next to it.
    editor.start_new_lane().expect("new lane");
    editor.handle_map_click(Coordinate::new(36.1911, 44.0092));
    editor.handle_map_click(Coordinate::new(36.2015, 43.9930));
    editor.handle_map_click(Coordinate::new(36.2100, 43.9800));
    let new_index = editor.draft_lanes().len() - 1;
    assert_eq!(editor.draft_lanes()[new_index].path.len(), 3);

    // The overlay shows the edited ring only as a draft.
    let commands = render_overlay(&editor, &viewport(&editor));
    let keys: Vec<&str> = commands
        .iter()
        .filter_map(|c| match c {
            MapCommand::DrawPolyline { lane_key, .. } => Some(lane_key.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(keys, vec!["lane-101", "draft-lane-0", "draft-lane-1"]);

    // Unnamed new lane: nothing is sent.
    let calls = backend.mutation_calls();
    let err = editor.submit_lanes(&mut backend).unwrap_err();
    assert!(matches!(
        err,
        EditorError::Validation(ValidationError::MissingName { position: 2 })
    ));
    assert_eq!(backend.mutation_calls(), calls);

    editor.update_lane(
        new_index,
        &LanePatch {
            name: Some(LocalizedText::en("Park Connector")),
            ..LanePatch::default()
        },
    );
    let summary = editor.submit_lanes(&mut backend).expect("submit");
    assert_eq!((summary.created, summary.updated), (1, 1));

    assert!(editor.draft_lanes().is_empty());
    assert_eq!(editor.lane_history().len(), 1);
    assert!(!editor.lane_history().can_undo());
    assert_eq!(editor.persisted().lanes.len(), 3);
    let ring = editor.persisted().lane("lane-100").expect("ring");
    assert_eq!(ring.path[1], Coordinate::new(36.1850, 43.9690));
    assert_eq!(ring.color, "#E4572E");
    assert_eq!(ring.service_icon.as_deref(), Some("bus"));

    let notices = editor.take_notices();
    assert!(
        notices
            .iter()
            .any(|n| n.level == NoticeLevel::Success && n.message.contains("1 created"))
    );
}

#[test]
fn history_is_bounded_by_config() {
    let config = EditorConfig::from_json_str(r#"{ "historyLimit": 4 }"#).expect("config");
    let (mut editor, _) = session(config);
    for i in 0..10 {
        editor.handle_map_click(Coordinate::new(36.19, 44.0 + f64::from(i) * 0.001));
    }
    assert_eq!(editor.lane_history().len(), 4);
    assert_eq!(editor.lane_history().index(), 3);

    let mut undone = 0;
    while editor.undo(DraftKind::Lanes) {
        undone += 1;
    }
    assert_eq!(undone, 3);
    assert_eq!(editor.draft_lanes()[0].path.len(), 7);

    while editor.redo(DraftKind::Lanes) {}
    assert_eq!(editor.draft_lanes()[0].path.len(), 10);
}

#[test]
fn undo_then_new_action_discards_redo() {
    let (mut editor, _) = session(EditorConfig::default());
    editor.handle_map_click(Coordinate::new(36.19, 44.01));
    editor.handle_map_click(Coordinate::new(36.20, 44.02));
    editor.undo(DraftKind::Lanes);
    assert!(editor.lane_history().can_redo());
    editor.handle_map_click(Coordinate::new(36.25, 44.05));
    assert!(!editor.lane_history().can_redo());
    assert_eq!(
        editor.draft_lanes()[0].path,
        vec![Coordinate::new(36.19, 44.01), Coordinate::new(36.25, 44.05)]
    );
}

#[test]
fn stop_reposition_renders_pending_and_commits() {
    let (mut editor, mut backend) = session(EditorConfig::default());
    editor.set_mode(EditorMode::Stop);
    editor.begin_stop_reposition("stop-2").expect("begin");
    editor.drag_stop("stop-2", Coordinate::new(36.2020, 43.9940));

    let vp = viewport(&editor);
    let commands = render_overlay(&editor, &vp);
    let reposition = commands.iter().find_map(|c| match c {
        MapCommand::DrawMarker {
            kind: MarkerKind::RepositionStop,
            position,
            stop_id,
            ..
        } => Some((*position, stop_id.clone())),
        _ => None,
    });
    let (position, stop_id) = reposition.expect("reposition marker");
    assert_eq!(stop_id.as_deref(), Some("stop-2"));
    assert_eq!(position, vp.project(Coordinate::new(36.2020, 43.9940)));

    let moved = editor.commit_stop_position(&mut backend).expect("commit");
    assert_eq!(moved.coordinate(), Coordinate::new(36.2020, 43.9940));
    assert!(editor.selection().editing_stop().is_none());
    assert_eq!(
        backend.data().stop("stop-2").map(|s| s.latitude),
        Some(36.2020)
    );
}

#[test]
fn new_stops_submit_and_undo_is_per_kind() {
    let (mut editor, mut backend) = session(EditorConfig::default());
    editor.handle_map_click(Coordinate::new(36.19, 44.01));
    editor.set_mode(EditorMode::Stop);
    editor.handle_map_click(Coordinate::new(36.18, 44.02));
    editor.handle_map_click(Coordinate::new(36.17, 44.03));

    // Undoing stops leaves lanes alone.
    assert!(editor.undo(editor.active_kind()));
    assert_eq!(editor.draft_stops().len(), 1);
    assert_eq!(editor.draft_lanes().len(), 1);

    assert_eq!(editor.submit_stops(&mut backend).expect("stops"), 1);
    assert!(editor.draft_stops().is_empty());
    assert_eq!(editor.persisted().stops.len(), 4);
    // Lane drafts are untouched by a stop submission.
    assert_eq!(editor.draft_lanes().len(), 1);
}

#[test]
fn failed_submission_keeps_everything_for_retry() {
    let (mut editor, mut backend) = session(EditorConfig::default());
    editor.load_lane_for_edit("lane-101").expect("load");
    editor.update_lane(
        0,
        &LanePatch {
            is_active: Some(true),
            ..LanePatch::default()
        },
    );
    let drafts = editor.draft_lanes().to_vec();
    backend.fail_next("gateway timeout");
    assert!(editor.submit_lanes(&mut backend).is_err());
    assert_eq!(editor.draft_lanes(), drafts.as_slice());
    assert!(editor.lane_history().can_undo());
    assert!(!editor.is_busy());

    editor.submit_lanes(&mut backend).expect("retry");
    assert!(
        editor
            .persisted()
            .lane("lane-101")
            .is_some_and(|l| l.is_active)
    );
}
