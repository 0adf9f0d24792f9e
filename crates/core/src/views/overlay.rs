use mapedit_protocol::{
    Coordinate, MapCommand, MapDataPayload, MapViewport, MarkerKind, Point, ThemeToken,
};

use crate::editor::MapEditor;
use crate::model::{DraftLane, LaneStyle};
use crate::selection::{LaneKey, PointRef};

pub const POINT_RADIUS: f64 = 4.0;
pub const ENDPOINT_RADIUS: f64 = 6.0;
pub const SELECTED_POINT_RADIUS: f64 = 9.0;
pub const STOP_RADIUS: f64 = 5.0;

/// Render the editor state over the base map.
///
/// Layers, bottom to top: persisted lanes, persisted stops, draft lanes,
/// draft stops. A persisted lane that is loaded as a draft is drawn only as
/// the draft. A stop in reposition mode is drawn at its pending position.
pub fn render_overlay(editor: &MapEditor, viewport: &MapViewport) -> Vec<MapCommand> {
    let persisted = editor.persisted();
    let drafts = editor.draft_lanes();
    let mut commands = Vec::new();

    commands.push(MapCommand::BeginGroup {
        id: "persisted-lanes".into(),
    });
    for lane in &persisted.lanes {
        if drafts.iter().any(|d| d.id.as_deref() == Some(lane.id.as_str())) {
            continue;
        }
        if lane.path.len() < 2 {
            continue;
        }
        let selected =
            editor.selection().selected_lane_key() == Some(LaneKey::Persisted(lane.id.clone()));
        commands.push(MapCommand::DrawPolyline {
            points: lane.path.iter().map(|c| viewport.project(*c)).collect(),
            color: lane.color.clone(),
            token: if selected {
                ThemeToken::SelectionHighlight
            } else if lane.is_active {
                ThemeToken::PersistedLane
            } else {
                ThemeToken::InactiveLane
            },
            weight: f64::from(lane.weight),
            opacity: lane.opacity,
            lane_key: lane.id.clone(),
        });
    }
    commands.push(MapCommand::EndGroup);

    commands.push(MapCommand::BeginGroup { id: "stops".into() });
    let editing = editor.selection().editing_stop();
    for stop in &persisted.stops {
        let (position, kind, token) = match editing {
            Some(edit) if edit.stop_id == stop.id => (
                edit.pending.unwrap_or_else(|| stop.coordinate()),
                MarkerKind::RepositionStop,
                ThemeToken::RepositionStop,
            ),
            _ => (stop.coordinate(), MarkerKind::Stop, ThemeToken::Stop),
        };
        push_stop(
            &mut commands,
            viewport,
            position,
            kind,
            token,
            &stop.id,
            stop.name.as_deref(),
        );
    }
    commands.push(MapCommand::EndGroup);

    commands.push(MapCommand::BeginGroup {
        id: "draft-lanes".into(),
    });
    let selected = editor.selection().selected_point();
    for (lane_index, lane) in drafts.iter().enumerate() {
        render_draft_lane(
            &mut commands,
            viewport,
            persisted,
            &editor.config().default_lane_style,
            lane_index,
            lane,
            selected,
        );
    }
    commands.push(MapCommand::EndGroup);

    commands.push(MapCommand::BeginGroup {
        id: "draft-stops".into(),
    });
    for stop in editor.draft_stops() {
        push_stop(
            &mut commands,
            viewport,
            stop.coordinate(),
            MarkerKind::DraftStop,
            ThemeToken::DraftStop,
            &stop.id,
            stop.name.as_deref(),
        );
    }
    commands.push(MapCommand::EndGroup);

    commands
}

fn push_stop(
    commands: &mut Vec<MapCommand>,
    viewport: &MapViewport,
    coord: Coordinate,
    kind: MarkerKind,
    token: ThemeToken,
    id: &str,
    name: Option<&str>,
) {
    let position = viewport.project(coord);
    if !viewport.contains(position) {
        return;
    }
    commands.push(MapCommand::DrawMarker {
        position,
        kind,
        token,
        radius: STOP_RADIUS,
        icon: None,
        lane_point: None,
        stop_id: Some(id.to_string()),
    });
    if let Some(name) = name {
        commands.push(MapCommand::DrawLabel {
            position: Point::new(position.x + STOP_RADIUS + 2.0, position.y),
            text: name.to_string(),
            token: ThemeToken::TextMuted,
        });
    }
}

/// Icon of the transport service a lane belongs to, taken from any
/// persisted lane of the same service.
fn service_icon(persisted: &MapDataPayload, service_id: Option<&str>) -> Option<String> {
    let service_id = service_id?;
    persisted
        .lanes
        .iter()
        .find(|l| l.service_id.as_deref() == Some(service_id) && l.service_icon.is_some())
        .and_then(|l| l.service_icon.clone())
}

fn render_draft_lane(
    commands: &mut Vec<MapCommand>,
    viewport: &MapViewport,
    persisted: &MapDataPayload,
    default_style: &LaneStyle,
    lane_index: usize,
    lane: &DraftLane,
    selected: Option<PointRef>,
) {
    let points: Vec<Point> = lane.path.iter().map(|c| viewport.project(*c)).collect();
    let last = points.len().saturating_sub(1);

    if points.len() >= 2 {
        let fallback = match lane.id.as_deref().and_then(|id| persisted.lane(id)) {
            Some(p) => LaneStyle {
                color: p.color.clone(),
                weight: p.weight,
                opacity: p.opacity,
            },
            None => default_style.clone(),
        };
        let LaneStyle {
            color,
            weight,
            opacity,
        } = lane.style_or(&fallback);
        commands.push(MapCommand::DrawPolyline {
            points: points.clone(),
            color,
            token: ThemeToken::DraftLane,
            weight: f64::from(weight),
            opacity,
            lane_key: LaneKey::Draft(lane_index).to_string(),
        });
    }

    let icon = service_icon(persisted, lane.service_id.as_deref());
    for (point_index, position) in points.into_iter().enumerate() {
        if !viewport.contains(position) {
            continue;
        }
        let is_selected = selected
            == Some(PointRef {
                lane_index,
                point_index,
            });
        let kind = if point_index == 0 {
            MarkerKind::LaneStart
        } else if point_index == last {
            MarkerKind::LaneEnd
        } else {
            MarkerKind::LanePoint
        };
        let (token, radius) = match (is_selected, kind) {
            (true, _) => (ThemeToken::SelectionHighlight, SELECTED_POINT_RADIUS),
            (false, MarkerKind::LaneStart) => (ThemeToken::LaneStart, ENDPOINT_RADIUS),
            (false, MarkerKind::LaneEnd) => (ThemeToken::LaneEnd, ENDPOINT_RADIUS),
            (false, _) => (ThemeToken::LanePoint, POINT_RADIUS),
        };
        let endpoint_icon = match kind {
            MarkerKind::LaneStart | MarkerKind::LaneEnd => icon.clone(),
            _ => None,
        };
        commands.push(MapCommand::DrawMarker {
            position,
            kind,
            token,
            radius,
            icon: endpoint_icon,
            lane_point: Some((lane_index, point_index)),
            stop_id: None,
        });
    }
}
