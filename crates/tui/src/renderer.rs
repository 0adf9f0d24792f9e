use std::io::stdout;

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use mapedit_core::drawing::EditorMode;
use mapedit_core::model::LanePatch;
use mapedit_core::selection::LaneKey;
use mapedit_core::submit::SubmissionPhase;
use mapedit_core::views::overlay::render_overlay;
use mapedit_core::{MapBackend, MapEditor, Notice, NoticeLevel};
use mapedit_protocol::{Coordinate, MapCommand, MapViewport, MarkerKind, Point, ThemeToken};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Paragraph},
};
use tracing::info;

/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: f64 = 2.0;
const MAX_LNG_SPAN: f64 = 360.0;
const MIN_LNG_SPAN: f64 = 0.0005;

fn theme_to_color(token: ThemeToken) -> Color {
    match token {
        ThemeToken::Background => Color::Black,
        ThemeToken::Grid => Color::Rgb(30, 30, 30),
        ThemeToken::PersistedLane => Color::Blue,
        ThemeToken::DraftLane => Color::LightBlue,
        ThemeToken::InactiveLane => Color::DarkGray,
        ThemeToken::LaneStart => Color::Green,
        ThemeToken::LaneEnd => Color::Red,
        ThemeToken::LanePoint => Color::White,
        ThemeToken::SelectionHighlight => Color::LightYellow,
        ThemeToken::Stop => Color::Magenta,
        ThemeToken::DraftStop => Color::LightMagenta,
        ThemeToken::RepositionStop => Color::Yellow,
        ThemeToken::Cursor => Color::LightCyan,
        ThemeToken::TextPrimary => Color::White,
        ThemeToken::TextMuted => Color::Gray,
    }
}

/// `#RRGGBB` to a terminal color.
fn hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

fn marker_glyph(kind: MarkerKind, token: ThemeToken, icon: Option<&str>) -> char {
    if token == ThemeToken::SelectionHighlight {
        return '@';
    }
    if let Some(c) = icon.and_then(|i| i.chars().next()) {
        return c.to_ascii_uppercase();
    }
    match kind {
        MarkerKind::LaneStart => 'S',
        MarkerKind::LaneEnd => 'E',
        MarkerKind::LanePoint => 'o',
        MarkerKind::Stop => '■',
        MarkerKind::DraftStop => '□',
        MarkerKind::RepositionStop => '◆',
    }
}

/// Screen position (viewport units) to a (col, row) cell.
fn cell_of(point: Point) -> (i32, i32) {
    (point.x.floor() as i32, (point.y / CELL_ASPECT).floor() as i32)
}

fn cell_center(col: u16, row: u16) -> Point {
    Point::new(f64::from(col) + 0.5, (f64::from(row) + 0.5) * CELL_ASPECT)
}

fn put(buf: &mut Buffer, area: Rect, col: i32, row: i32, ch: char, fg: Color) {
    let (Ok(col), Ok(row)) = (u16::try_from(col), u16::try_from(row)) else {
        return;
    };
    if col >= area.width || row >= area.height {
        return;
    }
    buf[(area.x + col, area.y + row)].set_char(ch).set_fg(fg);
}

fn draw_segment(buf: &mut Buffer, area: Rect, a: Point, b: Point, fg: Color) {
    let (x0, y0) = (a.x, a.y / CELL_ASPECT);
    let (x1, y1) = (b.x, b.y / CELL_ASPECT);
    let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil();
    // Segments far outside the screen are skipped rather than walked.
    if !steps.is_finite() || steps > 10_000.0 {
        return;
    }
    let n = steps as usize;
    for i in 0..=n {
        let t = if n == 0 { 0.0 } else { i as f64 / n as f64 };
        let col = (x0 + (x1 - x0) * t).floor() as i32;
        let row = (y0 + (y1 - y0) * t).floor() as i32;
        put(buf, area, col, row, '•', fg);
    }
}

fn draw_commands(buf: &mut Buffer, area: Rect, cmds: &[MapCommand]) {
    for cmd in cmds {
        match cmd {
            MapCommand::DrawPolyline {
                points,
                color,
                token,
                ..
            } => {
                let fg = match token {
                    ThemeToken::InactiveLane | ThemeToken::SelectionHighlight => {
                        theme_to_color(*token)
                    }
                    _ => hex_color(color).unwrap_or_else(|| theme_to_color(*token)),
                };
                for pair in points.windows(2) {
                    draw_segment(buf, area, pair[0], pair[1], fg);
                }
            }
            MapCommand::DrawMarker {
                position,
                kind,
                token,
                icon,
                ..
            } => {
                let (col, row) = cell_of(*position);
                let glyph = marker_glyph(*kind, *token, icon.as_deref());
                put(buf, area, col, row, glyph, theme_to_color(*token));
            }
            MapCommand::DrawLabel {
                position,
                text,
                token,
            } => {
                let (col, row) = cell_of(*position);
                for (i, ch) in text.chars().enumerate() {
                    put(buf, area, col + i as i32, row, ch, theme_to_color(*token));
                }
            }
            MapCommand::BeginGroup { .. } | MapCommand::EndGroup => {}
        }
    }
}

enum InputMode {
    Normal,
    /// Typing a name for the current draft lane or stop.
    Naming(String),
}

struct App {
    editor: MapEditor,
    center: Coordinate,
    lng_span: f64,
    cursor: (u16, u16),
    map_area: Rect,
    input: InputMode,
    status: Option<Notice>,
    quit: bool,
}

impl App {
    fn new(editor: MapEditor) -> Self {
        Self {
            center: editor.center(),
            lng_span: editor.config().initial_lng_span,
            editor,
            cursor: (0, 0),
            map_area: Rect::default(),
            input: InputMode::Normal,
            status: None,
            quit: false,
        }
    }

    fn viewport(&self) -> MapViewport {
        MapViewport {
            center: self.center,
            lng_span: self.lng_span,
            width: f64::from(self.map_area.width),
            height: f64::from(self.map_area.height) * CELL_ASPECT,
        }
    }

    fn cursor_coord(&self) -> Coordinate {
        self.viewport()
            .unproject(cell_center(self.cursor.0, self.cursor.1))
    }

    /// Pick radius in degrees: the configured tolerance, widened to a
    /// couple of cells when zoomed out.
    fn pick_tolerance(&self) -> f64 {
        let cell = self.lng_span / f64::from(self.map_area.width.max(1));
        self.editor.config().point_pick_tolerance_deg.max(cell * 1.5)
    }

    fn set_area(&mut self, area: Rect) {
        self.map_area = area;
        self.cursor.0 = self.cursor.0.min(area.width.saturating_sub(1));
        self.cursor.1 = self.cursor.1.min(area.height.saturating_sub(1));
    }

    fn move_cursor(&mut self, dx: i32, dy: i32) {
        let cols = i32::from(self.map_area.width);
        let rows = i32::from(self.map_area.height);
        let col = i32::from(self.cursor.0) + dx;
        let row = i32::from(self.cursor.1) + dy;
        let lat_span = self.viewport().lat_span();

        // Pushing past an edge pans the map instead.
        if col < 0 || col >= cols {
            self.center.lng += self.lng_span * 0.1 * f64::from(dx.signum());
        }
        if row < 0 || row >= rows {
            self.center.lat -= lat_span * 0.1 * f64::from(dy.signum());
        }
        self.cursor = (
            u16::try_from(col.clamp(0, (cols - 1).max(0))).unwrap_or(0),
            u16::try_from(row.clamp(0, (rows - 1).max(0))).unwrap_or(0),
        );
    }

    fn zoom(&mut self, factor: f64) {
        self.lng_span = (self.lng_span * factor).clamp(MIN_LNG_SPAN, MAX_LNG_SPAN);
    }

    fn nearest_stop(&self, coord: Coordinate, include_drafts: bool) -> Option<String> {
        let tolerance = self.pick_tolerance();
        let persisted = self
            .editor
            .persisted()
            .stops
            .iter()
            .map(|s| (s.id.as_str(), s.coordinate()));
        let drafts = self
            .editor
            .draft_stops()
            .iter()
            .filter(|_| include_drafts)
            .map(|s| (s.id.as_str(), s.coordinate()));
        persisted
            .chain(drafts)
            .map(|(id, c)| (id, c.degree_distance(&coord)))
            .filter(|(_, d)| *d <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id.to_string())
    }

    fn nearest_persisted_lane(&self, coord: Coordinate) -> Option<String> {
        let tolerance = self.pick_tolerance();
        self.editor
            .persisted()
            .lanes
            .iter()
            .flat_map(|l| l.path.iter().map(move |c| (l.id.as_str(), c.degree_distance(&coord))))
            .filter(|(_, d)| *d <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id.to_string())
    }

    /// The draft lane that naming and removal act on.
    fn target_lane(&self) -> Option<usize> {
        match self.editor.selection().selected_lane_key() {
            Some(LaneKey::Draft(i)) => Some(i),
            _ => self.editor.draft_lanes().len().checked_sub(1),
        }
    }

    fn begin_naming(&mut self) {
        let current = match self.editor.mode() {
            EditorMode::Lane => self
                .target_lane()
                .and_then(|i| self.editor.draft_lanes().get(i))
                .and_then(|l| l.name.en.clone()),
            EditorMode::Stop => self.editor.draft_stops().last().and_then(|s| s.name.clone()),
        };
        self.input = InputMode::Naming(current.unwrap_or_default());
    }

    fn finish_naming(&mut self, name: String) {
        match self.editor.mode() {
            EditorMode::Lane => {
                if let Some(index) = self.target_lane() {
                    let mut text = self.editor.draft_lanes()[index].name.clone();
                    text.en = Some(name);
                    self.editor.update_lane(
                        index,
                        &LanePatch {
                            name: Some(text),
                            ..LanePatch::default()
                        },
                    );
                }
            }
            EditorMode::Stop => {
                if let Some(id) = self.editor.draft_stops().last().map(|s| s.id.clone()) {
                    self.editor.rename_draft_stop(&id, Some(name));
                }
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent, backend: &mut dyn MapBackend) {
        if let InputMode::Naming(buffer) = &mut self.input {
            match key.code {
                KeyCode::Enter => {
                    let name = std::mem::take(buffer);
                    self.input = InputMode::Normal;
                    self.finish_naming(name);
                }
                KeyCode::Esc => self.input = InputMode::Normal,
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char(c) => buffer.push(c),
                _ => {}
            }
            return;
        }

        let coord = self.cursor_coord();
        let mode = self.editor.mode();
        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Esc => {
                if self.editor.selection().editing_stop().is_some() {
                    self.editor.cancel_stop_reposition();
                } else {
                    self.editor.clear_selection();
                }
            }
            KeyCode::Left => self.move_cursor(-1, 0),
            KeyCode::Right => self.move_cursor(1, 0),
            KeyCode::Up => self.move_cursor(0, -1),
            KeyCode::Down => self.move_cursor(0, 1),
            KeyCode::Char('+') | KeyCode::Char('=') => self.zoom(1.0 / 1.5),
            KeyCode::Char('-') => self.zoom(1.5),
            KeyCode::Enter | KeyCode::Char(' ') => {
                let effect = self.editor.handle_map_click(coord);
                info!(?effect, lat = coord.lat, lng = coord.lng, "map click");
            }
            KeyCode::Char('m') => self.editor.toggle_mode(),
            KeyCode::Char('d') => {
                let enabled = !self.editor.drawing_enabled();
                self.editor.set_drawing_enabled(enabled);
            }
            KeyCode::Char('n') if mode == EditorMode::Lane => {
                let _ = self.editor.start_new_lane();
            }
            KeyCode::Char('N') => self.begin_naming(),
            KeyCode::Char('p') => match mode {
                EditorMode::Lane => {
                    self.editor.pick_point(coord);
                }
                EditorMode::Stop => {
                    if let Some(id) = self.nearest_stop(coord, false) {
                        let _ = self.editor.begin_stop_reposition(&id);
                    }
                }
            },
            KeyCode::Char('e') => {
                if let Some(id) = self.nearest_persisted_lane(coord) {
                    self.editor.set_mode(EditorMode::Lane);
                    let _ = self.editor.load_lane_for_edit(&id);
                }
            }
            KeyCode::Char('g') => match mode {
                EditorMode::Lane => {
                    if let Some(p) = self.editor.selection().selected_point() {
                        self.editor.drag_lane_point(p.lane_index, p.point_index, coord);
                    }
                }
                EditorMode::Stop => {
                    let target = match self.editor.selection().editing_stop() {
                        Some(edit) => Some(edit.stop_id.clone()),
                        None => self.editor.draft_stops().last().map(|s| s.id.clone()),
                    };
                    if let Some(id) = target {
                        self.editor.drag_stop(&id, coord);
                    }
                }
            },
            KeyCode::Char('i') if mode == EditorMode::Lane => {
                if let Some(p) = self.editor.selection().selected_point() {
                    self.editor.insert_point(p.lane_index, p.point_index, coord);
                }
            }
            KeyCode::Char('x') => match mode {
                EditorMode::Lane => {
                    let _ = self.editor.delete_selected_point();
                }
                EditorMode::Stop => {
                    if let Some(id) = self.nearest_stop(coord, true) {
                        let _ = self.editor.delete_stop(backend, &id);
                    }
                }
            },
            KeyCode::Char('X') if mode == EditorMode::Lane => {
                if let Some(index) = self.target_lane() {
                    self.editor.remove_draft_lane(index);
                }
            }
            KeyCode::Char('u') => {
                let kind = self.editor.active_kind();
                self.editor.undo(kind);
            }
            KeyCode::Char('r') => {
                let kind = self.editor.active_kind();
                self.editor.redo(kind);
            }
            KeyCode::Char('c') => self.editor.clear_drafts(),
            KeyCode::Char('R') => {
                self.editor.refresh(backend);
            }
            KeyCode::Char('s') => self.save(backend),
            _ => {}
        }
    }

    fn save(&mut self, backend: &mut dyn MapBackend) {
        match self.editor.mode() {
            EditorMode::Lane => {
                let _ = self.editor.submit_lanes(backend);
            }
            EditorMode::Stop => {
                let pending = self
                    .editor
                    .selection()
                    .editing_stop()
                    .is_some_and(|e| e.pending.is_some());
                if pending {
                    let _ = self.editor.commit_stop_position(backend);
                } else {
                    let _ = self.editor.submit_stops(backend);
                }
            }
        }
    }

    fn handle_click(&mut self, column: u16, row: u16) {
        let area = self.map_area;
        if column < area.x
            || row < area.y
            || column >= area.x + area.width
            || row >= area.y + area.height
        {
            return;
        }
        self.cursor = (column - area.x, row - area.y);
        let coord = self.cursor_coord();
        self.editor.handle_map_click(coord);
    }

    fn collect_notices(&mut self) {
        if let Some(last) = self.editor.take_notices().pop() {
            self.status = Some(last);
        }
    }

    fn header(&self) -> String {
        let busy = match self.editor.phase() {
            SubmissionPhase::Idle => "idle".to_string(),
            SubmissionPhase::Submitting(op) => format!("{op}…"),
        };
        let (mode, drafts, history) = match self.editor.mode() {
            EditorMode::Lane => (
                "lanes",
                format!(
                    "drawing {} | {} draft lanes",
                    if self.editor.drawing_enabled() { "on" } else { "off" },
                    self.editor.draft_lanes().len()
                ),
                (self.editor.lane_history().index(), self.editor.lane_history().len()),
            ),
            EditorMode::Stop => (
                "stops",
                format!("{} draft stops", self.editor.draft_stops().len()),
                (self.editor.stop_history().index(), self.editor.stop_history().len()),
            ),
        };
        format!(
            " map-editor | mode: {mode} | {drafts} | history {}/{} | {busy}",
            history.0 + 1,
            history.1
        )
    }

    fn footer(&self) -> (String, Color) {
        if let InputMode::Naming(buffer) = &self.input {
            return (format!(" name: {buffer}_"), Color::White);
        }
        match &self.status {
            Some(notice) => {
                let color = match notice.level {
                    NoticeLevel::Success => Color::Green,
                    NoticeLevel::Error => Color::Red,
                };
                (format!(" {}", notice.message), color)
            }
            None => (
                " ⏎ click | m mode | n new lane | p pick | g move | i insert | x delete | N name | u/r undo/redo | s save | c clear | q quit".into(),
                Color::Gray,
            ),
        }
    }
}

pub fn run_tui(editor: MapEditor, backend: &mut dyn MapBackend) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let term = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term)?;

    let mut app = App::new(editor);

    while !app.quit {
        let size = terminal.size()?;
        app.set_area(Rect::new(
            0,
            1,
            size.width,
            size.height.saturating_sub(2),
        ));
        let cmds = render_overlay(&app.editor, &app.viewport());
        let header = app.header();
        let (footer, footer_color) = app.footer();

        terminal.draw(|frame| {
            let area = frame.area();

            let header_area = Rect::new(0, 0, area.width, 1);
            let header = Block::default()
                .title(header)
                .style(Style::default().fg(Color::White).bg(Color::DarkGray));
            frame.render_widget(header, header_area);

            let map_area = app.map_area.intersection(area);
            let background = Block::default().style(Style::default().bg(Color::Black));
            frame.render_widget(background, map_area);

            let buf = frame.buffer_mut();
            draw_commands(buf, map_area, &cmds);
            let (col, row) = app.cursor;
            if col < map_area.width && row < map_area.height {
                buf[(map_area.x + col, map_area.y + row)]
                    .set_bg(theme_to_color(ThemeToken::Cursor));
            }

            let footer_area = Rect::new(0, area.height.saturating_sub(1), area.width, 1);
            frame.render_widget(
                Paragraph::new(footer).style(Style::default().fg(footer_color).bg(Color::Black)),
                footer_area,
            );
        })?;

        if event::poll(std::time::Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key, backend);
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::Down(MouseButton::Left) => {
                        app.handle_click(mouse.column, mouse.row);
                    }
                    MouseEventKind::ScrollUp => app.zoom(1.0 / 1.5),
                    MouseEventKind::ScrollDown => app.zoom(1.5),
                    _ => {}
                },
                _ => {}
            }
            app.collect_notices();
        }
    }

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    Ok(())
}
