mod renderer;
mod store;
mod telemetry;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mapedit_core::{EditorConfig, MapEditor};
use mapedit_protocol::MapSettings;
use tracing::info;

use crate::store::JsonFileBackend;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: map-editor <map-data.json> [config.json]");
        std::process::exit(1);
    }

    telemetry::init()?;

    let data_path = PathBuf::from(&args[1]);
    let config = match args.get(2) {
        Some(path) => EditorConfig::load(Path::new(path))
            .with_context(|| format!("loading config {path}"))?,
        None => EditorConfig::default(),
    };

    let mut backend = JsonFileBackend::open(&data_path)
        .with_context(|| format!("opening {}", data_path.display()))?;
    let data = backend.snapshot();
    info!(
        path = %data_path.display(),
        lanes = data.lanes.len(),
        stops = data.stops.len(),
        "map data loaded"
    );

    let editor = MapEditor::new(config, data, &MapSettings::default());
    renderer::run_tui(editor, &mut backend)?;
    Ok(())
}
