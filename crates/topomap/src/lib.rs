//! Topomap - command line choropleth renderer
//!
//! Loads a TopoJSON topology (plus optional choropleth data and map configuration),
//! renders one scope through [`topomap_lib::MapRenderer`] and writes the result as
//! an SVG document.

mod error;
mod logging;
pub mod settings;
pub mod svg;

pub use error::CliError;
pub use logging::setup_logging;
pub use settings::Settings;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use topomap_lib::{ChoroplethData, MapConfig, MapRenderer, RenderedMap, TopoError, Topology};

async fn read_file(path: &Path) -> Result<String, CliError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Read and parse a file, attributing parse failures to its path
async fn load<T>(
    path: &Path,
    parse: impl FnOnce(&str) -> Result<T, TopoError>,
) -> Result<T, CliError> {
    let text = read_file(path).await?;
    parse(&text).map_err(|source| CliError::Load {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the topology asynchronously
pub async fn load_topology(path: &Path) -> Result<Topology, CliError> {
    let start = instant::Instant::now();
    let topology = load(path, Topology::from_json_str).await?;
    tracing::info!(
        "Loaded {} ({} arcs, scopes: {}) in {:?}",
        path.display(),
        topology.arcs().len(),
        topology.scopes().join(", "),
        start.elapsed()
    );
    Ok(topology)
}

/// Load everything the settings point at and render the map
pub async fn render(settings: &Settings) -> Result<RenderedMap, CliError> {
    let base = match &settings.config {
        Some(path) => load(path, MapConfig::from_json_str).await?,
        None => MapConfig::default(),
    };
    let config = settings.apply_to(base);

    let data = match &settings.data {
        Some(path) => load(path, ChoroplethData::from_json_str).await?,
        None => ChoroplethData::new(),
    };

    let topology = Arc::new(load_topology(&settings.topology).await?);
    let renderer = MapRenderer::new(config, topology);
    let map = renderer.render(&data)?;

    tracing::info!(
        "Rendered {} shapes and {} labels for scope '{}' ({} skipped)",
        map.shapes.len(),
        map.labels.len(),
        renderer.config().scope,
        map.errors.len()
    );
    Ok(map)
}

/// Render and write the SVG document to the output file or stdout
pub async fn run(settings: Settings) -> Result<(), CliError> {
    let map = render(&settings).await?;
    let document = svg::to_svg(&map);
    write_output(settings.output.as_ref(), document.as_bytes()).await
}

async fn write_output(output: Option<&PathBuf>, bytes: &[u8]) -> Result<(), CliError> {
    match output {
        Some(path) => {
            tokio::fs::write(path, bytes)
                .await
                .map_err(CliError::Write)?;
            tracing::info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(bytes).await.map_err(CliError::Write)?;
            stdout.flush().await.map_err(CliError::Write)?;
        }
    }
    Ok(())
}
