use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use topomap_lib::{CachePolicy, MapConfig, ProjectionKind};

/// Number of scopes kept when `--cache` is given
const CACHE_CAPACITY: usize = 4;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Topomap - Render a scope of a TopoJSON topology as an SVG choropleth map
pub struct Settings {
    /// TopoJSON file to render
    #[clap(short, long, value_name = "FILE")]
    pub topology: PathBuf,

    /// Object of the topology to render (e.g. world, usa)
    #[clap(short, long)]
    pub scope: Option<String>,

    /// Viewport width in pixels
    #[clap(long)]
    pub width: Option<u32>,

    /// Viewport height in pixels
    #[clap(long)]
    pub height: Option<u32>,

    /// Projection: equirectangular, mercator, albers or albersusa
    #[clap(short, long)]
    pub projection: Option<ProjectionKind>,

    /// Choropleth data: a JSON object mapping feature ids to colors or fill keys
    #[clap(short, long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Map configuration JSON; other flags override its values
    #[clap(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Where to write the SVG document (stdout when omitted)
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Decimal digits kept in path coordinates
    #[clap(long, value_name = "DIGITS")]
    pub precision: Option<u32>,

    /// Label every feature with its id
    #[clap(long, default_value = "false")]
    pub labels: bool,

    /// Draw Antarctica (hidden by default)
    #[clap(long, default_value = "false")]
    pub show_antarctica: bool,

    /// Leave out Hawaii and Alaska
    #[clap(long, default_value = "false")]
    pub hide_hawaii_and_alaska: bool,

    /// Pre-decode arcs and memoize reconstructed scopes
    #[clap(long, default_value = "false")]
    pub cache: bool,
}

impl Settings {
    /// Parse the process arguments, exiting with usage on failure
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    /// Apply the command line on top of a base configuration
    ///
    /// Boolean flags only ever switch away from the defaults, so a flag that was not
    /// given leaves the base value alone.
    pub fn apply_to(&self, mut config: MapConfig) -> MapConfig {
        if let Some(scope) = &self.scope {
            config.scope = scope.clone();
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(projection) = self.projection {
            config.projection = projection;
        }
        if self.precision.is_some() {
            config.path_precision = self.precision;
        }
        if self.labels {
            config.labels = true;
        }
        if self.show_antarctica {
            config.hide_antarctica = false;
        }
        if self.hide_hawaii_and_alaska {
            config.hide_hawaii_and_alaska = true;
        }
        if self.cache
            && let Some(capacity) = NonZeroUsize::new(CACHE_CAPACITY)
        {
            config.cache = CachePolicy::Lru { capacity };
        }
        config
    }
}
