//! Map configuration
//!
//! A [`MapConfig`] is built once (from JSON, the builder or `Default`) and handed to
//! the renderer. There are no process-wide defaults to mutate.

use crate::color::FillPalette;
use crate::projection::{AlbersUsa, Projection, ProjectionKind, ProjectionParams};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Scope rendered with the composite U.S. projection when no parameters are given
pub const USA_SCOPE: &str = "usa";

/// Id of Antarctica in world topologies
pub const ANTARCTICA_ID: &str = "ATA";

/// Ids of the non-contiguous U.S. states
pub const HAWAII_AND_ALASKA_IDS: [&str; 2] = ["HI", "AK"];

/// Whether reconstructed scopes are memoized between render passes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CachePolicy {
    /// Re-decode every arc on every render pass
    #[default]
    Disabled,
    /// Pre-decode arcs once and keep the most recent scopes
    Lru { capacity: NonZeroUsize },
}

/// Everything a render pass needs besides the topology and the data
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapConfig {
    /// Object name inside the topology
    pub scope: String,
    /// Viewport width in pixels
    pub width: u32,
    /// Viewport height in pixels
    pub height: u32,
    pub projection: ProjectionKind,
    /// Explicit projection parameters, replacing the viewport fit
    pub projection_params: Option<ProjectionParams>,
    pub hide_antarctica: bool,
    pub hide_hawaii_and_alaska: bool,
    /// Additional ids left out of the render pass
    pub exclude_ids: Vec<String>,
    pub fills: FillPalette,
    pub border_color: String,
    pub border_width: f64,
    /// Decimal digits of path coordinates (`None` = full precision)
    pub path_precision: Option<u32>,
    /// Emit one label per feature id
    pub labels: bool,
    pub cache: CachePolicy,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            scope: "world".to_string(),
            width: 960,
            height: 500,
            projection: ProjectionKind::default(),
            projection_params: None,
            hide_antarctica: true,
            hide_hawaii_and_alaska: false,
            exclude_ids: Vec::new(),
            fills: FillPalette::default(),
            border_color: "#FDFDFD".to_string(),
            border_width: 1.0,
            path_precision: None,
            labels: false,
            cache: CachePolicy::default(),
        }
    }
}

impl MapConfig {
    pub fn builder() -> MapConfigBuilder {
        MapConfigBuilder::default()
    }

    /// Parse a JSON configuration; missing keys keep their defaults
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Feature ids left out of the render pass
    pub fn excluded_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        if self.hide_antarctica {
            ids.push(ANTARCTICA_ID.to_string());
        }
        if self.hide_hawaii_and_alaska {
            ids.extend(HAWAII_AND_ALASKA_IDS.iter().map(|id| id.to_string()));
        }
        ids.extend(self.exclude_ids.iter().cloned());
        ids
    }

    /// The projection for this configuration
    ///
    /// Explicit parameters win. Otherwise the `usa` scope gets the composite U.S.
    /// projection (Alaska and Hawaii as insets) and every other scope a whole-world
    /// fit of the selected kind.
    pub fn build_projection(&self) -> Box<dyn Projection> {
        let (width, height) = (f64::from(self.width), f64::from(self.height));
        if let Some(params) = self.projection_params {
            return self.projection.build(params);
        }
        if self.scope == USA_SCOPE {
            let params = ProjectionKind::usa_params(width, height);
            return Box::new(AlbersUsa::new(params.scale, params.translate));
        }
        self.projection
            .build(self.projection.world_params(width, height))
    }
}

/// Step-by-step construction of a [`MapConfig`]
#[derive(Clone, Debug, Default)]
pub struct MapConfigBuilder {
    config: MapConfig,
}

impl MapConfigBuilder {
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.config.scope = scope.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    pub fn projection(mut self, kind: ProjectionKind) -> Self {
        self.config.projection = kind;
        self
    }

    pub fn projection_params(mut self, params: ProjectionParams) -> Self {
        self.config.projection_params = Some(params);
        self
    }

    pub fn hide_antarctica(mut self, hide: bool) -> Self {
        self.config.hide_antarctica = hide;
        self
    }

    pub fn hide_hawaii_and_alaska(mut self, hide: bool) -> Self {
        self.config.hide_hawaii_and_alaska = hide;
        self
    }

    pub fn exclude(mut self, id: impl Into<String>) -> Self {
        self.config.exclude_ids.push(id.into());
        self
    }

    pub fn fills(mut self, fills: FillPalette) -> Self {
        self.config.fills = fills;
        self
    }

    pub fn border(mut self, color: impl Into<String>, width: f64) -> Self {
        self.config.border_color = color.into();
        self.config.border_width = width;
        self
    }

    pub fn path_precision(mut self, digits: u32) -> Self {
        self.config.path_precision = Some(digits);
        self
    }

    pub fn labels(mut self, enabled: bool) -> Self {
        self.config.labels = enabled;
        self
    }

    pub fn cache(mut self, policy: CachePolicy) -> Self {
        self.config.cache = policy;
        self
    }

    pub fn build(self) -> MapConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::DEFAULT_FILL;
    use geo::Coord;

    #[test]
    fn test_defaults() {
        let config = MapConfig::default();
        assert_eq!(config.scope, "world");
        assert_eq!((config.width, config.height), (960, 500));
        assert_eq!(config.projection, ProjectionKind::Equirectangular);
        assert_eq!(config.fills.default_fill, DEFAULT_FILL);
        assert_eq!(config.border_color, "#FDFDFD");
        assert_eq!(config.cache, CachePolicy::Disabled);
        assert_eq!(config.excluded_ids(), vec!["ATA".to_string()]);
    }

    #[test]
    fn test_excluded_ids() {
        let config = MapConfig::builder()
            .hide_antarctica(false)
            .hide_hawaii_and_alaska(true)
            .exclude("PR")
            .build();
        assert_eq!(config.excluded_ids(), vec!["HI", "AK", "PR"]);
    }

    #[test]
    fn test_from_json() {
        let config = MapConfig::from_json_str(
            r##"{
                "scope": "usa",
                "width": 800,
                "hideHawaiiAndAlaska": true,
                "fills": {"defaultFill": "#cccccc", "visited": "#ff0000"},
                "cache": {"kind": "lru", "capacity": 4}
            }"##,
        )
        .unwrap();

        assert_eq!(config.scope, "usa");
        assert_eq!(config.width, 800);
        assert_eq!(config.height, 500);
        assert!(config.hide_antarctica);
        assert!(config.hide_hawaii_and_alaska);
        assert_eq!(config.fills.default_fill, "#cccccc");
        assert_eq!(
            config.cache,
            CachePolicy::Lru {
                capacity: NonZeroUsize::new(4).unwrap()
            }
        );
    }

    #[test]
    fn test_invalid_json() {
        let result = MapConfig::from_json_str(r#"{"width": "wide"}"#);
        assert!(matches!(result, Err(crate::TopoError::Json(_))));
    }

    #[test]
    fn test_world_projection_fits_viewport() {
        let config = MapConfig::default();
        let projection = config.build_projection();
        let west = projection.project(Coord { x: -180.0, y: 0.0 }).unwrap();
        let east = projection.project(Coord { x: 180.0, y: 0.0 }).unwrap();
        assert!(west.x < 0.0 && west.x > -1.0);
        assert!(east.x > 960.0 && east.x < 961.0);
    }

    #[test]
    fn test_usa_scope_uses_albers_usa() {
        let config = MapConfig::builder().scope("usa").build();
        let projection = config.build_projection();
        let expected = AlbersUsa::new(960.0, [480.0, 250.0]);
        for point in [
            Coord { x: -100.0, y: 40.0 },
            Coord { x: -149.9, y: 61.2 },
            Coord { x: -157.9, y: 21.3 },
        ] {
            let projected = projection.project(point);
            assert!(projected.is_some());
            assert_eq!(projected, expected.project(point));
        }
    }

    #[test]
    fn test_explicit_params_win() {
        let params = ProjectionParams {
            scale: 8200.0,
            translate: [12050.0, 5200.0],
            center: [0.0, 4.0],
            rotate: 0.0,
        };
        let config = MapConfig::builder()
            .scope("virginia")
            .size(1390, 640)
            .projection_params(params)
            .build();
        let projection = config.build_projection();
        let richmond = projection.project(Coord { x: -77.4, y: 37.5 }).unwrap();
        assert!(richmond.x > 0.0 && richmond.x < 1390.0);
        assert!(richmond.y > 0.0 && richmond.y < 640.0);
    }
}
