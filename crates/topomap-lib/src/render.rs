//! Render pass
//!
//! Reconstructs one scope, drops excluded ids, projects every feature into SVG path
//! data and resolves its fill. Broken features are reported alongside the shapes.

use crate::cache::CachedTopology;
use crate::color::ChoroplethData;
use crate::config::{CachePolicy, MapConfig};
use crate::feature::{Feature, FeatureError, reconstruct_features};
use crate::path::{PathGenerator, SvgPathGenerator};
use crate::projection::Projection;
use crate::{Result, Topology};
use geo::{Area, Centroid, Coord};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Class shared by every rendered feature
pub const SUBUNIT_CLASS: &str = "datamaps-subunit";

/// One drawable feature
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedShape {
    pub id: Option<String>,
    /// `"datamaps-subunit <id>"`
    pub class_name: String,
    /// SVG path data
    pub path: String,
    pub fill: String,
}

/// A text label anchored on a feature
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub id: String,
    pub text: String,
    /// Screen position of the centroid of the feature's largest polygon
    pub position: Coord<f64>,
}

/// A feature left out of the render pass because it could not be reconstructed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedFeature {
    pub index: usize,
    pub id: Option<String>,
    pub reason: String,
}

impl From<&FeatureError> for SkippedFeature {
    fn from(error: &FeatureError) -> Self {
        Self {
            index: error.index,
            id: error.id.clone(),
            reason: error.error.to_string(),
        }
    }
}

/// Output of one render pass
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedMap {
    pub width: u32,
    pub height: u32,
    pub border_color: String,
    pub border_width: f64,
    /// Shapes in collection order
    pub shapes: Vec<RenderedShape>,
    /// Labels in order of first appearance of their id
    pub labels: Vec<Label>,
    pub errors: Vec<SkippedFeature>,
}

/// Renders one configured scope of a topology
pub struct MapRenderer {
    config: MapConfig,
    topology: Arc<Topology>,
    projection: Box<dyn Projection>,
    cache: Option<CachedTopology>,
}

impl std::fmt::Debug for MapRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapRenderer")
            .field("config", &self.config)
            .field("cached", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl MapRenderer {
    pub fn new(config: MapConfig, topology: Arc<Topology>) -> Self {
        let projection = config.build_projection();
        let cache = match config.cache {
            CachePolicy::Disabled => None,
            CachePolicy::Lru { capacity } => {
                Some(CachedTopology::new(Arc::clone(&topology), capacity))
            }
        };
        Self {
            config,
            topology,
            projection,
            cache,
        }
    }

    #[inline]
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    #[inline]
    pub fn projection(&self) -> &dyn Projection {
        &*self.projection
    }

    /// Render the configured scope, coloring features from `data`
    ///
    /// # Errors
    /// Only scope-level failures (`UnknownScope`, `InvalidTransform`). Broken
    /// features end up in [`RenderedMap::errors`].
    pub fn render(&self, data: &ChoroplethData) -> Result<RenderedMap> {
        let start = instant::Instant::now();
        let scope = self.config.scope.as_str();
        let excluded: HashSet<String> = self.config.excluded_ids().into_iter().collect();
        let mut pass = RenderPass::new(self, data);

        match &self.cache {
            Some(cache) => {
                let report = cache.reconstruct(scope)?;
                let is_kept =
                    |id: &Option<String>| !id.as_ref().is_some_and(|id| excluded.contains(id));
                for feature in report.features.iter().filter(|f| is_kept(&f.id)) {
                    pass.add_feature(feature);
                }
                for error in report.errors.iter().filter(|e| is_kept(&e.id)) {
                    pass.skip(error);
                }
            }
            None => {
                let features =
                    reconstruct_features(&self.topology, scope)?.excluding(excluded.iter().cloned());
                for item in features {
                    match item {
                        Ok(feature) => pass.add_feature(&feature),
                        Err(error) => pass.skip(&error),
                    }
                }
            }
        }

        let map = pass.finish();
        tracing::debug!(
            "Rendered {} shapes ({} skipped) for scope '{}' in {:?}",
            map.shapes.len(),
            map.errors.len(),
            scope,
            start.elapsed()
        );
        Ok(map)
    }
}

/// Accumulates the output of a single [`MapRenderer::render`] call
struct RenderPass<'a> {
    config: &'a MapConfig,
    data: &'a ChoroplethData,
    generator: SvgPathGenerator<&'a dyn Projection>,
    map: RenderedMap,
    /// Label slot and anchor area per id
    label_slots: HashMap<String, (usize, f64)>,
}

impl<'a> RenderPass<'a> {
    fn new(renderer: &'a MapRenderer, data: &'a ChoroplethData) -> Self {
        let config = &renderer.config;
        Self {
            config,
            data,
            generator: SvgPathGenerator::new(renderer.projection())
                .with_precision(config.path_precision),
            map: RenderedMap {
                width: config.width,
                height: config.height,
                border_color: config.border_color.clone(),
                border_width: config.border_width,
                shapes: Vec::new(),
                labels: Vec::new(),
                errors: Vec::new(),
            },
            label_slots: HashMap::new(),
        }
    }

    fn add_feature(&mut self, feature: &Feature) {
        let Some(path) = self.generator.path(&feature.geometry) else {
            tracing::debug!("Feature {:?} has nothing drawable", feature.id);
            return;
        };

        let id = feature.id.as_deref();
        let fill = self.config.fills.resolve(self.data.get(id)).to_string();
        let class_name = match id {
            Some(id) => format!("{SUBUNIT_CLASS} {id}"),
            None => SUBUNIT_CLASS.to_string(),
        };
        self.map.shapes.push(RenderedShape {
            id: feature.id.clone(),
            class_name,
            path,
            fill,
        });

        if self.config.labels {
            self.place_label(feature);
        }
    }

    /// Anchor the id's label on its largest polygon seen so far
    fn place_label(&mut self, feature: &Feature) {
        let Some(id) = feature.id.as_deref() else {
            return;
        };
        let Some(polygon) = feature.geometry.largest_polygon() else {
            return;
        };
        let area = polygon.unsigned_area();
        let Some(position) = polygon
            .centroid()
            .and_then(|centroid| self.generator.project_point(centroid.0))
        else {
            return;
        };

        match self.label_slots.get_mut(id) {
            Some((slot, best_area)) => {
                if area > *best_area {
                    *best_area = area;
                    self.map.labels[*slot].position = position;
                }
            }
            None => {
                self.label_slots
                    .insert(id.to_string(), (self.map.labels.len(), area));
                self.map.labels.push(Label {
                    id: id.to_string(),
                    text: id.to_string(),
                    position,
                });
            }
        }
    }

    /// The only place a skipped feature is logged, cached or not
    fn skip(&mut self, error: &FeatureError) {
        tracing::warn!("Skipping {}", error);
        self.map.errors.push(SkippedFeature::from(error));
    }

    fn finish(self) -> RenderedMap {
        self.map
    }
}
