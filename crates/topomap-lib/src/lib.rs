//! Topomap Library - Shared-Arc Topology Decoding for Choropleth Maps
//!
//! This library turns TopoJSON-style topologies (quantized, delta-encoded arcs shared
//! between neighbouring boundaries) back into renderable geographic features, projects
//! them onto the screen and emits SVG path data for a rendering layer to draw.
//!
//! # Architecture
//!
//! - **[`Topology`]**: Immutable store of shared arcs, the quantization transform and
//!   the named geometry collections (one per scope, e.g. `world`, `usa`)
//! - **[`decode_arc`]** / **[`Transform`]**: Delta decoding and dequantization
//! - **[`decode_ring`]**: Ring assembly from signed arc references
//! - **[`reconstruct_features`]**: Lazy per-scope feature reconstruction with
//!   per-feature error reporting
//! - **[`Projection`]** / **[`PathGenerator`]**: Screen projection and path generation
//! - **[`MapRenderer`]**: One render pass driven by an immutable [`MapConfig`]
//!
//! # Data Flow
//!
//! ```text
//! Topology -> decode arcs -> assemble rings -> dequantize -> Feature
//!          -> project -> SVG path -> RenderedShape (keyed by feature id)
//! ```

pub mod arc;
mod cache;
pub mod color;
mod config;
mod feature;
pub mod path;
pub mod projection;
mod render;
pub mod ring;
mod topology;
mod transform;

// Public API exports
pub use arc::{ArcRef, decode_arc};
pub use cache::CachedTopology;
pub use color::{ChoroplethData, ColorSource, FillPalette};
pub use config::{CachePolicy, MapConfig, MapConfigBuilder};
pub use feature::{
    Feature, FeatureError, FeatureGeometry, Features, Reconstruction, reconstruct_features,
};
pub use path::{PathGenerator, SvgPathGenerator};
pub use projection::{
    Albers, AlbersUsa, Equirectangular, Mercator, Projection, ProjectionKind, ProjectionParams,
};
pub use render::{Label, MapRenderer, RenderedMap, RenderedShape, SkippedFeature};
pub use ring::decode_ring;
pub use topology::{
    GeometryCollection, GeometryEntry, GeometryShape, RawArc, RingSpec, Topology,
};
pub use transform::Transform;

/// Error types for topology decoding and reconstruction
#[derive(Debug, thiserror::Error)]
pub enum TopoError {
    #[error("Malformed topology: {0}")]
    MalformedTopology(String),

    #[error("Invalid transform: {0}")]
    InvalidTransform(String),

    #[error("Arc index {index} out of range (arc table has {len} arcs)")]
    ArcIndexOutOfRange { index: usize, len: usize },

    #[error("Empty ring")]
    EmptyRing,

    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometryType(String),

    #[error("Unknown scope: {0}")]
    UnknownScope(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TopoError>;
